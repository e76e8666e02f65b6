//! Extraction of the first balanced JSON object from collaborator text.
//!
//! Models are asked for raw JSON and still wrap it in markdown fences or
//! prose often enough that parsing the whole reply is a losing game.

/// Return the first balanced `{...}` block in `text`, if any. Braces
/// inside string literals (and escaped quotes inside those) do not
/// count toward nesting.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else {
                match byte {
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
