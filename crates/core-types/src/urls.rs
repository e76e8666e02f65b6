//! Search-results URL composition shared by the executor and the
//! controller's blank-surface fast path.

use url::form_urlencoded;

/// Google results URL for a free-text query.
pub fn google_search_url(query: &str) -> String {
    format!("https://www.google.com/search?q={}", encode(query))
}

/// Results URL for a media-site search, given the site's results base
/// (e.g. `https://www.youtube.com/results?search_query=`).
pub fn media_results_url(results_base: &str, query: &str) -> String {
    format!("{}{}", results_base, encode(query))
}

fn encode(query: &str) -> String {
    form_urlencoded::byte_serialize(query.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_url_percent_encodes_query() {
        let url = google_search_url("who is elon musk");
        assert_eq!(url, "https://www.google.com/search?q=who+is+elon+musk");
    }

    #[test]
    fn media_url_appends_encoded_query() {
        let url = media_results_url(
            "https://www.youtube.com/results?search_query=",
            "karan aujla",
        );
        assert!(url.starts_with("https://www.youtube.com/results?search_query="));
        assert!(url.ends_with("karan+aujla"));
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let url = google_search_url("a&b=c");
        assert!(url.contains("a%26b%3Dc"));
    }
}
