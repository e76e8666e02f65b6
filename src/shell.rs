//! Interactive shell: utterances in, actions and spoken responses out.
//!
//! Speech capture lives outside this system; here an utterance is a
//! line of text.

use anyhow::Result;
use intent_core::interpret_or_sentinel;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};
use voicepilot_core_types::ActionKind;

use crate::Session;

const COMM_TROUBLE_RESPONSE: &str = "Sorry, I had trouble communicating with the page.";

/// Run the line-oriented shell until EOF or `quit`.
pub async fn run(session: &Session) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = tokio::io::stdout();

    stdout
        .write_all(b"voicepilot ready. Say something (\"quit\" to exit).\n> ")
        .await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await? {
        let utterance = line.trim();
        if utterance.is_empty() {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;
            continue;
        }
        if utterance.eq_ignore_ascii_case("quit") || utterance.eq_ignore_ascii_case("exit") {
            break;
        }

        let response = handle_utterance(session, utterance).await;
        stdout
            .write_all(format!("{response}\n> ").as_bytes())
            .await?;
        stdout.flush().await?;
    }

    Ok(())
}

/// Translate and execute one utterance, returning the user-facing
/// response line.
pub async fn handle_utterance(session: &Session, utterance: &str) -> String {
    debug!(target: "shell", utterance, "processing utterance");
    let command = interpret_or_sentinel(session.provider.as_ref(), utterance).await;

    // Sentinels carry only a message; everything else goes to the
    // controller.
    if command.action != ActionKind::None {
        if let Err(err) = session
            .controller
            .dispatch_command(session.surface, &command)
            .await
        {
            warn!(target: "shell", %err, "dispatch failed");
            return COMM_TROUBLE_RESPONSE.to_string();
        }
    }

    command.response
}
