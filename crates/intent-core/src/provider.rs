//! Intent providers: the real model-backed translator and a
//! deterministic mock for tests and offline use.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use voicepilot_core_types::{ActionKind, Command, Direction, ParameterSet};

use crate::credentials::CredentialStore;
use crate::errors::IntentError;
use crate::parse::extract_json_block;

/// Spoken when no credential is configured.
pub const CREDENTIAL_MISSING_RESPONSE: &str =
    "Please add your Gemini API key in the settings (voicepilot key set <key>).";

/// Spoken when the collaborator's reply could not be understood.
pub const UNRECOGNIZED_RESPONSE: &str = "Sorry, I could not understand your command.";

#[async_trait]
pub trait IntentProvider: Send + Sync {
    /// Translate one utterance into a structured command.
    async fn interpret(&self, utterance: &str) -> Result<Command, IntentError>;
}

/// Run the collaborator and recover every failure into a user-facing
/// sentinel command. Sentinels never cause DOM or navigation side
/// effects downstream.
pub async fn interpret_or_sentinel(provider: &dyn IntentProvider, utterance: &str) -> Command {
    match provider.interpret(utterance).await {
        Ok(command) => command,
        Err(IntentError::MissingCredential) => Command::sentinel(CREDENTIAL_MISSING_RESPONSE),
        Err(err) => {
            warn!(target: "intent-core", %err, "intent translation failed");
            Command::sentinel(UNRECOGNIZED_RESPONSE)
        }
    }
}

/// Gemini-backed provider.
pub struct GeminiIntentProvider {
    http: reqwest::Client,
    credentials: Arc<dyn CredentialStore>,
    model: String,
    endpoint_base: String,
}

impl GeminiIntentProvider {
    pub fn new(credentials: Arc<dyn CredentialStore>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            model: model.into(),
            endpoint_base: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
        }
    }

    /// Point the provider at a different endpoint (tests).
    pub fn with_endpoint_base(mut self, endpoint_base: impl Into<String>) -> Self {
        self.endpoint_base = endpoint_base.into();
        self
    }

    fn endpoint(&self, key: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.endpoint_base, self.model, key
        )
    }
}

#[async_trait]
impl IntentProvider for GeminiIntentProvider {
    async fn interpret(&self, utterance: &str) -> Result<Command, IntentError> {
        let key = self
            .credentials
            .get()
            .await
            .ok_or(IntentError::MissingCredential)?;

        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: build_prompt(utterance),
                }],
            }],
        };

        let response = self
            .http
            .post(self.endpoint(&key))
            .json(&request)
            .send()
            .await
            .map_err(|err| IntentError::Http(err.to_string()))?;

        if !response.status().is_success() {
            return Err(IntentError::Http(format!(
                "model api returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|err| IntentError::Http(err.to_string()))?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| IntentError::Parse("empty candidate list".to_string()))?;

        parse_command_text(&text)
    }
}

/// Pull the command out of whatever the model wrapped it in.
pub fn parse_command_text(text: &str) -> Result<Command, IntentError> {
    let block = extract_json_block(text)
        .ok_or_else(|| IntentError::Parse("no JSON object in reply".to_string()))?;
    let command: Command =
        serde_json::from_str(block).map_err(|err| IntentError::Parse(err.to_string()))?;
    debug!(target: "intent-core", action = %command.action, "command parsed");
    Ok(command)
}

fn build_prompt(utterance: &str) -> String {
    format!(
        r#"You are a browser automation assistant. Analyze the user's voice command and return a JSON response with the action to take and parameters.

Available actions:
- navigate: Go to a specific URL
- search: Search on current page or search engine
- click: Click an element (supports a 1-based "index" for "the third link")
- scroll: Scroll the page
- type: Type text into an input field
- play_media: Open the media site and search for content
- site_search: Search on Google (use this when user explicitly mentions Google)
- go_back: Go back in history
- go_forward: Go forward in history

User command: "{utterance}"

Return only a JSON object with this structure:
{{
  "action": "action_name",
  "parameters": {{
    "url": "if needed",
    "query": "if needed",
    "selector": "if needed",
    "text": "if needed",
    "direction": "if needed (up or down)",
    "index": 1
  }},
  "response": "A friendly response to the user"
}}

Examples:
- "open youtube and play karan aujla" -> {{"action": "play_media", "parameters": {{"query": "karan aujla"}}, "response": "Opening YouTube and searching for Karan Aujla"}}
- "scroll down" -> {{"action": "scroll", "parameters": {{"direction": "down"}}, "response": "Scrolling down the page"}}
- "search about trump on google" -> {{"action": "site_search", "parameters": {{"query": "trump"}}, "response": "Searching Google for Trump"}}
- "click the third video" -> {{"action": "click", "parameters": {{"index": 3}}, "response": "Clicking the third video"}}

IMPORTANT:
- Return ONLY raw JSON (no markdown, no code block, no extra text).
- If user says "open youtube", treat it as {{"action":"navigate","parameters":{{"url":"https://youtube.com"}}}}
"#
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Deterministic provider for tests and offline development.
#[derive(Debug, Default, Clone)]
pub struct MockIntentProvider;

#[async_trait]
impl IntentProvider for MockIntentProvider {
    async fn interpret(&self, utterance: &str) -> Result<Command, IntentError> {
        let lower = utterance.trim().to_lowercase();

        if let Some(rest) = lower.strip_prefix("play ") {
            return Ok(Command::new(
                ActionKind::PlayMedia,
                ParameterSet::with_query(rest),
                format!("Searching for {rest}"),
            ));
        }
        if lower.contains("scroll") {
            let direction = if lower.contains("up") {
                Direction::Up
            } else {
                Direction::Down
            };
            return Ok(Command::new(
                ActionKind::Scroll,
                ParameterSet {
                    direction: Some(direction),
                    ..Default::default()
                },
                "Scrolling the page",
            ));
        }
        if lower.starts_with("go back") {
            return Ok(Command::new(
                ActionKind::GoBack,
                ParameterSet::default(),
                "Going back",
            ));
        }
        if lower.starts_with("go forward") {
            return Ok(Command::new(
                ActionKind::GoForward,
                ParameterSet::default(),
                "Going forward",
            ));
        }
        if let Some(rest) = lower
            .strip_prefix("google ")
            .or_else(|| lower.strip_suffix(" on google").and_then(|s| s.strip_prefix("search ")))
        {
            return Ok(Command::new(
                ActionKind::SiteSearch,
                ParameterSet::with_query(rest),
                format!("Searching Google for {rest}"),
            ));
        }
        if let Some(rest) = lower
            .strip_prefix("search for ")
            .or_else(|| lower.strip_prefix("search "))
        {
            return Ok(Command::new(
                ActionKind::Search,
                ParameterSet::with_query(rest),
                format!("Searching for {rest}"),
            ));
        }
        if lower.contains("click") {
            let index = ordinal_in(&lower);
            return Ok(Command::new(
                ActionKind::Click,
                ParameterSet {
                    index,
                    ..Default::default()
                },
                "Clicking",
            ));
        }
        if let Some(rest) = lower
            .strip_prefix("open ")
            .or_else(|| lower.strip_prefix("go to "))
        {
            let site = rest.split_whitespace().next().unwrap_or(rest);
            let url = if site.contains('.') {
                format!("https://{site}")
            } else {
                format!("https://{site}.com")
            };
            return Ok(Command::new(
                ActionKind::Navigate,
                ParameterSet::with_url(url),
                format!("Opening {site}"),
            ));
        }
        if let Some(rest) = lower.strip_prefix("type ") {
            return Ok(Command::new(
                ActionKind::Type,
                ParameterSet {
                    text: Some(rest.to_string()),
                    ..Default::default()
                },
                "Typing",
            ));
        }

        Ok(Command::sentinel(UNRECOGNIZED_RESPONSE))
    }
}

fn ordinal_in(text: &str) -> Option<u32> {
    const ORDINALS: [(&str, u32); 5] = [
        ("first", 1),
        ("second", 2),
        ("third", 3),
        ("fourth", 4),
        ("fifth", 5),
    ];
    ORDINALS
        .iter()
        .find(|(word, _)| text.contains(word))
        .map(|(_, index)| *index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::FileCredentialStore;

    #[tokio::test]
    async fn missing_credential_becomes_setup_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            FileCredentialStore::new(dir.path().join("api-key"))
                .with_env_key("VOICEPILOT_TEST_PROVIDER_UNSET"),
        );
        let provider = GeminiIntentProvider::new(store, "gemini-2.5-flash");

        let err = provider.interpret("scroll down").await.unwrap_err();
        assert!(matches!(err, IntentError::MissingCredential));

        let command = interpret_or_sentinel(&provider, "scroll down").await;
        assert_eq!(command.action, ActionKind::None);
        assert_eq!(command.response, CREDENTIAL_MISSING_RESPONSE);
    }

    #[test]
    fn parses_command_wrapped_in_prose() {
        let text = "Here is your command:\n{\"action\":\"scroll\",\"parameters\":{\"direction\":\"down\"},\"response\":\"Scrolling down the page\"}\nDone!";
        let command = parse_command_text(text).unwrap();
        assert_eq!(command.action, ActionKind::Scroll);
        assert_eq!(command.parameters.direction, Some(Direction::Down));
    }

    #[test]
    fn garbage_reply_is_a_parse_error() {
        assert!(matches!(
            parse_command_text("I cannot help with that."),
            Err(IntentError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn mock_provider_covers_core_utterances() {
        let provider = MockIntentProvider;

        let play = provider.interpret("play karan aujla").await.unwrap();
        assert_eq!(play.action, ActionKind::PlayMedia);
        assert_eq!(play.parameters.query.as_deref(), Some("karan aujla"));

        let scroll = provider.interpret("scroll down the page").await.unwrap();
        assert_eq!(scroll.action, ActionKind::Scroll);
        assert_eq!(scroll.parameters.direction, Some(Direction::Down));

        let click = provider.interpret("click the third video").await.unwrap();
        assert_eq!(click.action, ActionKind::Click);
        assert_eq!(click.parameters.index, Some(3));

        let open = provider.interpret("open youtube").await.unwrap();
        assert_eq!(open.action, ActionKind::Navigate);
        assert_eq!(open.parameters.url.as_deref(), Some("https://youtube.com"));

        let google = provider.interpret("google who is elon musk").await.unwrap();
        assert_eq!(google.action, ActionKind::SiteSearch);

        let unknown = provider.interpret("mumble mumble").await.unwrap();
        assert_eq!(unknown.action, ActionKind::None);
        assert_eq!(unknown.response, UNRECOGNIZED_RESPONSE);
    }
}
