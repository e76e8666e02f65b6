//! End-to-end scenarios: utterance in, page mutation out, across the
//! full bus/controller/executor stack against the simulated host.

use std::sync::Arc;
use std::time::Duration;

use intent_core::{
    interpret_or_sentinel, FileCredentialStore, GeminiIntentProvider, CREDENTIAL_MISSING_RESPONSE,
};
use nav_controller::SurfaceHost;
use voicepilot_cli::config::AppConfig;
use voicepilot_cli::{shell, Session};

fn test_config() -> AppConfig {
    AppConfig {
        inject_settle_ms: 5,
        load_timeout_ms: 1_000,
        wait_timeout_ms: 100,
        media_result_settle_ms: 5,
        ..Default::default()
    }
}

async fn session() -> Session {
    Session::build(&test_config(), true).await.unwrap()
}

#[tokio::test]
async fn scroll_down_moves_viewport_without_navigation() {
    let sx = session().await;
    sx.host
        .navigate(sx.surface, "https://example.com/")
        .await
        .unwrap();

    let response = shell::handle_utterance(&sx, "scroll down").await;
    assert_eq!(response, "Scrolling the page");

    let dom = sx.host.dom(sx.surface).unwrap();
    assert!(dom
        .action_log()
        .iter()
        .any(|entry| entry.starts_with("scroll by 720")));
    // The only navigation was the explicit test setup.
    assert_eq!(
        sx.host.current_url(sx.surface).as_deref(),
        Some("https://example.com/")
    );
    sx.shutdown().await;
}

#[tokio::test]
async fn play_media_from_blank_surface_runs_the_two_step_flow() {
    let sx = session().await;

    let response = shell::handle_utterance(&sx, "play karan aujla").await;
    assert_eq!(response, "Searching for karan aujla");

    // The surface went straight to the results URL with the encoded
    // query.
    let url = sx.host.current_url(sx.surface).unwrap();
    assert!(url.starts_with("https://www.youtube.com/results?search_query="));
    assert!(url.contains("karan+aujla"));

    // The queued remainder lands once the results page is ready: an
    // executor is re-established and the first result gets clicked.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let dom = sx.host.dom(sx.surface).unwrap();
    let clicked = dom.clicked_labels();
    assert!(
        clicked.contains(&"video 1".to_string()),
        "expected first result click, got {clicked:?}"
    );
    sx.shutdown().await;
}

#[tokio::test]
async fn click_the_third_video_selects_the_third_visible_result() {
    let sx = session().await;
    sx.host
        .navigate(
            sx.surface,
            "https://www.youtube.com/results?search_query=lofi",
        )
        .await
        .unwrap();

    shell::handle_utterance(&sx, "click the third video").await;

    let dom = sx.host.dom(sx.surface).unwrap();
    assert_eq!(dom.clicked_labels(), vec!["video 3".to_string()]);
    // Scrolled into view before the click.
    assert!(dom
        .action_log()
        .iter()
        .any(|entry| entry == "center video 3"));
    sx.shutdown().await;
}

#[tokio::test]
async fn open_site_is_controller_mediated_from_a_live_page() {
    let sx = session().await;
    sx.host
        .navigate(sx.surface, "https://example.com/")
        .await
        .unwrap();

    let response = shell::handle_utterance(&sx, "open youtube").await;
    assert_eq!(response, "Opening youtube");
    assert_eq!(
        sx.host.current_url(sx.surface).as_deref(),
        Some("https://youtube.com")
    );
    sx.shutdown().await;
}

#[tokio::test]
async fn go_back_traverses_history() {
    let sx = session().await;
    sx.host
        .navigate(sx.surface, "https://example.com/")
        .await
        .unwrap();
    sx.host
        .navigate(sx.surface, "https://example.org/")
        .await
        .unwrap();

    shell::handle_utterance(&sx, "go back").await;
    assert_eq!(
        sx.host.current_url(sx.surface).as_deref(),
        Some("https://example.com/")
    );

    shell::handle_utterance(&sx, "go forward").await;
    assert_eq!(
        sx.host.current_url(sx.surface).as_deref(),
        Some("https://example.org/")
    );
    sx.shutdown().await;
}

#[tokio::test]
async fn missing_credential_short_circuits_without_side_effects() {
    let mut sx = session().await;
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        FileCredentialStore::new(dir.path().join("api-key"))
            .with_env_key("VOICEPILOT_E2E_UNSET_KEY"),
    );
    sx.provider = Arc::new(GeminiIntentProvider::new(store, "gemini-2.5-flash"));

    let response = shell::handle_utterance(&sx, "scroll down").await;
    assert_eq!(response, CREDENTIAL_MISSING_RESPONSE);

    // No navigation happened and the blank page saw no actions.
    assert_eq!(sx.host.current_url(sx.surface).as_deref(), Some("about:blank"));
    let dom = sx.host.dom(sx.surface).unwrap();
    assert!(dom.action_log().is_empty());
    sx.shutdown().await;
}

#[tokio::test]
async fn unintelligible_utterance_yields_generic_sentinel() {
    let sx = session().await;
    let provider = sx.provider.clone();
    let command = interpret_or_sentinel(provider.as_ref(), "mumble mumble").await;
    assert_eq!(command.action, voicepilot_core_types::ActionKind::None);
    assert_eq!(command.response, intent_core::UNRECOGNIZED_RESPONSE);
    sx.shutdown().await;
}
