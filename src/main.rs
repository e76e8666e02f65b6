use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use intent_core::{CredentialStore, FileCredentialStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicepilot_cli::config::AppConfig;
use voicepilot_cli::{shell, Session};

#[derive(Parser)]
#[command(name = "voicepilot", version, about = "Voice-driven web command orchestration")]
struct Cli {
    /// Configuration file (defaults to ./voicepilot.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive shell (default).
    Run {
        /// Use the deterministic offline intent provider.
        #[arg(long)]
        mock_intent: bool,

        /// Execute a single utterance and exit.
        utterance: Vec<String>,
    },
    /// Manage the stored model API key.
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store an API key.
    Set { key: String },
    /// Show whether a key is configured.
    Show,
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    let cfg = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Key { action }) => run_key(action).await,
        Some(Commands::Run {
            mock_intent,
            utterance,
        }) => run_session(&cfg, mock_intent, utterance).await,
        None => run_session(&cfg, false, Vec::new()).await,
    }
}

async fn run_key(action: KeyAction) -> Result<()> {
    let store = FileCredentialStore::default();
    match action {
        KeyAction::Set { key } => {
            store.set(&key).await?;
            println!("API key stored at {}", store.path().display());
        }
        KeyAction::Show => match store.get().await {
            Some(_) => println!("An API key is configured."),
            None => println!("No API key configured. Run: voicepilot key set <key>"),
        },
    }
    Ok(())
}

async fn run_session(cfg: &AppConfig, mock_intent: bool, utterance: Vec<String>) -> Result<()> {
    let session = Session::build(cfg, mock_intent).await?;

    if utterance.is_empty() {
        shell::run(&session).await?;
    } else {
        let response = shell::handle_utterance(&session, &utterance.join(" ")).await;
        println!("{response}");
    }

    session.shutdown().await;
    Ok(())
}
