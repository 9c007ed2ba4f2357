use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use log::{info, warn};

use inbox_triage::agent::Orchestrator;
use inbox_triage::auth::{token_manager::TokenManager, token_store};
use inbox_triage::classifier::gemini::GeminiClassifier;
use inbox_triage::config::{load_config, resolve_db_path};
use inbox_triage::error::TriageError;
use inbox_triage::mail::gmail_client::GmailClient;
use inbox_triage::report::render_summary;
use inbox_triage::store::sqlite::SqliteStore;

#[derive(Parser)]
#[command(name = "inbox_triage")]
#[command(about = "Classify, label and mark read today's unread Gmail", long_about = None)]
struct Cli {
    /// Without a subcommand, runs one triage pass over today's unread mail
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Store the Gmail OAuth client secret in keyring
    SetClientSecret {
        #[arg(long)]
        client_id: String,
    },

    /// Store the classifier (Gemini) API key in keyring
    SetApiKey,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.cmd {
        Some(Command::SetClientSecret { client_id }) => {
            let secret = read_secret("client secret")?;
            token_store::save_client_secret(&client_id, &secret)?;
            println!("Saved client secret for client_id {}", client_id);
            Ok(())
        }
        Some(Command::SetApiKey) => {
            let key = read_secret("API key")?;
            token_store::save_classifier_key(&key)?;
            println!("Saved classifier API key");
            Ok(())
        }
        None => run(),
    }
}

fn run() -> Result<()> {
    let cfg = load_config().map_err(|e| anyhow!("Configuration error: {e}"))?;

    let api_key = classifier_api_key()?;
    let token_mgr = TokenManager::from_config(&cfg)
        .map_err(|e| TriageError::MissingCredential(format!("Gmail OAuth client: {e}")))?;

    let db_path = resolve_db_path(&cfg)?;
    let store = SqliteStore::open(&db_path)?;
    info!(
        "Processed-id store at {} ({} emails recorded)",
        db_path.display(),
        store.processed_count()?
    );

    let classifier = GeminiClassifier::new(api_key, cfg.model())?;
    let gmail = GmailClient::new(token_mgr)?;

    info!("Starting triage run with model {}", classifier.model());
    let outcome = Orchestrator::new(&gmail, &classifier, &store).run();

    print!("{}", render_summary(&outcome.state.results));

    if let Some(e) = outcome.halted {
        let id = outcome
            .state
            .current()
            .map(|m| m.id.as_str())
            .unwrap_or("(none)");
        warn!("Run stopped at email {id}: {e}. It will be retried on the next run.");
    }

    Ok(())
}

fn classifier_api_key() -> Result<String, TriageError> {
    let stored = token_store::load_classifier_key().unwrap_or_else(|e| {
        warn!("couldn't read classifier key from keyring: {e}");
        None
    });
    stored
        .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            TriageError::MissingCredential(
                "classifier API key: set GOOGLE_API_KEY or run `inbox_triage set-api-key`".into(),
            )
        })
}

fn read_secret(what: &str) -> Result<String> {
    eprintln!("Paste {what} (end with Ctrl-D):");
    let mut secret = String::new();
    std::io::Read::read_to_string(&mut std::io::stdin(), &mut secret)?;
    let secret = secret.trim();
    if secret.is_empty() {
        return Err(anyhow!("empty {what}"));
    }
    Ok(secret.to_string())
}
