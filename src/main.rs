use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use formulary::app::{forward_session_changes, App, AppContext, AppEvent};
use formulary::config::{Config, API_KEY_ENV};
use formulary::identity::{IdentityToolkitClient, SessionTracker};
use formulary::records::FirestoreClient;
use formulary::storage::{Database, DatabaseError};
use formulary::theme::ThemeStore;
use formulary::ui;
use formulary::util::http::build_client;

/// Get the config directory path (~/.config/formulary/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("formulary"))
}

#[derive(Parser, Debug)]
#[command(
    name = "formulary",
    about = "Terminal client for browsing fragrance formulas"
)]
struct Args {
    /// Config file (default: ~/.config/formulary/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Delete all stored preferences (theme) before starting
    #[arg(long)]
    reset_prefs: bool,

    /// Override the Firestore project id from the config file
    #[arg(long, value_name = "ID")]
    project: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr and are off unless RUST_LOG is set, so the terminal
    // UI is not drawn over. Redirect with `2>formulary.log`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // User-only access: the directory holds the preference database.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o700);
        if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?
        .with_env_overrides();
    if let Some(project) = args.project {
        config.project_id = project;
    }

    if config.project_id.trim().is_empty() {
        eprintln!("Error: No Firestore project configured.");
        eprintln!();
        eprintln!("Add it to {}:", config_path.display());
        eprintln!("  project_id = \"your-project\"");
        eprintln!();
        eprintln!("Or pass --project <ID>.");
        std::process::exit(1);
    }
    if config.api_key.is_none() {
        eprintln!(
            "Warning: No API key configured; sign-in is disabled. Set api_key or {}.",
            API_KEY_ENV
        );
    }

    let db_path = config_dir.join("prefs.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of formulary appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    if args.reset_prefs {
        let cleared = db
            .clear_preferences()
            .await
            .context("Failed to reset preferences")?;
        println!("Preferences reset ({} entries removed).", cleared);
    }

    let http_client =
        build_client(config.request_timeout()).context("Failed to build HTTP client")?;
    let store = FirestoreClient::from_config(http_client.clone(), &config)
        .context("Invalid Firestore configuration")?;
    let identity = IdentityToolkitClient::from_config(http_client, &config)
        .context("Invalid identity configuration")?;

    let tracker = Arc::new(SessionTracker::new(Arc::new(identity)));
    let theme_store = ThemeStore::new(Arc::new(db.clone()));
    let theme_dark = theme_store.load_theme().await;

    tracing::info!(
        project = %config.project_id,
        collection = %config.collection,
        theme_dark,
        "Starting formulary"
    );

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    let ctx = AppContext {
        store: Arc::new(store),
        tracker: Arc::clone(&tracker),
        theme_store,
        collection: config.collection.clone(),
        request_timeout: config.request_timeout(),
    };
    let mut app = App::new(ctx, theme_dark, event_tx.clone());

    // The first notification (signed out) navigates to home.
    let forwarder = forward_session_changes(tracker.subscribe(), event_tx);

    let result = ui::run(&mut app, event_rx).await;
    forwarder.abort();
    result?;

    println!("Goodbye!");
    Ok(())
}
