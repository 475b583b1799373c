//! Cachama binary: wires configuration, the SQLite catalog, the model runner
//! client and the HTTP server.

mod cli;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;

use cachama_api::{start_server, AppState};
use cachama_chat::{ChatClient, ChatPipeline, HttpTextGenerator};
use cachama_core::config::CachamaConfig;
use cachama_core::types::ChatMessage;
use cachama_storage::{Catalog, Database};

use cli::{CliArgs, Command, ServeArgs};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> AppResult<()> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let (mut config, load_error) = if config_file.exists() {
        match CachamaConfig::load(&config_file) {
            Ok(config) => (config, None),
            Err(e) => (CachamaConfig::default(), Some(e)),
        }
    } else {
        (CachamaConfig::default(), None)
    };

    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }
    config.inference.api_token = cli::resolve_ai_token(config.inference.api_token.take());

    // Logs go to stderr so `ask` output stays clean on stdout.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    match load_error {
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
        None => tracing::debug!(path = %config_file.display(), "Configuration resolved"),
    }

    match args.command {
        None => serve(config, ServeArgs::default()).await,
        Some(Command::Serve(serve_args)) => serve(config, serve_args).await,
        Some(Command::Seed { file }) => seed(&config, &file),
        Some(Command::Ask {
            message,
            server,
            html,
        }) => ask(&server, message, html.as_deref()).await,
    }
}

/// Open (or create) the catalog database under the data directory.
fn open_catalog(config: &CachamaConfig) -> AppResult<Catalog> {
    let data_dir = cli::expand_home(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join(&config.storage.db_file);
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "Catalog database opened");
    Ok(Catalog::new(Arc::new(db)))
}

async fn serve(mut config: CachamaConfig, serve_args: ServeArgs) -> AppResult<()> {
    tracing::info!("Starting Cachama v{}", env!("CARGO_PKG_VERSION"));
    config.server.port = serve_args.resolve_port(config.server.port);

    let catalog = open_catalog(&config)?;
    let records = catalog.count()?;
    if records == 0 {
        tracing::warn!("Catalog is empty; run `cachama seed <file.json>` to load the menu");
    } else {
        tracing::info!(records, "Catalog ready");
    }

    if config.inference.api_token.is_none() {
        tracing::warn!("No model runner token configured (CACHAMA_AI_TOKEN)");
    }
    let generator = HttpTextGenerator::new(&config.inference)?;
    tracing::info!(url = %generator.url(), model = %config.inference.model, "Model runner client ready");

    let pipeline = ChatPipeline::from_config(&config, Arc::new(catalog), Arc::new(generator));
    let state = AppState::new(config.clone(), pipeline);

    start_server(&config, state).await?;
    Ok(())
}

fn seed(config: &CachamaConfig, file: &Path) -> AppResult<()> {
    let catalog = open_catalog(config)?;
    let loaded = catalog.seed_from_json(file)?;
    let total = catalog.count()?;
    tracing::info!(loaded, total, file = %file.display(), "Catalog seeded");
    println!("Loaded {loaded} records ({total} in catalog)");
    Ok(())
}

/// Stream one answer to stdout. Ctrl-C stops reading and drops the
/// connection.
async fn ask(server: &str, message: String, html_out: Option<&Path>) -> AppResult<()> {
    let client = ChatClient::new(server);
    let mut stream = client.stream(vec![ChatMessage::user(message)]).await?;

    let mut stdout = std::io::stdout();
    let mut printed = 0;
    let mut last_markup = String::new();

    loop {
        tokio::select! {
            next = stream.next() => match next {
                Some(Ok(snapshot)) => {
                    stdout.write_all(snapshot.text[printed..].as_bytes())?;
                    stdout.flush()?;
                    printed = snapshot.text.len();
                    last_markup = snapshot.markup;
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Reply interrupted");
                    break;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }
    writeln!(stdout)?;

    if let Some(path) = html_out {
        std::fs::write(path, &last_markup)?;
        tracing::info!(path = %path.display(), "Rendered reply written");
    }
    Ok(())
}
