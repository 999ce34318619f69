mod auth;
mod catalog;
mod config;
mod db;
mod errors;
mod export;
mod inference;
mod library;
mod llm_client;
mod models;
mod prompt;
mod routes;
mod state;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::{seed_catalog_file, CatalogStore};
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::inference::InferenceRouter;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "promptkit")]
#[command(about = "Prompt builder API: catalog, prompt assembly, library and generation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Default)]
enum Command {
    /// Run the HTTP server (default)
    #[default]
    Serve,
    /// Create the database schema and seed the catalog file, then exit
    InitDb,
    /// Check that the database is reachable
    CheckDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.unwrap_or_default() {
        Command::Serve => serve(config).await,
        Command::InitDb => init_db(&config).await,
        Command::CheckDb => {
            let db = create_pool(&config.database_url).await?;
            db::ping(&db).await?;
            info!("Database reachable at {}", config.database_url);
            Ok(())
        }
    }
}

async fn init_db(config: &Config) -> Result<()> {
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;
    if seed_catalog_file(Path::new(&config.catalog_path)).await? {
        info!("Seeded catalog at {}", config.catalog_path);
    }
    info!("Database schema ready");
    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    info!("Starting promptkit API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Load the catalog, seeding the bundled one on first start
    let catalog_path = Path::new(&config.catalog_path);
    if seed_catalog_file(catalog_path).await? {
        info!("Seeded catalog at {}", catalog_path.display());
    }
    let catalog = Arc::new(CatalogStore::open(catalog_path).await?);

    // The OpenAI client is optional; without a key generation runs in mock mode
    let llm = match config.openai_api_key.clone() {
        Some(key) => {
            let mut client = LlmClient::new(key)?;
            if let Some(url) = config.openai_api_url.as_deref() {
                client = client.with_api_url(url);
            }
            info!("LLM client initialized (default model: {})", llm_client::DEFAULT_MODEL);
            Some(client)
        }
        None => {
            info!("OPENAI_API_KEY not set, generation runs in mock mode");
            None
        }
    };

    let inference = Arc::new(InferenceRouter::with_defaults(
        llm.clone(),
        config.inference_timeout,
    ));
    info!("Inference providers: {:?}", inference.provider_ids());

    let state = AppState {
        db,
        catalog,
        inference,
        llm,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
