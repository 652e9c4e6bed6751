use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use pany::{
    config::Config, db, embeddings::ClipEmbedder, routes::create_router, utils::init_logger,
    AppState,
};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "pany", version, about = "Multi-modal semantic search service")]
struct Cli {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long, short)]
    port: Option<u16>,

    /// Do not run database migrations on startup
    #[arg(long)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let _log_guard = init_logger(&config.logging);
    info!("Starting Pany Embedding Service...");
    info!("Configuration loaded: {:?}", config.server);

    // Connect to database
    let pool = db::create_pool(&config.database).await?;
    if !cli.skip_migrations {
        db::run_migrations(&pool).await?;
    }

    // Load the CLIP encoders off the async runtime
    let embedding_config = config.embedding.clone();
    let embedder = tokio::task::spawn_blocking(move || ClipEmbedder::load(&embedding_config))
        .await
        .context("Model loading task panicked")??;
    info!("All services initialized successfully");

    // Create shared state
    let state = AppState {
        pool,
        config: config.clone(),
        embedder: Arc::new(embedder),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let ip = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid HOST: {}", config.server.host))?;
    let addr = SocketAddr::new(ip, config.server.port);
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down Pany Embedding Service...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
