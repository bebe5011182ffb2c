//! Indexer CLI
//!
//! Loads config, starts the Sync Coordinator and the Query Server
//! concurrently, and exits with a non-zero status on any fatal error
//! (spec §7).

use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indexer::api::{build_router, AppState};
use indexer::config::Settings;
use indexer::error::AppError;
use indexer::replay::ReplayProgress;
use indexer::store::Store;
use indexer::sync::{SyncCoordinator, SyncStatus};
use tokio::sync::{watch, RwLock};
use tracing::{error, info};

/// On-chain indexer and PnL replay engine for a prediction-market protocol.
#[derive(Parser, Debug)]
#[command(name = "indexer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path.
    #[arg(short, long, default_value = "./config.json")]
    config: std::path::PathBuf,

    /// Enable debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(default_directive.into()))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, fatal = e.is_fatal(), "indexer exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let settings = Settings::from_file(&cli.config)?;
    settings.validate().map_err(AppError::ConfigInvalid)?;

    info!(version = indexer::VERSION, config = %cli.config.display(), "starting indexer");

    let rpc = rpc_client::RpcClient::new(&settings.rpc_url, &settings.rpc_api_key)?;
    let store = Arc::new(Store::open(&settings.db_path).await?);

    let (status_tx, status_rx) = watch::channel(SyncStatus::default());
    let coordinator = SyncCoordinator::new(
        rpc,
        Arc::clone(&store),
        settings.initial_block,
        settings.sync_batch_size,
        Duration::from_secs(settings.sync_interval_seconds),
        status_tx,
    );

    let (rebuild_progress, _) = watch::channel(ReplayProgress::default());
    let app_state = Arc::new(AppState {
        store: Arc::clone(&store),
        world: RwLock::new(None),
        status_rx,
        rebuild_progress,
        rebuilding: AtomicBool::new(false),
    });
    let router = build_router(Arc::clone(&app_state));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", settings.api_port))
        .await
        .map_err(|e| AppError::Config(format!("binding api_port {}: {e}", settings.api_port)))?;

    info!(port = settings.api_port, "query server listening");

    tokio::select! {
        result = coordinator.run() => result,
        result = axum::serve(listener, router) => {
            result.map_err(|e| AppError::Config(format!("query server failed: {e}")))
        }
    }
}
