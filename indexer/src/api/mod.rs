//! The Query Server: a read-only HTTP API over the Store and the latest
//! [`World`] replay (spec §4.6).
//!
//! Every handler returns `Result<impl IntoResponse, ApiError>` so status
//! mapping stays centralized in [`crate::error::ApiError`].

mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::sync::{watch, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::replay::{ReplayProgress, World};
use crate::store::Store;
use crate::sync::SyncStatus;

/// Shared state every handler reads. The replay world is rebuilt wholesale
/// and swapped in behind the `RwLock`; readers never block on a rebuild in
/// progress, they just keep seeing the previous world until it completes.
pub struct AppState {
    pub store: Arc<Store>,
    pub world: RwLock<Option<World>>,
    pub status_rx: watch::Receiver<SyncStatus>,
    pub rebuild_progress: watch::Sender<ReplayProgress>,
    pub rebuilding: std::sync::atomic::AtomicBool,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// Builds the full router: CORS permissive (`Access-Control-Allow-Origin: *`),
/// request tracing, and every route in spec §4.6's table.
#[must_use]
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/tables", get(handlers::tables))
        .route("/api/sync-state", get(handlers::sync_state))
        .route("/api/query", get(handlers::query))
        .route("/api/rebuild", post(handlers::rebuild))
        .route("/api/rebuild-status", get(handlers::rebuild_status))
        .route("/api/user/{addr}/pnl", get(handlers::user_pnl))
        .route("/api/user/{addr}/positions", get(handlers::user_positions))
        .route("/api/replay", get(handlers::replay_timeline))
        .route("/api/replay-positions", get(handlers::replay_positions))
        .route("/api/replay-trades", get(handlers::replay_trades))
        .route("/api/replay-users", get(handlers::replay_users))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
