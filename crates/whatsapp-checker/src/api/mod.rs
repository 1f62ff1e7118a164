//! HTTP API for the number checker.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::logging_middleware;
pub use types::*;

use crate::assets::{self, AssetBundle};
use crate::session::ConnectionManager;
use axum::{middleware as axum_middleware, routing::any, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// WhatsApp session
    pub session: Arc<ConnectionManager>,
    /// Frontend files
    pub assets: Arc<AssetBundle>,
}

impl AppState {
    pub fn new(session: Arc<ConnectionManager>, assets: AssetBundle) -> Self {
        Self {
            session,
            assets: Arc::new(assets),
        }
    }
}

/// Create the router: `/check` for lookups, everything else from the
/// frontend bundle.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/check", any(handlers::check_number))
        .fallback(assets::serve_asset)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
