pub mod assets;
pub mod auth;
pub mod cache;
pub mod chart;
pub mod config;
pub mod error;
pub mod market;
pub mod report;
pub mod routes;
pub mod session;
pub mod speech;
pub mod state;
pub mod timezone;

use std::sync::Arc;

use axum::middleware;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::auth::GateContext;
use crate::state::AppState;

/// Assemble the full application router: API routes, health probe and the
/// static frontend, wrapped in the session gate and permissive CORS.
pub fn build_router(state: Arc<AppState>) -> Router {
    let gate = GateContext {
        sessions: Arc::clone(&state.sessions),
        enabled: state.auth_required(),
    };

    let api = routes::api_router();

    Router::new()
        .merge(api)
        .route("/health", axum::routing::get(health))
        .fallback_service(
            ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true),
        )
        .layer(middleware::from_fn(auth::require_session))
        .layer(axum::Extension(gate))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}
