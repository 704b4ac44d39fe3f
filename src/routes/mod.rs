pub mod dashboard;
pub mod login;
pub mod speech;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// Assemble the API router.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(dashboard::routes())
        .merge(login::routes())
        .merge(speech::routes())
}
