pub mod api;

pub use api::*;

use axum::Router;
use std::sync::Arc;

use crate::node::NodeContext;

/// Static/info routes outside the versioned JSON API (currently empty: this
/// node ships no browser UI, just the REST surface under `/api`).
pub fn create_web_routes() -> Router<Arc<NodeContext>> {
    Router::new()
}
