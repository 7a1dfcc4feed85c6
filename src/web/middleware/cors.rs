use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// Permissive CORS for the JSON API. No cookies or credentials flow through
/// this node, so a wildcard origin is safe.
pub fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
