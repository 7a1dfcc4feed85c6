use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};

/// Per-IP token-bucket rate limiter for the public API.
pub fn create_rate_limit_layer(requests_per_second: u32, burst_size: u32) -> GovernorLayer {
    let config = GovernorConfigBuilder::default()
        .per_second(requests_per_second as u64)
        .burst_size(burst_size)
        .finish()
        .expect("invalid rate limit configuration");

    GovernorLayer { config: Arc::new(config) }
}
