// Web middleware for request processing
pub mod cors;
pub mod logging;
pub mod rate_limit;

// Re-export middleware
pub use cors::*;
pub use logging::*;
pub use rate_limit::*;
