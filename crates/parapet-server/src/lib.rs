//!
//! Parapet server - HTTP surface for the Parapet webhook processing engine
//!
//! This crate exposes the webhook delivery endpoint, the verification
//! probe, the queue sweep entry point and a health check over the core
//! engine services.

/// API module
pub mod api;

/// Server module
pub mod server;

/// Configuration module
pub mod config;

/// Error module
pub mod error;

// Re-export key types
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{LoggingExecutor, ParapetServer};

use std::sync::Arc;

/// Run function
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    // Initialize logging
    init_logging(&config);

    let server = ParapetServer::new(config, Arc::new(LoggingExecutor));
    server.run().await
}

/// Initialize logging
fn init_logging(config: &ServerConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    fmt().with_env_filter(filter).with_target(true).init();
}
