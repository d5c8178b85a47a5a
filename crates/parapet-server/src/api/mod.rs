//! API module for the Parapet server
//!
//! This module contains the API routes and handlers.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod errors;
pub mod health;
pub mod jobs;
pub mod webhooks;

use crate::server::ParapetServer;

/// Build the router for API endpoints
pub fn build_router(server: Arc<ParapetServer>) -> Router {
    Router::new()
        // Webhook delivery
        .route(
            "/v1/webhooks/:webhook_id/events",
            post(webhooks::receive_event_handler),
        )
        .route(
            "/v1/webhooks/:webhook_id/verify",
            get(webhooks::verify_webhook_handler),
        )
        // Queue sweep, invoked by an external scheduler
        .route("/v1/admin/jobs/run", post(jobs::run_sweep_handler))
        // Health check
        .route("/health", get(health::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}
