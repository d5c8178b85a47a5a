//! Health check endpoint for the Parapet server
//!
//! This module contains the health check handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::server::ParapetServer;

/// Health check handler
///
/// Reports basic liveness plus the state store's reachability.
pub async fn health_check(State(server): State<Arc<ParapetServer>>) -> impl IntoResponse {
    let state_store_status = match server.check_state_store().await {
        Ok(()) => "UP",
        Err(_) => "DOWN",
    };

    let response = json!({
        "status": if state_store_status == "UP" { "UP" } else { "DOWN" },
        "version": env!("CARGO_PKG_VERSION"),
        "dependencies": {
            "stateStore": { "status": state_store_status },
        },
    });

    let overall = if state_store_status == "UP" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (overall, Json(response))
}
