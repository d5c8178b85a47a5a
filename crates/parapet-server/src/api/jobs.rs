//! Background job endpoints
//!
//! The sweep endpoint is the scheduler's entry point: an external cron or
//! operator invokes it, the orchestrator does one bounded pass.

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::errors::ApiError;
use crate::server::ParapetServer;

/// Handle `POST /v1/admin/jobs/run`
pub async fn run_sweep_handler(
    State(server): State<Arc<ParapetServer>>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Queue sweep requested");

    let report = server.orchestrator().run_once().await?;

    Ok(Json(json!({
        "jobId": report.job_id.0,
        "processed": report.processed,
    })))
}
