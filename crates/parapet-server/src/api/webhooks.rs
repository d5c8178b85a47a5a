//! Webhook delivery endpoints
//!
//! Inbound deliveries and connectivity probes. The bearer token travels in
//! the `X-Webhook-Token` header; a missing header rejects before the
//! receiver is consulted.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::server::ParapetServer;
use parapet_core::WebhookId;

/// Header carrying the webhook bearer token
pub const TOKEN_HEADER: &str = "X-Webhook-Token";

fn presented_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            ApiError::Unauthorized(format!("Missing or unreadable {} header", TOKEN_HEADER))
        })
}

/// Handle `POST /v1/webhooks/:webhook_id/events`
pub async fn receive_event_handler(
    State(server): State<Arc<ParapetServer>>,
    Path(webhook_id): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let token = presented_token(&headers)?;

    let event_id = server
        .receiver()
        .receive(&WebhookId(webhook_id), token, &body)
        .await?;

    Ok(Json(json!({ "eventId": event_id.0 })))
}

/// Handle `GET /v1/webhooks/:webhook_id/verify`
pub async fn verify_webhook_handler(
    State(server): State<Arc<ParapetServer>>,
    Path(webhook_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let token = presented_token(&headers)?;

    let report = server
        .receiver()
        .verify(&WebhookId(webhook_id), token)
        .await?;

    Ok(Json(json!({
        "enabled": report.is_enabled,
        "activeFlowCount": report.active_flow_count,
    })))
}
