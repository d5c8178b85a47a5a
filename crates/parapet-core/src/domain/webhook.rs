use crate::{domain::flow::FlowId, EngineError, Payload};
use chrono::{DateTime, Utc};
use ring::digest;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value object: Webhook ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WebhookId(pub String);

/// Value object: Webhook event ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WebhookEventId(pub String);

impl WebhookEventId {
    /// Generate a fresh event ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// A registered inbound webhook identity.
///
/// The auth token is a bearer secret: generated once when the webhook is
/// created by the admin layer, shown once, stored opaque. Bound flows are
/// the roots triggered by deliveries to this identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Webhook {
    /// Unique identifier
    pub id: WebhookId,

    /// Human-readable name
    pub name: String,

    /// Description of what delivers to this webhook
    pub description: Option<String>,

    /// Bearer secret presented by the external sender
    pub auth_token: String,

    /// Disabled webhooks reject deliveries as if they did not exist
    pub is_enabled: bool,

    /// Flows triggered by deliveries to this webhook
    pub bound_flows: Vec<FlowId>,
}

impl Webhook {
    /// Create a new enabled webhook with a freshly generated token
    pub fn new(name: &str, description: Option<&str>) -> Self {
        Self {
            id: WebhookId(Uuid::new_v4().to_string()),
            name: name.to_string(),
            description: description.map(|d| d.to_string()),
            auth_token: Self::generate_token(),
            is_enabled: true,
            bound_flows: Vec::new(),
        }
    }

    /// Generate a bearer token for a new webhook
    pub fn generate_token() -> String {
        format!("pwh_{}", Uuid::new_v4().simple())
    }

    /// Compare a presented token against the stored one without leaking
    /// where they diverge.
    ///
    /// Both sides are hashed to fixed-length digests before the byte
    /// compare, so the comparison's timing is independent of the token
    /// contents.
    pub fn token_matches(&self, presented: &str) -> bool {
        let stored = digest::digest(&digest::SHA256, self.auth_token.as_bytes());
        let presented = digest::digest(&digest::SHA256, presented.as_bytes());
        stored.as_ref() == presented.as_ref()
    }
}

/// Status of a webhook event record.
///
/// Terminal success or failure of a delivery lives in its child flow runs;
/// the event itself only records whether fan-out has happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    /// Received, fan-out not yet finished
    Pending,
    /// Fan-out finished; flow runs (possibly zero) carry the outcome
    Processing,
}

/// Immutable audit record of one inbound delivery.
///
/// Created on receipt, updated exactly once after fan-out, never deleted
/// by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Unique identifier
    pub id: WebhookEventId,

    /// Webhook this delivery arrived on
    pub webhook_id: WebhookId,

    /// Raw delivered payload
    pub payload: Payload,

    /// Fan-out status
    pub status: EventStatus,

    /// Receipt timestamp
    pub received_at: DateTime<Utc>,
}

impl WebhookEvent {
    /// Record a new delivery
    pub fn new(webhook_id: WebhookId, payload: Payload) -> Self {
        Self {
            id: WebhookEventId::generate(),
            webhook_id,
            payload,
            status: EventStatus::Pending,
            received_at: Utc::now(),
        }
    }

    /// Mark fan-out as finished. One-way; a second call is rejected.
    pub fn mark_processing(&mut self) -> Result<(), EngineError> {
        if self.status != EventStatus::Pending {
            return Err(EngineError::InvalidTransition(format!(
                "Cannot mark event {} processing in state {:?}",
                self.id.0, self.status
            )));
        }
        self.status = EventStatus::Processing;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_webhook_creation_generates_token() {
        let webhook = Webhook::new("github-scanner", Some("GitHub org scan results"));

        assert!(webhook.is_enabled);
        assert!(webhook.bound_flows.is_empty());
        assert!(webhook.auth_token.starts_with("pwh_"));
        assert!(!webhook.id.0.is_empty());
    }

    #[test]
    fn test_tokens_are_unique() {
        assert_ne!(Webhook::generate_token(), Webhook::generate_token());
    }

    #[test]
    fn test_token_matches() {
        let webhook = Webhook::new("w", None);

        assert!(webhook.token_matches(&webhook.auth_token.clone()));
        assert!(!webhook.token_matches("pwh_wrong"));
        assert!(!webhook.token_matches(""));
    }

    #[test]
    fn test_event_starts_pending() {
        let event = WebhookEvent::new(
            WebhookId("wh-1".to_string()),
            Payload::new(json!({"finding": "open-bucket"})),
        );

        assert_eq!(event.status, EventStatus::Pending);
        assert!(event.received_at <= Utc::now());
    }

    #[test]
    fn test_mark_processing_is_one_way() {
        let mut event = WebhookEvent::new(WebhookId("wh-1".to_string()), Payload::null());

        event.mark_processing().unwrap();
        assert_eq!(event.status, EventStatus::Processing);

        let second = event.mark_processing();
        assert!(matches!(second, Err(EngineError::InvalidTransition(_))));
    }
}
