use crate::{EngineError, Payload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Value object: Integration ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntegrationId(pub String);

/// A connection to an external service, referenced by integration steps.
///
/// Integrations are managed by the admin layer; the engine only reads them
/// to check enablement and hand their configuration to the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    /// Unique identifier
    pub id: IntegrationId,

    /// Human-readable name
    pub name: String,

    /// Disabled integrations fail the step that references them
    pub is_enabled: bool,

    /// Connection configuration (endpoints, scan targets, etc.)
    pub config: serde_json::Value,
}

/// Executes an integration against a payload.
///
/// This is the seam to the per-service scanner logic, which lives outside
/// the engine. The engine only needs an opaque call that returns an
/// enriched payload or an error message.
#[async_trait]
pub trait IntegrationExecutor: Send + Sync {
    /// Invoke the integration with the current payload
    async fn execute(
        &self,
        integration: &Integration,
        payload: &Payload,
    ) -> Result<Payload, EngineError>;
}
