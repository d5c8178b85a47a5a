use crate::{
    domain::flow::{FlowId, FlowRunId, RunStatus},
    EngineError, Payload,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name of the queue webhook fan-out lands in. Created on first use.
pub const DEFAULT_QUEUE: &str = "default";

/// Deterministic queue name for a cascade child flow
pub fn child_queue_name(flow_id: &FlowId) -> String {
    format!("flow-{}", flow_id.0)
}

/// Value object: Queue ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueId(pub String);

/// Value object: Queue item ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueItemId(pub String);

/// A named, independently enablable lane of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Queue {
    /// Unique identifier
    pub id: QueueId,

    /// Unique name (`default`, `flow-<flowId>`, ...)
    pub name: String,

    /// Description of the lane
    pub description: Option<String>,

    /// Disabled queues are skipped by the orchestrator and the processor
    pub is_enabled: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Queue {
    /// Create a new enabled queue
    pub fn new(name: &str, description: Option<&str>) -> Self {
        Self {
            id: QueueId(Uuid::new_v4().to_string()),
            name: name.to_string(),
            description: description.map(|d| d.to_string()),
            is_enabled: true,
            created_at: Utc::now(),
        }
    }
}

/// The unit of claimable work tying a flow run to a queue.
///
/// Its status mirrors the flow run's state machine; the processor keeps
/// the two consistent. `claimed_at` is the lease that lets a sweep return
/// items stuck in `Processing` to `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    /// Unique identifier
    pub id: QueueItemId,

    /// Queue this item belongs to
    pub queue_id: QueueId,

    /// Flow to execute
    pub flow_id: FlowId,

    /// Run tracking this execution
    pub flow_run_id: FlowRunId,

    /// Claim state
    pub status: RunStatus,

    /// Input payload for the run
    pub payload: Payload,

    /// Failure message, set on failure
    pub error: Option<String>,

    /// Enqueue timestamp; claim order is oldest-first within a queue
    pub created_at: DateTime<Utc>,

    /// When the current claim was taken, if any
    pub claimed_at: Option<DateTime<Utc>>,
}

impl QueueItem {
    /// Enqueue new work
    pub fn new(queue_id: QueueId, flow_id: FlowId, flow_run_id: FlowRunId, payload: Payload) -> Self {
        Self {
            id: QueueItemId(Uuid::new_v4().to_string()),
            queue_id,
            flow_id,
            flow_run_id,
            status: RunStatus::Pending,
            payload,
            error: None,
            created_at: Utc::now(),
            claimed_at: None,
        }
    }

    /// Mark the item completed
    pub fn complete(&mut self) -> Result<(), EngineError> {
        if self.status != RunStatus::Processing {
            return Err(EngineError::InvalidTransition(format!(
                "Cannot complete item {} in state {:?}",
                self.id.0, self.status
            )));
        }
        self.status = RunStatus::Completed;
        Ok(())
    }

    /// Mark the item failed with a captured message
    pub fn fail(&mut self, error: String) -> Result<(), EngineError> {
        if self.status.is_terminal() {
            return Err(EngineError::InvalidTransition(format!(
                "Cannot fail item {} in state {:?}",
                self.id.0, self.status
            )));
        }
        self.status = RunStatus::Failed;
        self.error = Some(error);
        Ok(())
    }
}
