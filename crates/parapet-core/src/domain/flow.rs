use crate::{domain::webhook::WebhookEventId, EngineError, Payload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value object: Flow ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowId(pub String);

/// Value object: Flow run ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlowRunId(pub String);

/// A reusable unit of logic: an ordered step list, optionally nested under
/// a parent flow.
///
/// Flows form a forest. A flow without a parent is a root triggered
/// directly by webhooks; a flow with a parent is triggered only by the
/// successful completion of that parent. Definitions are owned by the
/// admin layer and read-only from the engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    /// Unique identifier
    pub id: FlowId,

    /// Human-readable name
    pub name: String,

    /// Description of what the flow does
    pub description: Option<String>,

    /// Raw step list as stored by the admin layer.
    ///
    /// Parsed into step definitions at execution time; `null` or an empty
    /// array means the identity flow.
    pub config: serde_json::Value,

    /// Disabled flows are skipped at fan-out time and rejected by the engine
    pub is_enabled: bool,

    /// Parent flow, if this flow is a cascade child
    pub parent_flow_id: Option<FlowId>,
}

impl Flow {
    /// Create a new enabled root flow
    pub fn new(name: &str, config: serde_json::Value) -> Self {
        Self {
            id: FlowId(Uuid::new_v4().to_string()),
            name: name.to_string(),
            description: None,
            config,
            is_enabled: true,
            parent_flow_id: None,
        }
    }

    /// Create a new enabled child flow of `parent`
    pub fn new_child(name: &str, config: serde_json::Value, parent: &FlowId) -> Self {
        let mut flow = Self::new(name, config);
        flow.parent_flow_id = Some(parent.clone());
        flow
    }

    /// Validate the definition before it is written.
    ///
    /// A flow cannot be its own parent. Deeper cycles in the parent chain
    /// are caught at execution time by the cascade depth guard.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.parent_flow_id.as_ref() == Some(&self.id) {
            return Err(EngineError::Validation(format!(
                "Flow {} cannot be its own parent",
                self.id.0
            )));
        }

        Ok(())
    }
}

/// Execution state shared by flow runs and queue items.
///
/// All transitions are one-way: `Pending → Processing → Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Enqueued, not yet claimed
    Pending,
    /// Claimed by a processor invocation
    Processing,
    /// All steps succeeded
    Completed,
    /// A step or the engine failed
    Failed,
}

impl RunStatus {
    /// Whether the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// One execution attempt of one flow against a specific input payload.
///
/// Created when work is enqueued, mutated only by the queue processor,
/// never mutated after reaching a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRun {
    /// Unique identifier
    pub id: FlowRunId,

    /// Flow being executed
    pub flow_id: FlowId,

    /// Delivery that triggered this run, unset for cascade children
    pub webhook_event_id: Option<WebhookEventId>,

    /// Execution state
    pub status: RunStatus,

    /// Input payload
    pub input: Payload,

    /// Output payload, set on completion
    pub output: Option<Payload>,

    /// Failure message, set on failure
    pub error: Option<String>,

    /// How many cascade hops separate this run from its triggering delivery
    pub cascade_depth: u32,

    /// Creation timestamp
    pub started_at: DateTime<Utc>,

    /// Terminal timestamp
    pub ended_at: Option<DateTime<Utc>>,
}

impl FlowRun {
    /// Create a pending run triggered directly by a webhook delivery
    pub fn for_event(flow_id: FlowId, event_id: WebhookEventId, input: Payload) -> Self {
        Self {
            id: FlowRunId(Uuid::new_v4().to_string()),
            flow_id,
            webhook_event_id: Some(event_id),
            status: RunStatus::Pending,
            input,
            output: None,
            error: None,
            cascade_depth: 0,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Create a pending run spawned by a completed parent run
    pub fn for_cascade(flow_id: FlowId, input: Payload, depth: u32) -> Self {
        Self {
            id: FlowRunId(Uuid::new_v4().to_string()),
            flow_id,
            webhook_event_id: None,
            status: RunStatus::Pending,
            input,
            output: None,
            error: None,
            cascade_depth: depth,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Claim the run for execution
    pub fn begin(&mut self) -> Result<(), EngineError> {
        if self.status != RunStatus::Pending {
            return Err(EngineError::InvalidTransition(format!(
                "Cannot begin run {} in state {:?}",
                self.id.0, self.status
            )));
        }
        self.status = RunStatus::Processing;
        Ok(())
    }

    /// Mark the run completed with its output
    pub fn complete(&mut self, output: Payload) -> Result<(), EngineError> {
        if self.status != RunStatus::Processing {
            return Err(EngineError::InvalidTransition(format!(
                "Cannot complete run {} in state {:?}",
                self.id.0, self.status
            )));
        }
        self.status = RunStatus::Completed;
        self.output = Some(output);
        self.ended_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the run failed with a captured message.
    ///
    /// No partial output is retained; only `error` is set.
    pub fn fail(&mut self, error: String) -> Result<(), EngineError> {
        if self.status.is_terminal() {
            return Err(EngineError::InvalidTransition(format!(
                "Cannot fail run {} in state {:?}",
                self.id.0, self.status
            )));
        }
        self.status = RunStatus::Failed;
        self.output = None;
        self.error = Some(error);
        self.ended_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flow_validate_rejects_self_parent() {
        let mut flow = Flow::new("scan-intake", json!([]));
        flow.parent_flow_id = Some(flow.id.clone());

        let result = flow.validate();
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_flow_validate_accepts_forest_shapes() {
        let root = Flow::new("root", json!([]));
        assert!(root.validate().is_ok());

        let child = Flow::new_child("child", json!([]), &root.id);
        assert!(child.validate().is_ok());
        assert_eq!(child.parent_flow_id, Some(root.id));
    }

    #[test]
    fn test_run_happy_path_transitions() {
        let mut run = FlowRun::for_event(
            FlowId("flow-1".to_string()),
            WebhookEventId("evt-1".to_string()),
            Payload::new(json!({"in": 1})),
        );
        assert_eq!(run.status, RunStatus::Pending);
        assert_eq!(run.cascade_depth, 0);

        run.begin().unwrap();
        assert_eq!(run.status, RunStatus::Processing);

        run.complete(Payload::new(json!({"out": 2}))).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.ended_at.is_some());
        assert_eq!(run.output.as_ref().unwrap().as_value()["out"], 2);
    }

    #[test]
    fn test_run_failure_clears_output() {
        let mut run = FlowRun::for_cascade(FlowId("flow-2".to_string()), Payload::null(), 3);
        assert!(run.webhook_event_id.is_none());
        assert_eq!(run.cascade_depth, 3);

        run.begin().unwrap();
        run.fail("step 2 exploded".to_string()).unwrap();

        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.output.is_none());
        assert_eq!(run.error.as_deref(), Some("step 2 exploded"));
    }

    #[test]
    fn test_terminal_runs_are_frozen() {
        let mut run = FlowRun::for_cascade(FlowId("flow-3".to_string()), Payload::null(), 0);
        run.begin().unwrap();
        run.complete(Payload::null()).unwrap();

        assert!(run.begin().is_err());
        assert!(run.fail("late".to_string()).is_err());
        assert!(run.complete(Payload::null()).is_err());
    }

    #[test]
    fn test_cannot_complete_unclaimed_run() {
        let mut run = FlowRun::for_cascade(FlowId("flow-4".to_string()), Payload::null(), 0);
        assert!(run.complete(Payload::null()).is_err());
    }

    #[test]
    fn test_status_terminality() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Processing.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(RunStatus::Failed.is_terminal());
    }
}
