use thiserror::Error;

/// Core error type for the Parapet engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Webhook token missing or mismatched
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Unknown webhook, flow, queue, or integration
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed payload or invalid configuration
    #[error("Validation error: {0}")]
    Validation(String),

    /// A specific step failed, aborting the rest of the flow run
    #[error("Step '{kind}' failed: {message}")]
    StepExecution {
        /// Kind of the step that failed
        kind: String,
        /// Failure message from the step
        message: String,
    },

    /// A step kind the engine does not recognize
    #[error("Unknown step kind: {0}")]
    UnknownStepKind(String),

    /// Execution was requested for a disabled flow
    #[error("Flow is disabled: {0}")]
    FlowDisabled(String),

    /// A cascade tried to spawn children past the configured depth limit
    #[error("Cascade depth {depth} exceeds limit {limit}")]
    CascadeDepthExceeded {
        /// Depth the child runs would have had
        depth: u32,
        /// Configured maximum depth
        limit: u32,
    },

    /// A queue item exceeded its execution deadline
    #[error("Execution timed out after {0}ms")]
    Timeout(u64),

    /// Storage unavailable or inconsistent
    #[error("State store error: {0}")]
    StateStore(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An invalid state transition was attempted
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),
}

impl EngineError {
    /// Whether the error is a candidate for automatic retry.
    ///
    /// Only storage failures qualify; step-logic failures are terminal for
    /// the run that hit them.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::StateStore(_))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (
                EngineError::Authentication("bad token".to_string()),
                "Authentication failed: bad token",
            ),
            (
                EngineError::NotFound("Webhook wh-1".to_string()),
                "Webhook wh-1 not found",
            ),
            (
                EngineError::Validation("not json".to_string()),
                "Validation error: not json",
            ),
            (
                EngineError::StepExecution {
                    kind: "integration".to_string(),
                    message: "scanner offline".to_string(),
                },
                "Step 'integration' failed: scanner offline",
            ),
            (
                EngineError::UnknownStepKind("teleport".to_string()),
                "Unknown step kind: teleport",
            ),
            (
                EngineError::FlowDisabled("flow-1".to_string()),
                "Flow is disabled: flow-1",
            ),
            (
                EngineError::CascadeDepthExceeded { depth: 11, limit: 10 },
                "Cascade depth 11 exceeds limit 10",
            ),
            (EngineError::Timeout(5000), "Execution timed out after 5000ms"),
            (
                EngineError::StateStore("lock poisoned".to_string()),
                "State store error: lock poisoned",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_only_state_store_is_transient() {
        assert!(EngineError::StateStore("down".to_string()).is_transient());
        assert!(!EngineError::UnknownStepKind("x".to_string()).is_transient());
        assert!(!EngineError::Timeout(100).is_transient());
        assert!(!EngineError::StepExecution {
            kind: "transform".to_string(),
            message: "boom".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let error: EngineError = json_error.into();

        match error {
            EngineError::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization variant"),
        }
    }
}
