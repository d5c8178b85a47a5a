use crate::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Value object: Background job ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BackgroundJobId(pub String);

/// Status of a batch orchestrator invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Sweep in progress
    Running,
    /// Sweep finished; metadata carries per-queue counts
    Completed,
    /// Sweep aborted by an uncaught error
    Failed,
}

/// Audit record of one batch orchestrator invocation.
///
/// Purely observational; never read back by the processing logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundJob {
    /// Unique identifier
    pub id: BackgroundJobId,

    /// Job name, e.g. `queue-sweep`
    pub name: String,

    /// Invocation status
    pub status: JobStatus,

    /// Start timestamp
    pub started_at: DateTime<Utc>,

    /// Terminal timestamp
    pub ended_at: Option<DateTime<Utc>>,

    /// Result blob recorded on completion
    pub metadata: serde_json::Value,

    /// Failure message, set on failure
    pub error: Option<String>,
}

impl BackgroundJob {
    /// Start a new job record
    pub fn start(name: &str) -> Self {
        Self {
            id: BackgroundJobId(Uuid::new_v4().to_string()),
            name: name.to_string(),
            status: JobStatus::Running,
            started_at: Utc::now(),
            ended_at: None,
            metadata: serde_json::Value::Null,
            error: None,
        }
    }

    /// Record successful completion with a metadata blob
    pub fn complete(&mut self, metadata: serde_json::Value) -> Result<(), EngineError> {
        if self.status != JobStatus::Running {
            return Err(EngineError::InvalidTransition(format!(
                "Cannot complete job {} in state {:?}",
                self.id.0, self.status
            )));
        }
        self.status = JobStatus::Completed;
        self.metadata = metadata;
        self.ended_at = Some(Utc::now());
        Ok(())
    }

    /// Record a failed invocation
    pub fn fail(&mut self, error: String) -> Result<(), EngineError> {
        if self.status != JobStatus::Running {
            return Err(EngineError::InvalidTransition(format!(
                "Cannot fail job {} in state {:?}",
                self.id.0, self.status
            )));
        }
        self.status = JobStatus::Failed;
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
    fn test_job_lifecycle() {
        let mut job = BackgroundJob::start("queue-sweep");
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.ended_at.is_none());

        job.complete(json!({"results": [{"queue": "default", "processed": 3}]}))
            .unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.ended_at.is_some());
        assert_eq!(job.metadata["results"][0]["processed"], 3);
    }

    #[test]
    fn test_job_failure() {
        let mut job = BackgroundJob::start("queue-sweep");
        job.fail("store unavailable".to_string()).unwrap();

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("store unavailable"));
    }

    #[test]
    fn test_terminal_job_is_frozen() {
        let mut job = BackgroundJob::start("queue-sweep");
        job.complete(json!({})).unwrap();

        assert!(job.fail("late".to_string()).is_err());
        assert!(job.complete(json!({})).is_err());
    }
}
