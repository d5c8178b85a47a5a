use crate::{
    application::queue_processor::QueueProcessor,
    domain::{
        job::{BackgroundJob, BackgroundJobId},
        repository::{BackgroundJobRepository, QueueRepository},
    },
    EngineError,
};
use chrono::Utc;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

/// Outcome of one orchestrator sweep
#[derive(Debug, Clone)]
pub struct SweepReport {
    /// Audit record for this invocation
    pub job_id: BackgroundJobId,
    /// Items completed per queue, keyed by queue name (sorted)
    pub processed: BTreeMap<String, usize>,
}

/// Sweeps every enabled queue once per invocation.
///
/// Queues are processed sequentially in name order so the per-queue FIFO
/// guarantee holds within a run and output stays deterministic. Each
/// invocation leaves one `BackgroundJob` audit record behind.
pub struct BatchOrchestrator {
    queue_repo: Arc<dyn QueueRepository>,
    job_repo: Arc<dyn BackgroundJobRepository>,
    processor: Arc<QueueProcessor>,
}

impl BatchOrchestrator {
    /// Name recorded on the audit records this orchestrator writes
    pub const JOB_NAME: &'static str = "queue-sweep";

    /// Create a new orchestrator
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        job_repo: Arc<dyn BackgroundJobRepository>,
        processor: Arc<QueueProcessor>,
    ) -> Self {
        Self {
            queue_repo,
            job_repo,
            processor,
        }
    }

    /// Run one bounded, terminating sweep over all enabled queues.
    ///
    /// Item-level failures inside `process` are already isolated; an
    /// error surfacing here is catastrophic and aborts the remaining
    /// queues, leaving the job record `Failed`.
    pub async fn run_once(&self) -> Result<SweepReport, EngineError> {
        let mut job = BackgroundJob::start(Self::JOB_NAME);
        self.job_repo.save(&job).await?;

        match self.sweep().await {
            Ok(processed) => {
                let results: Vec<_> = processed
                    .iter()
                    .map(|(queue, count)| json!({"queue": queue, "processed": count}))
                    .collect();
                job.complete(json!({
                    "startedAt": job.started_at.to_rfc3339(),
                    "finishedAt": Utc::now().to_rfc3339(),
                    "results": results,
                }))?;
                self.job_repo.save(&job).await?;

                info!(job = %job.id.0, queues = processed.len(), "Sweep completed");
                Ok(SweepReport {
                    job_id: job.id,
                    processed,
                })
            }
            Err(e) => {
                error!(job = %job.id.0, error = %e, "Sweep aborted");
                job.fail(e.to_string())?;
                self.job_repo.save(&job).await?;
                Err(e)
            }
        }
    }

    async fn sweep(&self) -> Result<BTreeMap<String, usize>, EngineError> {
        let mut processed = BTreeMap::new();
        for queue in self.queue_repo.list_enabled().await? {
            let count = self.processor.process(&queue.name).await?;
            processed.insert(queue.name, count);
        }
        Ok(processed)
    }
}
