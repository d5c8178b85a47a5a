use crate::{
    application::flow_execution_service::FlowExecutionService,
    domain::{
        flow::RunStatus,
        queue::QueueItem,
        repository::{FlowRepository, FlowRunRepository, QueueItemRepository, QueueRepository},
    },
    EngineError,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Tuning knobs for one processor instance
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum items claimed per `process` call
    pub batch_size: usize,
    /// Per-item execution deadline
    pub item_timeout: Duration,
    /// Age after which a `Processing` claim is considered abandoned
    pub stale_after: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            item_timeout: Duration::from_secs(60),
            stale_after: Duration::from_secs(300),
        }
    }
}

/// Claims batches of pending queue items and drives each through the
/// flow execution engine.
///
/// Items of one batch run concurrently and independently; one item's
/// failure never aborts or rolls back a sibling.
pub struct QueueProcessor {
    queue_repo: Arc<dyn QueueRepository>,
    item_repo: Arc<dyn QueueItemRepository>,
    run_repo: Arc<dyn FlowRunRepository>,
    flow_repo: Arc<dyn FlowRepository>,
    engine: Arc<FlowExecutionService>,
    config: ProcessorConfig,
}

impl QueueProcessor {
    /// Create a new processor
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        item_repo: Arc<dyn QueueItemRepository>,
        run_repo: Arc<dyn FlowRunRepository>,
        flow_repo: Arc<dyn FlowRepository>,
        engine: Arc<FlowExecutionService>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            queue_repo,
            item_repo,
            run_repo,
            flow_repo,
            engine,
            config,
        }
    }

    /// Process one batch from the named queue.
    ///
    /// A missing or disabled queue yields 0 — both are valid operational
    /// states, not failures. Returns the number of items that reached
    /// `Completed` in this invocation.
    pub async fn process(&self, queue_name: &str) -> Result<usize, EngineError> {
        let queue = match self.queue_repo.find_by_name(queue_name).await? {
            Some(queue) if queue.is_enabled => queue,
            Some(_) => {
                debug!(queue = queue_name, "Queue disabled, skipping");
                return Ok(0);
            }
            None => {
                debug!(queue = queue_name, "Queue does not exist, skipping");
                return Ok(0);
            }
        };

        // Reclaim work abandoned by a crashed processor before claiming.
        let stale_cutoff = Utc::now()
            - chrono::Duration::from_std(self.config.stale_after)
                .map_err(|e| EngineError::Validation(format!("stale_after out of range: {}", e)))?;
        let released = self.item_repo.release_stale(&queue.id, stale_cutoff).await?;
        if released > 0 {
            warn!(queue = queue_name, released, "Requeued stale processing items");
        }

        let items = self
            .item_repo
            .claim_pending(&queue.id, self.config.batch_size)
            .await?;
        if items.is_empty() {
            return Ok(0);
        }

        let claimed = items.len();
        let outcomes =
            futures::future::join_all(items.into_iter().map(|item| self.process_item(item))).await;
        let succeeded = outcomes.into_iter().filter(|ok| *ok).count();

        info!(queue = queue_name, claimed, succeeded, "Batch processed");
        Ok(succeeded)
    }

    /// Drive one claimed item to a terminal state. Never propagates an
    /// error to siblings; storage failures are logged and count as not
    /// succeeded.
    async fn process_item(&self, item: QueueItem) -> bool {
        let item_id = item.id.clone();
        match self.try_process_item(item).await {
            Ok(succeeded) => succeeded,
            Err(e) => {
                error!(item = %item_id.0, error = %e, "Item processing aborted by storage failure");
                false
            }
        }
    }

    async fn try_process_item(&self, mut item: QueueItem) -> Result<bool, EngineError> {
        // The item is already Processing from the claim; mirror that on
        // the run before executing.
        let mut run = match self.run_repo.find_by_id(&item.flow_run_id).await? {
            Some(run) => run,
            None => {
                item.fail(format!("Flow run {} not found", item.flow_run_id.0))?;
                self.item_repo.save(&item).await?;
                return Ok(false);
            }
        };
        match run.status {
            // First claim
            RunStatus::Pending => {
                run.begin()?;
                self.run_repo.save(&run).await?;
            }
            // A stale-released item carries a run that already holds the
            // claim from the abandoned attempt; execution just restarts.
            RunStatus::Processing => {
                debug!(run = %run.id.0, "Reclaiming run from an abandoned attempt");
            }
            // A terminal run must never be re-executed.
            _ => {
                item.fail(format!(
                    "Flow run {} already {:?}",
                    item.flow_run_id.0, run.status
                ))?;
                self.item_repo.save(&item).await?;
                return Ok(false);
            }
        }

        let flow = match self.flow_repo.find_by_id(&item.flow_id).await? {
            Some(flow) => flow,
            None => {
                let message = format!("Flow {} not found", item.flow_id.0);
                return self.finish_failed(item, run, message).await;
            }
        };

        let result =
            tokio::time::timeout(self.config.item_timeout, self.engine.execute(&flow, &item.payload))
                .await;

        match result {
            Ok(Ok(output)) => {
                item.complete()?;
                self.item_repo.save(&item).await?;
                run.complete(output.clone())?;
                self.run_repo.save(&run).await?;

                // The run is terminal; a cascade failure here is logged,
                // never rewritten onto the completed run.
                match self.engine.cascade(&flow, &output, run.cascade_depth).await {
                    Ok(spawned) if spawned > 0 => {
                        debug!(run = %run.id.0, spawned, "Cascade enqueued child work");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(run = %run.id.0, error = %e, "Cascade refused or failed");
                    }
                }

                Ok(true)
            }
            Ok(Err(e)) => self.finish_failed(item, run, e.to_string()).await,
            Err(_) => {
                let message =
                    EngineError::Timeout(self.config.item_timeout.as_millis() as u64).to_string();
                self.finish_failed(item, run, message).await
            }
        }
    }

    async fn finish_failed(
        &self,
        mut item: QueueItem,
        mut run: crate::domain::flow::FlowRun,
        message: String,
    ) -> Result<bool, EngineError> {
        warn!(item = %item.id.0, run = %run.id.0, error = %message, "Flow run failed");

        item.fail(message.clone())?;
        self.item_repo.save(&item).await?;
        run.fail(message)?;
        self.run_repo.save(&run).await?;

        Ok(false)
    }
}
