use crate::{
    domain::{
        flow::{Flow, FlowRun},
        queue::{child_queue_name, QueueItem},
        repository::{
            FlowRepository, FlowRunRepository, IntegrationRepository, QueueItemRepository,
            QueueRepository,
        },
        step::{parse_steps, StepDefinition},
        integration::IntegrationExecutor,
    },
    EngineError, Payload,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Interprets a flow's step list against an input payload and spawns
/// cascade children from successful completions.
///
/// The service is deliberately stateless between calls; per-run state
/// lives in the repositories.
pub struct FlowExecutionService {
    flow_repo: Arc<dyn FlowRepository>,
    integration_repo: Arc<dyn IntegrationRepository>,
    integration_executor: Arc<dyn IntegrationExecutor>,
    run_repo: Arc<dyn FlowRunRepository>,
    queue_repo: Arc<dyn QueueRepository>,
    item_repo: Arc<dyn QueueItemRepository>,
    max_cascade_depth: u32,
}

impl FlowExecutionService {
    /// Create a new execution service
    pub fn new(
        flow_repo: Arc<dyn FlowRepository>,
        integration_repo: Arc<dyn IntegrationRepository>,
        integration_executor: Arc<dyn IntegrationExecutor>,
        run_repo: Arc<dyn FlowRunRepository>,
        queue_repo: Arc<dyn QueueRepository>,
        item_repo: Arc<dyn QueueItemRepository>,
        max_cascade_depth: u32,
    ) -> Self {
        Self {
            flow_repo,
            integration_repo,
            integration_executor,
            run_repo,
            queue_repo,
            item_repo,
            max_cascade_depth,
        }
    }

    /// Run a flow's steps strictly in order against `input`.
    ///
    /// Each step receives the previous step's output; the first receives
    /// the run's original input. A false condition short-circuits the
    /// remaining steps and the payload at that point becomes the output.
    pub async fn execute(&self, flow: &Flow, input: &Payload) -> Result<Payload, EngineError> {
        if !flow.is_enabled {
            return Err(EngineError::FlowDisabled(flow.id.0.clone()));
        }

        let steps = parse_steps(&flow.config)?;
        if steps.is_empty() {
            debug!(flow = %flow.id.0, "Identity flow, passing input through");
            return Ok(input.clone());
        }

        let mut payload = input.clone();
        for (index, step) in steps.iter().enumerate() {
            match step {
                StepDefinition::Integration { integration_id } => {
                    payload = self.run_integration_step(integration_id, &payload).await?;
                }
                StepDefinition::Transform(expr) => {
                    payload = expr.apply(&payload).map_err(|message| {
                        EngineError::StepExecution {
                            kind: "transform".to_string(),
                            message,
                        }
                    })?;
                }
                StepDefinition::Condition(expr) => {
                    let matched =
                        expr.evaluate(&payload)
                            .map_err(|message| EngineError::StepExecution {
                                kind: "condition".to_string(),
                                message,
                            })?;
                    if !matched {
                        debug!(
                            flow = %flow.id.0,
                            step = index,
                            "Condition false, short-circuiting remaining steps"
                        );
                        break;
                    }
                }
            }
        }

        Ok(payload)
    }

    /// Spawn runs for every enabled child of a completed flow.
    ///
    /// Children are enqueued into their own `flow-<childId>` queues with
    /// the completed run's output as input and no webhook event linkage.
    /// A cascade past the configured depth limit is refused outright.
    pub async fn cascade(
        &self,
        flow: &Flow,
        output: &Payload,
        parent_depth: u32,
    ) -> Result<usize, EngineError> {
        let children = self.flow_repo.find_enabled_children(&flow.id).await?;
        if children.is_empty() {
            return Ok(0);
        }

        let child_depth = parent_depth + 1;
        if child_depth > self.max_cascade_depth {
            return Err(EngineError::CascadeDepthExceeded {
                depth: child_depth,
                limit: self.max_cascade_depth,
            });
        }

        let mut spawned = 0;
        for child in &children {
            let queue = self
                .queue_repo
                .find_or_create(
                    &child_queue_name(&child.id),
                    Some(&format!("Cascade queue for flow {}", child.name)),
                )
                .await?;

            let run = FlowRun::for_cascade(child.id.clone(), output.clone(), child_depth);
            self.run_repo.save(&run).await?;

            let item = QueueItem::new(
                queue.id.clone(),
                child.id.clone(),
                run.id.clone(),
                output.clone(),
            );
            if let Err(e) = self.item_repo.save(&item).await {
                // Same pairing rule as webhook fan-out: a run with no item
                // must not be left looking like live work.
                let mut run = run;
                if run.fail(format!("Enqueue failed: {}", e)).is_ok() {
                    if let Err(save_err) = self.run_repo.save(&run).await {
                        warn!(run = %run.id.0, error = %save_err, "Could not persist orphan run failure");
                    }
                }
                return Err(e);
            }

            spawned += 1;
        }

        info!(
            flow = %flow.id.0,
            children = spawned,
            depth = child_depth,
            "Cascade spawned child runs"
        );
        Ok(spawned)
    }

    async fn run_integration_step(
        &self,
        integration_id: &crate::domain::integration::IntegrationId,
        payload: &Payload,
    ) -> Result<Payload, EngineError> {
        let step_failure = |message: String| EngineError::StepExecution {
            kind: "integration".to_string(),
            message,
        };

        let integration = self
            .integration_repo
            .find_by_id(integration_id)
            .await?
            .ok_or_else(|| step_failure(format!("Integration {} not found", integration_id.0)))?;

        if !integration.is_enabled {
            return Err(step_failure(format!(
                "Integration {} is disabled",
                integration_id.0
            )));
        }

        let mut enriched = self
            .integration_executor
            .execute(&integration, payload)
            .await
            .map_err(|e| step_failure(e.to_string()))?;

        enriched
            .set_path(
                &format!("provenance.{}", integration.id.0),
                json!({
                    "integration": integration.name,
                    "executedAt": chrono::Utc::now().to_rfc3339(),
                }),
            )
            .map_err(step_failure)?;

        Ok(enriched)
    }
}
