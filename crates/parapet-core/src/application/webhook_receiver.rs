use crate::{
    domain::{
        flow::{Flow, FlowRun},
        queue::{QueueItem, DEFAULT_QUEUE},
        repository::{
            FlowRepository, FlowRunRepository, QueueItemRepository, QueueRepository,
            WebhookEventRepository, WebhookRepository,
        },
        webhook::{WebhookEvent, WebhookEventId, WebhookId},
    },
    EngineError, Payload,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a verification probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Whether the webhook currently accepts deliveries
    pub is_enabled: bool,
    /// Number of enabled flows bound to the webhook
    pub active_flow_count: usize,
}

/// Authenticates inbound deliveries and fans them out into flow runs.
///
/// One accepted delivery produces exactly one event record plus one
/// flow run and one queue item per enabled bound flow, all in the
/// `default` queue.
pub struct WebhookReceiver {
    webhook_repo: Arc<dyn WebhookRepository>,
    event_repo: Arc<dyn WebhookEventRepository>,
    flow_repo: Arc<dyn FlowRepository>,
    run_repo: Arc<dyn FlowRunRepository>,
    queue_repo: Arc<dyn QueueRepository>,
    item_repo: Arc<dyn QueueItemRepository>,
}

impl WebhookReceiver {
    /// Create a new receiver over the given repositories
    pub fn new(
        webhook_repo: Arc<dyn WebhookRepository>,
        event_repo: Arc<dyn WebhookEventRepository>,
        flow_repo: Arc<dyn FlowRepository>,
        run_repo: Arc<dyn FlowRunRepository>,
        queue_repo: Arc<dyn QueueRepository>,
        item_repo: Arc<dyn QueueItemRepository>,
    ) -> Self {
        Self {
            webhook_repo,
            event_repo,
            flow_repo,
            run_repo,
            queue_repo,
            item_repo,
        }
    }

    /// Accept one delivery: authenticate, record the event, fan out.
    ///
    /// Rejections happen before any write. A missing webhook and a
    /// disabled one are indistinguishable to the caller.
    pub async fn receive(
        &self,
        webhook_id: &WebhookId,
        presented_token: &str,
        raw_body: &str,
    ) -> Result<WebhookEventId, EngineError> {
        let webhook = self.authenticate(webhook_id, presented_token).await?;

        let payload: serde_json::Value = serde_json::from_str(raw_body)
            .map_err(|e| EngineError::Validation(format!("Body is not valid JSON: {}", e)))?;
        let payload = Payload::new(payload);

        let mut event = WebhookEvent::new(webhook.id.clone(), payload.clone());
        self.event_repo.save(&event).await?;

        let flows = self.enabled_bound_flows(&webhook).await?;
        if flows.is_empty() {
            debug!(webhook = %webhook.id.0, event = %event.id.0, "Delivery has no bound flows");
        } else {
            let queue = self
                .queue_repo
                .find_or_create(DEFAULT_QUEUE, Some("Webhook fan-out queue"))
                .await?;

            for flow in &flows {
                let run = FlowRun::for_event(flow.id.clone(), event.id.clone(), payload.clone());
                self.run_repo.save(&run).await?;

                let item = QueueItem::new(
                    queue.id.clone(),
                    flow.id.clone(),
                    run.id.clone(),
                    payload.clone(),
                );
                if let Err(e) = self.item_repo.save(&item).await {
                    // A run without its paired item could never be picked
                    // up; compensate so it does not look like live work.
                    self.fail_orphan_run(run, &e).await;
                    return Err(e);
                }
            }
        }

        // Fan-out of zero runs still counts as finished fan-out.
        event.mark_processing()?;
        self.event_repo.save(&event).await?;

        info!(
            webhook = %webhook.id.0,
            event = %event.id.0,
            runs = flows.len(),
            "Delivery accepted"
        );

        Ok(event.id)
    }

    /// Connectivity probe: authenticates like `receive` but never writes
    pub async fn verify(
        &self,
        webhook_id: &WebhookId,
        presented_token: &str,
    ) -> Result<VerifyReport, EngineError> {
        let webhook = self.authenticate(webhook_id, presented_token).await?;
        let flows = self.enabled_bound_flows(&webhook).await?;

        Ok(VerifyReport {
            is_enabled: webhook.is_enabled,
            active_flow_count: flows.len(),
        })
    }

    async fn authenticate(
        &self,
        webhook_id: &WebhookId,
        presented_token: &str,
    ) -> Result<crate::domain::webhook::Webhook, EngineError> {
        let not_found = || EngineError::NotFound(format!("Webhook {}", webhook_id.0));

        let webhook = self
            .webhook_repo
            .find_by_id(webhook_id)
            .await?
            .ok_or_else(not_found)?;

        // A disabled webhook rejects exactly like a missing one.
        if !webhook.is_enabled {
            return Err(not_found());
        }

        if !webhook.token_matches(presented_token) {
            return Err(EngineError::Authentication(format!(
                "Invalid token for webhook {}",
                webhook_id.0
            )));
        }

        Ok(webhook)
    }

    async fn enabled_bound_flows(
        &self,
        webhook: &crate::domain::webhook::Webhook,
    ) -> Result<Vec<Flow>, EngineError> {
        let mut flows = Vec::with_capacity(webhook.bound_flows.len());
        for flow_id in &webhook.bound_flows {
            match self.flow_repo.find_by_id(flow_id).await? {
                Some(flow) if flow.is_enabled => flows.push(flow),
                Some(_) => debug!(flow = %flow_id.0, "Skipping disabled bound flow"),
                None => warn!(flow = %flow_id.0, "Webhook binds a missing flow"),
            }
        }
        Ok(flows)
    }

    async fn fail_orphan_run(&self, mut run: FlowRun, cause: &EngineError) {
        if run.fail(format!("Enqueue failed: {}", cause)).is_ok() {
            if let Err(e) = self.run_repo.save(&run).await {
                warn!(run = %run.id.0, error = %e, "Could not persist orphan run failure");
            }
        }
    }
}
