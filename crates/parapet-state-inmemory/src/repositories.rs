//! In-memory repository implementations.
//!
//! Point-lookup tables use `DashMap`; queues and queue items sit behind a
//! single `RwLock`ed map because their interesting operations (lazy
//! creation, batch claim, stale release) must be atomic across rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use parapet_core::{
    domain::{
        flow::{Flow, FlowId, FlowRun, FlowRunId},
        integration::{Integration, IntegrationId},
        job::{BackgroundJob, BackgroundJobId},
        queue::{Queue, QueueId, QueueItem, QueueItemId},
        repository::{
            BackgroundJobRepository, FlowRepository, FlowRunRepository, IntegrationRepository,
            QueueItemRepository, QueueRepository, WebhookEventRepository, WebhookRepository,
        },
        webhook::{Webhook, WebhookEvent, WebhookEventId, WebhookId},
    },
    EngineError, RunStatus,
};

/// In-memory webhook registry
#[derive(Default)]
pub struct InMemoryWebhookRepository {
    webhooks: DashMap<String, Webhook>,
}

impl InMemoryWebhookRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookRepository for InMemoryWebhookRepository {
    async fn find_by_id(&self, id: &WebhookId) -> Result<Option<Webhook>, EngineError> {
        Ok(self.webhooks.get(&id.0).map(|w| w.clone()))
    }

    async fn save(&self, webhook: &Webhook) -> Result<(), EngineError> {
        self.webhooks.insert(webhook.id.0.clone(), webhook.clone());
        Ok(())
    }
}

/// In-memory delivery audit table
#[derive(Default)]
pub struct InMemoryWebhookEventRepository {
    events: DashMap<String, WebhookEvent>,
}

impl InMemoryWebhookEventRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn find_by_id(&self, id: &WebhookEventId) -> Result<Option<WebhookEvent>, EngineError> {
        Ok(self.events.get(&id.0).map(|e| e.clone()))
    }

    async fn save(&self, event: &WebhookEvent) -> Result<(), EngineError> {
        self.events.insert(event.id.0.clone(), event.clone());
        Ok(())
    }

    async fn count(&self) -> Result<usize, EngineError> {
        Ok(self.events.len())
    }
}

/// In-memory flow definition table
#[derive(Default)]
pub struct InMemoryFlowRepository {
    flows: DashMap<String, Flow>,
}

impl InMemoryFlowRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowRepository for InMemoryFlowRepository {
    async fn find_by_id(&self, id: &FlowId) -> Result<Option<Flow>, EngineError> {
        Ok(self.flows.get(&id.0).map(|f| f.clone()))
    }

    async fn save(&self, flow: &Flow) -> Result<(), EngineError> {
        flow.validate()?;
        self.flows.insert(flow.id.0.clone(), flow.clone());
        Ok(())
    }

    async fn find_enabled_children(&self, parent: &FlowId) -> Result<Vec<Flow>, EngineError> {
        let mut children: Vec<Flow> = self
            .flows
            .iter()
            .filter(|entry| {
                entry.is_enabled && entry.parent_flow_id.as_ref() == Some(parent)
            })
            .map(|entry| entry.clone())
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }
}

/// In-memory flow run table
#[derive(Default)]
pub struct InMemoryFlowRunRepository {
    runs: DashMap<String, FlowRun>,
}

impl InMemoryFlowRunRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowRunRepository for InMemoryFlowRunRepository {
    async fn find_by_id(&self, id: &FlowRunId) -> Result<Option<FlowRun>, EngineError> {
        Ok(self.runs.get(&id.0).map(|r| r.clone()))
    }

    async fn save(&self, run: &FlowRun) -> Result<(), EngineError> {
        self.runs.insert(run.id.0.clone(), run.clone());
        Ok(())
    }

    async fn list_for_event(
        &self,
        event_id: &WebhookEventId,
    ) -> Result<Vec<FlowRun>, EngineError> {
        let mut runs: Vec<FlowRun> = self
            .runs
            .iter()
            .filter(|entry| entry.webhook_event_id.as_ref() == Some(event_id))
            .map(|entry| entry.clone())
            .collect();
        runs.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(runs)
    }

    async fn list_for_flow(&self, flow_id: &FlowId) -> Result<Vec<FlowRun>, EngineError> {
        let mut runs: Vec<FlowRun> = self
            .runs
            .iter()
            .filter(|entry| &entry.flow_id == flow_id)
            .map(|entry| entry.clone())
            .collect();
        runs.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(runs)
    }
}

/// In-memory queue table, keyed by unique name
#[derive(Default)]
pub struct InMemoryQueueRepository {
    queues: RwLock<HashMap<String, Queue>>,
}

impl InMemoryQueueRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueRepository for InMemoryQueueRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Queue>, EngineError> {
        Ok(self.queues.read().await.get(name).cloned())
    }

    async fn find_or_create(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Queue, EngineError> {
        let mut queues = self.queues.write().await;
        if let Some(existing) = queues.get(name) {
            return Ok(existing.clone());
        }
        let queue = Queue::new(name, description);
        queues.insert(name.to_string(), queue.clone());
        Ok(queue)
    }

    async fn save(&self, queue: &Queue) -> Result<(), EngineError> {
        self.queues
            .write()
            .await
            .insert(queue.name.clone(), queue.clone());
        Ok(())
    }

    async fn list_enabled(&self) -> Result<Vec<Queue>, EngineError> {
        let mut enabled: Vec<Queue> = self
            .queues
            .read()
            .await
            .values()
            .filter(|q| q.is_enabled)
            .cloned()
            .collect();
        enabled.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(enabled)
    }
}

/// In-memory queue item table.
///
/// A single lock over the whole table makes the claim an atomic
/// conditional update: two concurrent claimers serialize on the write
/// lock, and the second only sees items the first left behind.
#[derive(Default)]
pub struct InMemoryQueueItemRepository {
    items: RwLock<HashMap<String, QueueItem>>,
}

impl InMemoryQueueItemRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueItemRepository for InMemoryQueueItemRepository {
    async fn find_by_id(&self, id: &QueueItemId) -> Result<Option<QueueItem>, EngineError> {
        Ok(self.items.read().await.get(&id.0).cloned())
    }

    async fn save(&self, item: &QueueItem) -> Result<(), EngineError> {
        self.items
            .write()
            .await
            .insert(item.id.0.clone(), item.clone());
        Ok(())
    }

    async fn claim_pending(
        &self,
        queue_id: &QueueId,
        limit: usize,
    ) -> Result<Vec<QueueItem>, EngineError> {
        let mut items = self.items.write().await;

        let mut candidates: Vec<(DateTime<Utc>, String)> = items
            .values()
            .filter(|item| item.queue_id == *queue_id && item.status == RunStatus::Pending)
            .map(|item| (item.created_at, item.id.0.clone()))
            .collect();
        // FIFO, with the id as tie-breaker for same-instant enqueues
        candidates.sort();
        candidates.truncate(limit);

        let now = Utc::now();
        let mut claimed = Vec::with_capacity(candidates.len());
        for (_, id) in candidates {
            if let Some(item) = items.get_mut(&id) {
                item.status = RunStatus::Processing;
                item.claimed_at = Some(now);
                claimed.push(item.clone());
            }
        }

        Ok(claimed)
    }

    async fn release_stale(
        &self,
        queue_id: &QueueId,
        claimed_before: DateTime<Utc>,
    ) -> Result<usize, EngineError> {
        let mut items = self.items.write().await;

        let mut released = 0;
        for item in items.values_mut() {
            if item.queue_id == *queue_id
                && item.status == RunStatus::Processing
                && item.claimed_at.is_some_and(|at| at < claimed_before)
            {
                item.status = RunStatus::Pending;
                item.claimed_at = None;
                released += 1;
            }
        }

        Ok(released)
    }

    async fn list_for_queue(&self, queue_id: &QueueId) -> Result<Vec<QueueItem>, EngineError> {
        let mut matching: Vec<QueueItem> = self
            .items
            .read()
            .await
            .values()
            .filter(|item| item.queue_id == *queue_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| (a.created_at, &a.id.0).cmp(&(b.created_at, &b.id.0)));
        Ok(matching)
    }
}

/// In-memory background job audit table
#[derive(Default)]
pub struct InMemoryBackgroundJobRepository {
    jobs: DashMap<String, BackgroundJob>,
}

impl InMemoryBackgroundJobRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BackgroundJobRepository for InMemoryBackgroundJobRepository {
    async fn find_by_id(&self, id: &BackgroundJobId) -> Result<Option<BackgroundJob>, EngineError> {
        Ok(self.jobs.get(&id.0).map(|j| j.clone()))
    }

    async fn save(&self, job: &BackgroundJob) -> Result<(), EngineError> {
        self.jobs.insert(job.id.0.clone(), job.clone());
        Ok(())
    }
}

/// In-memory integration reference table
#[derive(Default)]
pub struct InMemoryIntegrationRepository {
    integrations: DashMap<String, Integration>,
}

impl InMemoryIntegrationRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IntegrationRepository for InMemoryIntegrationRepository {
    async fn find_by_id(&self, id: &IntegrationId) -> Result<Option<Integration>, EngineError> {
        Ok(self.integrations.get(&id.0).map(|i| i.clone()))
    }

    async fn save(&self, integration: &Integration) -> Result<(), EngineError> {
        self.integrations
            .insert(integration.id.0.clone(), integration.clone());
        Ok(())
    }
}

/// Bundle of Arc'd in-memory repositories, ready to wire into the
/// application services
pub struct InMemoryState {
    /// Webhook registry
    pub webhooks: Arc<InMemoryWebhookRepository>,
    /// Delivery audit records
    pub events: Arc<InMemoryWebhookEventRepository>,
    /// Flow definitions
    pub flows: Arc<InMemoryFlowRepository>,
    /// Flow runs
    pub runs: Arc<InMemoryFlowRunRepository>,
    /// Queues
    pub queues: Arc<InMemoryQueueRepository>,
    /// Queue items
    pub items: Arc<InMemoryQueueItemRepository>,
    /// Background job records
    pub jobs: Arc<InMemoryBackgroundJobRepository>,
    /// Integration references
    pub integrations: Arc<InMemoryIntegrationRepository>,
}

impl InMemoryState {
    /// Create a fresh, empty state bundle
    pub fn new() -> Self {
        Self {
            webhooks: Arc::new(InMemoryWebhookRepository::new()),
            events: Arc::new(InMemoryWebhookEventRepository::new()),
            flows: Arc::new(InMemoryFlowRepository::new()),
            runs: Arc::new(InMemoryFlowRunRepository::new()),
            queues: Arc::new(InMemoryQueueRepository::new()),
            items: Arc::new(InMemoryQueueItemRepository::new()),
            jobs: Arc::new(InMemoryBackgroundJobRepository::new()),
            integrations: Arc::new(InMemoryIntegrationRepository::new()),
        }
    }
}

impl Default for InMemoryState {
    fn default() -> Self {
        Self::new()
    }
}
