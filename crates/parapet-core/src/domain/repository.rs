//! Repository traits for the Parapet engine.
//!
//! External crates implement these traits to provide persistence; the
//! engine only depends on the traits. The in-memory implementations live
//! in `parapet-state-inmemory`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::flow::{Flow, FlowId, FlowRun, FlowRunId};
use super::integration::{Integration, IntegrationId};
use super::job::BackgroundJob;
use super::queue::{Queue, QueueId, QueueItem};
use super::webhook::{Webhook, WebhookEvent, WebhookEventId, WebhookId};
use crate::EngineError;

/// Repository for webhook identities
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// Find a webhook by ID
    async fn find_by_id(&self, id: &WebhookId) -> Result<Option<Webhook>, EngineError>;

    /// Save a webhook
    async fn save(&self, webhook: &Webhook) -> Result<(), EngineError>;
}

/// Repository for inbound delivery records
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Find an event by ID
    async fn find_by_id(&self, id: &WebhookEventId) -> Result<Option<WebhookEvent>, EngineError>;

    /// Save an event
    async fn save(&self, event: &WebhookEvent) -> Result<(), EngineError>;

    /// Total number of recorded events
    async fn count(&self) -> Result<usize, EngineError>;
}

/// Repository for flow definitions
#[async_trait]
pub trait FlowRepository: Send + Sync {
    /// Find a flow by ID
    async fn find_by_id(&self, id: &FlowId) -> Result<Option<Flow>, EngineError>;

    /// Save a flow
    async fn save(&self, flow: &Flow) -> Result<(), EngineError>;

    /// Enabled flows whose `parent_flow_id` equals `parent`
    async fn find_enabled_children(&self, parent: &FlowId) -> Result<Vec<Flow>, EngineError>;
}

/// Repository for flow runs
#[async_trait]
pub trait FlowRunRepository: Send + Sync {
    /// Find a run by ID
    async fn find_by_id(&self, id: &FlowRunId) -> Result<Option<FlowRun>, EngineError>;

    /// Save a run
    async fn save(&self, run: &FlowRun) -> Result<(), EngineError>;

    /// Runs created for a delivery
    async fn list_for_event(&self, event_id: &WebhookEventId)
        -> Result<Vec<FlowRun>, EngineError>;

    /// Runs created for a flow definition
    async fn list_for_flow(&self, flow_id: &FlowId) -> Result<Vec<FlowRun>, EngineError>;
}

/// Repository for work queues
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// Find a queue by its unique name
    async fn find_by_name(&self, name: &str) -> Result<Option<Queue>, EngineError>;

    /// Find the named queue or create it enabled
    async fn find_or_create(&self, name: &str, description: Option<&str>)
        -> Result<Queue, EngineError>;

    /// Save a queue
    async fn save(&self, queue: &Queue) -> Result<(), EngineError>;

    /// All enabled queues, ordered by name ascending.
    ///
    /// The ordering keeps orchestrator output deterministic for tests and
    /// operator review.
    async fn list_enabled(&self) -> Result<Vec<Queue>, EngineError>;
}

/// Repository for queue items
#[async_trait]
pub trait QueueItemRepository: Send + Sync {
    /// Find an item by ID
    async fn find_by_id(
        &self,
        id: &super::queue::QueueItemId,
    ) -> Result<Option<QueueItem>, EngineError>;

    /// Save an item
    async fn save(&self, item: &QueueItem) -> Result<(), EngineError>;

    /// Atomically claim up to `limit` pending items of a queue, oldest
    /// first.
    ///
    /// Claimed items transition `Pending → Processing` with `claimed_at`
    /// set before they are returned; a concurrent claimer can never
    /// receive the same item. An empty result is normal, not an error.
    async fn claim_pending(
        &self,
        queue_id: &QueueId,
        limit: usize,
    ) -> Result<Vec<QueueItem>, EngineError>;

    /// Return items stuck in `Processing` since before `claimed_before`
    /// to `Pending`, clearing their claim. Returns how many were released.
    async fn release_stale(
        &self,
        queue_id: &QueueId,
        claimed_before: DateTime<Utc>,
    ) -> Result<usize, EngineError>;

    /// All items of a queue, enqueue order
    async fn list_for_queue(&self, queue_id: &QueueId) -> Result<Vec<QueueItem>, EngineError>;
}

/// Repository for batch orchestrator audit records
#[async_trait]
pub trait BackgroundJobRepository: Send + Sync {
    /// Find a job by ID
    async fn find_by_id(
        &self,
        id: &super::job::BackgroundJobId,
    ) -> Result<Option<BackgroundJob>, EngineError>;

    /// Save a job record
    async fn save(&self, job: &BackgroundJob) -> Result<(), EngineError>;
}

/// Repository for integration references
#[async_trait]
pub trait IntegrationRepository: Send + Sync {
    /// Find an integration by ID
    async fn find_by_id(&self, id: &IntegrationId) -> Result<Option<Integration>, EngineError>;

    /// Save an integration
    async fn save(&self, integration: &Integration) -> Result<(), EngineError>;
}
