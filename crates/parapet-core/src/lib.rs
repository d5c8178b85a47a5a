//!
//! Parapet Core - webhook/flow/queue processing engine
//!
//! This crate defines the engine's domain model, repository traits, and
//! application services: deliveries are authenticated and fanned out into
//! flow runs, flow runs are enqueued as claimable queue items, and a batch
//! processor later drives each item through a small step machine whose
//! successful completions cascade into child flows.
//!
//! Persistence and the HTTP surface live in sibling crates; this crate
//! only depends on the repository traits it declares.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Domain layer - entities, state machines, repository traits
pub mod domain;

/// Application services - the processing cycle
pub mod application;

/// Core types
pub mod types;

/// Error types
pub mod error;

// Re-export key types
pub use error::EngineError;
pub use types::Payload;

pub use domain::flow::{Flow, FlowId, FlowRun, FlowRunId, RunStatus};
pub use domain::integration::{Integration, IntegrationExecutor, IntegrationId};
pub use domain::job::{BackgroundJob, BackgroundJobId, JobStatus};
pub use domain::queue::{child_queue_name, Queue, QueueId, QueueItem, QueueItemId, DEFAULT_QUEUE};
pub use domain::repository::{
    BackgroundJobRepository, FlowRepository, FlowRunRepository, IntegrationRepository,
    QueueItemRepository, QueueRepository, WebhookEventRepository, WebhookRepository,
};
pub use domain::webhook::{EventStatus, Webhook, WebhookEvent, WebhookEventId, WebhookId};

pub use application::batch_orchestrator::{BatchOrchestrator, SweepReport};
pub use application::flow_execution_service::FlowExecutionService;
pub use application::queue_processor::{ProcessorConfig, QueueProcessor};
pub use application::webhook_receiver::{VerifyReport, WebhookReceiver};
