//! In-memory state store implementation for the Parapet engine
//!
//! This crate provides in-memory implementations of the repository traits
//! defined in `parapet-core`. It is primarily useful for development,
//! testing, and single-node deployments where persistence is not required.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod repositories;
pub use repositories::{
    InMemoryBackgroundJobRepository, InMemoryFlowRepository, InMemoryFlowRunRepository,
    InMemoryIntegrationRepository, InMemoryQueueItemRepository, InMemoryQueueRepository,
    InMemoryState, InMemoryWebhookEventRepository, InMemoryWebhookRepository,
};
