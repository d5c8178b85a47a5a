//! Domain layer: entities, state machines, and repository traits

/// Flow definitions and flow runs
pub mod flow;

/// Integration references and the executor seam
pub mod integration;

/// Batch orchestrator audit records
pub mod job;

/// Queues and claimable queue items
pub mod queue;

/// Repository traits
pub mod repository;

/// Step parsing and the transform/condition interpreters
pub mod step;

/// Webhook identities and delivery records
pub mod webhook;
