//! Application services: the receive → enqueue → process → cascade cycle

/// Sweeps all enabled queues once per invocation
pub mod batch_orchestrator;

/// The step machine and cascade fan-out
pub mod flow_execution_service;

/// Claims and drives batches of queue items
pub mod queue_processor;

/// Authenticates deliveries and fans them out
pub mod webhook_receiver;
