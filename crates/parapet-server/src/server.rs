//! Main Parapet server implementation
//!
//! This module wires the core services over the in-memory state store and
//! drives the axum listener.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use parapet_core::{
    BatchOrchestrator, EngineError, FlowExecutionService, Integration, IntegrationExecutor,
    Payload, QueueProcessor, WebhookReceiver,
};
use parapet_state_inmemory::InMemoryState;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};

/// Pass-through integration executor used when no outbound adapters are
/// wired in.
///
/// Real deployments substitute an executor that talks to the configured
/// scanner or notification service; this one logs the call and returns the
/// payload unchanged so flows stay runnable end to end.
pub struct LoggingExecutor;

#[async_trait]
impl IntegrationExecutor for LoggingExecutor {
    async fn execute(
        &self,
        integration: &Integration,
        payload: &Payload,
    ) -> Result<Payload, EngineError> {
        debug!(integration = %integration.id.0, "No outbound adapter wired, passing payload through");
        Ok(payload.clone())
    }
}

/// The Parapet server: core services bound to one state store instance
pub struct ParapetServer {
    config: ServerConfig,
    state: Arc<InMemoryState>,
    receiver: WebhookReceiver,
    orchestrator: BatchOrchestrator,
}

impl ParapetServer {
    /// Wire the receiver, processor and orchestrator over a fresh
    /// in-memory state store.
    pub fn new(config: ServerConfig, executor: Arc<dyn IntegrationExecutor>) -> Self {
        let state = Arc::new(InMemoryState::new());

        let engine = Arc::new(FlowExecutionService::new(
            state.flows.clone(),
            state.integrations.clone(),
            executor,
            state.runs.clone(),
            state.queues.clone(),
            state.items.clone(),
            config.max_cascade_depth,
        ));
        let receiver = WebhookReceiver::new(
            state.webhooks.clone(),
            state.events.clone(),
            state.flows.clone(),
            state.runs.clone(),
            state.queues.clone(),
            state.items.clone(),
        );
        let processor = Arc::new(QueueProcessor::new(
            state.queues.clone(),
            state.items.clone(),
            state.runs.clone(),
            state.flows.clone(),
            engine,
            config.processor_config(),
        ));
        let orchestrator =
            BatchOrchestrator::new(state.queues.clone(), state.jobs.clone(), processor);

        Self {
            config,
            state,
            receiver,
            orchestrator,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Handle on the underlying state store, mainly for tests and admin
    /// tooling
    pub fn state(&self) -> Arc<InMemoryState> {
        self.state.clone()
    }

    /// The webhook receiver service
    pub fn receiver(&self) -> &WebhookReceiver {
        &self.receiver
    }

    /// The batch orchestrator service
    pub fn orchestrator(&self) -> &BatchOrchestrator {
        &self.orchestrator
    }

    /// Liveness probe against the state store
    pub async fn check_state_store(&self) -> ServerResult<()> {
        use parapet_core::WebhookEventRepository;

        self.state.events.count().await?;
        Ok(())
    }

    /// Bind the configured address and serve the API until shutdown
    pub async fn run(self) -> ServerResult<()> {
        info!("Starting Parapet server");

        let ip: IpAddr = self
            .config
            .bind_address
            .parse()
            .map_err(|e| ServerError::ConfigError(format!("Invalid bind address: {}", e)))?;
        let addr = SocketAddr::new(ip, self.config.port);

        let app = crate::api::build_router(Arc::new(self));

        let listener = TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);

        axum::serve(listener, app).await?;

        Ok(())
    }
}
