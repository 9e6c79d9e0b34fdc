use crate::{IntegrationRegistry, RunSummary, StepExecutor, WorkflowEngine};
use std::sync::Arc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use weavecore::{EventBus, JsonMap, ReasoningClient, WorkflowDefinition, WorkflowError};

/// Main entry point: wires the registry, reasoning client, engine and
/// event bus together for callers that just want to run definitions.
pub struct WeaveRuntime {
    registry: Arc<IntegrationRegistry>,
    engine: WorkflowEngine,
    event_bus: Arc<EventBus>,
}

impl WeaveRuntime {
    pub fn new(
        registry: Arc<IntegrationRegistry>,
        reasoning: Arc<dyn ReasoningClient>,
        config: RuntimeConfig,
    ) -> Self {
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));
        let executor = Arc::new(StepExecutor::new(Arc::clone(&registry), reasoning));
        let engine = WorkflowEngine::new(
            executor,
            Arc::clone(&event_bus),
            Duration::from_millis(config.node_timeout_ms),
            config.max_parallel_nodes,
        );
        Self {
            registry,
            engine,
            event_bus,
        }
    }

    pub fn registry(&self) -> &Arc<IntegrationRegistry> {
        &self.registry
    }

    /// Validate a definition without running it
    pub fn validate(&self, workflow: &WorkflowDefinition) -> Result<(), WorkflowError> {
        self.engine.validate(workflow)
    }

    /// Run a definition to completion with a fresh cancellation token
    pub async fn execute(
        &self,
        workflow: &mut WorkflowDefinition,
        seed_input: JsonMap,
    ) -> Result<RunSummary, WorkflowError> {
        self.engine
            .run(workflow, seed_input, CancellationToken::new())
            .await
    }

    /// Run a definition with caller-controlled cancellation
    pub async fn execute_with_token(
        &self,
        workflow: &mut WorkflowDefinition,
        seed_input: JsonMap,
        cancel: CancellationToken,
    ) -> Result<RunSummary, WorkflowError> {
        self.engine.run(workflow, seed_input, cancel).await
    }

    /// Subscribe to live execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<weavecore::ExecutionEvent> {
        self.event_bus.subscribe()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Bound on a single node's execution, timeout counts as failure
    pub node_timeout_ms: u64,
    pub max_parallel_nodes: usize,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            node_timeout_ms: 30_000,
            max_parallel_nodes: 10,
            event_buffer_size: 1000,
        }
    }
}
