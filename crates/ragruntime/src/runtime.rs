use crate::{validate, ExecutionResult, NodeDispatcher, ValidationReport, WorkflowExecutor};
use ragcore::{EventBus, ExecutionEvent, RunRequest, ValidateRequest};
use std::sync::Arc;

/// Entry point for running and validating workflows
///
/// Holds no per-run state, so one runtime serves concurrent requests.
pub struct FlowRuntime {
    dispatcher: Arc<NodeDispatcher>,
    executor: Arc<WorkflowExecutor>,
    event_bus: Arc<EventBus>,
}

impl FlowRuntime {
    /// Create a runtime with no node handlers registered
    pub fn new() -> Self {
        Self::with_dispatcher(Arc::new(NodeDispatcher::new()), RuntimeConfig::default())
    }

    /// Create a runtime around a pre-populated dispatcher
    pub fn with_dispatcher(dispatcher: Arc<NodeDispatcher>, config: RuntimeConfig) -> Self {
        Self {
            dispatcher,
            executor: Arc::new(WorkflowExecutor::new()),
            event_bus: Arc::new(EventBus::new(config.event_buffer_size)),
        }
    }

    pub fn dispatcher(&self) -> &Arc<NodeDispatcher> {
        &self.dispatcher
    }

    /// Run a workflow against a single query
    pub async fn execute(&self, request: &RunRequest) -> ExecutionResult {
        self.executor
            .execute(request, &self.dispatcher, &self.event_bus)
            .await
    }

    pub fn validate(&self, request: &ValidateRequest) -> ValidationReport {
        validate(&request.nodes, &request.edges)
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }
}

impl Default for FlowRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 1000,
        }
    }
}
