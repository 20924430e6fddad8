use crate::dispatcher::NodeDispatcher;
use crate::graph::WorkflowGraph;
use crate::recorder::{ExecutionRecorder, ExecutionResult};
use crate::validator::validate;
use chrono::Utc;
use futures::FutureExt;
use ragcore::{
    EventBus, ExecutionContext, ExecutionEvent, ExecutionId, NodeContext, RunRequest,
    NO_RESPONSE_PLACEHOLDER,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Executes workflows one node at a time in topological order
#[derive(Debug, Default)]
pub struct WorkflowExecutor;

impl WorkflowExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run a workflow. Every failure, including a panicking node, comes back
    /// as an unsuccessful result carrying the trace collected so far.
    pub async fn execute(
        &self,
        request: &RunRequest,
        dispatcher: &NodeDispatcher,
        event_bus: &EventBus,
    ) -> ExecutionResult {
        let execution_id = ExecutionId::new_v4();
        let recorder = ExecutionRecorder::start(execution_id, request.session_id.clone());

        event_bus.emit(ExecutionEvent::WorkflowStarted {
            execution_id,
            session_id: request.session_id.clone(),
            timestamp: Utc::now(),
        });

        info!(%execution_id, nodes = request.nodes.len(), "Starting workflow execution");

        let result = match self.schedule(request) {
            Ok(order) => {
                self.run_scheduled(request, &order, dispatcher, event_bus, recorder)
                    .await
            }
            Err(errors) => {
                warn!(%execution_id, ?errors, "Workflow rejected before execution");
                recorder.fail(errors, NO_RESPONSE_PLACEHOLDER)
            }
        };

        info!(
            %execution_id,
            success = result.success,
            executed = result.execution_log.len(),
            "Workflow finished in {}ms",
            result.execution_time_ms
        );

        event_bus.emit(ExecutionEvent::WorkflowCompleted {
            execution_id,
            success: result.success,
            duration_ms: result.execution_time_ms,
            timestamp: Utc::now(),
        });

        result
    }

    /// Validate and order the workflow. Errors block execution entirely.
    fn schedule(&self, request: &RunRequest) -> Result<Vec<usize>, Vec<String>> {
        let report = validate(&request.nodes, &request.edges);
        if !report.valid {
            return Err(report.error_messages());
        }
        for warning in &report.warnings {
            warn!("{}", warning);
        }

        let graph = WorkflowGraph::build(&request.nodes, &request.edges)
            .map_err(|e| vec![e.to_string()])?;
        let order = graph.execution_order().map_err(|e| vec![e.to_string()])?;

        debug!(
            order = ?order.iter().map(|&p| request.nodes[p].id.as_str()).collect::<Vec<_>>(),
            "Computed execution order"
        );
        Ok(order)
    }

    async fn run_scheduled(
        &self,
        request: &RunRequest,
        order: &[usize],
        dispatcher: &NodeDispatcher,
        event_bus: &EventBus,
        mut recorder: ExecutionRecorder,
    ) -> ExecutionResult {
        let mut state = ExecutionContext::new(request.query.clone());
        let execution_id = recorder.execution_id();

        for &position in order {
            let node = &request.nodes[position];
            let ctx = NodeContext::new(
                node.id.clone(),
                event_bus.create_emitter(execution_id, node.id.clone()),
            );

            event_bus.emit(ExecutionEvent::NodeStarted {
                execution_id,
                node_id: node.id.clone(),
                kind: node.kind.to_string(),
                timestamp: Utc::now(),
            });

            let start = Instant::now();
            let outcome = AssertUnwindSafe(dispatcher.dispatch(node, &ctx, &mut state))
                .catch_unwind()
                .await;
            let elapsed = start.elapsed();

            let (node_error, run_error) = match outcome {
                Ok(Ok(output)) => {
                    let entry = recorder.record(node, elapsed, Ok(output));
                    info!("Node {} completed in {}ms", node.id, entry.duration_ms);

                    event_bus.emit(ExecutionEvent::NodeCompleted {
                        execution_id,
                        node_id: node.id.clone(),
                        duration_ms: entry.duration_ms,
                        timestamp: Utc::now(),
                    });
                    continue;
                }
                Ok(Err(e)) => {
                    error!("Node {} failed: {}", node.id, e);
                    (e.to_string(), format!("Node {} failed: {}", node.id, e))
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!("Node {} panicked: {}", node.id, message);
                    (
                        format!("Internal error: {}", message),
                        format!("Workflow execution failed: {}", message),
                    )
                }
            };

            event_bus.emit(ExecutionEvent::NodeFailed {
                execution_id,
                node_id: node.id.clone(),
                error: node_error.clone(),
                timestamp: Utc::now(),
            });
            recorder.record(node, elapsed, Err(node_error));
            return recorder.fail(vec![run_error], state.final_response());
        }

        recorder.complete(state.final_response())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "node panicked".to_string()
    }
}
