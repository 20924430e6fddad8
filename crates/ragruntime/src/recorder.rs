use ragcore::{ExecutionId, NodeId, NodeKind, NodeOutput, NodeSpec};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Trace entry for one attempted node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogEntry {
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub duration_ms: f64,
    pub success: bool,
    pub payload: NodeOutput,
}

/// Outcome of a workflow run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub execution_id: ExecutionId,
    pub success: bool,
    pub final_response: String,
    pub execution_time_ms: f64,
    pub execution_log: Vec<ExecutionLogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ExecutionResult {
    /// Ids of the nodes that ran, in execution order.
    pub fn executed_nodes(&self) -> Vec<&str> {
        self.execution_log.iter().map(|e| e.node_id.as_str()).collect()
    }
}

/// Accumulates the trace of a single run
pub struct ExecutionRecorder {
    execution_id: ExecutionId,
    session_id: Option<String>,
    started: Instant,
    entries: Vec<ExecutionLogEntry>,
}

impl ExecutionRecorder {
    pub fn start(execution_id: ExecutionId, session_id: Option<String>) -> Self {
        Self {
            execution_id,
            session_id,
            started: Instant::now(),
            entries: Vec::new(),
        }
    }

    /// Append the entry for `node`. A failure is recorded with an `error` payload.
    pub fn record(
        &mut self,
        node: &NodeSpec,
        elapsed: Duration,
        outcome: Result<NodeOutput, String>,
    ) -> &ExecutionLogEntry {
        let (success, payload) = match outcome {
            Ok(output) => (true, output),
            Err(message) => (false, NodeOutput::new().with_output("error", message)),
        };

        self.entries.push(ExecutionLogEntry {
            node_id: node.id.clone(),
            kind: node.kind.clone(),
            duration_ms: millis(elapsed),
            success,
            payload,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    pub fn complete(self, final_response: impl Into<String>) -> ExecutionResult {
        self.finish(true, None, final_response.into())
    }

    pub fn fail(self, errors: Vec<String>, final_response: impl Into<String>) -> ExecutionResult {
        self.finish(false, Some(errors), final_response.into())
    }

    fn finish(self, success: bool, errors: Option<Vec<String>>, final_response: String) -> ExecutionResult {
        ExecutionResult {
            execution_id: self.execution_id,
            success,
            final_response,
            execution_time_ms: millis(self.started.elapsed()),
            execution_log: self.entries,
            errors,
            session_id: self.session_id,
        }
    }
}

/// Milliseconds rounded to two decimals.
fn millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}
