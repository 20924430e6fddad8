//! Workflow execution runtime
//!
//! This crate provides the engine that runs a workflow: validation, graph
//! construction and scheduling, per-node dispatch, and trace recording.

mod dispatcher;
mod executor;
mod graph;
mod recorder;
mod runtime;
mod validator;

pub use dispatcher::{NodeDescriptor, NodeDispatcher, NodeFactory};
pub use executor::WorkflowExecutor;
pub use graph::{execution_order, WorkflowGraph};
pub use recorder::{ExecutionLogEntry, ExecutionRecorder, ExecutionResult};
pub use runtime::{FlowRuntime, RuntimeConfig};
pub use validator::{validate, ValidationError, ValidationReport, ValidationWarning};
