//! Core abstractions for the RAG workflow engine
//!
//! This crate provides the fundamental types and traits that all other
//! components depend on: the workflow data model, the shared execution
//! context, the node capability, and the collaborator interfaces.

mod collaborators;
mod config;
mod context;
mod error;
pub mod events;
mod node;
mod value;
mod workflow;

pub use collaborators::{
    Collaborators, Generation, GenerationRequest, LlmProvider, Passage, SearchHit, VectorStore,
    WebSearch,
};
pub use config::{GenerationConfig, RetrievalConfig, DEFAULT_EMBEDDING_PROVIDER};
pub use context::{ExecutionContext, Slot, NO_RESPONSE_PLACEHOLDER};
pub use error::{CollaboratorError, FlowError, NodeError, WorkflowError};
pub use events::*;
pub use node::{Node, NodeContext, NodeOutput};
pub use value::Value;
pub use workflow::{
    EdgeSpec, NodeId, NodeKind, NodeSpec, RunRequest, ValidateRequest, Workflow, WorkflowId,
};

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
