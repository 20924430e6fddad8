use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure of a single node. Any of these halts the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("{kind} node requires {field}")]
    MissingConfig { kind: String, field: String },

    #[error("Unknown node kind: {0}")]
    UnknownKind(String),

    #[error("{0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Cyclic dependency detected")]
    CyclicDependency,

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),
}

/// Failure reported by an external collaborator (LLM, vector store, search).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("Request failed: {0}")]
    Http(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Unsupported model provider: {0}")]
    UnsupportedProvider(String),

    #[error("Unsupported embedding provider: {0}")]
    UnsupportedEmbedding(String),

    #[error("{0} not configured")]
    NotConfigured(String),

    #[error("Error processing document: {0}")]
    Document(String),
}
