use crate::{events::EventEmitter, ExecutionContext, NodeError, NodeId, NodeKind, Value};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Core trait that every executable node implements
#[async_trait]
pub trait Node: Send + Sync {
    /// The kind this node executes as
    fn kind(&self) -> NodeKind;

    /// Execute the node against the shared context.
    ///
    /// Implementations write their slot only once they have succeeded, so a
    /// failed node leaves the context untouched.
    async fn execute(
        &self,
        ctx: &NodeContext,
        state: &mut ExecutionContext,
    ) -> Result<NodeOutput, NodeError>;
}

/// Per-node information passed alongside the shared context
#[derive(Clone)]
pub struct NodeContext {
    pub node_id: NodeId,

    /// Event emitter for real-time updates
    pub events: EventEmitter,
}

impl NodeContext {
    pub fn new(node_id: impl Into<NodeId>, events: EventEmitter) -> Self {
        Self {
            node_id: node_id.into(),
            events,
        }
    }
}

/// Kind-specific fields produced by a node, recorded as its trace payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeOutput {
    pub fields: BTreeMap<String, Value>,
}

impl NodeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}
