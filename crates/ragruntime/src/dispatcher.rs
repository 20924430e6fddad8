use ragcore::{ExecutionContext, Node, NodeContext, NodeError, NodeKind, NodeOutput, NodeSpec, Slot};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Factory trait for creating node instances
pub trait NodeFactory: Send + Sync {
    /// The kind this factory builds
    fn kind(&self) -> NodeKind;

    /// Create a node from its specification. Missing required settings
    /// are reported here and surface as that node's failure.
    fn create(&self, spec: &NodeSpec) -> Result<Box<dyn Node>, NodeError>;

    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            kind: self.kind(),
            description: String::new(),
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }
}

/// Catalogue entry for a node kind
#[derive(Debug, Clone, Serialize)]
pub struct NodeDescriptor {
    pub kind: NodeKind,
    pub description: String,
    pub reads: Vec<Slot>,
    pub writes: Vec<Slot>,
}

/// Routes each node to the handler registered for its kind
pub struct NodeDispatcher {
    factories: HashMap<NodeKind, Arc<dyn NodeFactory>>,
}

impl NodeDispatcher {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(&mut self, factory: Arc<dyn NodeFactory>) {
        let kind = factory.kind();
        tracing::info!("Registering node kind: {}", kind);
        self.factories.insert(kind, factory);
    }

    /// Registered kinds in pipeline order
    pub fn kinds(&self) -> Vec<NodeKind> {
        let mut kinds: Vec<_> = self.factories.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    pub fn describe(&self) -> Vec<NodeDescriptor> {
        self.kinds()
            .iter()
            .filter_map(|kind| self.factories.get(kind))
            .map(|factory| factory.descriptor())
            .collect()
    }

    /// Execute one node against the shared context.
    pub async fn dispatch(
        &self,
        spec: &NodeSpec,
        ctx: &NodeContext,
        state: &mut ExecutionContext,
    ) -> Result<NodeOutput, NodeError> {
        let factory = self
            .factories
            .get(&spec.kind)
            .ok_or_else(|| NodeError::UnknownKind(spec.kind.to_string()))?;

        let node = factory.create(spec)?;
        node.execute(ctx, state).await
    }
}

impl Default for NodeDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
