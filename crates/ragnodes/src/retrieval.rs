use async_trait::async_trait;
use ragcore::{
    ExecutionContext, Node, NodeContext, NodeError, NodeKind, NodeOutput, NodeSpec,
    RetrievalConfig, Slot, VectorStore,
};
use ragruntime::{NodeDescriptor, NodeFactory};
use std::sync::Arc;

/// Looks up passages relevant to the query and publishes them as context
pub struct RetrievalNode {
    collection: String,
    result_count: usize,
    embedding_provider: String,
    store: Arc<dyn VectorStore>,
}

impl RetrievalNode {
    pub fn new(
        collection: impl Into<String>,
        result_count: usize,
        embedding_provider: impl Into<String>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            collection: collection.into(),
            result_count,
            embedding_provider: embedding_provider.into(),
            store,
        }
    }
}

#[async_trait]
impl Node for RetrievalNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Retrieval
    }

    async fn execute(
        &self,
        ctx: &NodeContext,
        state: &mut ExecutionContext,
    ) -> Result<NodeOutput, NodeError> {
        ctx.events.info(format!(
            "Querying collection '{}' for {} passages",
            self.collection, self.result_count
        ));

        let passages = self
            .store
            .query(
                &self.collection,
                state.query(),
                self.result_count,
                &self.embedding_provider,
            )
            .await?;

        // Passages keep the store's rank order.
        let context = passages
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        state.set(Slot::Context, context.clone());

        ctx.events.info(format!("Retrieved {} passages", passages.len()));

        Ok(NodeOutput::new()
            .with_output("context", context)
            .with_output("retrievedDocuments", passages.len())
            .with_output("collection", self.collection.clone()))
    }
}

pub struct RetrievalNodeFactory {
    store: Arc<dyn VectorStore>,
}

impl RetrievalNodeFactory {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self { store }
    }
}

impl NodeFactory for RetrievalNodeFactory {
    fn kind(&self) -> NodeKind {
        NodeKind::Retrieval
    }

    fn create(&self, spec: &NodeSpec) -> Result<Box<dyn Node>, NodeError> {
        let config = RetrievalConfig::from_spec(spec);
        let collection = config.collection.ok_or_else(|| NodeError::MissingConfig {
            kind: NodeKind::Retrieval.to_string(),
            field: "a collection name".to_string(),
        })?;

        Ok(Box::new(RetrievalNode::new(
            collection,
            config.result_count,
            config.embedding_provider,
            self.store.clone(),
        )))
    }

    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            kind: NodeKind::Retrieval,
            description: "Retrieves passages from a vector store collection".to_string(),
            reads: vec![Slot::Query],
            writes: vec![Slot::Context],
        }
    }
}
