use async_trait::async_trait;
use ragcore::{ExecutionContext, Node, NodeContext, NodeError, NodeKind, NodeOutput, NodeSpec, Slot};
use ragruntime::{NodeDescriptor, NodeFactory};

/// Publishes the caller's query into the shared context
pub struct QuerySourceNode;

#[async_trait]
impl Node for QuerySourceNode {
    fn kind(&self) -> NodeKind {
        NodeKind::QuerySource
    }

    async fn execute(
        &self,
        _ctx: &NodeContext,
        state: &mut ExecutionContext,
    ) -> Result<NodeOutput, NodeError> {
        let query = state.user_query().to_string();
        state.set(Slot::Query, query.clone());

        Ok(NodeOutput::new().with_output("query", query))
    }
}

pub struct QuerySourceNodeFactory;

impl NodeFactory for QuerySourceNodeFactory {
    fn kind(&self) -> NodeKind {
        NodeKind::QuerySource
    }

    fn create(&self, _spec: &NodeSpec) -> Result<Box<dyn Node>, NodeError> {
        Ok(Box::new(QuerySourceNode))
    }

    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            kind: NodeKind::QuerySource,
            description: "Entry point carrying the user's query".to_string(),
            reads: vec![],
            writes: vec![Slot::Query],
        }
    }
}
