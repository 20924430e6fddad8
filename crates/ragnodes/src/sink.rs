use async_trait::async_trait;
use ragcore::{ExecutionContext, Node, NodeContext, NodeError, NodeKind, NodeOutput, NodeSpec, Slot};
use ragruntime::{NodeDescriptor, NodeFactory};

/// Emits the generated response as the workflow's output
pub struct SinkNode;

#[async_trait]
impl Node for SinkNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Sink
    }

    async fn execute(
        &self,
        _ctx: &NodeContext,
        state: &mut ExecutionContext,
    ) -> Result<NodeOutput, NodeError> {
        Ok(NodeOutput::new().with_output("output", state.final_response()))
    }
}

pub struct SinkNodeFactory;

impl NodeFactory for SinkNodeFactory {
    fn kind(&self) -> NodeKind {
        NodeKind::Sink
    }

    fn create(&self, _spec: &NodeSpec) -> Result<Box<dyn Node>, NodeError> {
        Ok(Box::new(SinkNode))
    }

    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            kind: NodeKind::Sink,
            description: "Returns the final response".to_string(),
            reads: vec![Slot::Response],
            writes: vec![],
        }
    }
}
