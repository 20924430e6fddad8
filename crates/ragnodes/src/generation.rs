use async_trait::async_trait;
use ragcore::{
    ExecutionContext, GenerationConfig, GenerationRequest, LlmProvider, Node, NodeContext,
    NodeError, NodeKind, NodeOutput, NodeSpec, SearchHit, Slot, Value, WebSearch,
};
use ragruntime::{NodeDescriptor, NodeFactory};
use std::sync::Arc;
use tracing::warn;

/// Produces the answer with an LLM, optionally grounded in web results
pub struct GenerationNode {
    config: GenerationConfig,
    llm: Arc<dyn LlmProvider>,
    web_search: Arc<dyn WebSearch>,
}

impl GenerationNode {
    pub fn new(
        config: GenerationConfig,
        llm: Arc<dyn LlmProvider>,
        web_search: Arc<dyn WebSearch>,
    ) -> Self {
        Self {
            config,
            llm,
            web_search,
        }
    }

    /// Append web results to the context. A failed search leaves the
    /// context as it was.
    async fn with_web_results(&self, ctx: &NodeContext, query: &str, context: String) -> String {
        match self
            .web_search
            .search(query, self.config.web_result_count)
            .await
        {
            Ok(hits) if hits.is_empty() => {
                ctx.events.info("Web search returned no results");
                context
            }
            Ok(hits) => {
                ctx.events.info(format!("Web search returned {} results", hits.len()));
                fold_web_results(context, &hits)
            }
            Err(e) => {
                warn!("Web search failed for node {}: {}", ctx.node_id, e);
                ctx.events.warn(format!("Web search failed: {}", e));
                context
            }
        }
    }
}

fn fold_web_results(context: String, hits: &[SearchHit]) -> String {
    let lines = hits
        .iter()
        .map(|hit| format!("- {}: {}", hit.title, hit.snippet))
        .collect::<Vec<_>>()
        .join("\n");

    if context.is_empty() {
        format!("Web Search Results:\n{}", lines)
    } else {
        format!("{}\n\nWeb Search Results:\n{}", context, lines)
    }
}

#[async_trait]
impl Node for GenerationNode {
    fn kind(&self) -> NodeKind {
        NodeKind::Generation
    }

    async fn execute(
        &self,
        ctx: &NodeContext,
        state: &mut ExecutionContext,
    ) -> Result<NodeOutput, NodeError> {
        let query = state.query().to_string();
        let mut context = state.context().to_string();

        if self.config.use_web_search {
            context = self.with_web_results(ctx, &query, context).await;
        }

        let provider = self.config.provider_name().to_string();
        ctx.events.info(format!("Calling {} model {}", provider, self.config.model));

        let generation = self
            .llm
            .generate(GenerationRequest {
                prompt: self.config.resolve_prompt(&query),
                context,
                provider: provider.clone(),
                model: self.config.model.clone(),
                temperature: self.config.temperature,
                system_prompt: self.config.system_prompt.clone(),
                use_web_search: self.config.use_web_search,
            })
            .await?;

        state.set(Slot::Response, generation.text.clone());

        Ok(NodeOutput::new()
            .with_output("response", generation.text)
            .with_output("modelUsed", generation.model)
            .with_output("provider", provider)
            .with_output("usage", Value::Object(generation.usage)))
    }
}

pub struct GenerationNodeFactory {
    llm: Arc<dyn LlmProvider>,
    web_search: Arc<dyn WebSearch>,
}

impl GenerationNodeFactory {
    pub fn new(llm: Arc<dyn LlmProvider>, web_search: Arc<dyn WebSearch>) -> Self {
        Self { llm, web_search }
    }
}

impl NodeFactory for GenerationNodeFactory {
    fn kind(&self) -> NodeKind {
        NodeKind::Generation
    }

    fn create(&self, spec: &NodeSpec) -> Result<Box<dyn Node>, NodeError> {
        Ok(Box::new(GenerationNode::new(
            GenerationConfig::from_spec(spec),
            self.llm.clone(),
            self.web_search.clone(),
        )))
    }

    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor {
            kind: NodeKind::Generation,
            description: "Generates a response with an LLM provider".to_string(),
            reads: vec![Slot::Query, Slot::Context],
            writes: vec![Slot::Response],
        }
    }
}
