use async_trait::async_trait;
use ragcore::{
    CollaboratorError, Collaborators, EdgeSpec, Generation, GenerationRequest, LlmProvider,
    NodeKind, NodeSpec, Passage, RunRequest, SearchHit, Value, VectorStore, WebSearch,
};
use ragruntime::{FlowRuntime, NodeDispatcher, RuntimeConfig};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakeStore {
    passages: Vec<&'static str>,
    calls: Mutex<Vec<(String, String, usize, String)>>,
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn query(
        &self,
        collection: &str,
        query_text: &str,
        k: usize,
        embedding_provider: &str,
    ) -> Result<Vec<Passage>, CollaboratorError> {
        self.calls.lock().unwrap().push((
            collection.to_string(),
            query_text.to_string(),
            k,
            embedding_provider.to_string(),
        ));
        Ok(self
            .passages
            .iter()
            .enumerate()
            .map(|(rank, content)| Passage {
                content: content.to_string(),
                metadata: BTreeMap::new(),
                score: 1.0 - rank as f64 * 0.1,
            })
            .collect())
    }
}

struct FakeLlm {
    reply: Result<&'static str, CollaboratorError>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeLlm {
    fn replying(text: &'static str) -> Self {
        Self {
            reply: Ok(text),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing(error: CollaboratorError) -> Self {
        Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn last_request(&self) -> GenerationRequest {
        self.requests.lock().unwrap().last().cloned().expect("llm was not called")
    }
}

#[async_trait]
impl LlmProvider for FakeLlm {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, CollaboratorError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let text = self.reply.clone()?;

        let mut usage = BTreeMap::new();
        usage.insert("total_tokens".to_string(), Value::from(42i64));
        Ok(Generation {
            text: text.to_string(),
            model,
            usage,
        })
    }
}

struct FakeSearch {
    result: Result<Vec<SearchHit>, CollaboratorError>,
}

#[async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, _query: &str, n: usize) -> Result<Vec<SearchHit>, CollaboratorError> {
        self.result
            .clone()
            .map(|hits| hits.into_iter().take(n).collect())
    }
}

fn no_search() -> Arc<FakeSearch> {
    Arc::new(FakeSearch {
        result: Err(CollaboratorError::NotConfigured("web search".into())),
    })
}

fn runtime(store: Arc<FakeStore>, llm: Arc<FakeLlm>, search: Arc<FakeSearch>) -> FlowRuntime {
    let mut dispatcher = NodeDispatcher::new();
    ragnodes::register_all(
        &mut dispatcher,
        Collaborators {
            vector_store: store,
            llm,
            web_search: search,
        },
    );
    FlowRuntime::with_dispatcher(Arc::new(dispatcher), RuntimeConfig::default())
}

fn run_request(nodes: Vec<NodeSpec>, query: &str) -> RunRequest {
    let edges = nodes
        .windows(2)
        .map(|pair| EdgeSpec::new(pair[0].id.clone(), pair[1].id.clone()))
        .collect();
    RunRequest {
        nodes,
        edges,
        query: query.to_string(),
        session_id: None,
    }
}

fn str_field<'a>(payload: &'a ragcore::NodeOutput, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

#[tokio::test]
async fn test_query_generation_sink() {
    let llm = Arc::new(FakeLlm::replying("Hi there!"));
    let rt = runtime(Arc::new(FakeStore::default()), llm.clone(), no_search());

    let nodes = vec![
        NodeSpec::new("q", NodeKind::QuerySource),
        NodeSpec::new("g", NodeKind::Generation)
            .with_config("provider", "openai")
            .with_config("model", "gpt-3.5"),
        NodeSpec::new("o", NodeKind::Sink),
    ];
    let result = rt.execute(&run_request(nodes, "hello")).await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert_eq!(result.executed_nodes(), vec!["q", "g", "o"]);
    assert_eq!(result.final_response, "Hi there!");
    assert_eq!(str_field(&result.execution_log[0].payload, "query"), Some("hello"));
    assert_eq!(str_field(&result.execution_log[1].payload, "modelUsed"), Some("gpt-3.5"));
    assert_eq!(str_field(&result.execution_log[2].payload, "output"), Some("Hi there!"));

    let request = llm.last_request();
    assert_eq!(request.prompt, "hello");
    assert_eq!(request.context, "");
    assert_eq!(request.provider, "openai");
    assert_eq!(request.model, "gpt-3.5");
    assert_eq!(request.temperature, 0.7);
    assert_eq!(request.system_prompt, None);
    assert!(!request.use_web_search);
}

#[tokio::test]
async fn test_empty_retrieval_still_generates() {
    let store = Arc::new(FakeStore::default());
    let llm = Arc::new(FakeLlm::replying("I could not find anything."));
    let rt = runtime(store.clone(), llm.clone(), no_search());

    let nodes = vec![
        NodeSpec::new("q", NodeKind::QuerySource),
        NodeSpec::new("kb", NodeKind::Retrieval).with_config("collection", "empty"),
        NodeSpec::new("g", NodeKind::Generation).with_config("provider", "openai"),
        NodeSpec::new("o", NodeKind::Sink),
    ];
    let result = rt.execute(&run_request(nodes, "anything?")).await;

    assert!(result.success);
    assert_eq!(result.executed_nodes(), vec!["q", "kb", "g", "o"]);
    let retrieval = &result.execution_log[1];
    assert!(retrieval.success);
    assert_eq!(str_field(&retrieval.payload, "context"), Some(""));
    assert_eq!(
        retrieval.payload.get("retrievedDocuments"),
        Some(&Value::Number(0.0))
    );
    assert!(result.execution_log[2].success);
    assert_eq!(llm.last_request().context, "");
}

#[tokio::test]
async fn test_passages_are_joined_in_rank_order() {
    let store = Arc::new(FakeStore {
        passages: vec!["first passage", "second passage", "third passage"],
        ..Default::default()
    });
    let llm = Arc::new(FakeLlm::replying("answer"));
    let rt = runtime(store.clone(), llm.clone(), no_search());

    let nodes = vec![
        NodeSpec::new("q", NodeKind::QuerySource),
        NodeSpec::new("kb", NodeKind::Retrieval)
            .with_config("collectionName", "manuals")
            .with_config("maxResults", 3i64)
            .with_config("embeddingProvider", "gemini"),
        NodeSpec::new("g", NodeKind::Generation).with_config("modelProvider", "openai"),
        NodeSpec::new("o", NodeKind::Sink),
    ];
    let result = rt.execute(&run_request(nodes, "how do I reset?")).await;

    assert!(result.success);
    assert_eq!(
        store.calls.lock().unwrap().as_slice(),
        &[(
            "manuals".to_string(),
            "how do I reset?".to_string(),
            3,
            "gemini".to_string()
        )]
    );
    assert_eq!(
        llm.last_request().context,
        "first passage\n\nsecond passage\n\nthird passage"
    );
}

#[tokio::test]
async fn test_retrieval_without_collection_fails_fast() {
    let llm = Arc::new(FakeLlm::replying("unused"));
    let rt = runtime(Arc::new(FakeStore::default()), llm.clone(), no_search());

    let nodes = vec![
        NodeSpec::new("q", NodeKind::QuerySource),
        NodeSpec::new("kb", NodeKind::Retrieval),
        NodeSpec::new("g", NodeKind::Generation).with_config("provider", "openai"),
        NodeSpec::new("o", NodeKind::Sink),
    ];
    let result = rt.execute(&run_request(nodes, "q")).await;

    assert!(!result.success);
    assert_eq!(result.executed_nodes(), vec!["q", "kb"]);
    assert_eq!(
        str_field(&result.execution_log[1].payload, "error"),
        Some("Retrieval node requires a collection name")
    );
    assert!(llm.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_failure_halts_before_sink() {
    let llm = Arc::new(FakeLlm::failing(CollaboratorError::UnsupportedProvider(
        "mystery".into(),
    )));
    let rt = runtime(Arc::new(FakeStore::default()), llm.clone(), no_search());

    let nodes = vec![
        NodeSpec::new("q", NodeKind::QuerySource),
        NodeSpec::new("g", NodeKind::Generation).with_config("provider", "mystery"),
        NodeSpec::new("o", NodeKind::Sink),
    ];
    let result = rt.execute(&run_request(nodes, "q")).await;

    assert!(!result.success);
    assert_eq!(result.executed_nodes(), vec!["q", "g"]);
    assert_eq!(
        result.errors,
        Some(vec!["Node g failed: Unsupported model provider: mystery".to_string()])
    );
    assert_eq!(result.final_response, "No response generated");
    assert_eq!(llm.requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_web_results_fold_into_context() {
    let store = Arc::new(FakeStore {
        passages: vec!["local fact"],
        ..Default::default()
    });
    let llm = Arc::new(FakeLlm::replying("answer"));
    let search = Arc::new(FakeSearch {
        result: Ok(vec![
            SearchHit {
                title: "Rust".into(),
                snippet: "A language".into(),
                link: "https://rust-lang.org".into(),
            },
            SearchHit {
                title: "Cargo".into(),
                snippet: "The package manager".into(),
                link: "https://doc.rust-lang.org/cargo".into(),
            },
        ]),
    });
    let rt = runtime(store, llm.clone(), search);

    let nodes = vec![
        NodeSpec::new("q", NodeKind::QuerySource),
        NodeSpec::new("kb", NodeKind::Retrieval).with_config("collection", "docs"),
        NodeSpec::new("g", NodeKind::Generation)
            .with_config("provider", "openai")
            .with_config("useWebSearch", true)
            .with_config("customPrompt", "Answer briefly.")
            .with_config("systemPrompt", "You are helpful."),
        NodeSpec::new("o", NodeKind::Sink),
    ];
    let result = rt.execute(&run_request(nodes, "what is rust?")).await;

    assert!(result.success);
    let request = llm.last_request();
    assert_eq!(
        request.context,
        "local fact\n\nWeb Search Results:\n- Rust: A language\n- Cargo: The package manager"
    );
    assert_eq!(request.prompt, "Answer briefly.\n\nUser Query: what is rust?");
    assert_eq!(request.system_prompt.as_deref(), Some("You are helpful."));
    assert!(request.use_web_search);
}

#[tokio::test]
async fn test_failed_web_search_is_not_fatal() {
    let llm = Arc::new(FakeLlm::replying("answer anyway"));
    let rt = runtime(Arc::new(FakeStore::default()), llm.clone(), no_search());

    let nodes = vec![
        NodeSpec::new("q", NodeKind::QuerySource),
        NodeSpec::new("g", NodeKind::Generation)
            .with_config("provider", "openai")
            .with_config("useWebSearch", true),
        NodeSpec::new("o", NodeKind::Sink),
    ];
    let result = rt.execute(&run_request(nodes, "news?")).await;

    assert!(result.success);
    assert_eq!(result.final_response, "answer anyway");
    assert_eq!(llm.last_request().context, "");
}

#[tokio::test]
async fn test_sink_without_generation_reports_placeholder() {
    let rt = runtime(
        Arc::new(FakeStore::default()),
        Arc::new(FakeLlm::replying("unused")),
        no_search(),
    );

    let nodes = vec![
        NodeSpec::new("q", NodeKind::QuerySource),
        NodeSpec::new("o", NodeKind::Sink),
    ];
    let result = rt.execute(&run_request(nodes, "q")).await;

    assert!(result.success);
    assert_eq!(result.final_response, "No response generated");
    assert_eq!(
        str_field(&result.execution_log[1].payload, "output"),
        Some("No response generated")
    );
}

#[test]
fn test_catalogue_lists_all_kinds() {
    let rt = runtime(
        Arc::new(FakeStore::default()),
        Arc::new(FakeLlm::replying("unused")),
        no_search(),
    );

    let kinds: Vec<_> = rt.dispatcher().describe().into_iter().map(|d| d.kind).collect();
    assert_eq!(kinds, NodeKind::ALL.to_vec());

    let json = serde_json::to_value(rt.dispatcher().describe()).unwrap();
    assert_eq!(json[1]["kind"], "Retrieval");
    assert_eq!(json[1]["writes"][0], "context");
}
