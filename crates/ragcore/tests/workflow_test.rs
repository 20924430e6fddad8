use ragcore::{NodeKind, RunRequest, Value, Workflow};

#[test]
fn test_editor_payload_deserializes() {
    let json = r#"{
        "nodes": [
            {"id": "1", "type": "userQuery", "data": {}},
            {"id": "2", "type": "knowledgeBase", "data": {"collectionName": "docs", "maxResults": 3}},
            {"id": "3", "type": "llmEngine", "data": {"modelProvider": "openai", "useWebSearch": true}},
            {"id": "4", "type": "output"}
        ],
        "edges": [
            {"id": "e1", "source": "1", "target": "2", "sourceHandle": "out"},
            {"id": "e2", "source": "2", "target": "3"},
            {"id": "e3", "source": "3", "target": "4"}
        ],
        "query": "hello",
        "sessionId": "abc"
    }"#;

    let request: RunRequest = serde_json::from_str(json).expect("request should parse");

    let kinds: Vec<_> = request.nodes.iter().map(|n| n.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::QuerySource,
            NodeKind::Retrieval,
            NodeKind::Generation,
            NodeKind::Sink
        ]
    );
    assert_eq!(request.nodes[1].config.get("maxResults"), Some(&Value::Number(3.0)));
    assert_eq!(request.nodes[2].config.get("useWebSearch"), Some(&Value::Bool(true)));
    assert_eq!(request.edges[0].source_handle.as_deref(), Some("out"));
    assert_eq!(request.session_id.as_deref(), Some("abc"));
}

#[test]
fn test_unknown_kind_is_kept() {
    let json = r#"{"nodes": [{"id": "x", "kind": "translator"}], "query": "q"}"#;
    let request: RunRequest = serde_json::from_str(json).unwrap();

    assert_eq!(request.nodes[0].kind, NodeKind::Unknown("translator".to_string()));
    assert!(!request.nodes[0].kind.is_known());
    assert!(request.edges.is_empty());
}

#[test]
fn test_kind_serializes_canonically() {
    let mut workflow = Workflow::new("demo");
    workflow.add_node(ragcore::NodeSpec::new("q", "userQuery"));
    workflow.add_node(ragcore::NodeSpec::new("o", "output"));
    workflow.connect("q", "o");

    let json = serde_json::to_value(&workflow).unwrap();
    assert_eq!(json["nodes"][0]["kind"], "QuerySource");
    assert_eq!(json["nodes"][1]["kind"], "Sink");
    assert_eq!(json["edges"][0]["source"], "q");

    let back: Workflow = serde_json::from_value(json).unwrap();
    assert_eq!(back.id, workflow.id);
    assert!(back.find_node("o").is_some());
}
