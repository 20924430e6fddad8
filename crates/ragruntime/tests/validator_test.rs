use ragcore::{EdgeSpec, NodeKind, NodeSpec};
use ragruntime::{validate, ValidationError, ValidationWarning};

fn pipeline() -> (Vec<NodeSpec>, Vec<EdgeSpec>) {
    let nodes = vec![
        NodeSpec::new("q", NodeKind::QuerySource),
        NodeSpec::new("g", NodeKind::Generation).with_config("provider", "openai"),
        NodeSpec::new("o", NodeKind::Sink),
    ];
    let edges = vec![EdgeSpec::new("q", "g"), EdgeSpec::new("g", "o")];
    (nodes, edges)
}

#[test]
fn test_complete_pipeline_is_clean() {
    let (nodes, edges) = pipeline();
    let report = validate(&nodes, &edges);

    assert!(report.valid);
    assert!(report.errors.is_empty());
    assert!(report.warnings.is_empty(), "unexpected: {:?}", report.warnings);
}

#[test]
fn test_missing_query_source_and_sink() {
    let nodes = vec![NodeSpec::new("g", NodeKind::Generation).with_config("provider", "openai")];
    let report = validate(&nodes, &[]);

    assert!(!report.valid);
    assert_eq!(
        report.errors,
        vec![ValidationError::MissingQuerySource, ValidationError::MissingSink]
    );
    assert_eq!(
        report.error_messages(),
        vec![
            "Workflow must have a QuerySource node",
            "Workflow must have a Sink node"
        ]
    );
}

#[test]
fn test_missing_sink_only() {
    let nodes = vec![NodeSpec::new("q", NodeKind::QuerySource)];
    let report = validate(&nodes, &[]);

    assert!(!report.valid);
    assert_eq!(report.errors, vec![ValidationError::MissingSink]);
}

#[test]
fn test_config_warnings_do_not_invalidate() {
    let nodes = vec![
        NodeSpec::new("q", NodeKind::QuerySource),
        NodeSpec::new("kb", NodeKind::Retrieval),
        NodeSpec::new("g", NodeKind::Generation),
        NodeSpec::new("o", NodeKind::Sink),
    ];
    let edges = vec![
        EdgeSpec::new("q", "kb"),
        EdgeSpec::new("kb", "g"),
        EdgeSpec::new("g", "o"),
    ];
    let report = validate(&nodes, &edges);

    assert!(report.valid);
    assert_eq!(
        report.warnings,
        vec![
            ValidationWarning::RetrievalWithoutCollection("kb".to_string()),
            ValidationWarning::GenerationWithoutProvider("g".to_string()),
        ]
    );
}

#[test]
fn test_missing_generation_is_a_warning() {
    let nodes = vec![
        NodeSpec::new("q", NodeKind::QuerySource),
        NodeSpec::new("o", NodeKind::Sink),
    ];
    let report = validate(&nodes, &[EdgeSpec::new("q", "o")]);

    assert!(report.valid);
    assert_eq!(report.warnings, vec![ValidationWarning::MissingGeneration]);
}

#[test]
fn test_unconnected_node_is_named() {
    let (mut nodes, edges) = pipeline();
    nodes.push(NodeSpec::new("orphan", NodeKind::Retrieval).with_config("collection", "docs"));

    let report = validate(&nodes, &edges);

    assert!(report.valid);
    assert_eq!(report.warning_messages(), vec!["Unconnected nodes: orphan"]);
}

#[test]
fn test_report_serializes_messages() {
    let report = validate(&[], &[]);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["valid"], false);
    assert_eq!(json["errors"][0], "Workflow must have a QuerySource node");
    assert_eq!(json["warnings"][0], "Workflow should have a Generation node");
}
