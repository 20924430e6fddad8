use ragcore::{EdgeSpec, GenerationConfig, NodeId, NodeKind, NodeSpec, RetrievalConfig};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt::Display;
use thiserror::Error;

/// Preconditions that block execution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Workflow must have a QuerySource node")]
    MissingQuerySource,

    #[error("Workflow must have a Sink node")]
    MissingSink,
}

/// Findings reported alongside a valid workflow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    #[error("Workflow should have a Generation node")]
    MissingGeneration,

    #[error("Generation node {0} should specify a model provider")]
    GenerationWithoutProvider(NodeId),

    #[error("Retrieval node {0} should specify a collection name")]
    RetrievalWithoutCollection(NodeId),

    #[error("Unconnected nodes: {}", .0.join(", "))]
    UnconnectedNodes(Vec<NodeId>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    #[serde(serialize_with = "display_all")]
    pub errors: Vec<ValidationError>,
    #[serde(serialize_with = "display_all")]
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

fn display_all<T: Display, S: Serializer>(items: &[T], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(items.iter().map(ToString::to_string))
}

/// Check the structural and configuration preconditions of a workflow.
///
/// Only a missing QuerySource or Sink makes a workflow invalid; everything
/// else is reported as a warning. Cycles and dangling edges are caught
/// later by the graph builder.
pub fn validate(nodes: &[NodeSpec], edges: &[EdgeSpec]) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let has_kind = |kind: NodeKind| nodes.iter().any(|n| n.kind == kind);

    if !has_kind(NodeKind::QuerySource) {
        errors.push(ValidationError::MissingQuerySource);
    }
    if !has_kind(NodeKind::Sink) {
        errors.push(ValidationError::MissingSink);
    }
    if !has_kind(NodeKind::Generation) {
        warnings.push(ValidationWarning::MissingGeneration);
    }

    for node in nodes {
        match node.kind {
            NodeKind::Generation if GenerationConfig::from_spec(node).provider.is_none() => {
                warnings.push(ValidationWarning::GenerationWithoutProvider(node.id.clone()));
            }
            NodeKind::Retrieval if RetrievalConfig::from_spec(node).collection.is_none() => {
                warnings.push(ValidationWarning::RetrievalWithoutCollection(node.id.clone()));
            }
            _ => {}
        }
    }

    let connected: HashSet<&str> = edges
        .iter()
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();
    let unconnected: Vec<NodeId> = nodes
        .iter()
        .filter(|n| !connected.contains(n.id.as_str()))
        .map(|n| n.id.clone())
        .collect();
    if !unconnected.is_empty() {
        warnings.push(ValidationWarning::UnconnectedNodes(unconnected));
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}
