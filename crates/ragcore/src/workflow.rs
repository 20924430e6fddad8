use crate::{FlowError, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use uuid::Uuid;

pub type WorkflowId = Uuid;
pub type NodeId = String;

/// The fixed set of processing steps a workflow can contain.
///
/// Unrecognised kinds are kept as [`NodeKind::Unknown`] so a graph still
/// loads; such nodes fail when the executor reaches them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    QuerySource,
    Retrieval,
    Generation,
    Sink,
    Unknown(String),
}

impl NodeKind {
    /// Known kinds, in pipeline order.
    pub const ALL: [NodeKind; 4] = [
        NodeKind::QuerySource,
        NodeKind::Retrieval,
        NodeKind::Generation,
        NodeKind::Sink,
    ];

    /// Parse a kind name. Accepts canonical names as well as the editor
    /// names (`userQuery`, `knowledgeBase`, `llmEngine`, `output`).
    pub fn parse(name: &str) -> Self {
        match name {
            "QuerySource" | "querySource" | "query_source" | "userQuery" | "user_query" => {
                NodeKind::QuerySource
            }
            "Retrieval" | "retrieval" | "knowledgeBase" | "knowledge_base" => NodeKind::Retrieval,
            "Generation" | "generation" | "llmEngine" | "llm_engine" => NodeKind::Generation,
            "Sink" | "sink" | "output" | "Output" => NodeKind::Sink,
            other => NodeKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::QuerySource => "QuerySource",
            NodeKind::Retrieval => "Retrieval",
            NodeKind::Generation => "Generation",
            NodeKind::Sink => "Sink",
            NodeKind::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, NodeKind::Unknown(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        NodeKind::parse(&s)
    }
}

impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        NodeKind::parse(s)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Node specification in a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    #[serde(alias = "type")]
    pub kind: NodeKind,
    #[serde(default, alias = "data")]
    pub config: BTreeMap<String, Value>,
}

impl NodeSpec {
    pub fn new(id: impl Into<NodeId>, kind: impl Into<NodeKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            config: BTreeMap::new(),
        }
    }

    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// First non-blank string among `keys`.
    pub fn config_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|k| self.config.get(*k).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    pub fn config_u64(&self, keys: &[&str]) -> Option<u64> {
        keys.iter().find_map(|k| self.config.get(*k).and_then(Value::as_u64))
    }

    pub fn config_f64(&self, keys: &[&str]) -> Option<f64> {
        keys.iter().find_map(|k| self.config.get(*k).and_then(Value::as_f64))
    }

    pub fn config_bool(&self, keys: &[&str]) -> Option<bool> {
        keys.iter().find_map(|k| self.config.get(*k).and_then(Value::as_bool))
    }
}

/// Directed edge between two nodes. Handles are carried for the editor
/// and never consulted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    #[serde(default)]
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl EdgeSpec {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: format!("{}-{}", source, target),
            source,
            target,
            source_handle: None,
            target_handle: None,
        }
    }
}

/// A named, storable workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    #[serde(default = "Uuid::new_v4")]
    pub id: WorkflowId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeSpec) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    pub fn connect(&mut self, source: impl Into<NodeId>, target: impl Into<NodeId>) {
        self.edges.push(EdgeSpec::new(source, target));
    }

    pub fn find_node(&self, id: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Load a workflow from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FlowError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn run_request(&self, query: impl Into<String>, session_id: Option<String>) -> RunRequest {
        RunRequest {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            query: query.into(),
            session_id,
        }
    }
}

/// Input of a single workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    pub query: String,
    #[serde(default, alias = "session_id", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Input of a validation-only call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}
