//! Interfaces of the external services the engine calls.
//!
//! Implementations are constructed once at startup and injected through
//! [`Collaborators`]; they must be safe to call from concurrent runs.

use crate::{CollaboratorError, Value};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A retrieved passage, in the store's rank order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    pub score: f64,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Top-`k` passages of `collection` most similar to `query_text`.
    async fn query(
        &self,
        collection: &str,
        query_text: &str,
        k: usize,
        embedding_provider: &str,
    ) -> Result<Vec<Passage>, CollaboratorError>;
}

/// Everything an LLM provider needs for one completion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    pub context: String,
    pub provider: String,
    pub model: String,
    pub temperature: f64,
    pub system_prompt: Option<String>,
    pub use_web_search: bool,
}

/// A successful completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub model: String,
    #[serde(default)]
    pub usage: BTreeMap<String, Value>,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, CollaboratorError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, n: usize) -> Result<Vec<SearchHit>, CollaboratorError>;
}

/// The set of collaborators handed to the node handlers.
#[derive(Clone)]
pub struct Collaborators {
    pub vector_store: Arc<dyn VectorStore>,
    pub llm: Arc<dyn LlmProvider>,
    pub web_search: Arc<dyn WebSearch>,
}
