use crate::embeddings::{cosine_similarity, EmbeddingProvider};
use async_trait::async_trait;
use ragcore::{CollaboratorError, Passage, Value, VectorStore};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

struct StoredChunk {
    id: String,
    content: String,
    metadata: BTreeMap<String, Value>,
    embedding: Vec<f32>,
}

/// Name and size of a stored collection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub count: usize,
}

/// Process-local vector store ranking chunks by cosine similarity
pub struct InMemoryVectorStore {
    embedders: HashMap<String, Arc<dyn EmbeddingProvider>>,
    collections: RwLock<HashMap<String, Vec<StoredChunk>>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            embedders: HashMap::new(),
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Make `embedder` available under `name`, e.g. `openai`.
    pub fn with_embedder(mut self, name: &str, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedders.insert(name.to_lowercase(), embedder);
        self
    }

    fn embedder(&self, name: &str) -> Result<&Arc<dyn EmbeddingProvider>, CollaboratorError> {
        self.embedders
            .get(&name.to_lowercase())
            .ok_or_else(|| CollaboratorError::UnsupportedEmbedding(name.to_string()))
    }

    /// Embed `texts` and append them to `collection`, creating it if needed.
    /// Returns the generated chunk ids.
    pub async fn add_documents(
        &self,
        collection: &str,
        texts: Vec<String>,
        metadatas: Option<Vec<BTreeMap<String, Value>>>,
        embedding_provider: &str,
    ) -> Result<Vec<String>, CollaboratorError> {
        let embeddings = self.embedder(embedding_provider)?.embed(&texts).await?;
        if embeddings.len() != texts.len() {
            return Err(CollaboratorError::Decode(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        let mut metadatas = metadatas.unwrap_or_default().into_iter();
        let chunks: Vec<StoredChunk> = texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (content, embedding))| StoredChunk {
                id: uuid::Uuid::new_v4().to_string(),
                content,
                metadata: metadatas.next().unwrap_or_else(|| {
                    BTreeMap::from([("source".to_string(), Value::from(format!("doc_{}", i)))])
                }),
                embedding,
            })
            .collect();
        let ids = chunks.iter().map(|c| c.id.clone()).collect::<Vec<_>>();

        let mut collections = self.collections.write().await;
        let stored = collections.entry(collection.to_string()).or_default();
        stored.extend(chunks);
        info!(collection, added = ids.len(), total = stored.len(), "Stored documents");

        Ok(ids)
    }

    pub async fn list_collections(&self) -> Vec<CollectionInfo> {
        let collections = self.collections.read().await;
        let mut infos: Vec<_> = collections
            .iter()
            .map(|(name, chunks)| CollectionInfo {
                name: name.clone(),
                count: chunks.len(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Returns whether the collection existed.
    pub async fn delete_collection(&self, collection: &str) -> bool {
        self.collections.write().await.remove(collection).is_some()
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn query(
        &self,
        collection: &str,
        query_text: &str,
        k: usize,
        embedding_provider: &str,
    ) -> Result<Vec<Passage>, CollaboratorError> {
        let collections = self.collections.read().await;
        let chunks = match collections.get(collection) {
            Some(chunks) if !chunks.is_empty() => chunks,
            _ => {
                debug!(collection, "Collection is empty or unknown");
                return Ok(Vec::new());
            }
        };

        let query = self
            .embedder(embedding_provider)?
            .embed(&[query_text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CollaboratorError::Decode("no embedding for query".into()))?;

        let mut scored: Vec<(f32, &StoredChunk)> = chunks
            .iter()
            .map(|chunk| (cosine_similarity(&query, &chunk.embedding), chunk))
            .collect();
        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, chunk)| Passage {
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                score: score as f64,
            })
            .collect())
    }
}
