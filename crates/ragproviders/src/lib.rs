//! Concrete collaborators backed by external services.
//!
//! [`ProviderStack::from_settings`] wires the LLM clients, web search and
//! the in-memory vector store into a [`Collaborators`] set.

pub mod chunking;
pub mod documents;
pub mod embeddings;
pub mod gemini;
mod http;
pub mod openai;
pub mod router;
pub mod serpapi;
pub mod settings;
pub mod store;

pub use chunking::{chunk_text, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use documents::{chunk_metadata, extract_pdf_text, ExtractedText};
pub use embeddings::{cosine_similarity, EmbeddingProvider, GeminiEmbeddings, OpenAiEmbeddings};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use router::ProviderRouter;
pub use serpapi::SerpApiSearch;
pub use settings::ProviderSettings;
pub use store::{CollectionInfo, InMemoryVectorStore};

use ragcore::Collaborators;
use std::sync::Arc;

/// Collaborators plus a typed handle on the vector store for ingestion
pub struct ProviderStack {
    pub store: Arc<InMemoryVectorStore>,
    pub collaborators: Collaborators,
}

impl ProviderStack {
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        let openai_key = settings.openai_api_key.as_deref();
        let google_key = settings.google_api_key.as_deref();

        let gemini_embeddings = Arc::new(GeminiEmbeddings::new(&settings.gemini_base_url, google_key));
        let store = Arc::new(
            InMemoryVectorStore::new()
                .with_embedder(
                    "openai",
                    Arc::new(OpenAiEmbeddings::new(&settings.openai_base_url, openai_key)),
                )
                .with_embedder("gemini", gemini_embeddings.clone())
                .with_embedder("google", gemini_embeddings),
        );

        let gemini = Arc::new(GeminiClient::new(&settings.gemini_base_url, google_key));
        let llm = ProviderRouter::new()
            .with_provider("openai", Arc::new(OpenAiClient::new(&settings.openai_base_url, openai_key)))
            .with_provider("gemini", gemini.clone())
            .with_provider("google", gemini);

        let web_search = SerpApiSearch::new(settings::SERPAPI_URL, settings.serpapi_api_key.as_deref());

        Self {
            store: store.clone(),
            collaborators: Collaborators {
                vector_store: store,
                llm: Arc::new(llm),
                web_search: Arc::new(web_search),
            },
        }
    }
}
