//! Typed configuration records for the node kinds that take settings.
//!
//! Each record is read from a node's free-form config map with explicit
//! defaults. Blank strings are treated as absent.

use crate::NodeSpec;

pub const DEFAULT_RESULT_COUNT: usize = 5;
pub const DEFAULT_EMBEDDING_PROVIDER: &str = "openai";
pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_WEB_RESULT_COUNT: usize = 5;

/// Settings of a Retrieval node.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    pub collection: Option<String>,
    pub result_count: usize,
    pub embedding_provider: String,
}

impl RetrievalConfig {
    pub fn from_spec(spec: &NodeSpec) -> Self {
        Self {
            collection: spec
                .config_str(&["collection", "collectionName"])
                .map(str::to_string),
            result_count: spec
                .config_u64(&["resultCount", "maxResults", "k"])
                .map(|n| n as usize)
                .unwrap_or(DEFAULT_RESULT_COUNT),
            embedding_provider: spec
                .config_str(&["embeddingProvider"])
                .unwrap_or(DEFAULT_EMBEDDING_PROVIDER)
                .to_string(),
        }
    }
}

/// Settings of a Generation node.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    /// As configured; `None` means the default provider is used.
    pub provider: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub custom_prompt: Option<String>,
    pub system_prompt: Option<String>,
    pub use_web_search: bool,
    pub web_result_count: usize,
}

impl GenerationConfig {
    pub fn from_spec(spec: &NodeSpec) -> Self {
        let provider = spec
            .config_str(&["provider", "modelProvider"])
            .map(str::to_string);
        let model = spec
            .config_str(&["model"])
            .map(str::to_string)
            .unwrap_or_else(|| default_model(provider.as_deref().unwrap_or(DEFAULT_PROVIDER)).to_string());

        Self {
            provider,
            model,
            temperature: spec
                .config_f64(&["temperature"])
                .unwrap_or(DEFAULT_TEMPERATURE),
            custom_prompt: spec
                .config_str(&["customPrompt", "prompt"])
                .map(str::to_string),
            system_prompt: spec.config_str(&["systemPrompt"]).map(str::to_string),
            use_web_search: spec.config_bool(&["useWebSearch"]).unwrap_or(false),
            web_result_count: spec
                .config_u64(&["webResultCount"])
                .map(|n| n as usize)
                .unwrap_or(DEFAULT_WEB_RESULT_COUNT),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    /// The prompt sent to the provider for `query`.
    pub fn resolve_prompt(&self, query: &str) -> String {
        match &self.custom_prompt {
            Some(custom) => format!("{}\n\nUser Query: {}", custom, query),
            None => query.to_string(),
        }
    }
}

fn default_model(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "gemini" | "google" => "gemini-pro",
        _ => "gpt-3.5-turbo",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeKind;

    #[test]
    fn retrieval_defaults() {
        let spec = NodeSpec::new("kb", NodeKind::Retrieval);
        let config = RetrievalConfig::from_spec(&spec);

        assert_eq!(config.collection, None);
        assert_eq!(config.result_count, 5);
        assert_eq!(config.embedding_provider, "openai");
    }

    #[test]
    fn retrieval_reads_editor_keys() {
        let spec = NodeSpec::new("kb", NodeKind::Retrieval)
            .with_config("collectionName", "manuals")
            .with_config("maxResults", 3i64)
            .with_config("embeddingProvider", "gemini");
        let config = RetrievalConfig::from_spec(&spec);

        assert_eq!(config.collection.as_deref(), Some("manuals"));
        assert_eq!(config.result_count, 3);
        assert_eq!(config.embedding_provider, "gemini");
    }

    #[test]
    fn blank_collection_counts_as_missing() {
        let spec = NodeSpec::new("kb", NodeKind::Retrieval).with_config("collection", "  ");
        assert_eq!(RetrievalConfig::from_spec(&spec).collection, None);
    }

    #[test]
    fn generation_model_defaults_follow_provider() {
        let openai = NodeSpec::new("g", NodeKind::Generation);
        let gemini = NodeSpec::new("g", NodeKind::Generation).with_config("modelProvider", "gemini");

        let openai = GenerationConfig::from_spec(&openai);
        assert_eq!(openai.provider, None);
        assert_eq!(openai.provider_name(), "openai");
        assert_eq!(openai.model, "gpt-3.5-turbo");
        assert_eq!(openai.temperature, 0.7);
        assert!(!openai.use_web_search);

        assert_eq!(GenerationConfig::from_spec(&gemini).model, "gemini-pro");
    }

    #[test]
    fn gemini_aliases_default_to_gemini_model() {
        for provider in ["google", "Gemini", "GEMINI"] {
            let spec = NodeSpec::new("g", NodeKind::Generation).with_config("provider", provider);
            assert_eq!(
                GenerationConfig::from_spec(&spec).model,
                "gemini-pro",
                "provider {}",
                provider
            );
        }
    }

    #[test]
    fn temperature_accepts_text() {
        let spec = NodeSpec::new("g", NodeKind::Generation).with_config("temperature", "0.2");
        assert_eq!(GenerationConfig::from_spec(&spec).temperature, 0.2);

        let junk = NodeSpec::new("g", NodeKind::Generation).with_config("temperature", "warm");
        assert_eq!(GenerationConfig::from_spec(&junk).temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn custom_prompt_wraps_query() {
        let spec = NodeSpec::new("g", NodeKind::Generation).with_config("customPrompt", "Be brief.");
        let config = GenerationConfig::from_spec(&spec);

        assert_eq!(config.resolve_prompt("hi"), "Be brief.\n\nUser Query: hi");
    }
}
