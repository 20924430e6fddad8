use async_trait::async_trait;
use ragcore::{CollaboratorError, Generation, GenerationRequest, LlmProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Routes generation requests to a provider by name
#[derive(Default)]
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` under `name`. Names are matched case-insensitively.
    pub fn register(&mut self, name: &str, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(name.to_lowercase(), provider);
    }

    pub fn with_provider(mut self, name: &str, provider: Arc<dyn LlmProvider>) -> Self {
        self.register(name, provider);
        self
    }

    pub fn providers(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.providers.keys().map(String::as_str).collect();
        names.sort();
        names
    }
}

#[async_trait]
impl LlmProvider for ProviderRouter {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, CollaboratorError> {
        let provider = self
            .providers
            .get(&request.provider.to_lowercase())
            .ok_or_else(|| CollaboratorError::UnsupportedProvider(request.provider.clone()))?;

        debug!(provider = %request.provider, model = %request.model, "Routing generation request");
        provider.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct Echo(&'static str);

    #[async_trait]
    impl LlmProvider for Echo {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<Generation, CollaboratorError> {
            Ok(Generation {
                text: format!("{}: {}", self.0, request.prompt),
                model: request.model,
                usage: BTreeMap::new(),
            })
        }
    }

    fn request(provider: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: "hi".into(),
            context: String::new(),
            provider: provider.into(),
            model: "m".into(),
            temperature: 0.7,
            system_prompt: None,
            use_web_search: false,
        }
    }

    fn router() -> ProviderRouter {
        ProviderRouter::new()
            .with_provider("openai", Arc::new(Echo("openai")))
            .with_provider("gemini", Arc::new(Echo("gemini")))
    }

    #[tokio::test]
    async fn test_routes_by_name() {
        let router = router();
        assert_eq!(router.generate(request("gemini")).await.unwrap().text, "gemini: hi");
        assert_eq!(router.generate(request("OpenAI")).await.unwrap().text, "openai: hi");
        assert_eq!(router.providers(), vec!["gemini", "openai"]);
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let err = router().generate(request("mystery")).await.unwrap_err();
        assert_eq!(err, CollaboratorError::UnsupportedProvider("mystery".into()));
        assert_eq!(err.to_string(), "Unsupported model provider: mystery");
    }
}
