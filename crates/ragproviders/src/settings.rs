pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const SERPAPI_URL: &str = "https://serpapi.com/search";

/// Credentials and endpoints for the external services
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub google_api_key: Option<String>,
    pub gemini_base_url: String,
    pub serpapi_api_key: Option<String>,
}

impl ProviderSettings {
    /// Read settings from `OPENAI_API_KEY`, `OPENAI_BASE_URL`,
    /// `GOOGLE_API_KEY`, `GEMINI_BASE_URL` and `SERPAPI_API_KEY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            openai_api_key: var("OPENAI_API_KEY"),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            google_api_key: var("GOOGLE_API_KEY"),
            gemini_base_url: var("GEMINI_BASE_URL").unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            serpapi_api_key: var("SERPAPI_API_KEY"),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
