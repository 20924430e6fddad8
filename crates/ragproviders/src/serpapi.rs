use crate::http::{read_json, request_failed};
use async_trait::async_trait;
use ragcore::{CollaboratorError, SearchHit, WebSearch};

/// Google web search through SerpAPI
pub struct SerpApiSearch {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl SerpApiSearch {
    pub fn new(endpoint: &str, api_key: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            api_key: api_key.map(String::from),
        }
    }
}

fn organic_results(body: &serde_json::Value, n: usize) -> Vec<SearchHit> {
    let field = |r: &serde_json::Value, key: &str| r[key].as_str().unwrap_or("").to_string();

    body["organic_results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .take(n)
                .map(|r| SearchHit {
                    title: field(r, "title"),
                    snippet: field(r, "snippet"),
                    link: field(r, "link"),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl WebSearch for SerpApiSearch {
    async fn search(&self, query: &str, n: usize) -> Result<Vec<SearchHit>, CollaboratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CollaboratorError::NotConfigured("SerpAPI key".into()))?;

        let num = n.to_string();
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", query),
                ("api_key", api_key),
                ("engine", "google"),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(request_failed)?;
        let body: serde_json::Value = read_json(response).await?;

        Ok(organic_results(&body, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_organic_results() {
        let body = json!({
            "organic_results": [
                {"title": "Rust", "snippet": "A language", "link": "https://rust-lang.org"},
                {"title": "No snippet", "link": "https://example.com"},
                {"title": "Third", "snippet": "dropped", "link": "https://example.org"}
            ]
        });

        let hits = organic_results(&body, 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Rust");
        assert_eq!(hits[0].link, "https://rust-lang.org");
        assert_eq!(hits[1].snippet, "");
    }

    #[test]
    fn test_missing_results() {
        assert!(organic_results(&json!({"error": "quota"}), 5).is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let search = SerpApiSearch::new("http://localhost:1", None);
        let err = search.search("rust", 5).await.unwrap_err();
        assert_eq!(err.to_string(), "SerpAPI key not configured");
    }
}
