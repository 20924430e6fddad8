use crate::http::{read_json, request_failed};
use async_trait::async_trait;
use ragcore::{CollaboratorError, Generation, GenerationRequest, LlmProvider, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MAX_OUTPUT_TOKENS: u32 = 4000;

/// Google Gemini `generateContent` client
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(String::from),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Default)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize, Debug)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: GeminiContent,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    #[serde(default)]
    total_token_count: u64,
}

fn full_prompt(request: &GenerationRequest) -> String {
    if request.context.is_empty() {
        request.prompt.clone()
    } else {
        format!("Context:\n{}\n\nQuestion: {}", request.context, request.prompt)
    }
}

fn text_content(role: Option<&str>, text: String) -> GeminiContent {
    GeminiContent {
        role: role.map(String::from),
        parts: vec![GeminiPart { text }],
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, CollaboratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CollaboratorError::NotConfigured("Google API key".into()))?;

        let body = GeminiRequest {
            contents: vec![text_content(Some("user"), full_prompt(&request))],
            system_instruction: request
                .system_prompt
                .clone()
                .map(|system| text_content(None, system)),
            generation_config: GeminiGenerationConfig {
                temperature: request.temperature,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .http
            .post(format!("{}/models/{}:generateContent", self.base_url, request.model))
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(request_failed)?;
        let reply: GeminiResponse = read_json(response).await?;

        let candidate = reply
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| CollaboratorError::Decode("response has no candidates".into()))?;
        let text = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        let mut usage = BTreeMap::new();
        if let Some(u) = reply.usage_metadata {
            usage.insert("prompt_tokens".to_string(), Value::from(u.prompt_token_count as f64));
            usage.insert("completion_tokens".to_string(), Value::from(u.candidates_token_count as f64));
            usage.insert("total_tokens".to_string(), Value::from(u.total_token_count as f64));
        }

        Ok(Generation {
            text,
            model: request.model,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(context: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: "Why?".into(),
            context: context.into(),
            provider: "gemini".into(),
            model: "gemini-pro".into(),
            temperature: 0.2,
            system_prompt: None,
            use_web_search: false,
        }
    }

    #[test]
    fn test_context_wraps_prompt() {
        assert_eq!(full_prompt(&request("")), "Why?");
        assert_eq!(
            full_prompt(&request("Because.")),
            "Context:\nBecause.\n\nQuestion: Why?"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GeminiRequest {
            contents: vec![text_content(Some("user"), "hi".into())],
            system_instruction: Some(text_content(None, "be nice".into())),
            generation_config: GeminiGenerationConfig {
                temperature: 0.5,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "be nice");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 4000);
    }
}
