use crate::http::{read_json, request_failed};
use async_trait::async_trait;
use ragcore::{CollaboratorError, Generation, GenerationRequest, LlmProvider, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MAX_TOKENS: u32 = 4000;

/// OpenAI chat completions client
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(String::from),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

/// System prompt first, then the retrieved context, then the user prompt.
fn build_messages(request: &GenerationRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::new();
    if let Some(system) = &request.system_prompt {
        messages.push(ChatMessage::new("system", system.clone()));
    }
    if !request.context.is_empty() {
        messages.push(ChatMessage::new(
            "system",
            format!(
                "Use the following context to answer the user's question:\n\n{}",
                request.context
            ),
        ));
    }
    messages.push(ChatMessage::new("user", request.prompt.clone()));
    messages
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<Generation, CollaboratorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CollaboratorError::NotConfigured("OpenAI API key".into()))?;

        let body = ChatRequest {
            model: request.model.clone(),
            messages: build_messages(&request),
            temperature: request.temperature,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(request_failed)?;
        let reply: ChatResponse = read_json(response).await?;

        let text = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CollaboratorError::Decode("response has no choices".into()))?;

        let mut usage = BTreeMap::new();
        if let Some(u) = reply.usage {
            usage.insert("prompt_tokens".to_string(), Value::from(u.prompt_tokens as f64));
            usage.insert("completion_tokens".to_string(), Value::from(u.completion_tokens as f64));
            usage.insert("total_tokens".to_string(), Value::from(u.total_tokens as f64));
        }

        Ok(Generation {
            text,
            model: reply.model.unwrap_or(request.model),
            usage,
        })
    }
}
