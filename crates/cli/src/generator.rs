//! OpenAI-compatible chat-completions client used as the insight generator.

use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use pattern_engine::{PortError, SynthesisRequest, TextGenerator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:11434/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

const SYSTEM_PROMPT: &str = "You are a strategic analyst for a municipal grants team. \
You receive a cluster of signals drawn from different strategic domains. \
Explain the emergent cross-domain pattern they reveal and the opportunity it creates. \
Reply with a single JSON object and nothing else.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

pub struct HttpTextGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpTextGenerator {
    /// `timeout` bounds the whole HTTP exchange; the engine applies its own
    /// per-cluster timeout on top.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn build_request<'a>(model: &'a str, request: &SynthesisRequest) -> ChatRequest<'a> {
    let schema = serde_json::to_string_pretty(&request.response_schema)
        .unwrap_or_else(|_| request.response_schema.to_string());
    let system = format!("{SYSTEM_PROMPT}\n\nThe JSON object must satisfy this schema:\n{schema}");
    let user = format!(
        "Domains involved: {}\n\nSignals:\n{}",
        request.affected_domains.join(", "),
        request.description
    );
    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ],
        temperature: 0.3,
        response_format: ResponseFormat {
            kind: "json_object",
        },
    }
}

fn first_choice_content(body: &str) -> Result<String, PortError> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| PortError::Rejected("completion had no message content".to_string()))
}

fn preview(body: &str) -> String {
    let mut out: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
    if body.chars().count() > ERROR_BODY_PREVIEW_CHARS {
        out.push_str("...");
    }
    out
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String, PortError> {
        let body = build_request(&self.model, request);
        let mut call = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call
            .send()
            .await
            .map_err(|err| PortError::Unavailable(format!("POST {}: {err}", self.endpoint)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| PortError::Unavailable(format!("reading response: {err}")))?;

        if !status.is_success() {
            return Err(PortError::Rejected(format!("HTTP {status}: {}", preview(&text))));
        }
        log::debug!("Generator replied with {} bytes", text.len());
        first_choice_content(&text)
    }
}
