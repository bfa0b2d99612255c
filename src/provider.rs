//! Model backend that generates replies from conversation history.
//!
//! The `Provider` trait is the seam the dispatcher talks through; the
//! concrete implementation speaks the OpenAI-compatible chat-completions
//! wire format.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::EngineConfig;
use crate::history::Message;

/// Failure from the model backend (network, quota, malformed response,
/// timeout). Never surfaced to the user; the dispatcher substitutes a fixed
/// fallback reply.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct EngineError {
    pub message: String,
    pub status_code: Option<u16>,
}

impl EngineError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
        }
    }
}

/// Interface to the reply engine.
///
/// `history` is the conversation as it stands after the triggering user turn
/// was appended, so its last entry is the current user message. The provider
/// never mutates history; recording turns is the caller's job.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn get_reply(&self, text: &str, history: &[Message]) -> Result<String, EngineError>;
}

/// OpenAI-compatible chat-completions client.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(config: &EngineConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .unwrap_or_else(|_| HeaderValue::from_static("")),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn get_reply(&self, text: &str, history: &[Message]) -> Result<String, EngineError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        // The history already terminates with the current user turn, so it
        // maps onto the wire message list as-is; `text` is not appended again.
        let messages: Vec<WireMessage> = history
            .iter()
            .map(|m| WireMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect();

        tracing::debug!(
            "Engine request | Model: {} | Turns: {} | Input: {} chars",
            self.model,
            messages.len(),
            text.len()
        );

        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::new(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError {
                message: format!("API error: {body}"),
                status_code: Some(status.as_u16()),
            });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::new(format!("Failed to parse response: {e}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| EngineError::new("Response contained no choices"))?;

        Ok(content)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}
