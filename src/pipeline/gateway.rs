//! External completion gateway client.
//!
//! The evaluation call goes to an OpenAI-style chat completions endpoint.
//! Transport failures get exactly one retry; an HTTP response that arrived is
//! never retried, whatever its status, so the upstream sees at most two
//! attempts per audit.

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AppConfig;

pub const MAX_COMPLETION_TOKENS: u32 = 8000;
pub const TEMPERATURE: f64 = 0.1;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("AI gateway call failed [{status}]: {body}")]
    Upstream { status: u16, body: String },

    #[error("{0}")]
    Transport(String),

    #[error("Empty response from AI gateway")]
    EmptyResponse,

    #[error("Failed to decode gateway response: {0}")]
    ResponseDecode(String),
}

/// Dyn-safe seam over the completion backend so the pipeline can run against
/// a mock in tests.
pub trait CompletionClient: Send + Sync {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<String, GatewayError>>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for the hosted AI gateway.
pub struct AiGatewayClient {
    http: reqwest::Client,
    url: String,
    key: String,
    model: String,
    timeout_secs: u64,
}

impl AiGatewayClient {
    pub fn new(
        url: impl Into<String>,
        key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("reqwest client construction");
        Self {
            http,
            url: url.into(),
            key: key.into(),
            model: model.into(),
            timeout_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.gateway_url,
            &config.gateway_key,
            &config.model,
            config.gateway_timeout_secs,
        )
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<reqwest::Response, reqwest::Error> {
        self.http
            .post(&self.url)
            .bearer_auth(&self.key)
            .json(body)
            .send()
            .await
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Transport(format!(
                "AI gateway request timed out after {}s",
                self.timeout_secs
            ))
        } else if err.is_connect() {
            GatewayError::Transport(format!("Could not reach AI gateway at {}", self.url))
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl CompletionClient for AiGatewayClient {
    fn complete<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
    ) -> BoxFuture<'a, Result<String, GatewayError>> {
        Box::pin(async move {
            let body = ChatRequest {
                model: &self.model,
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
                max_tokens: MAX_COMPLETION_TOKENS,
                temperature: TEMPERATURE,
            };

            let response = match self.send_once(&body).await {
                Ok(response) => response,
                Err(first) => {
                    tracing::warn!(error = %first, "Gateway request failed, retrying once");
                    self.send_once(&body)
                        .await
                        .map_err(|err| self.transport_error(err))?
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GatewayError::Upstream {
                    status: status.as_u16(),
                    body,
                });
            }

            let decoded: ChatResponse = response
                .json()
                .await
                .map_err(|err| GatewayError::ResponseDecode(err.to_string()))?;

            let content = decoded
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message)
                .and_then(|message| message.content)
                .unwrap_or_default();

            if content.is_empty() {
                return Err(GatewayError::EmptyResponse);
            }
            Ok(content)
        })
    }
}

/// Scripted completion backend for pipeline and router tests.
#[cfg(test)]
pub struct MockCompletionClient {
    reply: Result<String, u16>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockCompletionClient {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            reply: Err(status),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl CompletionClient for MockCompletionClient {
    fn complete<'a>(
        &'a self,
        _system: &'a str,
        _user: &'a str,
    ) -> BoxFuture<'a, Result<String, GatewayError>> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let reply = self.reply.clone();
        Box::pin(async move {
            match reply {
                Ok(text) => Ok(text),
                Err(status) => Err(GatewayError::Upstream {
                    status,
                    body: "upstream rejected the request".to_string(),
                }),
            }
        })
    }
}
