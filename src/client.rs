//! Completion client abstraction and the HTTP chat-completions backend.
//!
//! The gateway depends on a narrow contract: send one rendered prompt, get the
//! reply text back. Any backend satisfying [`CompletionClient`] is
//! substitutable, which is how the tests script replies without a network.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, header};
use bon::Builder;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::CompletionError;

/// Replies larger than this are treated as unusable rather than buffered.
const MAX_REPLY_BYTES: usize = 4 * 1024 * 1024;

type HyperClient = Client<
    hyper_tls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    Body,
>;

/// One reply from the completion backend.
#[derive(Debug, Clone)]
pub struct CompletionReply {
    pub content: String,
}

/// The outbound boundary: one prompt in, raw reply text out.
///
/// One call per gateway request, no retries. Implementations should bound how
/// long a call can take; the stock backend wraps every call in its configured
/// timeout.
#[async_trait]
pub trait CompletionClient: std::fmt::Debug {
    async fn complete(&self, prompt: &str) -> Result<CompletionReply, CompletionError>;
}

/// Connection details for an OpenAI-compatible chat-completions backend.
#[derive(Debug, Clone, Builder)]
pub struct BackendOptions {
    /// Base URL of the backend, e.g. `https://api.openai.com/` or a local
    /// inference server.
    pub url: Url,
    /// Model name sent with every request.
    pub model: String,
    /// Bearer key, if the backend requires one.
    pub api_key: Option<String>,
    /// Seconds to wait for one completion call, including reading the body.
    #[builder(default = 120)]
    pub timeout_secs: u64,
}

/// The stock backend: POSTs to `v1/chat/completions` over the pooled hyper
/// client and pulls the first choice's message content out of the envelope.
#[derive(Debug, Clone)]
pub struct ChatCompletionsBackend {
    options: BackendOptions,
    http: HyperClient,
}

impl ChatCompletionsBackend {
    pub fn new(options: BackendOptions) -> Self {
        Self {
            options,
            http: create_hyper_client(),
        }
    }
}

fn create_hyper_client() -> HyperClient {
    let https = hyper_tls::HttpsConnector::new();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(32)
        .pool_timer(hyper_util::rt::TokioTimer::new())
        .build(https)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

fn transport(e: impl std::error::Error + Send + Sync + 'static) -> CompletionError {
    CompletionError::Transport(Box::new(e))
}

#[async_trait]
impl CompletionClient for ChatCompletionsBackend {
    async fn complete(&self, prompt: &str) -> Result<CompletionReply, CompletionError> {
        let payload = ChatRequest {
            model: &self.options.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let body = serde_json::to_vec(&payload).map_err(transport)?;

        let endpoint = self
            .options
            .url
            .join("v1/chat/completions")
            .map_err(transport)?;

        let mut request = Request::builder()
            .method(Method::POST)
            .uri(endpoint.as_str())
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = &self.options.api_key {
            request = request.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }
        let request = request.body(Body::from(body)).map_err(transport)?;

        let timeout = Duration::from_secs(self.options.timeout_secs);
        let exchange = async {
            let response = self.http.request(request).await.map_err(transport)?;

            let status = response.status();
            if !status.is_success() {
                return Err(CompletionError::Status {
                    status: status.as_u16(),
                });
            }

            axum::body::to_bytes(Body::new(response.into_body()), MAX_REPLY_BYTES)
                .await
                .map_err(transport)
        };
        let bytes = tokio::time::timeout(timeout, exchange)
            .await
            .map_err(|_| CompletionError::Timeout(self.options.timeout_secs))??;

        let envelope: ChatResponse =
            serde_json::from_slice(&bytes).map_err(CompletionError::Envelope)?;
        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionError::MissingContent)?;

        Ok(CompletionReply { content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_options_default_timeout() {
        let options = BackendOptions::builder()
            .url("http://localhost:11434/".parse().unwrap())
            .model("llama3".to_string())
            .build();
        assert_eq!(options.timeout_secs, 120);
        assert!(options.api_key.is_none());
    }

    #[test]
    fn chat_request_serializes_a_single_user_message() {
        let payload = ChatRequest {
            model: "gpt-4o-mini",
            messages: [ChatMessage {
                role: "user",
                content: "hello",
            }],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hello");
    }

    #[test]
    fn chat_response_content_is_optional() {
        let envelope: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap();
        assert!(envelope.choices[0].message.content.is_none());
    }
}
