//! OpenAI providers for embeddings and answer generation.
//!
//! This module is only available when the `openai` feature is enabled.
//! Both providers call the OpenAI HTTP API directly with `reqwest`, carry an
//! explicit request timeout, and retry transient failures (transport errors
//! and 5xx) exactly once. Client errors (4xx) are surfaced immediately.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationProvider;

/// The OpenAI embeddings API endpoint.
const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";

/// The OpenAI chat completions API endpoint.
const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// The default embedding model.
const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";

/// The default dimensionality for `text-embedding-3-small`.
const DEFAULT_EMBED_DIMENSIONS: usize = 1536;

/// The default chat model for answer synthesis.
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Per-request timeout for both providers.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client() -> std::result::Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()
}

/// POST a JSON body, retrying once on a transport error or 5xx response.
async fn post_with_retry<B: Serialize>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &B,
) -> std::result::Result<reqwest::Response, String> {
    let send = || client.post(url).bearer_auth(api_key).json(body).send();

    match send().await {
        Ok(response) if response.status().is_server_error() => {
            let status = response.status();
            warn!(%status, url, "server error, retrying once");
            send().await.map_err(|e| format!("retried request failed: {e}"))
        }
        Ok(response) => Ok(response),
        Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
            warn!(error = %e, url, "transport error, retrying once");
            send().await.map_err(|e| format!("retried request failed: {e}"))
        }
        Err(e) => Err(format!("request failed: {e}")),
    }
}

/// Decode an error body into the API's error message, falling back to the
/// raw body text.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    format!("API returned {status}: {detail}")
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
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

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Embedding provider ─────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
pub struct OpenAIEmbeddings {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
    /// If set, passed to the API for dimension truncation.
    request_dimensions: Option<usize>,
}

impl OpenAIEmbeddings {
    /// Create a new provider with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Embedding {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        let client = build_client().map_err(|e| RagError::Embedding {
            provider: "OpenAI".into(),
            message: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self {
            client,
            api_key,
            model: DEFAULT_EMBED_MODEL.into(),
            dimensions: DEFAULT_EMBED_DIMENSIONS,
            request_dimensions: None,
        })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| RagError::Embedding {
            provider: "OpenAI".into(),
            message: "OPENAI_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Set the embedding model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the output dimensions; the API truncates embeddings to this size.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    fn embedding_error(&self, message: String) -> RagError {
        RagError::Embedding { provider: "OpenAI".into(), message }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| self.embedding_error("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };

        let response = post_with_retry(&self.client, EMBEDDINGS_URL, &self.api_key, &request_body)
            .await
            .map_err(|message| {
                error!(error = %message, "embedding request failed");
                self.embedding_error(message)
            })?;

        if !response.status().is_success() {
            let detail = error_detail(response).await;
            error!(error = %detail, "embedding API error");
            return Err(self.embedding_error(detail));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| self.embedding_error(format!("failed to parse response: {e}")))?;

        Ok(embedding_response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Generation provider ────────────────────────────────────────────

/// A [`GenerationProvider`] backed by the OpenAI chat completions API.
///
/// Synthesizes an answer from the question plus the retrieved passages at
/// temperature 0.
pub struct OpenAIChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAIChat {
    /// Create a new provider with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Generation {
                provider: "OpenAI".into(),
                message: "API key must not be empty".into(),
            });
        }

        let client = build_client().map_err(|e| RagError::Generation {
            provider: "OpenAI".into(),
            message: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self { client, api_key, model: DEFAULT_CHAT_MODEL.into() })
    }

    /// Create a new provider using the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| RagError::Generation {
            provider: "OpenAI".into(),
            message: "OPENAI_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Set the chat model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn generation_error(&self, message: String) -> RagError {
        RagError::Generation { provider: "OpenAI".into(), message }
    }
}

#[async_trait]
impl GenerationProvider for OpenAIChat {
    async fn generate(&self, question: &str, passages: &[&str]) -> Result<String> {
        debug!(model = %self.model, passages = passages.len(), "generating answer");

        let context = passages
            .iter()
            .enumerate()
            .map(|(i, p)| format!("[{}] {p}", i + 1))
            .collect::<Vec<_>>()
            .join("\n\n");

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: "You are a support assistant for an internal knowledge base. \
                              Answer the question using only the provided passages. If the \
                              passages do not contain the answer, say that no information \
                              was found."
                        .to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Passages:\n{context}\n\nQuestion: {question}"),
                },
            ],
            temperature: 0.0,
        };

        let response = post_with_retry(&self.client, CHAT_URL, &self.api_key, &request_body)
            .await
            .map_err(|message| {
                error!(error = %message, "chat request failed");
                self.generation_error(message)
            })?;

        if !response.status().is_success() {
            let detail = error_detail(response).await;
            error!(error = %detail, "chat API error");
            return Err(self.generation_error(detail));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.generation_error(format!("failed to parse response: {e}")))?;

        let answer = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| self.generation_error("API returned no choices".into()))?;

        Ok(answer)
    }
}
