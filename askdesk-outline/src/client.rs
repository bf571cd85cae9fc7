//! HTTP client for an Outline-compatible knowledge-base API.
//!
//! The API is POST-only: `collections.list`, `documents.list`, and
//! `documents.info`, each authenticated with a bearer credential and wrapping
//! its payload in `{"data": ...}`. Document listings paginate via
//! `limit`/`offset`; an empty `data` array means the listing is exhausted.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{OutlineError, Result};

/// Default page size for document listings.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Per-request timeout against the knowledge-base API.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// A knowledge-base collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    /// The collection's identifier.
    pub id: String,
    /// Human-readable collection name.
    pub name: String,
}

/// A document as returned by the listing endpoint.
///
/// `text` may be absent when the deployment does not inline document bodies
/// in listings; [`OutlineClient::document_text`] fetches it separately.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentSummary {
    /// The document's identifier, stable across edits.
    pub id: String,
    /// The document title.
    pub title: String,
    /// Inline body text, when the listing supplies it.
    #[serde(default)]
    pub text: Option<String>,
    /// Per-document link, when the deployment supplies one.
    #[serde(default)]
    pub url: Option<String>,
    /// Whether the document has been archived.
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct DocumentInfo {
    #[serde(default)]
    text: Option<String>,
}

// ── Client ─────────────────────────────────────────────────────────

/// Client for the knowledge-base source API.
pub struct OutlineClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    page_size: usize,
}

impl OutlineClient {
    /// Create a client for the API at `base_url` with the given credential.
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(OutlineError::Config("API token must not be empty".to_string()));
        }

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Set the page size used for document listings.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// The configured listing page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// List all collections.
    pub async fn list_collections(&self) -> Result<Vec<Collection>> {
        let envelope: Envelope<Vec<Collection>> =
            self.post_json("collections.list", json!({})).await?;
        Ok(envelope.data)
    }

    /// List one page of documents in a collection, starting at `offset`.
    ///
    /// An empty page means the listing is exhausted.
    pub async fn list_documents_page(
        &self,
        collection_id: &str,
        offset: usize,
    ) -> Result<Vec<DocumentSummary>> {
        let body = json!({
            "collectionId": collection_id,
            "limit": self.page_size,
            "offset": offset,
        });
        let envelope: Envelope<Vec<DocumentSummary>> =
            self.post_json("documents.list", body).await?;
        Ok(envelope.data)
    }

    /// Fetch the full text of a single document.
    pub async fn document_text(&self, document_id: &str) -> Result<Option<String>> {
        let envelope: Envelope<DocumentInfo> =
            self.post_json("documents.info", json!({ "id": document_id })).await?;
        Ok(envelope.data.text)
    }

    /// POST a JSON body to an API endpoint, retrying once on a transport
    /// error or 5xx response. 4xx responses are not retried.
    async fn post_json<T: DeserializeOwned>(&self, endpoint: &str, body: Value) -> Result<T> {
        let url = format!("{}/{endpoint}", self.base_url);
        let send = || {
            self.client.post(&url).bearer_auth(&self.api_token).json(&body).send()
        };

        let response = match send().await {
            Ok(response) if response.status().is_server_error() => {
                warn!(endpoint, status = %response.status(), "server error, retrying once");
                send().await?
            }
            Ok(response) => response,
            Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                warn!(endpoint, error = %e, "transport error, retrying once");
                send().await?
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(OutlineError::Api { endpoint: endpoint.to_string(), status: status.as_u16() });
        }

        debug!(endpoint, "knowledge-base API call succeeded");
        response.json::<T>().await.map_err(|e| OutlineError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = OutlineClient::new("https://kb.example.com/api/", "token").unwrap();
        assert_eq!(client.base_url, "https://kb.example.com/api");
    }

    #[test]
    fn rejects_empty_token() {
        assert!(OutlineClient::new("https://kb.example.com/api", "").is_err());
    }
}
