//! Data types for ingested documents, indexed chunks, and query results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata key for the source document's title.
pub const META_TITLE: &str = "title";
/// Metadata key for the source document's link. May be absent.
pub const META_URL: &str = "url";
/// Metadata key for the source collection name. May be absent.
pub const META_COLLECTION: &str = "collection";

/// A source document produced by ingestion, ready for indexing.
///
/// The `id` is the source system's document identity and stays stable across
/// re-ingestion, which is what makes re-indexing an upsert rather than an
/// append.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable identifier assigned by the source system.
    pub id: String,
    /// The full text content. Ingestion never emits empty text.
    pub text: String,
    /// Ordered key-value metadata (`title`, optionally `url` and `collection`).
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document with the given id, text, and title metadata.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(META_TITLE.to_string(), title.into());
        Self { id: id.into(), text: text.into(), metadata }
    }

    /// Attach a source link to the document metadata.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.metadata.insert(META_URL.to_string(), url.into());
        self
    }

    /// Attach a collection name to the document metadata.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.metadata.insert(META_COLLECTION.to_string(), collection.into());
        self
    }
}

/// The atomic indexed unit: a span of document text plus its embedding.
///
/// Chunk identity is positional (`{document_id}#{offset}`), so re-indexing
/// the same source document produces the same ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, stable across re-indexing of the same source.
    pub id: String,
    /// The ID of the source [`Document`].
    pub document_id: String,
    /// Position of this chunk within its parent document.
    pub offset: usize,
    /// Non-empty text content.
    pub text: String,
    /// The embedding vector; dimensionality is fixed per store.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document.
    pub metadata: BTreeMap<String, String>,
}

impl Chunk {
    /// Build a chunk for the given parent document and position.
    ///
    /// The embedding is attached later by the pipeline.
    pub fn new(document: &Document, offset: usize, text: String) -> Self {
        Self {
            id: format!("{}#{offset}", document.id),
            document_id: document.id.clone(),
            offset,
            text,
            embedding: Vec::new(),
            metadata: document.metadata.clone(),
        }
    }

    /// The chunk's source link, if the source system supplied one.
    pub fn url(&self) -> Option<&str> {
        self.metadata.get(META_URL).map(String::as_str)
    }
}

/// A retrieved [`Chunk`] paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}

/// The raw result of answering one question, before the quality gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// The synthesized answer text. Empty when the store held no knowledge.
    pub answer_text: String,
    /// Retrieved chunks ordered by descending similarity, at most `top_k`.
    pub retrieved: Vec<ScoredChunk>,
}

impl QueryOutcome {
    /// The outcome for a query against an empty store: no evidence, no answer.
    pub fn empty() -> Self {
        Self { answer_text: String::new(), retrieved: Vec::new() }
    }
}

/// Counts reported by an indexing run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexReport {
    /// Chunks added or replaced by this run.
    pub added: usize,
    /// Total chunks in the store after the run.
    pub total: usize,
}
