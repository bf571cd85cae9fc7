//! Answering pipeline orchestrator.
//!
//! [`AnswerPipeline`] composes an [`EmbeddingProvider`], a
//! [`GenerationProvider`], and the persisted [`DocumentStore`]. Queries read
//! a frozen snapshot of the store; indexing builds a successor store, persists
//! it, then swaps the current pointer; readers never observe a partially
//! written store.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::chunking::split_text;
use crate::config::PipelineConfig;
use crate::document::{Chunk, Document, IndexReport, QueryOutcome};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::GenerationProvider;
use crate::snapshot::{load_store, persist_store};
use crate::store::DocumentStore;

/// The retrieval-augmented answering pipeline.
///
/// Construct one via [`AnswerPipeline::builder()`]; the store snapshot is
/// loaded from the configured directory at build time.
pub struct AnswerPipeline {
    config: PipelineConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    store_dir: PathBuf,
    current: RwLock<Arc<DocumentStore>>,
    /// Indexing is single-writer; queries never take this lock.
    index_lock: Mutex<()>,
}

impl AnswerPipeline {
    /// Create a new [`AnswerPipelineBuilder`].
    pub fn builder() -> AnswerPipelineBuilder {
        AnswerPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of chunks in the current store.
    pub async fn chunk_count(&self) -> usize {
        self.current.read().await.len()
    }

    async fn store_snapshot(&self) -> Arc<DocumentStore> {
        self.current.read().await.clone()
    }

    /// Index a batch of ingested documents: split → embed → upsert → persist.
    ///
    /// Each document's chunks replace any previously indexed chunks of the
    /// same source id. Per-chunk embedding failures are retried once, then
    /// the chunk is skipped and logged; they do not abort the batch. The new
    /// store is persisted before it becomes visible to queries; a failed
    /// persist leaves the previous store serving.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Pipeline`] when embedding fails for every chunk in
    /// the batch (provider outage), and propagates snapshot persistence
    /// failures. In both cases the in-memory and on-disk stores are unchanged.
    pub async fn index_documents(&self, documents: &[Document]) -> Result<IndexReport> {
        let _writer = self.index_lock.lock().await;

        let mut next = self.store_snapshot().await.as_ref().clone();
        let mut added = 0;
        let mut attempted = 0;
        let mut embedded = 0;

        for document in documents {
            let pieces = match self.config.max_chunk_chars {
                Some(max) => split_text(&document.text, max),
                None => split_text(&document.text, usize::MAX),
            };
            if pieces.is_empty() {
                warn!(document.id = %document.id, "document has no indexable text, skipping");
                continue;
            }

            let mut chunks = Vec::with_capacity(pieces.len());
            for (offset, piece) in pieces.into_iter().enumerate() {
                attempted += 1;
                let mut chunk = Chunk::new(document, offset, piece);
                match self.embed_with_retry(&chunk.text).await {
                    Ok(embedding) => {
                        chunk.embedding = embedding;
                        chunks.push(chunk);
                        embedded += 1;
                    }
                    Err(e) => {
                        warn!(
                            document.id = %document.id,
                            offset,
                            error = %e,
                            "chunk embedding failed after retry, skipping chunk"
                        );
                    }
                }
            }

            if chunks.is_empty() {
                // A document whose embedding fully failed keeps its existing chunks.
                warn!(document.id = %document.id, "no chunks embedded, keeping existing entries");
                continue;
            }

            added += next.upsert_document(&document.id, chunks)?;
        }

        if attempted > 0 && embedded == 0 {
            error!(attempted, "embedding failed for every chunk in the batch");
            return Err(RagError::Pipeline(
                "embedding failed for every chunk in the batch".to_string(),
            ));
        }

        persist_store(&self.store_dir, &next)?;

        let total = next.len();
        *self.current.write().await = Arc::new(next);

        info!(added, total, documents = documents.len(), "indexed document batch");
        Ok(IndexReport { added, total })
    }

    /// Answer one question against the current store.
    ///
    /// An empty store yields [`QueryOutcome::empty`] without touching either
    /// provider: "no knowledge" is a valid result, not an error. Only
    /// provider/transport failures propagate.
    pub async fn answer(&self, question: &str) -> Result<QueryOutcome> {
        self.answer_with_top_k(question, self.config.top_k).await
    }

    /// [`answer`](Self::answer) with an explicit retrieval breadth.
    pub async fn answer_with_top_k(&self, question: &str, top_k: usize) -> Result<QueryOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::Pipeline("question must not be empty".to_string()));
        }

        let store = self.store_snapshot().await;
        if store.is_empty() {
            info!("query against empty store");
            return Ok(QueryOutcome::empty());
        }

        let query_embedding = self.embedder.embed(question).await.map_err(|e| {
            error!(error = %e, "question embedding failed");
            e
        })?;

        let retrieved = store.search(&query_embedding, top_k);

        let passages: Vec<&str> = retrieved.iter().map(|r| r.chunk.text.as_str()).collect();
        let answer_text = self.generator.generate(question, &passages).await.map_err(|e| {
            error!(error = %e, "answer generation failed");
            e
        })?;

        info!(retrieved = retrieved.len(), answer_chars = answer_text.len(), "query completed");
        Ok(QueryOutcome { answer_text, retrieved })
    }

    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        match self.embedder.embed(text).await {
            Ok(embedding) => Ok(embedding),
            Err(first) => {
                warn!(error = %first, "embedding failed, retrying once");
                self.embedder.embed(text).await
            }
        }
    }
}

/// Builder for constructing an [`AnswerPipeline`].
///
/// All fields are required. [`build()`](AnswerPipelineBuilder::build) loads
/// the store snapshot from the store directory.
#[derive(Default)]
pub struct AnswerPipelineBuilder {
    config: Option<PipelineConfig>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn GenerationProvider>>,
    store_dir: Option<PathBuf>,
}

impl AnswerPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the generation provider.
    pub fn generator(mut self, generator: Arc<dyn GenerationProvider>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the directory holding the store snapshot.
    pub fn store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = Some(dir.into());
        self
    }

    /// Build the [`AnswerPipeline`], loading the persisted store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing, and
    /// [`RagError::Snapshot`] if an existing snapshot cannot be read.
    pub fn build(self) -> Result<AnswerPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let embedder =
            self.embedder.ok_or_else(|| RagError::Config("embedder is required".to_string()))?;
        let generator =
            self.generator.ok_or_else(|| RagError::Config("generator is required".to_string()))?;
        let store_dir =
            self.store_dir.ok_or_else(|| RagError::Config("store_dir is required".to_string()))?;

        let store = load_store(&store_dir)?;

        Ok(AnswerPipeline {
            config,
            embedder,
            generator,
            store_dir,
            current: RwLock::new(Arc::new(store)),
            index_lock: Mutex::new(()),
        })
    }
}
