//! In-memory document store with cosine-similarity search.
//!
//! The store keeps chunks in insertion order, which makes similarity ties
//! deterministic: equal scores rank in the order the chunks were indexed.
//! Writers mutate a private copy during an indexing run and publish it
//! wholesale; readers only ever see a frozen store (see
//! [`AnswerPipeline`](crate::pipeline::AnswerPipeline)).

use std::collections::HashMap;

use crate::document::{Chunk, ScoredChunk};
use crate::error::{RagError, Result};

/// An insertion-ordered collection of indexed chunks.
#[derive(Debug, Default, Clone)]
pub struct DocumentStore {
    chunks: Vec<Chunk>,
    /// Chunk id → position in `chunks`. Rebuilt on removal.
    by_id: HashMap<String, usize>,
    /// Embedding dimensionality, fixed by the first inserted chunk.
    dimensions: Option<usize>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an existing chunk list (snapshot load).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Store`] if any chunk has empty text or an
    /// embedding whose dimensionality disagrees with the rest.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Result<Self> {
        let mut store = Self::new();
        store.extend(chunks)?;
        Ok(store)
    }

    /// Number of chunks in the store.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// The stored chunks in insertion order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The embedding dimensionality, once at least one chunk is stored.
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Append a single chunk.
    ///
    /// A chunk with an id already present replaces the existing entry in
    /// place, keeping its original rank.
    pub fn insert(&mut self, chunk: Chunk) -> Result<()> {
        if chunk.text.is_empty() {
            return Err(RagError::Store(format!("chunk '{}' has empty text", chunk.id)));
        }
        match self.dimensions {
            Some(dims) if chunk.embedding.len() != dims => {
                return Err(RagError::Store(format!(
                    "chunk '{}' has {} dimensions, store has {dims}",
                    chunk.id,
                    chunk.embedding.len()
                )));
            }
            Some(_) => {}
            None => self.dimensions = Some(chunk.embedding.len()),
        }

        match self.by_id.get(&chunk.id) {
            Some(&at) => self.chunks[at] = chunk,
            None => {
                self.by_id.insert(chunk.id.clone(), self.chunks.len());
                self.chunks.push(chunk);
            }
        }
        Ok(())
    }

    /// Bulk-load chunks in order.
    pub fn extend(&mut self, chunks: Vec<Chunk>) -> Result<()> {
        for chunk in chunks {
            self.insert(chunk)?;
        }
        Ok(())
    }

    /// Replace all chunks of one source document with a fresh split.
    ///
    /// Existing chunks sharing `document_id` are removed first, so
    /// re-indexing an edited document never leaves stale chunks behind.
    /// Returns the number of chunks now indexed for the document.
    pub fn upsert_document(&mut self, document_id: &str, chunks: Vec<Chunk>) -> Result<usize> {
        self.remove_document(document_id);
        let added = chunks.len();
        self.extend(chunks)?;
        Ok(added)
    }

    /// Remove every chunk belonging to `document_id`. Returns the count removed.
    pub fn remove_document(&mut self, document_id: &str) -> usize {
        let before = self.chunks.len();
        self.chunks.retain(|chunk| chunk.document_id != document_id);
        let removed = before - self.chunks.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    fn reindex(&mut self) {
        self.by_id =
            self.chunks.iter().enumerate().map(|(at, c)| (c.id.clone(), at)).collect();
        if self.chunks.is_empty() {
            self.dimensions = None;
        }
    }

    /// Return the `top_k` chunks most similar to `embedding`, by descending
    /// cosine similarity. Ties rank in insertion order. An empty store yields
    /// an empty result, the valid "no knowledge" state, not an error.
    pub fn search(&self, embedding: &[f32], top_k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|chunk| ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(&chunk.embedding, embedding),
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn chunk(document_id: &str, offset: usize, text: &str, embedding: Vec<f32>) -> Chunk {
        let doc = Document::new(document_id, text, "t");
        let mut c = Chunk::new(&doc, offset, text.to_string());
        c.embedding = embedding;
        c
    }

    #[test]
    fn empty_store_returns_no_results() {
        let store = DocumentStore::new();
        assert!(store.search(&[1.0, 0.0], 3).is_empty());
    }

    #[test]
    fn search_ranks_by_similarity() {
        let mut store = DocumentStore::new();
        store.insert(chunk("a", 0, "east", vec![1.0, 0.0])).unwrap();
        store.insert(chunk("b", 0, "north", vec![0.0, 1.0])).unwrap();
        store.insert(chunk("c", 0, "northeast", vec![0.7, 0.7])).unwrap();

        let results = store.search(&[1.0, 0.0], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.document_id, "a");
        assert_eq!(results[1].chunk.document_id, "c");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let mut store = DocumentStore::new();
        store.insert(chunk("first", 0, "x", vec![1.0, 0.0])).unwrap();
        store.insert(chunk("second", 0, "y", vec![1.0, 0.0])).unwrap();

        let results = store.search(&[1.0, 0.0], 2);
        assert_eq!(results[0].chunk.document_id, "first");
        assert_eq!(results[1].chunk.document_id, "second");
    }

    #[test]
    fn upsert_replaces_stale_chunks() {
        let mut store = DocumentStore::new();
        store
            .extend(vec![
                chunk("doc1", 0, "old first", vec![1.0, 0.0]),
                chunk("doc1", 1, "old second", vec![0.0, 1.0]),
                chunk("doc2", 0, "other", vec![0.5, 0.5]),
            ])
            .unwrap();

        let added = store
            .upsert_document("doc1", vec![chunk("doc1", 0, "new only", vec![0.2, 0.8])])
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(store.len(), 2);
        let texts: Vec<&str> = store.chunks().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["other", "new only"]);
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        let mut store = DocumentStore::new();
        store.insert(chunk("a", 0, "x", vec![1.0, 0.0])).unwrap();
        let err = store.insert(chunk("b", 0, "y", vec![1.0, 0.0, 0.0])).unwrap_err();
        assert!(matches!(err, RagError::Store(_)));
    }

    #[test]
    fn rejects_empty_text() {
        let mut store = DocumentStore::new();
        assert!(store.insert(chunk("a", 0, "", vec![1.0])).is_err());
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
