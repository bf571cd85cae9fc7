//! Retrieval-augmented answering pipeline for the AskDesk assistant.
//!
//! The crate covers the full path from ingested documents to a gated answer:
//!
//! - [`Document`]/[`Chunk`] data model with positional chunk identity
//! - [`chunking::split_text`] for boundary-aware splitting of long records
//! - [`EmbeddingProvider`]/[`GenerationProvider`] seams for the external
//!   model capabilities (OpenAI implementations behind the `openai` feature)
//! - [`DocumentStore`] — in-memory similarity search with durable JSONL
//!   snapshots ([`snapshot`])
//! - [`AnswerPipeline`] — index (split → embed → upsert → persist → swap)
//!   and query (embed → search → generate)
//! - [`GatePolicy`] — the pure answer-quality gate deciding whether a
//!   synthesized answer is shown or replaced by the fixed fallback

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gate;
pub mod generation;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod snapshot;
pub mod store;

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use document::{Chunk, Document, IndexReport, QueryOutcome, ScoredChunk};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use gate::{GatePolicy, Verdict};
pub use generation::GenerationProvider;
#[cfg(feature = "openai")]
pub use openai::{OpenAIChat, OpenAIEmbeddings};
pub use pipeline::{AnswerPipeline, AnswerPipelineBuilder};
pub use store::DocumentStore;
