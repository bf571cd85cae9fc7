//! Configuration for the answering pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the answering pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Number of chunks retrieved per query.
    pub top_k: usize,
    /// Maximum chunk size in characters; `None` indexes each record whole.
    pub max_chunk_chars: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { top_k: 3, max_chunk_chars: Some(2000) }
    }
}

impl PipelineConfig {
    /// Create a new builder for constructing a [`PipelineConfig`].
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the retrieval breadth.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn max_chunk_chars(mut self, chars: usize) -> Self {
        self.config.max_chunk_chars = Some(chars);
        self
    }

    /// Disable splitting: each record becomes a single chunk.
    pub fn unsplit(mut self) -> Self {
        self.config.max_chunk_chars = None;
        self
    }

    /// Build the [`PipelineConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `top_k == 0` or a zero chunk size is set.
    pub fn build(self) -> Result<PipelineConfig> {
        if self.config.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        if self.config.max_chunk_chars == Some(0) {
            return Err(RagError::Config("max_chunk_chars must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}
