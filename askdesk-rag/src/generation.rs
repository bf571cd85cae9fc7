//! Generation provider trait for synthesizing answers from retrieved passages.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that synthesizes a natural-language answer to a question from
/// a set of supporting passages.
///
/// The pipeline passes the retrieved chunk texts in relevance order; what the
/// provider does with them (prompt layout, model choice) is its own concern.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Produce an answer to `question` grounded in `passages`.
    ///
    /// Never called with an empty passage list; an empty store short-circuits
    /// before generation.
    async fn generate(&self, question: &str, passages: &[&str]) -> Result<String>;
}
