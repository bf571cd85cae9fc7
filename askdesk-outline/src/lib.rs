//! Ingestion client for an Outline-compatible knowledge base.
//!
//! [`OutlineClient`] speaks the source API (bearer-authenticated POST
//! endpoints, `{"data": [...]}` envelopes, `limit`/`offset` pagination);
//! [`ingest::fetch_all`] walks it into a deduplicated, filtered set of
//! [`askdesk_rag::Document`]s ready for indexing.

pub mod client;
pub mod error;
pub mod ingest;

pub use client::{Collection, DocumentSummary, OutlineClient, DEFAULT_PAGE_SIZE};
pub use error::{OutlineError, Result};
pub use ingest::{IngestReport, fetch_all};
