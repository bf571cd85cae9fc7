//! Append-only query audit log.
//!
//! Every attempted query is recorded as one JSON line, whether it was
//! allowed or denied. Audit failures are logged and never fail the request.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

/// One audit record: who asked what, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// RFC 3339 timestamp of the attempt.
    pub ts: String,
    /// Requester identifier, when the transport supplied one.
    pub user_id: Option<String>,
    /// The question as received.
    pub question: String,
}

impl AuditRecord {
    /// Build a record stamped with the current time.
    pub fn new(user_id: Option<&str>, question: &str) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            user_id: user_id.map(str::to_string),
            question: question.to_string(),
        }
    }
}

/// Append-only JSONL audit log.
///
/// Appends are serialized by a mutex and each record is written as a single
/// line, so concurrent requests never interleave within a line.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    writer: Mutex<()>,
}

impl AuditLog {
    /// Create an audit log appending to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), writer: Mutex::new(()) }
    }

    /// Record a query attempt. Failures are logged, never propagated.
    pub async fn record(&self, user_id: Option<&str>, question: &str) {
        let record = AuditRecord::new(user_id, question);
        let _guard = self.writer.lock().await;
        if let Err(e) = self.append(&record) {
            warn!(path = %self.path.display(), error = %e, "audit append failed");
        }
    }

    fn append(&self, record: &AuditRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(record)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")
    }
}
