//! Durable snapshots of the document store.
//!
//! The store is persisted as JSON Lines, one chunk per line, in a store
//! directory. Writes go to a temp file in the same directory which is then
//! renamed over the snapshot, so a crash mid-persist leaves the previous
//! snapshot intact.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::document::Chunk;
use crate::error::{RagError, Result};
use crate::store::DocumentStore;

/// File name of the snapshot within the store directory.
pub const SNAPSHOT_FILE: &str = "chunks.jsonl";

const SNAPSHOT_TMP: &str = "chunks.jsonl.tmp";

fn snapshot_error(path: &Path, message: impl Into<String>) -> RagError {
    RagError::Snapshot { path: path.display().to_string(), message: message.into() }
}

/// Load the store snapshot from `dir`.
///
/// A missing snapshot file is a normal first-boot state and yields an empty
/// store. An unreadable or corrupt snapshot is an error.
pub fn load_store(dir: &Path) -> Result<DocumentStore> {
    let path = dir.join(SNAPSHOT_FILE);
    if !path.exists() {
        info!(path = %path.display(), "no snapshot found, starting with an empty store");
        return Ok(DocumentStore::new());
    }

    let file = File::open(&path).map_err(|e| snapshot_error(&path, format!("open: {e}")))?;
    let reader = BufReader::new(file);

    let mut chunks = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| snapshot_error(&path, format!("read: {e}")))?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk: Chunk = serde_json::from_str(&line)
            .map_err(|e| snapshot_error(&path, format!("line {}: {e}", line_no + 1)))?;
        chunks.push(chunk);
    }

    let store = DocumentStore::from_chunks(chunks)?;
    info!(path = %path.display(), chunks = store.len(), "loaded store snapshot");
    Ok(store)
}

/// Persist `store` into `dir`, atomically with respect to process crashes.
pub fn persist_store(dir: &Path, store: &DocumentStore) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| snapshot_error(dir, format!("create dir: {e}")))?;

    let tmp_path = dir.join(SNAPSHOT_TMP);
    let final_path = dir.join(SNAPSHOT_FILE);

    let file =
        File::create(&tmp_path).map_err(|e| snapshot_error(&tmp_path, format!("create: {e}")))?;
    let mut writer = BufWriter::new(file);
    for chunk in store.chunks() {
        let line = serde_json::to_string(chunk)
            .map_err(|e| snapshot_error(&tmp_path, format!("serialize chunk: {e}")))?;
        writer
            .write_all(line.as_bytes())
            .and_then(|()| writer.write_all(b"\n"))
            .map_err(|e| snapshot_error(&tmp_path, format!("write: {e}")))?;
    }
    writer.flush().map_err(|e| snapshot_error(&tmp_path, format!("flush: {e}")))?;

    fs::rename(&tmp_path, &final_path)
        .map_err(|e| snapshot_error(&final_path, format!("rename: {e}")))?;

    info!(path = %final_path.display(), chunks = store.len(), "persisted store snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn sample_store() -> DocumentStore {
        let doc = Document::new("doc1", "Remote work policy text.", "Remote work")
            .with_url("https://kb.example.com/doc1");
        let mut chunk = Chunk::new(&doc, 0, doc.text.clone());
        chunk.embedding = vec![0.1, 0.2, 0.3];
        DocumentStore::from_chunks(vec![chunk]).unwrap()
    }

    #[test]
    fn missing_snapshot_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = load_store(dir.path()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn persist_then_load_preserves_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let store = sample_store();
        persist_store(dir.path(), &store).unwrap();

        let loaded = load_store(dir.path()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.chunks(), store.chunks());
    }

    #[test]
    fn persist_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        persist_store(dir.path(), &sample_store()).unwrap();
        persist_store(dir.path(), &DocumentStore::new()).unwrap();

        let loaded = load_store(dir.path()).unwrap();
        assert!(loaded.is_empty());
        // No temp file left behind to shadow the snapshot.
        assert!(!dir.path().join(SNAPSHOT_TMP).exists());
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SNAPSHOT_FILE), "not json\n").unwrap();
        let err = load_store(dir.path()).unwrap_err();
        assert!(matches!(err, RagError::Snapshot { .. }));
    }
}
