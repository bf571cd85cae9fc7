//! Pulling and filtering source documents from the knowledge base.
//!
//! Produces the complete set of indexable records for a deployment: every
//! non-archived, non-empty document across all collections (or one configured
//! collection). Per-page and per-document failures are logged and skipped;
//! partial results are acceptable and reported, an aborted run is not.

use askdesk_rag::Document;
use tracing::{info, warn};

use crate::client::{DocumentSummary, OutlineClient};
use crate::error::Result;

/// The outcome of an ingestion run.
#[derive(Debug)]
pub struct IngestReport {
    /// Records ready for indexing, in the API's listing order.
    pub documents: Vec<Document>,
    /// Documents excluded as archived, empty, or unfetchable.
    pub skipped: usize,
}

/// Fetch every indexable document, optionally restricted to one collection id.
///
/// Fails only when the collection listing itself is unreachable; everything
/// below that is skip-and-continue.
pub async fn fetch_all(
    client: &OutlineClient,
    collection_filter: Option<&str>,
) -> Result<IngestReport> {
    let collections = client.list_collections().await?;
    info!(collections = collections.len(), "listed knowledge-base collections");

    let mut documents = Vec::new();
    let mut skipped = 0usize;

    for collection in &collections {
        if collection_filter.is_some_and(|id| id != collection.id) {
            continue;
        }

        let mut offset = 0;
        loop {
            let page = match client.list_documents_page(&collection.id, offset).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        collection = %collection.name,
                        offset,
                        error = %e,
                        "document listing failed, skipping rest of collection"
                    );
                    break;
                }
            };
            // An empty page is the listing's end, not an error.
            if page.is_empty() {
                break;
            }

            for summary in page {
                match resolve_text(client, &summary).await {
                    Some(text) => {
                        let mut document = Document::new(&summary.id, text, &summary.title)
                            .with_collection(&collection.name);
                        if let Some(url) = summary.url.as_deref().filter(|u| !u.is_empty()) {
                            document = document.with_url(url);
                        }
                        documents.push(document);
                    }
                    None => skipped += 1,
                }
            }

            offset += client.page_size();
        }
    }

    info!(ingested = documents.len(), skipped, "ingestion run complete");
    Ok(IngestReport { documents, skipped })
}

/// Resolve a listed document to its body text, or `None` when it must be
/// excluded (archived, empty, or unfetchable).
async fn resolve_text(client: &OutlineClient, summary: &DocumentSummary) -> Option<String> {
    if summary.archived {
        return None;
    }

    match summary.text.as_deref() {
        Some(text) if !text.trim().is_empty() => Some(text.to_string()),
        // The listing inlined the body and it is empty: an empty document.
        Some(_) => None,
        // The listing does not inline bodies; ask for the document itself.
        None => match client.document_text(&summary.id).await {
            Ok(Some(text)) if !text.trim().is_empty() => Some(text),
            Ok(_) => None,
            Err(e) => {
                warn!(document = %summary.id, error = %e, "document fetch failed, skipping");
                None
            }
        },
    }
}
