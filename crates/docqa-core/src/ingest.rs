//! Ingestion pipeline: extract → chunk → embed → store, one document at a time.
//!
//! A failing document never aborts the batch. Each one gets a [`DocumentOutcome`]
//! and the store stays usable for everything already indexed.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::chunks::{chunk_spans, ChunkConfig};
use crate::embedding::Embedder;
use crate::extract::{extract, ExtractError, Format};
use crate::store::{Store, StoreError};

/// What happened to one document.
#[derive(Debug)]
pub enum DocumentOutcome {
    /// Text was extracted and this many chunks were added.
    Indexed { chunks: usize },
    /// Extraction worked but produced no text (or only whitespace).
    Empty,
    /// Unsupported or unreadable file; nothing was added.
    ExtractFailed(ExtractError),
    /// Chunks could not be embedded or stored; nothing was added.
    StoreFailed(StoreError),
}

impl DocumentOutcome {
    pub fn is_indexed(&self) -> bool {
        matches!(self, DocumentOutcome::Indexed { .. })
    }
}

#[derive(Debug)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub outcome: DocumentOutcome,
}

/// Per-document results of one ingestion run, in input order.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub documents: Vec<DocumentReport>,
}

impl IngestReport {
    /// Chunks added across all documents.
    pub fn total_chunks(&self) -> usize {
        self.documents
            .iter()
            .map(|d| match d.outcome {
                DocumentOutcome::Indexed { chunks } => chunks,
                _ => 0,
            })
            .sum()
    }

    pub fn indexed(&self) -> usize {
        self.documents.iter().filter(|d| d.outcome.is_indexed()).count()
    }

    /// Documents that did not contribute any chunks.
    pub fn problems(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| !d.outcome.is_indexed())
    }
}

/// Chunk `text` and add it to the store. Returns the number of chunks added.
pub async fn ingest_text<E: Embedder>(
    store: &mut Store<E>,
    text: &str,
    config: &ChunkConfig,
) -> Result<usize, StoreError> {
    let chunks: Vec<String> = chunk_spans(text, config).into_iter().map(|c| c.text).collect();
    store.add_chunks(&chunks).await?;
    Ok(chunks.len())
}

/// Ingest one document. Never fails; problems are reported in the outcome.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn ingest_document<E: Embedder>(
    store: &mut Store<E>,
    path: &Path,
    config: &ChunkConfig,
) -> DocumentOutcome {
    let text = match Format::from_path(path).and_then(|format| extract(path, format)) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "extraction failed");
            return DocumentOutcome::ExtractFailed(e);
        }
    };
    if text.trim().is_empty() {
        warn!("no text could be extracted");
        return DocumentOutcome::Empty;
    }
    match ingest_text(store, &text, config).await {
        Ok(chunks) => {
            info!(chunks, "document indexed");
            DocumentOutcome::Indexed { chunks }
        }
        Err(e) => {
            warn!(error = %e, "indexing failed");
            DocumentOutcome::StoreFailed(e)
        }
    }
}

/// Ingest every path in order, appending to whatever the store already holds.
pub async fn ingest_documents<E: Embedder>(
    store: &mut Store<E>,
    paths: &[PathBuf],
    config: &ChunkConfig,
) -> IngestReport {
    let mut report = IngestReport::default();
    for path in paths {
        let outcome = ingest_document(store, path, config).await;
        report.documents.push(DocumentReport {
            path: path.clone(),
            outcome,
        });
    }
    info!(
        documents = report.documents.len(),
        indexed = report.indexed(),
        chunks = report.total_chunks(),
        "ingestion finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbedder;
    use crate::extract::tests::docx_bytes;

    fn store() -> Store<HashEmbedder> {
        Store::new(HashEmbedder::new(64).unwrap())
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, "x".repeat(1200)).unwrap();
        let blank = dir.path().join("blank.txt");
        std::fs::write(&blank, "  \n\t ").unwrap();
        let odd = dir.path().join("slides.pptx");
        std::fs::write(&odd, "pptx").unwrap();
        let missing = dir.path().join("missing.txt");
        let docx = dir.path().join("overview.docx");
        std::fs::write(&docx, docx_bytes(&["Jupiter holds most of the remaining mass."])).unwrap();

        let mut store = store();
        let paths = vec![good.clone(), blank, odd, missing, docx];
        let report = ingest_documents(&mut store, &paths, &ChunkConfig::default()).await;

        assert_eq!(report.documents.len(), 5);
        assert!(matches!(report.documents[0].outcome, DocumentOutcome::Indexed { chunks: 3 }));
        assert!(matches!(report.documents[1].outcome, DocumentOutcome::Empty));
        assert!(matches!(
            report.documents[2].outcome,
            DocumentOutcome::ExtractFailed(ExtractError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            report.documents[3].outcome,
            DocumentOutcome::ExtractFailed(ExtractError::Read(..))
        ));
        assert!(matches!(report.documents[4].outcome, DocumentOutcome::Indexed { chunks: 1 }));
        assert_eq!(report.total_chunks(), 4);
        assert_eq!(report.indexed(), 2);
        assert_eq!(report.problems().count(), 3);
        assert_eq!(store.len(), 4);

        let hits = store.search("jupiter mass", 1).await.unwrap();
        assert!(hits[0].text.starts_with("Jupiter"));
    }

    #[tokio::test]
    async fn ingestion_is_cumulative() {
        let mut store = store();
        let config = ChunkConfig::new(10, 2).unwrap();
        assert_eq!(ingest_text(&mut store, "abcdefghijklmnop", &config).await.unwrap(), 2);
        assert_eq!(ingest_text(&mut store, "", &config).await.unwrap(), 0);
        assert_eq!(ingest_text(&mut store, "qrstuv", &config).await.unwrap(), 1);
        assert_eq!(store.len(), 3);
    }
}
