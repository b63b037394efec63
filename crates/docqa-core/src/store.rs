//! In-memory chunk store: embeds chunks on add, keeps the chunk text for every index
//! position, and maps search results back to text.
//! No persistence; the store is discarded when the process exits.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::embedding::{EmbedError, Embedder};
use crate::index::{FlatIndex, IndexError};

/// A retrieved chunk and its distance to the query (smaller is closer, range `[0, 2]`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub text: String,
    pub distance: f32,
}

/// Owns the similarity index and the chunk text at each index position.
/// Position `i` in the index is always `texts[i]`.
#[derive(Debug)]
pub struct Store<E> {
    embedder: E,
    index: FlatIndex,
    texts: Vec<String>,
}

impl<E: Embedder> Store<E> {
    /// Empty store whose index dimension is the embedder's.
    pub fn new(embedder: E) -> Self {
        let index = FlatIndex::new(embedder.dimension());
        Self {
            embedder,
            index,
            texts: Vec::new(),
        }
    }

    /// Embed `chunks` in one batch and append them. On any error nothing is added.
    #[instrument(skip_all, fields(batch = chunks.len(), stored = self.texts.len()))]
    pub async fn add_chunks(&mut self, chunks: &[String]) -> Result<(), StoreError> {
        if chunks.is_empty() {
            return Ok(());
        }
        info!("embedding chunks");
        let vectors = self.embedder.embed(chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(StoreError::BatchSize {
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }
        self.index.add(&vectors)?;
        self.texts.extend_from_slice(chunks);
        debug!(total = self.texts.len(), "chunks added");
        Ok(())
    }

    /// Up to `top_k` chunks closest to `query`, nearest first. An empty store
    /// returns nothing without embedding the query.
    #[instrument(skip_all, fields(top_k = top_k, stored = self.texts.len()))]
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, StoreError> {
        if self.is_empty() {
            debug!("store is empty, skipping search");
            return Ok(Vec::new());
        }
        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::BatchSize {
                expected: 1,
                actual: 0,
            })?;
        let neighbors = self.index.search(&query_vec, top_k)?;
        let hits: Vec<SearchHit> = neighbors
            .into_iter()
            .filter_map(|n| match self.texts.get(n.position) {
                Some(text) => Some(SearchHit {
                    text: text.clone(),
                    distance: n.distance,
                }),
                None => {
                    warn!(position = n.position, "index returned a position with no chunk");
                    None
                }
            })
            .collect();
        debug!(hits = hits.len(), "search done");
        Ok(hits)
    }

    /// Drop every chunk and vector. Safe to call on an empty store.
    pub fn clear(&mut self) {
        self.index.reset();
        self.texts.clear();
        info!("store cleared");
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}

/// A [`Store`] behind a readers-writer lock: searches share the lock, while
/// `add_chunks` and `clear` hold it exclusively for their whole duration.
///
/// Library API for hosts that serve several callers at once. The `docqa`
/// binary runs one session per process and uses [`Store`] directly.
#[derive(Debug)]
pub struct SharedStore<E> {
    inner: Arc<RwLock<Store<E>>>,
}

impl<E> Clone for SharedStore<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Embedder> SharedStore<E> {
    pub fn new(store: Store<E>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub async fn add_chunks(&self, chunks: &[String]) -> Result<(), StoreError> {
        self.inner.write().await.add_chunks(chunks).await
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>, StoreError> {
        self.inner.read().await.search(query, top_k).await
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),
    #[error("embedder returned {actual} vectors for {expected} inputs")]
    BatchSize { expected: usize, actual: usize },
    #[error(transparent)]
    Index(#[from] IndexError),
}
