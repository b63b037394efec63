//! The embedding seam: anything that turns a batch of strings into fixed-size vectors.
//!
//! [`crate::ollama::OllamaClient`] talks to a local model. [`HashEmbedder`] is a
//! deterministic offline stand-in: no model, only feature hashing of word tokens.

use async_trait::async_trait;
use thiserror::Error;

/// Maps text to dense vectors of a fixed dimension.
///
/// Implementations acquire whatever they need (model weights, a client) when they
/// are constructed and fail there with [`EmbedError::ModelUnavailable`]; `embed`
/// is then expected to work for the embedder's whole lifetime.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Length of every vector returned by [`Embedder::embed`].
    fn dimension(&self) -> usize;

    /// Embed a batch in one call. Returns one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        (**self).embed(texts).await
    }
}

pub const DEFAULT_HASH_DIMENSION: usize = 384;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Bag-of-words feature hashing: each lowercase alphanumeric token adds ±1 to the
/// bucket its hash selects. Texts sharing words land close together; nothing else
/// is semantic about it.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self, EmbedError> {
        if dimension == 0 {
            return Err(EmbedError::ModelUnavailable(
                "hash embedder needs a non-zero dimension".into(),
            ));
        }
        Ok(Self { dimension })
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            let h = fnv1a(token.as_bytes());
            let bucket = (h % self.dimension as u64) as usize;
            // Top bit picks the sign so collisions partially cancel instead of piling up.
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        v
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_HASH_DIMENSION,
        }
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |h, b| (h ^ u64::from(*b)).wrapping_mul(FNV_PRIME))
}

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("embedding request failed: {0}")]
    Request(String),
    #[error("invalid embedding service URL: {0}")]
    ParseUrl(#[from] url::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let e = HashEmbedder::new(64).unwrap();
        let texts = vec!["The cat sat".to_string(), "the CAT sat!".to_string()];
        let a = e.embed(&texts).await.unwrap();
        let b = e.embed(&texts).await.unwrap();
        assert_eq!(a, b);
        // Case and punctuation do not matter.
        assert_eq!(a[0], a[1]);
        assert!(a.iter().all(|v| v.len() == 64));
    }

    #[tokio::test]
    async fn hash_embedder_preserves_order_and_count() {
        let e = HashEmbedder::default();
        let texts: Vec<String> = ["alpha", "beta", "", "gamma"].iter().map(|s| s.to_string()).collect();
        let out = e.embed(&texts).await.unwrap();
        assert_eq!(out.len(), 4);
        assert!(out[2].iter().all(|x| *x == 0.0));
        assert_eq!(out[0], e.embed(&["alpha".to_string()]).await.unwrap()[0]);
    }

    #[test]
    fn zero_dimension_is_unavailable() {
        assert!(matches!(HashEmbedder::new(0), Err(EmbedError::ModelUnavailable(_))));
    }

    #[test]
    fn fnv1a_known_values() {
        assert_eq!(fnv1a(b""), FNV_OFFSET);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
