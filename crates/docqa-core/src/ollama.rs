//! Ollama embedding client. Wraps ollama-rs behind the [`Embedder`] trait.

use async_trait::async_trait;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};
use ollama_rs::Ollama;
use tracing::{debug, info, instrument};

use crate::embedding::{EmbedError, Embedder};

pub const DEFAULT_EMBED_MODEL: &str = "all-minilm";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Text sent once at connect time to learn the model's output dimension.
const PROBE_TEXT: &str = "dimension probe";

/// Ollama-backed embedder. The model is probed once on [`OllamaClient::connect`],
/// which fixes the dimension for the client's lifetime.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    inner: Ollama,
    embed_model: String,
    dimension: usize,
}

impl OllamaClient {
    /// Connect to `url` and verify `model` can embed. Fails with
    /// [`EmbedError::ModelUnavailable`] if the server or model is not there.
    #[instrument(skip_all, fields(url = %url, model = %model))]
    pub async fn connect(url: &str, model: &str) -> Result<Self, EmbedError> {
        let inner = Ollama::try_new(url)?;
        let probe = request(&inner, model, vec![PROBE_TEXT.to_string()])
            .await
            .map_err(|e| EmbedError::ModelUnavailable(format!("{model}: {e}")))?;
        let dimension = probe.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(EmbedError::ModelUnavailable(format!(
                "{model} returned an empty embedding"
            )));
        }
        info!(dimension, "embedding model ready");
        Ok(Self {
            inner,
            embed_model: model.to_string(),
            dimension,
        })
    }

    /// Connect to localhost:11434 with the default model.
    pub async fn connect_default() -> Result<Self, EmbedError> {
        Self::connect(DEFAULT_BASE_URL, DEFAULT_EMBED_MODEL).await
    }

    pub fn model(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = texts.len(), model = %self.embed_model, "embedding batch");
        request(&self.inner, &self.embed_model, texts.to_vec())
            .await
            .map_err(|e| EmbedError::Request(e.to_string()))
    }
}

async fn request(
    ollama: &Ollama,
    model: &str,
    texts: Vec<String>,
) -> Result<Vec<Vec<f32>>, ollama_rs::error::OllamaError> {
    let req = GenerateEmbeddingsRequest::new(model.to_string(), EmbeddingsInput::Multiple(texts));
    let res = ollama.generate_embeddings(req).await?;
    Ok(res.embeddings)
}
