//! All backend logic independent of how the app is run.
//!
//! Documents are split into overlapping character windows ([chunks]), embedded
//! ([embedding], [ollama]), and kept in an in-memory exact index ([index]) owned by a
//! [store::Store]. Nothing is persisted except settings (see [config]).

pub mod app_data;
pub mod chunks;
pub mod config;
pub mod documents;
pub mod embedding;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod ollama;
pub mod store;

pub use app_data::app_data_dir;
pub use chunks::{chunk_spans, chunk_text, Chunk, ChunkConfig, ChunkError};
pub use config::{load_config, save_config, Config, ConfigError};
pub use documents::{collect_documents, scan_documents, ScanError};
pub use embedding::{EmbedError, Embedder, HashEmbedder};
pub use extract::{extract, extract_path, ExtractError, Format};
pub use index::{cosine_similarity_from_distance, FlatIndex, IndexError, Neighbor};
pub use ingest::{ingest_documents, ingest_text, DocumentOutcome, DocumentReport, IngestReport};
pub use ollama::OllamaClient;
pub use store::{SearchHit, SharedStore, Store, StoreError};

/// Returns a short status string. Used to verify the backend is wired up.
pub fn status() -> &'static str {
    "docqa-core ready"
}
