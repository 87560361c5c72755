/// External capabilities consumed by the recommendation pipeline
///
/// Embedding, nearest-neighbor search, corpus lookup and text generation are
/// all reached through these traits so the pipeline can run against the real
/// backends (Gemini, Postgres + pgvector) or deterministic in-memory stand-ins.
use crate::{
    error::AppResult,
    models::{MovieId, Neighbor, ReferenceMovie},
};

pub mod cached;
pub mod gemini;
pub mod memory;
pub mod pgvector;

pub use cached::CachedEmbedder;
pub use gemini::GeminiClient;
pub use memory::InMemoryCorpus;
pub use pgvector::PgCorpus;

/// Converts text into a fixed-length vector
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    ///
    /// Fails with `RateLimited` when the upstream throttles, and with
    /// `EmbeddingUnavailable` for every other failure, including an empty or
    /// wrongly sized vector.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;

    /// Model identifier, used in cache keys and logs
    fn model_name(&self) -> &str;

    /// Length of every vector this embedder returns
    fn dimensions(&self) -> usize;
}

/// Nearest-neighbor search over the corpus embeddings
#[async_trait::async_trait]
pub trait NearestNeighborIndex: Send + Sync {
    /// Returns at most `limit` neighbors sorted by descending similarity
    ///
    /// Similarity is `1 - cosine distance`. Movies without an embedding are
    /// never returned.
    async fn nearest(&self, query: &[f32], limit: usize) -> AppResult<Vec<Neighbor>>;
}

/// Full-record lookups against the reference corpus
#[async_trait::async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Case-insensitive exact title lookup; unknown titles are simply absent
    async fn find_by_titles(&self, titles: &[String]) -> AppResult<Vec<ReferenceMovie>>;

    /// Fetch full records by id; unknown ids are simply absent
    async fn fetch_by_ids(&self, ids: &[MovieId]) -> AppResult<Vec<ReferenceMovie>>;
}

/// Free-form text generation
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the prompt
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}
