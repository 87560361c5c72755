use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::AppResult,
    services::providers::Embedder,
};

const EMBEDDING_CACHE_TTL: u64 = 86400; // 1 day

/// Embedder decorator that keeps vectors in Redis
///
/// Identical taste-profile documents (repeated runs, refresh clicks) reuse the
/// stored vector instead of calling the upstream again. Only successful
/// embeddings are cached; errors such as `RateLimited` pass straight through.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Cache,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, cache: Cache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait::async_trait]
impl Embedder for CachedEmbedder {
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let key = CacheKey::embedding(self.inner.model_name(), self.inner.dimensions(), text);
        let inner = self.inner.clone();

        cached!(self.cache, key, EMBEDDING_CACHE_TTL, async move {
            inner.embed(text).await
        })
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}
