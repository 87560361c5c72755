use redis::AsyncCommands;
use redis::Client;
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

/// Upper bound on a single Redis round trip, connection included
const CACHE_IO_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Embedding vector of a text, keyed by model, output length and a SHA-256 of the text
    Embedding {
        model: String,
        dimensions: usize,
        digest: String,
    },
}

impl CacheKey {
    /// Builds the embedding key for `text` under `model` at `dimensions`
    pub fn embedding(model: &str, dimensions: usize, text: &str) -> Self {
        let digest = hex::encode(Sha256::digest(text.as_bytes()));
        CacheKey::Embedding {
            model: model.to_string(),
            dimensions,
            digest,
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Embedding {
                model,
                dimensions,
                digest,
            } => write!(f, "embed:{}:{}:{}", model, dimensions, digest),
        }
    }
}

/// Creates a Redis client for caching
///
/// Opening the client does not connect; connections are made lazily per call.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Cache handler for storing and retrieving data from Redis
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task to flush pending writes and stop
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl Cache {
    /// Creates a new Cache and spawns its background writer task
    ///
    /// Writes go through a channel so callers never wait on Redis.
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx })
    }

    /// Processes write messages until shutdown, then drains what is queued
    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0usize;

                    while let Some(msg) = write_rx.recv().await {
                        match Self::write_to_redis(&client, msg).await {
                            Ok(()) => flushed += 1,
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                            }
                        }
                    }

                    tracing::info!(flushed = flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        tokio::time::timeout(CACHE_IO_TIMEOUT, async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
            Ok::<_, redis::RedisError>(())
        })
        .await
        .map_err(|_| AppError::Internal("Cache write timed out".to_string()))??;

        Ok(())
    }

    /// Retrieves and deserializes a value, `None` on a miss
    ///
    /// An unreachable or stalled Redis fails after `CACHE_IO_TIMEOUT`.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let cached = tokio::time::timeout(CACHE_IO_TIMEOUT, async {
            let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
            let cached: Option<String> = conn.get(key.to_string()).await?;
            Ok::<_, redis::RedisError>(cached)
        })
        .await
        .map_err(|_| AppError::Internal("Cache read timed out".to_string()))??;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Queues a value for writing without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_key_display() {
        let key = CacheKey::embedding("text-embedding-004", 768, "abc");
        assert_eq!(
            key.to_string(),
            "embed:text-embedding-004:768:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_embedding_key_depends_on_model_and_text() {
        let a = CacheKey::embedding("model-a", 768, "space opera");
        let b = CacheKey::embedding("model-b", 768, "space opera");
        let c = CacheKey::embedding("model-a", 768, "Space opera");

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, CacheKey::embedding("model-a", 768, "space opera"));
    }

    #[test]
    fn test_embedding_key_depends_on_dimensions() {
        let full = CacheKey::embedding("text-embedding-004", 768, "space opera");
        let reduced = CacheKey::embedding("text-embedding-004", 256, "space opera");

        assert_ne!(full, reduced);
        assert_ne!(full.to_string(), reduced.to_string());
    }

    #[tokio::test]
    async fn test_unreachable_redis_read_is_an_error() {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = Cache::new(client);

        let key = CacheKey::embedding("test-model", 3, "anything");
        let result: AppResult<Option<Vec<f32>>> = cache.get_from_cache(&key).await;

        assert!(result.is_err());
    }

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, _handle) = Cache::new(client);

        let key = CacheKey::embedding("test-model", 3, "nonexistent_key_12345");
        let retrieved: Option<Vec<f32>> = cache.get_from_cache(&key).await.unwrap();

        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_set_in_background_flushed_on_shutdown() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, handle) = Cache::new(client.clone());

        let key = CacheKey::embedding("test-model", 3, "test_shutdown");
        let value = vec![0.25f32, 0.5, 0.75];

        cache.set_in_background(&key, &value, 60);
        handle.shutdown().await;
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

        let retrieved: Option<Vec<f32>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key.to_string()).await.unwrap();
    }
}
