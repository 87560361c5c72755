/// Read-through caching over a `Cache`.
///
/// Returns the cached value when present. Otherwise awaits `$block`, hands the
/// computed value to the background writer and returns it. A failed cache
/// read is logged and treated as a miss, so an unreachable Redis never fails
/// the surrounding call.
///
/// # Arguments
/// * `$cache`: the cache instance (`get_from_cache` / `set_in_background`).
/// * `$key`: the `CacheKey` to read and write.
/// * `$ttl`: time-to-live of the written value in seconds.
/// * `$block`: future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let vector: Vec<f32> = cached!(cache, key, 3600, async move {
///     inner.embed(text).await
/// })?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let hit = match $cache.get_from_cache(&$key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %$key, "Cache read failed, treating as miss");
                None
            }
        };

        match hit {
            Some(cached) => Ok(cached),
            None => match $block.await {
                Ok(value) => {
                    $cache.set_in_background(&$key, &value, $ttl);
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
