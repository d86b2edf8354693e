/// Read-through caching for async lookups.
///
/// Returns the cached value for `$key` when present. Otherwise awaits `$block`,
/// queues the result for a background write with a TTL of `$ttl` seconds, and
/// returns it. A failed cache read is logged and treated as a miss, so an
/// unavailable cache never fails the lookup. Errors from `$block` are propagated
/// with `?`, so the enclosing function must return an `AppResult`.
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache, CacheKey::Geocode(address.to_string()), GEOCODE_CACHE_TTL, async move {
///     lookup_address(address).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => Ok(cached),
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, bypassing cache");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
