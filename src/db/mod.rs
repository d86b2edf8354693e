pub mod postgres;
pub mod redis;

pub use self::postgres::{create_pool, PgDirectoryStore};
pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
