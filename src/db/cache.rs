// db/cache.rs
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};

pub const MAP_FEED_PREFIX: &str = "map_feed";

pub fn map_feed_key(collection: &str) -> String {
    format!("{}:{}", MAP_FEED_PREFIX, collection)
}

/// Raw string cache the map feeds are kept in. Redis in production.
#[async_trait]
pub trait FeedCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, redis::RedisError>;

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        ttl_seconds: usize,
    ) -> Result<(), redis::RedisError>;

    /// Deletes every key matching a glob `pattern` and returns how many went.
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, redis::RedisError>;
}

#[async_trait]
impl FeedCache for ConnectionManager {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.clone();
        conn.get(key).await
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        ttl_seconds: usize,
    ) -> Result<(), redis::RedisError> {
        let mut conn = self.clone();
        conn.set_ex(key, value, ttl_seconds).await
    }

    // SCAN instead of KEYS so Redis is not blocked.
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, redis::RedisError> {
        let mut conn = self.clone();
        let mut cursor: u64 = 0;
        let mut deleted_count = 0;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                deleted_count += keys.len();
                let _: () = conn.del(&keys).await?;
            }

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(deleted_count)
    }
}

pub struct CacheHelper;

impl CacheHelper {
    /// Cached JSON value under `key`. An entry that no longer deserializes
    /// counts as a miss.
    pub async fn get<T: DeserializeOwned>(
        cache: &dyn FeedCache,
        key: &str,
    ) -> Result<Option<T>, redis::RedisError> {
        match cache.get_raw(key).await? {
            Some(data) => match serde_json::from_str::<T>(&data) {
                Ok(value) => {
                    tracing::debug!("Cache HIT: {}", key);
                    Ok(Some(value))
                }
                Err(_) => {
                    tracing::warn!("Cache deserialization failed for: {}", key);
                    Ok(None)
                }
            },
            None => {
                tracing::debug!("Cache MISS: {}", key);
                Ok(None)
            }
        }
    }

    pub async fn set<T: Serialize>(
        cache: &dyn FeedCache,
        key: &str,
        value: &T,
        ttl_seconds: usize,
    ) -> Result<(), redis::RedisError> {
        if let Ok(json) = serde_json::to_string(value) {
            cache.set_raw(key, json, ttl_seconds).await?;
            tracing::debug!("Cache SET: {} (TTL: {}s)", key, ttl_seconds);
        }
        Ok(())
    }

    /// Drop every cached map collection. Called after any report or station insert.
    pub async fn invalidate_map_feeds(cache: &dyn FeedCache) {
        let pattern = format!("{}:*", MAP_FEED_PREFIX);
        match cache.delete_pattern(&pattern).await {
            Ok(deleted) => tracing::debug!("Cache DELETE pattern: {} ({} keys)", pattern, deleted),
            Err(e) => tracing::warn!("Failed to invalidate map feed cache: {}", e),
        }
    }
}
