//! Key-value stores backing the session cache
//!
//! The session cache only needs a handful of primitives from its backing
//! store: byte values addressed by string keys, each with an optional
//! time-to-live. Redis is used in production; the in-memory store backs tests
//! and `serve --memory`.

mod memory;
mod redis;

pub use self::memory::MemoryCacheStore;
pub use self::redis::RedisCacheStore;

use async_trait::async_trait;

use crate::error::Result;

/// Generic key-value store with per-key expiry
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the raw value, or `None` when the key is absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores a value with no expiry, replacing any existing one
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Sets the key to expire `seconds` from now; a missing key is a no-op
    async fn expire(&self, key: &str, seconds: u64) -> Result<()>;

    /// Stores a value and its expiry in one step
    async fn set_ex(&self, key: &str, value: &[u8], seconds: u64) -> Result<()> {
        self.set(key, value).await?;
        self.expire(key, seconds).await
    }

    /// Removes a key; removing a missing key succeeds
    async fn delete(&self, key: &str) -> Result<()>;
}
