//! In-process cache store

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::CacheStore;
use crate::error::Result;

#[derive(Debug, Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    /// Shift applied to the wall clock, lets tests jump past a TTL
    clock_offset: Duration,
}

impl State {
    fn now(&self) -> DateTime<Utc> {
        Utc::now() + self.clock_offset
    }
}

/// HashMap-backed store with lazy expiry on read
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    state: Arc<RwLock<State>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move this store's clock forward
    pub async fn advance(&self, by: Duration) {
        let mut state = self.state.write().await;
        state.clock_offset += by;
    }

    /// Number of live (unexpired) keys
    pub async fn len(&self) -> usize {
        let state = self.state.read().await;
        let now = state.now();
        state
            .entries
            .values()
            .filter(|e| e.expires_at.map_or(true, |at| at > now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut state = self.state.write().await;
        let now = state.now();

        let expired = match state.entries.get(key) {
            Some(entry) => entry.expires_at.is_some_and(|at| at <= now),
            None => return Ok(None),
        };

        if expired {
            state.entries.remove(key);
            return Ok(None);
        }
        Ok(state.entries.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut state = self.state.write().await;
        state.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, seconds: u64) -> Result<()> {
        let mut state = self.state.write().await;
        let deadline = state.now() + Duration::seconds(seconds as i64);
        if let Some(entry) = state.entries.get_mut(key) {
            entry.expires_at = Some(deadline);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.state.write().await.entries.remove(key);
        Ok(())
    }
}
