//! Session cache: email -> user snapshot, read-through in front of the user store

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::models::{Role, User};
use crate::cache::CacheStore;

/// Default lifetime of a cached user, in seconds
pub const USER_CACHE_TTL_SECS: u64 = 900;

/// Bumped whenever `CachedUser` changes shape; older payloads read as misses
const CACHE_FORMAT_VERSION: u8 = 1;

/// Wire format of a cached user
#[derive(Debug, Serialize, Deserialize)]
struct CachedUser {
    v: u8,
    id: i32,
    email: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
    confirmed: bool,
    avatar: Option<String>,
    role: Role,
}

impl From<&User> for CachedUser {
    fn from(user: &User) -> Self {
        Self {
            v: CACHE_FORMAT_VERSION,
            id: user.id,
            email: user.email.clone(),
            password: user.password.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            confirmed: user.confirmed,
            avatar: user.avatar.clone(),
            role: user.role,
        }
    }
}

impl From<CachedUser> for User {
    fn from(cached: CachedUser) -> Self {
        Self {
            id: cached.id,
            email: cached.email,
            password: cached.password,
            first_name: cached.first_name,
            last_name: cached.last_name,
            confirmed: cached.confirmed,
            avatar: cached.avatar,
            role: cached.role,
        }
    }
}

/// Read-through user cache.
///
/// Every failure mode (missing key, expired key, undecodable payload, store
/// error) reads as a miss, so the cache can only ever change latency.
#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn CacheStore>,
    ttl_secs: u64,
}

impl SessionCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    pub fn key(email: &str) -> String {
        format!("user:{}", email)
    }

    /// Cached snapshot for `email`, if present and unexpired
    pub async fn get(&self, email: &str) -> Option<User> {
        let key = Self::key(email);
        let bytes = match self.store.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Session cache read failed for {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice::<CachedUser>(&bytes) {
            Ok(cached) if cached.v == CACHE_FORMAT_VERSION => Some(cached.into()),
            Ok(cached) => {
                tracing::debug!("Ignoring cache entry {} with format v{}", key, cached.v);
                None
            }
            Err(e) => {
                tracing::debug!("Ignoring undecodable cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Store a snapshot of `user`, replacing any previous one and resetting its expiry
    pub async fn put(&self, user: &User) {
        let key = Self::key(&user.email);
        let payload = match serde_json::to_vec(&CachedUser::from(user)) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Could not serialize cache entry {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.store.set_ex(&key, &payload, self.ttl_secs).await {
            tracing::warn!("Session cache write failed for {}: {}", key, e);
        }
    }

    /// Drop the snapshot for `email`
    pub async fn invalidate(&self, email: &str) {
        let key = Self::key(email);
        if let Err(e) = self.store.delete(&key).await {
            tracing::warn!("Session cache eviction failed for {}: {}", key, e);
        }
    }
}
