//! Bearer token -> principal resolution

use std::sync::Arc;

use crate::auth::jwt::{Claims, TokenService};
use crate::auth::models::User;
use crate::auth::session::SessionCache;
use crate::config::RoleReconciliation;
use crate::db::UserStore;
use crate::error::{Error, Result};

/// Resolves the user behind a bearer token, going through the session cache
/// before the user store.
#[derive(Clone)]
pub struct Authenticator {
    tokens: TokenService,
    cache: SessionCache,
    users: Arc<dyn UserStore>,
    reconciliation: RoleReconciliation,
}

impl Authenticator {
    pub fn new(
        tokens: TokenService,
        cache: SessionCache,
        users: Arc<dyn UserStore>,
        reconciliation: RoleReconciliation,
    ) -> Self {
        Self {
            tokens,
            cache,
            users,
            reconciliation,
        }
    }

    /// Resolve the principal for `token`.
    ///
    /// Fails with `Unauthorized` for a bad, expired or non-access token and
    /// for a subject the store does not know. Store errors propagate as-is.
    pub async fn resolve(&self, token: &str) -> Result<User> {
        let claims = self
            .tokens
            .verify_access(token)
            .map_err(|e| Error::Unauthorized(e.to_string()))?;

        match self.cache.get(&claims.sub).await {
            Some(cached) => self.reconcile(cached, &claims).await,
            None => {
                tracing::debug!("Session cache miss for {}", claims.sub);
                let user = self.load(&claims.sub).await?;
                self.cache.put(&user).await;
                Ok(user)
            }
        }
    }

    /// Decide whether a cached user can be trusted for this request
    async fn reconcile(&self, cached: User, claims: &Claims) -> Result<User> {
        if self.reconciliation == RoleReconciliation::Claim && claims.roles == Some(cached.role) {
            tracing::debug!("Session cache hit for {}", cached.email);
            return Ok(cached);
        }

        let fresh = self.load(&cached.email).await?;
        if fresh.role != cached.role {
            tracing::info!(
                "Role of {} changed from {} to {}, refreshing session cache",
                fresh.email,
                cached.role,
                fresh.role
            );
        }
        if fresh != cached {
            self.cache.put(&fresh).await;
        }
        Ok(fresh)
    }

    async fn load(&self, email: &str) -> Result<User> {
        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| Error::Unauthorized(format!("unknown subject {}", email)))
    }
}
