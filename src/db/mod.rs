//! Persistence for users and contacts

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::auth::models::{NewUser, Role, User};
use crate::contacts::models::{Contact, ContactPatch, ContactSearch, NewContact};
use crate::error::Result;

/// Source of truth for user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Create a user; an existing email is a `Conflict`
    async fn insert(&self, user: NewUser) -> Result<User>;

    // Each write below touches a single column and returns the fresh row.
    // An unknown email is `NotFound`.

    async fn confirm(&self, email: &str) -> Result<User>;

    async fn set_password(&self, email: &str, digest: &str) -> Result<User>;

    async fn set_avatar(&self, email: &str, url: &str) -> Result<User>;

    async fn set_role(&self, email: &str, role: Role) -> Result<User>;

    /// Cheap round-trip used by the health check
    async fn ping(&self) -> Result<()>;
}

/// Contacts, always scoped to their owner.
///
/// A contact owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// A duplicate (owner, email) or (owner, phone) is a `Conflict`
    async fn create(&self, user_id: i32, contact: NewContact) -> Result<Contact>;

    async fn list(&self, user_id: i32) -> Result<Vec<Contact>>;

    async fn get(&self, user_id: i32, id: i32) -> Result<Option<Contact>>;

    async fn update(&self, user_id: i32, id: i32, patch: ContactPatch) -> Result<Option<Contact>>;

    async fn delete(&self, user_id: i32, id: i32) -> Result<Option<Contact>>;

    async fn search(&self, user_id: i32, filter: &ContactSearch) -> Result<Vec<Contact>>;
}
