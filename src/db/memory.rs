//! In-memory user and contact store

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ContactStore, UserStore};
use crate::auth::models::{NewUser, Role, User};
use crate::contacts::models::{Contact, ContactPatch, ContactSearch, NewContact};
use crate::error::{Error, Result};

#[derive(Default)]
struct State {
    users: BTreeMap<i32, User>,
    contacts: BTreeMap<i32, Contact>,
    next_user_id: i32,
    next_contact_id: i32,
}

impl State {
    fn modify_user(&mut self, email: &str, change: impl FnOnce(&mut User)) -> Result<User> {
        let user = self
            .users
            .values_mut()
            .find(|u| u.email == email)
            .ok_or_else(|| Error::NotFound(format!("User {} not found", email)))?;
        change(user);
        Ok(user.clone())
    }

    fn check_contact_unique(&self, candidate: &Contact) -> Result<()> {
        let clash = self.contacts.values().find(|c| {
            c.user_id == candidate.user_id
                && c.id != candidate.id
                && (c.email == candidate.email || c.phone_number == candidate.phone_number)
        });

        match clash {
            Some(existing) if existing.email == candidate.email => Err(Error::Conflict(
                "Contact with this email already exists".to_string(),
            )),
            Some(_) => Err(Error::Conflict(
                "Contact with this phone number already exists".to_string(),
            )),
            None => Ok(()),
        }
    }
}

/// Store backed by ordered maps; used by tests and `serve --memory`
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(Error::Conflict("Account already exists".to_string()));
        }

        state.next_user_id += 1;
        let user = User {
            id: state.next_user_id,
            email: user.email,
            password: user.password,
            first_name: user.first_name,
            last_name: user.last_name,
            confirmed: false,
            avatar: None,
            role: user.role,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn confirm(&self, email: &str) -> Result<User> {
        let mut state = self.state.write().await;
        state.modify_user(email, |u| u.confirmed = true)
    }

    async fn set_password(&self, email: &str, digest: &str) -> Result<User> {
        let mut state = self.state.write().await;
        state.modify_user(email, |u| u.password = digest.to_string())
    }

    async fn set_avatar(&self, email: &str, url: &str) -> Result<User> {
        let mut state = self.state.write().await;
        state.modify_user(email, |u| u.avatar = Some(url.to_string()))
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<User> {
        let mut state = self.state.write().await;
        state.modify_user(email, |u| u.role = role)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn create(&self, user_id: i32, contact: NewContact) -> Result<Contact> {
        let mut state = self.state.write().await;
        let contact = Contact {
            id: state.next_contact_id + 1,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            phone_number: contact.phone_number,
            birthday: contact.birthday,
            user_id,
        };
        state.check_contact_unique(&contact)?;

        state.next_contact_id = contact.id;
        state.contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn list(&self, user_id: i32) -> Result<Vec<Contact>> {
        let state = self.state.read().await;
        Ok(state
            .contacts
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get(&self, user_id: i32, id: i32) -> Result<Option<Contact>> {
        let state = self.state.read().await;
        Ok(state
            .contacts
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .cloned())
    }

    async fn update(&self, user_id: i32, id: i32, patch: ContactPatch) -> Result<Option<Contact>> {
        let mut state = self.state.write().await;
        let Some(mut updated) = state
            .contacts
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .cloned()
        else {
            return Ok(None);
        };

        patch.apply(&mut updated);
        state.check_contact_unique(&updated)?;
        state.contacts.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, user_id: i32, id: i32) -> Result<Option<Contact>> {
        let mut state = self.state.write().await;
        let owned = state.contacts.get(&id).is_some_and(|c| c.user_id == user_id);
        if !owned {
            return Ok(None);
        }
        Ok(state.contacts.remove(&id))
    }

    async fn search(&self, user_id: i32, filter: &ContactSearch) -> Result<Vec<Contact>> {
        let state = self.state.read().await;
        Ok(state
            .contacts
            .values()
            .filter(|c| c.user_id == user_id && filter.matches(c))
            .cloned()
            .collect())
    }
}
