//! Contacts owned by users

pub mod birthdays;
pub mod models;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::db::ContactStore;
use crate::error::{Error, Result};
use models::{Contact, ContactPatch, ContactSearch, NewContact};

const CONTACT_NOT_FOUND: &str = "Contact not found";
const NO_BIRTHDAYS: &str = "No upcoming birthdays found";

/// Contact operations for one owner at a time
#[derive(Clone)]
pub struct ContactService {
    store: Arc<dyn ContactStore>,
}

impl ContactService {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, user_id: i32, contact: NewContact) -> Result<Contact> {
        contact.validate()?;
        let created = self.store.create(user_id, contact).await?;
        tracing::info!("User {} created contact {}", user_id, created.id);
        Ok(created)
    }

    pub async fn list(&self, user_id: i32) -> Result<Vec<Contact>> {
        self.store.list(user_id).await
    }

    pub async fn get(&self, user_id: i32, id: i32) -> Result<Contact> {
        self.store.get(user_id, id).await?.ok_or_else(not_found)
    }

    pub async fn update(&self, user_id: i32, id: i32, patch: ContactPatch) -> Result<Contact> {
        patch.validate()?;
        self.store
            .update(user_id, id, patch)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, user_id: i32, id: i32) -> Result<Contact> {
        let removed = self.store.delete(user_id, id).await?.ok_or_else(not_found)?;
        tracing::info!("User {} deleted contact {}", user_id, id);
        Ok(removed)
    }

    /// Contacts matching every set filter; an empty result is `NotFound`
    pub async fn search(&self, user_id: i32, filter: &ContactSearch) -> Result<Vec<Contact>> {
        let found = self.store.search(user_id, &filter.normalized()).await?;
        if found.is_empty() {
            return Err(not_found());
        }
        Ok(found)
    }

    /// Contacts with a birthday in the coming week, counted from `today`
    pub async fn upcoming_birthdays(&self, user_id: i32, today: NaiveDate) -> Result<Vec<Contact>> {
        let contacts = self.store.list(user_id).await?;
        let upcoming = birthdays::upcoming(contacts, today);
        if upcoming.is_empty() {
            return Err(Error::NotFound(NO_BIRTHDAYS.to_string()));
        }
        Ok(upcoming)
    }
}

fn not_found() -> Error {
    Error::NotFound(CONTACT_NOT_FOUND.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> ContactService {
        ContactService::new(Arc::new(MemoryStore::new()))
    }

    fn new_contact(name: &str, birthday: NaiveDate) -> NewContact {
        NewContact {
            first_name: name.to_string(),
            last_name: "Doe".to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone_number: format!("555-{}", name.len()),
            birthday,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let svc = service();
        let created = svc.create(1, new_contact("Ann", date(1990, 5, 1))).await.unwrap();
        assert_eq!(created.user_id, 1);
        assert_eq!(svc.get(1, created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payload() {
        let svc = service();
        let mut bad = new_contact("Ann", date(1990, 5, 1));
        bad.email = "nope".into();
        assert!(matches!(svc.create(1, bad).await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_other_owner_sees_not_found() {
        let svc = service();
        let created = svc.create(1, new_contact("Ann", date(1990, 5, 1))).await.unwrap();

        assert!(matches!(svc.get(2, created.id).await, Err(Error::NotFound(_))));
        assert!(matches!(
            svc.update(2, created.id, ContactPatch::default()).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(svc.delete(2, created.id).await, Err(Error::NotFound(_))));
        assert!(svc.get(1, created.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let svc = service();
        let created = svc.create(1, new_contact("Ann", date(1990, 5, 1))).await.unwrap();

        let patch = ContactPatch {
            last_name: Some("Smith".into()),
            ..Default::default()
        };
        let updated = svc.update(1, created.id, patch).await.unwrap();
        assert_eq!(updated.last_name, "Smith");
        assert_eq!(updated.first_name, "Ann");

        svc.delete(1, created.id).await.unwrap();
        assert!(svc.list(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_empty_result_is_not_found() {
        let svc = service();
        svc.create(1, new_contact("Ann", date(1990, 5, 1))).await.unwrap();

        let hit = ContactSearch {
            first_name: Some("an".into()),
            ..Default::default()
        };
        assert_eq!(svc.search(1, &hit).await.unwrap().len(), 1);

        let miss = ContactSearch {
            first_name: Some("zed".into()),
            ..Default::default()
        };
        match svc.search(1, &miss).await {
            Err(Error::NotFound(msg)) => assert_eq!(msg, "Contact not found"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upcoming_birthdays() {
        let svc = service();
        let today = date(2024, 12, 28);
        svc.create(1, new_contact("Soon", date(1990, 1, 2))).await.unwrap();
        svc.create(1, new_contact("Later", date(1990, 2, 2))).await.unwrap();

        let upcoming = svc.upcoming_birthdays(1, today).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].first_name, "Soon");

        match svc.upcoming_birthdays(2, today).await {
            Err(Error::NotFound(msg)) => assert_eq!(msg, "No upcoming birthdays found"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
