//! Contact models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::models::validate_email;
use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 50;
const MAX_EMAIL_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 20;

/// A contact owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birthday: NaiveDate,
    pub user_id: i32,
}

/// Payload for creating a contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birthday: NaiveDate,
}

impl NewContact {
    pub fn validate(&self) -> Result<()> {
        check_len("first_name", &self.first_name, MAX_NAME_LEN)?;
        check_len("last_name", &self.last_name, MAX_NAME_LEN)?;
        check_len("email", &self.email, MAX_EMAIL_LEN)?;
        check_len("phone_number", &self.phone_number, MAX_PHONE_LEN)?;
        validate_email(&self.email)
    }
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub birthday: Option<NaiveDate>,
}

impl ContactPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(first_name) = &self.first_name {
            check_len("first_name", first_name, MAX_NAME_LEN)?;
        }
        if let Some(last_name) = &self.last_name {
            check_len("last_name", last_name, MAX_NAME_LEN)?;
        }
        if let Some(email) = &self.email {
            check_len("email", email, MAX_EMAIL_LEN)?;
            validate_email(email)?;
        }
        if let Some(phone) = &self.phone_number {
            check_len("phone_number", phone, MAX_PHONE_LEN)?;
        }
        Ok(())
    }

    /// Apply the set fields onto `contact`
    pub fn apply(self, contact: &mut Contact) {
        if let Some(first_name) = self.first_name {
            contact.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            contact.last_name = last_name;
        }
        if let Some(email) = self.email {
            contact.email = email;
        }
        if let Some(phone) = self.phone_number {
            contact.phone_number = phone;
        }
        if let Some(birthday) = self.birthday {
            contact.birthday = birthday;
        }
    }
}

/// Search filters, each a case-insensitive substring; set filters are ANDed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSearch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl ContactSearch {
    /// Filters with empty strings dropped
    pub fn normalized(&self) -> ContactSearch {
        let clean = |v: &Option<String>| v.as_ref().filter(|s| !s.is_empty()).cloned();
        ContactSearch {
            first_name: clean(&self.first_name),
            last_name: clean(&self.last_name),
            email: clean(&self.email),
        }
    }

    pub fn matches(&self, contact: &Contact) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            match needle {
                Some(n) if !n.is_empty() => haystack.to_lowercase().contains(&n.to_lowercase()),
                _ => true,
            }
        }

        contains(&contact.first_name, &self.first_name)
            && contains(&contact.last_name, &self.last_name)
            && contains(&contact.email, &self.email)
    }
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)));
    }
    if value.chars().count() > max {
        return Err(Error::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}
