//! PostgreSQL user and contact store

use std::sync::Arc;

use async_trait::async_trait;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};

use super::{ContactStore, UserStore};
use crate::auth::models::{NewUser, Role, User};
use crate::config::DatabaseConfig;
use crate::contacts::models::{Contact, ContactPatch, ContactSearch, NewContact};
use crate::error::{Error, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    first_name TEXT,
    last_name TEXT,
    confirmed BOOLEAN NOT NULL DEFAULT FALSE,
    avatar TEXT,
    roles TEXT NOT NULL DEFAULT 'user' CHECK (roles IN ('admin', 'user'))
);

CREATE TABLE IF NOT EXISTS contacts (
    id SERIAL PRIMARY KEY,
    first_name VARCHAR(50) NOT NULL,
    last_name VARCHAR(50) NOT NULL,
    email VARCHAR(100) NOT NULL,
    phone_number VARCHAR(20) NOT NULL,
    birthday DATE NOT NULL,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    CONSTRAINT unique_user_email UNIQUE (user_id, email),
    CONSTRAINT unique_user_phone UNIQUE (user_id, phone_number)
);

CREATE INDEX IF NOT EXISTS contacts_user_id_idx ON contacts (user_id);
"#;

const USER_COLUMNS: &str = "id, email, password, first_name, last_name, confirmed, avatar, roles";
const CONTACT_COLUMNS: &str = "id, first_name, last_name, email, phone_number, birthday, user_id";

/// Store on a single multiplexed tokio-postgres connection
#[derive(Clone)]
pub struct PgStore {
    client: Arc<Client>,
}

impl PgStore {
    /// Connect and spawn the connection driver
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let (client, connection) =
            tokio_postgres::connect(&config.connection_string(), NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        tracing::info!(
            "Connected to PostgreSQL at {}:{}/{}",
            config.host,
            config.port,
            config.dbname
        );
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Create tables and constraints if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        self.client.batch_execute(SCHEMA).await?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    /// `UPDATE users SET <assignment> WHERE email = $1`, with `params` bound from `$2`
    async fn update_column(
        &self,
        email: &str,
        assignment: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<User> {
        let query = format!(
            "UPDATE users SET {} WHERE email = $1 RETURNING {}",
            assignment, USER_COLUMNS
        );
        let mut bound: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(params.len() + 1);
        bound.push(&email);
        bound.extend_from_slice(params);

        let row = self.client.query_opt(&query, &bound).await?;
        match row {
            Some(row) => user_from_row(&row),
            None => Err(Error::NotFound(format!("User {} not found", email))),
        }
    }
}

fn user_from_row(row: &Row) -> Result<User> {
    let role: String = row.try_get("roles")?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        confirmed: row.try_get("confirmed")?,
        avatar: row.try_get("avatar")?,
        role: role.parse()?,
    })
}

fn contact_from_row(row: &Row) -> Result<Contact> {
    Ok(Contact {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone_number: row.try_get("phone_number")?,
        birthday: row.try_get("birthday")?,
        user_id: row.try_get("user_id")?,
    })
}

/// Turn unique-constraint violations into `Conflict`
fn conflict_or(e: tokio_postgres::Error) -> Error {
    if e.code() != Some(&SqlState::UNIQUE_VIOLATION) {
        return Error::Database(e);
    }

    let constraint = e
        .as_db_error()
        .and_then(|db| db.constraint())
        .unwrap_or_default();
    let message = match constraint {
        "unique_user_email" => "Contact with this email already exists",
        "unique_user_phone" => "Contact with this phone number already exists",
        "users_email_key" => "Account already exists",
        _ => "Record already exists",
    };
    Error::Conflict(message.to_string())
}

/// `%term%` for ILIKE with the wildcard characters in `term` escaped
fn like_pattern(term: &Option<String>) -> Option<String> {
    term.as_ref().map(|t| {
        let escaped = t
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        let row = self.client.query_opt(&query, &[&email]).await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert(&self, user: NewUser) -> Result<User> {
        let query = format!(
            "INSERT INTO users (email, password, first_name, last_name, roles) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        let row = self
            .client
            .query_one(
                &query,
                &[
                    &user.email,
                    &user.password,
                    &user.first_name,
                    &user.last_name,
                    &user.role.as_str(),
                ],
            )
            .await
            .map_err(conflict_or)?;
        user_from_row(&row)
    }

    async fn confirm(&self, email: &str) -> Result<User> {
        self.update_column(email, "confirmed = TRUE", &[]).await
    }

    async fn set_password(&self, email: &str, digest: &str) -> Result<User> {
        self.update_column(email, "password = $2", &[&digest]).await
    }

    async fn set_avatar(&self, email: &str, url: &str) -> Result<User> {
        self.update_column(email, "avatar = $2", &[&url]).await
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<User> {
        self.update_column(email, "roles = $2", &[&role.as_str()]).await
    }

    async fn ping(&self) -> Result<()> {
        let row = self.client.query_one("SELECT 1 + 1", &[]).await?;
        let two: i32 = row.try_get(0)?;
        if two != 2 {
            return Err(Error::ServiceUnavailable("Database is unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ContactStore for PgStore {
    async fn create(&self, user_id: i32, contact: NewContact) -> Result<Contact> {
        let query = format!(
            "INSERT INTO contacts (first_name, last_name, email, phone_number, birthday, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            CONTACT_COLUMNS
        );
        let row = self
            .client
            .query_one(
                &query,
                &[
                    &contact.first_name,
                    &contact.last_name,
                    &contact.email,
                    &contact.phone_number,
                    &contact.birthday,
                    &user_id,
                ],
            )
            .await
            .map_err(conflict_or)?;
        contact_from_row(&row)
    }

    async fn list(&self, user_id: i32) -> Result<Vec<Contact>> {
        let query = format!(
            "SELECT {} FROM contacts WHERE user_id = $1 ORDER BY id",
            CONTACT_COLUMNS
        );
        let rows = self.client.query(&query, &[&user_id]).await?;
        rows.iter().map(contact_from_row).collect()
    }

    async fn get(&self, user_id: i32, id: i32) -> Result<Option<Contact>> {
        let query = format!(
            "SELECT {} FROM contacts WHERE id = $1 AND user_id = $2",
            CONTACT_COLUMNS
        );
        let row = self.client.query_opt(&query, &[&id, &user_id]).await?;
        row.as_ref().map(contact_from_row).transpose()
    }

    async fn update(&self, user_id: i32, id: i32, patch: ContactPatch) -> Result<Option<Contact>> {
        let query = format!(
            "UPDATE contacts SET \
                first_name = COALESCE($3, first_name), \
                last_name = COALESCE($4, last_name), \
                email = COALESCE($5, email), \
                phone_number = COALESCE($6, phone_number), \
                birthday = COALESCE($7, birthday) \
             WHERE id = $1 AND user_id = $2 RETURNING {}",
            CONTACT_COLUMNS
        );
        let row = self
            .client
            .query_opt(
                &query,
                &[
                    &id,
                    &user_id,
                    &patch.first_name,
                    &patch.last_name,
                    &patch.email,
                    &patch.phone_number,
                    &patch.birthday,
                ],
            )
            .await
            .map_err(conflict_or)?;
        row.as_ref().map(contact_from_row).transpose()
    }

    async fn delete(&self, user_id: i32, id: i32) -> Result<Option<Contact>> {
        let query = format!(
            "DELETE FROM contacts WHERE id = $1 AND user_id = $2 RETURNING {}",
            CONTACT_COLUMNS
        );
        let row = self.client.query_opt(&query, &[&id, &user_id]).await?;
        row.as_ref().map(contact_from_row).transpose()
    }

    async fn search(&self, user_id: i32, filter: &ContactSearch) -> Result<Vec<Contact>> {
        let filter = filter.normalized();
        let first_name = like_pattern(&filter.first_name);
        let last_name = like_pattern(&filter.last_name);
        let email = like_pattern(&filter.email);

        let query = format!(
            "SELECT {} FROM contacts WHERE user_id = $1 \
               AND ($2::TEXT IS NULL OR first_name ILIKE $2) \
               AND ($3::TEXT IS NULL OR last_name ILIKE $3) \
               AND ($4::TEXT IS NULL OR email ILIKE $4) \
             ORDER BY id",
            CONTACT_COLUMNS
        );
        let rows = self
            .client
            .query(&query, &[&user_id, &first_name, &last_name, &email])
            .await?;
        rows.iter().map(contact_from_row).collect()
    }
}
