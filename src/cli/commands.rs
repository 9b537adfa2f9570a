//! CLI command implementations

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::auth::Role;
use crate::cache::{CacheStore, RedisCacheStore};
use crate::cli::{check, error, info, success, warn};
use crate::config::{self, Config};
use crate::db::{PgStore, UserStore};

/// Write a default contacts.toml
pub async fn init(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(config::loader::CONFIG_FILENAME));

    if path.exists() {
        warn(&format!("{} already exists", path.display()));
        return Ok(());
    }

    config::save_config(&path, config::loader::default_config_content())?;

    success(&format!("Created {}", path.display()));
    info("Set SECRET_KEY and the database credentials, then run 'contacts-api migrate'");

    Ok(())
}

/// Create tables and constraints
pub async fn migrate(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = PgStore::connect(&config.database).await?;
    store.migrate().await?;
    success("Database schema is up to date");
    Ok(())
}

/// Start the HTTP API server
pub async fn serve(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    memory: bool,
) -> Result<()> {
    let config = if memory && config_path.is_none() {
        defaults_if_missing(config::load_config())?
    } else {
        load_config(config_path)?
    };

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting server at http://{}:{}", host, port));

    crate::api::run_server(config, &host, port, memory).await?;
    Ok(())
}

/// Set the role of an existing user
pub async fn promote(config_path: Option<&Path>, email: &str, role: Role) -> Result<()> {
    let config = load_config(config_path)?;
    let store = PgStore::connect(&config.database).await?;

    let Some(user) = store.find_by_email(email).await? else {
        error(&format!("No user with email {}", email));
        anyhow::bail!("unknown user {}", email);
    };

    if user.role == role {
        info(&format!("{} already has role {}", email, role));
        return Ok(());
    }

    store.set_role(email, role).await?;

    // Drop the cached snapshot so the new role applies on the next request
    match RedisCacheStore::connect(&config.cache.url).await {
        Ok(cache) => {
            if let Err(e) = cache.delete(&crate::auth::SessionCache::key(email)).await {
                warn(&format!("Could not evict session cache entry: {}", e));
            }
        }
        Err(e) => warn(&format!("Could not reach the session cache: {}", e)),
    }

    success(&format!("{} now has role {}", email, role));
    Ok(())
}

/// Check that the configured backends are reachable
pub async fn doctor(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("Backends:");

    let database = match PgStore::connect(&config.database).await {
        Ok(store) => store
            .ping()
            .await
            .map(|_| format!("{}:{}/{}", config.database.host, config.database.port, config.database.dbname))
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    check("postgres", &database);

    let cache = match RedisCacheStore::connect(&config.cache.url).await {
        Ok(store) => store
            .get("contacts-api:doctor")
            .await
            .map(|_| config.cache.url.clone())
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    check("redis", &cache);

    let uploads = match &config.cloudinary {
        Some(c) => Ok(format!("cloud {}", c.cloud_name)),
        None => Err("not configured, avatar uploads disabled".to_string()),
    };
    check("cloudinary", &uploads);

    if database.is_err() || cache.is_err() {
        anyhow::bail!("some backends are unreachable");
    }
    Ok(())
}

// Helper functions

/// `serve --memory` runs without a config file, but never past a broken one
fn defaults_if_missing(loaded: crate::error::Result<Config>) -> Result<Config> {
    match loaded {
        Ok(config) => Ok(config),
        Err(crate::Error::ConfigNotFound) => {
            warn("No contacts.toml found, using built-in defaults");
            Ok(Config::default())
        }
        Err(e) => Err(anyhow::anyhow!("{}", e)),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let loaded = match path {
        Some(path) => config::load_config_from_path(path),
        None => config::load_config(),
    };
    loaded.map_err(|e| anyhow::anyhow!("{}", e))
}
