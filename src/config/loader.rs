//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;

pub const CONFIG_FILENAME: &str = "contacts.toml";

/// Load configuration from contacts.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::ConfigNotFound,
        _ => Error::Io(e),
    })?;
    let content = interpolate_env_vars(&content);
    let config: Config = toml::from_str(&content)?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write a configuration file
pub fn save_config(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        return Err(Error::Config(format!(
            "{} already exists",
            path.display()
        )));
    }
    fs::write(path, content)?;
    Ok(())
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# Contacts API configuration

[server]
host = "0.0.0.0"
port = 8000
public_url = "${PUBLIC_URL:-http://localhost:8000/}"

[database]
host = "${POSTGRES_HOST:-localhost}"
port = 5432
user = "${POSTGRES_USER:-postgres}"
password = "${POSTGRES_PASSWORD:-postgres}"
dbname = "${POSTGRES_DB:-contacts}"

[cache]
url = "${REDIS_URL:-redis://localhost:6379/0}"
ttl_secs = 900

[auth]
secret_key = "${SECRET_KEY}"
algorithm = "HS256"
access_token_ttl_secs = 3600
action_token_ttl_days = 7
# "store" re-reads the user on every cache hit, "claim" trusts a cache hit
# whose role matches the token
role_reconciliation = "store"

[mail]
from = "${MAIL_FROM:-noreply@contacts.localhost}"
from_name = "Contacts API"
# Leave the server unset to only log outgoing mail
# server = "${MAIL_SERVER}"
port = 587
# username = "${MAIL_USERNAME}"
# password = "${MAIL_PASSWORD}"
starttls = true
ssl_tls = false

# Avatar uploads (optional)
# [cloudinary]
# cloud_name = "${CLOUDINARY_NAME}"
# api_key = "${CLOUDINARY_API_KEY}"
# api_secret = "${CLOUDINARY_API_SECRET}"

[rate_limit]
max_requests = 5
window_secs = 60
"#
}
