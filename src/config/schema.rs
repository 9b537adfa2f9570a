//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub mail: MailConfig,

    #[serde(default)]
    pub cloudinary: Option<CloudinaryConfig>,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Server configuration for the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL put into confirmation and reset links
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_public_url() -> String {
    "http://localhost:8000/".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
        }
    }
}

/// PostgreSQL connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default = "default_db_password")]
    pub password: String,

    #[serde(default = "default_db_name")]
    pub dbname: String,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "postgres".to_string()
}

fn default_db_name() -> String {
    "contacts".to_string()
}

impl DatabaseConfig {
    /// libpq-style connection string for tokio-postgres
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.dbname
        )
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: default_db_password(),
            dbname: default_db_name(),
        }
    }
}

/// Session cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Lifetime of a cached user snapshot, in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_redis_url() -> String {
    "redis://localhost:6379/0".to_string()
}

fn default_cache_ttl() -> u64 {
    900
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

/// How the authenticator treats a cached user whose role may be stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleReconciliation {
    /// Always re-read the user store on a cache hit
    #[default]
    Store,
    /// Trust the cached record when its role matches the token's claim
    Claim,
}

/// Token signing and password hashing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_secret")]
    pub secret_key: String,

    /// HS256, HS384 or HS512
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: i64,

    #[serde(default = "default_action_ttl")]
    pub action_token_ttl_days: i64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    #[serde(default)]
    pub role_reconciliation: RoleReconciliation,
}

const DEFAULT_SECRET: &str = "contacts-secret-key-change-in-production";

fn default_secret() -> String {
    DEFAULT_SECRET.to_string()
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_ttl() -> i64 {
    3600
}

fn default_action_ttl() -> i64 {
    7
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl AuthConfig {
    /// True while tokens are signed with the published built-in key
    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: default_secret(),
            algorithm: default_algorithm(),
            access_token_ttl_secs: default_access_ttl(),
            action_token_ttl_days: default_action_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
            role_reconciliation: RoleReconciliation::default(),
        }
    }
}

/// Outgoing mail settings
///
/// Without a `server`, messages are only written to the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_mail_from")]
    pub from: String,

    #[serde(default = "default_mail_from_name")]
    pub from_name: String,

    /// SMTP relay host
    #[serde(default)]
    pub server: Option<String>,

    #[serde(default = "default_mail_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Upgrade a plain connection with STARTTLS
    #[serde(default = "default_starttls")]
    pub starttls: bool,

    /// Connect over TLS from the start (SMTPS); wins over `starttls`
    #[serde(default)]
    pub ssl_tls: bool,
}

fn default_mail_from() -> String {
    "noreply@contacts.localhost".to_string()
}

fn default_mail_from_name() -> String {
    "Contacts API".to_string()
}

fn default_mail_port() -> u16 {
    587
}

fn default_starttls() -> bool {
    true
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: default_mail_from(),
            from_name: default_mail_from_name(),
            server: None,
            port: default_mail_port(),
            username: None,
            password: None,
            starttls: default_starttls(),
            ssl_tls: false,
        }
    }
}

/// Cloudinary credentials for avatar uploads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// Per-client request limit on rate limited routes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_requests() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    60
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}
