//! JWT token handling

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::models::Role;
use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Bearer credential for API requests
    Access,
    /// Email confirmation and password reset links
    Action,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user email)
    pub sub: String,
    /// Role at issue time, access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Role>,
    pub typ: TokenKind,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
}

impl Claims {
    fn new(subject: &str, role: Option<Role>, typ: TokenKind, ttl: Duration) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: subject.to_string(),
            roles: role,
            typ,
            iat: now,
            exp: now + ttl.num_seconds(),
        }
    }
}

fn positive_ttl(
    name: &str,
    value: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration> {
    if value <= 0 {
        return Err(Error::Config(format!("{} must be positive, got {}", name, value)));
    }
    to_duration(value).ok_or_else(|| Error::Config(format!("{} is out of range: {}", name, value)))
}

/// Issues and verifies HMAC-signed tokens with a process-wide secret
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    action_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, algorithm: &str) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Config("auth.secret_key must not be empty".to_string()));
        }

        let algorithm = Algorithm::from_str(algorithm)
            .map_err(|e| Error::Config(format!("Unknown token algorithm {}: {}", algorithm, e)))?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(Error::Config(format!(
                "Token algorithm {:?} needs a key pair; only HS256/HS384/HS512 are supported",
                algorithm
            )));
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl: Duration::hours(1),
            action_ttl: Duration::days(7),
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let mut service = Self::new(&config.secret_key, &config.algorithm)?;
        service.access_ttl = positive_ttl(
            "auth.access_token_ttl_secs",
            config.access_token_ttl_secs,
            Duration::try_seconds,
        )?;
        service.action_ttl = positive_ttl(
            "auth.action_token_ttl_days",
            config.action_token_ttl_days,
            Duration::try_days,
        )?;
        Ok(service)
    }

    /// Issue a bearer token carrying the subject and role
    pub fn issue_access_token(&self, subject: &str, role: Role) -> Result<String> {
        self.issue_access_token_with_ttl(subject, role, self.access_ttl)
    }

    pub fn issue_access_token_with_ttl(
        &self,
        subject: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String> {
        self.sign(&Claims::new(subject, Some(role), TokenKind::Access, ttl))
    }

    /// Issue a long-lived token for email confirmation or password reset
    pub fn issue_action_token(&self, subject: &str) -> Result<String> {
        self.issue_action_token_with_ttl(subject, self.action_ttl)
    }

    pub fn issue_action_token_with_ttl(&self, subject: &str, ttl: Duration) -> Result<String> {
        self.sign(&Claims::new(subject, None, TokenKind::Action, ttl))
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| Error::Config(format!("Failed to create token: {}", e)))
    }

    /// Validate signature, expiry and required claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::InvalidToken(e.to_string()))?;

        if claims.sub.is_empty() {
            return Err(Error::InvalidToken("empty subject".to_string()));
        }
        Ok(claims)
    }

    /// Verify a bearer token
    pub fn verify_access(&self, token: &str) -> Result<Claims> {
        self.verify_kind(token, TokenKind::Access)
    }

    /// Verify an email action token
    pub fn verify_action(&self, token: &str) -> Result<Claims> {
        self.verify_kind(token, TokenKind::Action)
    }

    fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<Claims> {
        let claims = self.verify(token)?;
        if claims.typ != kind {
            return Err(Error::InvalidToken(format!(
                "expected {:?} token, got {:?}",
                kind, claims.typ
            )));
        }
        Ok(claims)
    }
}
