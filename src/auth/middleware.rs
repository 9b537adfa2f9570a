//! Authentication extractors

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

use crate::api::SharedState;
use crate::auth::models::User;
use crate::error::{Error, Result};

/// Pull the token out of an `Authorization: Bearer <token>` header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| Error::Unauthorized("missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| Error::Unauthorized("Authorization header is not ASCII".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| Error::Unauthorized("malformed Authorization header".to_string()))?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(Error::Unauthorized(format!(
            "unsupported authorization scheme {}",
            scheme
        )));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(Error::Unauthorized("empty bearer token".to_string()));
    }
    Ok(token)
}

/// The authenticated principal of a request
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self> {
        let token = extract_bearer_token(&parts.headers)?;
        let user = state.authenticator.resolve(token).await?;
        Ok(CurrentUser(user))
    }
}
