//! `/auth` handlers

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
};

use super::extract::{Json, Path};
use super::routes::ApiResponse;
use super::server::SharedState;
use crate::accounts::MessageResponse;
use crate::auth::extract_bearer_token;
use crate::auth::models::{
    LoginRequest, MeResponse, RequestResetPassword, ResetPassword, SignupRequest, TokenResponse,
    UserInfo,
};
use crate::error::{Error, Result};

pub async fn signup(
    State(state): State<SharedState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>)> {
    let user = state.accounts.signup(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user.into()))))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenResponse>>)> {
    let token = state.accounts.login(req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(token))))
}

pub async fn confirmed_email(
    State(state): State<SharedState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>> {
    let message = state.accounts.confirm_email(&token).await?;
    Ok(Json(ApiResponse::ok(message)))
}

/// Rate limited per client address; refused requests never reach the
/// authenticator
pub async fn me(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<MeResponse>>> {
    if !state.limiter.check(addr.ip()).await {
        return Err(Error::RateLimited);
    }

    let token = extract_bearer_token(&headers)?;
    let user = state.authenticator.resolve(token).await?;
    Ok(Json(ApiResponse::ok(state.accounts.me(&user))))
}

pub async fn request_reset_password(
    State(state): State<SharedState>,
    Json(req): Json<RequestResetPassword>,
) -> Result<Json<ApiResponse<MessageResponse>>> {
    let message = state.accounts.request_password_reset(&req.email).await?;
    Ok(Json(ApiResponse::ok(message)))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Path(token): Path<String>,
    Json(req): Json<ResetPassword>,
) -> Result<Json<ApiResponse<MessageResponse>>> {
    let message = state.accounts.reset_password(&token, req).await?;
    Ok(Json(ApiResponse::ok(message)))
}
