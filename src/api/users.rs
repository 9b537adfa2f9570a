//! `/user` handlers

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};

use super::extract::Json;
use super::routes::ApiResponse;
use super::server::SharedState;
use crate::auth::models::UserInfo;
use crate::auth::{CurrentUser, RoleGate};
use crate::error::{Error, Result};

const AVATAR_FIELD: &str = "file";

/// Replace the caller's avatar with the uploaded `file` field. Admins only.
pub async fn update_avatar(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<UserInfo>>> {
    RoleGate::admin_only().check(&user)?;
    let mut multipart = multipart?;

    let mut image = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(e.body_text()))?
    {
        if field.name() == Some(AVATAR_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::BadRequest(e.body_text()))?;
            image = Some(bytes.to_vec());
            break;
        }
    }
    let image = image.ok_or_else(|| {
        Error::Validation(format!("Missing multipart field '{}'", AVATAR_FIELD))
    })?;

    let updated = state.accounts.update_avatar(&user, image).await?;
    Ok(Json(ApiResponse::ok(updated.into())))
}
