//! `/contacts` handlers

use axum::{extract::State, http::StatusCode};
use chrono::Utc;

use super::extract::{Json, Path, Query};
use super::routes::ApiResponse;
use super::server::SharedState;
use crate::auth::CurrentUser;
use crate::contacts::models::{Contact, ContactPatch, ContactSearch, NewContact};
use crate::error::Result;

type ContactResponse = Json<ApiResponse<Contact>>;
type ContactListResponse = Json<ApiResponse<Vec<Contact>>>;

pub async fn create_contact(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<NewContact>,
) -> Result<(StatusCode, ContactResponse)> {
    let contact = state.contacts.create(user.id, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(contact))))
}

pub async fn list_contacts(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<ContactListResponse> {
    let contacts = state.contacts.list(user.id).await?;
    Ok(Json(ApiResponse::ok(contacts)))
}

pub async fn search_contacts(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<ContactSearch>,
) -> Result<ContactListResponse> {
    let contacts = state.contacts.search(user.id, &filter).await?;
    Ok(Json(ApiResponse::ok(contacts)))
}

pub async fn upcoming_birthdays(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
) -> Result<ContactListResponse> {
    let today = Utc::now().date_naive();
    let contacts = state.contacts.upcoming_birthdays(user.id, today).await?;
    Ok(Json(ApiResponse::ok(contacts)))
}

pub async fn get_contact(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<ContactResponse> {
    let contact = state.contacts.get(user.id, id).await?;
    Ok(Json(ApiResponse::ok(contact)))
}

pub async fn update_contact(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
    Json(patch): Json<ContactPatch>,
) -> Result<ContactResponse> {
    let contact = state.contacts.update(user.id, id, patch).await?;
    Ok(Json(ApiResponse::ok(contact)))
}

pub async fn delete_contact(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i32>,
) -> Result<ContactResponse> {
    let contact = state.contacts.delete(user.id, id).await?;
    Ok(Json(ApiResponse::ok(contact)))
}
