//! Response envelope and service-level handlers

use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use super::server::SharedState;
use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

pub async fn root() -> impl IntoResponse {
    Json(ApiResponse::ok("Welcome to the contacts API"))
}

pub async fn health(State(state): State<SharedState>) -> Result<Json<ApiResponse<&'static str>>> {
    state.users.ping().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        Error::ServiceUnavailable("Database is not reachable".to_string())
    })?;
    Ok(Json(ApiResponse::ok("healthy")))
}
