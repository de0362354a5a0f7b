//! User management endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use segments_control::{SegmentsApi, User, UserId};
use segments_core::CoreError;

use crate::error::ApiError;
use crate::state::GatewayState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to create a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Response for a single user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Generated user id.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a new user.
///
/// # Errors
///
/// Returns an error if the name violates the naming policy or the store fails.
pub async fn create_user<C>(
    State(state): State<Arc<GatewayState<C>>>,
    body: Result<Json<CreateUserBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: SegmentsApi + 'static,
{
    let Json(body) = body?;
    state.policy.validate_name("name", &body.name)?;

    let user = state.control.create_user(&body.name).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Get a single user by id.
///
/// # Errors
///
/// Returns an error if the id is malformed or the user is not found.
pub async fn get_user<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: SegmentsApi + 'static,
{
    let user_id = parse_user_id(&user_id)?;
    let user = state.control.get_user(user_id).await?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete a user.
///
/// # Errors
///
/// Returns an error if the id is malformed or the user is not found.
pub async fn delete_user<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: SegmentsApi + 'static,
{
    let user_id = parse_user_id(&user_id)?;
    state.control.get_user(user_id).await?;
    state.control.delete_user(user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Parse a user id path segment.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` if the segment is not an integer.
pub fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse::<UserId>()
        .map_err(|e| CoreError::from(e).into())
}
