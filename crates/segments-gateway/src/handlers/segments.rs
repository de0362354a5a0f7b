//! Segment management endpoints.
//!
//! Creating a segment can also enroll a random share of all existing users,
//! when the request carries a `percent`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use segments_control::auto_assign::WRONG_PERCENT;
use segments_control::{Segment, SegmentName, SegmentsApi, UserId};

use crate::error::ApiError;
use crate::state::GatewayState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Request to create a segment.
#[derive(Debug, Deserialize)]
pub struct CreateSegmentBody {
    /// Segment name; canonicalized before use.
    #[serde(default)]
    pub name: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Share of all users, in percent, to enroll right away.
    #[serde(default)]
    pub percent: Option<f64>,
}

/// Response for a single segment.
#[derive(Debug, Serialize)]
pub struct SegmentResponse {
    /// Canonical name.
    pub name: SegmentName,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Users enrolled when the segment was created with a `percent`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_ids: Option<Vec<UserId>>,
}

impl From<Segment> for SegmentResponse {
    fn from(segment: Segment) -> Self {
        Self {
            name: segment.name,
            description: segment.description,
            created_at: segment.created_at,
            updated_at: segment.updated_at,
            assigned_user_ids: None,
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a new segment, optionally enrolling a random share of all users.
///
/// # Errors
///
/// Returns an error if:
/// - The name or description violates the naming policy
/// - The percent is above 100 or not a number
/// - A segment with the same canonical name exists
/// - The control plane operation fails
pub async fn create_segment<C>(
    State(state): State<Arc<GatewayState<C>>>,
    body: Result<Json<CreateSegmentBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: SegmentsApi + 'static,
{
    let Json(body) = body?;
    state.policy.validate_name("name", &body.name)?;
    if let Some(description) = &body.description {
        state.policy.validate_description(description)?;
    }
    // An invalid percent must not create the segment.
    if let Some(percent) = body.percent {
        if percent.is_nan() || percent > 100.0 {
            return Err(ApiError::BadRequest(WRONG_PERCENT.to_string()));
        }
    }

    let name = SegmentName::new(&body.name);
    let segment = state
        .control
        .create_segment(&name, body.description.as_deref())
        .await?;

    let mut response = SegmentResponse::from(segment);
    if let Some(percent) = body.percent {
        let enrollment = state.control.enroll_random_percent(&name, percent).await?;
        response.assigned_user_ids = Some(enrollment.assigned);
    }

    Ok((StatusCode::CREATED, Json(response)))
}

/// Get a single segment by name.
///
/// # Errors
///
/// Returns an error if the segment is not found.
pub async fn get_segment<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: SegmentsApi + 'static,
{
    let segment = state.control.get_segment(&SegmentName::new(name)).await?;

    Ok(Json(SegmentResponse::from(segment)))
}

/// Delete a segment.
///
/// # Errors
///
/// Returns an error if the segment is not found.
pub async fn delete_segment<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    C: SegmentsApi + 'static,
{
    state.control.delete_segment(&SegmentName::new(name)).await?;

    Ok(StatusCode::NO_CONTENT)
}
