//! Membership endpoints: active segments, reassignment, TTL and history.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use segments_control::{Membership, Reassignment, SegmentName, SegmentsApi, UserId};

use crate::error::ApiError;
use crate::handlers::users::parse_user_id;
use crate::report;
use crate::state::GatewayState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Response listing a user's active segments.
#[derive(Debug, Serialize)]
pub struct ActiveSegmentsResponse {
    /// The user.
    pub user_id: UserId,
    /// Active segment names, in insertion order.
    pub segments: Vec<SegmentName>,
}

/// Response for a single membership.
#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    /// The member.
    pub user_id: UserId,
    /// The segment.
    pub segment_name: SegmentName,
    /// When the membership was first inserted.
    pub created_at: DateTime<Utc>,
    /// When the membership was last assigned.
    pub updated_at: DateTime<Utc>,
    /// When the membership stops being active.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
}

impl From<Membership> for MembershipResponse {
    fn from(membership: Membership) -> Self {
        Self {
            user_id: membership.user_id,
            segment_name: membership.segment_name,
            created_at: membership.created_at,
            updated_at: membership.updated_at,
            expire_at: membership.expire_at,
        }
    }
}

/// Response for a batch reassignment.
#[derive(Debug, Serialize)]
pub struct ReassignResponse {
    /// Memberships written by the additions, in request order.
    pub memberships: Vec<MembershipResponse>,
}

/// Request to assign a segment for a limited time.
#[derive(Debug, Deserialize)]
pub struct TtlBody {
    /// The segment; canonicalized before use.
    pub segment_name: SegmentName,
    /// Lifetime in hours.
    pub ttl: i64,
}

/// History report window; both bounds are exclusive.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Start of the window (RFC 3339).
    pub from: DateTime<Utc>,
    /// End of the window (RFC 3339).
    pub to: DateTime<Utc>,
}

// =============================================================================
// Handlers
// =============================================================================

/// List the user's active segments.
///
/// Responds `204 No Content` when the user has none.
///
/// # Errors
///
/// Returns an error if the user is not found.
pub async fn active_segments<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError>
where
    C: SegmentsApi + 'static,
{
    let user_id = parse_user_id(&user_id)?;
    state.control.get_user(user_id).await?;

    let segments = state.control.active_segments_for_user(user_id).await?;
    if segments.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    Ok(Json(ActiveSegmentsResponse { user_id, segments }).into_response())
}

/// Remove and add segments in one request.
///
/// The user and every named segment must exist before anything is changed.
///
/// # Errors
///
/// Returns an error if the user or a segment is not found, or a removal
/// names a segment the user is not a member of.
pub async fn reassign<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(user_id): Path<String>,
    body: Result<Json<Reassignment>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: SegmentsApi + 'static,
{
    let user_id = parse_user_id(&user_id)?;
    let Json(reassignment) = body?;

    state.control.get_user(user_id).await?;
    for segment in reassignment.to_delete.iter().chain(&reassignment.to_add) {
        state.control.get_segment(segment).await?;
    }

    let memberships = state
        .control
        .batch_reassign(user_id, &reassignment)
        .await?;

    Ok(Json(ReassignResponse {
        memberships: memberships
            .into_iter()
            .map(MembershipResponse::from)
            .collect(),
    }))
}

/// Assign a segment for `ttl` hours.
///
/// # Errors
///
/// Returns an error if the user or segment is not found or `ttl` is not positive.
pub async fn assign_with_ttl<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(user_id): Path<String>,
    body: Result<Json<TtlBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: SegmentsApi + 'static,
{
    let user_id = parse_user_id(&user_id)?;
    let Json(body) = body?;

    state.control.get_user(user_id).await?;
    state.control.get_segment(&body.segment_name).await?;

    let membership = state
        .control
        .assign_with_ttl(user_id, &body.segment_name, body.ttl)
        .await?;

    Ok(Json(MembershipResponse::from(membership)))
}

/// Download the user's membership history as CSV.
///
/// # Example
///
/// ```text
/// GET /v1/users/7/history?from=2023-08-01T00:00:00Z&to=2023-09-01T00:00:00Z
///
/// Response: 200 OK
/// Content-Disposition: attachment;filename=report.csv
///
/// user_id,segment_name,action_type,action_date
/// 7,VIP_USERS,inserted,2023-08-30 12:00:01
/// ```
///
/// # Errors
///
/// Returns an error if the window is malformed or the user is not found.
pub async fn history<C>(
    State(state): State<Arc<GatewayState<C>>>,
    Path(user_id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    C: SegmentsApi + 'static,
{
    let user_id = parse_user_id(&user_id)?;
    let Query(window) = query?;

    state.control.get_user(user_id).await?;
    let entries = state
        .control
        .history_for_user(user_id, window.from, window.to)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment;filename=report.csv"),
        ],
        report::history_csv(&entries),
    ))
}
