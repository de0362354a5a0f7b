//! Error types for the segment service.
//!
//! This module defines all errors that can occur while managing users,
//! segments and memberships.

use segments_core::{ErrorKind, PolicyViolation, SegmentName, UserId};
use segments_store::StoreError;
use thiserror::Error;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Errors that can occur in segment service operations.
#[derive(Debug, Error)]
pub enum ControlError {
    /// The requested user was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The requested segment was not found.
    #[error("segment not found: {0}")]
    SegmentNotFound(SegmentName),

    /// The user is not a member of the segment.
    #[error("user {user_id} is not a member of segment {segment}")]
    MembershipNotFound {
        /// The user.
        user_id: UserId,
        /// The segment.
        segment: SegmentName,
    },

    /// A segment with the same canonical name already exists.
    #[error("segment with such name already exists: {0}")]
    SegmentAlreadyExists(SegmentName),

    /// The caller supplied an out-of-range or malformed value.
    #[error("{0}")]
    InvalidArgument(String),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ControlError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound(_) | Self::SegmentNotFound(_) | Self::MembershipNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::SegmentAlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Store(_) => ErrorKind::Storage,
        }
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::AlreadyExists => 409,
            ErrorKind::InvalidArgument => 400,
            ErrorKind::Storage => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Store(StoreError::Database(_)))
    }
}

impl From<PolicyViolation> for ControlError {
    fn from(violation: PolicyViolation) -> Self {
        Self::InvalidArgument(violation.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        let user_id = UserId::new(7);
        let segment = SegmentName::new("vip users");

        assert_eq!(ControlError::UserNotFound(user_id).http_status_code(), 404);
        assert_eq!(
            ControlError::SegmentNotFound(segment.clone()).http_status_code(),
            404
        );
        assert_eq!(
            ControlError::MembershipNotFound {
                user_id,
                segment: segment.clone()
            }
            .http_status_code(),
            404
        );
        assert_eq!(
            ControlError::SegmentAlreadyExists(segment).http_status_code(),
            409
        );
        assert_eq!(
            ControlError::InvalidArgument("wrong percent value".into()).http_status_code(),
            400
        );
        assert_eq!(
            ControlError::Store(StoreError::Database("io".into())).http_status_code(),
            500
        );
    }

    #[test]
    fn only_database_errors_are_retriable() {
        assert!(ControlError::Store(StoreError::Database("io".into())).is_retriable());
        assert!(!ControlError::Store(StoreError::Serialization("cbor".into())).is_retriable());
        assert!(!ControlError::UserNotFound(UserId::new(1)).is_retriable());
    }

    #[test]
    fn policy_violation_is_invalid_argument() {
        let err: ControlError = PolicyViolation::TooLong {
            field: "description",
            max: 65_536,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            err.to_string(),
            "field description is too long (maximum 65536 characters)"
        );
    }
}
