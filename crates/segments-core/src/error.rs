//! Common error types for the segments service.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// The coarse failure categories every layer reports in.
///
/// Callers branch on these rather than on concrete error variants, so that
/// absence can be told apart from genuine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The entity does not exist.
    NotFound,
    /// A segment with the same canonical name already exists.
    AlreadyExists,
    /// The caller supplied an out-of-range or malformed value.
    InvalidArgument,
    /// The underlying store failed.
    Storage,
}

/// Core errors that can occur throughout the segments service.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),

    /// A naming policy rule was violated.
    #[error(transparent)]
    Policy(#[from] crate::policy::PolicyViolation),
}

impl CoreError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId(_) | Self::Policy(_) => ErrorKind::InvalidArgument,
        }
    }
}
