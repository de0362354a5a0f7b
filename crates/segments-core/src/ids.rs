//! Core identifier types for the segments service.
//!
//! Users are keyed by a store-generated integer. Segments use their name as
//! the natural key, so `SegmentName` only ever holds the canonical form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::policy::canonicalize_segment_name;

/// A user identifier, generated by the store on insert.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a `UserId` from its raw value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Return the raw value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Encode as big-endian bytes that sort in numeric order.
    ///
    /// The sign bit is flipped so negative ids sort before positive ones.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn to_sortable_bytes(self) -> [u8; 8] {
        ((self.0 as u64) ^ (1 << 63)).to_be_bytes()
    }

    /// Decode from bytes produced by [`UserId::to_sortable_bytes`].
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn from_sortable_bytes(bytes: [u8; 8]) -> Self {
        Self((u64::from_be_bytes(bytes) ^ (1 << 63)) as i64)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdError::Empty);
        }
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| IdError::NotANumber(s.to_string()))
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A segment name in canonical form (uppercase, spaces replaced by underscores).
///
/// Every constructor canonicalizes, so two names that differ only in case or
/// in spaces vs. underscores compare equal.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SegmentName(String);

impl SegmentName {
    /// Canonicalize `raw` into a segment name.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(canonicalize_segment_name(raw.as_ref()))
    }

    /// Return the canonical name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the canonical name as bytes, for key encoding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Rebuild from bytes read back from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid UTF-8.
    pub fn from_stored_bytes(bytes: &[u8]) -> Result<Self, IdError> {
        std::str::from_utf8(bytes)
            .map(Self::new)
            .map_err(|_| IdError::InvalidUtf8)
    }
}

impl fmt::Debug for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SegmentName({})", self.0)
    }
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SegmentName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SegmentName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<SegmentName> for String {
    fn from(name: SegmentName) -> Self {
        name.0
    }
}

impl AsRef<str> for SegmentName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// No identifier was provided.
    #[error("identifier is empty")]
    Empty,

    /// The identifier is not a base-10 integer.
    #[error("user id must be a number, got {0:?}")]
    NotANumber(String),

    /// Stored bytes were not valid UTF-8.
    #[error("stored name is not valid UTF-8")]
    InvalidUtf8,
}
