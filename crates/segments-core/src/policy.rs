//! Naming policy for users and segments.
//!
//! Segment identity is case- and whitespace-normalized: every name goes
//! through [`canonicalize_segment_name`] before it is looked up, stored or
//! deleted. Length limits live in [`NamePolicy`], which is handed to the
//! components that validate requests instead of being a global.

use serde::Deserialize;
use thiserror::Error;

/// Uppercase `raw`, then replace every space with an underscore.
///
/// Idempotent: canonicalizing an already canonical name returns it unchanged.
#[must_use]
pub fn canonicalize_segment_name(raw: &str) -> String {
    raw.to_uppercase().replace(' ', "_")
}

/// A rejected name or description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    /// A required field was missing or empty.
    #[error("field {0} is a required field")]
    Required(&'static str),

    /// The field is shorter than the minimum.
    #[error("field {field} is too short (minimum {min} characters)")]
    TooShort {
        /// The offending field.
        field: &'static str,
        /// The minimum accepted length.
        min: usize,
    },

    /// The field is longer than the maximum.
    #[error("field {field} is too long (maximum {max} characters)")]
    TooLong {
        /// The offending field.
        field: &'static str,
        /// The maximum accepted length.
        max: usize,
    },
}

/// Length limits applied to user names, segment names and descriptions.
#[derive(Debug, Clone, Deserialize)]
pub struct NamePolicy {
    /// Minimum length of user and segment names, in characters.
    #[serde(default = "NamePolicy::default_min_name_len")]
    pub min_name_len: usize,
    /// Maximum length of user and segment names, in characters.
    #[serde(default = "NamePolicy::default_max_name_len")]
    pub max_name_len: usize,
    /// Maximum length of a segment description, in characters.
    #[serde(default = "NamePolicy::default_max_description_len")]
    pub max_description_len: usize,
}

impl NamePolicy {
    const fn default_min_name_len() -> usize {
        4
    }

    const fn default_max_name_len() -> usize {
        255
    }

    const fn default_max_description_len() -> usize {
        65_536
    }

    /// Check a user or segment name against the length limits.
    ///
    /// # Errors
    ///
    /// Returns a `PolicyViolation` naming `field` if the value is empty,
    /// too short, or too long.
    pub fn validate_name(&self, field: &'static str, value: &str) -> Result<(), PolicyViolation> {
        let len = value.chars().count();
        if len == 0 {
            return Err(PolicyViolation::Required(field));
        }
        if len < self.min_name_len {
            return Err(PolicyViolation::TooShort {
                field,
                min: self.min_name_len,
            });
        }
        if len > self.max_name_len {
            return Err(PolicyViolation::TooLong {
                field,
                max: self.max_name_len,
            });
        }
        Ok(())
    }

    /// Check a segment description against the length limit.
    ///
    /// # Errors
    ///
    /// Returns `PolicyViolation::TooLong` if the description exceeds the limit.
    pub fn validate_description(&self, description: &str) -> Result<(), PolicyViolation> {
        if description.chars().count() > self.max_description_len {
            return Err(PolicyViolation::TooLong {
                field: "description",
                max: self.max_description_len,
            });
        }
        Ok(())
    }
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self {
            min_name_len: Self::default_min_name_len(),
            max_name_len: Self::default_max_name_len(),
            max_description_len: Self::default_max_description_len(),
        }
    }
}
