//! Membership expiry rules.
//!
//! A membership is either indefinite (`expire_at = None`) or expires a whole
//! number of hours after it was last assigned. Expiry is evaluated lazily when
//! memberships are read; nothing sweeps expired rows.

use chrono::{DateTime, Duration, Utc};

use crate::error::{ControlError, Result};

/// Compute the expiry instant of a membership assigned at `now` for `hours`.
///
/// # Errors
///
/// Returns `ControlError::InvalidArgument` if `hours` is not positive or the
/// result is out of range.
pub fn ttl_expiry(now: DateTime<Utc>, hours: i64) -> Result<DateTime<Utc>> {
    if hours <= 0 {
        return Err(ControlError::InvalidArgument(format!(
            "ttl must be a positive number of hours, got {hours}"
        )));
    }

    Duration::try_hours(hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| ControlError::InvalidArgument(format!("ttl of {hours} hours is too large")))
}
