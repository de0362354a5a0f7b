//! Domain types stored in the database.
//!
//! These types represent the persisted state of users, segments, memberships
//! and the membership history trail.

use chrono::{DateTime, Utc};
use segments_core::{SegmentName, UserId};
use serde::{Deserialize, Serialize};

/// A user record stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-generated identifier.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A segment record stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Canonical name, the natural key.
    pub name: SegmentName,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A user's membership in a segment.
///
/// At most one membership exists per `(user_id, segment_name)`. A membership
/// whose `expire_at` has passed is kept in storage but no longer counts as
/// active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// The member.
    pub user_id: UserId,
    /// The segment.
    pub segment_name: SegmentName,
    /// When the membership was first inserted.
    pub created_at: DateTime<Utc>,
    /// When the membership was last upserted.
    pub updated_at: DateTime<Utc>,
    /// When the membership stops being active; `None` means never.
    #[serde(default)]
    pub expire_at: Option<DateTime<Utc>>,
    /// Insertion order among the user's memberships; preserved across upserts.
    pub sequence: u64,
}

impl Membership {
    /// Whether the membership is active at `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.map_or(true, |expire_at| expire_at > now)
    }
}

/// What happened to a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// The membership was inserted or upserted.
    Inserted,
    /// The membership was removed.
    Deleted,
}

impl ActionType {
    /// The wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable audit record of a membership change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The member.
    pub user_id: UserId,
    /// The segment.
    pub segment_name: SegmentName,
    /// The membership's expiry at the time of the action.
    #[serde(default)]
    pub expire_at: Option<DateTime<Utc>>,
    /// Inserted or deleted.
    pub action_type: ActionType,
    /// When the action happened.
    pub action_date: DateTime<Utc>,
}

/// What happens to memberships when their user or segment is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CascadePolicy {
    /// Leave memberships in place.
    #[default]
    Retain,
    /// Remove the memberships and record a `deleted` history entry for each.
    Delete,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn membership(expire_at: Option<DateTime<Utc>>) -> Membership {
        let now = Utc::now();
        Membership {
            user_id: UserId::new(1),
            segment_name: SegmentName::new("vip"),
            created_at: now,
            updated_at: now,
            expire_at,
            sequence: 1,
        }
    }

    #[test]
    fn active_predicate() {
        let now = Utc::now();
        assert!(membership(None).is_active_at(now));
        assert!(membership(Some(now + Duration::minutes(1))).is_active_at(now));
        assert!(!membership(Some(now - Duration::minutes(1))).is_active_at(now));
        assert!(!membership(Some(now)).is_active_at(now));
    }

    #[test]
    fn action_type_names() {
        assert_eq!(ActionType::Inserted.as_str(), "inserted");
        assert_eq!(ActionType::Deleted.to_string(), "deleted");
    }
}
