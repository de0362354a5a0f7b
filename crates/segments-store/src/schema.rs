//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// User records, keyed by `user_id`.
    pub const USERS: &str = "users";

    /// Segment records, keyed by canonical segment name.
    pub const SEGMENTS: &str = "segments";

    /// Membership records, keyed by `user_id || segment_name`.
    pub const MEMBERSHIPS: &str = "memberships";

    /// Index: memberships by user in insertion order, keyed by `user_id || sequence`.
    /// The value is the segment name.
    pub const MEMBERSHIPS_BY_USER: &str = "memberships_by_user";

    /// Index: memberships by segment, keyed by `len || segment_name || user_id`.
    pub const MEMBERSHIPS_BY_SEGMENT: &str = "memberships_by_segment";

    /// Append-only membership history, keyed by `user_id || action_date || sequence`.
    pub const HISTORY: &str = "history";

    /// Counters for generated ids and sequence numbers.
    pub const META: &str = "meta";
}

/// Keys stored in the `meta` column family.
pub mod meta {
    /// The next user id to hand out.
    pub const NEXT_USER_ID: &[u8] = b"next_user_id";

    /// The next sequence number for memberships and history rows.
    pub const NEXT_SEQUENCE: &[u8] = b"next_sequence";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::USERS,
        cf::SEGMENTS,
        cf::MEMBERSHIPS,
        cf::MEMBERSHIPS_BY_USER,
        cf::MEMBERSHIPS_BY_SEGMENT,
        cf::HISTORY,
        cf::META,
    ]
}
