//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions to encode and decode keys for various indexes.
//! All integers are big-endian with the sign bit flipped, so lexicographic key
//! order matches numeric order and prefix scans come back sorted.

use chrono::{DateTime, Utc};
use segments_core::{SegmentName, UserId};

/// Length of an encoded user id.
pub const USER_ID_LEN: usize = 8;

/// Length of an encoded sequence number or timestamp.
pub const U64_LEN: usize = 8;

/// Encode a user key (just the user id bytes).
#[must_use]
pub fn user_key(user_id: UserId) -> Vec<u8> {
    user_id.to_sortable_bytes().to_vec()
}

/// Decode a user key.
///
/// # Panics
///
/// Panics if the key is shorter than 8 bytes.
#[must_use]
pub fn extract_user_id(key: &[u8]) -> UserId {
    let mut bytes = [0u8; USER_ID_LEN];
    bytes.copy_from_slice(&key[..USER_ID_LEN]);
    UserId::from_sortable_bytes(bytes)
}

/// Encode a segment key (the canonical name bytes).
#[must_use]
pub fn segment_key(name: &SegmentName) -> Vec<u8> {
    name.as_bytes().to_vec()
}

/// Encode a membership key: `user_id || segment_name`.
#[must_use]
pub fn membership_key(user_id: UserId, segment: &SegmentName) -> Vec<u8> {
    let mut key = Vec::with_capacity(USER_ID_LEN + segment.as_bytes().len());
    key.extend_from_slice(&user_id.to_sortable_bytes());
    key.extend_from_slice(segment.as_bytes());
    key
}

/// Encode a user-membership index key: `user_id || sequence`.
///
/// Scanning the user prefix yields memberships in insertion order.
#[must_use]
pub fn user_membership_key(user_id: UserId, sequence: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(USER_ID_LEN + U64_LEN);
    key.extend_from_slice(&user_id.to_sortable_bytes());
    key.extend_from_slice(&sequence.to_be_bytes());
    key
}

/// Encode a user prefix for scanning memberships or history of one user.
#[must_use]
pub fn user_prefix(user_id: UserId) -> Vec<u8> {
    user_id.to_sortable_bytes().to_vec()
}

/// Encode a segment-membership index key: `len || segment_name || user_id`.
///
/// The length prefix keeps `A` from matching the scan prefix of `AB`.
#[must_use]
pub fn segment_membership_key(segment: &SegmentName, user_id: UserId) -> Vec<u8> {
    let mut key = segment_prefix(segment);
    key.extend_from_slice(&user_id.to_sortable_bytes());
    key
}

/// Encode a segment prefix for scanning all members of a segment.
#[must_use]
pub fn segment_prefix(segment: &SegmentName) -> Vec<u8> {
    let bytes = segment.as_bytes();
    let len = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
    let mut key = Vec::with_capacity(4 + bytes.len() + USER_ID_LEN);
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(bytes);
    key
}

/// Extract the user id from the tail of a segment-membership key.
///
/// # Panics
///
/// Panics if the key is shorter than 8 bytes.
#[must_use]
pub fn extract_user_id_from_segment_membership_key(key: &[u8]) -> UserId {
    extract_user_id(&key[key.len() - USER_ID_LEN..])
}

/// Encode a timestamp as sortable microseconds since the epoch.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn encode_timestamp(at: DateTime<Utc>) -> [u8; U64_LEN] {
    ((at.timestamp_micros() as u64) ^ (1 << 63)).to_be_bytes()
}

/// Encode a history key: `user_id || action_date || sequence`.
///
/// The sequence breaks ties between entries written in the same microsecond.
#[must_use]
pub fn history_key(user_id: UserId, action_date: DateTime<Utc>, sequence: u64) -> Vec<u8> {
    let mut key = history_bound(user_id, action_date);
    key.extend_from_slice(&sequence.to_be_bytes());
    key
}

/// Encode the seek position for history of `user_id` at `at`.
#[must_use]
pub fn history_bound(user_id: UserId, at: DateTime<Utc>) -> Vec<u8> {
    let mut key = Vec::with_capacity(USER_ID_LEN + 2 * U64_LEN);
    key.extend_from_slice(&user_id.to_sortable_bytes());
    key.extend_from_slice(&encode_timestamp(at));
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn membership_keys_share_user_prefix() {
        let user = UserId::new(7);
        let prefix = user_prefix(user);

        let a = membership_key(user, &SegmentName::new("vip"));
        let b = user_membership_key(user, 3);
        assert!(a.starts_with(&prefix));
        assert!(b.starts_with(&prefix));

        let other = user_prefix(UserId::new(8));
        assert!(!a.starts_with(&other));
    }

    #[test]
    fn user_membership_keys_sort_by_sequence() {
        let user = UserId::new(1);
        assert!(user_membership_key(user, 2) < user_membership_key(user, 10));
        assert!(user_membership_key(user, 255) < user_membership_key(user, 256));
    }

    #[test]
    fn segment_prefix_does_not_match_longer_name() {
        let short = SegmentName::new("AB");
        let long = SegmentName::new("ABC");
        let key = segment_membership_key(&long, UserId::new(1));
        assert!(!key.starts_with(&segment_prefix(&short)));
        assert!(key.starts_with(&segment_prefix(&long)));
        assert_eq!(
            extract_user_id_from_segment_membership_key(&key),
            UserId::new(1)
        );
    }

    #[test]
    fn history_keys_sort_by_time() {
        let user = UserId::new(3);
        let t0 = DateTime::from_timestamp_micros(1_700_000_000_000_000).unwrap();
        let t1 = t0 + Duration::seconds(1);

        assert!(history_key(user, t0, 9) < history_key(user, t1, 1));
        assert!(history_key(user, t0, 1) < history_key(user, t0, 2));
        assert!(history_bound(user, t0) <= history_key(user, t0, 0));
    }
}
