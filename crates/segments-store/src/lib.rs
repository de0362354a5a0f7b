//! `RocksDB` storage layer for the segments service.
//!
//! This crate provides persistent storage for users, segments, memberships and
//! the membership history using `RocksDB` with column families for indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `users`: User records, keyed by `user_id`
//! - `segments`: Segment records, keyed by canonical name
//! - `memberships`: Membership records, keyed by `user_id || segment_name`
//! - `memberships_by_user`: Index for listing a user's memberships in insertion order
//! - `memberships_by_segment`: Index for listing a segment's members
//! - `history`: Append-only audit trail, keyed by `user_id || action_date || sequence`
//! - `meta`: Id and sequence counters
//!
//! Every write that touches more than one key goes through a single
//! `WriteBatch`, and read-modify-write operations are serialized by the store,
//! so each `Store` method is atomic on its own.
//!
//! # Example
//!
//! ```no_run
//! use segments_store::{RocksStore, Store};
//! use segments_core::SegmentName;
//!
//! let store = RocksStore::open("/tmp/segments-db").unwrap();
//!
//! let user = store.insert_user("alice").unwrap();
//! let segment = SegmentName::new("vip users");
//! store.insert_segment(&segment, None).unwrap();
//! store.upsert_membership(user.user_id, &segment, None).unwrap();
//!
//! let active = store.list_active_segment_names(user.user_id).unwrap();
//! assert_eq!(active, vec![segment]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;
pub mod types;

pub use error::{Result, StoreError};
pub use rocks::{RocksStore, StoreOptions};
pub use types::{ActionType, CascadePolicy, HistoryEntry, Membership, Segment, User};

use chrono::{DateTime, Utc};
use segments_core::{SegmentName, UserId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different implementations
/// (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a new user with a freshly generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn insert_user(&self, name: &str) -> Result<User>;

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user(&self, user_id: UserId) -> Result<Option<User>>;

    /// Delete a user by ID.
    ///
    /// Memberships are removed as well when the store cascades deletes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the user doesn't exist.
    fn delete_user(&self, user_id: UserId) -> Result<()>;

    /// List the ids of every user, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_all_user_ids(&self) -> Result<Vec<UserId>>;

    // =========================================================================
    // Segment Operations
    // =========================================================================

    /// Insert a new segment.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if a segment with this name exists.
    fn insert_segment(&self, name: &SegmentName, description: Option<&str>) -> Result<Segment>;

    /// Get a segment by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_segment(&self, name: &SegmentName) -> Result<Option<Segment>>;

    /// Delete a segment by name.
    ///
    /// Memberships are removed as well when the store cascades deletes.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the segment doesn't exist.
    fn delete_segment(&self, name: &SegmentName) -> Result<()>;

    // =========================================================================
    // Membership Operations
    // =========================================================================

    /// Insert a membership, or update `updated_at` and `expire_at` of the
    /// existing one. Appends an `inserted` history entry either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn upsert_membership(
        &self,
        user_id: UserId,
        segment: &SegmentName,
        expire_at: Option<DateTime<Utc>>,
    ) -> Result<Membership>;

    /// Get a membership regardless of whether it is still active.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_membership(&self, user_id: UserId, segment: &SegmentName) -> Result<Option<Membership>>;

    /// Delete a membership and append a `deleted` history entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the membership doesn't exist.
    fn delete_membership(&self, user_id: UserId, segment: &SegmentName) -> Result<()>;

    /// List the names of the user's active segments, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_active_segment_names(&self, user_id: UserId) -> Result<Vec<SegmentName>>;

    /// List history entries of the user with `from < action_date < to`,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_history(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>>;
}
