//! Segment service implementation.
//!
//! This module provides the capability traits consumed by the gateway and the
//! `SegmentService` implementation that coordinates the store, the clock and
//! the auto-assignment random source.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use segments_core::{Clock, SegmentName, SystemClock, UserId};
use segments_store::{HistoryEntry, Membership, Segment, Store, StoreError, User};
use tracing::Span;

use crate::auto_assign;
use crate::error::{ControlError, Result};
use crate::lifecycle;
use crate::types::{ControlConfig, Enrollment, Reassignment};

// =============================================================================
// Capabilities
// =============================================================================

/// Creating, reading and deleting users and segments.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Create a user with a generated id.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::Store` if the store fails.
    async fn create_user(&self, name: &str) -> Result<User>;

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::UserNotFound` if the user doesn't exist.
    async fn get_user(&self, user_id: UserId) -> Result<User>;

    /// Delete a user.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::UserNotFound` if the user doesn't exist.
    async fn delete_user(&self, user_id: UserId) -> Result<()>;

    /// Ids of every user, ascending.
    async fn list_user_ids(&self) -> Result<Vec<UserId>>;

    /// Create a segment.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::InvalidArgument` if the description is too long
    /// and `ControlError::SegmentAlreadyExists` on a name collision.
    async fn create_segment(
        &self,
        name: &SegmentName,
        description: Option<&str>,
    ) -> Result<Segment>;

    /// Get a segment by name.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::SegmentNotFound` if the segment doesn't exist.
    async fn get_segment(&self, name: &SegmentName) -> Result<Segment>;

    /// Delete a segment.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::SegmentNotFound` if the segment doesn't exist.
    async fn delete_segment(&self, name: &SegmentName) -> Result<()>;
}

/// Adding users to and removing them from segments.
///
/// Callers confirm that the user and segment exist beforehand.
#[async_trait]
pub trait MembershipLifecycle: Send + Sync {
    /// Assign the user to the segment with no expiry.
    async fn assign_indefinite(&self, user_id: UserId, segment: &SegmentName)
        -> Result<Membership>;

    /// Assign the user to the segment for `hours` from now.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::InvalidArgument` if `hours` is not positive.
    async fn assign_with_ttl(
        &self,
        user_id: UserId,
        segment: &SegmentName,
        hours: i64,
    ) -> Result<Membership>;

    /// Remove the user from the segment and record the removal.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::MembershipNotFound` if there is nothing to remove.
    async fn remove(&self, user_id: UserId, segment: &SegmentName) -> Result<()>;

    /// Apply every removal, then every addition, in the order given.
    ///
    /// Stops at the first failure; earlier steps stay applied.
    async fn batch_reassign(
        &self,
        user_id: UserId,
        reassignment: &Reassignment,
    ) -> Result<Vec<Membership>>;
}

/// Read-only membership queries.
#[async_trait]
pub trait MembershipQuery: Send + Sync {
    /// Names of the user's active segments, in insertion order.
    async fn active_segments_for_user(&self, user_id: UserId) -> Result<Vec<SegmentName>>;

    /// History of the user with `from < action_date < to`, oldest first.
    async fn history_for_user(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>>;
}

/// Proportional random enrollment.
#[async_trait]
pub trait AutoAssign: Send + Sync {
    /// Assign a random `percent` of `user_ids` to the segment indefinitely
    /// and return the selected ids.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::InvalidArgument` if `percent` is above 100 or NaN.
    async fn assign_random_percent(
        &self,
        percent: f64,
        user_ids: &[UserId],
        segment: &SegmentName,
    ) -> Result<Vec<UserId>>;

    /// Assign a random `percent` of all users to an existing segment.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::SegmentNotFound` if the segment doesn't exist.
    async fn enroll_random_percent(&self, segment: &SegmentName, percent: f64)
        -> Result<Enrollment>;
}

/// Every capability of the segment service.
pub trait SegmentsApi: Directory + MembershipLifecycle + MembershipQuery + AutoAssign {}

impl<T> SegmentsApi for T where T: Directory + MembershipLifecycle + MembershipQuery + AutoAssign {}

// =============================================================================
// Service
// =============================================================================

/// The main segment service implementation.
pub struct SegmentService<S: Store> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    config: ControlConfig,
    rng: Mutex<StdRng>,
    span: Option<Span>,
}

impl<S: Store> SegmentService<S> {
    /// Create a new segment service.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, config: ControlConfig) -> Self {
        let rng = config
            .rng_seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);

        Self {
            store,
            clock,
            config,
            rng: Mutex::new(rng),
            span: None,
        }
    }

    /// Create with the system clock and default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self::new(store, Arc::new(SystemClock), ControlConfig::default())
    }

    /// Emit this service's events inside `span`.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &ControlConfig {
        &self.config
    }

    fn in_span<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.span {
            Some(span) => span.in_scope(f),
            None => f(),
        }
    }

    fn upsert(
        &self,
        user_id: UserId,
        segment: &SegmentName,
        expire_at: Option<DateTime<Utc>>,
    ) -> Result<Membership> {
        let membership = self.store.upsert_membership(user_id, segment, expire_at)?;

        tracing::info!(
            user_id = %user_id,
            segment = %segment,
            expire_at = ?expire_at,
            "Assigned segment"
        );

        Ok(membership)
    }

    fn delete_membership(&self, user_id: UserId, segment: &SegmentName) -> Result<()> {
        self.store
            .delete_membership(user_id, segment)
            .map_err(|e| match e {
                StoreError::NotFound => ControlError::MembershipNotFound {
                    user_id,
                    segment: segment.clone(),
                },
                other => other.into(),
            })?;

        tracing::info!(user_id = %user_id, segment = %segment, "Removed segment");

        Ok(())
    }

    fn pick_and_assign(
        &self,
        percent: f64,
        user_ids: &[UserId],
        segment: &SegmentName,
    ) -> Result<Vec<UserId>> {
        let picked = {
            let mut rng = self.rng.lock();
            auto_assign::pick_random_ids(&mut *rng, percent, user_ids)?
        };

        for user_id in &picked {
            self.store.upsert_membership(*user_id, segment, None)?;
        }

        tracing::info!(
            segment = %segment,
            percent,
            candidates = user_ids.len(),
            assigned = picked.len(),
            "Auto-assigned segment"
        );

        Ok(picked)
    }
}

#[async_trait]
impl<S: Store + 'static> Directory for SegmentService<S> {
    async fn create_user(&self, name: &str) -> Result<User> {
        self.in_span(|| {
            let user = self.store.insert_user(name)?;
            tracing::info!(user_id = %user.user_id, name = %user.name, "Created user");
            Ok(user)
        })
    }

    async fn get_user(&self, user_id: UserId) -> Result<User> {
        self.store
            .get_user(user_id)?
            .ok_or(ControlError::UserNotFound(user_id))
    }

    async fn delete_user(&self, user_id: UserId) -> Result<()> {
        self.in_span(|| {
            self.store.delete_user(user_id).map_err(|e| match e {
                StoreError::NotFound => ControlError::UserNotFound(user_id),
                other => other.into(),
            })?;
            tracing::info!(user_id = %user_id, "Deleted user");
            Ok(())
        })
    }

    async fn list_user_ids(&self) -> Result<Vec<UserId>> {
        Ok(self.store.list_all_user_ids()?)
    }

    async fn create_segment(
        &self,
        name: &SegmentName,
        description: Option<&str>,
    ) -> Result<Segment> {
        self.in_span(|| {
            if let Some(description) = description {
                self.config.policy.validate_description(description)?;
            }

            let segment = self
                .store
                .insert_segment(name, description)
                .map_err(|e| match e {
                    StoreError::AlreadyExists => ControlError::SegmentAlreadyExists(name.clone()),
                    other => other.into(),
                })?;

            tracing::info!(segment = %name, "Created segment");

            Ok(segment)
        })
    }

    async fn get_segment(&self, name: &SegmentName) -> Result<Segment> {
        self.store
            .get_segment(name)?
            .ok_or_else(|| ControlError::SegmentNotFound(name.clone()))
    }

    async fn delete_segment(&self, name: &SegmentName) -> Result<()> {
        self.in_span(|| {
            self.store.delete_segment(name).map_err(|e| match e {
                StoreError::NotFound => ControlError::SegmentNotFound(name.clone()),
                other => other.into(),
            })?;
            tracing::info!(segment = %name, "Deleted segment");
            Ok(())
        })
    }
}

#[async_trait]
impl<S: Store + 'static> MembershipLifecycle for SegmentService<S> {
    async fn assign_indefinite(
        &self,
        user_id: UserId,
        segment: &SegmentName,
    ) -> Result<Membership> {
        self.in_span(|| self.upsert(user_id, segment, None))
    }

    async fn assign_with_ttl(
        &self,
        user_id: UserId,
        segment: &SegmentName,
        hours: i64,
    ) -> Result<Membership> {
        self.in_span(|| {
            let expire_at = lifecycle::ttl_expiry(self.clock.now(), hours)?;
            self.upsert(user_id, segment, Some(expire_at))
        })
    }

    async fn remove(&self, user_id: UserId, segment: &SegmentName) -> Result<()> {
        self.in_span(|| self.delete_membership(user_id, segment))
    }

    async fn batch_reassign(
        &self,
        user_id: UserId,
        reassignment: &Reassignment,
    ) -> Result<Vec<Membership>> {
        self.in_span(|| {
            for segment in &reassignment.to_delete {
                self.delete_membership(user_id, segment)?;
            }

            reassignment
                .to_add
                .iter()
                .map(|segment| self.upsert(user_id, segment, None))
                .collect()
        })
    }
}

#[async_trait]
impl<S: Store + 'static> MembershipQuery for SegmentService<S> {
    async fn active_segments_for_user(&self, user_id: UserId) -> Result<Vec<SegmentName>> {
        self.in_span(|| {
            let names = self.store.list_active_segment_names(user_id)?;
            tracing::debug!(user_id = %user_id, count = names.len(), "Listed active segments");
            Ok(names)
        })
    }

    async fn history_for_user(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>> {
        self.in_span(|| {
            let entries = self.store.list_history(user_id, from, to)?;
            tracing::debug!(
                user_id = %user_id,
                from = %from,
                to = %to,
                count = entries.len(),
                "Listed history"
            );
            Ok(entries)
        })
    }
}

#[async_trait]
impl<S: Store + 'static> AutoAssign for SegmentService<S> {
    async fn assign_random_percent(
        &self,
        percent: f64,
        user_ids: &[UserId],
        segment: &SegmentName,
    ) -> Result<Vec<UserId>> {
        self.in_span(|| self.pick_and_assign(percent, user_ids, segment))
    }

    async fn enroll_random_percent(
        &self,
        segment: &SegmentName,
        percent: f64,
    ) -> Result<Enrollment> {
        self.in_span(|| {
            if self.store.get_segment(segment)?.is_none() {
                return Err(ControlError::SegmentNotFound(segment.clone()));
            }

            let user_ids = self.store.list_all_user_ids()?;
            let assigned = self.pick_and_assign(percent, &user_ids, segment)?;

            Ok(Enrollment {
                segment: segment.clone(),
                assigned,
            })
        })
    }
}
