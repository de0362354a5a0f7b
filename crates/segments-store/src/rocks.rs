//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};
use segments_core::{Clock, SegmentName, SystemClock, UserId};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf, meta};
use crate::types::{ActionType, CascadePolicy, HistoryEntry, Membership, Segment, User};
use crate::Store;

/// Options for opening a [`RocksStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// What deleting a user or segment does to its memberships.
    pub cascade: CascadePolicy,
    /// Time source for `created_at`, `updated_at`, `action_date` and expiry checks.
    pub clock: Arc<dyn Clock>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            cascade: CascadePolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    /// Serializes read-modify-write operations (counters, upserts, deletes).
    write_lock: Mutex<()>,
    clock: Arc<dyn Clock>,
    cascade: CascadePolicy,
}

/// Hands out sequence numbers inside one write batch.
struct Sequence {
    next: u64,
}

impl Sequence {
    fn take(&mut self) -> u64 {
        let value = self.next;
        self.next += 1;
        value
    }
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open_with<P: AsRef<Path>>(path: P, options: StoreOptions) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)?;

        tracing::debug!(cascade = ?options.cascade, "Opened RocksDB store");

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
            clock: options.clock,
            cascade: options.cascade,
        })
    }

    /// The clock this store stamps records with.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The configured cascade policy.
    #[must_use]
    pub const fn cascade(&self) -> CascadePolicy {
        self.cascade
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read a counter from the `meta` column family; counters start at 1.
    fn read_counter(&self, key: &[u8]) -> Result<u64> {
        let cf_meta = self.cf(cf::META)?;
        match self.db.get_cf(&cf_meta, key)? {
            None => Ok(1),
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Serialization(format!("corrupt counter of {} bytes", bytes.len()))
                })?;
                Ok(u64::from_be_bytes(arr))
            }
        }
    }

    fn sequence(&self) -> Result<Sequence> {
        Ok(Sequence {
            next: self.read_counter(meta::NEXT_SEQUENCE)?,
        })
    }

    fn stage_sequence(&self, batch: &mut WriteBatch, sequence: &Sequence) -> Result<()> {
        let cf_meta = self.cf(cf::META)?;
        batch.put_cf(&cf_meta, meta::NEXT_SEQUENCE, sequence.next.to_be_bytes());
        Ok(())
    }

    /// Stage an append to the history trail.
    fn stage_history(
        &self,
        batch: &mut WriteBatch,
        entry: &HistoryEntry,
        sequence: u64,
    ) -> Result<()> {
        let cf_history = self.cf(cf::HISTORY)?;
        let key = keys::history_key(entry.user_id, entry.action_date, sequence);
        batch.put_cf(&cf_history, key, Self::serialize(entry)?);
        Ok(())
    }

    /// Stage removal of a membership, its index entries, and the `deleted`
    /// history entry.
    fn stage_removal(
        &self,
        batch: &mut WriteBatch,
        membership: &Membership,
        now: DateTime<Utc>,
        sequence: &mut Sequence,
    ) -> Result<()> {
        let cf_memberships = self.cf(cf::MEMBERSHIPS)?;
        let cf_by_user = self.cf(cf::MEMBERSHIPS_BY_USER)?;
        let cf_by_segment = self.cf(cf::MEMBERSHIPS_BY_SEGMENT)?;

        let user_id = membership.user_id;
        let segment = &membership.segment_name;

        batch.delete_cf(&cf_memberships, keys::membership_key(user_id, segment));
        batch.delete_cf(
            &cf_by_user,
            keys::user_membership_key(user_id, membership.sequence),
        );
        batch.delete_cf(&cf_by_segment, keys::segment_membership_key(segment, user_id));

        let entry = HistoryEntry {
            user_id,
            segment_name: segment.clone(),
            expire_at: membership.expire_at,
            action_type: ActionType::Deleted,
            action_date: now,
        };
        self.stage_history(batch, &entry, sequence.take())
    }

    /// All memberships of a user, active or not, in insertion order.
    fn memberships_of_user(&self, user_id: UserId) -> Result<Vec<Membership>> {
        let cf_by_user = self.cf(cf::MEMBERSHIPS_BY_USER)?;
        let prefix = keys::user_prefix(user_id);

        let mut memberships = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf_by_user, IteratorMode::From(&prefix, Direction::Forward));

        for item in iter {
            let (key, value) = item?;

            // Stop if we're past the prefix
            if !key.starts_with(&prefix) {
                break;
            }

            let segment = SegmentName::from_stored_bytes(&value)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            if let Some(membership) = self.get_membership(user_id, &segment)? {
                memberships.push(membership);
            }
        }

        Ok(memberships)
    }

    /// Ids of every user holding a membership in the segment.
    fn members_of_segment(&self, segment: &SegmentName) -> Result<Vec<UserId>> {
        let cf_by_segment = self.cf(cf::MEMBERSHIPS_BY_SEGMENT)?;
        let prefix = keys::segment_prefix(segment);

        let mut members = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf_by_segment, IteratorMode::From(&prefix, Direction::Forward));

        for item in iter {
            let (key, _) = item?;

            if !key.starts_with(&prefix) {
                break;
            }

            members.push(keys::extract_user_id_from_segment_membership_key(&key));
        }

        Ok(members)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // User Operations
    // =========================================================================

    fn insert_user(&self, name: &str) -> Result<User> {
        let _guard = self.write_lock.lock();

        let cf_users = self.cf(cf::USERS)?;
        let cf_meta = self.cf(cf::META)?;

        let next_id = self.read_counter(meta::NEXT_USER_ID)?;
        let raw_id = i64::try_from(next_id)
            .map_err(|_| StoreError::Database("user id space exhausted".to_string()))?;

        let now = self.clock.now();
        let user = User {
            user_id: UserId::new(raw_id),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_users, keys::user_key(user.user_id), Self::serialize(&user)?);
        batch.put_cf(&cf_meta, meta::NEXT_USER_ID, (next_id + 1).to_be_bytes());
        self.db.write(batch)?;

        Ok(user)
    }

    fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let cf = self.cf(cf::USERS)?;

        self.db
            .get_cf(&cf, keys::user_key(user_id))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_user(&self, user_id: UserId) -> Result<()> {
        let _guard = self.write_lock.lock();

        let cf_users = self.cf(cf::USERS)?;
        if self.get_user(user_id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_users, keys::user_key(user_id));

        if self.cascade == CascadePolicy::Delete {
            let now = self.clock.now();
            let mut sequence = self.sequence()?;
            for membership in self.memberships_of_user(user_id)? {
                self.stage_removal(&mut batch, &membership, now, &mut sequence)?;
            }
            self.stage_sequence(&mut batch, &sequence)?;
        }

        self.db.write(batch)?;

        Ok(())
    }

    fn list_all_user_ids(&self) -> Result<Vec<UserId>> {
        let cf = self.cf(cf::USERS)?;

        let mut ids = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, _) = item?;
            ids.push(keys::extract_user_id(&key));
        }

        Ok(ids)
    }

    // =========================================================================
    // Segment Operations
    // =========================================================================

    fn insert_segment(&self, name: &SegmentName, description: Option<&str>) -> Result<Segment> {
        let _guard = self.write_lock.lock();

        if self.get_segment(name)?.is_some() {
            return Err(StoreError::AlreadyExists);
        }

        let now = self.clock.now();
        let segment = Segment {
            name: name.clone(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        };

        let cf = self.cf(cf::SEGMENTS)?;
        self.db
            .put_cf(&cf, keys::segment_key(name), Self::serialize(&segment)?)?;

        Ok(segment)
    }

    fn get_segment(&self, name: &SegmentName) -> Result<Option<Segment>> {
        let cf = self.cf(cf::SEGMENTS)?;

        self.db
            .get_cf(&cf, keys::segment_key(name))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_segment(&self, name: &SegmentName) -> Result<()> {
        let _guard = self.write_lock.lock();

        let cf_segments = self.cf(cf::SEGMENTS)?;
        if self.get_segment(name)?.is_none() {
            return Err(StoreError::NotFound);
        }

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_segments, keys::segment_key(name));

        if self.cascade == CascadePolicy::Delete {
            let now = self.clock.now();
            let mut sequence = self.sequence()?;
            for user_id in self.members_of_segment(name)? {
                if let Some(membership) = self.get_membership(user_id, name)? {
                    self.stage_removal(&mut batch, &membership, now, &mut sequence)?;
                }
            }
            self.stage_sequence(&mut batch, &sequence)?;
        }

        self.db.write(batch)?;

        Ok(())
    }

    // =========================================================================
    // Membership Operations
    // =========================================================================

    fn upsert_membership(
        &self,
        user_id: UserId,
        segment: &SegmentName,
        expire_at: Option<DateTime<Utc>>,
    ) -> Result<Membership> {
        let _guard = self.write_lock.lock();

        let cf_memberships = self.cf(cf::MEMBERSHIPS)?;
        let cf_by_user = self.cf(cf::MEMBERSHIPS_BY_USER)?;
        let cf_by_segment = self.cf(cf::MEMBERSHIPS_BY_SEGMENT)?;

        let now = self.clock.now();
        let mut sequence = self.sequence()?;
        let mut batch = WriteBatch::default();

        let membership = if let Some(mut existing) = self.get_membership(user_id, segment)? {
            existing.updated_at = now;
            existing.expire_at = expire_at;
            existing
        } else {
            let membership = Membership {
                user_id,
                segment_name: segment.clone(),
                created_at: now,
                updated_at: now,
                expire_at,
                sequence: sequence.take(),
            };
            batch.put_cf(
                &cf_by_user,
                keys::user_membership_key(user_id, membership.sequence),
                segment.as_bytes(),
            );
            batch.put_cf(
                &cf_by_segment,
                keys::segment_membership_key(segment, user_id),
                b"",
            );
            membership
        };

        batch.put_cf(
            &cf_memberships,
            keys::membership_key(user_id, segment),
            Self::serialize(&membership)?,
        );

        let entry = HistoryEntry {
            user_id,
            segment_name: segment.clone(),
            expire_at,
            action_type: ActionType::Inserted,
            action_date: now,
        };
        self.stage_history(&mut batch, &entry, sequence.take())?;
        self.stage_sequence(&mut batch, &sequence)?;

        self.db.write(batch)?;

        Ok(membership)
    }

    fn get_membership(&self, user_id: UserId, segment: &SegmentName) -> Result<Option<Membership>> {
        let cf = self.cf(cf::MEMBERSHIPS)?;

        self.db
            .get_cf(&cf, keys::membership_key(user_id, segment))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn delete_membership(&self, user_id: UserId, segment: &SegmentName) -> Result<()> {
        let _guard = self.write_lock.lock();

        let membership = self
            .get_membership(user_id, segment)?
            .ok_or(StoreError::NotFound)?;

        let now = self.clock.now();
        let mut sequence = self.sequence()?;
        let mut batch = WriteBatch::default();
        self.stage_removal(&mut batch, &membership, now, &mut sequence)?;
        self.stage_sequence(&mut batch, &sequence)?;

        self.db.write(batch)?;

        Ok(())
    }

    fn list_active_segment_names(&self, user_id: UserId) -> Result<Vec<SegmentName>> {
        let now = self.clock.now();

        Ok(self
            .memberships_of_user(user_id)?
            .into_iter()
            .filter(|membership| membership.is_active_at(now))
            .map(|membership| membership.segment_name)
            .collect())
    }

    fn list_history(
        &self,
        user_id: UserId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>> {
        let cf_history = self.cf(cf::HISTORY)?;
        let prefix = keys::user_prefix(user_id);
        let start = keys::history_bound(user_id, from);

        let mut entries = Vec::new();
        let iter = self
            .db
            .iterator_cf(&cf_history, IteratorMode::From(&start, Direction::Forward));

        for item in iter {
            let (key, value) = item?;

            if !key.starts_with(&prefix) {
                break;
            }

            let entry: HistoryEntry = Self::deserialize(&value)?;
            if entry.action_date >= to {
                break;
            }
            if entry.action_date > from {
                entries.push(entry);
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use segments_core::ManualClock;
    use tempfile::TempDir;

    fn create_test_store(cascade: CascadePolicy) -> (RocksStore, Arc<ManualClock>, TempDir) {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::default());
        let options = StoreOptions {
            cascade,
            clock: clock.clone(),
        };
        let store = RocksStore::open_with(dir.path(), options).unwrap();
        (store, clock, dir)
    }

    fn segment(store: &RocksStore, name: &str) -> SegmentName {
        let name = SegmentName::new(name);
        store.insert_segment(&name, None).unwrap();
        name
    }

    #[test]
    fn user_crud() {
        let (store, _clock, _dir) = create_test_store(CascadePolicy::Retain);

        // Create
        let alice = store.insert_user("alice").unwrap();
        let bob = store.insert_user("bob").unwrap();
        assert_eq!(alice.user_id, UserId::new(1));
        assert_eq!(bob.user_id, UserId::new(2));

        // Read
        let retrieved = store.get_user(alice.user_id).unwrap().unwrap();
        assert_eq!(retrieved.name, "alice");
        assert_eq!(
            store.list_all_user_ids().unwrap(),
            vec![alice.user_id, bob.user_id]
        );

        // Delete
        store.delete_user(alice.user_id).unwrap();
        assert!(store.get_user(alice.user_id).unwrap().is_none());
        assert!(matches!(
            store.delete_user(alice.user_id),
            Err(StoreError::NotFound)
        ));
        assert_eq!(store.list_all_user_ids().unwrap(), vec![bob.user_id]);
    }

    #[test]
    fn user_ids_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = RocksStore::open(dir.path()).unwrap();
            store.insert_user("first").unwrap();
        }
        let store = RocksStore::open(dir.path()).unwrap();
        let second = store.insert_user("second").unwrap();
        assert_eq!(second.user_id, UserId::new(2));
    }

    #[test]
    fn segment_crud() {
        let (store, _clock, _dir) = create_test_store(CascadePolicy::Retain);
        let name = SegmentName::new("Vip Users");

        let created = store
            .insert_segment(&name, Some("paying customers"))
            .unwrap();
        assert_eq!(created.name.as_str(), "VIP_USERS");
        assert_eq!(created.description.as_deref(), Some("paying customers"));

        assert!(matches!(
            store.insert_segment(&SegmentName::new("vip users"), None),
            Err(StoreError::AlreadyExists)
        ));

        let retrieved = store.get_segment(&name).unwrap().unwrap();
        assert_eq!(retrieved, created);

        store.delete_segment(&name).unwrap();
        assert!(store.get_segment(&name).unwrap().is_none());
        assert!(matches!(
            store.delete_segment(&name),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn upsert_keeps_one_row() {
        let (store, clock, _dir) = create_test_store(CascadePolicy::Retain);
        let user = store.insert_user("alice").unwrap();
        let vip = segment(&store, "vip");

        let first = store.upsert_membership(user.user_id, &vip, None).unwrap();
        clock.advance(Duration::minutes(5));
        let expire_at = clock.now() + Duration::hours(1);
        let second = store
            .upsert_membership(user.user_id, &vip, Some(expire_at))
            .unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.sequence, first.sequence);
        assert_eq!(second.expire_at, Some(expire_at));

        let stored = store.get_membership(user.user_id, &vip).unwrap().unwrap();
        assert_eq!(stored, second);
        assert_eq!(
            store.list_active_segment_names(user.user_id).unwrap(),
            vec![vip]
        );
    }

    #[test]
    fn active_names_follow_insertion_order() {
        let (store, clock, _dir) = create_test_store(CascadePolicy::Retain);
        let user = store.insert_user("alice").unwrap();
        let zeta = segment(&store, "zeta");
        let alpha = segment(&store, "alpha");
        let mid = segment(&store, "mid");

        for name in [&zeta, &alpha, &mid] {
            store.upsert_membership(user.user_id, name, None).unwrap();
            clock.advance(Duration::seconds(1));
        }
        // Re-upserting must not move the row to the end.
        store.upsert_membership(user.user_id, &zeta, None).unwrap();

        assert_eq!(
            store.list_active_segment_names(user.user_id).unwrap(),
            vec![zeta, alpha, mid]
        );
    }

    #[test]
    fn expired_memberships_are_not_active() {
        let (store, clock, _dir) = create_test_store(CascadePolicy::Retain);
        let user = store.insert_user("alice").unwrap();
        let forever = segment(&store, "forever");
        let later = segment(&store, "later");
        let past = segment(&store, "past");

        let now = clock.now();
        store.upsert_membership(user.user_id, &forever, None).unwrap();
        store
            .upsert_membership(user.user_id, &later, Some(now + Duration::hours(1)))
            .unwrap();
        store
            .upsert_membership(user.user_id, &past, Some(now - Duration::hours(1)))
            .unwrap();

        assert_eq!(
            store.list_active_segment_names(user.user_id).unwrap(),
            vec![forever.clone(), later]
        );

        clock.advance(Duration::hours(2));
        assert_eq!(
            store.list_active_segment_names(user.user_id).unwrap(),
            vec![forever]
        );

        // Expired rows stay in storage.
        assert!(store.get_membership(user.user_id, &past).unwrap().is_some());
    }

    #[test]
    fn delete_membership_writes_history() {
        let (store, clock, _dir) = create_test_store(CascadePolicy::Retain);
        let user = store.insert_user("alice").unwrap();
        let vip = segment(&store, "vip");

        let start = clock.now();
        clock.advance(Duration::seconds(1));
        store.upsert_membership(user.user_id, &vip, None).unwrap();
        clock.advance(Duration::seconds(1));
        store.delete_membership(user.user_id, &vip).unwrap();
        clock.advance(Duration::seconds(1));

        assert!(store.get_membership(user.user_id, &vip).unwrap().is_none());
        assert!(store.list_active_segment_names(user.user_id).unwrap().is_empty());

        let history = store
            .list_history(user.user_id, start, clock.now())
            .unwrap();
        let actions: Vec<_> = history.iter().map(|e| e.action_type).collect();
        assert_eq!(actions, vec![ActionType::Inserted, ActionType::Deleted]);
        assert!(history[0].action_date < history[1].action_date);

        assert!(matches!(
            store.delete_membership(user.user_id, &vip),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn history_window_is_exclusive() {
        let (store, clock, _dir) = create_test_store(CascadePolicy::Retain);
        let user = store.insert_user("alice").unwrap();
        let other = store.insert_user("bob").unwrap();
        let vip = segment(&store, "vip");

        store.upsert_membership(user.user_id, &vip, None).unwrap();
        let first_at = store
            .list_history(
                user.user_id,
                clock.now() - Duration::seconds(1),
                clock.now() + Duration::seconds(1),
            )
            .unwrap()[0]
            .action_date;

        clock.advance(Duration::seconds(10));
        store.upsert_membership(user.user_id, &vip, None).unwrap();
        let second_at = clock.now();
        store.upsert_membership(other.user_id, &vip, None).unwrap();

        // Both bounds are exclusive.
        assert!(store
            .list_history(user.user_id, first_at, second_at)
            .unwrap()
            .is_empty());

        let wide = store
            .list_history(
                user.user_id,
                first_at - Duration::seconds(1),
                second_at + Duration::seconds(1),
            )
            .unwrap();
        assert_eq!(wide.len(), 2);
        assert!(wide.iter().all(|e| e.user_id == user.user_id));

        // An empty or inverted window yields nothing.
        assert!(store
            .list_history(user.user_id, second_at, first_at)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn retain_policy_keeps_memberships() {
        let (store, _clock, _dir) = create_test_store(CascadePolicy::Retain);
        let user = store.insert_user("alice").unwrap();
        let vip = segment(&store, "vip");
        store.upsert_membership(user.user_id, &vip, None).unwrap();

        store.delete_segment(&vip).unwrap();
        store.delete_user(user.user_id).unwrap();

        assert!(store.get_membership(user.user_id, &vip).unwrap().is_some());
    }

    #[test]
    fn delete_policy_cascades() {
        let (store, clock, _dir) = create_test_store(CascadePolicy::Delete);
        let alice = store.insert_user("alice").unwrap();
        let bob = store.insert_user("bob").unwrap();
        let vip = segment(&store, "vip");
        let beta = segment(&store, "beta");

        let start = clock.now() - Duration::seconds(1);
        for user in [&alice, &bob] {
            store.upsert_membership(user.user_id, &vip, None).unwrap();
            store.upsert_membership(user.user_id, &beta, None).unwrap();
        }
        clock.advance(Duration::seconds(1));

        store.delete_segment(&vip).unwrap();
        assert!(store.get_membership(alice.user_id, &vip).unwrap().is_none());
        assert!(store.get_membership(bob.user_id, &vip).unwrap().is_none());
        assert_eq!(
            store.list_active_segment_names(alice.user_id).unwrap(),
            vec![beta.clone()]
        );

        store.delete_user(bob.user_id).unwrap();
        assert!(store.get_membership(bob.user_id, &beta).unwrap().is_none());
        assert!(store.get_membership(alice.user_id, &beta).unwrap().is_some());

        let bob_history = store
            .list_history(bob.user_id, start, clock.now() + Duration::seconds(1))
            .unwrap();
        let deleted = bob_history
            .iter()
            .filter(|e| e.action_type == ActionType::Deleted)
            .count();
        assert_eq!(deleted, 2);
    }
}
