//! Membership lifecycle, auto-assignment and queries for the segments service.
//!
//! This crate holds the business rules that sit between the HTTP gateway and
//! the store: TTL handling, removal auditing, batch reassignment, random
//! proportional enrollment and the active/history queries.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Gateway (HTTP)                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       SegmentService                        │
//! │  ┌───────────┐ ┌─────────────┐ ┌─────────────┐ ┌─────────┐  │
//! │  │ Directory │ │ Membership  │ │ Membership  │ │  Auto   │  │
//! │  │           │ │ Lifecycle   │ │ Query       │ │ Assign  │  │
//! │  └───────────┘ └─────────────┘ └─────────────┘ └─────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                       ┌─────────────┐
//!                       │    Store    │
//!                       │  (RocksDB)  │
//!                       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use segments_control::{Directory, MembershipLifecycle, MembershipQuery, SegmentService};
//! use segments_core::SegmentName;
//! use segments_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/segments")?);
//! let service = SegmentService::with_defaults(store);
//!
//! let user = service.create_user("alice").await?;
//! let vip = SegmentName::new("vip users");
//! service.create_segment(&vip, None).await?;
//! service.assign_with_ttl(user.user_id, &vip, 1).await?;
//!
//! let active = service.active_segments_for_user(user.user_id).await?;
//! println!("{active:?}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod auto_assign;
pub mod error;
pub mod lifecycle;
pub mod service;
pub mod types;

pub use error::{ControlError, Result};
pub use service::{
    AutoAssign, Directory, MembershipLifecycle, MembershipQuery, SegmentService, SegmentsApi,
};
pub use types::{ControlConfig, Enrollment, Reassignment};

// Re-export commonly used types from dependencies for convenience
pub use segments_core::{ErrorKind, SegmentName, UserId};
pub use segments_store::{ActionType, HistoryEntry, Membership, Segment, User};
