//! Core types and utilities for the segments service.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - **Identifiers**: `UserId` and the always-canonical `SegmentName`
//! - **Naming policy**: segment name canonicalization and length limits
//! - **Clock**: an injectable time source so expiry can be tested
//! - **Error types**: the error taxonomy shared across crates
//!
//! # Example
//!
//! ```
//! use segments_core::{SegmentName, UserId};
//!
//! let user_id: UserId = "7".parse().unwrap();
//! let segment = SegmentName::new("Vip Users");
//!
//! assert_eq!(user_id.get(), 7);
//! assert_eq!(segment.as_str(), "VIP_USERS");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod clock;
pub mod error;
pub mod ids;
pub mod policy;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, ErrorKind, Result};
pub use ids::{IdError, SegmentName, UserId};
pub use policy::{canonicalize_segment_name, NamePolicy, PolicyViolation};
