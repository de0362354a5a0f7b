//! HTTP gateway for the segments service.
//!
//! This crate provides the public-facing API for users, segments and
//! memberships. It handles:
//!
//! - REST HTTP endpoints backed by the segment service
//! - Request validation against the naming policy
//! - CSV export of membership history
//! - Configuration loading and request tracing
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Clients                            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      segments-gateway                       │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐    │
//! │  │  Request    │ │   Router    │ │    CSV report       │    │
//! │  │  validation │ │  + Handlers │ │                     │    │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//!                     ┌─────────────────┐
//!                     │ SegmentService  │
//!                     └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use segments_gateway::{GatewayConfig, GatewayState, create_router};
//! use segments_control::SegmentService;
//! use segments_core::NamePolicy;
//! use segments_store::RocksStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("/tmp/segments")?);
//! let control = Arc::new(SegmentService::with_defaults(store));
//!
//! let config = GatewayConfig::default();
//! let state = GatewayState::new(control, NamePolicy::default(), config);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod report;
pub mod routes;
pub mod state;

pub use config::{ConfigError, GatewayConfig, LogFormat};
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;
