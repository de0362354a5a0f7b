//! Gateway application state.
//!
//! This module defines the shared state that is available to all request handlers.

use std::sync::Arc;

use segments_control::SegmentsApi;
use segments_core::NamePolicy;

use crate::config::GatewayConfig;

/// Shared application state for the gateway.
///
/// This struct holds references to all services needed by the HTTP handlers.
pub struct GatewayState<C>
where
    C: SegmentsApi,
{
    /// The segment service.
    pub control: Arc<C>,
    /// Length limits applied to request fields.
    pub policy: NamePolicy,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl<C> GatewayState<C>
where
    C: SegmentsApi,
{
    /// Create a new gateway state.
    #[must_use]
    pub fn new(control: Arc<C>, policy: NamePolicy, config: GatewayConfig) -> Self {
        Self {
            control,
            policy,
            config,
        }
    }
}

impl<C> Clone for GatewayState<C>
where
    C: SegmentsApi,
{
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
            policy: self.policy.clone(),
            config: self.config.clone(),
        }
    }
}
