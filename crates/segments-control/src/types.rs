//! Configuration and result types for segment service operations.

use segments_core::{NamePolicy, SegmentName, UserId};
use serde::{Deserialize, Serialize};

/// Configuration for the segment service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControlConfig {
    /// Length limits for names and descriptions.
    #[serde(default)]
    pub policy: NamePolicy,
    /// Seed for the auto-assignment random source; `None` seeds from entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl ControlConfig {
    /// Configuration with a fixed random seed, for reproducible assignment.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng_seed: Some(seed),
            ..Self::default()
        }
    }
}

/// The segments to drop and add in one batch reassignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reassignment {
    /// Segments to join indefinitely, applied after the removals.
    #[serde(default)]
    pub to_add: Vec<SegmentName>,
    /// Segments to leave, applied first.
    #[serde(default)]
    pub to_delete: Vec<SegmentName>,
}

/// Outcome of a proportional auto-assignment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    /// The segment users were enrolled into.
    pub segment: SegmentName,
    /// The users selected and assigned, in the order they were considered.
    pub assigned: Vec<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_config_defaults() {
        let config = ControlConfig::default();
        assert_eq!(config.policy.max_description_len, 65_536);
        assert!(config.rng_seed.is_none());
        assert_eq!(ControlConfig::seeded(42).rng_seed, Some(42));
    }

    #[test]
    fn reassignment_canonicalizes_names() {
        let json = r#"{"to_add": ["vip users"], "to_delete": ["Beta Testers"]}"#;
        let req: Reassignment = serde_json::from_str(json).unwrap();
        assert_eq!(req.to_add[0].as_str(), "VIP_USERS");
        assert_eq!(req.to_delete[0].as_str(), "BETA_TESTERS");

        let empty: Reassignment = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, Reassignment::default());
    }
}
