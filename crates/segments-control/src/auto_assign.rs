//! Proportional random selection of users.
//!
//! Every candidate is drawn independently: a user is picked when a uniform
//! draw from `[0, 100)` falls below `percent`. The size of the result is only
//! expected to approach `percent` of the population, it is not exact.

use rand::Rng;
use segments_core::UserId;

use crate::error::{ControlError, Result};

/// Message returned for a percent outside the accepted range.
pub const WRONG_PERCENT: &str = "wrong percent value";

/// Select a random subset of `ids`, keeping their order.
///
/// A `percent` of zero or below selects nobody without touching `rng`;
/// a `percent` of 100 selects everybody.
///
/// # Errors
///
/// Returns `ControlError::InvalidArgument` if `percent` is above 100 or NaN.
pub fn pick_random_ids<R: Rng>(
    rng: &mut R,
    percent: f64,
    ids: &[UserId],
) -> Result<Vec<UserId>> {
    if percent.is_nan() || percent > 100.0 {
        return Err(ControlError::InvalidArgument(WRONG_PERCENT.to_string()));
    }
    if percent <= 0.0 {
        return Ok(Vec::new());
    }

    Ok(ids
        .iter()
        .copied()
        .filter(|_| rng.gen_range(0.0..100.0) < percent)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ids(n: i64) -> Vec<UserId> {
        (1..=n).map(UserId::new).collect()
    }

    #[test]
    fn bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let all = ids(50);

        assert!(pick_random_ids(&mut rng, 0.0, &all).unwrap().is_empty());
        assert!(pick_random_ids(&mut rng, -5.0, &all).unwrap().is_empty());
        assert_eq!(pick_random_ids(&mut rng, 100.0, &all).unwrap(), all);
    }

    #[test]
    fn out_of_range_percent_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        for percent in [150.0, 100.5, f64::NAN] {
            let err = pick_random_ids(&mut rng, percent, &ids(3)).unwrap_err();
            assert_eq!(err.to_string(), WRONG_PERCENT);
        }
    }

    #[test]
    fn selection_is_ordered_subset() {
        let mut rng = StdRng::seed_from_u64(7);
        let all = ids(1000);
        let picked = pick_random_ids(&mut rng, 30.0, &all).unwrap();

        assert!(picked.windows(2).all(|w| w[0] < w[1]));
        assert!(picked.iter().all(|id| all.contains(id)));
        // 1000 Bernoulli(0.3) draws stay well inside this band.
        assert!((200..400).contains(&picked.len()), "picked {}", picked.len());
    }

    #[test]
    fn same_seed_same_selection() {
        let all = ids(200);
        let a = pick_random_ids(&mut StdRng::seed_from_u64(99), 50.0, &all).unwrap();
        let b = pick_random_ids(&mut StdRng::seed_from_u64(99), 50.0, &all).unwrap();
        assert_eq!(a, b);
    }
}
