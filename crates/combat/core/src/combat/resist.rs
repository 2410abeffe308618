//! Partial resistance for magic damage.
//!
//! The victim's resistance against the attacker's level gives an average
//! resisted fraction. Each hit samples one of eleven buckets (0%, 10%, ...,
//! 100%) from a triangular distribution centred on that average.

use crate::env::CombatTables;

pub const RESIST_BUCKETS: usize = 11;

/// Average resisted fraction in per mille, capped by the tables.
pub fn average_resist_permille(tables: &CombatTables, resistance: i32, attacker_level: u8) -> u32 {
    if resistance <= 0 {
        return 0;
    }
    let constant = (tables.resist_per_level * i32::from(attacker_level.max(1))).max(1);
    let ratio = i64::from(resistance) * i64::from(tables.resist_cap_permille) / i64::from(constant);
    (ratio.max(0) as u32).min(tables.resist_cap_permille)
}

/// Bucket weights for an average in per mille.
///
/// A zero average puts all weight on the 0% bucket.
pub fn resist_distribution(average_permille: u32) -> [u32; RESIST_BUCKETS] {
    let mut weights = [0u32; RESIST_BUCKETS];
    if average_permille == 0 {
        weights[0] = 1;
        return weights;
    }
    let average = average_permille as i64;
    for (bucket, weight) in weights.iter_mut().enumerate() {
        let distance = (bucket as i64 * 100 - average).abs();
        *weight = (5_000 - 25 * distance).max(0) as u32;
    }
    if weights.iter().all(|w| *w == 0) {
        weights[0] = 1;
    }
    weights
}

/// Picks a bucket with a roll in `0..10_000`; returns the resisted percent.
pub fn sample_resist(weights: &[u32; RESIST_BUCKETS], roll_bp: u32) -> u32 {
    let total: u64 = weights.iter().map(|w| u64::from(*w)).sum();
    if total == 0 {
        return 0;
    }
    let target = u64::from(roll_bp.min(9_999)) * total / 10_000;
    let mut cumulative = 0u64;
    for (bucket, weight) in weights.iter().enumerate() {
        cumulative += u64::from(*weight);
        if target < cumulative {
            return bucket as u32 * 10;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_resistance_never_resists() {
        let tables = CombatTables::new();
        assert_eq!(average_resist_permille(&tables, 0, 60), 0);
        let weights = resist_distribution(0);
        for roll in (0..10_000).step_by(113) {
            assert_eq!(sample_resist(&weights, roll), 0);
        }
    }

    #[test]
    fn average_is_capped() {
        let tables = CombatTables::new();
        assert_eq!(average_resist_permille(&tables, 10_000, 60), 750);
        assert_eq!(average_resist_permille(&tables, 150, 60), 375);
    }

    #[test]
    fn capped_average_never_fully_resists() {
        let weights = resist_distribution(750);
        assert_eq!(weights[10], 0);
        for roll in 0..10_000 {
            assert!(sample_resist(&weights, roll) <= 90);
        }
    }

    #[test]
    fn distribution_centres_on_average() {
        let weights = resist_distribution(500);
        let peak = weights
            .iter()
            .enumerate()
            .max_by_key(|(_, w)| **w)
            .map(|(bucket, _)| bucket);
        assert_eq!(peak, Some(5));
        assert_eq!(weights[3], weights[7]);
    }
}
