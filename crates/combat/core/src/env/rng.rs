//! Seeded randomness for hit rolls, damage ranges and proc chances.
//!
//! Rolls never carry hidden state: each one is a pure function of a seed
//! derived from the world seed, a roll counter, the acting unit and the roll
//! purpose. Replaying the same inputs replays the same fight.

/// RNG oracle for deterministic random number generation.
///
/// Implementations must be deterministic and produce the same values
/// given the same seed.
pub trait RngOracle: Send + Sync {
    fn next_u32(&self, seed: u64) -> u32;

    /// Roll in basis points, `0..10_000`.
    ///
    /// Compare with `<` against a chance in basis points.
    fn roll_bp(&self, seed: u64) -> u32 {
        self.next_u32(seed) % 10_000
    }

    /// Roll a d100 (1-100 inclusive).
    fn roll_d100(&self, seed: u64) -> u32 {
        (self.next_u32(seed) % 100) + 1
    }

    /// Generate a random value in range [min, max] inclusive.
    fn range(&self, seed: u64, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let range = max - min + 1;
        min + (self.next_u32(seed) % range)
    }
}

/// PCG-XSH-RR generator: one LCG step followed by an xorshift and a
/// random rotate.
#[derive(Clone, Copy, Debug, Default)]
pub struct PcgRng;

impl PcgRng {
    const MULTIPLIER: u64 = 6364136223846793005;
    const INCREMENT: u64 = 1442695040888963407;

    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }
}

impl RngOracle for PcgRng {
    fn next_u32(&self, seed: u64) -> u32 {
        Self::pcg_output(Self::pcg_step(seed))
    }
}

/// Purpose tags mixed into a roll seed so two rolls in one resolution
/// stay independent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollContext {
    HitTable = 0,
    Damage = 1,
    Crit = 2,
    Resist = 3,
    Proc = 4,
    Loot = 5,
}

/// Combines the world seed, the roll counter, the acting unit and the roll
/// purpose into one seed.
pub fn compute_seed(world_seed: u64, nonce: u64, actor_id: u32, context: RollContext) -> u64 {
    let mut hash = world_seed;
    hash ^= nonce.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= (actor_id as u64).wrapping_mul(0x517cc1b727220a95);
    hash ^= (context as u64).wrapping_mul(0x85ebca6b);

    // avalanche
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolls_are_reproducible() {
        let rng = PcgRng;
        let seed = compute_seed(42, 7, 3, RollContext::HitTable);
        assert_eq!(rng.roll_bp(seed), rng.roll_bp(seed));
        assert!(rng.roll_bp(seed) < 10_000);
    }

    #[test]
    fn contexts_decorrelate_seeds() {
        let hit = compute_seed(42, 7, 3, RollContext::HitTable);
        let crit = compute_seed(42, 7, 3, RollContext::Crit);
        assert_ne!(hit, crit);
    }

    #[test]
    fn range_is_inclusive() {
        let rng = PcgRng;
        for nonce in 0..200 {
            let value = rng.range(compute_seed(1, nonce, 1, RollContext::Damage), 10, 12);
            assert!((10..=12).contains(&value));
        }
        assert_eq!(rng.range(0, 50, 50), 50);
    }
}
