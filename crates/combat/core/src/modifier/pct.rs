/// Fixed-point multiplier where 10 000 means ×1.0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PctChain(pub u32);

impl PctChain {
    pub const ONE: Self = Self(10_000);

    /// Creates a chain from a plain percentage (100 = ×1.0).
    pub const fn from_pct(pct: u32) -> Self {
        Self(pct.saturating_mul(100))
    }

    /// Multiplies in `(100 + pct)%`, flooring at zero.
    pub fn then_pct(self, pct: i32) -> Self {
        let factor = (100 + i64::from(pct)).max(0) as u64;
        let value = u64::from(self.0) * factor / 100;
        Self(value.min(u64::from(u32::MAX)) as u32)
    }

    /// Multiplies two chains.
    pub fn then(self, other: PctChain) -> Self {
        let value = u64::from(self.0) * u64::from(other.0) / 10_000;
        Self(value.min(u64::from(u32::MAX)) as u32)
    }

    pub fn apply(self, amount: u32) -> u32 {
        let value = u64::from(amount) * u64::from(self.0) / 10_000;
        value.min(u64::from(u32::MAX)) as u32
    }

    pub fn is_one(self) -> bool {
        self == Self::ONE
    }
}

impl Default for PctChain {
    fn default() -> Self {
        Self::ONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_floors_at_zero() {
        assert_eq!(PctChain::ONE.then_pct(-150), PctChain(0));
        assert_eq!(PctChain::ONE.then_pct(20).then_pct(50).apply(100), 180);
        assert_eq!(PctChain::from_pct(150).apply(80), 120);
    }
}
