use crate::state::{ItemId, UnitId};

/// Loot-table roller. Death of a non-player unit triggers exactly one
/// fill request.
pub trait LootOracle: Send + Sync {
    fn fill(&self, request: &LootRequest) -> Vec<LootItem>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LootRequest {
    pub source: UnitId,
    pub looter: UnitId,
    /// Seed for the loot roll.
    pub roll_seed: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LootItem {
    pub item: ItemId,
    pub count: u32,
}
