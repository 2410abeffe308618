//! Seeded loot tables.

use combat_core::{ItemId, LootItem, LootOracle, LootRequest, PcgRng, RngOracle};

/// One possible drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LootEntry {
    pub item: ItemId,
    /// Percent chance to drop; 100 always drops.
    pub chance_pct: u8,
    pub min_count: u32,
    pub max_count: u32,
}

/// Flat loot table shared by every non-player unit.
///
/// Each entry rolls independently from the request's seed, so the same
/// death always yields the same items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LootTable {
    pub entries: Vec<LootEntry>,
}

impl LootTable {
    pub fn new(entries: Vec<LootEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LootOracle for LootTable {
    fn fill(&self, request: &LootRequest) -> Vec<LootItem> {
        let rng = PcgRng;
        let mut items = Vec::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let seed = request.roll_seed.wrapping_add(index as u64);
            if entry.chance_pct < 100 && rng.roll_d100(seed) > u32::from(entry.chance_pct) {
                continue;
            }
            let count = rng.range(seed.rotate_left(17), entry.min_count, entry.max_count);
            if count > 0 {
                items.push(LootItem {
                    item: entry.item,
                    count,
                });
            }
        }
        tracing::trace!(source = %request.source, looter = %request.looter, drops = items.len(), "loot rolled");
        items
    }
}
