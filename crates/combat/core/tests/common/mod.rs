#![allow(dead_code)]

use combat_core::{
    AttackType, CombatEnv, CombatEvent, CombatStats, CombatTables, ItemId, LootItem, LootOracle,
    LootRequest, Millis, RngOracle, SpecialTable, SpellTemplate, TemplateCatalog, UnitFlags,
    UnitSpec, WeaponProfile,
};

/// Rng double that answers every roll with the same value.
#[derive(Clone, Copy, Debug)]
pub struct FixedRng(pub u32);

impl RngOracle for FixedRng {
    fn next_u32(&self, _seed: u64) -> u32 {
        self.0
    }
}

/// Loot roller that always drops one item.
#[derive(Clone, Copy, Debug)]
pub struct OneItemLoot(pub ItemId);

impl LootOracle for OneItemLoot {
    fn fill(&self, _request: &LootRequest) -> Vec<LootItem> {
        vec![LootItem {
            item: self.0,
            count: 1,
        }]
    }
}

/// Owns every oracle a scenario needs and lends them out as a [`CombatEnv`].
pub struct Harness {
    pub catalog: TemplateCatalog,
    pub tables: CombatTables,
    pub rng: FixedRng,
    pub specials: SpecialTable,
    pub loot: OneItemLoot,
}

impl Harness {
    /// Scripted tables (no random misses, glancing or crushing blows) and
    /// rolls that never pass a chance below 100%.
    pub fn new(templates: impl IntoIterator<Item = SpellTemplate>) -> Self {
        Self {
            catalog: templates.into_iter().collect(),
            tables: CombatTables::deterministic(),
            rng: FixedRng(9_999),
            specials: SpecialTable::new(),
            loot: OneItemLoot(ItemId(7)),
        }
    }

    pub fn with_specials(mut self, specials: SpecialTable) -> Self {
        self.specials = specials;
        self
    }

    pub fn env(&self) -> CombatEnv<'_> {
        CombatEnv::new(&self.catalog, &self.tables, &self.rng)
            .with_specials(&self.specials)
            .with_loot(&self.loot)
    }
}

/// Player without avoidance, swinging a fixed-damage weapon.
pub fn player(level: u8, health: u32, weapon_damage: u32) -> UnitSpec {
    UnitSpec::player(level, health)
        .with_flags(UnitFlags::PLAYER_CONTROLLED)
        .with_stats(fixed_weapon(weapon_damage))
}

/// Non-player without avoidance, swinging a fixed-damage weapon.
pub fn creature(level: u8, health: u32, weapon_damage: u32) -> UnitSpec {
    UnitSpec::new(level, health)
        .with_flags(UnitFlags::empty())
        .with_stats(fixed_weapon(weapon_damage))
}

fn fixed_weapon(damage: u32) -> CombatStats {
    CombatStats::default().with_weapon(
        AttackType::MainHand,
        WeaponProfile::fixed(damage, Millis(2000)),
    )
}

pub fn count(events: &[CombatEvent], pred: impl Fn(&CombatEvent) -> bool) -> usize {
    events.iter().filter(|event| pred(event)).count()
}
