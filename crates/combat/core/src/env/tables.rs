/// Oracle providing balance tables for hit resolution and mitigation.
///
/// This oracle defines the numbers behind combat formulas. It does NOT define
/// spell data (use [`TemplateOracle`](super::TemplateOracle) for that).
pub trait TablesOracle: Send + Sync {
    fn tables(&self) -> &CombatTables;
}

/// Balance parameters. Chances are basis points, multipliers are percents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatTables {
    // ===== armor =====
    /// Constant term of the armor denominator.
    pub armor_base: i64,
    /// Attacker-level term of the armor denominator.
    pub armor_per_level: i64,
    /// Hard cap on armor mitigation.
    pub armor_cap_bp: u32,

    // ===== melee hit table =====
    pub melee_base_miss_bp: u32,
    /// Chance change per point of defense-vs-weapon skill difference.
    pub skill_factor_bp: u32,
    pub melee_crit_pct: u32,
    pub glancing_base_bp: u32,
    pub glancing_per_level_bp: u32,
    /// Damage dealt by a glancing blow.
    pub glancing_damage_pct: u32,
    /// Weapon-vs-defense skill lead required before crushing blows start.
    pub crushing_skill_threshold: i32,
    pub crushing_per_skill_bp: u32,
    pub crushing_damage_pct: u32,

    // ===== spells =====
    pub spell_base_miss_bp: u32,
    pub spell_miss_per_level_bp: u32,
    pub spell_miss_floor_bp: u32,
    pub spell_crit_pct: u32,
    pub heal_crit_pct: u32,

    // ===== resistance =====
    /// Level multiplier of the resistance constant.
    pub resist_per_level: i32,
    /// Upper bound on average resistance, per mille.
    pub resist_cap_permille: u32,
}

impl CombatTables {
    pub const fn new() -> Self {
        Self {
            armor_base: 400,
            armor_per_level: 85,
            armor_cap_bp: 7500,
            melee_base_miss_bp: 500,
            skill_factor_bp: 4,
            melee_crit_pct: 200,
            glancing_base_bp: 1000,
            glancing_per_level_bp: 500,
            glancing_damage_pct: 75,
            crushing_skill_threshold: 15,
            crushing_per_skill_bp: 200,
            crushing_damage_pct: 150,
            spell_base_miss_bp: 400,
            spell_miss_per_level_bp: 100,
            spell_miss_floor_bp: 100,
            spell_crit_pct: 150,
            heal_crit_pct: 150,
            resist_per_level: 5,
            resist_cap_permille: 750,
        }
    }

    /// Tables with every random miss removed; handy for scripted fights.
    pub const fn deterministic() -> Self {
        let mut tables = Self::new();
        tables.melee_base_miss_bp = 0;
        tables.spell_base_miss_bp = 0;
        tables.spell_miss_per_level_bp = 0;
        tables.spell_miss_floor_bp = 0;
        tables.glancing_base_bp = 0;
        tables.glancing_per_level_bp = 0;
        tables.crushing_per_skill_bp = 0;
        tables
    }
}

impl Default for CombatTables {
    fn default() -> Self {
        Self::new()
    }
}

impl TablesOracle for CombatTables {
    fn tables(&self) -> &CombatTables {
        self
    }
}
