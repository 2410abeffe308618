//! Hit resolution, mitigation, damage and healing.
//!
//! Pure formulas (hit tables, armor, resistance) live in their own modules
//! and take [`CombatTables`](crate::env::CombatTables) explicitly. The world
//! entry points that use them are `melee_attack`, `spell_damage`,
//! `deal_damage` and `heal`.
mod absorb;
mod armor;
mod death;
mod heal;
mod hit;
mod info;
mod melee;
mod outcome;
mod pipeline;
mod resist;
mod school;
mod spell;

pub use armor::{armor_mitigation_bp, mitigated_amount};
pub use hit::{
    MeleeHitTable, avoidance_chance, crushing_chance, glancing_chance, melee_miss_chance,
    spell_miss_chance,
};
pub use info::{DamageFlags, DamageInfo, DamageKind, DamageResult, DamageStage, HealInfo, HealResult};
pub use outcome::{HitInfo, HitOutcome};
pub use resist::{RESIST_BUCKETS, average_resist_permille, resist_distribution, sample_resist};
pub use school::{SchoolMask, SpellSchool};
