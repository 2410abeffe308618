//! Armor mitigation.
//!
//! `mitigation = armor / (armor + base + per_level * attacker_level)`,
//! capped. The curve has smooth diminishing returns: every extra point of
//! armor is worth a little less than the previous one.

use crate::env::CombatTables;

/// Fraction of physical damage removed by armor, in basis points.
///
/// Always in `0..=armor_cap_bp`. Non-positive armor and a degenerate
/// denominator both yield zero.
pub fn armor_mitigation_bp(tables: &CombatTables, armor: i32, attacker_level: u8) -> u32 {
    if armor <= 0 {
        return 0;
    }
    let armor = i64::from(armor);
    let denominator = armor + tables.armor_base + tables.armor_per_level * i64::from(attacker_level);
    if denominator <= 0 {
        return 0;
    }
    let mitigation = (armor * 10_000 / denominator).clamp(0, 10_000) as u32;
    mitigation.min(tables.armor_cap_bp)
}

/// Damage removed from `damage` at `mitigation_bp`.
///
/// At least one point always gets through when `damage` is positive.
pub fn mitigated_amount(damage: u32, mitigation_bp: u32) -> u32 {
    if damage == 0 {
        return 0;
    }
    let reduced = (u64::from(damage) * u64::from(mitigation_bp) / 10_000) as u32;
    reduced.min(damage - 1)
}
