//! Hit tables.
//!
//! A melee attack is resolved by a single roll in `0..10_000` walked over a
//! cumulative list of outcome chances. The first threshold the roll falls
//! under wins, so outcomes early in the list push later ones off the table
//! once the chances sum past 100%.

use crate::env::CombatTables;

use super::HitOutcome;

/// Outcome chances for one melee attack, in basis points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeleeHitTable {
    pub miss: u32,
    /// Every landed hit becomes a crit (checked right after miss).
    pub auto_crit: bool,
    pub dodge: u32,
    pub parry: u32,
    pub block: u32,
    pub crit: u32,
    pub glancing: u32,
    pub crushing: u32,
}

impl MeleeHitTable {
    pub fn roll(&self, roll: u32) -> HitOutcome {
        let mut threshold = self.miss;
        if roll < threshold {
            return HitOutcome::Miss;
        }
        if self.auto_crit {
            return HitOutcome::Crit;
        }

        let ordered = [
            (self.dodge, HitOutcome::Dodge),
            (self.parry, HitOutcome::Parry),
            (self.block, HitOutcome::Block),
            (self.crit, HitOutcome::Crit),
            (self.glancing, HitOutcome::Glancing),
            (self.crushing, HitOutcome::Crushing),
        ];
        for (chance, outcome) in ordered {
            threshold = threshold.saturating_add(chance);
            if roll < threshold {
                return outcome;
            }
        }
        HitOutcome::Normal
    }
}

/// Base melee miss chance adjusted by skill difference and hit bonuses.
pub fn melee_miss_chance(
    tables: &CombatTables,
    weapon_skill: i32,
    defense_skill: i32,
    hit_bonus_bp: i32,
) -> u32 {
    let skill_delta = (defense_skill - weapon_skill) * tables.skill_factor_bp as i32;
    clamp_bp((tables.melee_base_miss_bp as i32 + skill_delta).saturating_sub(hit_bonus_bp))
}

/// Shifts an avoidance chance (dodge, parry, block) by the skill difference.
pub fn avoidance_chance(
    tables: &CombatTables,
    base_bp: i32,
    weapon_skill: i32,
    defense_skill: i32,
) -> u32 {
    let skill_delta = (defense_skill - weapon_skill) * tables.skill_factor_bp as i32;
    clamp_bp(base_bp + skill_delta)
}

/// Glancing blows: player auto-attacks against higher-level non-players.
pub fn glancing_chance(tables: &CombatTables, attacker_level: u8, victim_level: u8) -> u32 {
    if victim_level <= attacker_level {
        return 0;
    }
    let diff = u32::from(victim_level - attacker_level);
    (tables.glancing_base_bp + tables.glancing_per_level_bp * (diff - 1)).min(10_000)
}

/// Crushing blows: NPC attackers far enough above the victim's defense.
pub fn crushing_chance(tables: &CombatTables, weapon_skill: i32, defense_skill: i32) -> u32 {
    let lead = weapon_skill - defense_skill;
    if lead < tables.crushing_skill_threshold {
        return 0;
    }
    clamp_bp(lead * tables.crushing_per_skill_bp as i32 - tables.crushing_skill_threshold * 100)
}

/// Spell miss chance: level-based, reduced by hit bonuses, never below the floor.
pub fn spell_miss_chance(
    tables: &CombatTables,
    caster_level: u8,
    victim_level: u8,
    hit_bonus_bp: i32,
) -> u32 {
    let level_gap = i32::from(victim_level) - i32::from(caster_level);
    let base = tables.spell_base_miss_bp as i32
        + level_gap.max(0) * tables.spell_miss_per_level_bp as i32;
    clamp_bp(base.saturating_sub(hit_bonus_bp)).max(tables.spell_miss_floor_bp)
}

fn clamp_bp(value: i32) -> u32 {
    value.clamp(0, 10_000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_threshold_wins() {
        let table = MeleeHitTable {
            miss: 500,
            dodge: 500,
            parry: 500,
            crit: 1000,
            ..MeleeHitTable::default()
        };
        assert_eq!(table.roll(0), HitOutcome::Miss);
        assert_eq!(table.roll(499), HitOutcome::Miss);
        assert_eq!(table.roll(500), HitOutcome::Dodge);
        assert_eq!(table.roll(1000), HitOutcome::Parry);
        assert_eq!(table.roll(1500), HitOutcome::Crit);
        assert_eq!(table.roll(2500), HitOutcome::Normal);
    }

    #[test]
    fn auto_crit_follows_miss() {
        let table = MeleeHitTable {
            miss: 100,
            dodge: 9000,
            auto_crit: true,
            ..MeleeHitTable::default()
        };
        assert_eq!(table.roll(50), HitOutcome::Miss);
        assert_eq!(table.roll(150), HitOutcome::Crit);
    }

    #[test]
    fn saturated_table_pushes_later_outcomes_off() {
        let table = MeleeHitTable {
            miss: 6000,
            dodge: 6000,
            crit: 5000,
            ..MeleeHitTable::default()
        };
        for roll in (0..10_000).step_by(97) {
            assert_ne!(table.roll(roll), HitOutcome::Crit);
        }
    }

    #[test]
    fn spell_miss_has_floor() {
        let tables = CombatTables::new();
        assert_eq!(spell_miss_chance(&tables, 60, 60, 2_000), 100);
        assert_eq!(spell_miss_chance(&tables, 60, 63, 0), 700);
    }

    #[test]
    fn extreme_hit_bonuses_clamp() {
        let tables = CombatTables::new();
        let huge = i32::MAX.saturating_mul(100);
        assert_eq!(melee_miss_chance(&tables, 300, 300, huge), 0);
        assert_eq!(melee_miss_chance(&tables, 300, 300, i32::MIN), 10_000);
        assert_eq!(spell_miss_chance(&tables, 60, 60, huge), tables.spell_miss_floor_bp);
        assert_eq!(spell_miss_chance(&tables, 60, 60, i32::MIN), 10_000);
    }

    #[test]
    fn glancing_and_crushing_bounds() {
        let tables = CombatTables::new();
        assert_eq!(glancing_chance(&tables, 60, 60), 0);
        assert_eq!(glancing_chance(&tables, 60, 63), 2000);
        assert_eq!(crushing_chance(&tables, 315, 300), 1500);
        assert_eq!(crushing_chance(&tables, 310, 300), 0);
    }
}
