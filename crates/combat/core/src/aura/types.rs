//! Aura type catalog and the enums describing aura lifecycle.

use std::sync::LazyLock;

use strum::{EnumCount, EnumIter, IntoEnumIterator, IntoStaticStr};

/// What an applied aura effect does while active.
///
/// The aura type is the key of every store index and of every modifier
/// aggregation: "sum all `ModDamagePercentTaken` effects matching FIRE".
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter, IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuraType {
    /// Placeholder; no behavior, can only be given meaning by the special-case table.
    Dummy,

    // ========================================================================
    // Periodic
    // ========================================================================
    /// Deals `amount` damage of the aura's school every `amplitude`.
    PeriodicDamage,
    /// Heals `amount` every `amplitude`.
    PeriodicHeal,
    /// Restores `amount` of the power type in `misc_value` every `amplitude`.
    PeriodicEnergize,

    // ========================================================================
    // Damage / healing modifiers (misc_value = school mask)
    // ========================================================================
    ModDamageDone,
    ModDamagePercentDone,
    ModDamageTaken,
    ModDamagePercentTaken,
    ModHealingDone,
    ModHealingPercentTaken,

    // ========================================================================
    // Defensive stats
    // ========================================================================
    /// Flat resistance; misc_value = school mask, physical resistance is armor.
    ModResistance,
    ModDodgePercent,
    ModParryPercent,
    ModBlockPercent,
    /// Chance to deflect ranged attacks.
    ModDeflectChance,
    /// Crit chance granted to attackers of the holder.
    ModAttackerCritChance,
    /// Every melee hit against the holder is a critical strike.
    ModAutoCritTaken,

    // ========================================================================
    // Offensive stats
    // ========================================================================
    ModCritPercent,
    ModSpellCritChance,
    ModHitChance,
    ModSpellHitChance,

    // ========================================================================
    // Shields and redirection
    // ========================================================================
    /// Absorbs `amount` damage of the schools in misc_value.
    SchoolAbsorb,
    /// Absorbs damage by draining the holder's mana at a declared ratio.
    ManaShield,
    /// Absorbs incoming healing.
    SchoolHealAbsorb,
    /// Redirects `amount` percent of matching damage to the aura's caster.
    SplitDamagePct,
    /// Deals `amount` damage back to every melee attacker.
    DamageShield,

    // ========================================================================
    // Immunities
    // ========================================================================
    /// misc_value = school mask.
    SchoolImmunity,
    /// misc_value = mechanic.
    MechanicImmunity,

    // ========================================================================
    // Control states
    // ========================================================================
    ModStun,
    ModRoot,
    ModConfuse,
    ModSilence,
    Mounted,

    // ========================================================================
    // Stats
    // ========================================================================
    ModIncreaseHealth,

    // ========================================================================
    // Spell modifiers (misc_value = SpellModOp, affect_mask = spell family)
    // ========================================================================
    AddFlatModifier,
    AddPctModifier,

    // ========================================================================
    // Reactive
    // ========================================================================
    /// Casts `trigger_spell` when the aura procs.
    ProcTriggerSpell,
    /// Deals `amount` damage to the other party when the aura procs.
    ProcTriggerDamage,
    /// Adds a stack to itself when the aura procs.
    AddStackOnProc,
}

impl AuraType {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Whether an effect of this type reacts to combat events at all.
    ///
    /// Read through [`can_trigger_procs`], which caches the answer in a
    /// table indexed by aura type.
    const fn triggers_procs(self) -> bool {
        matches!(
            self,
            AuraType::Dummy
                | AuraType::ProcTriggerSpell
                | AuraType::ProcTriggerDamage
                | AuraType::AddStackOnProc
                | AuraType::ModDamageDone
                | AuraType::ModDamagePercentDone
                | AuraType::SchoolAbsorb
                | AuraType::ModResistance
                | AuraType::ModCritPercent
                | AuraType::ModSpellCritChance
        )
    }

    /// Whether the effect is driven by a periodic timer.
    pub const fn is_periodic(self) -> bool {
        matches!(
            self,
            AuraType::PeriodicDamage | AuraType::PeriodicHeal | AuraType::PeriodicEnergize
        )
    }

    /// Whether the amount scales with the stack count.
    pub const fn scales_with_stacks(self) -> bool {
        !matches!(
            self,
            AuraType::SchoolAbsorb
                | AuraType::ManaShield
                | AuraType::SchoolHealAbsorb
                | AuraType::ModStun
                | AuraType::ModRoot
                | AuraType::ModConfuse
                | AuraType::ModSilence
                | AuraType::Mounted
                | AuraType::SchoolImmunity
                | AuraType::MechanicImmunity
                | AuraType::ModAutoCritTaken
        )
    }
}

static PROC_TRIGGER_TABLE: LazyLock<[bool; AuraType::COUNT]> = LazyLock::new(|| {
    let mut table = [false; AuraType::COUNT];
    for aura_type in AuraType::iter() {
        table[aura_type.index()] = aura_type.triggers_procs();
    }
    table
});

/// Looks up whether `aura_type` can react to combat events.
///
/// Computed once on first use and shared read-only afterwards.
#[inline]
pub fn can_trigger_procs(aura_type: AuraType) -> bool {
    PROC_TRIGGER_TABLE[aura_type.index()]
}

/// Why an aura application is being removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuraRemoveMode {
    /// Explicit removal by game logic.
    Default,
    /// Cancelled by its holder or by a dispel.
    Cancel,
    /// Duration ran out.
    Expire,
    /// Holder died.
    Death,
    /// Broken by an interrupt flag (damage, movement, casting).
    Interrupt,
    /// Shield amount fully consumed.
    Depleted,
    /// Last charge consumed by a proc.
    ChargesUsed,
    /// Evicted by a newer exclusive aura.
    Replaced,
    /// Stack count reduced to zero.
    Stack,
}

/// How a re-application of an existing aura behaves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackingPolicy {
    /// Reset remaining duration to the maximum. Stacks are left alone.
    #[default]
    ReplaceDuration,
    /// Extend remaining duration by the full duration; stacks grow up to the cap.
    AddDuration,
    /// Add stacks and reset duration until `max_stack`. The application after
    /// that starts the aura over from its initial stacks.
    StackThenReplace,
    /// Every application creates its own aura.
    IndependentInstances,
}

/// Crowd-control category used by immunities and modifier filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mechanic {
    #[default]
    None,
    Stun,
    Root,
    Fear,
    Polymorph,
    Silence,
    Bleed,
    Shield,
    Mount,
}

impl Mechanic {
    pub const fn as_misc(self) -> i32 {
        self as i32
    }
}

/// Which spell property an `AddFlatModifier`/`AddPctModifier` changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellModOp {
    Damage = 0,
    Duration = 1,
    CritChance = 2,
}

impl SpellModOp {
    pub const fn as_misc(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_table_matches_type_declarations() {
        for aura_type in AuraType::iter() {
            assert_eq!(can_trigger_procs(aura_type), aura_type.triggers_procs());
        }
        assert!(can_trigger_procs(AuraType::ProcTriggerSpell));
        assert!(!can_trigger_procs(AuraType::PeriodicDamage));
    }

    #[test]
    fn shields_do_not_scale_with_stacks() {
        assert!(!AuraType::SchoolAbsorb.scales_with_stacks());
        assert!(AuraType::PeriodicDamage.scales_with_stacks());
    }
}
