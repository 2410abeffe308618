//! Immutable spell templates and the oracle that serves them.
//!
//! Templates are authored as data (see the content crate) and never mutated
//! at runtime. Every aura, cast and damage event refers back to one by
//! [`SpellId`].

use arrayvec::ArrayVec;

use crate::aura::{AuraInterruptFlags, AuraType, Mechanic, StackingPolicy};
use crate::cast::CastSlot;
use crate::combat::SchoolMask;
use crate::config::CombatConfig;
use crate::procs::{ProcFlags, ProcHitMask};
use crate::state::{Millis, PowerType, SpellId};

/// Oracle providing spell templates by id.
pub trait TemplateOracle: Send + Sync {
    fn template(&self, id: SpellId) -> Option<&SpellTemplate>;
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct SpellAttributes: u32 {
        /// Permanent, never shown as a buff.
        const PASSIVE = 1 << 0;
        /// Survives the holder's death.
        const DEATH_PERSISTENT = 1 << 1;
        const CANT_CRIT = 1 << 2;
        const CHANNELED = 1 << 3;
        const AUTO_REPEAT = 1 << 4;
        /// Queued onto the next melee swing.
        const NEXT_MELEE = 1 << 5;
        /// Every caster gets an independent instance.
        const MULTI_INSTANCE = 1 << 6;
        /// The caster may keep this aura on one target at a time.
        const SINGLE_TARGET = 1 << 7;
        const POSITIVE = 1 << 8;
        /// Entering combat does not dismount.
        const COMBAT_MOUNTABLE = 1 << 9;
        const DOESNT_INTERRUPT_CHANNEL = 1 << 10;
        const KEEP_AUTO_REPEAT = 1 << 11;
        /// Single-target replacement carries the old stack count over.
        const TRANSFER_STACKS = 1 << 12;
        /// Ignores the target's school immunities.
        const UNAFFECTED_BY_IMMUNITY = 1 << 13;
    }
}

bitflags::bitflags! {
    /// How damage and movement affect an in-progress cast of this spell.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct CastInterruptFlags: u8 {
        const MOVEMENT = 1 << 0;
        const PUSHBACK = 1 << 1;
        const ABORT_ON_DAMAGE = 1 << 2;
        /// Breakable by explicit interrupt abilities.
        const INTERRUPT = 1 << 3;
    }
}

/// Defense category a spell's damage is resolved against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageClass {
    /// Always hits, never mitigated by the hit table.
    #[default]
    None,
    Melee,
    Ranged,
    Magic,
}

/// What a declared sub-effect does when the spell resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    /// Direct damage of the spell's school.
    SchoolDamage,
    /// Direct heal.
    Heal,
    /// Restores the power type in `misc_value`.
    Energize,
    /// Contributes to the aura the spell applies.
    #[default]
    ApplyAura,
    /// Only meaningful through the special-case table.
    Dummy,
}

/// Who a sub-effect lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectTarget {
    Caster,
    #[default]
    Target,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EffectTemplate {
    pub kind: EffectKind,
    /// Aura type, required for `ApplyAura` effects.
    pub aura: Option<AuraType>,
    pub base_points: i32,
    /// School mask, mechanic, power type or spell-mod op depending on `aura`.
    pub misc_value: i32,
    /// Period of a periodic aura.
    pub amplitude: Millis,
    pub trigger_spell: Option<SpellId>,
    pub mechanic: Mechanic,
    /// Non-zero groups count only their largest contributor.
    pub stacking_group: u8,
    /// Spell family bits an `AddFlatModifier`/`AddPctModifier` affects.
    pub affect_mask: u64,
    /// Mana shields: mana drained per 100 points absorbed.
    pub multiplier: i32,
    pub target: EffectTarget,
}

impl EffectTemplate {
    pub fn aura(aura_type: AuraType, base_points: i32) -> Self {
        Self {
            kind: EffectKind::ApplyAura,
            aura: Some(aura_type),
            base_points,
            ..Self::default()
        }
    }

    pub fn damage(base_points: i32) -> Self {
        Self {
            kind: EffectKind::SchoolDamage,
            base_points,
            ..Self::default()
        }
    }

    pub fn heal(base_points: i32) -> Self {
        Self {
            kind: EffectKind::Heal,
            base_points,
            ..Self::default()
        }
    }

    pub fn energize(power: PowerType, base_points: i32) -> Self {
        Self {
            kind: EffectKind::Energize,
            base_points,
            misc_value: power as i32,
            ..Self::default()
        }
    }

    pub fn with_misc(mut self, misc_value: i32) -> Self {
        self.misc_value = misc_value;
        self
    }

    pub fn with_school_misc(self, school: SchoolMask) -> Self {
        self.with_misc(i32::from(school.bits()))
    }

    pub fn with_amplitude(mut self, amplitude: Millis) -> Self {
        self.amplitude = amplitude;
        self
    }

    pub fn with_trigger(mut self, spell: SpellId) -> Self {
        self.trigger_spell = Some(spell);
        self
    }

    pub fn with_mechanic(mut self, mechanic: Mechanic) -> Self {
        self.mechanic = mechanic;
        self
    }

    pub fn with_stacking_group(mut self, group: u8) -> Self {
        self.stacking_group = group;
        self
    }

    pub fn with_affect_mask(mut self, mask: u64) -> Self {
        self.affect_mask = mask;
        self
    }

    pub fn with_multiplier(mut self, multiplier: i32) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn on_caster(mut self) -> Self {
        self.target = EffectTarget::Caster;
        self
    }
}

/// Reactive trigger declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProcTemplate {
    pub flags: ProcFlags,
    pub hit_mask: ProcHitMask,
    /// Empty matches every school.
    pub school: SchoolMask,
    /// Percent chance; ignored when `ppm` is set.
    pub chance: u8,
    /// Procs per minute, normalized by the triggering weapon's speed.
    pub ppm: u16,
    pub cooldown: Millis,
}

impl ProcTemplate {
    pub fn new(flags: ProcFlags, chance: u8) -> Self {
        Self {
            flags,
            chance,
            ..Self::default()
        }
    }

    pub fn with_hit_mask(mut self, hit_mask: ProcHitMask) -> Self {
        self.hit_mask = hit_mask;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Millis) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_ppm(mut self, ppm: u16) -> Self {
        self.ppm = ppm;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerCost {
    pub power: PowerType,
    pub amount: u32,
}

/// Data-declared follow-ups of applying or removing a spell's aura.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellLink {
    CastOnApply(SpellId),
    CastOnRemove(SpellId),
    RemoveOnRemove(SpellId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpellTemplate {
    pub id: SpellId,
    pub name: String,
    pub school: SchoolMask,
    pub attributes: SpellAttributes,
    pub damage_class: DamageClass,
    pub mechanic: Mechanic,
    /// Aura duration and channel length; `None` is permanent.
    pub duration: Option<Millis>,
    pub max_stack: u8,
    pub charges: u8,
    pub stacking: StackingPolicy,
    /// Non-zero: only one aura of the group per target.
    pub exclusive_group: u32,
    /// Bits matched by spell modifiers' affect masks.
    pub family_flags: u64,
    pub cast_time: Millis,
    pub travel_time: Millis,
    /// Auto-repeat re-arm interval; zero uses the ranged weapon speed.
    pub repeat_interval: Millis,
    pub power_cost: Option<PowerCost>,
    pub aura_interrupt: AuraInterruptFlags,
    pub cast_interrupt: CastInterruptFlags,
    pub proc: Option<ProcTemplate>,
    pub effects: ArrayVec<EffectTemplate, { CombatConfig::MAX_EFFECTS }>,
    pub links: ArrayVec<SpellLink, { CombatConfig::MAX_LINKS }>,
}

impl SpellTemplate {
    pub fn new(id: SpellId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            school: SchoolMask::PHYSICAL,
            attributes: SpellAttributes::empty(),
            damage_class: DamageClass::Magic,
            mechanic: Mechanic::None,
            duration: None,
            max_stack: 1,
            charges: 0,
            stacking: StackingPolicy::default(),
            exclusive_group: 0,
            family_flags: 0,
            cast_time: Millis::ZERO,
            travel_time: Millis::ZERO,
            repeat_interval: Millis::ZERO,
            power_cost: None,
            aura_interrupt: AuraInterruptFlags::empty(),
            cast_interrupt: CastInterruptFlags::empty(),
            proc: None,
            effects: ArrayVec::new(),
            links: ArrayVec::new(),
        }
    }

    pub fn with_school(mut self, school: SchoolMask) -> Self {
        self.school = school;
        self
    }

    pub fn with_attributes(mut self, attributes: SpellAttributes) -> Self {
        self.attributes |= attributes;
        self
    }

    pub fn with_damage_class(mut self, class: DamageClass) -> Self {
        self.damage_class = class;
        self
    }

    pub fn with_duration(mut self, duration: Millis) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_max_stack(mut self, max_stack: u8) -> Self {
        self.max_stack = max_stack;
        self
    }

    pub fn with_charges(mut self, charges: u8) -> Self {
        self.charges = charges;
        self
    }

    pub fn with_stacking(mut self, stacking: StackingPolicy) -> Self {
        self.stacking = stacking;
        self
    }

    pub fn with_exclusive_group(mut self, group: u32) -> Self {
        self.exclusive_group = group;
        self
    }

    pub fn with_family_flags(mut self, flags: u64) -> Self {
        self.family_flags = flags;
        self
    }

    pub fn with_cast_time(mut self, cast_time: Millis) -> Self {
        self.cast_time = cast_time;
        self
    }

    pub fn with_travel_time(mut self, travel_time: Millis) -> Self {
        self.travel_time = travel_time;
        self
    }

    pub fn with_repeat_interval(mut self, interval: Millis) -> Self {
        self.repeat_interval = interval;
        self
    }

    pub fn with_power_cost(mut self, power: PowerType, amount: u32) -> Self {
        self.power_cost = Some(PowerCost { power, amount });
        self
    }

    pub fn with_aura_interrupt(mut self, flags: AuraInterruptFlags) -> Self {
        self.aura_interrupt = flags;
        self
    }

    pub fn with_cast_interrupt(mut self, flags: CastInterruptFlags) -> Self {
        self.cast_interrupt = flags;
        self
    }

    pub fn with_proc(mut self, proc: ProcTemplate) -> Self {
        self.proc = Some(proc);
        self
    }

    /// Appends a sub-effect. Extra effects past the capacity are dropped
    /// with a warning.
    pub fn with_effect(mut self, effect: EffectTemplate) -> Self {
        if self.effects.try_push(effect).is_err() {
            tracing::warn!(spell = %self.id, "effect capacity exceeded; effect dropped");
        }
        self
    }

    pub fn with_link(mut self, link: SpellLink) -> Self {
        if self.links.try_push(link).is_err() {
            tracing::warn!(spell = %self.id, "link capacity exceeded; link dropped");
        }
        self
    }

    pub fn has_attribute(&self, attribute: SpellAttributes) -> bool {
        self.attributes.contains(attribute)
    }

    /// Bitmask of the sub-effects that contribute to an aura.
    pub fn aura_effect_mask(&self) -> u8 {
        self.effects
            .iter()
            .enumerate()
            .filter(|(_, effect)| effect.kind == EffectKind::ApplyAura && effect.aura.is_some())
            .fold(0, |mask, (index, _)| mask | (1 << index))
    }

    pub fn applies_aura(&self) -> bool {
        self.aura_effect_mask() != 0
    }

    pub fn is_positive(&self) -> bool {
        self.has_attribute(SpellAttributes::POSITIVE)
    }

    /// Slot this spell occupies while being cast.
    pub fn cast_slot(&self) -> CastSlot {
        if self.has_attribute(SpellAttributes::CHANNELED) {
            CastSlot::Channeled
        } else if self.has_attribute(SpellAttributes::AUTO_REPEAT) {
            CastSlot::AutoRepeat
        } else if self.has_attribute(SpellAttributes::NEXT_MELEE) {
            CastSlot::Melee
        } else {
            CastSlot::Generic
        }
    }

    /// Spell ids referenced as proc triggers or links.
    pub fn referenced_spells(&self) -> impl Iterator<Item = SpellId> + '_ {
        let triggers = self.effects.iter().filter_map(|effect| effect.trigger_spell);
        let links = self.links.iter().map(|link| match *link {
            SpellLink::CastOnApply(spell)
            | SpellLink::CastOnRemove(spell)
            | SpellLink::RemoveOnRemove(spell) => spell,
        });
        triggers.chain(links)
    }
}

impl Default for SpellTemplate {
    fn default() -> Self {
        Self::new(SpellId::default(), String::new())
    }
}
