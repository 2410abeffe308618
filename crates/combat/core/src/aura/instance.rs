//! Aura instances, their per-target applications and removal selectors.

use arrayvec::ArrayVec;

use crate::combat::SchoolMask;
use crate::config::CombatConfig;
use crate::env::{EffectTemplate, SpellAttributes, SpellTemplate};
use crate::procs::ProcFlags;
use crate::state::{ItemId, Millis, SpellId, UnitId};

use super::{AuraHandle, AuraInterruptFlags, AuraRemoveMode, AuraType, Mechanic};

/// Runtime state of one declared sub-effect of an aura.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuraEffect {
    pub(crate) index: u8,
    pub(crate) aura_type: AuraType,
    /// Per-stack amount from the template.
    pub(crate) base_amount: i32,
    /// Current amount: base scaled by stacks, or what is left of a shield.
    pub(crate) amount: i32,
    pub(crate) misc_value: i32,
    pub(crate) mechanic: Mechanic,
    /// Zero means the effect stacks freely with everything.
    pub(crate) stacking_group: u8,
    pub(crate) affect_mask: u64,
    pub(crate) multiplier: i32,
    pub(crate) trigger_spell: Option<SpellId>,
    pub(crate) amplitude: Millis,
    pub(crate) period_timer: Millis,
}

impl AuraEffect {
    pub(crate) fn from_template(index: u8, aura_type: AuraType, effect: &EffectTemplate) -> Self {
        Self {
            index,
            aura_type,
            base_amount: effect.base_points,
            amount: effect.base_points,
            misc_value: effect.misc_value,
            mechanic: effect.mechanic,
            stacking_group: effect.stacking_group,
            affect_mask: effect.affect_mask,
            multiplier: effect.multiplier,
            trigger_spell: effect.trigger_spell,
            amplitude: effect.amplitude,
            period_timer: effect.amplitude,
        }
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn aura_type(&self) -> AuraType {
        self.aura_type
    }

    pub fn amount(&self) -> i32 {
        self.amount
    }

    pub fn misc_value(&self) -> i32 {
        self.misc_value
    }

    pub fn mechanic(&self) -> Mechanic {
        self.mechanic
    }

    pub fn stacking_group(&self) -> u8 {
        self.stacking_group
    }

    pub fn affect_mask(&self) -> u64 {
        self.affect_mask
    }

    /// School mask stored in `misc_value` by school-keyed aura types.
    pub fn misc_school(&self) -> SchoolMask {
        SchoolMask::from_bits_truncate(self.misc_value as u8)
    }

    pub const fn bit(&self) -> u8 {
        1 << self.index
    }
}

/// A time-bounded effect instance, identified by spell, caster and cast item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Aura {
    spell: SpellId,
    caster: UnitId,
    /// Unit whose store holds the aura; removing it there releases every application.
    owner: UnitId,
    cast_item: Option<ItemId>,
    school: SchoolMask,
    attributes: SpellAttributes,
    max_duration: Option<Millis>,
    remaining: Option<Millis>,
    stacks: u8,
    max_stack: u8,
    charges: u8,
    declared_mask: u8,
    pub(crate) effects: ArrayVec<AuraEffect, { CombatConfig::MAX_EFFECTS }>,
    pub(crate) targets: Vec<UnitId>,
    interrupt: AuraInterruptFlags,
    proc_flags: ProcFlags,
    removed: bool,
}

impl Aura {
    pub fn new(
        spell: SpellId,
        caster: UnitId,
        owner: UnitId,
        cast_item: Option<ItemId>,
        duration: Option<Millis>,
    ) -> Self {
        Self {
            spell,
            caster,
            owner,
            cast_item,
            school: SchoolMask::empty(),
            attributes: SpellAttributes::empty(),
            max_duration: duration,
            remaining: duration,
            stacks: 1,
            max_stack: 1,
            charges: 0,
            declared_mask: 0,
            effects: ArrayVec::new(),
            targets: Vec::new(),
            interrupt: AuraInterruptFlags::empty(),
            proc_flags: ProcFlags::empty(),
            removed: false,
        }
    }

    /// Builds an aura from a template, keeping only the aura effects whose
    /// bit is set in `effect_mask`.
    pub(crate) fn from_template(
        template: &SpellTemplate,
        caster: UnitId,
        owner: UnitId,
        cast_item: Option<ItemId>,
        duration: Option<Millis>,
        effect_mask: u8,
    ) -> Self {
        let mut aura = Self::new(template.id, caster, owner, cast_item, duration);
        aura.school = template.school;
        aura.attributes = template.attributes;
        aura.max_stack = template.max_stack.clamp(1, CombatConfig::MAX_STACKS);
        aura.charges = template.charges;
        aura.declared_mask = template.aura_effect_mask();
        aura.interrupt = template.aura_interrupt;
        aura.proc_flags = template.proc.map(|proc| proc.flags).unwrap_or_default();
        for (index, effect) in template.effects.iter().enumerate() {
            let bit = 1u8 << index;
            if effect_mask & bit == 0 {
                continue;
            }
            if let Some(aura_type) = effect.aura {
                aura.effects
                    .push(AuraEffect::from_template(index as u8, aura_type, effect));
            }
        }
        aura
    }

    pub fn spell(&self) -> SpellId {
        self.spell
    }

    pub fn caster(&self) -> UnitId {
        self.caster
    }

    pub fn owner(&self) -> UnitId {
        self.owner
    }

    pub fn cast_item(&self) -> Option<ItemId> {
        self.cast_item
    }

    pub fn school(&self) -> SchoolMask {
        self.school
    }

    pub fn attributes(&self) -> SpellAttributes {
        self.attributes
    }

    pub fn max_duration(&self) -> Option<Millis> {
        self.max_duration
    }

    pub fn remaining(&self) -> Option<Millis> {
        self.remaining
    }

    pub fn stacks(&self) -> u8 {
        self.stacks
    }

    pub fn max_stack(&self) -> u8 {
        self.max_stack
    }

    pub fn charges(&self) -> u8 {
        self.charges
    }

    pub fn declared_mask(&self) -> u8 {
        self.declared_mask
    }

    /// Bitmask of sub-effects this aura carries.
    pub fn effect_mask(&self) -> u8 {
        self.effects.iter().fold(0, |mask, effect| mask | effect.bit())
    }

    pub fn effects(&self) -> &[AuraEffect] {
        &self.effects
    }

    pub fn effect(&self, index: u8) -> Option<&AuraEffect> {
        self.effects.iter().find(|effect| effect.index == index)
    }

    pub(crate) fn effect_mut(&mut self, index: u8) -> Option<&mut AuraEffect> {
        self.effects.iter_mut().find(|effect| effect.index == index)
    }

    pub fn targets(&self) -> &[UnitId] {
        &self.targets
    }

    pub fn interrupt_flags(&self) -> AuraInterruptFlags {
        self.interrupt
    }

    pub fn proc_flags(&self) -> ProcFlags {
        self.proc_flags
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn is_death_persistent(&self) -> bool {
        self.attributes.contains(SpellAttributes::DEATH_PERSISTENT)
    }

    pub fn is_positive(&self) -> bool {
        self.attributes.contains(SpellAttributes::POSITIVE)
    }

    pub fn is_expired(&self) -> bool {
        self.remaining.is_some_and(Millis::is_zero)
    }

    pub(crate) fn mark_removed(&mut self) {
        self.removed = true;
    }

    pub(crate) fn set_duration(&mut self, duration: Option<Millis>) {
        self.max_duration = duration;
        self.remaining = duration;
    }

    /// Starts the aura over in place: seed stacks, full duration, full
    /// shields and restarted periodic timers.
    pub(crate) fn replace(&mut self, stacks: u8, duration: Option<Millis>) {
        self.set_duration(duration);
        self.set_stacks(stacks);
        self.reset_shields();
        for effect in &mut self.effects {
            effect.period_timer = effect.amplitude;
        }
    }

    pub(crate) fn extend(&mut self, by: Millis) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining += by;
            if let Some(max) = self.max_duration.as_mut()
                && *remaining > *max
            {
                *max = *remaining;
            }
        }
    }

    pub(crate) fn elapse(&mut self, diff: Millis) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(diff);
        }
    }

    /// Sets the stack count, clamped to `1..=max_stack`, and rescales every
    /// stack-scaled effect amount.
    pub(crate) fn set_stacks(&mut self, stacks: u8) -> u8 {
        self.stacks = stacks.clamp(1, self.max_stack);
        for effect in &mut self.effects {
            if effect.aura_type.scales_with_stacks() {
                effect.amount = effect.base_amount.saturating_mul(i32::from(self.stacks));
            }
        }
        self.stacks
    }

    /// Restores depleted shields to their full amount.
    pub(crate) fn reset_shields(&mut self) {
        for effect in &mut self.effects {
            if !effect.aura_type.scales_with_stacks() {
                effect.amount = effect.base_amount;
            }
        }
    }

    /// Consumes one charge; returns `true` when the last one is gone.
    pub(crate) fn consume_charge(&mut self) -> bool {
        if self.charges == 0 {
            return false;
        }
        self.charges -= 1;
        self.charges == 0
    }

    pub(crate) fn scale_effect(&mut self, index: u8, pct: i64) {
        if let Some(effect) = self.effect_mut(index) {
            let scaled = i64::from(effect.base_amount) * pct / 100;
            effect.base_amount = scaled.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
            effect.amount = effect.base_amount;
        }
    }
}

/// The relationship between one aura and one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Application {
    pub(crate) handle: AuraHandle,
    /// Sub-effects active on this target.
    pub(crate) effect_mask: u8,
    pub(crate) removing: Option<AuraRemoveMode>,
    /// Global application order, used for deterministic proc and shield order.
    pub(crate) seq: u64,
}

impl Application {
    pub fn handle(&self) -> AuraHandle {
        self.handle
    }

    pub fn effect_mask(&self) -> u8 {
        self.effect_mask
    }

    pub fn is_removing(&self) -> bool {
        self.removing.is_some()
    }

    pub fn removal_reason(&self) -> Option<AuraRemoveMode> {
        self.removing
    }

    pub fn has_effect(&self, index: u8) -> bool {
        self.effect_mask & (1 << index) != 0
    }
}

/// Chooses which applications on a unit a removal call affects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuraSelector {
    Handle(AuraHandle),
    Spell(SpellId),
    SpellFromCaster(SpellId, UnitId),
    Caster(UnitId),
    /// Applications with at least one of these sub-effect bits active.
    EffectMask(u8),
    Type(AuraType),
    /// Everything that does not survive its holder's death.
    NotDeathPersistent,
    All,
}

impl AuraSelector {
    pub fn matches(&self, application: &Application, aura: &Aura) -> bool {
        match *self {
            Self::Handle(handle) => application.handle == handle,
            Self::Spell(spell) => aura.spell == spell,
            Self::SpellFromCaster(spell, caster) => aura.spell == spell && aura.caster == caster,
            Self::Caster(caster) => aura.caster == caster,
            Self::EffectMask(mask) => application.effect_mask & mask != 0,
            Self::Type(aura_type) => aura
                .effects
                .iter()
                .any(|effect| effect.aura_type == aura_type && application.has_effect(effect.index)),
            Self::NotDeathPersistent => !aura.is_death_persistent(),
            Self::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EffectTemplate;

    #[test]
    fn stacks_scale_amounts_and_clamp() {
        let template = SpellTemplate::new(SpellId(7), "Sunder")
            .with_max_stack(5)
            .with_effect(EffectTemplate::aura(AuraType::ModResistance, -10));
        let mut aura = Aura::from_template(
            &template,
            UnitId(1),
            UnitId(2),
            None,
            Some(Millis(30_000)),
            0b1,
        );

        assert_eq!(aura.set_stacks(3), 3);
        assert_eq!(aura.effects()[0].amount(), -30);
        assert_eq!(aura.set_stacks(9), 5);
        assert_eq!(aura.effects()[0].amount(), -50);
        assert_eq!(aura.set_stacks(0), 1);
    }

    #[test]
    fn effect_mask_is_subset_of_declared() {
        let template = SpellTemplate::new(SpellId(8), "Frost Armor")
            .with_effect(EffectTemplate::aura(AuraType::ModResistance, 20))
            .with_effect(EffectTemplate::aura(AuraType::ModDamageTaken, -5));
        let aura = Aura::from_template(&template, UnitId(1), UnitId(1), None, None, 0b11111);

        assert_eq!(aura.declared_mask(), 0b11);
        assert_eq!(aura.effect_mask() & !aura.declared_mask(), 0);
    }
}
