//! Cast lifecycle on the world: start, advance, finish, interrupt, pushback.

use arrayvec::ArrayVec;
use strum::IntoEnumIterator;

use crate::aura::{ApplyParams, AuraHandle, AuraInterruptFlags, AuraRemoveMode};
use crate::env::{
    CastInterruptFlags, CombatEnv, DamageClass, EffectKind, EffectTarget, SpellAttributes,
    SpellTemplate,
};
use crate::state::{AttackType, ControlFlags, Millis, PowerType, SpellId, UnitId};
use crate::world::{CombatEvent, World};

use super::{Cast, CastError, CastSlot, CastState, InterruptStrength};

/// Whether silence blocks the spell. Weapon-based abilities stay usable.
fn is_silenceable(template: &SpellTemplate) -> bool {
    matches!(template.damage_class, DamageClass::Magic | DamageClass::None)
        && template.cast_slot() != CastSlot::Melee
}

impl World {
    /// Starts casting `spell` from `caster` at `target`.
    ///
    /// Instant generic casts resolve immediately. Everything else occupies
    /// its slot and is advanced by [`World::update`].
    ///
    /// # Errors
    ///
    /// Returns a [`CastError`] when the caster or target is not eligible,
    /// the caster is stunned or silenced, or cannot pay the power cost.
    pub fn start_cast(
        &mut self,
        env: &CombatEnv<'_>,
        caster: UnitId,
        target: UnitId,
        spell: SpellId,
    ) -> Result<CastSlot, CastError> {
        let template = env.template(spell)?;
        let caster_unit = self
            .units
            .get(&caster)
            .ok_or(CastError::UnknownUnit(caster))?;
        if !caster_unit.is_alive() || !caster_unit.in_world {
            return Err(CastError::CasterNotEligible(caster));
        }
        if caster_unit
            .control
            .intersects(ControlFlags::STUNNED | ControlFlags::CONFUSED)
        {
            return Err(CastError::Stunned(caster));
        }
        if caster_unit.control.contains(ControlFlags::SILENCED) && is_silenceable(template) {
            return Err(CastError::Silenced(caster));
        }
        if let Some(cost) = template.power_cost {
            let available = caster_unit.powers.current(cost.power);
            if available < cost.amount {
                return Err(CastError::NotEnoughPower {
                    caster,
                    power: cost.power,
                    required: cost.amount,
                    available,
                });
            }
        }
        let target_unit = self
            .units
            .get(&target)
            .ok_or(CastError::UnknownUnit(target))?;
        if !target_unit.in_world
            || (!target_unit.is_alive() && !template.has_attribute(SpellAttributes::DEATH_PERSISTENT))
        {
            return Err(CastError::TargetNotEligible(target));
        }

        let slot = template.cast_slot();
        for other in slot.interrupts(template.attributes) {
            self.interrupt_cast(env, caster, other, InterruptStrength::Soft);
        }
        self.break_auras(env, caster, AuraInterruptFlags::CAST, Some(spell));

        tracing::debug!(%caster, %target, %spell, ?slot, "cast started");
        self.emit(CombatEvent::CastStarted {
            caster,
            target,
            spell,
            slot,
        });

        match slot {
            CastSlot::Generic if template.cast_time.is_zero() => {
                self.pay_power(caster, template);
                self.launch(env, caster, target, template);
            }
            CastSlot::Generic => {
                let cast = Cast::new(spell, target, slot, CastState::Preparing, template.cast_time);
                self.occupy_slot(caster, cast);
            }
            CastSlot::Channeled => {
                self.pay_power(caster, template);
                let duration = template.duration.unwrap_or(template.cast_time);
                let handles = self.cast_spell_effects(env, caster, target, template);
                let mut cast = Cast::new(spell, target, slot, CastState::Channeling, duration);
                cast.channel_auras = handles;
                self.occupy_slot(caster, cast);
            }
            CastSlot::AutoRepeat => {
                let interval = self.repeat_interval(caster, template);
                let cast = Cast::new(spell, target, slot, CastState::Preparing, interval);
                self.occupy_slot(caster, cast);
            }
            CastSlot::Melee => {
                let cast = Cast::new(spell, target, slot, CastState::Preparing, Millis::ZERO);
                self.occupy_slot(caster, cast);
            }
        }
        Ok(slot)
    }

    fn occupy_slot(&mut self, caster: UnitId, cast: Cast) {
        let Some(unit) = self.units.get_mut(&caster) else {
            return;
        };
        if !unit.is_alive() {
            return;
        }
        if let Some(displaced) = unit.casts.occupy(cast) {
            tracing::debug!(%caster, spell = %displaced.spell, "cast displaced");
            self.emit(CombatEvent::CastInterrupted {
                caster,
                spell: displaced.spell,
                slot: displaced.slot,
            });
        }
    }

    /// Drains the template's power cost. Returns `false` if the caster
    /// cannot pay.
    pub(crate) fn pay_power(&mut self, caster: UnitId, template: &SpellTemplate) -> bool {
        let Some(cost) = template.power_cost else {
            return true;
        };
        let Some(unit) = self.units.get_mut(&caster) else {
            return false;
        };
        if unit.powers.current(cost.power) < cost.amount {
            return false;
        }
        unit.powers.drain(cost.power, cost.amount);
        true
    }

    fn repeat_interval(&self, caster: UnitId, template: &SpellTemplate) -> Millis {
        if !template.repeat_interval.is_zero() {
            return template.repeat_interval;
        }
        self.units
            .get(&caster)
            .map(|unit| unit.swing_time(AttackType::Ranged, &self.config))
            .unwrap_or(self.config.default_swing)
    }

    /// Finishes a generic cast: effects land now, or after the travel time.
    fn launch(&mut self, env: &CombatEnv<'_>, caster: UnitId, target: UnitId, template: &SpellTemplate) {
        self.emit(CombatEvent::CastFinished {
            caster,
            spell: template.id,
            slot: CastSlot::Generic,
        });
        if template.travel_time.is_zero() {
            self.cast_spell_effects(env, caster, target, template);
            return;
        }
        let cast = Cast::new(
            template.id,
            target,
            CastSlot::Generic,
            CastState::Delayed,
            template.travel_time,
        );
        self.occupy_slot(caster, cast);
    }

    // ========================================================================
    // Tick
    // ========================================================================

    pub(crate) fn update_casts(&mut self, env: &CombatEnv<'_>, id: UnitId, diff: Millis) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let landed = unit.casts.advance_in_flight(diff);
        for cast in landed {
            self.land(env, id, &cast);
        }
        for slot in CastSlot::iter() {
            self.advance_slot(env, id, slot, diff);
        }
    }

    fn advance_slot(&mut self, env: &CombatEnv<'_>, id: UnitId, slot: CastSlot, diff: Millis) {
        if slot == CastSlot::Melee {
            return;
        }
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let Some(cast) = unit.casts.get_mut(slot) else {
            return;
        };
        cast.timer = cast.timer.saturating_sub(diff);
        if !cast.timer.is_zero() {
            return;
        }
        let state = cast.state;

        match (state, slot) {
            (CastState::Preparing, CastSlot::AutoRepeat) => self.repeat_cast(env, id),
            (CastState::Preparing, _) => self.finish_cast(env, id, slot),
            (CastState::Channeling, _) => {
                let Some(cast) = self.take_cast(id, slot) else {
                    return;
                };
                tracing::debug!(caster = %id, spell = %cast.spell, "channel finished");
                self.emit(CombatEvent::CastFinished {
                    caster: id,
                    spell: cast.spell,
                    slot,
                });
            }
            (CastState::Delayed, _) => {
                if let Some(cast) = self.take_cast(id, slot) {
                    self.land(env, id, &cast);
                }
            }
            (CastState::Finished | CastState::Cancelled, _) => {
                self.take_cast(id, slot);
            }
        }
    }

    fn take_cast(&mut self, id: UnitId, slot: CastSlot) -> Option<Cast> {
        self.units.get_mut(&id).and_then(|unit| unit.casts.take(slot))
    }

    fn finish_cast(&mut self, env: &CombatEnv<'_>, id: UnitId, slot: CastSlot) {
        let Some(cast) = self.take_cast(id, slot) else {
            return;
        };
        let template = match env.template(cast.spell) {
            Ok(template) => template,
            Err(err) => {
                tracing::warn!(caster = %id, spell = %cast.spell, error = %err, "cast of unknown spell dropped");
                return;
            }
        };
        let target_ok = self.units.get(&cast.target).is_some_and(|target| {
            target.in_world
                && (target.is_alive() || template.has_attribute(SpellAttributes::DEATH_PERSISTENT))
        });
        if !target_ok || !self.pay_power(id, template) {
            tracing::debug!(caster = %id, spell = %cast.spell, target_ok, "cast failed at finish");
            self.emit(CombatEvent::CastInterrupted {
                caster: id,
                spell: cast.spell,
                slot,
            });
            return;
        }
        tracing::debug!(caster = %id, spell = %cast.spell, "cast finished");
        self.launch(env, id, cast.target, template);
    }

    fn repeat_cast(&mut self, env: &CombatEnv<'_>, id: UnitId) {
        let Some((spell, target)) = self
            .units
            .get(&id)
            .and_then(|unit| unit.casts.get(CastSlot::AutoRepeat))
            .map(|cast| (cast.spell, cast.target))
        else {
            return;
        };
        let Ok(template) = env.template(spell) else {
            self.interrupt_cast(env, id, CastSlot::AutoRepeat, InterruptStrength::Hard);
            return;
        };
        if !self.is_alive(target) || !self.pay_power(id, template) {
            self.interrupt_cast(env, id, CastSlot::AutoRepeat, InterruptStrength::Hard);
            return;
        }

        self.cast_spell_effects(env, id, target, template);
        self.emit(CombatEvent::CastFinished {
            caster: id,
            spell,
            slot: CastSlot::AutoRepeat,
        });

        let interval = self.repeat_interval(id, template);
        if let Some(cast) = self
            .units
            .get_mut(&id)
            .and_then(|unit| unit.casts.get_mut(CastSlot::AutoRepeat))
            && cast.spell == spell
        {
            cast.timer = interval;
            cast.duration = interval;
        }
    }

    /// A launched cast reached its target.
    fn land(&mut self, env: &CombatEnv<'_>, caster: UnitId, cast: &Cast) {
        match env.template(cast.spell) {
            Ok(template) => {
                self.cast_spell_effects(env, caster, cast.target, template);
            }
            Err(err) => {
                tracing::warn!(%caster, spell = %cast.spell, error = %err, "launched spell skipped");
            }
        }
    }

    // ========================================================================
    // Interrupts
    // ========================================================================

    /// Cancels the cast in `slot`, if the strength allows it.
    ///
    /// Interrupting a channel removes the auras it applied.
    pub fn interrupt_cast(
        &mut self,
        env: &CombatEnv<'_>,
        unit: UnitId,
        slot: CastSlot,
        strength: InterruptStrength,
    ) -> bool {
        let Some(holder) = self.units.get_mut(&unit) else {
            return false;
        };
        let Some(cast) = holder.casts.get(slot) else {
            return false;
        };
        if strength == InterruptStrength::Soft && cast.state == CastState::Delayed {
            return false;
        }
        let Some(cast) = holder.casts.cancel(slot) else {
            return false;
        };

        for handle in &cast.channel_auras {
            self.release_aura(env, *handle, AuraRemoveMode::Interrupt);
        }
        tracing::debug!(%unit, spell = %cast.spell, ?slot, "cast interrupted");
        self.emit(CombatEvent::CastInterrupted {
            caster: unit,
            spell: cast.spell,
            slot,
        });
        true
    }

    pub fn interrupt_all_casts(&mut self, env: &CombatEnv<'_>, unit: UnitId, strength: InterruptStrength) {
        for slot in CastSlot::iter() {
            self.interrupt_cast(env, unit, slot, strength);
        }
        if strength == InterruptStrength::Hard
            && let Some(holder) = self.units.get_mut(&unit)
        {
            for cast in holder.casts.cancel_in_flight() {
                self.emit(CombatEvent::CastInterrupted {
                    caster: unit,
                    spell: cast.spell,
                    slot: cast.slot,
                });
            }
        }
    }

    /// Interrupts the casts silence applies to.
    pub(crate) fn interrupt_spell_casts(
        &mut self,
        env: &CombatEnv<'_>,
        unit: UnitId,
        strength: InterruptStrength,
    ) {
        for slot in [CastSlot::Generic, CastSlot::Channeled, CastSlot::AutoRepeat] {
            let silenceable = self
                .units
                .get(&unit)
                .and_then(|holder| holder.casts.get(slot))
                .and_then(|cast| env.template(cast.spell).ok())
                .is_some_and(is_silenceable);
            if silenceable {
                self.interrupt_cast(env, unit, slot, strength);
            }
        }
    }

    /// Movement notification from the outside world.
    ///
    /// Breaks casts and channels flagged `MOVEMENT` and auras flagged `MOVE`.
    pub fn notify_moved(&mut self, env: &CombatEnv<'_>, unit: UnitId) {
        for slot in [CastSlot::Generic, CastSlot::Channeled] {
            let breaks = self
                .units
                .get(&unit)
                .and_then(|holder| holder.casts.get(slot))
                .filter(|cast| cast.state != CastState::Delayed)
                .and_then(|cast| env.template(cast.spell).ok())
                .is_some_and(|template| template.cast_interrupt.contains(CastInterruptFlags::MOVEMENT));
            if breaks {
                self.interrupt_cast(env, unit, slot, InterruptStrength::Soft);
            }
        }
        self.break_auras(env, unit, AuraInterruptFlags::MOVE, None);
    }

    /// Damage landed on `unit`: abort or push back its cast and channel.
    pub(crate) fn damage_pushback(&mut self, env: &CombatEnv<'_>, unit: UnitId) {
        let max_pushbacks = self.config.max_pushbacks;
        let pushback = self.config.pushback;

        for slot in [CastSlot::Generic, CastSlot::Channeled] {
            let Some(flags) = self
                .units
                .get(&unit)
                .and_then(|holder| holder.casts.get(slot))
                .filter(|cast| matches!(cast.state, CastState::Preparing | CastState::Channeling))
                .and_then(|cast| env.template(cast.spell).ok())
                .map(|template| template.cast_interrupt)
            else {
                continue;
            };

            if flags.contains(CastInterruptFlags::ABORT_ON_DAMAGE) {
                self.interrupt_cast(env, unit, slot, InterruptStrength::Soft);
                continue;
            }
            if !flags.contains(CastInterruptFlags::PUSHBACK) {
                continue;
            }
            let Some(cast) = self
                .units
                .get_mut(&unit)
                .and_then(|holder| holder.casts.get_mut(slot))
            else {
                continue;
            };
            if cast.pushbacks >= max_pushbacks {
                continue;
            }
            cast.pushbacks += 1;
            match cast.state {
                CastState::Preparing => {
                    let delay = pushback.min(cast.elapsed());
                    cast.timer += delay;
                }
                CastState::Channeling => {
                    let cut = Millis(cast.duration.0 / 4);
                    cast.timer = cast.timer.saturating_sub(cut);
                }
                _ => {}
            }
            tracing::trace!(%unit, spell = %cast.spell, remaining = %cast.timer, "cast pushed back");
        }
    }

    // ========================================================================
    // Effects
    // ========================================================================

    /// Resolves every declared sub-effect of `template`.
    ///
    /// Aura effects are grouped per recipient into one application. Returns
    /// the handles of the auras applied.
    pub(crate) fn cast_spell_effects(
        &mut self,
        env: &CombatEnv<'_>,
        caster: UnitId,
        target: UnitId,
        template: &SpellTemplate,
    ) -> Vec<AuraHandle> {
        let spell = template.id;
        let mut aura_masks: ArrayVec<(UnitId, u8), 2> = ArrayVec::new();

        for (index, effect) in template.effects.iter().enumerate() {
            let recipient = match effect.target {
                EffectTarget::Caster => caster,
                EffectTarget::Target => target,
            };
            let amount = effect.base_points.max(0) as u32;
            match effect.kind {
                EffectKind::SchoolDamage => {
                    if let Err(err) = self.spell_damage(env, caster, recipient, spell, amount) {
                        tracing::debug!(%spell, %recipient, error = %err, "damage effect skipped");
                    }
                }
                EffectKind::Heal => {
                    self.spell_heal(env, caster, recipient, template, amount);
                }
                EffectKind::Energize => match PowerType::from_misc(effect.misc_value) {
                    Some(power) => {
                        if let Some(unit) = self.units.get_mut(&recipient)
                            && unit.is_alive()
                        {
                            unit.powers.restore(power, amount);
                        }
                    }
                    None => {
                        tracing::warn!(%spell, misc = effect.misc_value, "energize with unknown power type");
                    }
                },
                EffectKind::ApplyAura => {
                    let bit = 1u8 << index;
                    match aura_masks.iter_mut().find(|(unit, _)| *unit == recipient) {
                        Some((_, mask)) => *mask |= bit,
                        None => aura_masks.push((recipient, bit)),
                    }
                }
                EffectKind::Dummy => {
                    tracing::trace!(%spell, index, "dummy effect");
                }
            }
        }

        let mut handles = Vec::new();
        for (recipient, mask) in aura_masks {
            let params = ApplyParams::default().with_effect_mask(mask);
            match self.apply_aura(env, caster, recipient, spell, params) {
                Ok(handle) => handles.push(handle),
                Err(err) => tracing::debug!(%spell, %recipient, error = %err, "aura not applied"),
            }
        }
        handles
    }

    /// Casts `spell` without a slot, cost or cast time: linked spells and
    /// proc payloads.
    pub(crate) fn cast_triggered(
        &mut self,
        env: &CombatEnv<'_>,
        caster: UnitId,
        target: UnitId,
        spell: SpellId,
    ) {
        let template = match env.template(spell) {
            Ok(template) => template,
            Err(err) => {
                tracing::warn!(%spell, %caster, error = %err, "triggered spell skipped");
                return;
            }
        };
        if !self.units.contains_key(&caster) {
            return;
        }
        let target = if self.units.contains_key(&target) {
            target
        } else {
            caster
        };
        tracing::trace!(%spell, %caster, %target, "triggered cast");
        self.cast_spell_effects(env, caster, target, template);
    }
}
