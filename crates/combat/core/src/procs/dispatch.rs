//! Proc dispatch.
//!
//! For each event the dispatcher walks the actor's proc registry, then the
//! victim's, each in application order. An aura fires when its category
//! flags and hit mask match, its cooldown is ready, the chance roll passes
//! and any special-case guard allows it. Firing runs the payload, records
//! the cooldown and spends a charge.
//!
//! Payloads can raise new events that re-enter the dispatcher. Every unit
//! carries a depth counter; a unit already `max_proc_depth` levels deep
//! ignores further events until the chain unwinds.

use arrayvec::ArrayVec;

use crate::aura::{ApplyParams, AuraHandle, AuraRemoveMode, AuraSelector, AuraType};
use crate::combat::{DamageInfo, DamageKind, SchoolMask};
use crate::config::CombatConfig;
use crate::env::{CombatEnv, DamageClass, ProcGuard, ProcPayload, RollContext};
use crate::error::invariant_violated;
use crate::state::{AttackType, SpellId, UnitId};
use crate::world::World;

use super::{ProcEvent, ProcFlags, ProcHitMask};

/// What a fired aura does by default, per applied effect.
#[derive(Clone, Copy, Debug)]
enum DefaultPayload {
    TriggerSpell(SpellId),
    Damage(u32),
    AddStack,
}

/// Everything needed to fire one aura, captured before any payload runs.
#[derive(Clone, Debug)]
struct Firing {
    handle: AuraHandle,
    spell: SpellId,
    caster: UnitId,
    school: SchoolMask,
    defaults: ArrayVec<DefaultPayload, { CombatConfig::MAX_EFFECTS }>,
}

impl World {
    /// Feeds one combat event to every matching proc aura.
    pub(crate) fn dispatch_procs(&mut self, env: &CombatEnv<'_>, event: &ProcEvent) {
        let top_level = self.dispatch_depth == 0;
        if top_level {
            self.check_proc_depths();
        }
        self.dispatch_depth += 1;

        if let Some(actor) = event.actor
            && !event.actor_flags.is_empty()
        {
            self.dispatch_side(env, event, actor, event.actor_flags, Some(event.victim));
        }
        if !event.victim_flags.is_empty() {
            self.dispatch_side(env, event, event.victim, event.victim_flags, event.actor);
        }

        self.dispatch_depth -= 1;
        if top_level {
            self.check_proc_depths();
        }
    }

    /// Every unit's depth must be zero between top-level events.
    fn check_proc_depths(&mut self) {
        let mut violated = false;
        for unit in self.units.values_mut() {
            if unit.proc_depth != 0 {
                violated = true;
                unit.proc_depth = 0;
            }
        }
        if violated {
            invariant_violated("proc depth not zero between top-level events");
        }
    }

    fn dispatch_side(
        &mut self,
        env: &CombatEnv<'_>,
        event: &ProcEvent,
        holder: UnitId,
        flags: ProcFlags,
        other: Option<UnitId>,
    ) {
        let max_depth = self.config.max_proc_depth;
        let Some(unit) = self.units.get_mut(&holder) else {
            return;
        };
        if !unit.in_world {
            return;
        }
        if unit.proc_depth >= max_depth {
            tracing::warn!(%holder, depth = unit.proc_depth, "proc chain cut off");
            return;
        }
        let candidates: Vec<AuraHandle> = unit
            .auras
            .proc_registry()
            .iter()
            .filter(|(_, registered)| registered.intersects(flags))
            .map(|(handle, _)| *handle)
            .collect();
        if candidates.is_empty() {
            return;
        }

        unit.proc_depth += 1;
        for handle in candidates {
            self.try_fire(env, event, holder, handle, other);
        }
        if let Some(unit) = self.units.get_mut(&holder) {
            unit.proc_depth = unit.proc_depth.saturating_sub(1);
        }
    }

    fn try_fire(
        &mut self,
        env: &CombatEnv<'_>,
        event: &ProcEvent,
        holder: UnitId,
        handle: AuraHandle,
        other: Option<UnitId>,
    ) {
        let Some(firing) = self.prepare_firing(holder, handle) else {
            return;
        };
        let Ok(template) = env.template(firing.spell) else {
            return;
        };
        let Some(proc) = template.proc else {
            return;
        };

        if !proc.hit_mask.effective().intersects(event.hit_mask) {
            return;
        }
        if !proc.school.is_empty() && !proc.school.intersects(event.school) {
            return;
        }
        let now = self.now;
        let ready = self
            .units
            .get(&holder)
            .is_some_and(|unit| unit.auras.proc_ready(firing.caster, firing.spell, now));
        if !ready {
            return;
        }

        let chance = self.proc_chance_bp(holder, proc.chance, proc.ppm, event.attack_type);
        if chance == 0 {
            return;
        }
        if chance < 10_000 && self.roll_bp(env, holder, RollContext::Proc) >= chance {
            return;
        }

        let behavior = env.proc_behavior(firing.spell);
        if let Some(guard) = behavior.and_then(|behavior| behavior.guard)
            && !self.guard_allows(guard, event, holder, other)
        {
            return;
        }

        // cooldown is armed before the payload so a re-entrant event cannot
        // fire the same aura again
        let cooldown = behavior
            .and_then(|behavior| behavior.cooldown)
            .unwrap_or(proc.cooldown);
        if !cooldown.is_zero()
            && let Some(unit) = self.units.get_mut(&holder)
        {
            unit.auras
                .set_proc_cooldown(firing.caster, firing.spell, now + cooldown);
        }

        tracing::debug!(%holder, spell = %firing.spell, "proc fired");
        match behavior.and_then(|behavior| behavior.payload) {
            Some(payload) => self.run_payload(env, &firing, payload, holder, other),
            None => {
                for default in &firing.defaults {
                    self.run_default(env, &firing, *default, holder, other);
                }
            }
        }

        let exhausted = self
            .auras
            .get_mut(handle)
            .filter(|aura| !aura.is_removed())
            .is_some_and(|aura| aura.consume_charge());
        if exhausted {
            self.release_aura(env, handle, AuraRemoveMode::ChargesUsed);
        }
    }

    /// Re-validates the handle and captures what firing it needs.
    fn prepare_firing(&self, holder: UnitId, handle: AuraHandle) -> Option<Firing> {
        let application = self.units.get(&holder)?.auras.application(handle)?;
        if application.is_removing() {
            return None;
        }
        let aura = self.auras.get(handle).filter(|aura| !aura.is_removed())?;

        let mut defaults = ArrayVec::new();
        for effect in aura.effects() {
            if !application.has_effect(effect.index()) {
                continue;
            }
            let payload = match effect.aura_type() {
                AuraType::ProcTriggerSpell => match effect.trigger_spell {
                    Some(spell) => DefaultPayload::TriggerSpell(spell),
                    None => continue,
                },
                AuraType::ProcTriggerDamage => DefaultPayload::Damage(effect.amount().max(0) as u32),
                AuraType::AddStackOnProc => DefaultPayload::AddStack,
                _ => continue,
            };
            defaults.push(payload);
        }

        Some(Firing {
            handle,
            spell: aura.spell(),
            caster: aura.caster(),
            school: aura.school(),
            defaults,
        })
    }

    /// Chance in basis points. Procs-per-minute scale with weapon speed.
    fn proc_chance_bp(&self, holder: UnitId, chance: u8, ppm: u16, attack: Option<AttackType>) -> u32 {
        if ppm == 0 {
            return u32::from(chance).min(100) * 100;
        }
        let speed = self
            .units
            .get(&holder)
            .map(|unit| unit.swing_time(attack.unwrap_or(AttackType::MainHand), &self.config))
            .unwrap_or(self.config.default_swing);
        // ppm * speed / 60s, in basis points
        let chance = u64::from(ppm) * speed.0 / 6;
        chance.min(10_000) as u32
    }

    fn guard_allows(
        &self,
        guard: ProcGuard,
        event: &ProcEvent,
        holder: UnitId,
        other: Option<UnitId>,
    ) -> bool {
        let health_pct = |id: UnitId| self.units.get(&id).map(|unit| unit.health.pct());
        match guard {
            ProcGuard::OtherHealthBelowPct(pct) => other
                .and_then(health_pct)
                .is_some_and(|health| health < u32::from(pct)),
            ProcGuard::HolderHealthBelowPct(pct) => {
                health_pct(holder).is_some_and(|health| health < u32::from(pct))
            }
            ProcGuard::HolderHasAura(spell) => self.units.get(&holder).is_some_and(|unit| {
                unit.auras
                    .handles_by_spell(spell)
                    .iter()
                    .any(|handle| unit.auras.is_applied(*handle))
            }),
            ProcGuard::RequireCrit => event.hit_mask.contains(ProcHitMask::CRITICAL),
            ProcGuard::Never => false,
        }
    }

    fn run_default(
        &mut self,
        env: &CombatEnv<'_>,
        firing: &Firing,
        payload: DefaultPayload,
        holder: UnitId,
        other: Option<UnitId>,
    ) {
        match payload {
            DefaultPayload::TriggerSpell(spell) => {
                let template = match env.template(spell) {
                    Ok(template) => template,
                    Err(_) => {
                        tracing::warn!(aura = %firing.spell, trigger = %spell, "unknown trigger spell skipped");
                        return;
                    }
                };
                let target = if template.is_positive() {
                    holder
                } else {
                    other.unwrap_or(holder)
                };
                self.cast_triggered(env, holder, target, spell);
            }
            DefaultPayload::Damage(amount) => {
                if let Some(target) = other {
                    self.proc_damage(env, firing, holder, target, amount, firing.school);
                }
            }
            DefaultPayload::AddStack => {
                if let Err(err) = self.modify_aura_stacks(env, firing.handle, 1) {
                    tracing::debug!(spell = %firing.spell, error = %err, "stack proc skipped");
                }
            }
        }
    }

    fn run_payload(
        &mut self,
        env: &CombatEnv<'_>,
        firing: &Firing,
        payload: ProcPayload,
        holder: UnitId,
        other: Option<UnitId>,
    ) {
        let pick = |on_holder: bool| {
            if on_holder {
                holder
            } else {
                other.unwrap_or(holder)
            }
        };
        match payload {
            ProcPayload::CastSpell { spell, on_holder } => {
                self.cast_triggered(env, holder, pick(on_holder), spell);
            }
            ProcPayload::ApplyAura { spell, on_holder } => {
                let target = pick(on_holder);
                if let Err(err) = self.apply_aura(env, holder, target, spell, ApplyParams::default()) {
                    tracing::debug!(%spell, %target, error = %err, "proc aura not applied");
                }
            }
            ProcPayload::RemoveAura { spell, on_holder } => {
                self.remove_auras(
                    env,
                    pick(on_holder),
                    AuraSelector::Spell(spell),
                    AuraRemoveMode::Default,
                );
            }
            ProcPayload::ModifyStack(delta) => {
                if let Err(err) = self.modify_aura_stacks(env, firing.handle, i16::from(delta)) {
                    tracing::debug!(spell = %firing.spell, error = %err, "stack proc skipped");
                }
            }
            ProcPayload::RemoveSelf => {
                self.release_aura(env, firing.handle, AuraRemoveMode::Default);
            }
            ProcPayload::Damage { amount, school } => {
                if let Some(target) = other {
                    self.proc_damage(env, firing, holder, target, amount, school);
                }
            }
        }
    }

    fn proc_damage(
        &mut self,
        env: &CombatEnv<'_>,
        firing: &Firing,
        holder: UnitId,
        target: UnitId,
        amount: u32,
        school: SchoolMask,
    ) {
        if !self.is_alive(target) {
            return;
        }
        let school = if school.is_empty() {
            SchoolMask::PHYSICAL
        } else {
            school
        };
        let info = DamageInfo::new(Some(holder), target, school, DamageKind::Direct, amount)
            .with_spell(firing.spell)
            .with_class(DamageClass::Magic);
        self.deal_damage(env, info);
    }

    /// Whether the proc of `caster`'s `spell` on `unit` is off cooldown.
    pub fn proc_ready(&self, unit: UnitId, caster: UnitId, spell: SpellId) -> bool {
        self.units
            .get(&unit)
            .is_none_or(|holder| holder.auras.proc_ready(caster, spell, self.now))
    }
}
