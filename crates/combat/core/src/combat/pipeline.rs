//! The damage resolution pipeline.
//!
//! Every hostile amount, whatever its source, ends up in
//! [`World::deal_damage`]. The stages run in a fixed order and each can only
//! take from what the previous ones left:
//!
//! `raw -> armor -> block -> resist -> absorb -> split -> final`
//!
//! After the final amount is known the victim's health changes, events are
//! emitted, damage-broken auras and casts react, procs fire and, on lethal
//! damage, the death flow runs. Redirected portions are dealt last as
//! independent resolutions that can never redirect again.

use arrayvec::ArrayVec;

use crate::aura::{AuraInterruptFlags, AuraType, SpellModOp};
use crate::env::{CombatEnv, DamageClass, RollContext};
use crate::modifier::{ModifierFilter, PctChain};
use crate::procs::{ProcEvent, ProcFlags, ProcHitMask};
use crate::state::{AttackType, DeathState, SpellId, UnitId};
use crate::world::{CombatEvent, ResolutionRecord, World};

use super::{
    DamageFlags, DamageInfo, DamageKind, DamageResult, HitOutcome, SchoolMask, armor_mitigation_bp,
    average_resist_permille, mitigated_amount, resist_distribution, sample_resist,
};

/// Split auras a single resolution honours.
const MAX_SPLITS: usize = 4;

impl World {
    /// Resolves `info` against its victim and applies the result.
    ///
    /// Dead or unknown victims take nothing. An evading victim takes nothing
    /// and reports [`HitOutcome::Evade`].
    pub fn deal_damage(&mut self, env: &CombatEnv<'_>, mut info: DamageInfo) -> DamageResult {
        let victim = info.victim;
        let Some(victim_unit) = self.units.get(&victim) else {
            return DamageResult::default();
        };
        if !victim_unit.is_alive() || !victim_unit.in_world {
            return DamageResult::avoided(info.outcome, victim_unit.health.current);
        }
        let evading = victim_unit.is_evading();

        if let Some(attacker) = info.attacker {
            self.engage(env, attacker, victim);
        }
        if evading {
            info.outcome = HitOutcome::Evade;
            return self.resolve_avoided(env, &info);
        }

        self.mitigate_armor(env, &mut info);
        self.apply_block(&mut info);
        self.apply_resist(env, &mut info);
        self.absorb_damage(env, &mut info);
        let redirects = self.split_damage(&mut info);
        let final_damage = info.finish();

        debug_assert!(info.is_conserved(), "damage stages took more than raw");
        let (dealt, lethal, victim_health) = self.apply_health_loss(info.attacker, victim, final_damage);

        let mut result = DamageResult::from_info(&info);
        result.dealt = dealt;
        result.lethal = lethal;
        result.victim_health = victim_health;

        tracing::trace!(
            attacker = ?info.attacker,
            %victim,
            raw = info.raw,
            final_damage,
            dealt,
            lethal,
            "damage resolved"
        );
        self.emit_damage_events(&info, &result);

        if final_damage > 0 {
            self.break_auras(env, victim, AuraInterruptFlags::TAKE_DAMAGE, info.spell);
            if !info.is_periodic() {
                self.damage_pushback(env, victim);
            }
        }

        if !info.flags.contains(DamageFlags::NO_PROC) {
            let event = damage_proc_event(&info, final_damage);
            self.dispatch_procs(env, &event);
        }

        if lethal {
            self.kill(env, info.attacker, victim);
        }

        for (target, amount) in redirects {
            let redirected = DamageInfo::new(info.attacker, target, info.school, info.kind, amount)
                .with_class(info.class)
                .with_flags(DamageFlags::NO_REDIRECT);
            let redirected = match info.spell {
                Some(spell) => redirected.with_spell(spell),
                None => redirected,
            };
            self.deal_damage(env, redirected);
        }
        result
    }

    /// Damage done by `attacker` to `victim` before mitigation: flat and
    /// percent done modifiers, spell modifiers, the per-spell bonus table and
    /// the victim's taken modifiers.
    pub(crate) fn modified_damage(
        &self,
        env: &CombatEnv<'_>,
        attacker: Option<UnitId>,
        victim: UnitId,
        school: SchoolMask,
        base: u32,
        spell: Option<SpellId>,
    ) -> u32 {
        let filter = ModifierFilter::school(school);
        let mut amount = i64::from(base);
        let mut chain = PctChain::ONE;

        if let Some(view) = attacker.and_then(|attacker| self.view(attacker)) {
            amount += i64::from(view.total_modifier(AuraType::ModDamageDone, &filter));
            chain = chain.then(view.total_multiplier(AuraType::ModDamagePercentDone, &filter));
            if let Some(template) = spell.and_then(|spell| env.template(spell).ok()) {
                let mods = ModifierFilter::misc(SpellModOp::Damage.as_misc())
                    .with_family(template.family_flags);
                amount += i64::from(view.total_modifier(AuraType::AddFlatModifier, &mods));
                chain = chain.then_pct(view.total_modifier(AuraType::AddPctModifier, &mods));
            }
        }
        if let Some(spell) = spell {
            chain = chain.then_pct(env.damage_bonus_pct(spell));
        }
        if let Some(view) = self.view(victim) {
            amount += i64::from(view.total_modifier(AuraType::ModDamageTaken, &filter));
            chain = chain.then(view.total_multiplier(AuraType::ModDamagePercentTaken, &filter));
        }

        let amount = amount.clamp(0, i64::from(u32::MAX)) as u32;
        chain.apply(amount)
    }

    /// Emits the record and procs of an attack that never reached the
    /// pipeline (miss, dodge, parry, immune, evade, deflect).
    pub(crate) fn resolve_avoided(&mut self, env: &CombatEnv<'_>, info: &DamageInfo) -> DamageResult {
        let victim_health = self
            .units
            .get(&info.victim)
            .map(|unit| unit.health.current)
            .unwrap_or(0);
        let result = DamageResult::avoided(info.outcome, victim_health);
        tracing::trace!(attacker = ?info.attacker, victim = %info.victim, outcome = ?info.outcome, "attack avoided");
        self.emit(CombatEvent::Resolution(ResolutionRecord {
            actor: info.attacker,
            victim: info.victim,
            spell: info.spell,
            outcome: info.outcome,
            amount: 0,
            absorbed: 0,
            resisted: 0,
            blocked: 0,
            crit: false,
            lethal: false,
        }));
        if !info.flags.contains(DamageFlags::NO_PROC) {
            let event = damage_proc_event(info, 0);
            self.dispatch_procs(env, &event);
        }
        result
    }

    // ========================================================================
    // Stages
    // ========================================================================

    fn mitigate_armor(&self, env: &CombatEnv<'_>, info: &mut DamageInfo) {
        if !info.school.is_physical() || info.is_periodic() {
            return;
        }
        let Some(victim) = self.units.get(&info.victim) else {
            return;
        };
        let bonus = self.view(info.victim).map_or(0, |view| {
            view.total_modifier(AuraType::ModResistance, &ModifierFilter::school(SchoolMask::PHYSICAL))
        });
        let armor = victim.stats.armor.saturating_add(bonus);
        let level = self.attacker_level(info);
        let mitigation = armor_mitigation_bp(env.tables(), armor, level);
        info.mitigate(mitigated_amount(info.remaining(), mitigation));
    }

    fn apply_block(&self, info: &mut DamageInfo) {
        if info.outcome != HitOutcome::Block {
            return;
        }
        let value = self
            .units
            .get(&info.victim)
            .map(|unit| unit.stats.block_value)
            .unwrap_or(0);
        info.block(value);
    }

    fn apply_resist(&mut self, env: &CombatEnv<'_>, info: &mut DamageInfo) {
        if info.school.is_physical() || !info.school.intersects(SchoolMask::MAGIC) {
            return;
        }
        let school = info.school.first_school();
        let Some(victim) = self.units.get(&info.victim) else {
            return;
        };
        let bonus = self.view(info.victim).map_or(0, |view| {
            view.total_modifier(AuraType::ModResistance, &ModifierFilter::school(school.mask()))
        });
        let resistance = victim.stats.resistances[school.index()].saturating_add(bonus);
        let average = average_resist_permille(env.tables(), resistance, self.attacker_level(info));
        if average == 0 {
            return;
        }
        let weights = resist_distribution(average);
        let roll = self.roll_bp(env, info.victim, RollContext::Resist);
        let pct = sample_resist(&weights, roll);
        let resisted = (u64::from(info.remaining()) * u64::from(pct) / 100) as u32;
        info.resist(resisted);
    }

    /// Moves the split share of the damage off the victim; returns who takes it.
    fn split_damage(&self, info: &mut DamageInfo) -> ArrayVec<(UnitId, u32), MAX_SPLITS> {
        let mut redirects = ArrayVec::new();
        if info.flags.contains(DamageFlags::NO_REDIRECT) {
            return redirects;
        }
        let base = info.remaining();
        if base == 0 {
            return redirects;
        }
        let Some(holder) = self.units.get(&info.victim) else {
            return redirects;
        };

        let mut shares: ArrayVec<(UnitId, u32), MAX_SPLITS> = ArrayVec::new();
        let filter = ModifierFilter::school(info.school);
        for effect in holder.auras.effects_of_type(AuraType::SplitDamagePct) {
            let Some(aura) = self.auras.get(effect.handle) else {
                continue;
            };
            let Some(split) = aura.effect(effect.effect) else {
                continue;
            };
            if !holder.auras.is_applied(effect.handle) || !filter.matches(split) {
                continue;
            }
            let caster = aura.caster();
            if caster == info.victim || !self.is_alive(caster) {
                continue;
            }
            let amount = (u64::from(base) * split.amount().clamp(0, 100) as u64 / 100) as u32;
            if amount > 0 && shares.try_push((caster, amount)).is_err() {
                tracing::warn!(victim = %info.victim, "too many split auras; extra ignored");
                break;
            }
        }

        for (caster, amount) in shares {
            let taken = info.redirect(amount);
            if taken > 0 {
                redirects.push((caster, taken));
            }
        }
        redirects
    }

    /// Removes `amount` health. Returns `(dealt, lethal, health_after)`.
    ///
    /// Lethal damage from a duel opponent leaves the victim at 1 health and
    /// ends the duel instead.
    fn apply_health_loss(&mut self, attacker: Option<UnitId>, victim: UnitId, amount: u32) -> (u32, bool, u32) {
        let attacker_owner = attacker.and_then(|id| self.units.get(&id)).and_then(|unit| unit.owner);
        let Some(unit) = self.units.get_mut(&victim) else {
            return (0, false, 0);
        };
        let lethal = amount > 0 && amount >= unit.health.current;
        let duel = unit
            .duel_opponent
            .is_some_and(|opponent| attacker == Some(opponent) || attacker_owner == Some(opponent));

        if lethal && duel {
            let dealt = unit.health.drain(unit.health.current.saturating_sub(1));
            let health = unit.health.current;
            tracing::debug!(%victim, "duel lost");
            self.end_duel_of(victim);
            return (dealt, false, health);
        }

        let dealt = unit.health.drain(amount);
        if lethal {
            unit.death_state = DeathState::Dying;
        }
        (dealt, lethal, unit.health.current)
    }

    fn emit_damage_events(&mut self, info: &DamageInfo, result: &DamageResult) {
        let victim = info.victim;
        self.emit(CombatEvent::DamageTaken {
            victim,
            attacker: info.attacker,
            amount: result.dealt,
            school: info.school,
        });
        if let Some(attacker) = info.attacker {
            self.emit(CombatEvent::DamageDealt {
                attacker,
                victim,
                amount: result.dealt,
            });
        }
        self.emit(CombatEvent::Resolution(ResolutionRecord {
            actor: info.attacker,
            victim,
            spell: info.spell,
            outcome: info.outcome,
            amount: result.dealt,
            absorbed: result.absorbed,
            resisted: result.resisted,
            blocked: result.blocked,
            crit: info.outcome.is_crit(),
            lethal: result.lethal,
        }));

        if let Some(attacker) = info.attacker
            && result.final_damage > 0
        {
            let tracked = self
                .units
                .get(&victim)
                .is_some_and(|unit| unit.session.hostile_refs().contains(&attacker));
            if tracked {
                self.emit(CombatEvent::ThreatNotified {
                    holder: victim,
                    target: attacker,
                    amount: result.final_damage,
                });
            }
        }
    }

    fn attacker_level(&self, info: &DamageInfo) -> u8 {
        info.attacker
            .or(Some(info.victim))
            .and_then(|id| self.units.get(&id))
            .map(|unit| unit.level)
            .unwrap_or(1)
    }
}

/// Proc event describing a resolution with `final_damage` getting through.
fn damage_proc_event(info: &DamageInfo, final_damage: u32) -> ProcEvent {
    let (mut actor_flags, mut victim_flags) = ProcEvent::damage_flags(info.kind, info.class);
    if final_damage > 0 {
        victim_flags |= ProcFlags::TAKEN_DAMAGE;
    }
    if info.attacker.is_none() {
        actor_flags = ProcFlags::empty();
    }

    let mut hit_mask = info.outcome.hit_mask();
    if info.absorbed() > 0 {
        hit_mask |= ProcHitMask::ABSORB;
    }
    if info.resisted() > 0 {
        hit_mask |= ProcHitMask::RESIST;
    }
    if info.blocked() > 0 && info.remaining() == 0 {
        hit_mask |= ProcHitMask::FULL_BLOCK;
    }

    let event = ProcEvent::new(info.attacker, info.victim)
        .with_flags(actor_flags, victim_flags)
        .with_hit_mask(hit_mask)
        .with_school(info.school)
        .with_spell(info.spell)
        .with_amount(final_damage);
    match info.kind {
        DamageKind::Auto(attack) => event.with_attack_type(attack),
        _ if info.class == DamageClass::Ranged => event.with_attack_type(AttackType::Ranged),
        _ => event,
    }
}
