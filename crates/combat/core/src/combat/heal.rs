//! Healing.

use crate::aura::{AuraType, SpellModOp};
use crate::env::{CombatEnv, RollContext, SpellAttributes, SpellTemplate};
use crate::modifier::ModifierFilter;
use crate::procs::{ProcEvent, ProcFlags, ProcHitMask};
use crate::state::UnitId;
use crate::world::{CombatEvent, World};

use super::{HealInfo, HealResult, SchoolMask};

impl World {
    /// Heals `info.target`.
    ///
    /// Heal-absorb shields take their share first; whatever exceeds the
    /// target's maximum health is reported as overheal. Dead targets gain
    /// nothing.
    pub fn heal(&mut self, env: &CombatEnv<'_>, info: HealInfo) -> HealResult {
        let target = info.target;
        let Some(unit) = self.units.get(&target) else {
            return HealResult::default();
        };
        if !unit.is_alive() || !unit.in_world {
            return HealResult {
                requested: info.amount,
                target_health: unit.health.current,
                ..HealResult::default()
            };
        }

        let school = info
            .spell
            .and_then(|spell| env.template(spell).ok())
            .map(|template| template.school)
            .unwrap_or(SchoolMask::HOLY);
        let mut amount = i64::from(info.amount);
        if let Some(view) = info.healer.and_then(|healer| self.view(healer)) {
            amount += i64::from(view.total_modifier(AuraType::ModHealingDone, &ModifierFilter::school(school)));
        }
        let mut amount = amount.clamp(0, i64::from(u32::MAX)) as u32;
        if info.crit {
            amount = (u64::from(amount) * u64::from(env.tables().heal_crit_pct) / 100)
                .min(u64::from(u32::MAX)) as u32;
        }
        if let Some(view) = self.view(target) {
            amount = view
                .total_multiplier(AuraType::ModHealingPercentTaken, &ModifierFilter::ANY)
                .apply(amount);
        }

        let absorbed = self.absorb_heal(env, target, amount);
        let Some(unit) = self.units.get_mut(&target) else {
            return HealResult::default();
        };
        let effective = unit.health.restore(amount - absorbed);
        let overheal = amount - absorbed - effective;
        let result = HealResult {
            requested: amount,
            absorbed,
            effective,
            overheal,
            crit: info.crit,
            target_health: unit.health.current,
        };
        let in_combat = unit.is_in_combat();
        let watchers: Vec<UnitId> = unit.session.hostile_refs().iter().copied().collect();

        tracing::trace!(healer = ?info.healer, %target, effective, overheal, "heal resolved");
        self.emit(CombatEvent::HealReceived {
            target,
            healer: info.healer,
            amount: effective,
            overheal,
        });

        if let Some(healer) = info.healer
            && healer != target
        {
            if in_combat {
                self.enter_combat(env, healer);
            }
            if effective > 0 {
                for holder in watchers {
                    self.emit(CombatEvent::ThreatNotified {
                        holder,
                        target: healer,
                        amount: effective,
                    });
                }
            }
        }

        let (actor_flags, victim_flags) = ProcEvent::heal_flags(info.periodic);
        let crit_mask = if info.crit {
            ProcHitMask::CRITICAL
        } else {
            ProcHitMask::NORMAL
        };
        let actor_flags = if info.healer.is_some() {
            actor_flags
        } else {
            ProcFlags::empty()
        };
        let event = ProcEvent::new(info.healer, target)
            .with_flags(actor_flags, victim_flags)
            .with_hit_mask(ProcHitMask::HEAL | crit_mask)
            .with_school(school)
            .with_spell(info.spell)
            .with_amount(effective);
        self.dispatch_procs(env, &event);
        result
    }

    /// Direct heal from a resolving spell, with its crit roll.
    pub(crate) fn spell_heal(
        &mut self,
        env: &CombatEnv<'_>,
        caster: UnitId,
        target: UnitId,
        template: &SpellTemplate,
        amount: u32,
    ) -> HealResult {
        let crit = !template.has_attribute(SpellAttributes::CANT_CRIT) && {
            let chance = self.spell_crit_chance(caster, None, template);
            chance > 0 && self.roll_bp(env, caster, RollContext::Crit) < chance
        };
        let mut info = HealInfo::new(Some(caster), target, amount).with_spell(template.id);
        info.crit = crit;
        self.heal(env, info)
    }

    /// Spell crit chance in basis points, including the victim's
    /// attacker-crit auras when a victim is given.
    pub(crate) fn spell_crit_chance(&self, caster: UnitId, victim: Option<UnitId>, template: &SpellTemplate) -> u32 {
        let Some(unit) = self.units.get(&caster) else {
            return 0;
        };
        let mut chance = i64::from(unit.stats.spell_crit_chance);
        if let Some(view) = self.view(caster) {
            chance += i64::from(view.total_modifier(
                AuraType::ModSpellCritChance,
                &ModifierFilter::school(template.school),
            )) * 100;
            let mods = ModifierFilter::misc(SpellModOp::CritChance.as_misc())
                .with_family(template.family_flags);
            chance += i64::from(view.total_modifier(AuraType::AddFlatModifier, &mods)) * 100;
        }
        if let Some(view) = victim.and_then(|victim| self.view(victim)) {
            chance += i64::from(view.total_modifier(AuraType::ModAttackerCritChance, &ModifierFilter::ANY)) * 100;
        }
        chance.clamp(0, 10_000) as u32
    }
}
