//! Weapon attacks: the melee hit table, queued next-swing spells and
//! damage shields.

use crate::aura::{ApplyParams, AuraInterruptFlags, AuraType};
use crate::cast::CastSlot;
use crate::env::{CombatEnv, DamageClass, EffectKind, RollContext, SpellAttributes, SpellTemplate};
use crate::modifier::ModifierFilter;
use crate::state::{AttackType, ControlFlags, SpellId, UnitFlags, UnitId};
use crate::world::{CombatEvent, World, WorldError};

use super::{
    DamageFlags, DamageInfo, DamageKind, DamageResult, HitInfo, HitOutcome, MeleeHitTable,
    SchoolMask, avoidance_chance, crushing_chance, glancing_chance, melee_miss_chance,
};

impl World {
    /// One weapon swing of `attacker` at `victim`.
    ///
    /// A spell queued in the melee slot is consumed by the swing: its direct
    /// damage is added to the weapon roll and its aura effects land with the
    /// hit.
    ///
    /// # Errors
    ///
    /// Returns `UnknownUnit`, `SelfTarget` or `NotAlive`.
    pub fn melee_attack(
        &mut self,
        env: &CombatEnv<'_>,
        attacker: UnitId,
        victim: UnitId,
        attack: AttackType,
    ) -> Result<DamageResult, WorldError> {
        if attacker == victim {
            return Err(WorldError::SelfTarget(attacker));
        }
        if !self.require_unit(attacker)?.is_alive() {
            return Err(WorldError::NotAlive(attacker));
        }
        let victim_unit = self.require_unit(victim)?;
        if !victim_unit.is_alive() || !victim_unit.in_world {
            return Err(WorldError::NotAlive(victim));
        }
        let evading = victim_unit.is_evading();

        self.break_auras(env, attacker, AuraInterruptFlags::MELEE_ATTACK, None);
        let queued = if attack == AttackType::Ranged {
            None
        } else {
            self.take_queued_swing(env, attacker)
        };
        let spell = queued.map(|template| template.id);
        let school = queued
            .map(|template| template.school)
            .filter(|school| !school.is_empty())
            .unwrap_or(SchoolMask::PHYSICAL);
        let (kind, class) = match (queued, attack) {
            (Some(_), _) => (DamageKind::Direct, DamageClass::Melee),
            (None, AttackType::Ranged) => (DamageKind::Auto(attack), DamageClass::Ranged),
            (None, _) => (DamageKind::Auto(attack), DamageClass::Melee),
        };
        let mut info = DamageInfo::new(Some(attacker), victim, school, kind, 0).with_class(class);
        if let Some(spell) = spell {
            info = info.with_spell(spell);
        }

        if evading {
            self.engage(env, attacker, victim);
            return Ok(self.resolve_avoided(env, &info.with_outcome(HitOutcome::Evade)));
        }

        let outcome = self.roll_melee_outcome(env, attacker, victim, attack, queued);
        if !outcome.lands() {
            tracing::trace!(%attacker, %victim, ?outcome, "swing avoided");
            self.engage(env, attacker, victim);
            return Ok(self.resolve_avoided(env, &info.with_outcome(outcome)));
        }

        let raw = self.weapon_roll(env, attacker, attack) + queued.map_or(0, queued_bonus);
        let mut amount = self.modified_damage(env, Some(attacker), victim, school, raw, spell);
        let tables = env.tables();
        let pct = match outcome {
            HitOutcome::Crit => tables.melee_crit_pct,
            HitOutcome::Glancing => tables.glancing_damage_pct,
            HitOutcome::Crushing => tables.crushing_damage_pct,
            _ => 100,
        };
        amount = (u64::from(amount) * u64::from(pct) / 100).min(u64::from(u32::MAX)) as u32;

        let mut info = info.with_outcome(outcome);
        info.raw = amount;
        let result = self.deal_damage(env, info);

        if let Some(template) = queued {
            let mask = template.aura_effect_mask();
            if mask != 0 && self.is_alive(victim) {
                let params = ApplyParams::default().with_effect_mask(mask);
                if let Err(err) = self.apply_aura(env, attacker, victim, template.id, params) {
                    tracing::debug!(spell = %template.id, %victim, error = %err, "swing aura not applied");
                }
            }
        }
        if attack != AttackType::Ranged {
            self.reflect_damage_shields(env, victim, attacker);
        }
        Ok(result)
    }

    /// Pops the spell queued onto the next swing, paying its cost.
    fn take_queued_swing<'a>(&mut self, env: &CombatEnv<'a>, attacker: UnitId) -> Option<&'a SpellTemplate> {
        let cast = self
            .units
            .get_mut(&attacker)
            .and_then(|unit| unit.casts.take(CastSlot::Melee))?;
        let template = match env.template(cast.spell) {
            Ok(template) => template,
            Err(err) => {
                tracing::warn!(%attacker, spell = %cast.spell, error = %err, "queued swing dropped");
                return None;
            }
        };
        if !self.pay_power(attacker, template) {
            self.emit(CombatEvent::CastInterrupted {
                caster: attacker,
                spell: cast.spell,
                slot: CastSlot::Melee,
            });
            return None;
        }
        self.emit(CombatEvent::CastFinished {
            caster: attacker,
            spell: cast.spell,
            slot: CastSlot::Melee,
        });
        Some(template)
    }

    fn weapon_roll(&mut self, env: &CombatEnv<'_>, attacker: UnitId, attack: AttackType) -> u32 {
        let Some(weapon) = self.units.get(&attacker).map(|unit| *unit.stats.weapon(attack)) else {
            return 0;
        };
        if weapon.max_damage <= weapon.min_damage {
            return weapon.min_damage;
        }
        self.roll_range(env, attacker, weapon.min_damage, weapon.max_damage)
    }

    /// Builds the attacker-vs-victim hit table and rolls it once.
    fn roll_melee_outcome(
        &mut self,
        env: &CombatEnv<'_>,
        attacker: UnitId,
        victim: UnitId,
        attack: AttackType,
        queued: Option<&SpellTemplate>,
    ) -> HitOutcome {
        let table = self.melee_hit_table(env, attacker, victim, attack, queued);
        if attack == AttackType::Ranged {
            let deflect = self.view(victim).map_or(0, |view| {
                view.total_modifier(AuraType::ModDeflectChance, &ModifierFilter::ANY)
            });
            if deflect > 0 {
                let chance = (deflect.min(100) as u32) * 100;
                if self.roll_bp(env, attacker, RollContext::HitTable) < chance {
                    return HitOutcome::Deflect;
                }
            }
        }
        let roll = self.roll_bp(env, attacker, RollContext::HitTable);
        table.roll(roll)
    }

    pub(crate) fn melee_hit_table(
        &self,
        env: &CombatEnv<'_>,
        attacker: UnitId,
        victim: UnitId,
        attack: AttackType,
        queued: Option<&SpellTemplate>,
    ) -> MeleeHitTable {
        let (Some(a), Some(v), Some(av), Some(vv)) = (
            self.units.get(&attacker),
            self.units.get(&victim),
            self.view(attacker),
            self.view(victim),
        ) else {
            return MeleeHitTable::default();
        };
        let tables = env.tables();
        let weapon_skill = a.weapon_skill();
        let defense_skill = v.defense_skill();
        let helpless = v.control.intersects(ControlFlags::STUNNED);
        let pct = |value: i32| value.saturating_mul(100);

        let hit_bonus = pct(av.total_modifier(AuraType::ModHitChance, &ModifierFilter::ANY));
        let miss = melee_miss_chance(tables, weapon_skill, defense_skill, hit_bonus);

        let avoid = |flag: UnitFlags, base: u32, aura: AuraType| {
            if helpless || !v.flags.contains(flag) {
                return 0;
            }
            let base = base as i32 + pct(vv.total_modifier(aura, &ModifierFilter::ANY));
            avoidance_chance(tables, base, weapon_skill, defense_skill)
        };
        let dodge = avoid(UnitFlags::CAN_DODGE, v.stats.dodge_chance, AuraType::ModDodgePercent);
        let parry = if attack == AttackType::Ranged {
            0
        } else {
            avoid(UnitFlags::CAN_PARRY, v.stats.parry_chance, AuraType::ModParryPercent)
        };
        let block = avoid(UnitFlags::CAN_BLOCK, v.stats.block_chance, AuraType::ModBlockPercent);

        let can_crit = queued.is_none_or(|template| !template.has_attribute(SpellAttributes::CANT_CRIT));
        let crit = if can_crit {
            let chance = a.stats.crit_chance as i32
                + pct(av.total_modifier(AuraType::ModCritPercent, &ModifierFilter::ANY))
                + pct(vv.total_modifier(AuraType::ModAttackerCritChance, &ModifierFilter::ANY));
            chance.clamp(0, 10_000) as u32
        } else {
            0
        };
        let auto_crit = can_crit && vv.has_aura_type(AuraType::ModAutoCritTaken);

        let weapon_swing = queued.is_none() && attack != AttackType::Ranged;
        let glancing = if weapon_swing && a.is_player_controlled() && !v.is_player_controlled() {
            glancing_chance(tables, a.level, v.level)
        } else {
            0
        };
        let crushing = if !a.is_player_controlled() && attack != AttackType::Ranged {
            crushing_chance(tables, weapon_skill, defense_skill)
        } else {
            0
        };

        MeleeHitTable {
            miss,
            auto_crit,
            dodge,
            parry,
            block,
            crit,
            glancing,
            crushing,
        }
    }

    /// Damage shields on `victim` strike back at `attacker`.
    fn reflect_damage_shields(&mut self, env: &CombatEnv<'_>, victim: UnitId, attacker: UnitId) {
        let Some(holder) = self.units.get(&victim) else {
            return;
        };
        let shields: Vec<(SpellId, SchoolMask, u32)> = holder
            .auras
            .effects_of_type(AuraType::DamageShield)
            .iter()
            .filter(|effect| holder.auras.is_applied(effect.handle))
            .filter_map(|effect| {
                let aura = self.auras.get(effect.handle)?;
                let amount = aura.effect(effect.effect)?.amount();
                (amount > 0).then(|| (aura.spell(), aura.school(), amount as u32))
            })
            .collect();

        for (spell, school, amount) in shields {
            if !self.is_alive(attacker) || !self.is_alive(victim) {
                return;
            }
            let school = if school.is_empty() {
                SchoolMask::NATURE
            } else {
                school
            };
            let mut info = DamageInfo::new(Some(victim), attacker, school, DamageKind::Direct, amount)
                .with_spell(spell)
                .with_class(DamageClass::Magic)
                .with_flags(DamageFlags::REFLECTED | DamageFlags::NO_REDIRECT);
            info.hit_info |= HitInfo::REFLECTED;
            self.deal_damage(env, info);
        }
    }
}

/// Direct damage a queued swing spell adds to the weapon roll.
fn queued_bonus(template: &SpellTemplate) -> u32 {
    template
        .effects
        .iter()
        .filter(|effect| effect.kind == EffectKind::SchoolDamage)
        .map(|effect| effect.base_points.max(0) as u32)
        .sum()
}
