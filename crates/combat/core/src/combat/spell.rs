//! Direct spell damage.

use crate::aura::AuraType;
use crate::cast::CastSlot;
use crate::env::{CombatEnv, DamageClass, RollContext, SpellAttributes, SpellTemplate};
use crate::modifier::ModifierFilter;
use crate::state::{SpellId, UnitId};
use crate::world::{World, WorldError};

use super::{DamageInfo, DamageKind, DamageResult, HitOutcome, melee_miss_chance, spell_miss_chance};

impl World {
    /// Resolves `base` damage of `spell` from `caster` against `victim`.
    ///
    /// Magic spells roll the spell hit table, weapon spells the melee miss
    /// chance; spells without a damage class always hit. Immune victims
    /// report [`HitOutcome::Immune`].
    ///
    /// # Errors
    ///
    /// Returns `UnknownUnit`, `NotAlive` or an oracle error for bad input.
    pub fn spell_damage(
        &mut self,
        env: &CombatEnv<'_>,
        caster: UnitId,
        victim: UnitId,
        spell: SpellId,
        base: u32,
    ) -> Result<DamageResult, WorldError> {
        let template = env.template(spell)?;
        self.require_unit(caster)?;
        let victim_unit = self.require_unit(victim)?;
        if !victim_unit.is_alive() {
            return Err(WorldError::NotAlive(victim));
        }
        if !victim_unit.in_world {
            return Err(WorldError::NotInWorld(victim));
        }

        let kind = if template.cast_slot() == CastSlot::Channeled {
            DamageKind::Channel
        } else {
            DamageKind::Direct
        };
        let info = DamageInfo::new(Some(caster), victim, template.school, kind, 0)
            .with_spell(spell)
            .with_class(template.damage_class);

        if self.is_immune(victim, template) {
            self.engage(env, caster, victim);
            return Ok(self.resolve_avoided(env, &info.with_outcome(HitOutcome::Immune)));
        }
        if self.spell_misses(env, caster, victim, template) {
            self.engage(env, caster, victim);
            return Ok(self.resolve_avoided(env, &info.with_outcome(HitOutcome::Miss)));
        }

        let crit = !template.has_attribute(SpellAttributes::CANT_CRIT) && {
            let chance = self.spell_crit_chance(caster, Some(victim), template);
            chance > 0 && self.roll_bp(env, caster, RollContext::Crit) < chance
        };
        let mut amount = self.modified_damage(env, Some(caster), victim, template.school, base, Some(spell));
        let outcome = if crit {
            let tables = env.tables();
            let pct = match template.damage_class {
                DamageClass::Melee | DamageClass::Ranged => tables.melee_crit_pct,
                DamageClass::Magic | DamageClass::None => tables.spell_crit_pct,
            };
            amount = (u64::from(amount) * u64::from(pct) / 100).min(u64::from(u32::MAX)) as u32;
            HitOutcome::Crit
        } else {
            HitOutcome::Normal
        };

        let mut info = info.with_outcome(outcome);
        info.raw = amount;
        Ok(self.deal_damage(env, info))
    }

    fn is_immune(&self, victim: UnitId, template: &SpellTemplate) -> bool {
        if template.is_positive() || template.has_attribute(SpellAttributes::UNAFFECTED_BY_IMMUNITY) {
            return false;
        }
        self.view(victim).is_some_and(|view| {
            view.has_matching(AuraType::SchoolImmunity, &ModifierFilter::school(template.school))
        })
    }

    fn spell_misses(&mut self, env: &CombatEnv<'_>, caster: UnitId, victim: UnitId, template: &SpellTemplate) -> bool {
        let (Some(caster_unit), Some(victim_unit)) = (self.units.get(&caster), self.units.get(&victim)) else {
            return false;
        };
        let tables = env.tables();
        let chance = match template.damage_class {
            DamageClass::None => return false,
            DamageClass::Magic => {
                let bonus = self.view(caster).map_or(0, |view| {
                    view.total_modifier(AuraType::ModSpellHitChance, &ModifierFilter::school(template.school))
                });
                spell_miss_chance(tables, caster_unit.level, victim_unit.level, bonus.saturating_mul(100))
            }
            DamageClass::Melee | DamageClass::Ranged => {
                let bonus = self.view(caster).map_or(0, |view| {
                    view.total_modifier(AuraType::ModHitChance, &ModifierFilter::ANY)
                });
                melee_miss_chance(
                    tables,
                    caster_unit.weapon_skill(),
                    victim_unit.defense_skill(),
                    bonus.saturating_mul(100),
                )
            }
        };
        chance > 0 && self.roll_bp(env, caster, RollContext::HitTable) < chance
    }
}
