//! Damage absorption by shields.
//!
//! School shields are consulted first, oldest application first, then mana
//! shields. Each shield takes what it can from the remaining damage and is
//! removed with `Depleted` once empty.

use crate::aura::{AuraHandle, AuraRemoveMode, AuraType, EffectRef};
use crate::env::CombatEnv;
use crate::modifier::ModifierFilter;
use crate::state::{PowerType, UnitId};
use crate::world::World;

use super::DamageInfo;

/// Mana drained for every 100 points absorbed when the shield declares none.
const DEFAULT_MANA_PER_HUNDRED: i32 = 100;

impl World {
    /// Runs the victim's shields against `info`; returns the amount absorbed.
    pub(crate) fn absorb_damage(&mut self, env: &CombatEnv<'_>, info: &mut DamageInfo) -> u32 {
        let victim = info.victim;
        let filter = ModifierFilter::school(info.school);
        let mut depleted: Vec<AuraHandle> = Vec::new();
        let mut absorbed = 0;

        for effect in self.shield_effects(victim, AuraType::SchoolAbsorb, &filter) {
            if info.remaining() == 0 {
                break;
            }
            let Some(shield) = self
                .auras
                .get_mut(effect.handle)
                .and_then(|aura| aura.effect_mut(effect.effect))
            else {
                continue;
            };
            let capacity = shield.amount.max(0) as u32;
            let taken = info.absorb(capacity);
            shield.amount -= taken as i32;
            absorbed += taken;
            if shield.amount <= 0 {
                depleted.push(effect.handle);
            }
        }

        for effect in self.shield_effects(victim, AuraType::ManaShield, &filter) {
            if info.remaining() == 0 {
                break;
            }
            let mana = self
                .units
                .get(&victim)
                .map(|unit| unit.powers.current(PowerType::Mana))
                .unwrap_or(0);
            let Some(shield) = self
                .auras
                .get_mut(effect.handle)
                .and_then(|aura| aura.effect_mut(effect.effect))
            else {
                continue;
            };
            let ratio = if shield.multiplier > 0 {
                shield.multiplier
            } else {
                DEFAULT_MANA_PER_HUNDRED
            } as u64;
            let affordable = (u64::from(mana) * 100 / ratio).min(u64::from(u32::MAX)) as u32;
            let capacity = (shield.amount.max(0) as u32).min(affordable);
            let taken = info.absorb(capacity);
            shield.amount -= taken as i32;
            if shield.amount <= 0 {
                depleted.push(effect.handle);
            }
            absorbed += taken;
            let drain = (u64::from(taken) * ratio).div_ceil(100) as u32;
            if let Some(unit) = self.units.get_mut(&victim) {
                unit.powers.drain(PowerType::Mana, drain);
            }
        }

        info.finish_absorb();
        for handle in depleted {
            self.release_aura(env, handle, AuraRemoveMode::Depleted);
        }
        absorbed
    }

    /// Applied shield effects of `aura_type` matching `filter`, in
    /// application order.
    fn shield_effects(&self, unit: UnitId, aura_type: AuraType, filter: &ModifierFilter) -> Vec<EffectRef> {
        let Some(holder) = self.units.get(&unit) else {
            return Vec::new();
        };
        holder
            .auras
            .effects_of_type(aura_type)
            .iter()
            .copied()
            .filter(|effect| {
                holder.auras.is_applied(effect.handle)
                    && self
                        .auras
                        .get(effect.handle)
                        .and_then(|aura| aura.effect(effect.effect))
                        .is_some_and(|shield| shield.amount() > 0 && filter.matches(shield))
            })
            .collect()
    }

    /// Heal-absorb shields on `target`; returns how much of `amount` they took.
    pub(crate) fn absorb_heal(&mut self, env: &CombatEnv<'_>, target: UnitId, amount: u32) -> u32 {
        let mut left = amount;
        let mut depleted: Vec<AuraHandle> = Vec::new();
        for effect in self.shield_effects(target, AuraType::SchoolHealAbsorb, &ModifierFilter::ANY) {
            if left == 0 {
                break;
            }
            let Some(shield) = self
                .auras
                .get_mut(effect.handle)
                .and_then(|aura| aura.effect_mut(effect.effect))
            else {
                continue;
            };
            let taken = left.min(shield.amount.max(0) as u32);
            shield.amount -= taken as i32;
            left -= taken;
            if shield.amount <= 0 {
                depleted.push(effect.handle);
            }
        }
        for handle in depleted {
            self.release_aura(env, handle, AuraRemoveMode::Depleted);
        }
        amount - left
    }
}
