//! Aura timers: periodic ticks and expiry.

use arrayvec::ArrayVec;

use crate::combat::{DamageInfo, DamageKind, HealInfo};
use crate::config::CombatConfig;
use crate::env::{CombatEnv, DamageClass};
use crate::state::{Millis, PowerType, UnitId};
use crate::world::World;

use super::{AuraHandle, AuraRemoveMode, AuraType};

impl World {
    /// Advances every live aura by `diff`.
    ///
    /// Periodic effects tick for the part of `diff` the aura is still alive
    /// for, so a tick due exactly at expiry fires before the aura is removed.
    pub(crate) fn update_auras(&mut self, env: &CombatEnv<'_>, diff: Millis) {
        let handles: Vec<AuraHandle> = self.auras.handles().collect();
        for handle in handles {
            let Some(aura) = self.auras.get(handle) else {
                continue;
            };
            if aura.is_removed() {
                continue;
            }
            let alive_for = aura.remaining().map_or(diff, |remaining| remaining.min(diff));
            let periodic: ArrayVec<u8, { CombatConfig::MAX_EFFECTS }> = aura
                .effects()
                .iter()
                .filter(|effect| effect.aura_type().is_periodic() && !effect.amplitude.is_zero())
                .map(|effect| effect.index())
                .collect();

            for index in periodic {
                self.advance_periodic(env, handle, index, alive_for);
            }

            let Some(aura) = self.auras.get_mut(handle) else {
                continue;
            };
            if aura.is_removed() {
                continue;
            }
            aura.elapse(diff);
            if aura.is_expired() {
                self.release_aura(env, handle, AuraRemoveMode::Expire);
            }
        }
    }

    fn advance_periodic(&mut self, env: &CombatEnv<'_>, handle: AuraHandle, index: u8, elapsed: Millis) {
        let mut left = elapsed;
        loop {
            let Some(aura) = self.auras.get_mut(handle) else {
                return;
            };
            if aura.is_removed() {
                return;
            }
            let Some(effect) = aura.effect_mut(index) else {
                return;
            };
            if effect.period_timer > left {
                effect.period_timer = effect.period_timer - left;
                return;
            }
            left = left - effect.period_timer;
            effect.period_timer = effect.amplitude;
            self.periodic_tick(env, handle, index);
        }
    }

    /// Fires one tick of a periodic effect on every target of the aura.
    pub(crate) fn periodic_tick(&mut self, env: &CombatEnv<'_>, handle: AuraHandle, index: u8) {
        let Some(aura) = self.auras.get(handle) else {
            return;
        };
        let Some(effect) = aura.effect(index) else {
            return;
        };
        let caster = aura.caster();
        let spell = aura.spell();
        let school = aura.school();
        let aura_type = effect.aura_type();
        let amount = effect.amount().max(0) as u32;
        let misc = effect.misc_value();
        let targets: Vec<UnitId> = aura.targets().to_vec();

        for target in targets {
            if !self.is_alive(target) {
                continue;
            }
            let applied = self.units.get(&target).is_some_and(|unit| {
                unit.auras
                    .application(handle)
                    .is_some_and(|app| !app.is_removing() && app.has_effect(index))
            });
            if !applied {
                continue;
            }
            match aura_type {
                AuraType::PeriodicDamage => {
                    let base = self.modified_damage(env, Some(caster), target, school, amount, Some(spell));
                    let info = DamageInfo::new(Some(caster), target, school, DamageKind::Periodic, base)
                        .with_spell(spell)
                        .with_class(DamageClass::Magic);
                    self.deal_damage(env, info);
                }
                AuraType::PeriodicHeal => {
                    let info = HealInfo::new(Some(caster), target, amount)
                        .with_spell(spell)
                        .periodic();
                    self.heal(env, info);
                }
                AuraType::PeriodicEnergize => match PowerType::from_misc(misc) {
                    Some(power) => {
                        if let Some(unit) = self.units.get_mut(&target) {
                            unit.powers.restore(power, amount);
                        }
                    }
                    None => tracing::warn!(%spell, misc, "energize with unknown power type"),
                },
                _ => {}
            }
        }
    }
}
