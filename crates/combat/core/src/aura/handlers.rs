//! Per-aura-type apply and remove hooks.
//!
//! Most aura types are read lazily through the modifier aggregator and need
//! no hook at all. The ones here change unit state that other systems read
//! directly: control flags, maximum health and casts broken by crowd control.

use crate::cast::InterruptStrength;
use crate::env::CombatEnv;
use crate::state::{ControlFlags, UnitId};
use crate::world::World;

use super::{AuraHandle, AuraRemoveMode, AuraType};
use crate::modifier::ModifierFilter;

fn control_flag(aura_type: AuraType) -> Option<ControlFlags> {
    match aura_type {
        AuraType::ModStun => Some(ControlFlags::STUNNED),
        AuraType::ModRoot => Some(ControlFlags::ROOTED),
        AuraType::ModConfuse => Some(ControlFlags::CONFUSED),
        AuraType::ModSilence => Some(ControlFlags::SILENCED),
        AuraType::Mounted => Some(ControlFlags::MOUNTED),
        _ => None,
    }
}

impl World {
    pub(crate) fn on_effect_applied(
        &mut self,
        env: &CombatEnv<'_>,
        unit: UnitId,
        handle: AuraHandle,
        index: u8,
        aura_type: AuraType,
    ) {
        tracing::trace!(%unit, ?handle, index, aura = aura_type.name(), "effect applied");
        if let Some(flag) = control_flag(aura_type)
            && let Some(holder) = self.units.get_mut(&unit)
        {
            holder.control.insert(flag);
        }

        match aura_type {
            AuraType::ModStun | AuraType::ModConfuse => {
                self.attack_stop(unit);
                self.interrupt_all_casts(env, unit, InterruptStrength::Hard);
            }
            AuraType::ModSilence => {
                self.interrupt_spell_casts(env, unit, InterruptStrength::Hard);
            }
            AuraType::ModIncreaseHealth => self.recalc_max_health(unit),
            _ => {}
        }
    }

    pub(crate) fn on_effect_removed(
        &mut self,
        _env: &CombatEnv<'_>,
        unit: UnitId,
        handle: AuraHandle,
        index: u8,
        aura_type: AuraType,
        mode: AuraRemoveMode,
    ) {
        tracing::trace!(%unit, ?handle, index, aura = aura_type.name(), ?mode, "effect removed");
        if let Some(flag) = control_flag(aura_type) {
            // the removing application is already unindexed, so this only
            // sees other auras of the same type
            let still_held = self
                .view(unit)
                .is_some_and(|view| view.has_aura_type(aura_type));
            if !still_held && let Some(holder) = self.units.get_mut(&unit) {
                holder.control.remove(flag);
            }
        }

        if aura_type == AuraType::ModIncreaseHealth {
            self.recalc_max_health(unit);
        }
    }

    /// Recomputes maximum health from the base value and health auras,
    /// clamping current health into the new range.
    pub(crate) fn recalc_max_health(&mut self, unit: UnitId) {
        let Some(bonus) = self.view(unit).map(|view| {
            view.total_modifier(AuraType::ModIncreaseHealth, &ModifierFilter::ANY)
        }) else {
            return;
        };
        let Some(holder) = self.units.get_mut(&unit) else {
            return;
        };
        let maximum = (i64::from(holder.base_max_health) + i64::from(bonus)).max(1);
        let maximum = maximum.min(i64::from(u32::MAX)) as u32;
        if maximum != holder.health.maximum {
            holder.health.set_maximum(maximum);
            tracing::debug!(%unit, maximum, "max health recalculated");
        }
    }
}
