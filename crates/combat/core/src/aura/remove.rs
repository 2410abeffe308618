//! Staged aura removal.
//!
//! Removing an application runs in this order:
//!
//! 1. flag the application as removing and drop it from every store index
//! 2. run the on-remove hook of each applied sub-effect, ascending index
//! 3. detach the application and emit `AuraRemoved`
//! 4. once the aura has no application left, release it from the arena,
//!    clear its holder and caster links, then run its on-remove links
//!
//! Hooks and links may remove other auras, including ones on the worklist of
//! an outer removal. Worklists are therefore snapshots of handles, and each
//! handle is re-validated right before it is acted on.

use arrayvec::ArrayVec;

use crate::config::CombatConfig;
use crate::env::{CombatEnv, SpellLink};
use crate::state::{SpellId, UnitId};
use crate::world::{CombatEvent, World};

use super::{AuraHandle, AuraInterruptFlags, AuraRemoveMode, AuraSelector, AuraType};

impl World {
    /// Removes every application on `unit` matching `selector`.
    ///
    /// Returns how many applications this call removed.
    pub fn remove_auras(
        &mut self,
        env: &CombatEnv<'_>,
        unit: UnitId,
        selector: AuraSelector,
        mode: AuraRemoveMode,
    ) -> usize {
        let Some(holder) = self.units.get(&unit) else {
            return 0;
        };
        let worklist: Vec<AuraHandle> = holder
            .auras
            .applications()
            .iter()
            .filter(|app| !app.is_removing())
            .filter(|app| {
                self.auras
                    .get(app.handle)
                    .is_some_and(|aura| selector.matches(app, aura))
            })
            .map(|app| app.handle)
            .collect();

        let mut removed = 0;
        for handle in worklist {
            let still_applied = self
                .units
                .get(&unit)
                .is_some_and(|holder| holder.auras.is_applied(handle));
            if still_applied && self.remove_application(env, unit, handle, mode) {
                removed += 1;
            }
        }
        removed
    }

    /// Removes every aura on `unit` whose interrupt flags intersect `flags`,
    /// except auras of `except` (the spell causing the break).
    pub(crate) fn break_auras(
        &mut self,
        env: &CombatEnv<'_>,
        unit: UnitId,
        flags: AuraInterruptFlags,
        except: Option<SpellId>,
    ) -> usize {
        let Some(holder) = self.units.get(&unit) else {
            return 0;
        };
        let worklist: Vec<AuraHandle> = holder
            .auras
            .interruptible()
            .iter()
            .filter(|(_, interrupt)| interrupt.intersects(flags))
            .map(|(handle, _)| *handle)
            .filter(|handle| {
                except.is_none_or(|spell| {
                    self.auras
                        .get(*handle)
                        .is_some_and(|aura| aura.spell() != spell)
                })
            })
            .collect();

        let mut removed = 0;
        for handle in worklist {
            let still_applied = self
                .units
                .get(&unit)
                .is_some_and(|holder| holder.auras.is_applied(handle));
            if still_applied && self.remove_application(env, unit, handle, AuraRemoveMode::Interrupt) {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!(%unit, ?flags, removed, "auras broken");
        }
        removed
    }

    /// Removes one application. Removing it from the aura's holder releases
    /// the aura from every target.
    pub(crate) fn remove_application(
        &mut self,
        env: &CombatEnv<'_>,
        unit: UnitId,
        handle: AuraHandle,
        mode: AuraRemoveMode,
    ) -> bool {
        let Some(aura) = self.auras.get(handle) else {
            return false;
        };
        if aura.owner() == unit {
            return self.release_aura(env, handle, mode);
        }
        self.detach_application(env, unit, handle, mode)
    }

    /// Tears down every application of the aura and frees it.
    pub(crate) fn release_aura(
        &mut self,
        env: &CombatEnv<'_>,
        handle: AuraHandle,
        mode: AuraRemoveMode,
    ) -> bool {
        let Some(aura) = self.auras.get_mut(handle) else {
            return false;
        };
        if aura.is_removed() {
            return false;
        }
        aura.mark_removed();
        let owner = aura.owner();
        let mut targets = aura.targets.clone();
        // holder last so area targets lose the aura first
        targets.sort_by_key(|target| *target == owner);

        for target in targets {
            self.detach_application(env, target, handle, mode);
        }
        self.finalize_release(env, handle);
        true
    }

    fn detach_application(
        &mut self,
        env: &CombatEnv<'_>,
        unit: UnitId,
        handle: AuraHandle,
        mode: AuraRemoveMode,
    ) -> bool {
        let Some(holder) = self.units.get_mut(&unit) else {
            return false;
        };
        if !holder.auras.begin_removal(handle, mode) {
            return false;
        }
        let mask = holder
            .auras
            .application(handle)
            .map(|app| app.effect_mask)
            .unwrap_or(0);

        let Some(aura) = self.auras.get(handle) else {
            return false;
        };
        let spell = aura.spell();
        let hooks: ArrayVec<(u8, AuraType), { CombatConfig::MAX_EFFECTS }> = aura
            .effects()
            .iter()
            .filter(|effect| mask & effect.bit() != 0)
            .map(|effect| (effect.index(), effect.aura_type()))
            .collect();
        for (index, aura_type) in hooks {
            self.on_effect_removed(env, unit, handle, index, aura_type, mode);
        }

        if let Some(holder) = self.units.get_mut(&unit) {
            holder.auras.detach(handle);
        }
        // hooks may already have released the aura
        let orphaned = match self.auras.get_mut(handle) {
            Some(aura) => {
                aura.targets.retain(|target| *target != unit);
                let orphaned = aura.targets.is_empty() && !aura.is_removed();
                if orphaned {
                    aura.mark_removed();
                }
                orphaned
            }
            None => false,
        };

        tracing::debug!(%spell, %unit, ?mode, "aura removed");
        self.emit(CombatEvent::AuraRemoved {
            target: unit,
            spell,
            handle,
            mode,
        });

        if orphaned {
            self.finalize_release(env, handle);
        }
        true
    }

    fn finalize_release(&mut self, env: &CombatEnv<'_>, handle: AuraHandle) {
        let Some(aura) = self.auras.remove(handle) else {
            return;
        };
        if let Some(holder) = self.units.get_mut(&aura.owner()) {
            holder.auras.remove_owned(handle);
        }
        if let Some(caster) = self.units.get_mut(&aura.caster()) {
            caster.auras.unlink_single_target(handle);
        }

        let Ok(template) = env.template(aura.spell()) else {
            return;
        };
        for link in &template.links {
            match *link {
                SpellLink::CastOnRemove(linked) => {
                    self.cast_triggered(env, aura.caster(), aura.owner(), linked);
                }
                SpellLink::RemoveOnRemove(linked) => {
                    self.remove_auras(
                        env,
                        aura.owner(),
                        AuraSelector::Spell(linked),
                        AuraRemoveMode::Default,
                    );
                }
                SpellLink::CastOnApply(_) => {}
            }
        }
    }
}
