//! The death flow.

use crate::aura::{AuraRemoveMode, AuraSelector};
use crate::cast::InterruptStrength;
use crate::env::{CombatEnv, LootRequest, RollContext};
use crate::procs::{ProcEvent, ProcFlags, ProcHitMask};
use crate::state::{DeathState, UnitId};
use crate::world::{CombatEvent, World};

impl World {
    /// Runs the death of `victim`.
    ///
    /// Death procs fire first, while the victim's auras are still in place.
    /// Then the victim is marked dead, loses every aura that does not
    /// persist through death, stops casting and attacking, and drops out of
    /// combat on both sides. A non-player victim requests one loot fill.
    pub(crate) fn kill(&mut self, env: &CombatEnv<'_>, killer: Option<UnitId>, victim: UnitId) {
        let Some(unit) = self.units.get_mut(&victim) else {
            return;
        };
        if unit.death_state == DeathState::Dead {
            return;
        }
        unit.death_state = DeathState::Dying;
        unit.health.current = 0;
        let player = unit.is_player_controlled();

        let killer = killer.filter(|killer| *killer != victim);
        let victim_flags = if killer.is_some() {
            ProcFlags::KILLED | ProcFlags::DEATH
        } else {
            ProcFlags::DEATH
        };
        let actor_flags = if killer.is_some() {
            ProcFlags::KILL
        } else {
            ProcFlags::empty()
        };
        let event = ProcEvent::new(killer, victim)
            .with_flags(actor_flags, victim_flags)
            .with_hit_mask(ProcHitMask::NORMAL);
        self.dispatch_procs(env, &event);

        if let Some(unit) = self.units.get_mut(&victim) {
            unit.death_state = DeathState::Dead;
        }
        self.remove_auras(env, victim, AuraSelector::NotDeathPersistent, AuraRemoveMode::Death);
        self.interrupt_all_casts(env, victim, InterruptStrength::Hard);
        self.attack_stop(victim);
        self.stop_attackers_of(victim);
        self.drop_all_hostile_references(victim);
        self.end_duel_of(victim);
        self.leave_combat(victim);

        tracing::debug!(%victim, ?killer, "unit died");
        self.emit(CombatEvent::Death { victim, killer });

        if !player && let Some(killer) = killer {
            self.request_loot(env, victim, killer);
        }
    }

    fn request_loot(&mut self, env: &CombatEnv<'_>, source: UnitId, killer: UnitId) {
        let loot = match env.loot() {
            Ok(loot) => loot,
            Err(err) => {
                tracing::trace!(%source, error = %err, "no loot roller");
                return;
            }
        };
        // minions loot for their owner
        let looter = self
            .units
            .get(&killer)
            .and_then(|unit| unit.owner)
            .unwrap_or(killer);
        let request = LootRequest {
            source,
            looter,
            roll_seed: self.roll_seed(source, RollContext::Loot),
        };
        let items = loot.fill(&request);
        tracing::debug!(%source, %looter, items = items.len(), "loot filled");
        self.emit(CombatEvent::LootFilled {
            source,
            looter,
            items,
        });
    }
}
