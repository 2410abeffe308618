//! Combat state, hostile references, duels and auto-attack.
//!
//! A unit is in combat while it holds a hostile reference or its combat
//! timer is running. The timer restarts on every hostile action and the
//! unit leaves combat once it has run out with no reference left.
//!
//! Hostile references are only kept when at least one side is NPC
//! controlled; fights between players are tracked by the timer alone. The
//! threat subsystem reads `ThreatNotified` events and tells the session
//! when to drop a reference.

use std::collections::BTreeSet;

use crate::aura::{AuraHandle, AuraInterruptFlags, AuraRemoveMode, AuraType};
use crate::env::{CombatEnv, SpellAttributes};
use crate::state::{AttackType, ControlFlags, Millis, UnitId};
use crate::world::{CombatEvent, World, WorldError};

/// Per-unit combat bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CombatSession {
    in_combat: bool,
    /// Time left before the unit may leave combat.
    timer: Millis,
    hostile_refs: BTreeSet<UnitId>,
}

impl CombatSession {
    pub fn is_in_combat(&self) -> bool {
        self.in_combat
    }

    pub fn timer(&self) -> Millis {
        self.timer
    }

    pub fn hostile_refs(&self) -> &BTreeSet<UnitId> {
        &self.hostile_refs
    }
}

impl World {
    /// Marks a hostile action between `a` and `b`: both enter combat and,
    /// unless both are players, reference each other.
    pub(crate) fn engage(&mut self, env: &CombatEnv<'_>, a: UnitId, b: UnitId) {
        if a == b {
            return;
        }
        let (Some(first), Some(second)) = (self.units.get(&a), self.units.get(&b)) else {
            return;
        };
        if !first.is_alive() || !second.is_alive() || first.is_evading() || second.is_evading() {
            return;
        }
        let track = !first.is_player_controlled() || !second.is_player_controlled();

        self.enter_combat(env, a);
        self.enter_combat(env, b);
        if track {
            if let Some(unit) = self.units.get_mut(&a) {
                unit.session.hostile_refs.insert(b);
            }
            if let Some(unit) = self.units.get_mut(&b) {
                unit.session.hostile_refs.insert(a);
            }
        }
    }

    /// Puts `id` (and its minions) into combat and restarts its timer.
    pub(crate) fn enter_combat(&mut self, env: &CombatEnv<'_>, id: UnitId) {
        let timeout = self.config.combat_timeout;
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        if !unit.is_alive() {
            return;
        }
        unit.session.timer = timeout;
        if unit.session.in_combat {
            return;
        }
        unit.session.in_combat = true;
        let mounted = unit.control.contains(ControlFlags::MOUNTED);
        let minions = unit.minions.clone();

        tracing::debug!(unit = %id, "entered combat");
        self.emit(CombatEvent::CombatEntered { unit: id });
        self.break_auras(env, id, AuraInterruptFlags::ENTER_COMBAT, None);
        if mounted {
            self.dismount(env, id);
        }
        for minion in minions {
            self.enter_combat(env, minion);
        }
    }

    /// Removes mount auras that do not allow fighting while mounted.
    fn dismount(&mut self, env: &CombatEnv<'_>, id: UnitId) {
        let Some(unit) = self.units.get(&id) else {
            return;
        };
        let mounts: Vec<AuraHandle> = unit
            .auras
            .effects_of_type(AuraType::Mounted)
            .iter()
            .map(|effect| effect.handle)
            .filter(|handle| {
                self.auras.get(*handle).is_some_and(|aura| {
                    !aura.attributes().contains(SpellAttributes::COMBAT_MOUNTABLE)
                })
            })
            .collect();
        for handle in mounts {
            self.remove_application(env, id, handle, AuraRemoveMode::Default);
        }
    }

    pub(crate) fn leave_combat(&mut self, id: UnitId) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        unit.session.timer = Millis::ZERO;
        if !unit.session.in_combat {
            return;
        }
        unit.session.in_combat = false;
        tracing::debug!(unit = %id, "left combat");
        self.emit(CombatEvent::CombatLeft { unit: id });
    }

    /// Runs the combat timer down and leaves combat once it is safe.
    pub(crate) fn update_session(&mut self, id: UnitId, diff: Millis) {
        let stale: Vec<UnitId> = match self.units.get(&id) {
            Some(unit) => unit
                .session
                .hostile_refs
                .iter()
                .copied()
                .filter(|other| !self.is_alive(*other))
                .collect(),
            None => return,
        };
        for other in stale {
            self.drop_hostile_reference(id, other);
        }

        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        unit.session.timer = unit.session.timer.saturating_sub(diff);
        if unit.session.in_combat
            && unit.session.timer.is_zero()
            && unit.session.hostile_refs.is_empty()
        {
            self.leave_combat(id);
        }
    }

    /// Drops the mutual hostile reference between `a` and `b`.
    ///
    /// Returns `true` if either side held one.
    pub fn drop_hostile_reference(&mut self, a: UnitId, b: UnitId) -> bool {
        let mut dropped = false;
        if let Some(unit) = self.units.get_mut(&a) {
            dropped |= unit.session.hostile_refs.remove(&b);
        }
        if let Some(unit) = self.units.get_mut(&b) {
            dropped |= unit.session.hostile_refs.remove(&a);
        }
        dropped
    }

    pub(crate) fn drop_all_hostile_references(&mut self, id: UnitId) {
        let refs = match self.units.get_mut(&id) {
            Some(unit) => std::mem::take(&mut unit.session.hostile_refs),
            None => return,
        };
        for other in refs {
            if let Some(unit) = self.units.get_mut(&other) {
                unit.session.hostile_refs.remove(&id);
            }
        }
    }

    // ========================================================================
    // Duels
    // ========================================================================

    /// Ends the duel `id` is in; its opponent wins.
    pub(crate) fn end_duel_of(&mut self, id: UnitId) {
        let Some(opponent) = self.units.get_mut(&id).and_then(|unit| unit.duel_opponent.take()) else {
            return;
        };
        if let Some(unit) = self.units.get_mut(&opponent) {
            unit.duel_opponent = None;
        }
        self.attack_stop(id);
        self.attack_stop(opponent);
        tracing::debug!(winner = %opponent, loser = %id, "duel ended");
        self.emit(CombatEvent::DuelEnded {
            winner: opponent,
            loser: id,
        });
    }

    // ========================================================================
    // Auto-attack
    // ========================================================================

    /// Starts auto-attacking. The first swing lands on the next update.
    ///
    /// # Errors
    ///
    /// Returns `UnknownUnit`, `SelfTarget` or `NotAlive`.
    pub fn attack_start(&mut self, env: &CombatEnv<'_>, attacker: UnitId, victim: UnitId) -> Result<(), WorldError> {
        if attacker == victim {
            return Err(WorldError::SelfTarget(attacker));
        }
        if !self.require_unit(victim)?.is_alive() {
            return Err(WorldError::NotAlive(victim));
        }
        let unit = self
            .units
            .get_mut(&attacker)
            .ok_or(WorldError::UnknownUnit(attacker))?;
        if !unit.is_alive() {
            return Err(WorldError::NotAlive(attacker));
        }
        if unit.attack.victim == Some(victim) {
            return Ok(());
        }
        unit.attack.victim = Some(victim);
        tracing::debug!(%attacker, %victim, "attack started");
        self.engage(env, attacker, victim);
        Ok(())
    }

    pub fn attack_stop(&mut self, attacker: UnitId) {
        if let Some(unit) = self.units.get_mut(&attacker)
            && unit.attack.victim.take().is_some()
        {
            tracing::debug!(%attacker, "attack stopped");
        }
    }

    pub(crate) fn stop_attackers_of(&mut self, victim: UnitId) {
        for unit in self.units.values_mut() {
            if unit.attack.victim == Some(victim) {
                unit.attack.victim = None;
            }
        }
    }

    /// Advances the swing timer and swings when it runs out.
    pub(crate) fn update_swing(&mut self, env: &CombatEnv<'_>, id: UnitId, diff: Millis) {
        let Some(unit) = self.units.get_mut(&id) else {
            return;
        };
        let Some(victim) = unit.attack.victim else {
            return;
        };
        unit.attack.swing_timer = unit.attack.swing_timer.saturating_sub(diff);
        if !unit.attack.swing_timer.is_zero()
            || unit.control.intersects(ControlFlags::STUNNED | ControlFlags::CONFUSED)
        {
            return;
        }
        let interval = unit.swing_time(AttackType::MainHand, &self.config);

        if !self.is_alive(victim) {
            self.attack_stop(id);
            return;
        }
        match self.melee_attack(env, id, victim, AttackType::MainHand) {
            Ok(_) => {
                if let Some(unit) = self.units.get_mut(&id) {
                    unit.attack.swing_timer = interval;
                }
            }
            Err(err) => {
                tracing::debug!(attacker = %id, %victim, error = %err, "swing failed");
                self.attack_stop(id);
            }
        }
    }
}
