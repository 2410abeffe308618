//! The central owner of all combat state.
//!
//! # Architecture
//!
//! [`World`] holds every unit and the shared aura arena. Operations are
//! methods taking a [`CombatEnv`] for read-only data; they are spread over
//! the module that owns each concern:
//!
//! - `aura`: apply, remove, expire, periodic ticks
//! - `combat`: melee and spell entry points, the damage/heal pipeline, death
//! - `procs`: dispatch of combat events to reactive auras
//! - `cast`: cast slots, pushback, interrupts
//! - `session`: combat state, hostile references, auto-attack
//!
//! The driver calls [`World::update`] once per tick. Nothing in the world
//! blocks or waits; every timer is a counter advanced there.
mod error;
mod event;

pub use error::WorldError;
pub use event::{CombatEvent, ResolutionRecord};

use std::collections::BTreeMap;

use crate::aura::{Aura, AuraArena, AuraHandle, AuraRemoveMode, AuraSelector};
use crate::cast::InterruptStrength;
use crate::config::CombatConfig;
use crate::env::{CombatEnv, RollContext, compute_seed};
use crate::error::invariant_violated;
use crate::modifier::AuraView;
use crate::state::{Millis, Unit, UnitFlags, UnitId, UnitSpec};

#[derive(Clone, Debug)]
pub struct World {
    pub(crate) config: CombatConfig,
    pub(crate) units: BTreeMap<UnitId, Unit>,
    pub(crate) auras: AuraArena,
    next_unit_id: u32,
    pub(crate) now: Millis,
    /// Roll counter mixed into every seed.
    nonce: u64,
    /// Application order counter.
    next_seq: u64,
    events: Vec<CombatEvent>,
    /// Nesting of proc dispatches across all units.
    pub(crate) dispatch_depth: u32,
}

impl World {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            units: BTreeMap::new(),
            auras: AuraArena::new(),
            next_unit_id: 1,
            now: Millis::ZERO,
            nonce: 0,
            next_seq: 0,
            events: Vec::new(),
            dispatch_depth: 0,
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn aura(&self, handle: AuraHandle) -> Option<&Aura> {
        self.auras.get(handle)
    }

    pub fn aura_arena(&self) -> &AuraArena {
        &self.auras
    }

    /// Modifier view over one unit's auras.
    pub fn view(&self, id: UnitId) -> Option<AuraView<'_>> {
        self.units
            .get(&id)
            .map(|unit| AuraView::new(&self.auras, &unit.auras))
    }

    /// Events produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[CombatEvent] {
        &self.events
    }

    pub(crate) fn emit(&mut self, event: CombatEvent) {
        tracing::trace!(kind = event.kind(), "combat event");
        self.events.push(event);
    }

    pub(crate) fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    pub(crate) fn roll_seed(&mut self, actor: UnitId, context: RollContext) -> u64 {
        self.nonce += 1;
        compute_seed(self.config.seed, self.nonce, actor.0, context)
    }

    pub(crate) fn roll_bp(&mut self, env: &CombatEnv<'_>, actor: UnitId, context: RollContext) -> u32 {
        let seed = self.roll_seed(actor, context);
        env.rng().roll_bp(seed)
    }

    pub(crate) fn roll_range(
        &mut self,
        env: &CombatEnv<'_>,
        actor: UnitId,
        min: u32,
        max: u32,
    ) -> u32 {
        let seed = self.roll_seed(actor, RollContext::Damage);
        env.rng().range(seed, min, max)
    }

    pub(crate) fn require_unit(&self, id: UnitId) -> Result<&Unit, WorldError> {
        self.units.get(&id).ok_or(WorldError::UnknownUnit(id))
    }

    pub(crate) fn is_alive(&self, id: UnitId) -> bool {
        self.units
            .get(&id)
            .is_some_and(|unit| unit.is_alive() && unit.in_world)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub fn spawn(&mut self, spec: &UnitSpec) -> UnitId {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;

        let unit = Unit::from_spec(id, spec);
        if let Some(owner) = spec.owner {
            match self.units.get_mut(&owner) {
                Some(owner_unit) => owner_unit.minions.push(id),
                None => tracing::warn!(unit = %id, owner = %owner, "spawned with unknown owner"),
            }
        }
        self.units.insert(id, unit);
        tracing::debug!(unit = %id, level = spec.level, "unit spawned");
        id
    }

    /// Clears every reference the unit holds or is held by, then drops it.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::UnknownUnit` if the unit does not exist.
    pub fn despawn(&mut self, env: &CombatEnv<'_>, id: UnitId) -> Result<(), WorldError> {
        self.require_unit(id)?;

        self.interrupt_all_casts(env, id, InterruptStrength::Hard);
        self.attack_stop(id);
        self.stop_attackers_of(id);
        self.end_duel_of(id);
        self.drop_all_hostile_references(id);

        self.remove_auras(env, id, AuraSelector::All, AuraRemoveMode::Default);
        let cast_elsewhere: Vec<AuraHandle> = self
            .units
            .get(&id)
            .map(|unit| {
                unit.auras
                    .single_target_links()
                    .iter()
                    .map(|link| link.handle)
                    .collect()
            })
            .unwrap_or_default();
        for handle in cast_elsewhere {
            self.release_aura(env, handle, AuraRemoveMode::Default);
        }

        let Some(unit) = self.units.get_mut(&id) else {
            return Ok(());
        };
        unit.in_world = false;
        if !unit.is_cleared() {
            invariant_violated("unit despawned without reaching the cleared state");
        }
        let owner = unit.owner;
        let minions = std::mem::take(&mut unit.minions);

        if let Some(owner) = owner
            && let Some(owner_unit) = self.units.get_mut(&owner)
        {
            owner_unit.minions.retain(|minion| *minion != id);
        }
        for minion in minions {
            if let Some(minion_unit) = self.units.get_mut(&minion) {
                minion_unit.owner = None;
            }
        }

        self.units.remove(&id);
        tracing::debug!(unit = %id, "unit despawned");
        Ok(())
    }

    /// Starts a duel between two units.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::UnknownUnit` or `WorldError::SelfTarget`.
    pub fn start_duel(&mut self, a: UnitId, b: UnitId) -> Result<(), WorldError> {
        if a == b {
            return Err(WorldError::SelfTarget(a));
        }
        self.require_unit(a)?;
        self.require_unit(b)?;
        if let Some(unit) = self.units.get_mut(&a) {
            unit.duel_opponent = Some(b);
        }
        if let Some(unit) = self.units.get_mut(&b) {
            unit.duel_opponent = Some(a);
        }
        tracing::debug!(%a, %b, "duel started");
        Ok(())
    }

    /// Toggles evade mode; entering it drops every hostile reference.
    ///
    /// # Errors
    ///
    /// Returns `WorldError::UnknownUnit` if the unit does not exist.
    pub fn set_evading(&mut self, id: UnitId, evading: bool) -> Result<(), WorldError> {
        let unit = self.units.get_mut(&id).ok_or(WorldError::UnknownUnit(id))?;
        unit.flags.set(UnitFlags::EVADING, evading);
        if evading {
            self.attack_stop(id);
            self.drop_all_hostile_references(id);
        }
        Ok(())
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances every timer by `diff`.
    ///
    /// Order within a tick: auras (periodic ticks, then expiry), casts,
    /// auto-attack swings, combat timers.
    pub fn update(&mut self, env: &CombatEnv<'_>, diff: Millis) {
        self.now += diff;

        self.update_auras(env, diff);

        let ids: Vec<UnitId> = self.units.keys().copied().collect();
        for id in &ids {
            self.update_casts(env, *id, diff);
        }
        for id in &ids {
            self.update_swing(env, *id, diff);
        }
        for id in &ids {
            self.update_session(*id, diff);
        }

        let now = self.now;
        for unit in self.units.values_mut() {
            unit.auras.prune_cooldowns(now);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(CombatConfig::default())
    }
}
