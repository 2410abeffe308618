//! Per-unit combat state.
//!
//! Units own their aura store, cast slots and combat session. All mutation
//! goes through [`World`](crate::world::World); outside callers only read.
mod common;
mod power;
mod unit;

pub use common::{ItemId, Millis, ResourceMeter, SpellId, UnitId};
pub use power::{PowerPools, PowerType};
pub use unit::{
    AttackType, AutoAttack, CombatStats, ControlFlags, DeathState, Unit, UnitFlags, UnitSpec,
    WeaponProfile,
};
