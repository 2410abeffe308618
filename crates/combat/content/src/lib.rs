//! Data-driven combat content and loaders.
//!
//! This crate houses everything the referee reads but never owns:
//! - Spell templates (RON)
//! - Per-spell special cases (RON)
//! - Balance tables and runtime config (TOML)
//! - Loot tables (RON)
//! - Scripted scenarios for the tick driver (RON)
//!
//! Content is consumed through the core's oracle traits and never appears in
//! world state.

pub mod bundle;
pub mod loot;
pub mod scenario;
pub mod validate;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use bundle::CombatContent;
pub use loot::{LootEntry, LootTable};
pub use scenario::{Action, Scenario, ScenarioUnit, ScriptedAction};
pub use validate::{ContentIssue, validate_content};

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, ContentFactory, LootLoader, ScenarioLoader, SpecialCaseLoader, SpellLoader,
    TablesLoader,
};
