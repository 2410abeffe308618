//! Deterministic unit combat referee.
//!
//! `combat-core` decides how auras stack and expire, when procs fire, how a
//! hit is rolled and mitigated, how casts advance and break, and when units
//! enter and leave combat. All state lives in [`world::World`]; every entry
//! point borrows a [`env::CombatEnv`] for templates, tables and randomness
//! and reports what happened as [`world::CombatEvent`]s.
pub mod aura;
pub mod cast;
pub mod combat;
pub mod config;
pub mod env;
pub mod error;
pub mod modifier;
pub mod procs;
pub mod session;
pub mod state;
pub mod world;

pub use aura::{
    ApplyParams, Aura, AuraEffect, AuraError, AuraHandle, AuraInterruptFlags, AuraRemoveMode,
    AuraSelector, AuraStore, AuraType, Mechanic, SpellModOp, StackingPolicy,
};
pub use cast::{Cast, CastError, CastSlot, CastSlots, CastState, InterruptStrength};
pub use combat::{
    DamageFlags, DamageInfo, DamageKind, DamageResult, DamageStage, HealInfo, HealResult, HitInfo,
    HitOutcome, SchoolMask, SpellSchool,
};
pub use config::CombatConfig;
pub use env::{
    CastInterruptFlags, CombatEnv, CombatTables, DamageClass, EffectKind, EffectTarget,
    EffectTemplate, LootItem, LootOracle, LootRequest, OracleError, PcgRng, PowerCost,
    ProcBehavior, ProcGuard, ProcPayload, ProcTemplate, RngOracle, RollContext,
    SpecialCaseOracle, SpecialTable, SpellAttributes, SpellLink, SpellTemplate, TemplateCatalog,
    TemplateOracle,
};
pub use error::{CombatError, ErrorSeverity};
pub use modifier::{AuraView, ModifierFilter, PctChain};
pub use procs::{ProcEvent, ProcFlags, ProcHitMask};
pub use session::CombatSession;
pub use state::{
    AttackType, CombatStats, ControlFlags, DeathState, ItemId, Millis, PowerPools, PowerType,
    ResourceMeter, SpellId, Unit, UnitFlags, UnitId, UnitSpec, WeaponProfile,
};
pub use world::{CombatEvent, ResolutionRecord, World, WorldError};
