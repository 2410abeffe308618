//! Auras and their per-target applications.
//!
//! # Architecture
//!
//! An [`Aura`] lives once in the world's [`AuraArena`] and is reached through
//! a generation-checked [`AuraHandle`]. Each unit it affects holds one
//! [`Application`] in its [`AuraStore`]; the unit that owns the aura (its
//! holder) is always one of them.
//!
//! Removal runs in stages so that nothing observes a half-removed aura:
//!
//! 1. the application is flagged and dropped from every store index
//! 2. per-effect remove hooks run in ascending effect order
//! 3. the application is detached and `AuraRemoved` is emitted
//! 4. once no application remains, the arena slot is released and the
//!    owner list, caster-side links and removal links are processed
//!
//! Every bulk operation works on a snapshot of handles and re-checks each
//! one before use, so hooks that remove further auras are safe.
mod apply;
mod error;
mod flags;
mod handle;
mod handlers;
mod instance;
mod periodic;
mod remove;
mod store;
mod types;

pub use apply::ApplyParams;
pub use error::AuraError;
pub use flags::AuraInterruptFlags;
pub use handle::{AuraArena, AuraHandle};
pub use instance::{Application, Aura, AuraEffect, AuraSelector};
pub use store::{AuraStore, EffectRef, SingleTargetLink};
pub use types::{
    AuraRemoveMode, AuraType, Mechanic, SpellModOp, StackingPolicy, can_trigger_procs,
};
