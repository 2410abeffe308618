//! Reactive auras.
//!
//! Every hostile resolution, heal and death produces a [`ProcEvent`]. The
//! dispatcher matches it against the proc registries of both parties and
//! fires the auras that qualify.
mod dispatch;
mod event;
mod flags;

pub use event::ProcEvent;
pub use flags::{ProcFlags, ProcHitMask};
