//! Cast-slot state machine.
//!
//! Every unit has one slot per [`CastSlot`]. A slot is idle (empty) or holds
//! a cast that moves through
//!
//! `Preparing -> Channeling | Delayed -> Finished`
//!
//! or ends early as `Cancelled`. Starting a cast interrupts other slots
//! according to [`CastSlot::interrupts`]. Cancellation always empties the
//! slot and marks the cast in the same step.
mod error;
mod slot;
mod spell;

pub use error::CastError;
pub use slot::{Cast, CastSlot, CastSlots, CastState, InterruptStrength};
