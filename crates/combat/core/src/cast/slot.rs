//! Cast slots and the rules deciding which casts break which.

use arrayvec::ArrayVec;
use strum::{EnumCount, EnumIter};

use crate::aura::AuraHandle;
use crate::env::SpellAttributes;
use crate::state::{Millis, SpellId, UnitId};

/// Logical slot a cast occupies. Each slot holds at most one cast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastSlot {
    Generic = 0,
    Channeled = 1,
    AutoRepeat = 2,
    /// Spell queued onto the next melee swing.
    Melee = 3,
}

impl CastSlot {
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Slots a new cast in `self` interrupts when it starts.
    ///
    /// | starting   | interrupts                                  |
    /// |------------|---------------------------------------------|
    /// | Generic    | Generic, Channeled¹, AutoRepeat²            |
    /// | Channeled  | Generic, Channeled, AutoRepeat²             |
    /// | AutoRepeat | Generic, Channeled, AutoRepeat              |
    /// | Melee      | Melee                                       |
    ///
    /// ¹ unless `DOESNT_INTERRUPT_CHANNEL`, ² unless `KEEP_AUTO_REPEAT`.
    pub fn interrupts(self, attributes: SpellAttributes) -> ArrayVec<CastSlot, { CastSlot::COUNT }> {
        let keep_repeat = attributes.contains(SpellAttributes::KEEP_AUTO_REPEAT);
        let mut slots = ArrayVec::new();
        match self {
            Self::Generic => {
                slots.push(Self::Generic);
                if !attributes.contains(SpellAttributes::DOESNT_INTERRUPT_CHANNEL) {
                    slots.push(Self::Channeled);
                }
                if !keep_repeat {
                    slots.push(Self::AutoRepeat);
                }
            }
            Self::Channeled => {
                slots.push(Self::Generic);
                slots.push(Self::Channeled);
                if !keep_repeat {
                    slots.push(Self::AutoRepeat);
                }
            }
            Self::AutoRepeat => {
                slots.push(Self::Generic);
                slots.push(Self::Channeled);
                slots.push(Self::AutoRepeat);
            }
            Self::Melee => slots.push(Self::Melee),
        }
        slots
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastState {
    Preparing,
    Channeling,
    /// Launched; effects land when the travel time runs out.
    Delayed,
    Finished,
    Cancelled,
}

/// How hard an interrupt hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterruptStrength {
    /// Leaves launched (delayed) casts alone.
    Soft,
    /// Also cancels launched casts.
    Hard,
}

/// One in-progress cast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cast {
    pub(crate) spell: SpellId,
    pub(crate) target: UnitId,
    pub(crate) slot: CastSlot,
    pub(crate) state: CastState,
    /// Time left in the current state.
    pub(crate) timer: Millis,
    /// Length of the cast or channel as started.
    pub(crate) duration: Millis,
    pub(crate) pushbacks: u8,
    /// Auras a channel applied; removed if the channel is interrupted.
    pub(crate) channel_auras: Vec<AuraHandle>,
}

impl Cast {
    pub(crate) fn new(spell: SpellId, target: UnitId, slot: CastSlot, state: CastState, timer: Millis) -> Self {
        Self {
            spell,
            target,
            slot,
            state,
            timer,
            duration: timer,
            pushbacks: 0,
            channel_auras: Vec::new(),
        }
    }

    pub fn spell(&self) -> SpellId {
        self.spell
    }

    pub fn target(&self) -> UnitId {
        self.target
    }

    pub fn slot(&self) -> CastSlot {
        self.slot
    }

    pub fn state(&self) -> CastState {
        self.state
    }

    pub fn remaining(&self) -> Millis {
        self.timer
    }

    pub fn duration(&self) -> Millis {
        self.duration
    }

    pub fn pushbacks(&self) -> u8 {
        self.pushbacks
    }

    pub fn channel_auras(&self) -> &[AuraHandle] {
        &self.channel_auras
    }

    /// Time spent in the current state so far.
    pub fn elapsed(&self) -> Millis {
        self.duration.saturating_sub(self.timer)
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            CastState::Preparing | CastState::Channeling | CastState::Delayed
        )
    }
}

/// The fixed array of cast slots every unit carries.
///
/// A launched cast stays in its slot until it lands. If a new cast takes the
/// slot first, the launched one keeps flying outside the slots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CastSlots {
    slots: [Option<Cast>; CastSlot::COUNT],
    in_flight: Vec<Cast>,
}

impl CastSlots {
    pub fn get(&self, slot: CastSlot) -> Option<&Cast> {
        self.slots[slot.index()].as_ref()
    }

    pub(crate) fn get_mut(&mut self, slot: CastSlot) -> Option<&mut Cast> {
        self.slots[slot.index()].as_mut()
    }

    pub fn any_active(&self) -> bool {
        self.slots.iter().flatten().any(Cast::is_active) || !self.in_flight.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cast> {
        self.slots.iter().flatten()
    }

    pub fn in_flight(&self) -> &[Cast] {
        &self.in_flight
    }

    /// Puts `cast` into its slot, returning whatever was there.
    ///
    /// A displaced launched cast is kept in flight instead of returned.
    pub(crate) fn occupy(&mut self, cast: Cast) -> Option<Cast> {
        let index = cast.slot.index();
        let displaced = self.slots[index].replace(cast)?;
        if displaced.state == CastState::Delayed {
            self.in_flight.push(displaced);
            return None;
        }
        Some(displaced)
    }

    /// Advances launched casts outside the slots; returns the ones that landed.
    pub(crate) fn advance_in_flight(&mut self, diff: Millis) -> Vec<Cast> {
        let mut landed = Vec::new();
        self.in_flight.retain_mut(|cast| {
            cast.timer = cast.timer.saturating_sub(diff);
            if cast.timer.is_zero() {
                let mut done = cast.clone();
                done.state = CastState::Finished;
                landed.push(done);
                false
            } else {
                true
            }
        });
        landed
    }

    pub(crate) fn cancel_in_flight(&mut self) -> Vec<Cast> {
        let mut cancelled = std::mem::take(&mut self.in_flight);
        for cast in &mut cancelled {
            cast.state = CastState::Cancelled;
        }
        cancelled
    }

    /// Empties the slot and marks the cast finished.
    pub(crate) fn take(&mut self, slot: CastSlot) -> Option<Cast> {
        let mut cast = self.slots[slot.index()].take()?;
        cast.state = CastState::Finished;
        Some(cast)
    }

    /// Empties the slot and marks the cast cancelled in one step.
    pub(crate) fn cancel(&mut self, slot: CastSlot) -> Option<Cast> {
        let mut cast = self.slots[slot.index()].take()?;
        cast.state = CastState::Cancelled;
        Some(cast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_table() {
        let none = SpellAttributes::empty();
        assert_eq!(
            CastSlot::Generic.interrupts(none).as_slice(),
            &[CastSlot::Generic, CastSlot::Channeled, CastSlot::AutoRepeat]
        );
        assert_eq!(
            CastSlot::Generic
                .interrupts(SpellAttributes::DOESNT_INTERRUPT_CHANNEL | SpellAttributes::KEEP_AUTO_REPEAT)
                .as_slice(),
            &[CastSlot::Generic]
        );
        assert_eq!(
            CastSlot::Channeled
                .interrupts(SpellAttributes::KEEP_AUTO_REPEAT)
                .as_slice(),
            &[CastSlot::Generic, CastSlot::Channeled]
        );
        assert!(!CastSlot::AutoRepeat.interrupts(none).contains(&CastSlot::Melee));
        assert_eq!(CastSlot::Melee.interrupts(none).as_slice(), &[CastSlot::Melee]);
    }

    #[test]
    fn cancel_empties_slot_and_marks_cast() {
        let mut slots = CastSlots::default();
        let cast = Cast::new(SpellId(1), UnitId(2), CastSlot::Generic, CastState::Preparing, Millis(1500));
        assert!(slots.occupy(cast).is_none());
        assert!(slots.any_active());

        let cancelled = slots.cancel(CastSlot::Generic).expect("cast");
        assert_eq!(cancelled.state(), CastState::Cancelled);
        assert!(slots.get(CastSlot::Generic).is_none());
        assert!(!slots.any_active());
    }

    #[test]
    fn displaced_launch_keeps_flying() {
        let mut slots = CastSlots::default();
        let launched = Cast::new(SpellId(1), UnitId(2), CastSlot::Generic, CastState::Delayed, Millis(800));
        slots.occupy(launched);
        let next = Cast::new(SpellId(3), UnitId(2), CastSlot::Generic, CastState::Preparing, Millis(1500));
        assert!(slots.occupy(next).is_none());
        assert_eq!(slots.in_flight().len(), 1);

        assert!(slots.advance_in_flight(Millis(500)).is_empty());
        let landed = slots.advance_in_flight(Millis(300));
        assert_eq!(landed.len(), 1);
        assert_eq!(landed[0].spell(), SpellId(1));
        assert!(slots.in_flight().is_empty());
    }
}
