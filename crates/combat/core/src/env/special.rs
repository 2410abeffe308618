//! Per-spell exceptions that do not follow a general rule.
//!
//! A handful of effects need bespoke proc eligibility or payloads, and a few
//! spells carry flat percentage damage bonuses. Both live in a side table
//! keyed by spell id instead of in code.

use crate::combat::SchoolMask;
use crate::state::{Millis, SpellId};

pub trait SpecialCaseOracle: Send + Sync {
    /// Proc overrides for the aura of `spell`, if any.
    fn proc_behavior(&self, spell: SpellId) -> Option<&ProcBehavior>;

    /// Extra percentage damage for `spell`, if any.
    fn damage_bonus_pct(&self, spell: SpellId) -> Option<i32>;
}

/// Extra eligibility check run after the chance roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcGuard {
    /// The other party's health is below this percent.
    OtherHealthBelowPct(u8),
    /// The aura holder's health is below this percent.
    HolderHealthBelowPct(u8),
    /// The aura holder carries an aura of this spell.
    HolderHasAura(SpellId),
    /// Only critical hits qualify.
    RequireCrit,
    /// The aura never procs by itself; only explicit calls use it.
    Never,
}

/// What a proc does instead of its aura type's default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcPayload {
    CastSpell { spell: SpellId, on_holder: bool },
    ApplyAura { spell: SpellId, on_holder: bool },
    RemoveAura { spell: SpellId, on_holder: bool },
    /// Adds (or with a negative delta removes) stacks of the proccing aura.
    ModifyStack(i8),
    RemoveSelf,
    Damage { amount: u32, school: SchoolMask },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProcBehavior {
    pub guard: Option<ProcGuard>,
    pub payload: Option<ProcPayload>,
    /// Replaces the template's proc cooldown.
    pub cooldown: Option<Millis>,
}

impl ProcBehavior {
    pub fn guarded(guard: ProcGuard) -> Self {
        Self {
            guard: Some(guard),
            ..Self::default()
        }
    }

    pub fn with_payload(mut self, payload: ProcPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_cooldown(mut self, cooldown: Millis) -> Self {
        self.cooldown = Some(cooldown);
        self
    }
}
