//! Notifications for collaborators outside the referee.
//!
//! AI scripts, threat, achievements and the network layer all consume the
//! same outbox. Events are appended in the order things happen and drained
//! by the driver with [`World::drain_events`](super::World::drain_events).

use crate::aura::{AuraHandle, AuraRemoveMode};
use crate::cast::CastSlot;
use crate::combat::{HitOutcome, SchoolMask};
use crate::env::LootItem;
use crate::state::{SpellId, UnitId};

/// Summary of one damage resolution, for telemetry and achievements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolutionRecord {
    pub actor: Option<UnitId>,
    pub victim: UnitId,
    pub spell: Option<SpellId>,
    pub outcome: HitOutcome,
    pub amount: u32,
    pub absorbed: u32,
    pub resisted: u32,
    pub blocked: u32,
    pub crit: bool,
    pub lethal: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "event", rename_all = "snake_case"))]
pub enum CombatEvent {
    DamageTaken {
        victim: UnitId,
        attacker: Option<UnitId>,
        amount: u32,
        school: SchoolMask,
    },
    DamageDealt {
        attacker: UnitId,
        victim: UnitId,
        amount: u32,
    },
    HealReceived {
        target: UnitId,
        healer: Option<UnitId>,
        amount: u32,
        overheal: u32,
    },
    Resolution(ResolutionRecord),
    AuraApplied {
        target: UnitId,
        caster: UnitId,
        spell: SpellId,
        handle: AuraHandle,
        stacks: u8,
    },
    AuraRemoved {
        target: UnitId,
        spell: SpellId,
        handle: AuraHandle,
        mode: AuraRemoveMode,
    },
    CastStarted {
        caster: UnitId,
        target: UnitId,
        spell: SpellId,
        slot: CastSlot,
    },
    CastFinished {
        caster: UnitId,
        spell: SpellId,
        slot: CastSlot,
    },
    CastInterrupted {
        caster: UnitId,
        spell: SpellId,
        slot: CastSlot,
    },
    CombatEntered {
        unit: UnitId,
    },
    CombatLeft {
        unit: UnitId,
    },
    ThreatNotified {
        holder: UnitId,
        target: UnitId,
        amount: u32,
    },
    Death {
        victim: UnitId,
        killer: Option<UnitId>,
    },
    DuelEnded {
        winner: UnitId,
        loser: UnitId,
    },
    LootFilled {
        source: UnitId,
        looter: UnitId,
        items: Vec<LootItem>,
    },
}

impl CombatEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DamageTaken { .. } => "damage_taken",
            Self::DamageDealt { .. } => "damage_dealt",
            Self::HealReceived { .. } => "heal_received",
            Self::Resolution(_) => "resolution",
            Self::AuraApplied { .. } => "aura_applied",
            Self::AuraRemoved { .. } => "aura_removed",
            Self::CastStarted { .. } => "cast_started",
            Self::CastFinished { .. } => "cast_finished",
            Self::CastInterrupted { .. } => "cast_interrupted",
            Self::CombatEntered { .. } => "combat_entered",
            Self::CombatLeft { .. } => "combat_left",
            Self::ThreatNotified { .. } => "threat_notified",
            Self::Death { .. } => "death",
            Self::DuelEnded { .. } => "duel_ended",
            Self::LootFilled { .. } => "loot_filled",
        }
    }
}
