//! Aura application errors.

use crate::env::OracleError;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{SpellId, UnitId};

use super::AuraHandle;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuraError {
    #[error("unit {0} does not exist")]
    UnknownUnit(UnitId),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Target is dead, cleaned up or detached from the world.
    #[error("unit {0} is not eligible for auras")]
    EntityNotEligible(UnitId),

    #[error("unit {target} is immune to {spell}")]
    Immune { target: UnitId, spell: SpellId },

    /// The template declares no aura effects, or every one was filtered out.
    #[error("{0} has no aura effects to apply")]
    NoAuraEffects(SpellId),

    #[error("aura handle {0:?} is stale")]
    StaleHandle(AuraHandle),
}

impl CombatError for AuraError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::EntityNotEligible(_) | Self::Immune { .. } => ErrorSeverity::Recoverable,
            Self::UnknownUnit(_) | Self::NoAuraEffects(_) | Self::StaleHandle(_) => {
                ErrorSeverity::Validation
            }
            Self::Oracle(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownUnit(_) => "AURA_UNKNOWN_UNIT",
            Self::Oracle(err) => err.error_code(),
            Self::EntityNotEligible(_) => "AURA_ENTITY_NOT_ELIGIBLE",
            Self::Immune { .. } => "AURA_IMMUNE",
            Self::NoAuraEffects(_) => "AURA_NO_EFFECTS",
            Self::StaleHandle(_) => "AURA_STALE_HANDLE",
        }
    }
}
