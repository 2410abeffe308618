use crate::aura::AuraError;
use crate::cast::CastError;
use crate::env::OracleError;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::UnitId;

/// Errors returned by world-level entry points.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WorldError {
    #[error("unit {0} does not exist")]
    UnknownUnit(UnitId),

    #[error("unit {0} is not alive")]
    NotAlive(UnitId),

    #[error("unit {0} has left the world")]
    NotInWorld(UnitId),

    /// A unit cannot fight itself.
    #[error("unit {0} cannot target itself")]
    SelfTarget(UnitId),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Aura(#[from] AuraError),

    #[error(transparent)]
    Cast(#[from] CastError),
}

impl CombatError for WorldError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownUnit(_) | Self::SelfTarget(_) => ErrorSeverity::Validation,
            Self::NotAlive(_) | Self::NotInWorld(_) => ErrorSeverity::Recoverable,
            Self::Oracle(err) => err.severity(),
            Self::Aura(err) => err.severity(),
            Self::Cast(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownUnit(_) => "WORLD_UNKNOWN_UNIT",
            Self::NotAlive(_) => "WORLD_NOT_ALIVE",
            Self::NotInWorld(_) => "WORLD_NOT_IN_WORLD",
            Self::SelfTarget(_) => "WORLD_SELF_TARGET",
            Self::Oracle(err) => err.error_code(),
            Self::Aura(err) => err.error_code(),
            Self::Cast(err) => err.error_code(),
        }
    }
}
