use crate::env::OracleError;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{PowerType, UnitId};

/// Reasons a cast cannot start.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CastError {
    #[error("unit {0} does not exist")]
    UnknownUnit(UnitId),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// Caster is dead or has left the world.
    #[error("unit {0} cannot cast")]
    CasterNotEligible(UnitId),

    #[error("unit {0} is not a valid target")]
    TargetNotEligible(UnitId),

    #[error("unit {0} is stunned")]
    Stunned(UnitId),

    #[error("unit {0} is silenced")]
    Silenced(UnitId),

    #[error("unit {caster} needs {required} {power:?}, has {available}")]
    NotEnoughPower {
        caster: UnitId,
        power: PowerType,
        required: u32,
        available: u32,
    },
}

impl CombatError for CastError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownUnit(_) => ErrorSeverity::Validation,
            Self::Oracle(err) => err.severity(),
            Self::CasterNotEligible(_)
            | Self::TargetNotEligible(_)
            | Self::Stunned(_)
            | Self::Silenced(_)
            | Self::NotEnoughPower { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownUnit(_) => "CAST_UNKNOWN_UNIT",
            Self::Oracle(err) => err.error_code(),
            Self::CasterNotEligible(_) => "CAST_CASTER_NOT_ELIGIBLE",
            Self::TargetNotEligible(_) => "CAST_TARGET_NOT_ELIGIBLE",
            Self::Stunned(_) => "CAST_STUNNED",
            Self::Silenced(_) => "CAST_SILENCED",
            Self::NotEnoughPower { .. } => "CAST_NOT_ENOUGH_POWER",
        }
    }
}
