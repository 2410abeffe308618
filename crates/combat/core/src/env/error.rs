//! Oracle access errors.

use crate::error::{CombatError, ErrorSeverity};
use crate::state::SpellId;

/// Errors that occur when accessing oracle data.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OracleError {
    /// Template was not found by id.
    #[error("spell template {0} not found")]
    TemplateNotFound(SpellId),

    /// SpecialCaseOracle is not available in the environment.
    #[error("SpecialCaseOracle not available")]
    SpecialsNotAvailable,

    /// LootOracle is not available in the environment.
    #[error("LootOracle not available")]
    LootNotAvailable,
}

impl CombatError for OracleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::TemplateNotFound(_) => ErrorSeverity::Validation,
            Self::SpecialsNotAvailable | Self::LootNotAvailable => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TemplateNotFound(_) => "ORACLE_TEMPLATE_NOT_FOUND",
            Self::SpecialsNotAvailable => "ORACLE_SPECIALS_NOT_AVAILABLE",
            Self::LootNotAvailable => "ORACLE_LOOT_NOT_AVAILABLE",
        }
    }
}
