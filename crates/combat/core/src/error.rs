//! Error classification shared by the referee's entry points.
//!
//! Each subsystem owns its error enum (`AuraError`, `CastError`,
//! `WorldError`, `OracleError`). Callers that only care about what to do
//! next read [`CombatError::severity`]: a recoverable refusal (dead target,
//! stunned caster) may succeed later, a validation failure (unknown unit or
//! template) never will. Damage and heal stages never fail; they clamp.

/// How a caller should treat a refused request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorSeverity {
    /// The world state refused it; the same request may work later.
    Recoverable,
    /// The request names something that does not exist.
    Validation,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Classification implemented by every combat-core error enum.
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier of the variant, e.g. `AURA_IMMUNE`.
    fn error_code(&self) -> &'static str;
}

/// Reports a broken invariant.
///
/// Panics in debug builds. In release builds the violation is logged and the
/// caller is expected to clamp to a valid state and continue.
#[track_caller]
pub(crate) fn invariant_violated(what: &'static str) {
    tracing::error!(invariant = what, "combat invariant violated");
    debug_assert!(false, "combat invariant violated: {what}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::AuraError;
    use crate::cast::CastError;
    use crate::env::OracleError;
    use crate::state::{SpellId, UnitId};
    use crate::world::WorldError;

    #[test]
    fn wrapped_errors_keep_the_inner_classification() {
        let inner = AuraError::EntityNotEligible(UnitId(4));
        let outer = WorldError::from(inner.clone());
        assert_eq!(outer.error_code(), "AURA_ENTITY_NOT_ELIGIBLE");
        assert_eq!(outer.severity(), inner.severity());
        assert!(outer.severity().is_recoverable());

        let missing = CastError::from(OracleError::TemplateNotFound(SpellId(9)));
        assert_eq!(missing.error_code(), "ORACLE_TEMPLATE_NOT_FOUND");
        assert_eq!(missing.severity(), ErrorSeverity::Validation);
        assert_eq!(missing.severity().as_str(), "validation");
    }
}
