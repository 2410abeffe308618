//! Traits describing read-only combat data.
//!
//! Oracles expose spell templates, balance tables, randomness, per-spell
//! special cases and loot rolling. The [`CombatEnv`] aggregate bundles them
//! so the world can reach everything it needs without hard coupling to
//! concrete implementations.
mod catalog;
mod error;
mod loot;
mod rng;
mod special;
mod tables;
mod templates;

pub use catalog::{SpecialTable, TemplateCatalog};
pub use error::OracleError;
pub use loot::{LootItem, LootOracle, LootRequest};
pub use rng::{PcgRng, RngOracle, RollContext, compute_seed};
pub use special::{ProcBehavior, ProcGuard, ProcPayload, SpecialCaseOracle};
pub use tables::{CombatTables, TablesOracle};
pub use templates::{
    CastInterruptFlags, DamageClass, EffectKind, EffectTarget, EffectTemplate, PowerCost,
    ProcTemplate, SpellAttributes, SpellLink, SpellTemplate, TemplateOracle,
};

use crate::state::SpellId;

/// Aggregates the read-only oracles every world operation receives.
///
/// Templates, tables and randomness are mandatory. The special-case table
/// and the loot roller are optional: without them no special cases apply and
/// deaths request no loot.
#[derive(Clone, Copy)]
pub struct CombatEnv<'a> {
    templates: &'a dyn TemplateOracle,
    tables: &'a dyn TablesOracle,
    rng: &'a dyn RngOracle,
    specials: Option<&'a dyn SpecialCaseOracle>,
    loot: Option<&'a dyn LootOracle>,
}

impl<'a> CombatEnv<'a> {
    pub fn new(
        templates: &'a dyn TemplateOracle,
        tables: &'a dyn TablesOracle,
        rng: &'a dyn RngOracle,
    ) -> Self {
        Self {
            templates,
            tables,
            rng,
            specials: None,
            loot: None,
        }
    }

    pub fn with_specials(mut self, specials: &'a dyn SpecialCaseOracle) -> Self {
        self.specials = Some(specials);
        self
    }

    pub fn with_loot(mut self, loot: &'a dyn LootOracle) -> Self {
        self.loot = Some(loot);
        self
    }

    pub fn templates(&self) -> &'a dyn TemplateOracle {
        self.templates
    }

    /// Looks up a template.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::TemplateNotFound` for unknown ids.
    pub fn template(&self, id: SpellId) -> Result<&'a SpellTemplate, OracleError> {
        self.templates
            .template(id)
            .ok_or(OracleError::TemplateNotFound(id))
    }

    pub fn tables(&self) -> &'a CombatTables {
        self.tables.tables()
    }

    pub fn rng(&self) -> &'a dyn RngOracle {
        self.rng
    }

    /// Returns the SpecialCaseOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::SpecialsNotAvailable` if none was provided.
    pub fn specials(&self) -> Result<&'a dyn SpecialCaseOracle, OracleError> {
        self.specials.ok_or(OracleError::SpecialsNotAvailable)
    }

    /// Returns the LootOracle, or an error if not available.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::LootNotAvailable` if none was provided.
    pub fn loot(&self) -> Result<&'a dyn LootOracle, OracleError> {
        self.loot.ok_or(OracleError::LootNotAvailable)
    }

    pub fn proc_behavior(&self, spell: SpellId) -> Option<&'a ProcBehavior> {
        self.specials.and_then(|specials| specials.proc_behavior(spell))
    }

    pub fn damage_bonus_pct(&self, spell: SpellId) -> i32 {
        self.specials
            .and_then(|specials| specials.damage_bonus_pct(spell))
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for CombatEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatEnv")
            .field("specials", &self.specials.is_some())
            .field("loot", &self.loot.is_some())
            .finish_non_exhaustive()
    }
}
