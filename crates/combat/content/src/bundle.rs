use combat_core::{CombatConfig, CombatEnv, CombatTables, RngOracle, SpecialTable, TemplateCatalog};

use crate::loot::LootTable;
use crate::validate::{ContentIssue, validate_content};

/// Everything a world needs besides its own state.
#[derive(Clone, Debug, Default)]
pub struct CombatContent {
    pub config: CombatConfig,
    pub tables: CombatTables,
    pub catalog: TemplateCatalog,
    pub specials: SpecialTable,
    pub loot: LootTable,
}

impl CombatContent {
    pub fn new(catalog: TemplateCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Borrows the content as an oracle bundle for world operations.
    pub fn env<'a>(&'a self, rng: &'a dyn RngOracle) -> CombatEnv<'a> {
        CombatEnv::new(&self.catalog, &self.tables, rng)
            .with_specials(&self.specials)
            .with_loot(&self.loot)
    }

    pub fn validate(&self) -> Vec<ContentIssue> {
        validate_content(&self.catalog, &self.specials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{PcgRng, SpellId, SpellTemplate};

    #[test]
    fn env_serves_the_bundled_catalog() {
        let content = CombatContent::new(
            [SpellTemplate::new(SpellId(5), "Rend")].into_iter().collect(),
        );
        let rng = PcgRng;
        let env = content.env(&rng);
        assert_eq!(env.template(SpellId(5)).map(|t| t.name.as_str()).ok(), Some("Rend"));
        assert!(env.template(SpellId(6)).is_err());
        assert!(env.loot().is_ok());
        assert!(content.validate().is_empty());
    }
}
