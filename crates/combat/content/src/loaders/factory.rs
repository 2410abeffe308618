//! Content factory for building oracles from data files.

use std::path::{Path, PathBuf};

use combat_core::{CombatConfig, CombatTables, SpecialTable, TemplateCatalog};

use crate::bundle::CombatContent;
use crate::loaders::{
    ConfigLoader, LoadResult, LootLoader, ScenarioLoader, SpecialCaseLoader, SpellLoader,
    TablesLoader,
};
use crate::loot::LootTable;
use crate::scenario::Scenario;

/// Content factory that loads all combat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── tables.toml
/// ├── spells.ron
/// ├── specials.ron   (optional)
/// ├── loot.ron       (optional)
/// └── scenarios/
///     ├── duel.ron
///     └── ambush.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load runtime configuration from `config.toml`.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join("config.toml");
        ConfigLoader::load(&path)
    }

    /// Load balance tables from `tables.toml`.
    pub fn load_tables(&self) -> LoadResult<CombatTables> {
        let path = self.data_dir.join("tables.toml");
        TablesLoader::load(&path)
    }

    /// Load spell templates from `spells.ron`.
    pub fn load_spells(&self) -> LoadResult<TemplateCatalog> {
        let path = self.data_dir.join("spells.ron");
        SpellLoader::load(&path)
    }

    /// Load special cases from `specials.ron`; a missing file means none.
    pub fn load_specials(&self) -> LoadResult<SpecialTable> {
        let path = self.data_dir.join("specials.ron");
        if !path.exists() {
            return Ok(SpecialTable::new());
        }
        SpecialCaseLoader::load(&path)
    }

    /// Load the loot table from `loot.ron`; a missing file means no drops.
    pub fn load_loot(&self) -> LoadResult<LootTable> {
        let path = self.data_dir.join("loot.ron");
        if !path.exists() {
            return Ok(LootTable::default());
        }
        LootLoader::load(&path)
    }

    /// Load a scenario from `scenarios/{name}.ron`.
    pub fn load_scenario(&self, name: &str) -> LoadResult<Scenario> {
        let path = self.scenario_path(name);
        ScenarioLoader::load(&path)
    }

    pub fn scenario_path(&self, name: &str) -> PathBuf {
        self.data_dir.join("scenarios").join(format!("{}.ron", name))
    }

    /// Load every content file and check cross references.
    ///
    /// Validation issues are logged, not fatal; the referee skips what it
    /// cannot resolve.
    pub fn load_all(&self) -> LoadResult<CombatContent> {
        let content = CombatContent {
            config: self.load_config()?,
            tables: self.load_tables()?,
            catalog: self.load_spells()?,
            specials: self.load_specials()?,
            loot: self.load_loot()?,
        };
        for issue in content.validate() {
            tracing::warn!(%issue, "content issue");
        }
        tracing::info!(
            spells = content.catalog.len(),
            specials = content.specials.len(),
            loot_entries = content.loot.entries.len(),
            data_dir = %self.data_dir.display(),
            "combat content loaded"
        );
        Ok(content)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
