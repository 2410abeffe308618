//! Balance tables loader.

use std::path::Path;

use combat_core::CombatTables;

use crate::loaders::{LoadResult, read_file};

/// Loader for hit, mitigation and threat tables from TOML files.
pub struct TablesLoader;

impl TablesLoader {
    /// Load tables from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<CombatTables> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CombatTables> {
        let tables: CombatTables = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse tables TOML: {}", e))?;

        if tables.armor_cap_bp > 10_000 {
            anyhow::bail!("armor_cap_bp {} exceeds 10000", tables.armor_cap_bp);
        }
        Ok(tables)
    }
}
