//! Loot table loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::loot::LootTable;

/// Loader for the loot table from RON files.
pub struct LootLoader;

impl LootLoader {
    pub fn load(path: &Path) -> LoadResult<LootTable> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<LootTable> {
        let table: LootTable = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse loot table RON: {}", e))?;

        for entry in &table.entries {
            if entry.min_count > entry.max_count {
                anyhow::bail!(
                    "Loot entry for item {} has min_count {} above max_count {}",
                    entry.item.0,
                    entry.min_count,
                    entry.max_count
                );
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_counts_fail() {
        let result = LootLoader::parse(
            "#![enable(unwrap_newtypes)]\n(entries: [(item: 1, chance_pct: 50, min_count: 3, max_count: 1)])",
        );
        assert!(result.is_err());
    }
}
