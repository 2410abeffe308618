//! Content loaders for reading combat data from files.
//!
//! RON carries structured content (spells, special cases, loot, scenarios);
//! TOML carries flat numeric settings (config, balance tables).

pub mod config;
pub mod factory;
pub mod loot;
pub mod scenario;
pub mod specials;
pub mod spells;
pub mod tables;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use loot::LootLoader;
pub use scenario::ScenarioLoader;
pub use specials::{DamageBonus, ProcOverride, SpecialCaseLoader, SpecialCases};
pub use spells::{SpellCatalog, SpellLoader};
pub use tables::TablesLoader;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
