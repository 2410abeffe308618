//! Runtime configuration loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if config.max_proc_depth == 0 {
            anyhow::bail!("max_proc_depth must be at least 1");
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::Millis;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse("seed = 42\npushback = 250\n").expect("config");
        assert_eq!(config.seed, 42);
        assert_eq!(config.pushback, Millis(250));
        assert_eq!(config.combat_timeout, CombatConfig::DEFAULT_COMBAT_TIMEOUT);
    }

    #[test]
    fn zero_proc_depth_is_rejected() {
        assert!(ConfigLoader::parse("max_proc_depth = 0").is_err());
    }
}
