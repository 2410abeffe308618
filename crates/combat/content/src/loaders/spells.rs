//! Spell template loader.

use std::collections::HashSet;
use std::path::Path;

use combat_core::{SpellTemplate, TemplateCatalog};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Spell catalog structure for RON files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpellCatalog {
    pub spells: Vec<SpellTemplate>,
}

/// Loader for spell templates from RON files.
pub struct SpellLoader;

impl SpellLoader {
    /// Load spell templates from a RON file containing a `SpellCatalog`.
    ///
    /// Fails on duplicate spell ids rather than letting the later entry win.
    pub fn load(path: &Path) -> LoadResult<TemplateCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<TemplateCatalog> {
        let catalog: SpellCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse spell catalog RON: {}", e))?;

        let mut seen = HashSet::new();
        for spell in &catalog.spells {
            if !seen.insert(spell.id) {
                anyhow::bail!("Duplicate spell id {} ({})", spell.id, spell.name);
            }
        }

        tracing::debug!(count = catalog.spells.len(), "loaded spell templates");
        Ok(catalog.spells.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{AuraType, Millis, SchoolMask, SpellId, TemplateOracle};

    #[test]
    fn parses_sparse_templates() {
        let catalog = SpellLoader::parse(
            r#"#![enable(unwrap_newtypes, implicit_some)]
(
    spells: [
        (
            id: 10,
            name: "Corruption",
            school: "SHADOW",
            duration: 12000,
            effects: [
                (aura: PeriodicDamage, base_points: 8, amplitude: 3000),
            ],
        ),
    ],
)"#,
        )
        .expect("catalog");

        let template = catalog.template(SpellId(10)).expect("template");
        assert_eq!(template.school, SchoolMask::SHADOW);
        assert_eq!(template.duration, Some(Millis(12_000)));
        assert_eq!(template.effects[0].aura, Some(AuraType::PeriodicDamage));
        assert_eq!(template.effects[0].amplitude, Millis(3000));
        assert_eq!(template.max_stack, 1);
    }

    #[test]
    fn duplicate_ids_fail() {
        let result = SpellLoader::parse(
            r#"#![enable(unwrap_newtypes)]
(spells: [(id: 1, name: "A"), (id: 1, name: "B")])"#,
        );
        assert!(result.is_err());
    }
}
