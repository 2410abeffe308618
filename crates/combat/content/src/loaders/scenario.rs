//! Scenario loader.

use std::path::Path;

use crate::loaders::{LoadResult, read_file};
use crate::scenario::Scenario;

/// Loader for scripted scenarios from RON files.
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Load a scenario and reject it when its units or script are
    /// inconsistent.
    pub fn load(path: &Path) -> LoadResult<Scenario> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Invalid scenario {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> LoadResult<Scenario> {
        let scenario: Scenario = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse scenario RON: {}", e))?;

        let problems = scenario.problems();
        if !problems.is_empty() {
            anyhow::bail!("{}", problems.join("; "));
        }
        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Action;
    use combat_core::Millis;

    #[test]
    fn parses_named_units_and_actions() {
        let scenario = ScenarioLoader::parse(
            r#"#![enable(unwrap_newtypes, implicit_some)]
(
    name: "sparring",
    units: [
        (name: "a", level: 10, health: 300, player: true),
        (name: "b", level: 10, health: 300, player: true),
    ],
    script: [
        (at: 0, action: Duel(challenger: "a", opponent: "b")),
        (at: 0, action: Attack(attacker: "a", victim: "b")),
    ],
)"#,
        )
        .expect("scenario");

        assert_eq!(scenario.units.len(), 2);
        assert_eq!(scenario.unit("b").map(|unit| unit.health), Some(300));
        assert_eq!(scenario.last_action_at(), Millis::ZERO);
        assert!(matches!(scenario.script[0].action, Action::Duel { .. }));
    }

    #[test]
    fn unknown_unit_in_script_fails() {
        let result = ScenarioLoader::parse(
            r#"#![enable(unwrap_newtypes)]
(name: "x", units: [(name: "a")], script: [(at: 0, action: Move(unit: "ghost"))])"#,
        );
        let message = format!("{:#}", result.expect_err("should fail"));
        assert!(message.contains("ghost"), "{message}");
    }
}
