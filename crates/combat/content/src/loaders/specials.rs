//! Per-spell special-case loader.

use std::path::Path;

use combat_core::{Millis, ProcBehavior, ProcGuard, ProcPayload, SpecialTable, SpellId};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Proc override for one spell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProcOverride {
    pub spell: SpellId,
    #[serde(default)]
    pub guard: Option<ProcGuard>,
    #[serde(default)]
    pub payload: Option<ProcPayload>,
    #[serde(default)]
    pub cooldown: Option<Millis>,
}

/// Extra percent damage dealt by one spell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DamageBonus {
    pub spell: SpellId,
    pub pct: i32,
}

/// Special-case file structure for RON files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialCases {
    pub procs: Vec<ProcOverride>,
    pub damage_bonus: Vec<DamageBonus>,
}

/// Loader for the special-case table from RON files.
pub struct SpecialCaseLoader;

impl SpecialCaseLoader {
    pub fn load(path: &Path) -> LoadResult<SpecialTable> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<SpecialTable> {
        let cases: SpecialCases = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse special cases RON: {}", e))?;

        let mut table = SpecialTable::new();
        for entry in cases.procs {
            table.insert_proc(
                entry.spell,
                ProcBehavior {
                    guard: entry.guard,
                    payload: entry.payload,
                    cooldown: entry.cooldown,
                },
            );
        }
        for bonus in cases.damage_bonus {
            table.insert_damage_bonus(bonus.spell, bonus.pct);
        }
        Ok(table)
    }
}
