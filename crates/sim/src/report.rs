//! Event stream output and end-of-run summary.

use std::collections::BTreeMap;
use std::io::Write;

use anyhow::Result;
use combat_core::{CombatEvent, LootItem, Millis, UnitId};
use serde::Serialize;

use crate::driver::{RejectedAction, ScenarioRunner};

/// One event line as written to the output stream.
#[derive(Serialize)]
pub struct TimedEvent<'a> {
    pub at: Millis,
    #[serde(flatten)]
    pub event: &'a CombatEvent,
}

/// Writes events as JSON lines.
pub struct EventWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> EventWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn write(&mut self, at: Millis, event: &CombatEvent) -> Result<()> {
        serde_json::to_writer(&mut self.out, &TimedEvent { at, event })?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Per-event-kind counters gathered while the run streams.
#[derive(Debug, Default)]
pub struct Tally {
    counts: BTreeMap<&'static str, usize>,
    damage_taken: BTreeMap<UnitId, u64>,
    healing_received: BTreeMap<UnitId, u64>,
    loot: Vec<(UnitId, LootItem)>,
}

impl Tally {
    pub fn record(&mut self, event: &CombatEvent) {
        *self.counts.entry(event.kind()).or_default() += 1;
        match event {
            CombatEvent::DamageTaken { victim, amount, .. } => {
                *self.damage_taken.entry(*victim).or_default() += u64::from(*amount);
            }
            CombatEvent::HealReceived { target, amount, .. } => {
                *self.healing_received.entry(*target).or_default() += u64::from(*amount);
            }
            CombatEvent::LootFilled { looter, items, .. } => {
                self.loot.extend(items.iter().map(|item| (*looter, *item)));
            }
            _ => {}
        }
    }

    pub fn count(&self, kind: &str) -> usize {
        self.counts.get(kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Serialize)]
pub struct UnitSummary {
    pub name: String,
    pub id: UnitId,
    pub health: u32,
    pub max_health: u32,
    pub alive: bool,
    pub in_combat: bool,
    pub damage_taken: u64,
    pub healing_received: u64,
    pub loot: Vec<LootItem>,
}

#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub scenario: String,
    pub elapsed: Millis,
    pub events: BTreeMap<&'static str, usize>,
    pub units: Vec<UnitSummary>,
    pub rejected: Vec<RejectedAction>,
}

impl RunSummary {
    pub fn collect(scenario: &str, runner: &ScenarioRunner<'_>, tally: &Tally) -> Self {
        let world = runner.world();
        let units = runner
            .units()
            .filter_map(|(name, id)| {
                let unit = world.unit(id)?;
                Some(UnitSummary {
                    name: name.to_owned(),
                    id,
                    health: unit.health().current,
                    max_health: unit.health().maximum,
                    alive: unit.is_alive(),
                    in_combat: unit.is_in_combat(),
                    damage_taken: tally.damage_taken.get(&id).copied().unwrap_or(0),
                    healing_received: tally.healing_received.get(&id).copied().unwrap_or(0),
                    loot: tally
                        .loot
                        .iter()
                        .filter(|(looter, _)| *looter == id)
                        .map(|(_, item)| *item)
                        .collect(),
                })
            })
            .collect();

        Self {
            scenario: scenario.to_owned(),
            elapsed: world.now(),
            events: tally.counts.clone(),
            units,
            rejected: runner.rejected().to_vec(),
        }
    }
}
