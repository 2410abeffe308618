//! Fixed-step driver that plays a scenario against a world.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use combat_content::{Action, CombatContent, Scenario, ScriptedAction};
use combat_core::{
    ApplyParams, AuraError, CastError, CombatEnv, CombatError, CombatEvent, DamageInfo,
    DamageKind, ErrorSeverity, HealInfo, InterruptStrength, Millis, PcgRng, UnitId, World,
    WorldError,
};
use serde::Serialize;

/// Step and stop settings for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub tick: Millis,
    /// Hard stop; `None` runs until the fight settles after the script ends.
    pub duration: Option<Millis>,
    /// Overrides both the scenario and the configured seed.
    pub seed: Option<u64>,
}

impl RunOptions {
    pub const DEFAULT_TICK: Millis = Millis(100);
    /// Cap for runs without an explicit duration.
    pub const MAX_RUN: Millis = Millis::from_secs(600);
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            tick: Self::DEFAULT_TICK,
            duration: None,
            seed: None,
        }
    }
}

/// A scripted action the referee refused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedAction {
    pub at: Millis,
    pub code: &'static str,
    pub severity: ErrorSeverity,
    pub message: String,
}

impl RejectedAction {
    /// Script-side failures such as unknown unit names count as validation
    /// errors.
    const SCRIPT_ERROR: &'static str = "SCRIPT_INVALID";

    fn new(at: Millis, error: &anyhow::Error) -> Self {
        let (code, severity) = classify(error)
            .unwrap_or((Self::SCRIPT_ERROR, ErrorSeverity::Validation));
        Self {
            at,
            code,
            severity,
            message: format!("{error:#}"),
        }
    }
}

fn classify(error: &anyhow::Error) -> Option<(&'static str, ErrorSeverity)> {
    fn parts(error: &dyn CombatError) -> (&'static str, ErrorSeverity) {
        (error.error_code(), error.severity())
    }
    if let Some(error) = error.downcast_ref::<WorldError>() {
        return Some(parts(error));
    }
    if let Some(error) = error.downcast_ref::<AuraError>() {
        return Some(parts(error));
    }
    error.downcast_ref::<CastError>().map(|error| parts(error))
}

/// Plays scripted actions and advances the world in fixed steps.
pub struct ScenarioRunner<'a> {
    content: &'a CombatContent,
    world: World,
    units: BTreeMap<String, UnitId>,
    script: Vec<ScriptedAction>,
    next_action: usize,
    rejected: Vec<RejectedAction>,
    options: RunOptions,
}

impl<'a> ScenarioRunner<'a> {
    /// Spawns every scenario unit and applies its starting auras.
    pub fn new(content: &'a CombatContent, scenario: &Scenario, options: RunOptions) -> Result<Self> {
        let problems = scenario.problems();
        if !problems.is_empty() {
            anyhow::bail!("scenario '{}': {}", scenario.name, problems.join("; "));
        }
        if options.tick.is_zero() {
            anyhow::bail!("tick must be positive");
        }

        let seed = options
            .seed
            .or(scenario.seed)
            .unwrap_or(content.config.seed);
        let mut world = World::new(content.config.clone().with_seed(seed));
        let env = content.env(&PcgRng);

        let mut units = BTreeMap::new();
        for unit in &scenario.units {
            let mut spec = unit.to_spec();
            if let Some(owner) = &unit.owner {
                let owner_id = units
                    .get(owner)
                    .copied()
                    .with_context(|| format!("owner '{}' of '{}' not spawned", owner, unit.name))?;
                spec = spec.with_owner(owner_id);
            }
            let id = world.spawn(&spec);
            tracing::debug!(name = %unit.name, %id, "spawned");
            units.insert(unit.name.clone(), id);
        }
        for unit in &scenario.units {
            let Some(&id) = units.get(&unit.name) else {
                continue;
            };
            for spell in &unit.auras {
                world
                    .apply_aura(&env, id, id, *spell, ApplyParams::default())
                    .with_context(|| format!("starting aura {} on '{}'", spell, unit.name))?;
            }
        }

        Ok(Self {
            content,
            world,
            units,
            script: scenario.timeline().into_iter().cloned().collect(),
            next_action: 0,
            rejected: Vec::new(),
            options,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Scripted actions refused so far, in script order.
    pub fn rejected(&self) -> &[RejectedAction] {
        &self.rejected
    }

    pub fn unit_id(&self, name: &str) -> Option<UnitId> {
        self.units.get(name).copied()
    }

    /// Unit names with their ids, ordered by name.
    pub fn units(&self) -> impl Iterator<Item = (&str, UnitId)> {
        self.units.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn name_of(&self, id: UnitId) -> Option<&str> {
        self.units
            .iter()
            .find(|(_, unit)| **unit == id)
            .map(|(name, _)| name.as_str())
    }

    /// Runs the scenario to completion, handing every event to `sink`
    /// together with the time it was drained at.
    pub fn run(&mut self, mut sink: impl FnMut(Millis, &CombatEvent)) -> Millis {
        let end = self
            .options
            .duration
            .unwrap_or(RunOptions::MAX_RUN);

        loop {
            self.step(&mut sink);
            let now = self.world.now();
            if now >= end {
                break;
            }
            if self.options.duration.is_none() && self.is_settled() {
                tracing::debug!(%now, "fight settled");
                break;
            }
        }
        self.world.now()
    }

    /// Plays the actions due now, then advances one tick.
    pub fn step(&mut self, sink: &mut impl FnMut(Millis, &CombatEvent)) {
        let content = self.content;
        let env = content.env(&PcgRng);

        while let Some(entry) = self.script.get(self.next_action) {
            if entry.at > self.world.now() {
                break;
            }
            let action = entry.action.clone();
            self.next_action += 1;
            if let Err(error) = self.perform(&env, &action) {
                let rejected = RejectedAction::new(self.world.now(), &error);
                tracing::warn!(
                    at = %rejected.at,
                    ?action,
                    code = rejected.code,
                    severity = rejected.severity.as_str(),
                    %error,
                    "scripted action failed"
                );
                self.rejected.push(rejected);
            }
        }
        self.flush(sink);

        self.world.update(&env, self.options.tick);
        self.flush(sink);
    }

    fn flush(&mut self, sink: &mut impl FnMut(Millis, &CombatEvent)) {
        let now = self.world.now();
        for event in self.world.drain_events() {
            sink(now, &event);
        }
    }

    /// Script exhausted and nobody is fighting any more.
    fn is_settled(&self) -> bool {
        self.next_action >= self.script.len()
            && self
                .world
                .units()
                .all(|unit| !unit.is_alive() || !unit.is_in_combat())
    }

    fn id(&self, name: &str) -> Result<UnitId> {
        self.unit_id(name)
            .with_context(|| format!("unknown unit '{}'", name))
    }

    fn perform(&mut self, env: &CombatEnv<'_>, action: &Action) -> Result<()> {
        match action {
            Action::Attack { attacker, victim } => {
                let (attacker, victim) = (self.id(attacker)?, self.id(victim)?);
                self.world.attack_start(env, attacker, victim)?;
            }
            Action::StopAttack { attacker } => {
                let attacker = self.id(attacker)?;
                self.world.attack_stop(attacker);
            }
            Action::Cast {
                caster,
                target,
                spell,
            } => {
                let (caster, target) = (self.id(caster)?, self.id(target)?);
                self.world.start_cast(env, caster, target, *spell)?;
            }
            Action::ApplyAura {
                caster,
                target,
                spell,
            } => {
                let (caster, target) = (self.id(caster)?, self.id(target)?);
                self.world
                    .apply_aura(env, caster, target, *spell, ApplyParams::default())?;
            }
            Action::Damage {
                attacker,
                victim,
                school,
                amount,
            } => {
                let attacker = attacker.as_deref().map(|name| self.id(name)).transpose()?;
                let victim = self.id(victim)?;
                let info = DamageInfo::new(attacker, victim, *school, DamageKind::Direct, *amount);
                self.world.deal_damage(env, info);
            }
            Action::Heal {
                healer,
                target,
                amount,
            } => {
                let healer = healer.as_deref().map(|name| self.id(name)).transpose()?;
                let target = self.id(target)?;
                self.world.heal(env, HealInfo::new(healer, target, *amount));
            }
            Action::Move { unit } => {
                let unit = self.id(unit)?;
                self.world.notify_moved(env, unit);
            }
            Action::Interrupt { unit } => {
                let unit = self.id(unit)?;
                self.world
                    .interrupt_all_casts(env, unit, InterruptStrength::Hard);
            }
            Action::Duel {
                challenger,
                opponent,
            } => {
                let (challenger, opponent) = (self.id(challenger)?, self.id(opponent)?);
                self.world.start_duel(challenger, opponent)?;
            }
            Action::Evade { unit, evading } => {
                let unit = self.id(unit)?;
                self.world.set_evading(unit, *evading)?;
            }
            Action::Despawn { unit } => {
                let unit = self.id(unit)?;
                self.world.despawn(env, unit)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_content::ScenarioUnit;
    use combat_core::{CombatTables, SchoolMask, SpellId, SpellTemplate, WeaponProfile};

    fn content() -> CombatContent {
        let mut content = CombatContent::new(
            [SpellTemplate::new(SpellId(1), "Smite").with_school(SchoolMask::HOLY)]
                .into_iter()
                .collect(),
        );
        content.tables = CombatTables::deterministic();
        content
    }

    fn fighter(name: &str, player: bool) -> ScenarioUnit {
        ScenarioUnit {
            name: name.into(),
            level: 10,
            health: 200,
            player,
            flags: Some(Default::default()),
            main_hand: Some(WeaponProfile::fixed(10, Millis(1000))),
            ..ScenarioUnit::default()
        }
    }

    fn at(ms: u64, action: Action) -> ScriptedAction {
        ScriptedAction {
            at: Millis(ms),
            action,
        }
    }

    #[test]
    fn owners_resolve_to_spawned_ids() {
        let content = content();
        let scenario = Scenario {
            name: "pets".into(),
            units: vec![
                fighter("hunter", true),
                ScenarioUnit {
                    owner: Some("hunter".into()),
                    ..fighter("cat", false)
                },
            ],
            ..Scenario::default()
        };
        let runner = ScenarioRunner::new(&content, &scenario, RunOptions::default()).expect("runner");
        let hunter = runner.unit_id("hunter").expect("hunter");
        let cat = runner.unit_id("cat").expect("cat");
        assert_eq!(runner.world().unit(cat).and_then(|unit| unit.owner()), Some(hunter));
        assert_eq!(runner.name_of(cat), Some("cat"));
    }

    #[test]
    fn scripted_damage_lands_at_its_time() {
        let content = content();
        let scenario = Scenario {
            name: "poke".into(),
            units: vec![fighter("a", false), fighter("b", false)],
            script: vec![at(
                300,
                Action::Damage {
                    attacker: Some("a".into()),
                    victim: "b".into(),
                    school: SchoolMask::FIRE,
                    amount: 25,
                },
            )],
            ..Scenario::default()
        };
        let options = RunOptions {
            duration: Some(Millis(1000)),
            ..RunOptions::default()
        };
        let mut runner = ScenarioRunner::new(&content, &scenario, options).expect("runner");

        let mut hits = Vec::new();
        runner.run(|now, event| {
            if let CombatEvent::DamageTaken { amount, .. } = event {
                hits.push((now, *amount));
            }
        });
        assert_eq!(hits, vec![(Millis(300), 25)]);
        let b = runner.unit_id("b").expect("b");
        assert_eq!(runner.world().unit(b).map(|unit| unit.health().current), Some(175));
    }

    #[test]
    fn failed_actions_do_not_stop_the_run() {
        let content = content();
        let scenario = Scenario {
            name: "stubborn".into(),
            units: vec![fighter("a", false), fighter("b", false)],
            script: vec![
                at(0, Action::Attack {
                    attacker: "a".into(),
                    victim: "a".into(),
                }),
                at(0, Action::Attack {
                    attacker: "a".into(),
                    victim: "b".into(),
                }),
            ],
            ..Scenario::default()
        };
        let options = RunOptions {
            duration: Some(Millis(2500)),
            ..RunOptions::default()
        };
        let mut runner = ScenarioRunner::new(&content, &scenario, options).expect("runner");
        let mut swings = 0;
        let end = runner.run(|_, event| {
            if matches!(event, CombatEvent::DamageTaken { .. }) {
                swings += 1;
            }
        });
        assert_eq!(end, Millis(2500));
        assert!(swings >= 2, "swings {swings}");
        let rejected = runner.rejected();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].at, Millis(0));
        assert_eq!(rejected[0].code, "WORLD_SELF_TARGET");
        assert_eq!(rejected[0].severity, ErrorSeverity::Validation);
        let a = runner.unit_id("a").expect("a");
        assert_eq!(
            runner.world().unit(a).and_then(|unit| unit.attack_victim()),
            runner.unit_id("b")
        );
    }

    #[test]
    fn refusals_carry_code_and_severity() {
        let content = content();
        let scenario = Scenario {
            name: "too late".into(),
            units: vec![fighter("a", false), fighter("b", false)],
            script: vec![
                at(0, Action::Damage {
                    attacker: Some("a".into()),
                    victim: "b".into(),
                    school: SchoolMask::FIRE,
                    amount: 500,
                }),
                at(200, Action::Attack {
                    attacker: "a".into(),
                    victim: "b".into(),
                }),
                at(300, Action::ApplyAura {
                    caster: "a".into(),
                    target: "a".into(),
                    spell: SpellId(1),
                }),
            ],
            ..Scenario::default()
        };
        let options = RunOptions {
            duration: Some(Millis(1000)),
            ..RunOptions::default()
        };
        let mut runner = ScenarioRunner::new(&content, &scenario, options).expect("runner");
        runner.run(|_, _| {});

        let codes: Vec<_> = runner
            .rejected()
            .iter()
            .map(|rejected| (rejected.at, rejected.code, rejected.severity))
            .collect();
        assert_eq!(
            codes,
            vec![
                (Millis(200), "WORLD_NOT_ALIVE", ErrorSeverity::Recoverable),
                (Millis(300), "AURA_NO_EFFECTS", ErrorSeverity::Validation),
            ]
        );
    }

    #[test]
    fn undecided_runs_stop_once_combat_ends() {
        let content = content();
        let scenario = Scenario {
            name: "quiet".into(),
            units: vec![fighter("a", true), fighter("b", true)],
            script: vec![at(
                0,
                Action::Damage {
                    attacker: Some("a".into()),
                    victim: "b".into(),
                    school: SchoolMask::PHYSICAL,
                    amount: 1,
                },
            )],
            ..Scenario::default()
        };
        let mut runner =
            ScenarioRunner::new(&content, &scenario, RunOptions::default()).expect("runner");
        let end = runner.run(|_, _| {});
        assert!(end < RunOptions::MAX_RUN, "ran until {end}");
    }
}
