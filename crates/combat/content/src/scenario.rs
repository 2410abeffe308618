//! Scripted fights for the tick driver.
//!
//! A scenario names its units, describes how to spawn them and lists
//! actions to run at fixed simulation times. Units are referenced by name;
//! the driver maps names to the ids the world hands out.

use std::collections::HashSet;

use combat_core::{
    AttackType, CombatStats, Millis, PowerPools, PowerType, SchoolMask, SpellId, SpellSchool,
    UnitFlags, UnitSpec, WeaponProfile,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Scenario {
    pub name: String,
    /// Overrides the configured world seed.
    pub seed: Option<u64>,
    pub units: Vec<ScenarioUnit>,
    pub script: Vec<ScriptedAction>,
}

impl Scenario {
    pub fn unit(&self, name: &str) -> Option<&ScenarioUnit> {
        self.units.iter().find(|unit| unit.name == name)
    }

    /// Script entries ordered by time; entries at the same time keep their
    /// written order.
    pub fn timeline(&self) -> Vec<&ScriptedAction> {
        let mut actions: Vec<_> = self.script.iter().collect();
        actions.sort_by_key(|action| action.at);
        actions
    }

    /// Time of the last scripted action.
    pub fn last_action_at(&self) -> Millis {
        self.script
            .iter()
            .map(|action| action.at)
            .max()
            .unwrap_or(Millis::ZERO)
    }

    /// Problems that make the scenario unusable: duplicate unit names,
    /// owners declared after their minions, and actions naming unknown
    /// units.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();
        for unit in &self.units {
            if let Some(owner) = &unit.owner
                && !seen.contains(owner.as_str())
            {
                problems.push(format!(
                    "unit '{}' names owner '{}' before it is declared",
                    unit.name, owner
                ));
            }
            if !seen.insert(unit.name.as_str()) {
                problems.push(format!("duplicate unit name '{}'", unit.name));
            }
        }
        for entry in &self.script {
            for name in entry.action.unit_names() {
                if !seen.contains(name) {
                    problems.push(format!("action at {} names unknown unit '{}'", entry.at, name));
                }
            }
        }
        problems
    }
}

/// Spawn description of one scenario unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScenarioUnit {
    pub name: String,
    pub level: u8,
    pub health: u32,
    pub player: bool,
    /// Replaces the default capabilities (dodge and parry).
    pub flags: Option<UnitFlags>,
    pub armor: i32,
    pub crit_chance: u32,
    pub spell_crit_chance: u32,
    pub dodge_chance: u32,
    pub parry_chance: u32,
    pub block_chance: u32,
    pub block_value: u32,
    pub main_hand: Option<WeaponProfile>,
    pub off_hand: Option<WeaponProfile>,
    pub ranged: Option<WeaponProfile>,
    pub resistances: Vec<(SpellSchool, i32)>,
    pub powers: Vec<(PowerType, u32)>,
    pub owner: Option<String>,
    /// Auras the unit casts on itself right after spawning.
    pub auras: Vec<SpellId>,
}

impl Default for ScenarioUnit {
    fn default() -> Self {
        Self {
            name: String::new(),
            level: 1,
            health: 100,
            player: false,
            flags: None,
            armor: 0,
            crit_chance: 0,
            spell_crit_chance: 0,
            dodge_chance: 0,
            parry_chance: 0,
            block_chance: 0,
            block_value: 0,
            main_hand: None,
            off_hand: None,
            ranged: None,
            resistances: Vec::new(),
            powers: Vec::new(),
            owner: None,
            auras: Vec::new(),
        }
    }
}

impl ScenarioUnit {
    /// Builds the spawn spec. The owner is left unset; only the driver
    /// knows which id the owner received.
    pub fn to_spec(&self) -> UnitSpec {
        let mut stats = CombatStats::default()
            .with_armor(self.armor)
            .with_block(self.block_chance, self.block_value);
        stats.crit_chance = self.crit_chance;
        stats.spell_crit_chance = self.spell_crit_chance;
        stats.dodge_chance = self.dodge_chance;
        stats.parry_chance = self.parry_chance;
        for (attack, weapon) in [
            (AttackType::MainHand, self.main_hand),
            (AttackType::OffHand, self.off_hand),
            (AttackType::Ranged, self.ranged),
        ] {
            if let Some(weapon) = weapon {
                stats = stats.with_weapon(attack, weapon);
            }
        }
        for (school, value) in &self.resistances {
            stats = stats.with_resistance(*school, *value);
        }

        let powers = self
            .powers
            .iter()
            .fold(PowerPools::new(), |pools, (power, maximum)| pools.with(*power, *maximum));

        let mut spec = if self.player {
            UnitSpec::player(self.level, self.health)
        } else {
            UnitSpec::new(self.level, self.health)
        };
        if let Some(flags) = self.flags {
            spec = spec.with_flags(flags);
            if self.player {
                spec.flags |= UnitFlags::PLAYER_CONTROLLED;
            }
        }
        spec.with_stats(stats).with_powers(powers)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScriptedAction {
    pub at: Millis,
    pub action: Action,
}

/// Something the driver does to the world at a scripted time.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    Attack { attacker: String, victim: String },
    StopAttack { attacker: String },
    Cast { caster: String, target: String, spell: SpellId },
    ApplyAura { caster: String, target: String, spell: SpellId },
    Damage {
        attacker: Option<String>,
        victim: String,
        school: SchoolMask,
        amount: u32,
    },
    Heal {
        healer: Option<String>,
        target: String,
        amount: u32,
    },
    Move { unit: String },
    Interrupt { unit: String },
    Duel { challenger: String, opponent: String },
    Evade { unit: String, evading: bool },
    Despawn { unit: String },
}

impl Action {
    /// Every unit name the action refers to.
    pub fn unit_names(&self) -> Vec<&str> {
        match self {
            Self::Attack { attacker, victim } => vec![attacker.as_str(), victim.as_str()],
            Self::Cast { caster, target, .. } | Self::ApplyAura { caster, target, .. } => {
                vec![caster.as_str(), target.as_str()]
            }
            Self::Damage {
                attacker: source,
                victim: target,
                ..
            }
            | Self::Heal {
                healer: source,
                target,
                ..
            } => source
                .iter()
                .map(String::as_str)
                .chain([target.as_str()])
                .collect(),
            Self::Duel {
                challenger,
                opponent,
            } => vec![challenger.as_str(), opponent.as_str()],
            Self::StopAttack { attacker: unit }
            | Self::Move { unit }
            | Self::Interrupt { unit }
            | Self::Evade { unit, .. }
            | Self::Despawn { unit } => vec![unit.as_str()],
        }
    }
}
