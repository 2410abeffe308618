//! The combatant and the spawn description it is built from.

use strum::EnumCount;

use crate::aura::AuraStore;
use crate::cast::CastSlots;
use crate::combat::SpellSchool;
use crate::config::CombatConfig;
use crate::session::CombatSession;

use super::{Millis, PowerPools, ResourceMeter, UnitId};

bitflags::bitflags! {
    /// Static capabilities and externally driven states of a unit.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct UnitFlags: u8 {
        const PLAYER_CONTROLLED = 1 << 0;
        const CAN_PARRY = 1 << 1;
        const CAN_BLOCK = 1 << 2;
        const CAN_DODGE = 1 << 3;
        /// Returning home; ignores all hostile actions.
        const EVADING = 1 << 4;
    }
}

bitflags::bitflags! {
    /// Control states maintained by aura hooks.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ControlFlags: u8 {
        const STUNNED = 1 << 0;
        const ROOTED = 1 << 1;
        const CONFUSED = 1 << 2;
        const SILENCED = 1 << 3;
        const MOUNTED = 1 << 4;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeathState {
    #[default]
    Alive,
    /// Lethal damage landed; death flow is running.
    Dying,
    Dead,
}

/// Weapon hand used by an auto-attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, EnumCount)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttackType {
    #[default]
    MainHand = 0,
    OffHand = 1,
    Ranged = 2,
}

impl AttackType {
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WeaponProfile {
    pub min_damage: u32,
    pub max_damage: u32,
    /// Swing interval; zero falls back to the configured default.
    pub speed: Millis,
}

impl WeaponProfile {
    pub const fn new(min_damage: u32, max_damage: u32, speed: Millis) -> Self {
        Self {
            min_damage,
            max_damage,
            speed,
        }
    }

    pub const fn fixed(damage: u32, speed: Millis) -> Self {
        Self::new(damage, damage, speed)
    }
}

/// Base combat numbers before aura modifiers.
///
/// Chances are in basis points (10 000 = 100%).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatStats {
    pub armor: i32,
    /// Indexed by [`SpellSchool`]; the physical slot is unused (armor covers it).
    pub resistances: [i32; SpellSchool::COUNT],
    pub crit_chance: u32,
    pub spell_crit_chance: u32,
    pub dodge_chance: u32,
    pub parry_chance: u32,
    pub block_chance: u32,
    pub block_value: u32,
    /// Added to the level-derived defense skill.
    pub defense_bonus: i32,
    pub weapons: [WeaponProfile; AttackType::COUNT],
}

impl CombatStats {
    pub fn with_armor(mut self, armor: i32) -> Self {
        self.armor = armor;
        self
    }

    pub fn with_resistance(mut self, school: SpellSchool, value: i32) -> Self {
        self.resistances[school.index()] = value;
        self
    }

    pub fn with_weapon(mut self, attack: AttackType, weapon: WeaponProfile) -> Self {
        self.weapons[attack.index()] = weapon;
        self
    }

    pub fn with_block(mut self, chance: u32, value: u32) -> Self {
        self.block_chance = chance;
        self.block_value = value;
        self
    }

    pub fn weapon(&self, attack: AttackType) -> &WeaponProfile {
        &self.weapons[attack.index()]
    }
}

/// Everything needed to spawn a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UnitSpec {
    pub level: u8,
    pub max_health: u32,
    pub powers: PowerPools,
    pub flags: UnitFlags,
    pub stats: CombatStats,
    pub owner: Option<UnitId>,
}

impl UnitSpec {
    pub fn new(level: u8, max_health: u32) -> Self {
        Self {
            level,
            max_health,
            powers: PowerPools::default(),
            flags: UnitFlags::CAN_DODGE | UnitFlags::CAN_PARRY,
            stats: CombatStats::default(),
            owner: None,
        }
    }

    pub fn player(level: u8, max_health: u32) -> Self {
        let mut spec = Self::new(level, max_health);
        spec.flags |= UnitFlags::PLAYER_CONTROLLED;
        spec
    }

    pub fn with_flags(mut self, flags: UnitFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_stats(mut self, stats: CombatStats) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_powers(mut self, powers: PowerPools) -> Self {
        self.powers = powers;
        self
    }

    pub fn with_owner(mut self, owner: UnitId) -> Self {
        self.owner = Some(owner);
        self
    }
}

impl Default for UnitSpec {
    fn default() -> Self {
        Self::new(1, 100)
    }
}

/// Auto-attack bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct AutoAttack {
    pub victim: Option<UnitId>,
    /// Time until the next main-hand swing.
    pub swing_timer: Millis,
}

/// A combatant tracked by the [`World`](crate::world::World).
#[derive(Clone, Debug)]
pub struct Unit {
    pub(crate) id: UnitId,
    pub(crate) level: u8,
    pub(crate) health: ResourceMeter,
    pub(crate) base_max_health: u32,
    pub(crate) powers: PowerPools,
    pub(crate) flags: UnitFlags,
    pub(crate) control: ControlFlags,
    pub(crate) stats: CombatStats,
    pub(crate) death_state: DeathState,
    pub(crate) owner: Option<UnitId>,
    pub(crate) minions: Vec<UnitId>,
    pub(crate) duel_opponent: Option<UnitId>,
    pub(crate) attack: AutoAttack,
    pub(crate) proc_depth: u8,
    pub(crate) in_world: bool,
    pub(crate) auras: AuraStore,
    pub(crate) casts: CastSlots,
    pub(crate) session: CombatSession,
}

impl Unit {
    pub(crate) fn from_spec(id: UnitId, spec: &UnitSpec) -> Self {
        Self {
            id,
            level: spec.level,
            health: ResourceMeter::full(spec.max_health),
            base_max_health: spec.max_health,
            powers: spec.powers,
            flags: spec.flags,
            control: ControlFlags::empty(),
            stats: spec.stats,
            death_state: DeathState::Alive,
            owner: spec.owner,
            minions: Vec::new(),
            duel_opponent: None,
            attack: AutoAttack::default(),
            proc_depth: 0,
            in_world: true,
            auras: AuraStore::default(),
            casts: CastSlots::default(),
            session: CombatSession::default(),
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn health(&self) -> ResourceMeter {
        self.health
    }

    pub fn powers(&self) -> &PowerPools {
        &self.powers
    }

    pub fn flags(&self) -> UnitFlags {
        self.flags
    }

    pub fn control(&self) -> ControlFlags {
        self.control
    }

    pub fn stats(&self) -> &CombatStats {
        &self.stats
    }

    pub fn death_state(&self) -> DeathState {
        self.death_state
    }

    pub fn owner(&self) -> Option<UnitId> {
        self.owner
    }

    pub fn minions(&self) -> &[UnitId] {
        &self.minions
    }

    pub fn duel_opponent(&self) -> Option<UnitId> {
        self.duel_opponent
    }

    pub fn attack_victim(&self) -> Option<UnitId> {
        self.attack.victim
    }

    pub fn auras(&self) -> &AuraStore {
        &self.auras
    }

    pub fn casts(&self) -> &CastSlots {
        &self.casts
    }

    pub fn session(&self) -> &CombatSession {
        &self.session
    }

    pub fn is_alive(&self) -> bool {
        self.death_state == DeathState::Alive
    }

    pub fn is_in_world(&self) -> bool {
        self.in_world
    }

    pub fn is_player_controlled(&self) -> bool {
        self.flags.contains(UnitFlags::PLAYER_CONTROLLED)
    }

    pub fn is_evading(&self) -> bool {
        self.flags.contains(UnitFlags::EVADING)
    }

    pub fn is_in_combat(&self) -> bool {
        self.session.is_in_combat()
    }

    /// Weapon skill derived from level.
    pub fn weapon_skill(&self) -> i32 {
        i32::from(self.level) * 5
    }

    pub fn defense_skill(&self) -> i32 {
        i32::from(self.level) * 5 + self.stats.defense_bonus
    }

    /// Swing interval for `attack`, falling back to the configured default.
    pub fn swing_time(&self, attack: AttackType, config: &CombatConfig) -> Millis {
        let speed = self.stats.weapon(attack).speed;
        if speed.is_zero() {
            config.default_swing
        } else {
            speed
        }
    }

    /// Whether the unit holds nothing that would outlive it.
    ///
    /// Required before the unit is dropped from the world.
    pub fn is_cleared(&self) -> bool {
        self.auras.is_empty()
            && self.session.hostile_refs().is_empty()
            && !self.casts.any_active()
            && self.attack.victim.is_none()
    }
}
