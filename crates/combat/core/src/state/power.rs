use strum::{EnumCount, EnumIter};

use super::ResourceMeter;

/// Secondary resource pools a unit can carry besides health.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerType {
    Mana = 0,
    Rage = 1,
    Energy = 2,
    Focus = 3,
}

impl PowerType {
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Maps an effect's misc value back to a power type.
    pub const fn from_misc(misc: i32) -> Option<Self> {
        match misc {
            0 => Some(Self::Mana),
            1 => Some(Self::Rage),
            2 => Some(Self::Energy),
            3 => Some(Self::Focus),
            _ => None,
        }
    }
}

/// One meter per [`PowerType`]; pools a unit does not use stay at 0/0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerPools {
    pools: [ResourceMeter; PowerType::COUNT],
}

impl PowerPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: gives the unit a full pool of `power`.
    pub fn with(mut self, power: PowerType, maximum: u32) -> Self {
        self.pools[power.index()] = ResourceMeter::full(maximum);
        self
    }

    pub fn get(&self, power: PowerType) -> &ResourceMeter {
        &self.pools[power.index()]
    }

    pub fn get_mut(&mut self, power: PowerType) -> &mut ResourceMeter {
        &mut self.pools[power.index()]
    }

    pub fn current(&self, power: PowerType) -> u32 {
        self.get(power).current
    }

    pub fn drain(&mut self, power: PowerType, amount: u32) -> u32 {
        self.get_mut(power).drain(amount)
    }

    pub fn restore(&mut self, power: PowerType, amount: u32) -> u32 {
        self.get_mut(power).restore(amount)
    }
}
