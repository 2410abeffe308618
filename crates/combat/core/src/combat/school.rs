//! Damage schools.

use strum::{EnumCount, EnumIter};

/// A single damage school.
///
/// Resistances are tracked per school; `Physical` resistance is armor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumCount, EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpellSchool {
    Physical = 0,
    Holy = 1,
    Fire = 2,
    Nature = 3,
    Frost = 4,
    Shadow = 5,
    Arcane = 6,
}

impl SpellSchool {
    pub const fn mask(self) -> SchoolMask {
        SchoolMask::from_bits_truncate(1 << self as u8)
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

bitflags::bitflags! {
    /// Set of damage schools an effect belongs to or filters on.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct SchoolMask: u8 {
        const PHYSICAL = 1 << 0;
        const HOLY = 1 << 1;
        const FIRE = 1 << 2;
        const NATURE = 1 << 3;
        const FROST = 1 << 4;
        const SHADOW = 1 << 5;
        const ARCANE = 1 << 6;

        const MAGIC = Self::HOLY.bits()
            | Self::FIRE.bits()
            | Self::NATURE.bits()
            | Self::FROST.bits()
            | Self::SHADOW.bits()
            | Self::ARCANE.bits();
        const ALL = Self::PHYSICAL.bits() | Self::MAGIC.bits();
    }
}

impl SchoolMask {
    /// Whether armor applies (any physical component).
    pub const fn is_physical(self) -> bool {
        self.contains(Self::PHYSICAL)
    }

    /// The school with the lowest index in the mask, used to pick which
    /// resistance applies to multi-school damage.
    pub fn first_school(self) -> SpellSchool {
        use strum::IntoEnumIterator;
        SpellSchool::iter()
            .find(|school| self.intersects(school.mask()))
            .unwrap_or(SpellSchool::Physical)
    }

    /// Iterator over all single schools contained in the mask.
    pub fn schools(self) -> impl Iterator<Item = SpellSchool> {
        use strum::IntoEnumIterator;
        SpellSchool::iter().filter(move |school| self.intersects(school.mask()))
    }
}
