use crate::procs::ProcHitMask;

/// Result of the hit roll for one attack or spell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HitOutcome {
    Miss,
    Dodge,
    Parry,
    /// Landed, partially stopped by the victim's shield.
    Block,
    /// Fully resisted spell.
    Resist,
    /// Ranged attack deflected.
    Deflect,
    Evade,
    Immune,
    #[default]
    Normal,
    Crit,
    Crushing,
    Glancing,
}

impl HitOutcome {
    /// Whether damage is delivered at all.
    pub const fn lands(self) -> bool {
        matches!(
            self,
            Self::Normal | Self::Crit | Self::Crushing | Self::Glancing | Self::Block
        )
    }

    pub const fn is_crit(self) -> bool {
        matches!(self, Self::Crit)
    }

    pub fn hit_mask(self) -> ProcHitMask {
        match self {
            Self::Miss => ProcHitMask::MISS,
            Self::Dodge => ProcHitMask::DODGE,
            Self::Parry => ProcHitMask::PARRY,
            Self::Block => ProcHitMask::BLOCK | ProcHitMask::NORMAL,
            Self::Resist => ProcHitMask::RESIST,
            Self::Deflect => ProcHitMask::DEFLECT,
            Self::Evade => ProcHitMask::EVADE,
            Self::Immune => ProcHitMask::IMMUNE,
            Self::Normal | Self::Crushing | Self::Glancing => ProcHitMask::NORMAL,
            Self::Crit => ProcHitMask::CRITICAL,
        }
    }
}

bitflags::bitflags! {
    /// Presentation details of a resolved hit.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct HitInfo: u16 {
        const CRITICAL = 1 << 0;
        const GLANCING = 1 << 1;
        const CRUSHING = 1 << 2;
        const PARTIAL_ABSORB = 1 << 3;
        const FULL_ABSORB = 1 << 4;
        const PARTIAL_RESIST = 1 << 5;
        const FULL_RESIST = 1 << 6;
        const BLOCK = 1 << 7;
        const FULL_BLOCK = 1 << 8;
        const REFLECTED = 1 << 9;
    }
}
