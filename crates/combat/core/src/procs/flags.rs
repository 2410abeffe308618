bitflags::bitflags! {
    /// Event categories a proc can react to.
    ///
    /// `DONE_*` flags are raised on the acting unit, `TAKEN_*` on the victim.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ProcFlags: u32 {
        /// Holder was killed by another unit.
        const KILLED = 1 << 0;
        /// Holder killed a unit.
        const KILL = 1 << 1;
        const DONE_MELEE_AUTO = 1 << 2;
        const TAKEN_MELEE_AUTO = 1 << 3;
        const DONE_MELEE_SPELL = 1 << 4;
        const TAKEN_MELEE_SPELL = 1 << 5;
        const DONE_RANGED_AUTO = 1 << 6;
        const TAKEN_RANGED_AUTO = 1 << 7;
        const DONE_SPELL_MAGIC_POS = 1 << 8;
        const TAKEN_SPELL_MAGIC_POS = 1 << 9;
        const DONE_SPELL_MAGIC_NEG = 1 << 10;
        const TAKEN_SPELL_MAGIC_NEG = 1 << 11;
        const DONE_PERIODIC = 1 << 12;
        const TAKEN_PERIODIC = 1 << 13;
        /// Any damage that was not fully prevented.
        const TAKEN_DAMAGE = 1 << 14;
        /// Holder died, whatever the cause.
        const DEATH = 1 << 15;
    }
}

bitflags::bitflags! {
    /// Result predicates a proc can require.
    ///
    /// An empty mask on a template means "normal or critical hits".
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ProcHitMask: u16 {
        const NORMAL = 1 << 0;
        const CRITICAL = 1 << 1;
        const MISS = 1 << 2;
        const DODGE = 1 << 3;
        const PARRY = 1 << 4;
        const BLOCK = 1 << 5;
        const EVADE = 1 << 6;
        const IMMUNE = 1 << 7;
        const DEFLECT = 1 << 8;
        const ABSORB = 1 << 9;
        const RESIST = 1 << 10;
        const FULL_BLOCK = 1 << 11;
        const HEAL = 1 << 12;
    }
}

impl ProcHitMask {
    /// Mask a template actually requires, resolving the empty default.
    pub fn effective(self) -> Self {
        if self.is_empty() {
            Self::NORMAL | Self::CRITICAL
        } else {
            self
        }
    }
}
