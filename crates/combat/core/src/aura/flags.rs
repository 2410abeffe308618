bitflags::bitflags! {
    /// Events that break an aura on its holder.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct AuraInterruptFlags: u8 {
        /// Holder took damage that was not fully prevented.
        const TAKE_DAMAGE = 1 << 0;
        const MOVE = 1 << 1;
        /// Holder started a cast.
        const CAST = 1 << 2;
        /// Holder swung a melee weapon.
        const MELEE_ATTACK = 1 << 3;
        const ENTER_COMBAT = 1 << 4;
    }
}
