use crate::state::Millis;

/// Combat configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// How long a unit stays in combat after its last hostile action once no
    /// hostile reference remains.
    pub combat_timeout: Millis,

    /// Maximum nested proc dispatches per unit before the chain is cut off.
    pub max_proc_depth: u8,

    /// Delay added to a generic cast each time damage pushes it back.
    pub pushback: Millis,

    /// Number of pushbacks a single cast can suffer.
    pub max_pushbacks: u8,

    /// Swing timer used for units whose weapon declares no speed.
    pub default_swing: Millis,

    /// Seed mixed into every random roll.
    pub seed: u64,
}

impl CombatConfig {
    // ===== compile-time constants used as type parameters =====
    /// Declared sub-effects per template.
    pub const MAX_EFFECTS: usize = 3;
    /// Hard cap for any template's declared stack maximum.
    pub const MAX_STACKS: u8 = 255;
    /// Linked-spell declarations per template.
    pub const MAX_LINKS: usize = 4;
    /// Concurrent stacking groups tracked during one aggregation.
    pub const MAX_STACKING_GROUPS: usize = 8;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_COMBAT_TIMEOUT: Millis = Millis::from_secs(5);
    pub const DEFAULT_MAX_PROC_DEPTH: u8 = 8;
    pub const DEFAULT_PUSHBACK: Millis = Millis(500);
    pub const DEFAULT_MAX_PUSHBACKS: u8 = 2;
    pub const DEFAULT_SWING: Millis = Millis(2000);

    pub fn new() -> Self {
        Self {
            combat_timeout: Self::DEFAULT_COMBAT_TIMEOUT,
            max_proc_depth: Self::DEFAULT_MAX_PROC_DEPTH,
            pushback: Self::DEFAULT_PUSHBACK,
            max_pushbacks: Self::DEFAULT_MAX_PUSHBACKS,
            default_swing: Self::DEFAULT_SWING,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
