//! Damage and heal descriptors and the results handed back to callers.
//!
//! A [`DamageInfo`] is built once per resolution and then only moves
//! forward: each pipeline stage may add to exactly one running total, in a
//! fixed order, and never takes more than what is still left. That keeps
//!
//! `mitigated + blocked + resisted + absorbed + redirected <= raw`
//!
//! true after every stage, with the final amount being the remainder.

use crate::env::DamageClass;
use crate::state::{AttackType, SpellId, UnitId};

use super::{HitInfo, HitOutcome, SchoolMask};

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct DamageFlags: u8 {
        /// Split/redirect auras are skipped.
        const NO_REDIRECT = 1 << 0;
        /// Damage shield reflection.
        const REFLECTED = 1 << 1;
        /// The resolution does not feed the proc dispatcher.
        const NO_PROC = 1 << 2;
    }
}

/// How the damage was delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageKind {
    /// Weapon auto-attack.
    Auto(AttackType),
    Direct,
    Periodic,
    Channel,
}

/// Pipeline stages, in the order they run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum DamageStage {
    #[default]
    Raw,
    Armor,
    Block,
    Resist,
    Absorb,
    Split,
    Final,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DamageInfo {
    pub attacker: Option<UnitId>,
    pub victim: UnitId,
    pub spell: Option<SpellId>,
    pub school: SchoolMask,
    pub kind: DamageKind,
    pub class: DamageClass,
    pub raw: u32,
    mitigated: u32,
    blocked: u32,
    resisted: u32,
    absorbed: u32,
    redirected: u32,
    pub flags: DamageFlags,
    pub outcome: HitOutcome,
    pub hit_info: HitInfo,
    stage: DamageStage,
}

impl DamageInfo {
    pub fn new(
        attacker: Option<UnitId>,
        victim: UnitId,
        school: SchoolMask,
        kind: DamageKind,
        raw: u32,
    ) -> Self {
        Self {
            attacker,
            victim,
            spell: None,
            school,
            kind,
            class: DamageClass::None,
            raw,
            mitigated: 0,
            blocked: 0,
            resisted: 0,
            absorbed: 0,
            redirected: 0,
            flags: DamageFlags::empty(),
            outcome: HitOutcome::Normal,
            hit_info: HitInfo::empty(),
            stage: DamageStage::Raw,
        }
    }

    pub fn with_spell(mut self, spell: SpellId) -> Self {
        self.spell = Some(spell);
        self
    }

    pub fn with_class(mut self, class: DamageClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_flags(mut self, flags: DamageFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_outcome(mut self, outcome: HitOutcome) -> Self {
        self.outcome = outcome;
        if outcome.is_crit() {
            self.hit_info |= HitInfo::CRITICAL;
        }
        match outcome {
            HitOutcome::Glancing => self.hit_info |= HitInfo::GLANCING,
            HitOutcome::Crushing => self.hit_info |= HitInfo::CRUSHING,
            HitOutcome::Block => self.hit_info |= HitInfo::BLOCK,
            _ => {}
        }
        self
    }

    /// Amount not yet taken by any stage.
    pub fn remaining(&self) -> u32 {
        self.raw
            - self.mitigated
            - self.blocked
            - self.resisted
            - self.absorbed
            - self.redirected
    }

    /// Damage that reaches the victim's health once every stage has run.
    pub fn final_damage(&self) -> u32 {
        self.remaining()
    }

    pub fn mitigated(&self) -> u32 {
        self.mitigated
    }

    pub fn blocked(&self) -> u32 {
        self.blocked
    }

    pub fn resisted(&self) -> u32 {
        self.resisted
    }

    pub fn absorbed(&self) -> u32 {
        self.absorbed
    }

    pub fn redirected(&self) -> u32 {
        self.redirected
    }

    pub fn stage(&self) -> DamageStage {
        self.stage
    }

    /// Moves the descriptor to `stage` and returns how much of `amount`
    /// the stage may take.
    fn enter(&mut self, stage: DamageStage, amount: u32) -> u32 {
        debug_assert!(
            stage >= self.stage,
            "damage stage {stage:?} after {:?}",
            self.stage
        );
        self.stage = self.stage.max(stage);
        amount.min(self.remaining())
    }

    pub fn mitigate(&mut self, amount: u32) -> u32 {
        let taken = self.enter(DamageStage::Armor, amount);
        self.mitigated += taken;
        taken
    }

    pub fn block(&mut self, amount: u32) -> u32 {
        let taken = self.enter(DamageStage::Block, amount);
        self.blocked += taken;
        if taken > 0 && self.remaining() == 0 {
            self.hit_info |= HitInfo::FULL_BLOCK;
        }
        taken
    }

    pub fn resist(&mut self, amount: u32) -> u32 {
        let taken = self.enter(DamageStage::Resist, amount);
        self.resisted += taken;
        if taken > 0 {
            self.hit_info |= if self.remaining() == 0 {
                HitInfo::FULL_RESIST
            } else {
                HitInfo::PARTIAL_RESIST
            };
        }
        taken
    }

    pub fn absorb(&mut self, amount: u32) -> u32 {
        let taken = self.enter(DamageStage::Absorb, amount);
        self.absorbed += taken;
        taken
    }

    /// Marks absorb presentation bits once every shield has been consulted.
    pub fn finish_absorb(&mut self) {
        self.enter(DamageStage::Absorb, 0);
        if self.absorbed > 0 {
            self.hit_info |= if self.remaining() == 0 {
                HitInfo::FULL_ABSORB
            } else {
                HitInfo::PARTIAL_ABSORB
            };
        }
    }

    pub fn redirect(&mut self, amount: u32) -> u32 {
        let taken = self.enter(DamageStage::Split, amount);
        self.redirected += taken;
        taken
    }

    pub fn finish(&mut self) -> u32 {
        self.enter(DamageStage::Final, 0);
        self.final_damage()
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self.kind, DamageKind::Periodic)
    }

    /// Whether the descriptor still satisfies the conservation law.
    pub fn is_conserved(&self) -> bool {
        let taken = u64::from(self.mitigated)
            + u64::from(self.blocked)
            + u64::from(self.resisted)
            + u64::from(self.absorbed)
            + u64::from(self.redirected);
        taken <= u64::from(self.raw)
    }
}

/// What a damage resolution did, returned to the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageResult {
    pub outcome: HitOutcome,
    pub hit_info: HitInfo,
    pub raw: u32,
    pub mitigated: u32,
    pub blocked: u32,
    pub resisted: u32,
    pub absorbed: u32,
    pub redirected: u32,
    /// Amount after every stage.
    pub final_damage: u32,
    /// Health actually removed; lower than `final_damage` on overkill or a
    /// lethal clamp.
    pub dealt: u32,
    pub victim_health: u32,
    pub lethal: bool,
}

impl DamageResult {
    pub(crate) fn from_info(info: &DamageInfo) -> Self {
        Self {
            outcome: info.outcome,
            hit_info: info.hit_info,
            raw: info.raw,
            mitigated: info.mitigated,
            blocked: info.blocked,
            resisted: info.resisted,
            absorbed: info.absorbed,
            redirected: info.redirected,
            final_damage: info.final_damage(),
            dealt: 0,
            victim_health: 0,
            lethal: false,
        }
    }

    /// Result for an attack that never reached the pipeline.
    pub fn avoided(outcome: HitOutcome, victim_health: u32) -> Self {
        Self {
            outcome,
            victim_health,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealInfo {
    pub healer: Option<UnitId>,
    pub target: UnitId,
    pub spell: Option<SpellId>,
    pub amount: u32,
    pub periodic: bool,
    pub crit: bool,
}

impl HealInfo {
    pub fn new(healer: Option<UnitId>, target: UnitId, amount: u32) -> Self {
        Self {
            healer,
            target,
            spell: None,
            amount,
            periodic: false,
            crit: false,
        }
    }

    pub fn with_spell(mut self, spell: SpellId) -> Self {
        self.spell = Some(spell);
        self
    }

    pub fn periodic(mut self) -> Self {
        self.periodic = true;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealResult {
    pub requested: u32,
    pub absorbed: u32,
    /// Health actually gained.
    pub effective: u32,
    pub overheal: u32,
    pub crit: bool,
    pub target_health: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_never_take_more_than_remaining() {
        let mut info = DamageInfo::new(
            Some(UnitId(1)),
            UnitId(2),
            SchoolMask::PHYSICAL,
            DamageKind::Auto(AttackType::MainHand),
            100,
        );
        assert_eq!(info.mitigate(30), 30);
        assert_eq!(info.block(50), 50);
        assert_eq!(info.resist(0), 0);
        assert_eq!(info.absorb(500), 20);
        info.finish_absorb();
        assert_eq!(info.redirect(10), 0);
        assert_eq!(info.finish(), 0);
        assert!(info.is_conserved());
        assert!(info.hit_info.contains(HitInfo::FULL_ABSORB));
    }

    #[test]
    fn full_block_marks_hit_info() {
        let mut info = DamageInfo::new(None, UnitId(2), SchoolMask::PHYSICAL, DamageKind::Direct, 20)
            .with_outcome(HitOutcome::Block);
        info.block(40);
        assert!(info.hit_info.contains(HitInfo::FULL_BLOCK));
        assert_eq!(info.final_damage(), 0);
    }
}
