use crate::combat::{DamageKind, SchoolMask};
use crate::env::DamageClass;
use crate::state::{AttackType, SpellId, UnitId};

use super::{ProcFlags, ProcHitMask};

/// One combat event as seen by the proc dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcEvent {
    pub actor: Option<UnitId>,
    pub victim: UnitId,
    /// Categories raised on the actor's auras.
    pub actor_flags: ProcFlags,
    /// Categories raised on the victim's auras.
    pub victim_flags: ProcFlags,
    pub hit_mask: ProcHitMask,
    pub school: SchoolMask,
    pub spell: Option<SpellId>,
    /// Weapon used, for procs-per-minute normalization.
    pub attack_type: Option<AttackType>,
    pub amount: u32,
}

impl ProcEvent {
    pub fn new(actor: Option<UnitId>, victim: UnitId) -> Self {
        Self {
            actor,
            victim,
            actor_flags: ProcFlags::empty(),
            victim_flags: ProcFlags::empty(),
            hit_mask: ProcHitMask::empty(),
            school: SchoolMask::empty(),
            spell: None,
            attack_type: None,
            amount: 0,
        }
    }

    pub fn with_flags(mut self, actor_flags: ProcFlags, victim_flags: ProcFlags) -> Self {
        self.actor_flags |= actor_flags;
        self.victim_flags |= victim_flags;
        self
    }

    pub fn with_hit_mask(mut self, hit_mask: ProcHitMask) -> Self {
        self.hit_mask = hit_mask;
        self
    }

    pub fn with_school(mut self, school: SchoolMask) -> Self {
        self.school = school;
        self
    }

    pub fn with_spell(mut self, spell: Option<SpellId>) -> Self {
        self.spell = spell;
        self
    }

    pub fn with_attack_type(mut self, attack_type: AttackType) -> Self {
        self.attack_type = Some(attack_type);
        self
    }

    pub fn with_amount(mut self, amount: u32) -> Self {
        self.amount = amount;
        self
    }

    /// Actor and victim categories for a hostile resolution.
    pub fn damage_flags(kind: DamageKind, class: DamageClass) -> (ProcFlags, ProcFlags) {
        match kind {
            DamageKind::Auto(AttackType::Ranged) => {
                (ProcFlags::DONE_RANGED_AUTO, ProcFlags::TAKEN_RANGED_AUTO)
            }
            DamageKind::Auto(_) => (ProcFlags::DONE_MELEE_AUTO, ProcFlags::TAKEN_MELEE_AUTO),
            DamageKind::Periodic => (ProcFlags::DONE_PERIODIC, ProcFlags::TAKEN_PERIODIC),
            DamageKind::Direct | DamageKind::Channel => match class {
                DamageClass::Melee => (ProcFlags::DONE_MELEE_SPELL, ProcFlags::TAKEN_MELEE_SPELL),
                DamageClass::Ranged => (ProcFlags::DONE_RANGED_AUTO, ProcFlags::TAKEN_RANGED_AUTO),
                DamageClass::Magic | DamageClass::None => (
                    ProcFlags::DONE_SPELL_MAGIC_NEG,
                    ProcFlags::TAKEN_SPELL_MAGIC_NEG,
                ),
            },
        }
    }

    /// Actor and victim categories for a heal.
    pub fn heal_flags(periodic: bool) -> (ProcFlags, ProcFlags) {
        if periodic {
            (ProcFlags::DONE_PERIODIC, ProcFlags::TAKEN_PERIODIC)
        } else {
            (
                ProcFlags::DONE_SPELL_MAGIC_POS,
                ProcFlags::TAKEN_SPELL_MAGIC_POS,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_attacks_map_to_weapon_categories() {
        let (done, taken) = ProcEvent::damage_flags(DamageKind::Auto(AttackType::OffHand), DamageClass::Melee);
        assert_eq!(done, ProcFlags::DONE_MELEE_AUTO);
        assert_eq!(taken, ProcFlags::TAKEN_MELEE_AUTO);

        let (done, _) = ProcEvent::damage_flags(DamageKind::Direct, DamageClass::Magic);
        assert_eq!(done, ProcFlags::DONE_SPELL_MAGIC_NEG);
    }
}
