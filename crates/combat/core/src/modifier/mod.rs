//! Modifier aggregation over a unit's active aura effects.
//!
//! Every numeric question the pipeline asks ("how much extra fire damage
//! does this unit take", "what is its dodge bonus") is answered here by
//! folding the effects of one [`AuraType`] that pass a [`ModifierFilter`].
//!
//! # Stacking groups
//!
//! Effects with a non-zero stacking group do not accumulate with each other:
//! within one group only the contributor with the largest magnitude counts.
//! Groups are resolved before the fold, using a fixed-capacity scratch list
//! on the stack so aggregation never allocates.
//!
//! Aggregation is pure: it reads the arena and the store and never changes
//! either. Applications that are being removed are already gone from the
//! per-type index and so never contribute.

mod pct;

pub use pct::PctChain;

use arrayvec::ArrayVec;

use crate::aura::{AuraArena, AuraEffect, AuraStore, AuraType, Mechanic};
use crate::combat::SchoolMask;
use crate::config::CombatConfig;

/// Read-only view of one unit's auras.
#[derive(Clone, Copy)]
pub struct AuraView<'a> {
    arena: &'a AuraArena,
    store: &'a AuraStore,
}

/// Narrows which effects of an aura type contribute.
///
/// Unset fields match everything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModifierFilter {
    /// Effect `misc_value` read as a school mask must intersect this.
    pub school: Option<SchoolMask>,
    /// Effect `misc_value` must equal this.
    pub misc: Option<i32>,
    pub mechanic: Option<Mechanic>,
    /// Effect affect mask must intersect these spell family bits.
    pub family: Option<u64>,
}

impl ModifierFilter {
    pub const ANY: Self = Self {
        school: None,
        misc: None,
        mechanic: None,
        family: None,
    };

    pub const fn school(school: SchoolMask) -> Self {
        Self {
            school: Some(school),
            ..Self::ANY
        }
    }

    pub const fn misc(misc: i32) -> Self {
        Self {
            misc: Some(misc),
            ..Self::ANY
        }
    }

    pub const fn mechanic(mechanic: Mechanic) -> Self {
        Self {
            mechanic: Some(mechanic),
            ..Self::ANY
        }
    }

    pub const fn with_family(mut self, family: u64) -> Self {
        self.family = Some(family);
        self
    }

    pub const fn with_misc(mut self, misc: i32) -> Self {
        self.misc = Some(misc);
        self
    }

    pub fn matches(&self, effect: &AuraEffect) -> bool {
        if let Some(school) = self.school
            && !effect.misc_school().intersects(school)
        {
            return false;
        }
        if let Some(misc) = self.misc
            && effect.misc_value() != misc
        {
            return false;
        }
        if let Some(mechanic) = self.mechanic
            && effect.mechanic() != mechanic
        {
            return false;
        }
        if let Some(family) = self.family
            && effect.affect_mask() & family == 0
        {
            return false;
        }
        true
    }
}

impl<'a> AuraView<'a> {
    pub fn new(arena: &'a AuraArena, store: &'a AuraStore) -> Self {
        Self { arena, store }
    }

    /// Visits every contributing amount once, with stacking groups resolved.
    fn fold<T>(
        &self,
        aura_type: AuraType,
        filter: &ModifierFilter,
        init: T,
        mut f: impl FnMut(T, i32) -> T,
    ) -> T {
        let mut groups: ArrayVec<(u8, i32), { CombatConfig::MAX_STACKING_GROUPS }> =
            ArrayVec::new();
        let mut acc = init;

        for effect in self.effects(aura_type) {
            if !filter.matches(effect) {
                continue;
            }
            let amount = effect.amount();
            let group = effect.stacking_group();
            if group == 0 {
                acc = f(acc, amount);
                continue;
            }
            match groups.iter_mut().find(|(id, _)| *id == group) {
                Some((_, best)) => {
                    if amount.unsigned_abs() > best.unsigned_abs() {
                        *best = amount;
                    }
                }
                None => {
                    if groups.try_push((group, amount)).is_err() {
                        tracing::warn!(group, "stacking group scratch full; counting effect alone");
                        acc = f(acc, amount);
                    }
                }
            }
        }

        for (_, amount) in groups {
            acc = f(acc, amount);
        }
        acc
    }

    /// Live, applied effects of one aura type in application order.
    pub fn effects(&self, aura_type: AuraType) -> impl Iterator<Item = &'a AuraEffect> + 'a {
        let arena = self.arena;
        let store = self.store;
        store
            .effects_of_type(aura_type)
            .iter()
            .filter_map(move |effect_ref| {
                let application = store.application(effect_ref.handle)?;
                if application.is_removing() || !application.has_effect(effect_ref.effect) {
                    return None;
                }
                arena.get(effect_ref.handle)?.effect(effect_ref.effect)
            })
    }

    /// Additive sum.
    pub fn total_modifier(&self, aura_type: AuraType, filter: &ModifierFilter) -> i32 {
        self.fold(aura_type, filter, 0i32, |acc, amount| acc.saturating_add(amount))
    }

    /// Product of `(100 + amount)%` over all contributors.
    pub fn total_multiplier(&self, aura_type: AuraType, filter: &ModifierFilter) -> PctChain {
        self.fold(aura_type, filter, PctChain::ONE, PctChain::then_pct)
    }

    /// Largest positive contributor, or 0.
    pub fn max_positive(&self, aura_type: AuraType, filter: &ModifierFilter) -> i32 {
        self.fold(aura_type, filter, 0i32, |acc, amount| acc.max(amount))
    }

    /// Most negative contributor, or 0.
    pub fn min_negative(&self, aura_type: AuraType, filter: &ModifierFilter) -> i32 {
        self.fold(aura_type, filter, 0i32, |acc, amount| acc.min(amount))
    }

    pub fn has_aura_type(&self, aura_type: AuraType) -> bool {
        self.effects(aura_type).next().is_some()
    }

    pub fn has_aura_with_misc(&self, aura_type: AuraType, misc: i32) -> bool {
        self.effects(aura_type)
            .any(|effect| effect.misc_value() == misc)
    }

    pub fn has_matching(&self, aura_type: AuraType, filter: &ModifierFilter) -> bool {
        self.effects(aura_type).any(|effect| filter.matches(effect))
    }
}
