//! Per-unit aura bookkeeping.
//!
//! # Architecture
//!
//! The store keeps the authoritative list of [`Application`]s on its unit in
//! application order, plus derived indices:
//!
//! - by spell id, for refresh and selector lookups
//! - by aura type, one list per [`AuraType`], read by the modifier aggregator
//! - by interrupt flag, for damage/movement/cast breaks
//! - the proc registry, every aura that reacts to combat events
//!
//! Indices are updated when an application is registered and dropped as the
//! first step of its removal, so nothing can observe a half-removed aura
//! through them. The application itself stays in the list, flagged as
//! removing, until its teardown hooks have run.

use std::collections::BTreeMap;

use strum::EnumCount;

use crate::procs::ProcFlags;
use crate::state::{Millis, SpellId, UnitId};

use super::{
    Application, Aura, AuraHandle, AuraInterruptFlags, AuraRemoveMode, AuraType, can_trigger_procs,
};

/// One applied sub-effect, as stored in the per-type index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectRef {
    pub handle: AuraHandle,
    pub effect: u8,
}

/// Caster-side weak link to a single-target aura it maintains elsewhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SingleTargetLink {
    pub handle: AuraHandle,
    pub spell: SpellId,
    pub exclusive_group: u32,
    pub target: UnitId,
}

#[derive(Clone, Debug)]
pub struct AuraStore {
    applications: Vec<Application>,
    by_spell: BTreeMap<SpellId, Vec<AuraHandle>>,
    by_type: [Vec<EffectRef>; AuraType::COUNT],
    interruptible: Vec<(AuraHandle, AuraInterruptFlags)>,
    procs: Vec<(AuraHandle, ProcFlags)>,
    /// Auras held (owned) by this unit.
    owned: Vec<AuraHandle>,
    /// Single-target auras this unit cast on others.
    single_target: Vec<SingleTargetLink>,
    /// Proc cooldowns keyed by (aura caster, spell).
    proc_cooldowns: BTreeMap<(UnitId, SpellId), Millis>,
}

impl Default for AuraStore {
    fn default() -> Self {
        Self {
            applications: Vec::new(),
            by_spell: BTreeMap::new(),
            by_type: std::array::from_fn(|_| Vec::new()),
            interruptible: Vec::new(),
            procs: Vec::new(),
            owned: Vec::new(),
            single_target: Vec::new(),
            proc_cooldowns: BTreeMap::new(),
        }
    }
}

impl AuraStore {
    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn application(&self, handle: AuraHandle) -> Option<&Application> {
        self.applications.iter().find(|app| app.handle == handle)
    }

    pub(crate) fn application_mut(&mut self, handle: AuraHandle) -> Option<&mut Application> {
        self.applications.iter_mut().find(|app| app.handle == handle)
    }

    /// Whether a live (not removing) application of `handle` exists.
    pub fn is_applied(&self, handle: AuraHandle) -> bool {
        self.application(handle).is_some_and(|app| !app.is_removing())
    }

    /// No applications and no held auras remain.
    pub fn is_empty(&self) -> bool {
        self.applications.is_empty() && self.owned.is_empty()
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn handles_by_spell(&self, spell: SpellId) -> &[AuraHandle] {
        self.by_spell.get(&spell).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn effects_of_type(&self, aura_type: AuraType) -> &[EffectRef] {
        &self.by_type[aura_type.index()]
    }

    pub fn interruptible(&self) -> &[(AuraHandle, AuraInterruptFlags)] {
        &self.interruptible
    }

    pub fn proc_registry(&self) -> &[(AuraHandle, ProcFlags)] {
        &self.procs
    }

    pub fn owned(&self) -> &[AuraHandle] {
        &self.owned
    }

    pub fn single_target_links(&self) -> &[SingleTargetLink] {
        &self.single_target
    }

    /// Whether any index still refers to `handle`.
    pub fn is_indexed(&self, handle: AuraHandle) -> bool {
        self.by_spell.values().any(|handles| handles.contains(&handle))
            || self
                .by_type
                .iter()
                .any(|refs| refs.iter().any(|r| r.handle == handle))
            || self.interruptible.iter().any(|(h, _)| *h == handle)
            || self.procs.iter().any(|(h, _)| *h == handle)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Adds an application and indexes it.
    ///
    /// Returns `false` (and changes nothing) if the pair already exists.
    pub(crate) fn register(&mut self, application: Application, aura: &Aura) -> bool {
        if self.application(application.handle).is_some() {
            return false;
        }
        self.applications.push(application);
        self.index(application, aura);
        true
    }

    fn index(&mut self, application: Application, aura: &Aura) {
        let handle = application.handle;
        self.by_spell.entry(aura.spell()).or_default().push(handle);

        let mut reacts = false;
        for effect in aura.effects() {
            if !application.has_effect(effect.index()) {
                continue;
            }
            self.by_type[effect.aura_type().index()].push(EffectRef {
                handle,
                effect: effect.index(),
            });
            reacts |= can_trigger_procs(effect.aura_type());
        }

        if !aura.interrupt_flags().is_empty() {
            self.interruptible.push((handle, aura.interrupt_flags()));
        }
        if reacts && !aura.proc_flags().is_empty() {
            self.procs.push((handle, aura.proc_flags()));
        }
    }

    /// First removal stage: flag the application and drop it from every index.
    ///
    /// Returns `false` if the application is missing or already removing.
    pub(crate) fn begin_removal(&mut self, handle: AuraHandle, mode: AuraRemoveMode) -> bool {
        let Some(application) = self.application_mut(handle) else {
            return false;
        };
        if application.removing.is_some() {
            return false;
        }
        application.removing = Some(mode);
        self.unindex(handle);
        true
    }

    fn unindex(&mut self, handle: AuraHandle) {
        self.by_spell.retain(|_, handles| {
            handles.retain(|h| *h != handle);
            !handles.is_empty()
        });
        for refs in &mut self.by_type {
            refs.retain(|r| r.handle != handle);
        }
        self.interruptible.retain(|(h, _)| *h != handle);
        self.procs.retain(|(h, _)| *h != handle);
    }

    /// Final removal stage: drop the application itself.
    pub(crate) fn detach(&mut self, handle: AuraHandle) -> Option<Application> {
        let position = self.applications.iter().position(|app| app.handle == handle)?;
        Some(self.applications.remove(position))
    }

    // ========================================================================
    // Ownership and caster links
    // ========================================================================

    pub(crate) fn add_owned(&mut self, handle: AuraHandle) {
        if !self.owned.contains(&handle) {
            self.owned.push(handle);
        }
    }

    pub(crate) fn remove_owned(&mut self, handle: AuraHandle) {
        self.owned.retain(|h| *h != handle);
    }

    pub(crate) fn link_single_target(&mut self, link: SingleTargetLink) {
        self.single_target.retain(|existing| existing.handle != link.handle);
        self.single_target.push(link);
    }

    pub(crate) fn unlink_single_target(&mut self, handle: AuraHandle) {
        self.single_target.retain(|link| link.handle != handle);
    }

    // ========================================================================
    // Proc cooldowns
    // ========================================================================

    pub fn proc_ready(&self, caster: UnitId, spell: SpellId, now: Millis) -> bool {
        self.proc_cooldowns
            .get(&(caster, spell))
            .is_none_or(|until| *until <= now)
    }

    pub(crate) fn set_proc_cooldown(&mut self, caster: UnitId, spell: SpellId, until: Millis) {
        self.proc_cooldowns.insert((caster, spell), until);
    }

    pub(crate) fn prune_cooldowns(&mut self, now: Millis) {
        self.proc_cooldowns.retain(|_, until| *until > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aura::AuraArena;
    use crate::env::{EffectTemplate, ProcTemplate, SpellTemplate};

    fn shield_template() -> SpellTemplate {
        SpellTemplate::new(SpellId(10), "Power Word: Shield")
            .with_aura_interrupt(AuraInterruptFlags::TAKE_DAMAGE)
            .with_proc(ProcTemplate::new(ProcFlags::TAKEN_DAMAGE, 100))
            .with_effect(EffectTemplate::aura(AuraType::SchoolAbsorb, 100))
    }

    #[test]
    fn removal_drops_every_index_before_detach() {
        let template = shield_template();
        let mut arena = AuraArena::new();
        let aura = Aura::from_template(&template, UnitId(1), UnitId(1), None, None, 0b1);
        let handle = arena.insert(aura);

        let mut store = AuraStore::default();
        let application = Application {
            handle,
            effect_mask: 0b1,
            removing: None,
            seq: 1,
        };
        let aura = arena.get(handle).expect("aura");
        assert!(store.register(application, aura));
        assert!(!store.register(application, aura));
        assert!(store.is_indexed(handle));
        assert_eq!(store.proc_registry().len(), 1);

        assert!(store.begin_removal(handle, AuraRemoveMode::Depleted));
        assert!(!store.begin_removal(handle, AuraRemoveMode::Default));
        assert!(!store.is_indexed(handle));
        assert!(!store.is_applied(handle));

        assert!(store.detach(handle).is_some());
        assert!(store.applications().is_empty());
    }

    #[test]
    fn proc_cooldown_expires() {
        let mut store = AuraStore::default();
        store.set_proc_cooldown(UnitId(1), SpellId(5), Millis(6000));
        assert!(!store.proc_ready(UnitId(1), SpellId(5), Millis(5999)));
        assert!(store.proc_ready(UnitId(1), SpellId(5), Millis(6000)));
        assert!(store.proc_ready(UnitId(2), SpellId(5), Millis(0)));
    }
}
