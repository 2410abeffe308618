//! Aura application: creation, refresh and stacking, single-target and
//! exclusive-group eviction.

use arrayvec::ArrayVec;

use crate::config::CombatConfig;
use crate::env::{CombatEnv, SpellAttributes, SpellLink, SpellTemplate};
use crate::error::invariant_violated;
use crate::modifier::{AuraView, ModifierFilter};
use crate::state::{ItemId, Millis, SpellId, UnitId};
use crate::world::{CombatEvent, World};

use super::{
    Application, Aura, AuraError, AuraHandle, AuraRemoveMode, AuraType, Mechanic, SingleTargetLink,
    SpellModOp, StackingPolicy,
};

/// Optional knobs for [`World::apply_aura`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyParams {
    /// Restricts which declared sub-effects are applied; `None` applies all.
    pub effect_mask: Option<u8>,
    /// Initial stacks, or stacks added by a stacking refresh; zero means one.
    pub stacks: u8,
    pub cast_item: Option<ItemId>,
    /// Overrides the template duration before duration modifiers.
    pub duration: Option<Millis>,
}

impl ApplyParams {
    pub fn with_effect_mask(mut self, mask: u8) -> Self {
        self.effect_mask = Some(mask);
        self
    }

    pub fn with_stacks(mut self, stacks: u8) -> Self {
        self.stacks = stacks;
        self
    }

    pub fn with_cast_item(mut self, item: ItemId) -> Self {
        self.cast_item = Some(item);
        self
    }

    pub fn with_duration(mut self, duration: Millis) -> Self {
        self.duration = Some(duration);
        self
    }

    fn stacks_or_one(&self) -> u8 {
        self.stacks.max(1)
    }
}

impl World {
    /// Applies the aura of `spell` from `caster` onto `target`.
    ///
    /// Re-applying an aura the target already holds refreshes it according
    /// to the template's stacking policy and returns the existing handle.
    ///
    /// # Errors
    ///
    /// - `UnknownUnit` / `Oracle` for bad ids
    /// - `EntityNotEligible` if the target is dead (unless the aura persists
    ///   through death) or has left the world
    /// - `Immune` if immunities strip every effect
    /// - `NoAuraEffects` if the template declares none
    pub fn apply_aura(
        &mut self,
        env: &CombatEnv<'_>,
        caster: UnitId,
        target: UnitId,
        spell: SpellId,
        params: ApplyParams,
    ) -> Result<AuraHandle, AuraError> {
        let template = env.template(spell)?;
        if !self.units.contains_key(&caster) {
            return Err(AuraError::UnknownUnit(caster));
        }
        let target_unit = self
            .units
            .get(&target)
            .ok_or(AuraError::UnknownUnit(target))?;
        let persistent = template.has_attribute(SpellAttributes::DEATH_PERSISTENT);
        if !target_unit.in_world || (!target_unit.is_alive() && !persistent) {
            return Err(AuraError::EntityNotEligible(target));
        }

        let declared = template.aura_effect_mask();
        if declared == 0 {
            return Err(AuraError::NoAuraEffects(spell));
        }
        let requested = declared & params.effect_mask.unwrap_or(u8::MAX);
        if requested == 0 {
            return Err(AuraError::NoAuraEffects(spell));
        }
        let mask = self.strip_immune_effects(target, template, requested);
        if mask == 0 {
            return Err(AuraError::Immune { target, spell });
        }

        if let Some(existing) = self.find_refreshable(target, template, caster, params.cast_item) {
            self.refresh_aura(existing, template, target, params);
            return Ok(existing);
        }

        self.evict_exclusive(env, target, template);
        let legacy_stacks = self.evict_single_target(env, caster, target, template);

        let duration = params
            .duration
            .or(template.duration)
            .map(|base| self.modified_duration(caster, template, base));
        let mut aura = Aura::from_template(template, caster, target, params.cast_item, duration, mask);
        aura.set_stacks(params.stacks_or_one().max(legacy_stacks));
        let stacks = aura.stacks();
        let handle = self.auras.insert(aura);

        if let Some(unit) = self.units.get_mut(&target) {
            unit.auras.add_owned(handle);
        }
        self.attach(env, handle, target, mask);

        if template.has_attribute(SpellAttributes::SINGLE_TARGET)
            && let Some(caster_unit) = self.units.get_mut(&caster)
        {
            caster_unit.auras.link_single_target(SingleTargetLink {
                handle,
                spell,
                exclusive_group: template.exclusive_group,
                target,
            });
        }

        tracing::debug!(%spell, %caster, %target, stacks, "aura applied");
        self.emit(CombatEvent::AuraApplied {
            target,
            caster,
            spell,
            handle,
            stacks,
        });

        for link in &template.links {
            if let SpellLink::CastOnApply(linked) = *link {
                self.cast_triggered(env, caster, target, linked);
            }
        }
        Ok(handle)
    }

    /// Applies an existing aura to one more target (area auras).
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle`, `UnknownUnit` or `EntityNotEligible`.
    pub fn extend_aura(
        &mut self,
        env: &CombatEnv<'_>,
        handle: AuraHandle,
        target: UnitId,
    ) -> Result<(), AuraError> {
        let aura = self
            .auras
            .get(handle)
            .filter(|aura| !aura.is_removed())
            .ok_or(AuraError::StaleHandle(handle))?;
        let mask = aura.effect_mask();
        let persistent = aura.is_death_persistent();
        let unit = self
            .units
            .get(&target)
            .ok_or(AuraError::UnknownUnit(target))?;
        if !unit.in_world || (!unit.is_alive() && !persistent) {
            return Err(AuraError::EntityNotEligible(target));
        }
        self.attach(env, handle, target, mask);
        Ok(())
    }

    /// Adds `delta` stacks to a live aura; dropping to zero removes it with
    /// `AuraRemoveMode::Stack`. Returns the new stack count.
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` if the aura is gone or being removed.
    pub fn modify_aura_stacks(
        &mut self,
        env: &CombatEnv<'_>,
        handle: AuraHandle,
        delta: i16,
    ) -> Result<u8, AuraError> {
        let aura = self
            .auras
            .get_mut(handle)
            .filter(|aura| !aura.is_removed())
            .ok_or(AuraError::StaleHandle(handle))?;
        let wanted = i16::from(aura.stacks()) + delta;
        if wanted <= 0 {
            self.release_aura(env, handle, AuraRemoveMode::Stack);
            return Ok(0);
        }
        let stacks = aura.set_stacks(wanted.min(i16::from(u8::MAX)) as u8);
        let spell = aura.spell();
        let targets = aura.targets.clone();
        for unit in targets {
            self.recalc_max_health(unit);
        }
        tracing::debug!(%spell, stacks, "aura stacks changed");
        Ok(stacks)
    }

    /// Creates the application of `handle` on `target` and runs apply hooks.
    fn attach(&mut self, env: &CombatEnv<'_>, handle: AuraHandle, target: UnitId, mask: u8) {
        let seq = self.next_seq();
        let Some(aura) = self.auras.get_mut(handle) else {
            return;
        };
        let Some(unit) = self.units.get_mut(&target) else {
            return;
        };
        let application = Application {
            handle,
            effect_mask: mask,
            removing: None,
            seq,
        };
        if !unit.auras.register(application, aura) {
            invariant_violated("aura applied twice to the same target");
            return;
        }
        if !aura.targets.contains(&target) {
            aura.targets.push(target);
        }

        let hooks: ArrayVec<(u8, AuraType), { CombatConfig::MAX_EFFECTS }> = aura
            .effects()
            .iter()
            .filter(|effect| application.has_effect(effect.index()))
            .map(|effect| (effect.index(), effect.aura_type()))
            .collect();
        for (index, aura_type) in hooks {
            self.on_effect_applied(env, target, handle, index, aura_type);
        }
    }

    /// Clears effect bits the target is immune to.
    fn strip_immune_effects(&self, target: UnitId, template: &SpellTemplate, mask: u8) -> u8 {
        let Some(view) = self.view(target) else {
            return 0;
        };
        let bypass = template.is_positive()
            || template.has_attribute(SpellAttributes::UNAFFECTED_BY_IMMUNITY);
        if !bypass
            && view.has_matching(
                AuraType::SchoolImmunity,
                &ModifierFilter::school(template.school),
            )
        {
            return 0;
        }

        let mut mask = mask;
        for (index, effect) in template.effects.iter().enumerate() {
            let mechanic = if effect.mechanic == Mechanic::None {
                template.mechanic
            } else {
                effect.mechanic
            };
            if mechanic != Mechanic::None
                && !bypass
                && view.has_aura_with_misc(AuraType::MechanicImmunity, mechanic.as_misc())
            {
                mask &= !(1 << index);
            }
        }
        mask
    }

    fn find_refreshable(
        &self,
        target: UnitId,
        template: &SpellTemplate,
        caster: UnitId,
        cast_item: Option<ItemId>,
    ) -> Option<AuraHandle> {
        if template.stacking == StackingPolicy::IndependentInstances {
            return None;
        }
        let per_caster = template.has_attribute(SpellAttributes::MULTI_INSTANCE);
        let unit = self.units.get(&target)?;
        unit.auras
            .handles_by_spell(template.id)
            .iter()
            .copied()
            .find(|handle| {
                unit.auras.is_applied(*handle)
                    && self.auras.get(*handle).is_some_and(|aura| {
                        aura.owner() == target
                            && aura.cast_item() == cast_item
                            && (!per_caster || aura.caster() == caster)
                    })
            })
    }

    fn refresh_aura(
        &mut self,
        handle: AuraHandle,
        template: &SpellTemplate,
        target: UnitId,
        params: ApplyParams,
    ) {
        let caster = self.auras.get(handle).map(Aura::caster);
        let duration = params
            .duration
            .or(template.duration)
            .map(|base| match caster {
                Some(caster) => self.modified_duration(caster, template, base),
                None => base,
            });
        let Some(aura) = self.auras.get_mut(handle) else {
            return;
        };
        let added = params.stacks_or_one();
        match template.stacking {
            StackingPolicy::ReplaceDuration => {
                aura.set_duration(duration);
                aura.reset_shields();
            }
            StackingPolicy::AddDuration => {
                aura.set_stacks(aura.stacks().saturating_add(added));
                if let Some(by) = duration {
                    aura.extend(by);
                }
                aura.reset_shields();
            }
            StackingPolicy::StackThenReplace if aura.stacks() < aura.max_stack() => {
                aura.set_stacks(aura.stacks().saturating_add(added));
                aura.set_duration(duration);
                aura.reset_shields();
            }
            StackingPolicy::StackThenReplace => aura.replace(added, duration),
            StackingPolicy::IndependentInstances => {}
        }
        let stacks = aura.stacks();
        let spell = aura.spell();
        let caster = aura.caster();
        let targets = aura.targets.clone();

        for unit in targets {
            self.recalc_max_health(unit);
        }
        tracing::debug!(%spell, %target, stacks, "aura refreshed");
        self.emit(CombatEvent::AuraApplied {
            target,
            caster,
            spell,
            handle,
            stacks,
        });
    }

    /// Removes auras of the same exclusive group from the target.
    fn evict_exclusive(&mut self, env: &CombatEnv<'_>, target: UnitId, template: &SpellTemplate) {
        let group = template.exclusive_group;
        if group == 0 {
            return;
        }
        let Some(unit) = self.units.get(&target) else {
            return;
        };
        let evicted: Vec<AuraHandle> = unit
            .auras
            .applications()
            .iter()
            .filter(|app| !app.is_removing())
            .filter(|app| {
                self.auras.get(app.handle).is_some_and(|aura| {
                    aura.spell() != template.id
                        && env
                            .template(aura.spell())
                            .is_ok_and(|other| other.exclusive_group == group)
                })
            })
            .map(|app| app.handle)
            .collect();
        for handle in evicted {
            self.remove_application(env, target, handle, AuraRemoveMode::Replaced);
        }
    }

    /// Drops the caster's single-target aura of this spell (or group) from
    /// other targets. Returns the stack count to carry over.
    fn evict_single_target(
        &mut self,
        env: &CombatEnv<'_>,
        caster: UnitId,
        target: UnitId,
        template: &SpellTemplate,
    ) -> u8 {
        if !template.has_attribute(SpellAttributes::SINGLE_TARGET) {
            return 0;
        }
        let Some(unit) = self.units.get(&caster) else {
            return 0;
        };
        let group = template.exclusive_group;
        let evicted: Vec<AuraHandle> = unit
            .auras
            .single_target_links()
            .iter()
            .filter(|link| link.target != target)
            .filter(|link| link.spell == template.id || (group != 0 && link.exclusive_group == group))
            .map(|link| link.handle)
            .collect();

        let transfer = template.has_attribute(SpellAttributes::TRANSFER_STACKS);
        let mut legacy = 0;
        for handle in evicted {
            if transfer && let Some(aura) = self.auras.get(handle) {
                legacy = legacy.max(aura.stacks());
            }
            self.release_aura(env, handle, AuraRemoveMode::Replaced);
        }
        legacy
    }

    /// Template duration adjusted by the caster's duration spell modifiers.
    fn modified_duration(&self, caster: UnitId, template: &SpellTemplate, base: Millis) -> Millis {
        let Some(view) = self.view(caster) else {
            return base;
        };
        duration_with_mods(&view, template, base)
    }
}

fn duration_with_mods(view: &AuraView<'_>, template: &SpellTemplate, base: Millis) -> Millis {
    let filter =
        ModifierFilter::misc(SpellModOp::Duration.as_misc()).with_family(template.family_flags);
    let flat = view.total_modifier(AuraType::AddFlatModifier, &filter);
    let pct = view.total_modifier(AuraType::AddPctModifier, &filter);
    let with_flat = (base.0 as i64 + i64::from(flat)).max(0) as u64;
    Millis(with_flat).scale_pct(100 + i64::from(pct))
}
