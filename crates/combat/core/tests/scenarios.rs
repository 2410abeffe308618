//! Scripted fights checked event by event.

mod common;

use combat_core::{
    ApplyParams, AttackType, AuraError, AuraRemoveMode, AuraSelector, AuraType,
    CastInterruptFlags, CastSlot, CombatConfig, CombatEvent, CombatStats, CombatTables,
    ControlFlags, DamageClass, DamageInfo, DamageKind, DeathState, EffectTemplate, HealInfo,
    HitInfo, HitOutcome, InterruptStrength, ItemId, Millis, PowerPools, PowerType, ProcFlags,
    ProcTemplate, SchoolMask, SpellAttributes, SpellId, SpellLink, SpellSchool, SpellTemplate,
    StackingPolicy, UnitFlags, UnitSpec, WeaponProfile, World,
};
use common::{FixedRng, Harness, count, creature, player};

const SHIELD: SpellId = SpellId(100);
const THORNS_PROC: SpellId = SpellId(200);
const SHADOW_DOT: SpellId = SpellId(300);
const SHADOW_BOLT: SpellId = SpellId(400);
const STUN: SpellId = SpellId(500);

fn shield() -> SpellTemplate {
    SpellTemplate::new(SHIELD, "Barrier")
        .with_attributes(SpellAttributes::POSITIVE)
        .with_effect(EffectTemplate::aura(AuraType::SchoolAbsorb, 100).with_school_misc(SchoolMask::ALL))
}

fn retaliation() -> SpellTemplate {
    SpellTemplate::new(THORNS_PROC, "Retaliation")
        .with_attributes(SpellAttributes::POSITIVE)
        .with_proc(
            ProcTemplate::new(ProcFlags::TAKEN_MELEE_AUTO, 100).with_cooldown(Millis::from_secs(6)),
        )
        .with_effect(EffectTemplate::aura(AuraType::ProcTriggerDamage, 5))
}

fn shadow_dot() -> SpellTemplate {
    SpellTemplate::new(SHADOW_DOT, "Corruption")
        .with_school(SchoolMask::SHADOW)
        .with_duration(Millis::from_secs(9))
        .with_effect(
            EffectTemplate::aura(AuraType::PeriodicDamage, 10).with_amplitude(Millis::from_secs(3)),
        )
}

fn shadow_bolt() -> SpellTemplate {
    SpellTemplate::new(SHADOW_BOLT, "Shadow Bolt")
        .with_school(SchoolMask::SHADOW)
        .with_cast_time(Millis(2000))
        .with_cast_interrupt(CastInterruptFlags::PUSHBACK)
        .with_effect(EffectTemplate::damage(40))
}

fn stun() -> SpellTemplate {
    SpellTemplate::new(STUN, "Hammer")
        .with_duration(Millis::from_secs(1))
        .with_effect(EffectTemplate::aura(AuraType::ModStun, 0))
}

fn harness() -> Harness {
    Harness::new([shield(), retaliation(), shadow_dot(), shadow_bolt(), stun()])
}

// ============================================================================
// Melee
// ============================================================================

/// Equal-level players, no armor, no avoidance: the weapon roll lands as is.
#[test]
fn plain_swing_deals_weapon_damage() {
    let harness = harness();
    let env = harness.env();
    let mut world = World::new(CombatConfig::default());
    let attacker = world.spawn(&player(10, 1000, 50));
    let victim = world.spawn(&player(10, 1000, 50));

    let result = world
        .melee_attack(&env, attacker, victim, AttackType::MainHand)
        .expect("swing");

    assert_eq!(result.outcome, HitOutcome::Normal);
    assert_eq!(result.final_damage, 50);
    assert_eq!(result.dealt, 50);
    assert_eq!(world.unit(victim).map(|unit| unit.health().current), Some(950));

    let events = world.drain_events();
    assert!(events.contains(&CombatEvent::DamageDealt {
        attacker,
        victim,
        amount: 50
    }));
    assert_eq!(count(&events, |e| matches!(e, CombatEvent::CombatEntered { .. })), 2);
    // fights between players are tracked by the combat timer only
    assert_eq!(count(&events, |e| matches!(e, CombatEvent::ThreatNotified { .. })), 0);
}

#[test]
fn evading_victim_takes_nothing() {
    let harness = harness();
    let env = harness.env();
    let mut world = World::default();
    let attacker = world.spawn(&player(10, 1000, 50));
    let victim = world.spawn(&creature(10, 1000, 50));
    world.set_evading(victim, true).expect("unit");

    let result = world
        .melee_attack(&env, attacker, victim, AttackType::MainHand)
        .expect("swing");

    assert_eq!(result.outcome, HitOutcome::Evade);
    assert_eq!(result.dealt, 0);
    assert_eq!(world.unit(victim).map(|unit| unit.health().current), Some(1000));
    assert!(!world.unit(victim).is_some_and(|unit| unit.is_in_combat()));
}

// ============================================================================
// Absorb
// ============================================================================

#[test]
fn shield_absorbs_until_depleted() {
    let harness = harness();
    let env = harness.env();
    let mut world = World::default();
    let attacker = world.spawn(&player(10, 1000, 50));
    let victim = world.spawn(&player(10, 1000, 50));
    let handle = world
        .apply_aura(&env, victim, victim, SHIELD, ApplyParams::default())
        .expect("shield");

    let hit = DamageInfo::new(Some(attacker), victim, SchoolMask::PHYSICAL, DamageKind::Direct, 80);
    let result = world.deal_damage(&env, hit);
    assert_eq!(result.absorbed, 80);
    assert_eq!(result.final_damage, 0);
    assert!(result.hit_info.contains(HitInfo::FULL_ABSORB));
    let left = world
        .aura(handle)
        .and_then(|aura| aura.effect(0))
        .map(|effect| effect.amount());
    assert_eq!(left, Some(20));

    let hit = DamageInfo::new(Some(attacker), victim, SchoolMask::FIRE, DamageKind::Direct, 30);
    let result = world.deal_damage(&env, hit);
    assert_eq!(result.absorbed, 20);
    assert_eq!(result.final_damage, 10);
    assert!(result.hit_info.contains(HitInfo::PARTIAL_ABSORB));
    assert!(world.aura(handle).is_none());

    let events = world.drain_events();
    assert!(events.iter().any(|event| matches!(
        event,
        CombatEvent::AuraRemoved { spell, mode: AuraRemoveMode::Depleted, .. } if *spell == SHIELD
    )));
    assert_eq!(world.unit(victim).map(|unit| unit.health().current), Some(990));
}

// ============================================================================
// Duels and death
// ============================================================================

#[test]
fn lethal_duel_damage_leaves_one_health() {
    let harness = harness();
    let env = harness.env();
    let mut world = World::default();
    let winner = world.spawn(&player(10, 1000, 50));
    let loser = world.spawn(&player(10, 40, 50));
    world.start_duel(winner, loser).expect("duel");

    let hit = DamageInfo::new(Some(winner), loser, SchoolMask::PHYSICAL, DamageKind::Direct, 100);
    let result = world.deal_damage(&env, hit);

    assert!(!result.lethal);
    assert_eq!(result.victim_health, 1);
    let unit = world.unit(loser).expect("loser");
    assert_eq!(unit.death_state(), DeathState::Alive);
    assert_eq!(unit.duel_opponent(), None);
    assert_eq!(world.unit(winner).and_then(|unit| unit.duel_opponent()), None);
    assert!(world
        .drain_events()
        .contains(&CombatEvent::DuelEnded { winner, loser }));
}

#[test]
fn creature_death_requests_loot_and_clears_references() {
    let harness = harness();
    let env = harness.env();
    let mut world = World::default();
    let hunter = world.spawn(&player(10, 1000, 50));
    let prey = world.spawn(&creature(10, 30, 5));

    world
        .melee_attack(&env, hunter, prey, AttackType::MainHand)
        .expect("swing");

    let unit = world.unit(prey).expect("prey stays until despawned");
    assert_eq!(unit.death_state(), DeathState::Dead);
    assert!(unit.session().hostile_refs().is_empty());
    assert!(!unit.is_in_combat());
    assert!(
        world
            .unit(hunter)
            .is_some_and(|unit| unit.session().hostile_refs().is_empty())
    );

    let events = world.drain_events();
    assert!(events.contains(&CombatEvent::Death {
        victim: prey,
        killer: Some(hunter)
    }));
    assert!(events.iter().any(|event| matches!(
        event,
        CombatEvent::LootFilled { source, looter, items }
            if *source == prey && *looter == hunter && items[0].item == ItemId(7)
    )));

    // the hunter stays in combat until its timer runs out
    assert!(world.unit(hunter).is_some_and(|unit| unit.is_in_combat()));
    world.update(&env, CombatConfig::DEFAULT_COMBAT_TIMEOUT);
    assert!(world.unit(hunter).is_some_and(|unit| !unit.is_in_combat()));
    assert!(
        world
            .drain_events()
            .contains(&CombatEvent::CombatLeft { unit: hunter })
    );
}

// ============================================================================
// Procs
// ============================================================================

#[test]
fn proc_respects_cooldown() {
    let harness = harness();
    let env = harness.env();
    let mut world = World::default();
    let attacker = world.spawn(&player(10, 1000, 50));
    let defender = world.spawn(&player(10, 1000, 50));
    world
        .apply_aura(&env, defender, defender, THORNS_PROC, ApplyParams::default())
        .expect("aura");

    world
        .melee_attack(&env, attacker, defender, AttackType::MainHand)
        .expect("swing");
    assert_eq!(world.unit(attacker).map(|unit| unit.health().current), Some(995));
    assert!(!world.proc_ready(defender, defender, THORNS_PROC));

    world
        .melee_attack(&env, attacker, defender, AttackType::MainHand)
        .expect("swing");
    assert_eq!(world.unit(attacker).map(|unit| unit.health().current), Some(995));

    world.update(&env, Millis(5999));
    assert!(!world.proc_ready(defender, defender, THORNS_PROC));
    world.update(&env, Millis(1));
    assert!(world.proc_ready(defender, defender, THORNS_PROC));

    world
        .melee_attack(&env, attacker, defender, AttackType::MainHand)
        .expect("swing");
    assert_eq!(world.unit(attacker).map(|unit| unit.health().current), Some(990));
}

// ============================================================================
// Periodic effects
// ============================================================================

#[test]
fn final_tick_lands_before_expiry() {
    let harness = harness();
    let env = harness.env();
    let mut world = World::default();
    let caster = world.spawn(&player(10, 1000, 50));
    let victim = world.spawn(&player(10, 1000, 50));
    let handle = world
        .apply_aura(&env, caster, victim, SHADOW_DOT, ApplyParams::default())
        .expect("dot");

    world.update(&env, Millis::from_secs(9));

    assert_eq!(world.unit(victim).map(|unit| unit.health().current), Some(970));
    assert!(world.aura(handle).is_none());
    let events = world.drain_events();
    assert_eq!(
        count(&events, |e| matches!(e, CombatEvent::DamageTaken { victim: v, .. } if *v == victim)),
        3
    );
    assert!(events.iter().any(|event| matches!(
        event,
        CombatEvent::AuraRemoved { mode: AuraRemoveMode::Expire, .. }
    )));
}

// ============================================================================
// Casting
// ============================================================================

#[test]
fn damage_pushes_back_a_cast() {
    let harness = harness();
    let env = harness.env();
    let mut world = World::default();
    let caster = world.spawn(&player(10, 1000, 50));
    let target = world.spawn(&player(10, 1000, 50));
    let other = world.spawn(&player(10, 1000, 50));

    let slot = world
        .start_cast(&env, caster, target, SHADOW_BOLT)
        .expect("cast");
    assert_eq!(slot, CastSlot::Generic);

    world.update(&env, Millis(1000));
    let hit = DamageInfo::new(Some(other), caster, SchoolMask::PHYSICAL, DamageKind::Direct, 10)
        .with_class(DamageClass::Melee);
    world.deal_damage(&env, hit);
    let remaining = world
        .unit(caster)
        .and_then(|unit| unit.casts().get(CastSlot::Generic))
        .map(|cast| cast.remaining());
    assert_eq!(remaining, Some(Millis(1500)));

    world.update(&env, Millis(1499));
    assert_eq!(world.unit(target).map(|unit| unit.health().current), Some(1000));
    world.update(&env, Millis(1));
    assert_eq!(world.unit(target).map(|unit| unit.health().current), Some(960));
    assert!(
        world
            .drain_events()
            .contains(&CombatEvent::CastFinished {
                caster,
                spell: SHADOW_BOLT,
                slot: CastSlot::Generic
            })
    );
}

#[test]
fn stun_interrupts_cast_and_wears_off() {
    let harness = harness();
    let env = harness.env();
    let mut world = World::default();
    let caster = world.spawn(&player(10, 1000, 50));
    let target = world.spawn(&player(10, 1000, 50));

    world
        .start_cast(&env, caster, target, SHADOW_BOLT)
        .expect("cast");
    world
        .apply_aura(&env, target, caster, STUN, ApplyParams::default())
        .expect("stun");

    let unit = world.unit(caster).expect("caster");
    assert!(unit.casts().get(CastSlot::Generic).is_none());
    assert!(unit.control().contains(ControlFlags::STUNNED));
    assert!(world.drain_events().contains(&CombatEvent::CastInterrupted {
        caster,
        spell: SHADOW_BOLT,
        slot: CastSlot::Generic
    }));

    world.update(&env, Millis::from_secs(1));
    let unit = world.unit(caster).expect("caster");
    assert!(unit.control().is_empty());
    assert_eq!(world.unit(target).map(|unit| unit.health().current), Some(1000));
}

// ============================================================================
// Healing and threat
// ============================================================================

#[test]
fn healing_a_fighter_pulls_the_healer_into_combat() {
    let harness = harness();
    let env = harness.env();
    let mut world = World::default();
    let brute = world.spawn(&creature(10, 1000, 100));
    let tank = world.spawn(&player(10, 1000, 50));
    let healer = world.spawn(&player(10, 1000, 50));

    world
        .melee_attack(&env, brute, tank, AttackType::MainHand)
        .expect("swing");
    world.drain_events();

    let result = world.heal(&env, HealInfo::new(Some(healer), tank, 150));
    assert_eq!(result.effective, 100);
    assert_eq!(result.overheal, 50);

    assert!(world.unit(healer).is_some_and(|unit| unit.is_in_combat()));
    let events = world.drain_events();
    assert!(events.contains(&CombatEvent::CombatEntered { unit: healer }));
    assert!(events.contains(&CombatEvent::ThreatNotified {
        holder: brute,
        target: healer,
        amount: 100
    }));
}

// ============================================================================
// Stacking and refresh
// ============================================================================

const FRENZY: SpellId = SpellId(600);

fn frenzy(stacking: StackingPolicy) -> SpellTemplate {
    SpellTemplate::new(FRENZY, "Frenzy")
        .with_attributes(SpellAttributes::POSITIVE)
        .with_duration(Millis::from_secs(10))
        .with_max_stack(3)
        .with_stacking(stacking)
        .with_effect(EffectTemplate::aura(AuraType::ModDamageDone, 5).with_school_misc(SchoolMask::ALL))
        .with_effect(EffectTemplate::aura(AuraType::SchoolAbsorb, 40).with_school_misc(SchoolMask::ALL))
}

/// Applies Frenzy `times` times, one second apart. Returns the stacks and
/// remaining time of the newest aura and how many auras the unit holds.
fn reapply(stacking: StackingPolicy, times: usize) -> (u8, Option<Millis>, usize) {
    let harness = Harness::new([frenzy(stacking)]);
    let env = harness.env();
    let mut world = World::default();
    let unit = world.spawn(&player(10, 1000, 50));

    let mut handle = None;
    for round in 0..times {
        if round > 0 {
            world.update(&env, Millis::from_secs(1));
        }
        handle = Some(
            world
                .apply_aura(&env, unit, unit, FRENZY, ApplyParams::default())
                .expect("frenzy"),
        );
    }
    let aura = handle.and_then(|handle| world.aura(handle)).expect("aura");
    let held = world.unit(unit).map_or(0, |unit| unit.auras().len());
    (aura.stacks(), aura.remaining(), held)
}

#[test]
fn stacking_policies_refresh_differently() {
    let full = Some(Millis::from_secs(10));
    assert_eq!(reapply(StackingPolicy::ReplaceDuration, 3), (1, full, 1));
    assert_eq!(reapply(StackingPolicy::StackThenReplace, 3), (3, full, 1));
    assert_eq!(
        reapply(StackingPolicy::AddDuration, 3),
        (3, Some(Millis::from_secs(28)), 1)
    );
    assert_eq!(reapply(StackingPolicy::IndependentInstances, 3), (1, full, 3));

    // one past the cap starts over
    assert_eq!(reapply(StackingPolicy::StackThenReplace, 4), (1, full, 1));
    assert_eq!(reapply(StackingPolicy::ReplaceDuration, 4), (1, full, 1));
}

#[test]
fn replacing_a_capped_aura_restores_its_shield() {
    let harness = Harness::new([frenzy(StackingPolicy::StackThenReplace)]);
    let env = harness.env();
    let mut world = World::default();
    let unit = world.spawn(&player(10, 1000, 50));

    let mut handle = None;
    for _ in 0..3 {
        handle = world
            .apply_aura(&env, unit, unit, FRENZY, ApplyParams::default())
            .ok();
    }
    let handle = handle.expect("frenzy");
    let hit = DamageInfo::new(None, unit, SchoolMask::FIRE, DamageKind::Direct, 30);
    assert_eq!(world.deal_damage(&env, hit).absorbed, 30);
    let amounts = |world: &World| {
        world
            .aura(handle)
            .map(|aura| aura.effects().iter().map(|effect| effect.amount()).collect::<Vec<_>>())
    };
    assert_eq!(amounts(&world), Some(vec![15, 10]));

    let again = world
        .apply_aura(&env, unit, unit, FRENZY, ApplyParams::default())
        .expect("frenzy");
    assert_eq!(again, handle);
    assert_eq!(world.aura(handle).map(|aura| aura.stacks()), Some(1));
    assert_eq!(amounts(&world), Some(vec![5, 40]));
}

// ============================================================================
// Single-target and exclusive auras
// ============================================================================

const MARK: SpellId = SpellId(610);
const HEX: SpellId = SpellId(611);
const SEAL_OF_FURY: SpellId = SpellId(612);
const SEAL_OF_WARDING: SpellId = SpellId(613);
const BLESSING: SpellId = SpellId(614);

fn marks() -> Vec<SpellTemplate> {
    let mark = |id, name| {
        SpellTemplate::new(id, name)
            .with_attributes(SpellAttributes::SINGLE_TARGET)
            .with_duration(Millis::from_secs(30))
            .with_max_stack(5)
            .with_stacking(StackingPolicy::StackThenReplace)
            .with_effect(EffectTemplate::aura(AuraType::ModDamageTaken, 2).with_school_misc(SchoolMask::ALL))
    };
    let seal = |id, name| {
        SpellTemplate::new(id, name)
            .with_attributes(SpellAttributes::POSITIVE)
            .with_exclusive_group(7)
            .with_effect(EffectTemplate::aura(AuraType::ModDamageDone, 3).with_school_misc(SchoolMask::ALL))
    };
    vec![
        mark(MARK, "Hunter's Mark").with_attributes(SpellAttributes::TRANSFER_STACKS),
        mark(HEX, "Hex"),
        seal(SEAL_OF_FURY, "Seal of Fury"),
        seal(SEAL_OF_WARDING, "Seal of Warding"),
        SpellTemplate::new(BLESSING, "Blessing")
            .with_attributes(SpellAttributes::POSITIVE)
            .with_effect(EffectTemplate::aura(AuraType::ModResistance, 10).with_school_misc(SchoolMask::ALL)),
    ]
}

#[test]
fn single_target_aura_moves_with_its_legacy_stacks() {
    let harness = Harness::new(marks());
    let env = harness.env();
    let mut world = World::default();
    let hunter = world.spawn(&player(10, 1000, 50));
    let first = world.spawn(&creature(10, 1000, 5));
    let second = world.spawn(&creature(10, 1000, 5));

    for spell in [MARK, MARK, MARK, HEX, HEX] {
        world
            .apply_aura(&env, hunter, first, spell, ApplyParams::default())
            .expect("first target");
    }
    world.drain_events();

    let mark = world
        .apply_aura(&env, hunter, second, MARK, ApplyParams::default())
        .expect("mark moves");
    let hex = world
        .apply_aura(&env, hunter, second, HEX, ApplyParams::default())
        .expect("hex moves");

    let aura = world.aura(mark).expect("mark");
    assert_eq!(aura.stacks(), 3);
    assert_eq!(aura.effect(0).map(|effect| effect.amount()), Some(6));
    // no transfer attribute: the new aura starts from one stack
    assert_eq!(world.aura(hex).map(|aura| aura.stacks()), Some(1));

    assert!(world.unit(first).is_some_and(|unit| unit.auras().is_empty()));
    assert_eq!(world.unit(second).map(|unit| unit.auras().len()), Some(2));
    assert_eq!(
        world.unit(hunter).map(|unit| unit.auras().single_target_links().len()),
        Some(2)
    );
    let events = world.drain_events();
    assert_eq!(
        count(&events, |e| matches!(
            e,
            CombatEvent::AuraRemoved { target, mode: AuraRemoveMode::Replaced, .. } if *target == first
        )),
        2
    );
}

#[test]
fn exclusive_group_keeps_only_the_newest() {
    let harness = Harness::new(marks());
    let env = harness.env();
    let mut world = World::default();
    let paladin = world.spawn(&player(10, 1000, 50));

    let fury = world
        .apply_aura(&env, paladin, paladin, SEAL_OF_FURY, ApplyParams::default())
        .expect("fury");
    let blessing = world
        .apply_aura(&env, paladin, paladin, BLESSING, ApplyParams::default())
        .expect("blessing");
    let warding = world
        .apply_aura(&env, paladin, paladin, SEAL_OF_WARDING, ApplyParams::default())
        .expect("warding");

    assert!(world.aura(fury).is_none());
    let unit = world.unit(paladin).expect("paladin");
    assert!(unit.auras().is_applied(blessing));
    assert!(unit.auras().is_applied(warding));
    assert_eq!(unit.auras().len(), 2);
    assert!(world.drain_events().iter().any(|event| matches!(
        event,
        CombatEvent::AuraRemoved { spell, mode: AuraRemoveMode::Replaced, .. } if *spell == SEAL_OF_FURY
    )));

    // re-applying the holder of the group refreshes instead of evicting
    let again = world
        .apply_aura(&env, paladin, paladin, SEAL_OF_WARDING, ApplyParams::default())
        .expect("warding");
    assert_eq!(again, warding);
    assert_eq!(world.unit(paladin).map(|unit| unit.auras().len()), Some(2));
}

// ============================================================================
// Removal links
// ============================================================================

const FLAME_FORM: SpellId = SpellId(620);
const EMBER_SKIN: SpellId = SpellId(621);
const AFTERGLOW: SpellId = SpellId(622);

fn linked_forms() -> Vec<SpellTemplate> {
    let buff = |id, name| {
        SpellTemplate::new(id, name)
            .with_attributes(SpellAttributes::POSITIVE)
            .with_effect(EffectTemplate::aura(AuraType::ModResistance, 5).with_school_misc(SchoolMask::FIRE))
    };
    vec![
        buff(FLAME_FORM, "Flame Form")
            .with_link(SpellLink::RemoveOnRemove(EMBER_SKIN))
            .with_link(SpellLink::CastOnRemove(AFTERGLOW)),
        buff(EMBER_SKIN, "Ember Skin").with_link(SpellLink::RemoveOnRemove(FLAME_FORM)),
        buff(AFTERGLOW, "Afterglow"),
    ]
}

#[test]
fn removal_sweep_survives_links_changing_the_store() {
    let harness = Harness::new(linked_forms());
    let env = harness.env();
    let mut world = World::default();
    let mage = world.spawn(&player(10, 1000, 50));
    for spell in [FLAME_FORM, EMBER_SKIN] {
        world
            .apply_aura(&env, mage, mage, spell, ApplyParams::default())
            .expect("form");
    }
    world.drain_events();

    let removed = world.remove_auras(&env, mage, AuraSelector::All, AuraRemoveMode::Cancel);

    // the linked removal took Ember Skin before the sweep reached it
    assert_eq!(removed, 1);
    let events = world.drain_events();
    for spell in [FLAME_FORM, EMBER_SKIN] {
        assert_eq!(
            count(&events, |e| matches!(e, CombatEvent::AuraRemoved { spell: s, .. } if *s == spell)),
            1,
            "{spell}"
        );
    }
    // the aura cast on removal landed after the worklist was taken
    let unit = world.unit(mage).expect("mage");
    assert_eq!(unit.auras().len(), 1);
    assert_eq!(unit.auras().handles_by_spell(AFTERGLOW).len(), 1);
    assert!(unit.auras().handles_by_spell(FLAME_FORM).is_empty());
    assert!(unit.auras().handles_by_spell(EMBER_SKIN).is_empty());
}

// ============================================================================
// Eligibility
// ============================================================================

const SOULSTONE: SpellId = SpellId(630);

#[test]
fn dead_targets_only_take_death_persistent_auras() {
    let harness = Harness::new([
        shield(),
        SpellTemplate::new(SOULSTONE, "Soulstone")
            .with_attributes(SpellAttributes::POSITIVE | SpellAttributes::DEATH_PERSISTENT)
            .with_effect(EffectTemplate::aura(AuraType::Dummy, 0)),
    ]);
    let env = harness.env();
    let mut world = World::default();
    let hunter = world.spawn(&player(10, 1000, 50));
    let prey = world.spawn(&creature(10, 30, 5));

    let hit = DamageInfo::new(Some(hunter), prey, SchoolMask::PHYSICAL, DamageKind::Direct, 100);
    assert!(world.deal_damage(&env, hit).lethal);
    assert_eq!(world.unit(prey).map(|unit| unit.death_state()), Some(DeathState::Dead));

    assert_eq!(
        world.apply_aura(&env, hunter, prey, SHIELD, ApplyParams::default()),
        Err(AuraError::EntityNotEligible(prey))
    );
    assert!(
        world
            .apply_aura(&env, hunter, prey, SOULSTONE, ApplyParams::default())
            .is_ok()
    );
}

// ============================================================================
// Mana shields, damage shields and resistance
// ============================================================================

const MANA_SHIELD: SpellId = SpellId(640);
const THORNS: SpellId = SpellId(641);
const SOUL_LINK: SpellId = SpellId(642);

fn wards() -> Vec<SpellTemplate> {
    vec![
        SpellTemplate::new(MANA_SHIELD, "Mana Shield")
            .with_attributes(SpellAttributes::POSITIVE)
            .with_effect(
                EffectTemplate::aura(AuraType::ManaShield, 100)
                    .with_school_misc(SchoolMask::ALL)
                    .with_multiplier(200),
            ),
        SpellTemplate::new(THORNS, "Thorns")
            .with_school(SchoolMask::FIRE)
            .with_attributes(SpellAttributes::POSITIVE)
            .with_effect(EffectTemplate::aura(AuraType::DamageShield, 15)),
        SpellTemplate::new(SOUL_LINK, "Soul Link")
            .with_attributes(SpellAttributes::POSITIVE)
            .with_effect(EffectTemplate::aura(AuraType::SplitDamagePct, 50).with_school_misc(SchoolMask::ALL)),
    ]
}

#[test]
fn mana_shield_absorbs_what_the_mana_pays_for() {
    let harness = Harness::new(wards());
    let env = harness.env();
    let mut world = World::default();
    let attacker = world.spawn(&player(10, 1000, 50));
    let mage = world.spawn(
        &player(10, 1000, 50).with_powers(PowerPools::new().with(PowerType::Mana, 30)),
    );
    let handle = world
        .apply_aura(&env, mage, mage, MANA_SHIELD, ApplyParams::default())
        .expect("mana shield");

    // two mana per point: 30 mana covers 15 of the 40
    let hit = DamageInfo::new(Some(attacker), mage, SchoolMask::PHYSICAL, DamageKind::Direct, 40);
    let result = world.deal_damage(&env, hit);
    assert_eq!(result.absorbed, 15);
    assert_eq!(result.final_damage, 25);
    let unit = world.unit(mage).expect("mage");
    assert_eq!(unit.powers().current(PowerType::Mana), 0);
    assert_eq!(unit.health().current, 975);
    assert_eq!(
        world.aura(handle).and_then(|aura| aura.effect(0)).map(|effect| effect.amount()),
        Some(85)
    );

    // out of mana: the shield stays up but stops absorbing
    let hit = DamageInfo::new(Some(attacker), mage, SchoolMask::PHYSICAL, DamageKind::Direct, 10);
    assert_eq!(world.deal_damage(&env, hit).absorbed, 0);
    assert!(world.aura(handle).is_some());
}

#[test]
fn damage_shield_reflection_is_never_split() {
    let harness = Harness::new(wards());
    let env = harness.env();
    let mut world = World::default();
    let attacker = world.spawn(&player(10, 1000, 50));
    let druid = world.spawn(&player(10, 1000, 50));
    let guardian = world.spawn(&player(10, 1000, 50));
    world
        .apply_aura(&env, druid, druid, THORNS, ApplyParams::default())
        .expect("thorns");
    world
        .apply_aura(&env, guardian, attacker, SOUL_LINK, ApplyParams::default())
        .expect("link");

    world
        .melee_attack(&env, attacker, druid, AttackType::MainHand)
        .expect("swing");
    assert_eq!(world.unit(druid).map(|unit| unit.health().current), Some(950));
    assert_eq!(world.unit(attacker).map(|unit| unit.health().current), Some(985));
    assert_eq!(world.unit(guardian).map(|unit| unit.health().current), Some(1000));
    assert!(world.drain_events().iter().any(|event| matches!(
        event,
        CombatEvent::DamageTaken { victim, attacker: Some(from), amount: 15, school }
            if *victim == attacker && *from == druid && *school == SchoolMask::FIRE
    )));

    // ordinary damage to the same unit is split
    let hit = DamageInfo::new(None, attacker, SchoolMask::FIRE, DamageKind::Direct, 20);
    assert_eq!(world.deal_damage(&env, hit).redirected, 10);
    assert_eq!(world.unit(guardian).map(|unit| unit.health().current), Some(990));
}

#[test]
fn resistance_takes_its_share_inside_the_pipeline() {
    let harness = harness();
    let env = harness.env();
    let mut world = World::default();
    let warlock = world.spawn(&player(10, 1000, 50));
    let warded = world.spawn(
        &UnitSpec::player(10, 1000)
            .with_flags(UnitFlags::PLAYER_CONTROLLED)
            .with_stats(CombatStats::default().with_resistance(SpellSchool::Shadow, 10_000)),
    );

    // capped 75% average; the top roll lands in the 90% bucket
    let hit = DamageInfo::new(Some(warlock), warded, SchoolMask::SHADOW, DamageKind::Direct, 100)
        .with_class(DamageClass::Magic);
    let result = world.deal_damage(&env, hit);
    assert_eq!(result.resisted, 90);
    assert_eq!(result.final_damage, 10);
    assert_eq!(world.unit(warded).map(|unit| unit.health().current), Some(990));

    // physical damage is never resisted
    let hit = DamageInfo::new(Some(warlock), warded, SchoolMask::PHYSICAL, DamageKind::Direct, 100);
    assert_eq!(world.deal_damage(&env, hit).resisted, 0);
}

// ============================================================================
// Hit table outcomes
// ============================================================================

const KEEN_EYE: SpellId = SpellId(650);

/// Live tables with every roll landing at 10%.
fn rolling_harness() -> Harness {
    let mut harness = Harness::new([SpellTemplate::new(KEEN_EYE, "Keen Eye")
        .with_attributes(SpellAttributes::POSITIVE)
        .with_effect(EffectTemplate::aura(AuraType::ModCritPercent, 100))]);
    harness.tables = CombatTables::new();
    harness.rng = FixedRng(1_000);
    harness
}

#[test]
fn swings_at_higher_level_creatures_glance() {
    let harness = rolling_harness();
    let env = harness.env();
    let mut world = World::default();
    let player_unit = world.spawn(&player(10, 1000, 100));
    let boss = world.spawn(&creature(13, 1000, 100));

    // 5.6% miss, then 20% glancing
    let result = world
        .melee_attack(&env, player_unit, boss, AttackType::MainHand)
        .expect("swing");
    assert_eq!(result.outcome, HitOutcome::Glancing);
    assert!(result.hit_info.contains(HitInfo::GLANCING));
    assert_eq!(result.final_damage, 75);
}

#[test]
fn higher_level_creatures_crush() {
    let harness = rolling_harness();
    let env = harness.env();
    let mut world = World::default();
    let boss = world.spawn(&creature(13, 1000, 100));
    let tank = world.spawn(&player(10, 1000, 100));

    // 4.4% miss, then 15% crushing
    let result = world
        .melee_attack(&env, boss, tank, AttackType::MainHand)
        .expect("swing");
    assert_eq!(result.outcome, HitOutcome::Crushing);
    assert_eq!(result.final_damage, 150);
    assert_eq!(world.unit(tank).map(|unit| unit.health().current), Some(850));
}

#[test]
fn crit_chance_from_auras_doubles_the_swing() {
    let harness = rolling_harness();
    let env = harness.env();
    let mut world = World::default();
    let rogue = world.spawn(&player(10, 1000, 100));
    let target = world.spawn(&player(10, 1000, 100));
    world
        .apply_aura(&env, rogue, rogue, KEEN_EYE, ApplyParams::default())
        .expect("keen eye");

    let result = world
        .melee_attack(&env, rogue, target, AttackType::MainHand)
        .expect("swing");
    assert_eq!(result.outcome, HitOutcome::Crit);
    assert!(result.hit_info.contains(HitInfo::CRITICAL));
    assert_eq!(result.final_damage, 200);
}

// ============================================================================
// Procs per minute
// ============================================================================

const WINDFURY: SpellId = SpellId(660);

#[test]
fn ppm_chance_follows_weapon_speed() {
    let mut harness = Harness::new([SpellTemplate::new(WINDFURY, "Windfury")
        .with_attributes(SpellAttributes::POSITIVE)
        .with_proc(ProcTemplate::new(ProcFlags::DONE_MELEE_AUTO, 0).with_ppm(6))
        .with_effect(EffectTemplate::aura(AuraType::ProcTriggerDamage, 5))]);
    // a 25% roll: passes the 3.0s weapon's 30%, fails the 2.0s weapon's 20%
    harness.rng = FixedRng(2_500);
    let env = harness.env();
    let mut world = World::default();

    let slow = world.spawn(
        &UnitSpec::player(10, 1000)
            .with_flags(UnitFlags::PLAYER_CONTROLLED)
            .with_stats(CombatStats::default().with_weapon(
                AttackType::MainHand,
                WeaponProfile::fixed(50, Millis(3000)),
            )),
    );
    let fast = world.spawn(&player(10, 1000, 50));
    let slow_target = world.spawn(&player(10, 1000, 50));
    let fast_target = world.spawn(&player(10, 1000, 50));
    for unit in [slow, fast] {
        world
            .apply_aura(&env, unit, unit, WINDFURY, ApplyParams::default())
            .expect("windfury");
    }

    world
        .melee_attack(&env, slow, slow_target, AttackType::MainHand)
        .expect("swing");
    world
        .melee_attack(&env, fast, fast_target, AttackType::MainHand)
        .expect("swing");

    assert_eq!(world.unit(slow_target).map(|unit| unit.health().current), Some(945));
    assert_eq!(world.unit(fast_target).map(|unit| unit.health().current), Some(950));
}

// ============================================================================
// Channels and extreme modifiers
// ============================================================================

const DRAIN: SpellId = SpellId(670);
const FOCUS: SpellId = SpellId(671);
const ARCANE_JOLT: SpellId = SpellId(672);
const MORTAL_STRIKE: SpellId = SpellId(673);

#[test]
fn interrupted_channel_takes_its_auras_along() {
    let harness = Harness::new([SpellTemplate::new(DRAIN, "Drain Life")
        .with_school(SchoolMask::SHADOW)
        .with_attributes(SpellAttributes::CHANNELED)
        .with_duration(Millis::from_secs(5))
        .with_effect(
            EffectTemplate::aura(AuraType::PeriodicDamage, 10).with_amplitude(Millis::from_secs(1)),
        )]);
    let env = harness.env();
    let mut world = World::default();
    let warlock = world.spawn(&player(10, 1000, 50));
    let victim = world.spawn(&player(10, 1000, 50));

    let slot = world
        .start_cast(&env, warlock, victim, DRAIN)
        .expect("channel");
    assert_eq!(slot, CastSlot::Channeled);
    let handles = world
        .unit(warlock)
        .and_then(|unit| unit.casts().get(CastSlot::Channeled))
        .map(|cast| cast.channel_auras().to_vec())
        .unwrap_or_default();
    assert_eq!(handles.len(), 1);

    world.update(&env, Millis(1500));
    assert_eq!(world.unit(victim).map(|unit| unit.health().current), Some(990));

    assert!(world.interrupt_cast(&env, warlock, CastSlot::Channeled, InterruptStrength::Soft));
    assert!(world.aura(handles[0]).is_none());
    assert!(world.unit(victim).is_some_and(|unit| unit.auras().is_empty()));
    assert!(world.drain_events().iter().any(|event| matches!(
        event,
        CombatEvent::AuraRemoved { spell, mode: AuraRemoveMode::Interrupt, .. } if *spell == DRAIN
    )));

    world.update(&env, Millis::from_secs(5));
    assert_eq!(world.unit(victim).map(|unit| unit.health().current), Some(990));
}

#[test]
fn saturated_hit_bonuses_still_resolve() {
    let harness = Harness::new([
        SpellTemplate::new(FOCUS, "Focus")
            .with_attributes(SpellAttributes::POSITIVE)
            .with_effect(EffectTemplate::aura(AuraType::ModSpellHitChance, i32::MAX).with_school_misc(SchoolMask::ALL))
            .with_effect(EffectTemplate::aura(AuraType::ModHitChance, i32::MAX)),
        SpellTemplate::new(ARCANE_JOLT, "Arcane Jolt")
            .with_school(SchoolMask::ARCANE)
            .with_effect(EffectTemplate::damage(40)),
        SpellTemplate::new(MORTAL_STRIKE, "Mortal Strike")
            .with_damage_class(DamageClass::Melee)
            .with_effect(EffectTemplate::damage(30)),
    ]);
    let env = harness.env();
    let mut world = World::default();
    let caster = world.spawn(&player(10, 1000, 50));
    let target = world.spawn(&player(10, 1000, 50));
    world
        .apply_aura(&env, caster, caster, FOCUS, ApplyParams::default())
        .expect("focus");

    for spell in [ARCANE_JOLT, MORTAL_STRIKE] {
        world.start_cast(&env, caster, target, spell).expect("instant");
    }
    assert_eq!(world.unit(target).map(|unit| unit.health().current), Some(930));
}
