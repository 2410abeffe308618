//! Laws that must hold for any fight, checked over many rolls.

mod common;

use combat_core::combat::armor_mitigation_bp;
use combat_core::{
    ApplyParams, AttackType, AuraRemoveMode, AuraSelector, AuraType, CombatConfig, CombatEnv,
    CombatEvent, CombatStats, CombatTables, DamageInfo, DamageKind, EffectTemplate, Millis,
    PcgRng, ProcFlags, ProcTemplate, SchoolMask, SpellAttributes, SpellId, SpellTemplate,
    StackingPolicy, TemplateCatalog, UnitFlags, UnitSpec, WeaponProfile, World,
};
use common::{Harness, count, player};

const FURY: SpellId = SpellId(1);
const BARRIER: SpellId = SpellId(2);
const GUARDIAN_LINK: SpellId = SpellId(3);
const ECHO: SpellId = SpellId(4);

fn templates() -> Vec<SpellTemplate> {
    vec![
        SpellTemplate::new(FURY, "Fury")
            .with_attributes(SpellAttributes::POSITIVE)
            .with_max_stack(3)
            .with_stacking(StackingPolicy::AddDuration)
            .with_effect(EffectTemplate::aura(AuraType::ModDamageDone, 10).with_school_misc(SchoolMask::ALL)),
        SpellTemplate::new(BARRIER, "Barrier")
            .with_attributes(SpellAttributes::POSITIVE)
            .with_effect(EffectTemplate::aura(AuraType::SchoolAbsorb, 50).with_school_misc(SchoolMask::ALL)),
        SpellTemplate::new(GUARDIAN_LINK, "Guardian Link")
            .with_attributes(SpellAttributes::POSITIVE)
            .with_effect(EffectTemplate::aura(AuraType::SplitDamagePct, 20).with_school_misc(SchoolMask::ALL)),
        SpellTemplate::new(ECHO, "Echo")
            .with_attributes(SpellAttributes::POSITIVE)
            .with_proc(ProcTemplate::new(ProcFlags::TAKEN_DAMAGE, 100))
            .with_effect(EffectTemplate::aura(AuraType::ProcTriggerDamage, 1)),
    ]
}

#[test]
fn stacks_never_exceed_the_cap() {
    let harness = Harness::new(templates());
    let env = harness.env();
    let mut world = World::default();
    let unit = world.spawn(&player(10, 1000, 50));

    let mut handle = None;
    for _ in 0..5 {
        handle = Some(
            world
                .apply_aura(&env, unit, unit, FURY, ApplyParams::default())
                .expect("fury"),
        );
    }
    let aura = handle.and_then(|handle| world.aura(handle)).expect("aura");
    assert_eq!(aura.stacks(), 3);
    assert_eq!(aura.effect(0).map(|effect| effect.amount()), Some(30));
    assert_eq!(world.unit(unit).map(|unit| unit.auras().len()), Some(1));
}

#[test]
fn removing_from_the_holder_clears_every_target() {
    let harness = Harness::new(templates());
    let env = harness.env();
    let mut world = World::default();
    let holder = world.spawn(&player(10, 1000, 50));
    let ally = world.spawn(&player(10, 1000, 50));

    let handle = world
        .apply_aura(&env, holder, holder, FURY, ApplyParams::default())
        .expect("fury");
    world.extend_aura(&env, handle, ally).expect("extend");
    assert!(world.unit(ally).is_some_and(|unit| unit.auras().is_applied(handle)));

    let removed = world.remove_auras(&env, holder, AuraSelector::Handle(handle), AuraRemoveMode::Cancel);
    assert_eq!(removed, 1);
    assert!(world.unit(holder).is_some_and(|unit| unit.auras().is_empty()));
    assert!(world.unit(ally).is_some_and(|unit| unit.auras().is_empty()));
    assert!(world.aura(handle).is_none());
    assert!(world.aura_arena().is_empty());

    let events = world.drain_events();
    assert_eq!(
        count(&events, |e| matches!(e, CombatEvent::AuraRemoved { mode: AuraRemoveMode::Cancel, .. })),
        2
    );
}

#[test]
fn damage_stages_account_for_every_point() {
    let catalog: TemplateCatalog = templates().into_iter().collect();
    let tables = CombatTables::default();
    let rng = PcgRng;
    let env = CombatEnv::new(&catalog, &tables, &rng);
    let mut world = World::new(CombatConfig::default().with_seed(0xC0FFEE));

    let weapon = WeaponProfile::new(40, 120, Millis(2600));
    let attacker = world.spawn(
        &UnitSpec::player(60, 100_000)
            .with_stats(CombatStats::default().with_weapon(AttackType::MainHand, weapon)),
    );
    let victim = world.spawn(
        &UnitSpec::player(60, 1_000_000)
            .with_flags(
                UnitFlags::PLAYER_CONTROLLED
                    | UnitFlags::CAN_DODGE
                    | UnitFlags::CAN_PARRY
                    | UnitFlags::CAN_BLOCK,
            )
            .with_stats(CombatStats::default().with_armor(3000).with_block(1500, 25)),
    );
    let guardian = world.spawn(&UnitSpec::player(60, 1_000_000));
    world
        .apply_aura(&env, victim, victim, BARRIER, ApplyParams::default())
        .expect("barrier");
    world
        .apply_aura(&env, guardian, victim, GUARDIAN_LINK, ApplyParams::default())
        .expect("link");

    let mut redirected = 0;
    for _ in 0..200 {
        let result = world
            .melee_attack(&env, attacker, victim, AttackType::MainHand)
            .expect("swing");
        let accounted = result.mitigated
            + result.blocked
            + result.resisted
            + result.absorbed
            + result.redirected
            + result.final_damage;
        assert_eq!(accounted, result.raw, "{result:?}");
        assert!(result.dealt <= result.final_damage);
        redirected += result.redirected;
    }

    let guardian_loss = 1_000_000 - world.unit(guardian).map_or(0, |unit| unit.health().current);
    assert!(redirected > 0);
    assert!(guardian_loss <= redirected);
}

#[test]
fn armor_mitigation_stays_under_the_cap() {
    let tables = CombatTables::default();
    for level in [1u8, 20, 40, 60, 63, 80] {
        for armor in (-500..=40_000).step_by(250) {
            let mitigation = armor_mitigation_bp(&tables, armor, level);
            assert!(mitigation <= tables.armor_cap_bp, "armor {armor} level {level}");
            if armor <= 0 {
                assert_eq!(mitigation, 0);
            }
        }
    }
}

#[test]
fn mutual_proc_chains_stop_at_the_depth_limit() {
    let harness = Harness::new(templates());
    let env = harness.env();
    let mut config = CombatConfig::default();
    config.max_proc_depth = 4;
    let mut world = World::new(config);
    let left = world.spawn(&player(10, 1000, 50));
    let right = world.spawn(&player(10, 1000, 50));
    for unit in [left, right] {
        world
            .apply_aura(&env, unit, unit, ECHO, ApplyParams::default())
            .expect("echo");
    }
    world.drain_events();

    let hit = DamageInfo::new(Some(left), right, SchoolMask::PHYSICAL, DamageKind::Direct, 10);
    world.deal_damage(&env, hit);

    let events = world.drain_events();
    // the opening hit, then four echoes from each side
    assert_eq!(count(&events, |e| matches!(e, CombatEvent::DamageTaken { .. })), 9);
    assert_eq!(world.unit(right).map(|unit| unit.health().current), Some(986));
    assert_eq!(world.unit(left).map(|unit| unit.health().current), Some(996));

    // the next top-level event starts from a clean depth
    let hit = DamageInfo::new(Some(left), right, SchoolMask::PHYSICAL, DamageKind::Direct, 10);
    world.deal_damage(&env, hit);
    assert_eq!(
        count(&world.drain_events(), |e| matches!(e, CombatEvent::DamageTaken { .. })),
        9
    );
}
