//! Loading content directories from disk.

use std::fs;
use std::path::{Path, PathBuf};

use combat_content::{ContentFactory, ScenarioLoader};
use combat_core::{
    ItemId, LootOracle, LootRequest, Millis, SpecialCaseOracle, SpellId, TemplateOracle, UnitId,
};

fn repo_data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../data")
}

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dir");
    }
    fs::write(path, content).expect("write file");
}

#[test]
fn minimal_directory_loads_with_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "config.toml", "seed = 99\n");
    write(dir.path(), "tables.toml", "");
    write(
        dir.path(),
        "spells.ron",
        r#"#![enable(unwrap_newtypes, implicit_some)]
(spells: [(id: 1, name: "Strike", effects: [(kind: SchoolDamage, base_points: 10)])])"#,
    );

    let content = ContentFactory::new(dir.path()).load_all().expect("content");
    assert_eq!(content.config.seed, 99);
    assert_eq!(content.catalog.len(), 1);
    assert!(content.specials.is_empty());
    assert!(content.loot.is_empty());
    assert!(content.validate().is_empty());
}

#[test]
fn missing_spells_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "config.toml", "");
    write(dir.path(), "tables.toml", "");

    let error = ContentFactory::new(dir.path())
        .load_all()
        .expect_err("spells.ron is required");
    assert!(format!("{error:#}").contains("spells.ron"), "{error:#}");
}

#[test]
fn malformed_tables_report_the_format() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "tables.toml", "armor_cap_bp = \"lots\"");

    let error = ContentFactory::new(dir.path())
        .load_tables()
        .expect_err("bad value");
    assert!(format!("{error}").contains("tables TOML"), "{error}");
}

#[test]
fn scenarios_load_by_name() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        "scenarios/brawl.ron",
        r#"#![enable(unwrap_newtypes, implicit_some)]
(
    name: "brawl",
    units: [(name: "a"), (name: "b")],
    script: [(at: 1000, action: Attack(attacker: "a", victim: "b"))],
)"#,
    );

    let factory = ContentFactory::new(dir.path());
    let scenario = factory.load_scenario("brawl").expect("scenario");
    assert_eq!(scenario.name, "brawl");
    assert_eq!(scenario.last_action_at(), Millis(1000));
    assert!(factory.load_scenario("missing").is_err());
}

#[test]
fn shipped_content_is_consistent() {
    let factory = ContentFactory::new(repo_data_dir());
    let content = factory.load_all().expect("shipped content");

    let issues = content.validate();
    assert!(issues.is_empty(), "{issues:?}");

    let seal = content.catalog.template(SpellId(301)).expect("seal");
    assert!(seal.proc.is_some_and(|proc| proc.ppm > 0));
    assert!(content.specials.proc_behavior(SpellId(501)).is_some());
    assert_eq!(content.specials.damage_bonus_pct(SpellId(302)), Some(10));

    let drops = content.loot.fill(&LootRequest {
        source: UnitId(3),
        looter: UnitId(1),
        roll_seed: 11,
    });
    assert!(drops.iter().any(|drop| drop.item == ItemId(1001)));
}

#[test]
fn shipped_scenarios_parse() {
    let dir = repo_data_dir().join("scenarios");
    let mut loaded = 0;
    for entry in fs::read_dir(&dir).expect("scenarios dir") {
        let path = entry.expect("entry").path();
        if path.extension().is_some_and(|ext| ext == "ron") {
            let scenario = ScenarioLoader::load(&path).expect("scenario");
            assert!(!scenario.units.is_empty(), "{}", path.display());
            loaded += 1;
        }
    }
    assert!(loaded >= 2);
}
