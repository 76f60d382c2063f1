//! Scenario files shipped under `assets/scenarios/`.

use std::path::PathBuf;

use skirmish_core::data::ArchetypeCatalog;
use skirmish_core::factions::Faction;
use skirmish_headless::data_loader::load_data_dir;
use skirmish_headless::runner::ScenarioRunner;
use skirmish_headless::scenario::Scenario;
use skirmish_test_utils::determinism::verify_determinism;

fn assets() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets")
}

fn load(name: &str) -> Scenario {
    Scenario::load(assets().join("scenarios").join(name)).unwrap()
}

fn runner(name: &str) -> ScenarioRunner {
    let (config, catalog) = load_data_dir(&assets().join("data")).unwrap();
    ScenarioRunner::with_data(load(name), &config, catalog).unwrap()
}

#[test]
fn test_every_scenario_parses_and_validates() {
    let catalog = ArchetypeCatalog::builtin();
    let mut seen = 0;
    for entry in std::fs::read_dir(assets().join("scenarios")).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().is_some_and(|ext| ext == "ron") {
            let scenario = Scenario::load(&path).unwrap();
            scenario.validate(&catalog).unwrap();
            seen += 1;
        }
    }
    assert!(seen >= 3);
}

#[test]
fn test_opening_lineup_file_matches_builtin() {
    assert_eq!(load("opening_lineup.ron").roster, Scenario::opening_lineup().roster);
}

#[test]
fn test_duel_is_won_by_the_knight() {
    let summary = runner("duel.ron").run();
    assert!(summary.decided);
    assert_eq!(summary.winner, Some(Faction::Allied));
    assert_eq!(summary.events.deaths, 1);
    assert!(summary.ticks_run < 3600);
}

#[test]
fn test_counterattack_clears_the_skeletons() {
    let summary = runner("counterattack.ron").run();
    assert_eq!(summary.winner, Some(Faction::Allied));
    assert_eq!(summary.survivors[&Faction::Allied], 3);
    assert_eq!(summary.events.deaths, 3);
}

#[test]
fn test_counterattack_is_deterministic() {
    let result = verify_determinism(
        3,
        900,
        || runner("counterattack.ron"),
        |runner| {
            runner.step();
        },
        |runner| runner.encounter().state_hash(),
    );
    result.assert_deterministic();
}
