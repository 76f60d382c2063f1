//! End-to-end encounter scenarios driven through the façade.

use skirmish_core::components::{Ai, AnimationIntent, Attack, Health, Movement, Position};
use skirmish_core::config::EncounterConfig;
use skirmish_core::data::ArchetypeCatalog;
use skirmish_core::encounter::Encounter;
use skirmish_core::events::{CancelReason, EncounterEvent, TickEvents};
use skirmish_core::factions::Faction;
use skirmish_test_utils::fixtures::{archetype, attack, duel, point};

/// Advance `ticks` times and keep every tick's events.
fn run(encounter: &mut Encounter, ticks: u64) -> Vec<TickEvents> {
    (0..ticks).map(|_| encounter.advance()).collect()
}

fn events_where<F>(log: &[TickEvents], mut keep: F) -> Vec<(u64, EncounterEvent)>
where
    F: FnMut(&EncounterEvent) -> bool,
{
    let mut kept = Vec::new();
    for tick in log {
        for event in &tick.events {
            if keep(event) {
                kept.push((tick.tick, event.clone()));
            }
        }
    }
    kept
}

fn brute_catalog() -> ArchetypeCatalog {
    let mut catalog = ArchetypeCatalog::builtin();
    catalog
        .insert(archetype("brute", Faction::Allied, 1000, 2, attack(15, 120)))
        .unwrap();
    catalog
}

#[test]
fn test_fifty_hp_survives_three_hits_and_dies_on_the_fourth() {
    let mut encounter =
        Encounter::with_setup(EncounterConfig::default(), brute_catalog()).unwrap();
    let brute = encounter.spawn("brute", point(0, 0)).unwrap();
    let skeleton = encounter.spawn("skeleton", point(100, 0)).unwrap();
    encounter.issue_attack(brute, skeleton).unwrap();

    let log = run(&mut encounter, 250);
    let landed = events_where(&log, |event| {
        matches!(event, EncounterEvent::AttackLanded { attacker, .. } if *attacker == brute)
    });

    let remaining: Vec<u32> = landed
        .iter()
        .map(|(_, event)| match event {
            EncounterEvent::AttackLanded { remaining_hp, .. } => *remaining_hp,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(remaining, vec![35, 20, 5, 0]);

    let ticks: Vec<u64> = landed.iter().map(|(tick, _)| *tick).collect();
    assert_eq!(ticks, vec![15, 90, 165, 240]);

    let deaths = events_where(&log, |event| matches!(event, EncounterEvent::EntityDied { .. }));
    assert_eq!(
        deaths,
        vec![(
            240,
            EncounterEvent::EntityDied {
                entity: skeleton,
                killer: Some(brute),
            }
        )]
    );
}

#[test]
fn test_edge_distance_120_is_in_range() {
    let (mut encounter, knight, skeleton) = duel(120).unwrap();
    encounter.issue_attack(knight, skeleton).unwrap();

    let events = encounter.advance();
    assert!(events.events.contains(&EncounterEvent::AttackStarted {
        attacker: knight,
        target: skeleton,
    }));
    assert!(encounter.registry().get::<Attack>(knight).unwrap().attacking);
}

#[test]
fn test_edge_distance_121_approaches() {
    let (mut encounter, knight, skeleton) = duel(121).unwrap();
    encounter.issue_attack(knight, skeleton).unwrap();

    encounter.advance();
    let registry = encounter.registry();
    assert!(!registry.get::<Attack>(knight).unwrap().attacking);
    assert_eq!(
        registry.get::<Movement>(knight).unwrap().velocity,
        point(2, 0)
    );
    assert_eq!(encounter.snapshot()[0].intent, AnimationIntent::Move);
}

#[test]
fn test_fleeing_target_cancels_swing_and_forfeits_cooldown() {
    let (mut encounter, knight, skeleton) = duel(20).unwrap();
    encounter.issue_attack(knight, skeleton).unwrap();
    encounter.advance();
    assert!(encounter.registry().get::<Attack>(knight).unwrap().attacking);

    encounter.apply_knockback(skeleton, point(40, 0)).unwrap();
    let log = run(&mut encounter, 12);

    let cancelled = events_where(&log, |event| {
        matches!(event, EncounterEvent::AttackCancelled { attacker, .. } if *attacker == knight)
    });
    assert_eq!(cancelled.len(), 1);
    assert!(matches!(
        cancelled[0].1,
        EncounterEvent::AttackCancelled {
            reason: CancelReason::OutOfRange,
            ..
        }
    ));
    assert!(events_where(&log, |event| matches!(event, EncounterEvent::AttackLanded { .. }))
        .is_empty());

    let attack = encounter.registry().get::<Attack>(knight).unwrap();
    assert!(!attack.attacking);
    assert_eq!(attack.cooldown_remaining, 0);

    // Once back in range the knight swings again straight away.
    let log = run(&mut encounter, 400);
    let restarted = events_where(&log, |event| {
        matches!(event, EncounterEvent::AttackStarted { attacker, .. } if *attacker == knight)
    });
    assert!(!restarted.is_empty());
}

#[test]
fn test_natural_completion_keeps_cooldown() {
    let (mut encounter, knight, skeleton) = duel(20).unwrap();
    encounter.issue_attack(knight, skeleton).unwrap();

    let log = run(&mut encounter, 31);
    assert!(events_where(&log, |event| {
        *event == EncounterEvent::AttackFinished { attacker: knight }
    })
    .iter()
    .any(|(tick, _)| *tick == 30));

    let attack = encounter.registry().get::<Attack>(knight).unwrap();
    assert!(!attack.attacking);
    assert!(attack.cooldown_remaining > 0);
}

#[test]
fn test_corpse_removed_on_3001st_tick_counting_death() {
    let mut encounter =
        Encounter::with_setup(EncounterConfig::default(), brute_catalog()).unwrap();
    let brute = encounter.spawn("brute", point(0, 0)).unwrap();
    let skeleton = encounter.spawn("skeleton", point(100, 0)).unwrap();
    encounter.issue_attack(brute, skeleton).unwrap();

    let log = run(&mut encounter, 3300);
    let died = events_where(&log, |event| matches!(event, EncounterEvent::EntityDied { .. }));
    let removed =
        events_where(&log, |event| matches!(event, EncounterEvent::EntityRemoved { .. }));

    assert_eq!(died.len(), 1);
    assert_eq!(
        removed,
        vec![(died[0].0 + 3000, EncounterEvent::EntityRemoved { entity: skeleton })]
    );
    assert!(!encounter.registry().contains(skeleton));
    assert!(encounter.hit_test(point(140, 50), Faction::Opposing).is_none());
}

#[test]
fn test_corpse_is_drawn_until_removed() {
    let mut encounter =
        Encounter::with_setup(EncounterConfig::default(), brute_catalog()).unwrap();
    let brute = encounter.spawn("brute", point(0, 0)).unwrap();
    let skeleton = encounter.spawn("skeleton", point(100, 0)).unwrap();
    encounter.issue_attack(brute, skeleton).unwrap();
    run(&mut encounter, 300);

    let view = encounter
        .snapshot()
        .into_iter()
        .find(|view| view.id == skeleton)
        .unwrap();
    assert!(view.dead);
    assert_eq!(view.hp, 0);
    assert_eq!(view.intent, AnimationIntent::Death);
    assert_eq!(encounter.faction_alive_count(Faction::Opposing), 0);
}

#[test]
fn test_move_order_converges_exactly() {
    let mut encounter = Encounter::new();
    let knight = encounter.spawn("knight", point(0, 0)).unwrap();
    let destination = point(357, -123);
    encounter.issue_move(knight, destination).unwrap();

    let log = run(&mut encounter, 400);
    let completed =
        events_where(&log, |event| *event == EncounterEvent::MoveCompleted { entity: knight });
    assert_eq!(completed.len(), 1);

    let registry = encounter.registry();
    assert_eq!(
        registry.get::<Position>(knight).unwrap().anchor(),
        destination
    );
    assert!(registry.get::<Movement>(knight).unwrap().velocity.is_zero());
    assert!(!registry.get::<Ai>(knight).unwrap().has_move_target());
}

#[test]
fn test_equidistant_targets_break_to_lowest_id() {
    let mut encounter = Encounter::new();
    let right = encounter.spawn("knight", point(700, 0)).unwrap();
    let left = encounter.spawn("knight", point(300, 0)).unwrap();
    let skeleton = encounter.spawn("skeleton", point(500, 0)).unwrap();
    assert!(right < left);

    encounter.advance();
    assert_eq!(
        encounter.registry().get::<Ai>(skeleton).unwrap().target,
        Some(right)
    );
}

#[test]
fn test_skeletons_hunt_the_nearest_knight() {
    let mut encounter = Encounter::new();
    let ids = encounter.spawn_starting_roster().unwrap();
    let log = run(&mut encounter, 1);

    let acquired = events_where(&log, |event| {
        matches!(event, EncounterEvent::TargetAcquired { .. })
    });
    assert_eq!(acquired.len(), 3);

    // Knights never pick targets on their own.
    for &knight in &ids[..3] {
        assert_eq!(encounter.registry().get::<Ai>(knight).unwrap().target, None);
    }
    // The skeleton at (341, 467) is closest to the knight at (400, 600).
    assert_eq!(
        encounter.registry().get::<Ai>(ids[3]).unwrap().target,
        Some(ids[1])
    );
}

#[test]
fn test_player_directed_knight_wins_a_duel() {
    let (mut encounter, knight, skeleton) = duel(300).unwrap();
    encounter.issue_attack(knight, skeleton).unwrap();

    let mut ticks = 0;
    while encounter.faction_alive_count(Faction::Opposing) > 0 {
        encounter.advance();
        ticks += 1;
        assert!(ticks < 1000, "duel never resolved");
    }
    assert_eq!(encounter.faction_alive_count(Faction::Allied), 1);

    // The dead target is dropped on the knight's next evaluation.
    let events = encounter.advance();
    assert!(events.events.contains(&EncounterEvent::TargetLost {
        entity: knight,
        target: skeleton,
    }));
    assert!(encounter.registry().get::<Ai>(knight).unwrap().target.is_none());

    let health = encounter.registry().get::<Health>(knight).unwrap();
    assert!(health.hp < health.max_hp);
    assert_eq!(encounter.snapshot().len(), 2);
}
