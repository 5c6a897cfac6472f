//! Rolls driven against a real store.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rollcall::{RollConfig, RollEngine, RollError, RosterConfig, RosterStore, Tick, Toggle};
use std::collections::HashSet;
use std::time::Duration;
use tempfile::TempDir;

fn test_store(dir: &TempDir) -> RosterStore {
    RosterStore::create(RosterConfig {
        path: dir.path().join("data"),
        ..Default::default()
    })
    .unwrap()
}

fn seeded(config: RollConfig, seed: u64) -> RollEngine<StdRng> {
    RollEngine::with_rng(config, StdRng::seed_from_u64(seed)).unwrap()
}

fn run_to_end(engine: &mut RollEngine<StdRng>, store: &RosterStore) -> Vec<Tick> {
    let mut ticks = Vec::new();
    while let Some(tick) = engine.advance(store) {
        let last = tick.is_final();
        ticks.push(tick);
        if last {
            break;
        }
    }
    ticks
}

#[test]
fn test_default_roll_records_final_pick() {
    let dir = TempDir::new().unwrap();
    let store = test_store(&dir);
    let names: Vec<String> = (0..30).map(|i| format!("student-{i:02}")).collect();
    assert_eq!(store.add_names(&names), 30);

    let mut engine = seeded(RollConfig::default(), 7);
    assert_eq!(
        engine.toggle(&store).unwrap(),
        Toggle::Started {
            first_delay: Duration::from_millis(50)
        }
    );

    let ticks = run_to_end(&mut engine, &store);
    assert_eq!(ticks.len(), 16);
    assert!(!engine.is_running());

    // Pool of 30 covers the whole roll, so no name repeats
    let shown: HashSet<_> = ticks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(shown.len(), ticks.len());

    // Delays climb by step and stop at max_speed
    let intervals: Vec<u64> = ticks.iter().map(|t| t.interval.as_millis() as u64).collect();
    assert_eq!(intervals.first(), Some(&50));
    assert_eq!(intervals.last(), Some(&200));
    assert!(intervals.windows(2).all(|w| w[1] == w[0] + 10));

    let winner = &ticks.last().unwrap().name;
    let history = store.get_history(1);
    assert_eq!(history.len(), 1);
    assert_eq!(&history[0].name, winner);

    // The roster itself is untouched
    assert_eq!(store.name_count(), 30);
}

#[test]
fn test_single_name_roll() {
    let dir = TempDir::new().unwrap();
    let store = test_store(&dir);
    store.add_name("Solo");

    let mut engine = seeded(RollConfig::default(), 1);
    engine.toggle(&store).unwrap();

    let ticks = run_to_end(&mut engine, &store);
    assert_eq!(ticks.len(), 16);
    assert!(ticks.iter().all(|t| t.name == "Solo"));
    assert_eq!(store.get_history(10)[0].name, "Solo");
}

#[test]
fn test_empty_roster_is_rejected() {
    let dir = TempDir::new().unwrap();
    let store = test_store(&dir);

    let mut engine = seeded(RollConfig::default(), 1);
    assert_eq!(engine.toggle(&store), Err(RollError::EmptyRoster));
    assert!(!engine.is_running());
    assert!(engine.advance(&store).is_none());
    assert_eq!(store.history_len(), 0);
}

#[test]
fn test_toggle_cancels_without_recording() {
    let dir = TempDir::new().unwrap();
    let store = test_store(&dir);
    store.add_names(&["Alice", "Bob", "Carol"]);

    let mut engine = seeded(RollConfig::default(), 3);
    engine.toggle(&store).unwrap();
    for _ in 0..5 {
        assert!(engine.advance(&store).unwrap().next_delay.is_some());
    }

    assert_eq!(engine.toggle(&store).unwrap(), Toggle::Stopped);
    assert!(engine.advance(&store).is_none());
    assert_eq!(store.history_len(), 0);

    // A fresh roll starts from min_speed again
    engine.toggle(&store).unwrap();
    assert_eq!(engine.interval(), Some(Duration::from_millis(50)));
}

#[test]
fn test_repeated_rolls_accumulate_history() {
    let dir = TempDir::new().unwrap();
    let store = test_store(&dir);
    store.add_names(&["Alice", "Bob", "Carol", "Dave"]);

    let config = RollConfig {
        min_speed: 10,
        max_speed: 30,
        step: 10,
        duration: 0,
    };
    let mut engine = seeded(config, 11);

    let mut winners = Vec::new();
    for _ in 0..3 {
        engine.toggle(&store).unwrap();
        let ticks = run_to_end(&mut engine, &store);
        assert_eq!(ticks.len(), 3);
        winners.push(ticks.last().unwrap().name.clone());
    }

    let recorded: Vec<String> = store.get_history(10).into_iter().map(|r| r.name).collect();
    winners.reverse();
    assert_eq!(recorded, winners);
}

#[test]
fn test_roster_cleared_mid_roll_stops() {
    let dir = TempDir::new().unwrap();
    let store = test_store(&dir);
    store.add_names(&["Alice", "Bob"]);

    let mut engine = seeded(RollConfig::default(), 5);
    engine.toggle(&store).unwrap();
    engine.advance(&store).unwrap();
    engine.advance(&store).unwrap();

    store.clear_names();
    assert!(engine.advance(&store).is_none());
    assert!(!engine.is_running());
    assert_eq!(store.history_len(), 0);
}
