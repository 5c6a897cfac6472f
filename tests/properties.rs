//! Property tests for roster uniqueness and roll termination.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rollcall::{RollConfig, RollEngine, RosterConfig, RosterStore, RosterSource};
use std::cell::RefCell;
use std::collections::BTreeSet;
use tempfile::TempDir;

/// In-memory roster for driving the engine without disk I/O.
struct Names {
    names: Vec<String>,
    called: RefCell<Vec<String>>,
}

impl RosterSource for Names {
    fn list_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn record_call(&self, name: &str) -> bool {
        self.called.borrow_mut().push(name.to_string());
        true
    }
}

fn raw_name() -> impl Strategy<Value = String> {
    prop_oneof![
        "[ \t]{0,3}[A-Za-z]{1,6}[ \t]{0,3}",
        "[ \t]{0,4}",
        Just("Alice".to_string()),
        Just("alice".to_string()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn add_names_counts_new_unique_names(
        existing in prop::collection::vec(raw_name(), 0..8),
        batch in prop::collection::vec(raw_name(), 0..20),
    ) {
        let dir = TempDir::new().unwrap();
        let store = RosterStore::create(RosterConfig {
            path: dir.path().join("data"),
            ..Default::default()
        })
        .unwrap();
        store.add_names(&existing);

        let before: BTreeSet<String> = store.list_names().into_iter().collect();
        let expected: BTreeSet<String> = batch
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && !before.contains(s))
            .collect();

        prop_assert_eq!(store.add_names(&batch), expected.len());

        let after: BTreeSet<String> = store.list_names().into_iter().collect();
        prop_assert_eq!(after.len(), before.len() + expected.len());
        prop_assert!(after.iter().all(|n| !n.is_empty() && n.trim() == n));
    }

    #[test]
    fn roll_tick_count_matches_config(
        min_speed in 1u64..300,
        max_speed in 1u64..300,
        step in 1u64..60,
        roster_size in 1usize..12,
        seed in any::<u64>(),
    ) {
        let config = RollConfig { min_speed, max_speed, step, duration: 0 };
        let expected = config.expected_ticks() as usize;

        let source = Names {
            names: (0..roster_size).map(|i| format!("n{i}")).collect(),
            called: RefCell::new(Vec::new()),
        };
        let mut engine = RollEngine::with_rng(config, StdRng::seed_from_u64(seed)).unwrap();
        engine.toggle(&source).unwrap();

        let mut shown = Vec::new();
        while let Some(tick) = engine.advance(&source) {
            let last = tick.is_final();
            shown.push(tick.name);
            if last {
                break;
            }
        }

        prop_assert_eq!(shown.len(), expected);
        prop_assert!(!engine.is_running());
        let called = source.called.borrow().clone();
        prop_assert_eq!(called.as_slice(), &shown[shown.len() - 1..]);

        // No repeats inside any pass over the roster
        for pass in shown.chunks(roster_size) {
            let unique: BTreeSet<&String> = pass.iter().collect();
            prop_assert_eq!(unique.len(), pass.len());
        }
    }
}
