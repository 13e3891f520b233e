// End-to-end poll cycles against fake feeds and a counting alarm

use super::common::{controller, poll_loop, quake_north, SharedFeed, StaticFeed};
use quakewatch::core::{AlertState, CycleOutcome, DedupStore, JsonDedupStore, TriggerOutcome};
use std::fs;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

#[test]
fn test_strong_nearby_quake_sounds_alarm() {
    let temp = TempDir::new().unwrap();
    let controller = controller(4.5);
    let mut poll = poll_loop(
        temp.path(),
        StaticFeed(vec![quake_north("us7000near", 5.0, 50.0)]),
        controller.clone(),
        300.0,
    );

    match poll.run_cycle() {
        CycleOutcome::Reported { record, trigger } => {
            assert_eq!(record.id, "us7000near");
            assert!((record.distance - 50.0).abs() < 1e-6);
            assert_eq!(trigger, Some(TriggerOutcome::Started));
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    assert_eq!(controller.state(), AlertState::Active);
    assert_eq!(controller.sink().starts.load(Ordering::SeqCst), 1);

    let store = JsonDedupStore::new(temp.path().join("last_quake.json"));
    assert_eq!(store.load().as_deref(), Some("us7000near"));

    let log = fs::read_to_string(temp.path().join("earthquake_log.txt")).unwrap();
    assert_eq!(log.matches("=== EARTHQUAKE DETECTED").count(), 1);
    assert!(log.contains("ID: us7000near"));

    controller.shutdown();
    assert_eq!(controller.sink().stops.load(Ordering::SeqCst), 1);
}

#[test]
fn test_distant_quake_is_ignored() {
    let temp = TempDir::new().unwrap();
    let controller = controller(4.5);
    let mut poll = poll_loop(
        temp.path(),
        StaticFeed(vec![quake_north("us7000far", 7.2, 500.0)]),
        controller.clone(),
        300.0,
    );

    assert_eq!(poll.run_cycle(), CycleOutcome::NoNearby);
    assert_eq!(controller.state(), AlertState::Idle);
    assert_eq!(controller.sink().starts.load(Ordering::SeqCst), 0);
    assert!(!temp.path().join("last_quake.json").exists());
    assert!(!temp.path().join("earthquake_log.txt").exists());
    assert_eq!(poll.last_event_id(), None);
}

#[test]
fn test_repeated_cycles_do_not_realert_or_rewrite() {
    let temp = TempDir::new().unwrap();
    let controller = controller(4.5);
    let mut poll = poll_loop(
        temp.path(),
        StaticFeed(vec![quake_north("us1", 6.0, 20.0)]),
        controller.clone(),
        300.0,
    );

    poll.run_cycle();
    controller.acknowledge();
    let snapshot = fs::read_to_string(temp.path().join("last_quake.json")).unwrap();
    fs::remove_file(temp.path().join("last_quake.json")).unwrap();

    assert_eq!(poll.run_cycle(), CycleOutcome::Duplicate("us1".to_string()));
    assert_eq!(poll.run_cycle(), CycleOutcome::Duplicate("us1".to_string()));

    // Not written again, and the acknowledged alarm stays silent
    assert!(!temp.path().join("last_quake.json").exists());
    assert!(snapshot.contains("\"id\": \"us1\""));
    assert_eq!(controller.state(), AlertState::Idle);
    assert_eq!(controller.sink().starts.load(Ordering::SeqCst), 1);

    let log = fs::read_to_string(temp.path().join("earthquake_log.txt")).unwrap();
    assert_eq!(log.matches("=== EARTHQUAKE DETECTED").count(), 1);
}

#[test]
fn test_new_quake_during_active_alarm_is_logged_but_single_sink() {
    let temp = TempDir::new().unwrap();
    let controller = controller(4.5);
    let feed = SharedFeed::default();
    let mut poll = poll_loop(temp.path(), feed.clone(), controller.clone(), 300.0);

    feed.set(vec![quake_north("first", 5.5, 30.0)]);
    poll.run_cycle();

    feed.set(vec![quake_north("first", 5.5, 30.0), quake_north("second", 6.3, 80.0)]);
    match poll.run_cycle() {
        CycleOutcome::Reported { record, trigger } => {
            assert_eq!(record.id, "second");
            assert_eq!(trigger, Some(TriggerOutcome::AlreadyActive));
        }
        other => panic!("unexpected outcome {:?}", other),
    }

    assert_eq!(controller.sink().starts.load(Ordering::SeqCst), 1);
    assert_eq!(controller.active_event().as_deref(), Some("first"));
    assert_eq!(poll.last_event_id(), Some("second"));

    let log = fs::read_to_string(temp.path().join("earthquake_log.txt")).unwrap();
    assert_eq!(log.matches("=== EARTHQUAKE DETECTED").count(), 2);
}

#[test]
fn test_weak_nearby_quake_is_reported_without_alarm() {
    let temp = TempDir::new().unwrap();
    let controller = controller(4.5);
    let mut poll = poll_loop(
        temp.path(),
        StaticFeed(vec![
            quake_north("weak", 4.2, 10.0),
            quake_north("strong-but-far", 6.8, 450.0),
        ]),
        controller.clone(),
        300.0,
    );

    match poll.run_cycle() {
        CycleOutcome::Reported { record, trigger } => {
            assert_eq!(record.id, "weak");
            assert_eq!(trigger, None);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(controller.state(), AlertState::Idle);

    let store = JsonDedupStore::new(temp.path().join("last_quake.json"));
    assert_eq!(store.load().as_deref(), Some("weak"));
}
