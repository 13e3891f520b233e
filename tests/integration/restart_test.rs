// Deduplication across process restarts

use super::common::{controller, poll_loop, quake_north, StaticFeed};
use quakewatch::core::{AlertState, CycleOutcome, JsonDedupStore};
use std::fs;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

#[test]
fn test_restart_does_not_realert_known_event() {
    let temp = TempDir::new().unwrap();
    let feed = vec![quake_north("us6000abc", 5.8, 120.0)];

    {
        let first_run = controller(4.5);
        let mut poll = poll_loop(temp.path(), StaticFeed(feed.clone()), first_run.clone(), 300.0);
        assert!(matches!(poll.run_cycle(), CycleOutcome::Reported { .. }));
        assert_eq!(first_run.state(), AlertState::Active);
        first_run.shutdown();
    }

    let second_run = controller(4.5);
    let mut poll = poll_loop(temp.path(), StaticFeed(feed), second_run.clone(), 300.0);

    assert_eq!(poll.last_event_id(), Some("us6000abc"));
    assert_eq!(
        poll.run_cycle(),
        CycleOutcome::Duplicate("us6000abc".to_string())
    );
    assert_eq!(second_run.state(), AlertState::Idle);
    assert_eq!(second_run.sink().starts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_corrupt_record_is_treated_as_empty() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("last_quake.json"), "not json at all").unwrap();

    let controller = controller(4.5);
    let mut poll = poll_loop(
        temp.path(),
        StaticFeed(vec![quake_north("us6000xyz", 4.9, 60.0)]),
        controller.clone(),
        300.0,
    );

    assert_eq!(poll.last_event_id(), None);
    assert!(matches!(poll.run_cycle(), CycleOutcome::Reported { .. }));
    assert_eq!(controller.state(), AlertState::Active);

    // The corrupt file has been replaced by a valid record
    let record = JsonDedupStore::new(temp.path().join("last_quake.json"))
        .read_record()
        .unwrap()
        .unwrap();
    assert_eq!(record.id, "us6000xyz");
    assert_eq!(record.magnitude, 4.9);
}
