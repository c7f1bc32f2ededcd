use std::time::{Duration, Instant};

use showroom::assets::{AssetKind, AssetTracker, LoadState};

fn started(now: Instant) -> AssetTracker {
    let mut tracker = AssetTracker::new(Duration::from_secs(30));
    for kind in AssetKind::ALL {
        tracker.start_at(kind, "asset", now);
    }
    tracker
}

#[test]
fn should_settle_when_every_load_finished() {
    let now = Instant::now();
    let mut tracker = started(now);

    assert!(!tracker.all_settled());
    assert_eq!(tracker.pending().count(), 4);

    tracker.finish(AssetKind::Environment, Ok(()));
    tracker.finish(AssetKind::Model, Ok(()));
    tracker.finish(AssetKind::Lut, Err("bad grid".to_string()));
    assert!(!tracker.all_settled());
    assert_eq!(tracker.pending().collect::<Vec<_>>(), vec![AssetKind::MarkerSprite]);

    tracker.finish(AssetKind::MarkerSprite, Ok(()));
    assert!(tracker.all_settled());
    assert!(tracker.is_ready(AssetKind::Model));
    assert!(!tracker.is_ready(AssetKind::Lut));
    assert_eq!(
        tracker.state(AssetKind::Lut),
        Some(&LoadState::Failed("bad grid".to_string()))
    );
}

#[test]
fn should_flag_slow_loads_once() {
    let now = Instant::now();
    let mut tracker = started(now);
    tracker.finish(AssetKind::Model, Ok(()));

    assert!(tracker.check_timeouts(now + Duration::from_secs(29)).is_empty());

    let flagged = tracker.check_timeouts(now + Duration::from_secs(31));
    assert_eq!(flagged.len(), 3);
    assert!(!flagged.contains(&AssetKind::Model));
    assert_eq!(tracker.state(AssetKind::Lut), Some(&LoadState::TimedOut));
    assert!(tracker.all_settled());

    assert!(tracker.check_timeouts(now + Duration::from_secs(60)).is_empty());
}

#[test]
fn should_accept_late_result_after_timeout() {
    let now = Instant::now();
    let mut tracker = started(now);
    tracker.check_timeouts(now + Duration::from_secs(31));

    tracker.finish(AssetKind::Environment, Ok(()));
    assert!(tracker.is_ready(AssetKind::Environment));
}

#[test]
fn should_restart_a_load() {
    let now = Instant::now();
    let mut tracker = started(now);
    tracker.finish(AssetKind::Lut, Err("404".to_string()));

    tracker.start_at(AssetKind::Lut, "other.cube", now);
    assert_eq!(tracker.state(AssetKind::Lut), Some(&LoadState::Pending));
    assert_eq!(tracker.pending().count(), 4);
}

#[test]
fn should_ignore_unknown_results() {
    let mut tracker = AssetTracker::new(Duration::from_secs(30));
    tracker.finish(AssetKind::Model, Ok(()));

    assert_eq!(tracker.state(AssetKind::Model), None);
    assert!(tracker.all_settled());
}
