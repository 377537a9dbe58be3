mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Harness, Recorder};
use drive_session::power::PowerState;
use drive_session::SessionState;

async fn wait_for(recorder: &Recorder, expected: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while recorder.len() < expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("worker did not apply queued power states in time");
}

#[tokio::test]
async fn test_queued_states_wait_for_drain() {
    let harness = Harness::new(PowerState::On);
    let (controller, mut worker) = harness.builder().build_queued().unwrap();
    let recorder = Arc::new(Recorder::default());
    controller.register_callback(recorder.clone());

    // init applies the current state directly.
    controller.init_session();
    assert_eq!(recorder.len(), 1);

    harness.power.set_state(PowerState::ShutdownPrepare);
    assert_eq!(recorder.len(), 1, "callback only enqueues");

    assert_eq!(worker.drain(), 1);
    assert_eq!(recorder.len(), 2);
    assert_eq!(recorder.seen()[1].session_state, SessionState::ExitDrivingSession);
    assert_eq!(worker.drain(), 0);
}

#[tokio::test]
async fn test_worker_applies_in_arrival_order() {
    let harness = Harness::new(PowerState::WaitForVhal);
    let (controller, worker) = harness.builder().build_queued().unwrap();
    let recorder = Arc::new(Recorder::default());
    controller.register_callback(recorder.clone());
    controller.init_session();

    let handle = tokio::spawn(worker.run());
    for state in [
        PowerState::On,
        PowerState::ShutdownPrepare,
        PowerState::SuspendEnter,
        PowerState::On,
        PowerState::On,
        PowerState::ShutdownPrepare,
    ] {
        harness.power.set_state(state);
    }

    wait_for(&recorder, 4).await;
    let seen: Vec<(i32, SessionState)> = recorder
        .seen()
        .iter()
        .map(|a| (a.session_id, a.session_state))
        .collect();
    assert_eq!(
        seen,
        vec![
            (1, SessionState::EnterDrivingSession),
            (1, SessionState::ExitDrivingSession),
            (2, SessionState::EnterDrivingSession),
            (2, SessionState::ExitDrivingSession),
        ]
    );

    controller.release();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("worker should stop after release")
        .unwrap();
}

#[tokio::test]
async fn test_burst_before_drain_loses_nothing() {
    let harness = Harness::new(PowerState::WaitForVhal);
    let (controller, mut worker) = harness.builder().build_queued().unwrap();
    let recorder = Arc::new(Recorder::default());
    controller.register_callback(recorder.clone());
    controller.init_session();

    // Far more than any fixed queue bound would hold.
    let burst = 200;
    for _ in 0..burst {
        harness.power.set_state(PowerState::On);
        harness.power.set_state(PowerState::ShutdownPrepare);
    }

    assert_eq!(recorder.len(), 0, "callbacks only enqueue");
    assert_eq!(worker.drain(), burst * 2);
    assert_eq!(recorder.len(), burst * 2, "every transition is announced");

    let seen = recorder.seen();
    let last = seen.last().unwrap();
    assert_eq!(last.session_id, burst as i32);
    assert_eq!(last.session_state, SessionState::ExitDrivingSession);
    assert_eq!(controller.session_annotation().session_state, SessionState::ExitDrivingSession);
}

#[tokio::test]
async fn test_dropping_controller_stops_worker() {
    let harness = Harness::new(PowerState::WaitForVhal);
    let (controller, worker) = harness.builder().build_queued().unwrap();
    controller.init_session();
    let handle = tokio::spawn(worker.run());

    drop(controller);
    assert_eq!(harness.power.listener_count(), 0);
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("worker should stop once the controller is gone")
        .unwrap();
}

#[tokio::test]
async fn test_drain_after_release_applies_nothing() {
    let harness = Harness::new(PowerState::WaitForVhal);
    let (controller, mut worker) = harness.builder().build_queued().unwrap();
    let recorder = Arc::new(Recorder::default());
    controller.register_callback(recorder.clone());
    controller.init_session();

    harness.power.set_state(PowerState::On);
    controller.release();

    assert_eq!(worker.drain(), 0);
    assert_eq!(recorder.len(), 0);
}
