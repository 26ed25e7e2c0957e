//! Spawn-once specs
//!
//! Spawning is idempotent per (resource, daemon id): handling cycles may
//! repeat it freely without duplicating daemons or side effects.

use crate::prelude::*;
use serde_json::json;

#[tokio::test(start_paused = true)]
async fn spawning_twice_produces_exactly_one_daemon() {
    let (supervisor, _patcher, _leaks) = supervisor_with_clock(SystemClock);
    let memory = observed_memory(&SystemClock, "widget-1");
    let (cause, _capture) = capturing_cause(memory.resource());

    let runs = Arc::new(AtomicU32::new(0));
    let handler = Arc::new(SpawningHandler::Daemon(DaemonHandler::new(
        "monitor",
        counting_handler(runs.clone()),
    )));

    for _ in 0..2 {
        let delays = supervisor
            .spawn_resource_daemons(&[handler.clone()], &cause, &memory)
            .await
            .expect("spawn must succeed with an observed body");
        assert!(delays.is_empty(), "spawn is instantaneous");
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(memory.daemon_count(), 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1, "the second spawn must be a no-op");
}

#[tokio::test]
async fn spawning_without_an_observed_body_fails_loudly() {
    let clock = FakeClock::new();
    let (supervisor, _patcher, _leaks) = supervisor_with_clock(clock.clone());
    let resource = test_resource("widget-1");
    let memory = Arc::new(ResourceMemory::new(resource.clone(), clock.now()));
    let (cause, _capture) = capturing_cause(&resource);

    let result = supervisor
        .spawn_resource_daemons(
            &[daemon_with_budgets("monitor", None, None)],
            &cause,
            &memory,
        )
        .await;
    assert!(matches!(result, Err(SupervisorError::MissingLiveBody)));
}

#[tokio::test(start_paused = true)]
async fn daemon_results_are_patched_to_the_cluster() {
    let (supervisor, patcher, _leaks) = supervisor_with_clock(SystemClock);
    let memory = observed_memory(&SystemClock, "widget-1");
    let (cause, _capture) = capturing_cause(memory.resource());

    let handler = Arc::new(SpawningHandler::Daemon(DaemonHandler::new(
        "monitor",
        HandlerFn::from_async(|_ctx| async { Ok(Some(json!({"phase": "ready"}))) }.boxed()),
    )));
    supervisor
        .spawn_resource_daemons(&[handler], &cause, &memory)
        .await
        .expect("spawn");

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
        patcher.applied(),
        vec![json!({"status": {"monitor": {"phase": "ready"}}})]
    );

    // The daemon ran to success once and is done for good; its record stays.
    let daemon = memory.daemon("monitor").expect("record stays after exit");
    assert!(daemon.stopper.is_set_reason(StopReason::Done));
    assert!(daemon.task.is_finished());
}

// Real time here: the worker thread parks on a condvar the paused clock
// cannot see.
#[tokio::test]
async fn sync_daemons_get_the_blocking_stopper_view() {
    let (supervisor, _patcher, _leaks) = supervisor_with_clock(SystemClock);
    let memory = observed_memory(&SystemClock, "widget-1");
    let (cause, _capture) = capturing_cause(memory.resource());

    let handler = Arc::new(SpawningHandler::Daemon(DaemonHandler::new(
        "sync-monitor",
        HandlerFn::from_sync(|ctx| {
            // Worker thread: waits until the stopper is set, then exits.
            while !ctx.stopper.wait_for(Duration::from_millis(50)) {}
            Ok(None)
        }),
    )));
    supervisor
        .spawn_resource_daemons(&[handler], &cause, &memory)
        .await
        .expect("spawn");
    tokio::task::yield_now().await;

    let daemon = memory.daemon("sync-monitor").expect("record exists");
    daemon.stopper.set(StopReason::ResourceDeleted, SystemClock.now());

    tokio::time::timeout(Duration::from_secs(5), daemon.task.wait())
        .await
        .expect("sync daemon must observe the stopper and exit");
    assert!(daemon.stopper.is_set_reason(StopReason::Done));
}
