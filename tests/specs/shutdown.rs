//! Operator-shutdown specs
//!
//! The killer idles for the operator's whole life, then terminates every
//! daemon of every resource concurrently and returns only when all
//! terminations are through.

use crate::prelude::*;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn shutdown_stops_cooperative_and_stuck_daemons() {
    let (supervisor, _patcher, leaks) = supervisor_with_clock(SystemClock);
    let supervisor = Arc::new(supervisor);
    let memories = Arc::new(ResourceMemories::new());

    let resource = test_resource("widget-1");
    let memory = memories.recall(&resource, SystemClock.now());
    memory.set_live_fresh_body(Arc::new(test_body(&resource)));
    let (cause, _capture) = capturing_cause(&resource);

    supervisor
        .spawn_resource_daemons(
            &[daemon_with_budgets(
                "cooperative",
                Some(Duration::from_secs(30)),
                Some(Duration::from_secs(30)),
            )],
            &cause,
            &memory,
        )
        .await
        .expect("spawn");
    tokio::task::yield_now().await;

    let stuck = insert_unstoppable(
        &memory,
        daemon_with_budgets(
            "stuck",
            Some(Duration::from_secs(2)),
            Some(Duration::from_secs(3)),
        ),
    );

    let token = CancellationToken::new();
    let killer = {
        let supervisor = supervisor.clone();
        let memories = memories.clone();
        let token = token.clone();
        tokio::spawn(async move { supervisor.daemon_killer(&memories, token).await })
    };
    tokio::task::yield_now().await;

    let start = tokio::time::Instant::now();
    token.cancel();
    tokio::time::timeout(Duration::from_secs(120), killer)
        .await
        .expect("killer must return")
        .expect("killer must not panic");

    // The cooperative daemon exits on the signal; the stuck one is walked
    // through backoff (2s) and timeout (3s) before being abandoned.
    assert_eq!(tokio::time::Instant::now() - start, Duration::from_secs(5));

    let cooperative = memory.daemon("cooperative").expect("record");
    assert!(cooperative.stopper.is_set_reason(StopReason::OperatorExiting));
    assert!(cooperative.stopper.is_set_reason(StopReason::Done));
    assert!(!cooperative.stopper.is_set_reason(StopReason::DaemonAbandoned));

    assert!(stuck.is_set_reason(StopReason::OperatorExiting));
    assert!(stuck.is_set_reason(StopReason::DaemonSignalled));
    assert!(stuck.is_set_reason(StopReason::DaemonCancelled));
    assert!(stuck.is_set_reason(StopReason::DaemonAbandoned));
    assert_eq!(leaks.abandoned_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_covers_daemons_across_resources() {
    let (supervisor, _patcher, _leaks) = supervisor_with_clock(SystemClock);
    let supervisor = Arc::new(supervisor);
    let memories = Arc::new(ResourceMemories::new());

    let mut stoppers = Vec::new();
    for name in ["widget-1", "widget-2", "widget-3"] {
        let resource = test_resource(name);
        let memory = memories.recall(&resource, SystemClock.now());
        memory.set_live_fresh_body(Arc::new(test_body(&resource)));
        let (cause, _capture) = capturing_cause(&resource);
        supervisor
            .spawn_resource_daemons(
                &[daemon_with_budgets("monitor", Some(Duration::from_secs(60)), None)],
                &cause,
                &memory,
            )
            .await
            .expect("spawn");
        tokio::task::yield_now().await;
        stoppers.push(memory.daemon("monitor").expect("record").stopper.clone());
    }

    let token = CancellationToken::new();
    token.cancel();
    supervisor.daemon_killer(&memories, token).await;

    for stopper in stoppers {
        assert!(stopper.is_set_reason(StopReason::OperatorExiting));
        assert!(stopper.is_set_reason(StopReason::Done));
    }
}
