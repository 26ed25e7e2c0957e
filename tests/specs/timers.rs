//! Timer-scheduling specs
//!
//! Timers are spawned like daemons but fire on a schedule: sharp timers fit
//! an interval grid, regular timers sleep from completion, idle-only timers
//! re-arm on watch events.

use crate::prelude::*;
use parking_lot::Mutex;

fn recording_timer(
    id: &str,
    interval: Option<Duration>,
    idle: Option<Duration>,
    sharp: bool,
    busy: Duration,
    firings: Arc<Mutex<Vec<Duration>>>,
    start: tokio::time::Instant,
) -> Arc<SpawningHandler> {
    let func = HandlerFn::from_async(move |_ctx| {
        let firings = firings.clone();
        async move {
            firings.lock().push(tokio::time::Instant::now() - start);
            if !busy.is_zero() {
                tokio::time::sleep(busy).await;
            }
            Ok(None)
        }
        .boxed()
    });
    Arc::new(SpawningHandler::Timer(TimerHandler {
        interval,
        idle,
        sharp,
        ..TimerHandler::new(id, func)
    }))
}

async fn stop_and_join(memory: &ResourceMemory, id: &str) {
    let daemon = memory.daemon(id).expect("record");
    daemon.stopper.set(StopReason::ResourceDeleted, SystemClock.now());
    let _ = tokio::time::timeout(Duration::from_secs(30), daemon.task.wait()).await;
}

#[tokio::test(start_paused = true)]
async fn sharp_timer_keeps_the_grid_despite_slow_handlers() {
    let (supervisor, _patcher, _leaks) = supervisor_with_clock(SystemClock);
    let memory = observed_memory(&SystemClock, "widget-1");
    let (cause, _capture) = capturing_cause(memory.resource());

    let firings = Arc::new(Mutex::new(Vec::new()));
    let handler = recording_timer(
        "tick",
        Some(parse_duration("5s").expect("declared interval")),
        None,
        true,
        Duration::from_secs(2),
        firings.clone(),
        tokio::time::Instant::now(),
    );
    supervisor
        .spawn_resource_daemons(&[handler], &cause, &memory)
        .await
        .expect("spawn");

    tokio::time::sleep(Duration::from_millis(12_500)).await;
    stop_and_join(&memory, "tick").await;

    assert_eq!(
        *firings.lock(),
        vec![Duration::ZERO, Duration::from_secs(5), Duration::from_secs(10)]
    );
}

#[tokio::test(start_paused = true)]
async fn regular_timer_drifts_with_the_handler_duration() {
    let (supervisor, _patcher, _leaks) = supervisor_with_clock(SystemClock);
    let memory = observed_memory(&SystemClock, "widget-1");
    let (cause, _capture) = capturing_cause(memory.resource());

    let firings = Arc::new(Mutex::new(Vec::new()));
    let handler = recording_timer(
        "tick",
        Some(Duration::from_secs(5)),
        None,
        false,
        Duration::from_secs(2),
        firings.clone(),
        tokio::time::Instant::now(),
    );
    supervisor
        .spawn_resource_daemons(&[handler], &cause, &memory)
        .await
        .expect("spawn");

    tokio::time::sleep(Duration::from_millis(15_500)).await;
    stop_and_join(&memory, "tick").await;

    assert_eq!(
        *firings.lock(),
        vec![Duration::ZERO, Duration::from_secs(7), Duration::from_secs(14)]
    );
}

#[tokio::test(start_paused = true)]
async fn idle_timer_fires_after_quiet_time_and_waits_for_the_next_event() {
    let (supervisor, _patcher, _leaks) = supervisor_with_clock(SystemClock);
    let memory = observed_memory(&SystemClock, "widget-1");
    let (cause, _capture) = capturing_cause(memory.resource());

    let firings = Arc::new(Mutex::new(Vec::new()));
    let handler = recording_timer(
        "tick",
        None,
        Some(Duration::from_secs(3)),
        false,
        Duration::ZERO,
        firings.clone(),
        tokio::time::Instant::now(),
    );
    supervisor
        .spawn_resource_daemons(&[handler], &cause, &memory)
        .await
        .expect("spawn");

    // Watch events at t=2 and t=4 keep deferring the first firing to t=7.
    tokio::time::sleep(Duration::from_secs(2)).await;
    memory.touch(SystemClock.now());
    tokio::time::sleep(Duration::from_secs(2)).await;
    memory.touch(SystemClock.now());
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(*firings.lock(), vec![Duration::from_secs(7)]);

    // No interval: the second firing waits for the next event (t=9), then
    // for the quiet time again (t=12).
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    memory.touch(SystemClock.now());
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(
        *firings.lock(),
        vec![Duration::from_secs(7), Duration::from_secs(12)]
    );

    stop_and_join(&memory, "tick").await;
}

#[tokio::test(start_paused = true)]
async fn timer_invocations_never_overlap() {
    let (supervisor, _patcher, _leaks) = supervisor_with_clock(SystemClock);
    let memory = observed_memory(&SystemClock, "widget-1");
    let (cause, _capture) = capturing_cause(memory.resource());

    let active = Arc::new(AtomicU32::new(0));
    let overlapped = Arc::new(AtomicU32::new(0));
    let func = {
        let active = active.clone();
        let overlapped = overlapped.clone();
        HandlerFn::from_async(move |_ctx| {
            let active = active.clone();
            let overlapped = overlapped.clone();
            async move {
                if active.fetch_add(1, Ordering::SeqCst) > 0 {
                    overlapped.fetch_add(1, Ordering::SeqCst);
                }
                // Runs longer than the interval.
                tokio::time::sleep(Duration::from_secs(3)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(None)
            }
            .boxed()
        })
    };
    let handler = Arc::new(SpawningHandler::Timer(TimerHandler {
        interval: Some(Duration::from_secs(1)),
        sharp: true,
        ..TimerHandler::new("tick", func)
    }));
    supervisor
        .spawn_resource_daemons(&[handler], &cause, &memory)
        .await
        .expect("spawn");

    tokio::time::sleep(Duration::from_secs(20)).await;
    stop_and_join(&memory, "tick").await;

    assert_eq!(overlapped.load(Ordering::SeqCst), 0);
}
