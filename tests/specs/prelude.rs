//! Shared fixtures for the workspace specs

pub use futures_util::FutureExt;
pub use okra_core::{parse_duration, Clock, DaemonId, FakeClock, SystemClock};
pub use okra_operator::test_support::{
    capturing_cause, counting_handler, test_body, test_resource, well_behaved_daemon_fn,
    FakeLeakSink, FakePatchClient,
};
pub use okra_operator::{
    Daemon, DaemonHandler, DaemonSupervisor, DaemonStopper, DaemonTask, DefaultInvoker,
    HandlerFailure, HandlerFn, ObjectLogger, OperatorSettings, ResourceMemories, ResourceMemory,
    SpawningHandler, StopReason, SupervisorDeps, SupervisorError, TimerHandler,
    DAEMON_POLLING_INTERVAL,
};
pub use std::sync::atomic::{AtomicU32, Ordering};
pub use std::sync::Arc;
pub use std::time::Duration;

/// A supervisor over fake collaborators, with the given clock.
pub fn supervisor_with_clock<C: Clock + 'static>(
    clock: C,
) -> (DaemonSupervisor<C>, Arc<FakePatchClient>, Arc<FakeLeakSink>) {
    let settings = OperatorSettings::default();
    let patcher = FakePatchClient::new();
    let leaks = FakeLeakSink::new();
    let deps = SupervisorDeps {
        invoker: Arc::new(DefaultInvoker::new(&settings)),
        patcher: patcher.clone(),
        leaks: leaks.clone(),
    };
    (DaemonSupervisor::with_clock(settings, deps, clock), patcher, leaks)
}

/// A memory with an observed body, as the processing loop guarantees before
/// any spawn.
pub fn observed_memory<C: Clock>(clock: &C, name: &str) -> Arc<ResourceMemory> {
    let resource = test_resource(name);
    let memory = Arc::new(ResourceMemory::new(resource.clone(), clock.now()));
    memory.set_live_fresh_body(Arc::new(test_body(&resource)));
    memory
}

/// Insert a daemon record whose task ignores cancellation, standing in for
/// a daemon stuck in a worker thread.
pub fn insert_unstoppable(
    memory: &ResourceMemory,
    handler: Arc<SpawningHandler>,
) -> Arc<DaemonStopper> {
    let stopper = DaemonStopper::new();
    let logger = ObjectLogger::new(memory.resource());
    memory.insert_daemon_if_absent(handler.id().clone(), || {
        Arc::new(Daemon {
            handler: handler.clone(),
            stopper: stopper.clone(),
            logger,
            task: DaemonTask::unstoppable(),
        })
    });
    stopper
}

/// A daemon descriptor with the given termination budgets.
pub fn daemon_with_budgets(
    id: &str,
    backoff: Option<Duration>,
    timeout: Option<Duration>,
) -> Arc<SpawningHandler> {
    Arc::new(SpawningHandler::Daemon(DaemonHandler {
        cancellation_backoff: backoff,
        cancellation_timeout: timeout,
        ..DaemonHandler::new(id, well_behaved_daemon_fn())
    }))
}
