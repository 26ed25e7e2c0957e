// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn-once registry and the two termination protocols
//!
//! Spawning is idempotent per `(resource, daemon_id)`: handling cycles may
//! call it any number of times and only the first sighting of a handler
//! creates a runner task.
//!
//! Termination exists twice on purpose. Resource deletion happens in
//! parallel with user deletion handlers and finalizer removal, so it is a
//! state machine re-entered on every handling cycle, reporting how soon to
//! come back. Operator shutdown has nothing to cooperate with, so it is a
//! plain linear wait. Both walk the same phase ladder: signalled →
//! cancelled → abandoned.

use crate::causes::{DaemonCause, SpawningCause};
use crate::containers::{Daemon, DaemonTask, ResourceMemory};
use crate::error::SupervisorError;
use crate::handlers::SpawningHandler;
use crate::invocation::HandlerInvoker;
use crate::leaks::LeakSink;
use crate::patching::PatchClient;
use crate::runner::{runner, RunnerEnv};
use crate::settings::OperatorSettings;
use crate::stopper::{DaemonStopper, StopReason};
use okra_core::{Clock, DaemonId, Patch, ResourceRef, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// How often a deletion re-checks daemons that have no termination
/// deadlines of their own (all timers, daemons without backoff/timeout).
pub const DAEMON_POLLING_INTERVAL: Duration = Duration::from_secs(60);

/// External collaborators of the supervisor.
pub struct SupervisorDeps {
    pub invoker: Arc<dyn HandlerInvoker>,
    pub patcher: Arc<dyn PatchClient>,
    pub leaks: Arc<dyn LeakSink>,
}

/// Per-resource daemon supervisor.
pub struct DaemonSupervisor<C: Clock = SystemClock> {
    settings: Arc<OperatorSettings>,
    deps: SupervisorDeps,
    clock: C,
}

impl DaemonSupervisor<SystemClock> {
    pub fn new(settings: OperatorSettings, deps: SupervisorDeps) -> Self {
        Self::with_clock(settings, deps, SystemClock)
    }
}

impl<C: Clock + 'static> DaemonSupervisor<C> {
    pub fn with_clock(settings: OperatorSettings, deps: SupervisorDeps, clock: C) -> Self {
        Self { settings: Arc::new(settings), deps, clock }
    }

    pub fn settings(&self) -> &OperatorSettings {
        &self.settings
    }

    /// Ensure that all daemons are spawned for this individual resource.
    ///
    /// Idempotent across handling cycles: already-present ids are untouched
    /// and no duplicate side effects occur. Fails only when the memory has
    /// never observed a body; the processing layer guarantees one before
    /// spawning, so a missing body is a programming error.
    pub async fn spawn_resource_daemons(
        &self,
        handlers: &[Arc<SpawningHandler>],
        cause: &SpawningCause,
        memory: &Arc<ResourceMemory>,
    ) -> Result<Vec<Duration>, SupervisorError> {
        let body = memory
            .live_fresh_body()
            .ok_or(SupervisorError::MissingLiveBody)?;

        for handler in handlers {
            let daemon_id = handler.id().clone();
            memory.insert_daemon_if_absent(daemon_id, || {
                let stopper = DaemonStopper::new();
                let daemon_cause = DaemonCause {
                    resource: cause.resource.clone(),
                    logger: cause.logger.clone(),
                    body: body.clone(),
                    memo: memory.memo(),
                    // Not the same as the one-shot spawning patch!
                    patch: Patch::new(),
                    stopper: stopper.clone(),
                };
                let env = RunnerEnv {
                    settings: self.settings.clone(),
                    invoker: self.deps.invoker.clone(),
                    patcher: self.deps.patcher.clone(),
                    clock: self.clock.clone(),
                };
                let task =
                    tokio::spawn(runner(env, handler.clone(), memory.clone(), daemon_cause));
                Arc::new(Daemon {
                    handler: handler.clone(),
                    stopper,
                    logger: cause.logger.clone(),
                    task: DaemonTask::new(task),
                })
            });
        }
        Ok(Vec::new())
    }

    /// Terminate all daemons of an individual resource, gradually.
    ///
    /// Called repeatedly while the resource is being deleted, in parallel
    /// with user deletion handlers; the finalizer is removed only when both
    /// are through. Each call advances every daemon's termination phase
    /// according to the age of its stopping signal and returns the delays
    /// after which the next check is due. The caller merges them with its
    /// other pending delays; an empty set means nothing is left to wait for.
    pub async fn stop_resource_daemons(&self, memory: &ResourceMemory) -> Vec<Duration> {
        let mut delays: Vec<Duration> = Vec::new();
        let now = self.clock.now();
        for (daemon_id, daemon) in memory.snapshot_daemons() {
            let logger = &daemon.logger;
            let stopper = &daemon.stopper;
            let age = now.saturating_duration_since(stopper.when().unwrap_or(now));

            let (backoff, timeout, polling) = match daemon.handler.as_ref() {
                SpawningHandler::Daemon(config) => (
                    config.cancellation_backoff,
                    config.cancellation_timeout,
                    config.cancellation_polling.unwrap_or(DAEMON_POLLING_INTERVAL),
                ),
                // Timers have no termination deadlines; they are expected to
                // be short and are only polled until they exit on their own.
                SpawningHandler::Timer(_) => (None, None, DAEMON_POLLING_INTERVAL),
            };

            // Whatever happens with other flags & logs & timings, this flag
            // must be surely set.
            stopper.set(StopReason::ResourceDeleted, now);

            // A well-written daemon exits instantly on the signal. Give the
            // event loop one extra cycle so that case needs no patching and
            // no extra handling cycles.
            tokio::task::yield_now().await;

            if daemon.task.is_finished() {
                // Terminated on its own or by an earlier phase; nothing to
                // wait for anymore.
            } else if let Some(backoff) = backoff.filter(|b| age < *b) {
                if !stopper.is_set_reason(StopReason::DaemonSignalled) {
                    stopper.set(StopReason::DaemonSignalled, now);
                    logger.debug(format!(
                        "Daemon {:?} is signalled to exit gracefully.",
                        daemon_id.as_str()
                    ));
                }
                delays.push(backoff - age);
            } else if let Some(deadline) = timeout.map(|t| t + backoff.unwrap_or_default()) {
                // The forceful phase is entered at least once even when its
                // window has already lapsed (backoff = timeout = 0), so a
                // daemon is always cancelled before it can be abandoned.
                if age < deadline || !stopper.is_set_reason(StopReason::DaemonCancelled) {
                    if !stopper.is_set_reason(StopReason::DaemonCancelled) {
                        stopper.set(StopReason::DaemonCancelled, now);
                        logger.debug(format!(
                            "Daemon {:?} is signalled to exit by force.",
                            daemon_id.as_str()
                        ));
                        daemon.task.abort();
                    }
                    delays.push(deadline.saturating_sub(age));
                } else if !stopper.is_set_reason(StopReason::DaemonAbandoned) {
                    stopper.set(StopReason::DaemonAbandoned, now);
                    logger.warning(format!(
                        "Daemon {:?} did not exit in time. Leaving it orphaned.",
                        daemon_id.as_str()
                    ));
                    self.deps.leaks.daemon_abandoned(memory.resource(), &daemon_id);
                }
            } else {
                logger.debug(format!(
                    "Daemon {:?} is still exiting. Next check is in {:?}.",
                    daemon_id.as_str(),
                    polling
                ));
                delays.push(polling);
            }
        }
        delays
    }

    /// Stop a single daemon on operator exit.
    ///
    /// Same phase ladder as the deletion protocol, but linear: there are no
    /// handling cycles to report delays to, so the waits happen in place.
    pub async fn stop_daemon(
        &self,
        resource: &ResourceRef,
        daemon_id: &DaemonId,
        daemon: &Daemon,
    ) {
        let (backoff, timeout) = match daemon.handler.as_ref() {
            SpawningHandler::Daemon(config) => {
                (config.cancellation_backoff, config.cancellation_timeout)
            }
            SpawningHandler::Timer(_) => (None, None),
        };

        // Whatever happens with other flags & logs & timings, this flag must
        // be surely set, and the daemon gets a chance to exit instantly.
        daemon
            .stopper
            .set(StopReason::OperatorExiting, self.clock.now());
        tokio::task::yield_now().await;
        if daemon.task.is_finished() {
            daemon.logger.debug(format!(
                "Daemon {:?} has exited gracefully.",
                daemon_id.as_str()
            ));
        }

        if !daemon.task.is_finished() {
            if let Some(backoff) = backoff {
                daemon
                    .stopper
                    .set(StopReason::DaemonSignalled, self.clock.now());
                daemon.logger.debug(format!(
                    "Daemon {:?} is signalled to exit gracefully.",
                    daemon_id.as_str()
                ));
                let _ = tokio::time::timeout(backoff, daemon.task.wait()).await;
            }
        }

        if !daemon.task.is_finished() {
            if let Some(timeout) = timeout {
                daemon
                    .stopper
                    .set(StopReason::DaemonCancelled, self.clock.now());
                daemon.logger.debug(format!(
                    "Daemon {:?} is signalled to exit by force.",
                    daemon_id.as_str()
                ));
                daemon.task.abort();
                let _ = tokio::time::timeout(timeout, daemon.task.wait()).await;
            }
        }

        if !daemon.task.is_finished() {
            daemon
                .stopper
                .set(StopReason::DaemonAbandoned, self.clock.now());
            daemon.logger.warning(format!(
                "Daemon {:?} did not exit in time. Leaving it orphaned.",
                daemon_id.as_str()
            ));
            self.deps.leaks.daemon_abandoned(resource, daemon_id);
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
