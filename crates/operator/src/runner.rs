// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-daemon guard tasks
//!
//! One runner task guards one daemon or timer for the life of its resource:
//! it honors the initial delay, drives the invocation loop, flushes
//! accumulated patches, and schedules the next tick. Whatever way a runner
//! ends (normal return, patch failure, or a forceful task abort), the
//! stopper's `Done` reason is set, so worker threads parked on the sync
//! stopper view always get released.

use crate::causes::DaemonCause;
use crate::containers::ResourceMemory;
use crate::handlers::{DaemonHandler, SpawningHandler, TimerHandler};
use crate::invocation::{deliver_results, HandlerInvoker, InvocationState};
use crate::patching::{PatchClient, PatchError};
use crate::settings::OperatorSettings;
use crate::sleeping::{sleep_or_wait, sleep_or_wait_any};
use crate::stopper::{DaemonStopper, StopReason};
use okra_core::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Everything a runner needs besides its own cause.
pub(crate) struct RunnerEnv<C: Clock> {
    pub settings: Arc<OperatorSettings>,
    pub invoker: Arc<dyn HandlerInvoker>,
    pub patcher: Arc<dyn PatchClient>,
    pub clock: C,
}

impl<C: Clock> Clone for RunnerEnv<C> {
    fn clone(&self) -> Self {
        Self {
            settings: self.settings.clone(),
            invoker: self.invoker.clone(),
            patcher: self.patcher.clone(),
            clock: self.clock.clone(),
        }
    }
}

/// Sets `Done` when the runner future is dropped, including on task abort.
struct DoneGuard<C: Clock> {
    stopper: Arc<DaemonStopper>,
    clock: C,
}

impl<C: Clock> Drop for DoneGuard<C> {
    fn drop(&mut self) {
        self.stopper.set(StopReason::Done, self.clock.now());
    }
}

/// Guard a running daemon during its life cycle.
///
/// Sync handlers are awaited to completion inside the invocation engine, so
/// aborting the runner never abandons a worker thread mid-call; the thread
/// is released through the stopper instead.
pub(crate) async fn runner<C: Clock>(
    env: RunnerEnv<C>,
    handler: Arc<SpawningHandler>,
    memory: Arc<ResourceMemory>,
    cause: DaemonCause,
) {
    let logger = cause.logger.clone();
    let _done = DoneGuard { stopper: cause.stopper.clone(), clock: env.clock.clone() };

    let result = match handler.as_ref() {
        SpawningHandler::Daemon(config) => resource_daemon(&env, &handler, config, cause).await,
        SpawningHandler::Timer(config) => {
            resource_timer(&env, &handler, config, &memory, cause).await
        }
    };

    if let Err(error) = result {
        logger.error(format!("{:?} runner failed: {}", handler.as_ref(), error));
    }
}

/// A long-running guarding task for a daemon handler.
///
/// The handler is retried on temporary failures until it finishes or the
/// stopper fires; once finished it is never restarted for this resource.
async fn resource_daemon<C: Clock>(
    env: &RunnerEnv<C>,
    handler: &SpawningHandler,
    config: &DaemonHandler,
    mut cause: DaemonCause,
) -> Result<(), PatchError> {
    let logger = cause.logger.clone();

    if config.initial_delay.is_some() {
        sleep_or_wait(config.initial_delay, &cause.stopper).await;
    }

    let mut state = InvocationState::from_scratch();
    while !cause.stopper.is_set() && !state.done() {
        let outcome = env
            .invoker
            .execute_once(&env.settings, handler, &cause, &state)
            .await;
        state = state.with_outcome(&outcome);
        deliver_results(&outcome, &mut cause.patch, &config.id);

        flush_patch(env, &mut cause).await?;

        // Nothing left to sleep towards once finished or stopped; exiting
        // without another yield lets a well-behaved daemon be observed as
        // done within the supervisor's single post-signal tick.
        if state.done() || cause.stopper.is_set() {
            break;
        }

        // The in-memory sleep does not react to resource changes, only to
        // stopping.
        sleep_or_wait(state.delay(), &cause.stopper).await;
    }

    if cause.stopper.is_set() {
        logger.debug(format!(
            "{:?} has exited on request and will not be retried or restarted.",
            handler
        ));
    } else {
        logger.debug(format!(
            "{:?} has exited on its own and will not be retried or restarted.",
            handler
        ));
    }
    Ok(())
}

/// A long-running guarding task for a timer handler.
///
/// The task mostly sleeps and calls the handler from time to time. Timers
/// track the idle-reset instant, obey the interval grid when sharp, and are
/// terminated through the stopper like daemons.
async fn resource_timer<C: Clock>(
    env: &RunnerEnv<C>,
    handler: &SpawningHandler,
    config: &TimerHandler,
    memory: &ResourceMemory,
    mut cause: DaemonCause,
) -> Result<(), PatchError> {
    if config.initial_delay.is_some() {
        sleep_or_wait(config.initial_delay, &cause.stopper).await;
    }

    let mut state = InvocationState::from_scratch();
    // NB: state.done is deliberately not part of the loop condition; it is
    // reset below so every successful firing starts its retries from scratch.
    while !cause.stopper.is_set() {
        if state.done() {
            state = InvocationState::from_scratch();
        }

        // Both now and the idle-reset instant are moving targets: the watch
        // path prolongs the sleep on every event. The sleep is never
        // shortened.
        if let Some(idle) = config.idle {
            while !cause.stopper.is_set()
                && env.clock.now().saturating_duration_since(memory.idle_reset_time()) < idle
            {
                let target = memory.idle_reset_time() + idle;
                let delay = target.saturating_duration_since(env.clock.now());
                sleep_or_wait(Some(delay), &cause.stopper).await;
            }
            if cause.stopper.is_set() {
                continue;
            }
        }

        // Remember the start for the sharp grid and the idle re-arm below.
        let started = env.clock.now();

        let outcome = env
            .invoker
            .execute_once(&env.settings, handler, &cause, &state)
            .await;
        state = state.with_outcome(&outcome);
        deliver_results(&outcome, &mut cause.patch, &config.id);

        flush_patch(env, &mut cause).await?;

        if !state.done() {
            // Failed attempt: the engine-provided retry delays override the
            // schedule.
            sleep_or_wait_any(&state.delays(), &cause.stopper).await;
        } else if let (Some(interval), true) = (config.interval, config.sharp) {
            // Sharp timers fit the interval grid regardless of how long the
            // handler ran:
            //       |-----|-----|-----|-----|-----|-----|--->  (interval=5)
            //       [slow_handler]....[slow_handler]....[slow...
            let passed = env.clock.now().saturating_duration_since(started);
            sleep_or_wait(Some(remaining_to_grid(passed, interval)), &cause.stopper).await;
        } else if let Some(interval) = config.interval {
            // Regular timers sleep the full interval from this completion:
            //       |-----|-----|-----|-----|-----|-----|--->  (interval=5)
            //       [slow_handler].....[slow_handler].....[slow...
            sleep_or_wait(Some(interval), &cause.stopper).await;
        } else if let Some(idle) = config.idle {
            // Idle-only timers re-arm on the next watch event.
            while !cause.stopper.is_set() && memory.idle_reset_time() <= started {
                sleep_or_wait(Some(idle), &cause.stopper).await;
            }
        } else {
            // No interval and no idling: practically meaningless, but
            // technically possible. A one-shot.
            break;
        }
    }
    Ok(())
}

async fn flush_patch<C: Clock>(
    env: &RunnerEnv<C>,
    cause: &mut DaemonCause,
) -> Result<(), PatchError> {
    if !cause.patch.is_empty() {
        cause.logger.debug(format!("Patching with: {}", cause.patch));
        env.patcher
            .patch_obj(&cause.resource, &cause.patch, &cause.body)
            .await?;
        cause.patch.clear();
    }
    Ok(())
}

/// Time left until the next grid line: `interval − (passed mod interval)`.
fn remaining_to_grid(passed: Duration, interval: Duration) -> Duration {
    if interval.is_zero() {
        return Duration::ZERO;
    }
    let rem = passed.as_nanos() % interval.as_nanos();
    interval.saturating_sub(Duration::from_nanos(rem as u64))
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
