// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handler invocation and per-invocation retry state
//!
//! The runner treats invocations as opaque: it executes the handler once,
//! folds the outcome into its state, and only ever reads `done` and the next
//! delay. Sync handlers run on a bounded worker pool; async handlers run
//! inline on the event loop.

use crate::causes::DaemonCause;
use crate::handlers::{
    DaemonContext, HandlerFailure, HandlerFn, SpawningHandler, SyncDaemonContext,
};
use crate::settings::OperatorSettings;
use crate::stopper::{AsyncStopperChecker, SyncStopperChecker};
use async_trait::async_trait;
use okra_core::{DaemonId, Patch};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// The opaque result of one handler invocation.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success { result: Option<Value> },
    Temporary { message: String, delay: Duration },
    Permanent { message: String },
}

/// Retry state of a single handler across invocation attempts.
///
/// Consumed-and-rebuilt on every fold, never mutated in place, so a runner
/// holding a stale state cannot observe a half-applied transition.
#[derive(Debug, Clone)]
pub struct InvocationState {
    retries: u32,
    done: bool,
    delay: Option<Duration>,
}

impl InvocationState {
    /// Fresh state: nothing attempted, nothing scheduled.
    pub fn from_scratch() -> Self {
        Self { retries: 0, done: false, delay: None }
    }

    /// Fold an outcome in: success finishes the handler, a temporary failure
    /// schedules a retry, a permanent failure finishes it with no retry.
    pub fn with_outcome(self, outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success { .. } => Self {
                retries: self.retries + 1,
                done: true,
                delay: None,
            },
            Outcome::Temporary { delay, .. } => Self {
                retries: self.retries + 1,
                done: false,
                delay: Some(*delay),
            },
            Outcome::Permanent { .. } => Self {
                retries: self.retries + 1,
                done: true,
                delay: None,
            },
        }
    }

    pub fn done(&self) -> bool {
        self.done
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// The delay set for the next attempt; empty when none is scheduled.
    pub fn delays(&self) -> Vec<Duration> {
        self.delay.into_iter().collect()
    }
}

impl Default for InvocationState {
    fn default() -> Self {
        Self::from_scratch()
    }
}

/// Deliver a success result fragment into the patch, keyed by handler id.
pub fn deliver_results(outcome: &Outcome, patch: &mut Patch, id: &DaemonId) {
    if let Outcome::Success { result: Some(value) } = outcome {
        patch.status_mut().insert(id.to_string(), value.clone());
    }
}

/// The invocation engine boundary consumed by runners.
#[async_trait]
pub trait HandlerInvoker: Send + Sync {
    /// Execute the handler exactly once and classify what happened.
    async fn execute_once(
        &self,
        settings: &OperatorSettings,
        handler: &SpawningHandler,
        cause: &DaemonCause,
        state: &InvocationState,
    ) -> Outcome;
}

/// Production invoker.
///
/// Async callbacks run inline; sync callbacks are offloaded to
/// `spawn_blocking` under a semaphore sized from the execution settings, so
/// many slow sync daemons cannot exhaust the blocking pool.
pub struct DefaultInvoker {
    sync_workers: Arc<Semaphore>,
}

impl DefaultInvoker {
    pub fn new(settings: &OperatorSettings) -> Self {
        Self {
            sync_workers: Arc::new(Semaphore::new(settings.execution.max_sync_workers.max(1))),
        }
    }
}

#[async_trait]
impl HandlerInvoker for DefaultInvoker {
    async fn execute_once(
        &self,
        _settings: &OperatorSettings,
        handler: &SpawningHandler,
        cause: &DaemonCause,
        state: &InvocationState,
    ) -> Outcome {
        let result = match handler.func() {
            HandlerFn::Async(func) => {
                let ctx = DaemonContext {
                    resource: cause.resource.clone(),
                    body: cause.body.clone(),
                    memo: cause.memo.clone(),
                    logger: cause.logger.clone(),
                    stopper: AsyncStopperChecker::new(cause.stopper.clone()),
                    retry: state.retries(),
                };
                func(ctx).await
            }
            HandlerFn::Sync(func) => {
                let ctx = SyncDaemonContext {
                    resource: cause.resource.clone(),
                    body: cause.body.clone(),
                    memo: cause.memo.clone(),
                    logger: cause.logger.clone(),
                    stopper: SyncStopperChecker::new(cause.stopper.clone()),
                    retry: state.retries(),
                };
                let func = func.clone();
                // The semaphore is never closed; a failed acquire only means
                // an unbounded pool, not a skipped invocation.
                let permit = self.sync_workers.clone().acquire_owned().await.ok();
                match tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    func(ctx)
                })
                .await
                {
                    Ok(result) => result,
                    Err(join_error) => Err(HandlerFailure::permanent(format!(
                        "handler thread failed: {}",
                        join_error
                    ))),
                }
            }
        };

        let id = handler.id();
        match result {
            Ok(result) => {
                cause.logger.debug(format!("Handler {:?} succeeded.", id.as_str()));
                Outcome::Success { result }
            }
            Err(HandlerFailure::Temporary { message, delay }) => {
                cause.logger.debug(format!(
                    "Handler {:?} failed temporarily: {} (retry in {:?})",
                    id.as_str(),
                    message,
                    delay
                ));
                Outcome::Temporary { message, delay }
            }
            Err(HandlerFailure::Permanent { message }) => {
                cause.logger.error(format!(
                    "Handler {:?} failed permanently: {}",
                    id.as_str(),
                    message
                ));
                Outcome::Permanent { message }
            }
        }
    }
}

#[cfg(test)]
#[path = "invocation_tests.rs"]
mod tests;
