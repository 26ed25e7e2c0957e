// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative stop signal shared between a daemon and its supervisor.
//!
//! A stopper carries a *set* of stopping reasons rather than a single flag:
//! the supervisor escalates through the reasons (deletion/exit → signalled →
//! cancelled → abandoned) while the daemon only has to ask "should I stop?".
//! The instant of the first set is recorded so the termination protocols can
//! measure the stopping age against the configured grace periods.
//!
//! User code never receives the stopper itself, only one of the query-only
//! views: [`AsyncStopperChecker`] for async handlers (suspending wait) and
//! [`SyncStopperChecker`] for sync handlers running on worker threads
//! (blocking wait).

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Why a daemon is being asked (or forced) to stop.
///
/// The values form a bit alphabet; a stopper accumulates them over the
/// termination protocol and never clears them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StopReason {
    /// The resource the daemon belongs to is being deleted.
    ResourceDeleted = 0b00_0001,
    /// The operator itself is shutting down.
    OperatorExiting = 0b00_0010,
    /// The graceful-exit phase: the daemon was asked to stop.
    DaemonSignalled = 0b00_0100,
    /// The forceful phase: the daemon's task was cancelled.
    DaemonCancelled = 0b00_1000,
    /// The daemon outlived its termination deadline and is left orphaned.
    DaemonAbandoned = 0b01_0000,
    /// The runner has exited; set on every exit path without exception.
    Done = 0b10_0000,
}

#[derive(Default)]
struct StopperState {
    reasons: u8,
    when: Option<Instant>,
}

/// The shared stop signal for one daemon.
///
/// Reasons are only ever set from the event loop; reads and waits may happen
/// from worker threads. Async waiters are woken through a watch channel,
/// sync waiters through a condvar.
pub struct DaemonStopper {
    state: Mutex<StopperState>,
    condvar: Condvar,
    tx: watch::Sender<bool>,
}

impl DaemonStopper {
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = watch::channel(false);
        Arc::new(Self {
            state: Mutex::new(StopperState::default()),
            condvar: Condvar::new(),
            tx,
        })
    }

    /// Add a reason to the set. Idempotent per reason.
    ///
    /// The first set of *any* reason records `now` as the stopping instant;
    /// it never moves afterwards. All waiters are woken.
    pub fn set(&self, reason: StopReason, now: Instant) {
        {
            let mut state = self.state.lock();
            if state.reasons == 0 {
                state.when = Some(now);
            }
            state.reasons |= reason as u8;
        }
        self.condvar.notify_all();
        let _ = self.tx.send(true);
    }

    /// Whether any reason is set.
    pub fn is_set(&self) -> bool {
        self.state.lock().reasons != 0
    }

    /// Whether the given reason is set.
    pub fn is_set_reason(&self, reason: StopReason) -> bool {
        self.state.lock().reasons & (reason as u8) != 0
    }

    /// The instant of the first set, or None while unset.
    pub fn when(&self) -> Option<Instant> {
        self.state.lock().when
    }

    /// Suspend until any reason is set.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Suspend until any reason is set or the timeout elapses; returns
    /// whether the stopper became set.
    pub async fn wait_for(&self, timeout: Duration) -> bool {
        if self.is_set() {
            return true;
        }
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }

    /// Block the current thread until any reason is set or the timeout
    /// elapses; returns whether the stopper became set. For worker threads
    /// only; never call from the event loop.
    pub fn wait_for_blocking(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.reasons == 0 {
            if self.condvar.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        state.reasons != 0
    }
}

/// Query-only stopper view for async daemon functions.
#[derive(Clone)]
pub struct AsyncStopperChecker {
    stopper: Arc<DaemonStopper>,
}

impl AsyncStopperChecker {
    pub(crate) fn new(stopper: Arc<DaemonStopper>) -> Self {
        Self { stopper }
    }

    pub fn is_set(&self) -> bool {
        self.stopper.is_set()
    }

    pub fn is_set_reason(&self, reason: StopReason) -> bool {
        self.stopper.is_set_reason(reason)
    }

    pub fn when(&self) -> Option<Instant> {
        self.stopper.when()
    }

    pub async fn wait(&self) {
        self.stopper.wait().await;
    }

    pub async fn wait_for(&self, timeout: Duration) -> bool {
        self.stopper.wait_for(timeout).await
    }
}

/// Query-only stopper view for sync daemon functions on worker threads.
#[derive(Clone)]
pub struct SyncStopperChecker {
    stopper: Arc<DaemonStopper>,
}

impl SyncStopperChecker {
    pub(crate) fn new(stopper: Arc<DaemonStopper>) -> Self {
        Self { stopper }
    }

    pub fn is_set(&self) -> bool {
        self.stopper.is_set()
    }

    pub fn is_set_reason(&self, reason: StopReason) -> bool {
        self.stopper.is_set_reason(reason)
    }

    pub fn when(&self) -> Option<Instant> {
        self.stopper.when()
    }

    /// Block until the stopper is set or the timeout elapses.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        self.stopper.wait_for_blocking(timeout)
    }
}

#[cfg(test)]
#[path = "stopper_tests.rs"]
mod tests;
