// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawning handler descriptors and user callback types
//!
//! A spawning handler is attached to a resource kind once and produces one
//! background activity per observed resource: a daemon (long-running, stops
//! cooperatively) or a timer (invoked on a schedule). The descriptor is
//! immutable; all mutable state lives in the per-resource daemon record.

use crate::logging::ObjectLogger;
use crate::stopper::{AsyncStopperChecker, SyncStopperChecker};
use futures_util::future::BoxFuture;
use okra_core::{Body, DaemonId, Memo, ResourceRef};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// What a single handler invocation may produce: an optional result fragment
/// delivered into the resource's status, or a typed failure.
pub type HandlerResult = Result<Option<Value>, HandlerFailure>;

/// Failures a user handler may raise.
///
/// Temporary failures are retried after their delay for as long as the
/// daemon lives; permanent failures finish the handler for good.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HandlerFailure {
    #[error("temporary failure (retry in {delay:?}): {message}")]
    Temporary { message: String, delay: Duration },
    #[error("permanent failure: {message}")]
    Permanent { message: String },
}

impl HandlerFailure {
    pub fn temporary(message: impl Into<String>, delay: Duration) -> Self {
        Self::Temporary { message: message.into(), delay }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent { message: message.into() }
    }
}

/// Invocation context for async handler functions.
#[derive(Clone)]
pub struct DaemonContext {
    pub resource: ResourceRef,
    pub body: Arc<Body>,
    pub memo: Memo,
    pub logger: ObjectLogger,
    pub stopper: AsyncStopperChecker,
    /// Retry counter of the current invocation state; zero on the first
    /// attempt and after each successful timer firing.
    pub retry: u32,
}

/// Invocation context for sync handler functions on worker threads.
///
/// Carries the blocking stopper view: a sync daemon parked on `wait_for`
/// must be woken from a worker thread, not from the event loop.
#[derive(Clone)]
pub struct SyncDaemonContext {
    pub resource: ResourceRef,
    pub body: Arc<Body>,
    pub memo: Memo,
    pub logger: ObjectLogger,
    pub stopper: SyncStopperChecker,
    pub retry: u32,
}

pub type AsyncHandlerFn =
    Arc<dyn Fn(DaemonContext) -> BoxFuture<'static, HandlerResult> + Send + Sync>;
pub type SyncHandlerFn = Arc<dyn Fn(SyncDaemonContext) -> HandlerResult + Send + Sync>;

/// A user callback in either of its two shapes.
#[derive(Clone)]
pub enum HandlerFn {
    Async(AsyncHandlerFn),
    Sync(SyncHandlerFn),
}

impl HandlerFn {
    pub fn from_async<F>(f: F) -> Self
    where
        F: Fn(DaemonContext) -> BoxFuture<'static, HandlerResult> + Send + Sync + 'static,
    {
        Self::Async(Arc::new(f))
    }

    pub fn from_sync<F>(f: F) -> Self
    where
        F: Fn(SyncDaemonContext) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }
}

/// Descriptor of a daemon handler.
#[derive(Clone)]
pub struct DaemonHandler {
    pub id: DaemonId,
    pub func: HandlerFn,
    pub initial_delay: Option<Duration>,
    /// Grace period before the forceful cancel during termination.
    pub cancellation_backoff: Option<Duration>,
    /// Wall-clock budget after the forceful cancel; past it the daemon is
    /// abandoned.
    pub cancellation_timeout: Option<Duration>,
    /// Re-check cadence while a deletion waits on this daemon.
    pub cancellation_polling: Option<Duration>,
}

impl DaemonHandler {
    pub fn new(id: impl Into<DaemonId>, func: HandlerFn) -> Self {
        Self {
            id: id.into(),
            func,
            initial_delay: None,
            cancellation_backoff: None,
            cancellation_timeout: None,
            cancellation_polling: None,
        }
    }
}

/// Descriptor of a timer handler.
#[derive(Clone)]
pub struct TimerHandler {
    pub id: DaemonId,
    pub func: HandlerFn,
    pub initial_delay: Option<Duration>,
    /// Period between invocations.
    pub interval: Option<Duration>,
    /// Minimum quiet time since the last watch event before firing.
    pub idle: Option<Duration>,
    /// Align firings to an interval-sized grid regardless of how long the
    /// handler runs.
    pub sharp: bool,
}

impl TimerHandler {
    pub fn new(id: impl Into<DaemonId>, func: HandlerFn) -> Self {
        Self {
            id: id.into(),
            func,
            initial_delay: None,
            interval: None,
            idle: None,
            sharp: false,
        }
    }
}

/// The two shapes of spawning handlers. The enum is closed: dispatch sites
/// match exhaustively, so an unsupported shape cannot exist at runtime.
#[derive(Clone)]
pub enum SpawningHandler {
    Daemon(DaemonHandler),
    Timer(TimerHandler),
}

impl SpawningHandler {
    pub fn id(&self) -> &DaemonId {
        match self {
            Self::Daemon(h) => &h.id,
            Self::Timer(h) => &h.id,
        }
    }

    pub fn func(&self) -> &HandlerFn {
        match self {
            Self::Daemon(h) => &h.func,
            Self::Timer(h) => &h.func,
        }
    }

    pub fn initial_delay(&self) -> Option<Duration> {
        match self {
            Self::Daemon(h) => h.initial_delay,
            Self::Timer(h) => h.initial_delay,
        }
    }
}

impl std::fmt::Debug for SpawningHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daemon(h) => write!(f, "Daemon({})", h.id),
            Self::Timer(h) => write!(f, "Timer({})", h.id),
        }
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
