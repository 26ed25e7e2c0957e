// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-resource containers: daemon records and resource memories
//!
//! Memories are owned by the processing layer and outlive everything the
//! supervisor stores in them. A daemon record is created by the first spawn
//! that observes the handler's absence and stays in the table for the life
//! of the resource, even after the daemon has exited or was abandoned.

use crate::handlers::SpawningHandler;
use crate::logging::ObjectLogger;
use crate::stopper::DaemonStopper;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use okra_core::{Body, DaemonId, Memo, ResourceRef};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{AbortHandle, JoinHandle};

/// Handle to a spawned runner task.
///
/// The completion future is shared so the deletion protocol, the killer, and
/// tests can all await the same task without consuming it.
pub struct DaemonTask {
    inner: TaskInner,
    done: Shared<BoxFuture<'static, ()>>,
}

enum TaskInner {
    Spawned { abort: AbortHandle },
    /// A task that ignores cancellation and never completes, standing in for
    /// a daemon stuck in a worker thread beyond the scheduler's reach.
    #[cfg(any(test, feature = "test-support"))]
    Unstoppable,
}

impl DaemonTask {
    pub fn new(handle: JoinHandle<()>) -> Self {
        let abort = handle.abort_handle();
        // Abort and panic both resolve the shared future; the runner's own
        // exit contract is enforced separately by its drop guard.
        let done = handle.map(|_res| ()).boxed().shared();
        Self { inner: TaskInner::Spawned { abort }, done }
    }

    /// A task handle that survives aborts and never finishes. Only for
    /// exercising the cancelled/abandoned termination phases in tests.
    #[cfg(any(test, feature = "test-support"))]
    pub fn unstoppable() -> Self {
        Self {
            inner: TaskInner::Unstoppable,
            done: futures_util::future::pending::<()>().boxed().shared(),
        }
    }

    /// Whether the task has finished (returned, panicked, or was aborted).
    pub fn is_finished(&self) -> bool {
        match &self.inner {
            TaskInner::Spawned { abort } => abort.is_finished(),
            #[cfg(any(test, feature = "test-support"))]
            TaskInner::Unstoppable => false,
        }
    }

    /// Forcefully cancel the task. A last resort; the stopper must already
    /// carry the matching reason.
    pub fn abort(&self) {
        match &self.inner {
            TaskInner::Spawned { abort } => abort.abort(),
            #[cfg(any(test, feature = "test-support"))]
            TaskInner::Unstoppable => {}
        }
    }

    /// A future resolving when the task completes; awaitable many times.
    pub fn wait(&self) -> Shared<BoxFuture<'static, ()>> {
        self.done.clone()
    }
}

/// A live daemon of one resource.
pub struct Daemon {
    pub handler: Arc<SpawningHandler>,
    pub stopper: Arc<DaemonStopper>,
    pub logger: ObjectLogger,
    pub task: DaemonTask,
}

/// The per-resource memory the supervisor works against.
///
/// All fields are interior-mutable: the watch path bumps the idle-reset
/// instant and replaces the live body, the supervisor populates the daemon
/// table, and the killer reads it, all through shared references.
pub struct ResourceMemory {
    resource: ResourceRef,
    daemons: Mutex<HashMap<DaemonId, Arc<Daemon>>>,
    memo: Memo,
    live_fresh_body: Mutex<Option<Arc<Body>>>,
    idle_reset_time: Mutex<Instant>,
}

impl ResourceMemory {
    pub fn new(resource: ResourceRef, now: Instant) -> Self {
        Self {
            resource,
            daemons: Mutex::new(HashMap::new()),
            memo: Memo::new(),
            live_fresh_body: Mutex::new(None),
            idle_reset_time: Mutex::new(now),
        }
    }

    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    pub fn memo(&self) -> Memo {
        self.memo.clone()
    }

    /// The most recently observed body, if any has been seen yet.
    pub fn live_fresh_body(&self) -> Option<Arc<Body>> {
        self.live_fresh_body.lock().clone()
    }

    /// Record a newly observed body. Called by the watch path on every event.
    pub fn set_live_fresh_body(&self, body: Arc<Body>) {
        *self.live_fresh_body.lock() = Some(body);
    }

    /// The instant of the last non-trivial watch event.
    pub fn idle_reset_time(&self) -> Instant {
        *self.idle_reset_time.lock()
    }

    /// Bump the idle-reset instant. Monotonically non-decreasing: a stale
    /// caller cannot move it backwards.
    pub fn touch(&self, now: Instant) {
        let mut reset = self.idle_reset_time.lock();
        if now > *reset {
            *reset = now;
        }
    }

    pub fn daemon(&self, id: &str) -> Option<Arc<Daemon>> {
        self.daemons.lock().get(id).cloned()
    }

    pub fn has_daemon(&self, id: &str) -> bool {
        self.daemons.lock().contains_key(id)
    }

    pub fn daemon_count(&self) -> usize {
        self.daemons.lock().len()
    }

    /// Insert a record unless the id is already present; returns whether it
    /// was inserted. The check-and-insert is atomic under the table lock, so
    /// two spawns cannot race a duplicate in.
    pub fn insert_daemon_if_absent(
        &self,
        id: DaemonId,
        daemon: impl FnOnce() -> Arc<Daemon>,
    ) -> bool {
        let mut daemons = self.daemons.lock();
        if daemons.contains_key(id.as_str()) {
            return false;
        }
        daemons.insert(id, daemon());
        true
    }

    /// Snapshot of the daemon table for iteration outside the lock.
    pub fn snapshot_daemons(&self) -> Vec<(DaemonId, Arc<Daemon>)> {
        self.daemons
            .lock()
            .iter()
            .map(|(id, d)| (id.clone(), d.clone()))
            .collect()
    }
}

/// Registry of all resource memories known to the operator, keyed by uid.
#[derive(Default)]
pub struct ResourceMemories {
    memories: Mutex<HashMap<String, Arc<ResourceMemory>>>,
}

impl ResourceMemories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the memory of a resource.
    pub fn recall(&self, resource: &ResourceRef, now: Instant) -> Arc<ResourceMemory> {
        self.memories
            .lock()
            .entry(resource.uid.clone())
            .or_insert_with(|| Arc::new(ResourceMemory::new(resource.clone(), now)))
            .clone()
    }

    /// Drop the memory of a deleted resource, discarding its daemon records.
    pub fn forget(&self, resource: &ResourceRef) -> Option<Arc<ResourceMemory>> {
        self.memories.lock().remove(&resource.uid)
    }

    pub fn iter_all_memories(&self) -> Vec<Arc<ResourceMemory>> {
        self.memories.lock().values().cloned().collect()
    }
}

#[cfg(test)]
#[path = "containers_tests.rs"]
mod tests;
