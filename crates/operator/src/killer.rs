// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The operator's root task that kills daemons on shutdown
//!
//! Operators are event-driven: without daemons there would be no background
//! tasks per resource, and so no root-task connector to stop them through.
//! The killer is that artificial connector. It idles for the whole life of
//! the operator and only acts when the shutdown token fires.

use crate::containers::{Daemon, ResourceMemories};
use crate::supervisor::DaemonSupervisor;
use futures_util::future::join_all;
use okra_core::{Clock, DaemonId, ResourceRef};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

impl<C: Clock + 'static> DaemonSupervisor<C> {
    /// Await operator shutdown, then terminate every daemon of every
    /// resource concurrently and wait for all terminations to return.
    ///
    /// Individual failures never surface: each daemon's abandonment is
    /// reported through its own logger and the leak channel.
    pub async fn daemon_killer(&self, memories: &ResourceMemories, shutdown: CancellationToken) {
        // Sleep forever, or until the operator begins its shutdown.
        shutdown.cancelled().await;

        let mut stops: Vec<(ResourceRef, DaemonId, Arc<Daemon>)> = Vec::new();
        for memory in memories.iter_all_memories() {
            for (daemon_id, daemon) in memory.snapshot_daemons() {
                stops.push((memory.resource().clone(), daemon_id, daemon));
            }
        }

        join_all(
            stops
                .iter()
                .map(|(resource, daemon_id, daemon)| self.stop_daemon(resource, daemon_id, daemon)),
        )
        .await;
    }
}

#[cfg(test)]
#[path = "killer_tests.rs"]
mod tests;
