// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource-leak warning channel
//!
//! When a daemon outlives its termination deadline it is left orphaned, and
//! the host is told so through this advisory channel. Nothing in the
//! supervisor's control flow depends on it.

use okra_core::{DaemonId, ResourceRef};

/// Sink for abandoned-daemon warnings.
pub trait LeakSink: Send + Sync {
    fn daemon_abandoned(&self, resource: &ResourceRef, daemon_id: &DaemonId);
}

/// Default sink: a warning on a dedicated tracing target, so hosts can route
/// leak reports separately from ordinary operator logs.
pub struct WarningLeakSink;

impl LeakSink for WarningLeakSink {
    fn daemon_abandoned(&self, resource: &ResourceRef, daemon_id: &DaemonId) {
        tracing::warn!(
            target: "okra::leaks",
            resource = %resource,
            daemon = %daemon_id,
            "daemon did not exit in time and is left orphaned"
        );
    }
}
