// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Causes: the context bundles handed to spawning and to daemons

use crate::logging::ObjectLogger;
use crate::stopper::DaemonStopper;
use okra_core::{Body, Memo, Patch, ResourceRef};
use std::sync::Arc;

/// What the resource-processing loop hands to the supervisor when spawning.
pub struct SpawningCause {
    pub resource: ResourceRef,
    pub logger: ObjectLogger,
}

/// The cause a daemon lives under for its whole life.
///
/// Its patch accumulator is created fresh at spawn time and belongs to this
/// daemon alone; it is not the one-shot patch of the spawning cycle.
pub struct DaemonCause {
    pub resource: ResourceRef,
    pub logger: ObjectLogger,
    pub body: Arc<Body>,
    pub memo: Memo,
    pub patch: Patch,
    pub stopper: Arc<DaemonStopper>,
}
