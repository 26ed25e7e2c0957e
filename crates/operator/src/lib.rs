// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! okra-operator: per-resource daemon supervision
//!
//! Daemons are background tasks accompanying individual resource objects.
//! Every daemon and timer handler produces one guarding task per observed
//! resource; these tasks are remembered in the per-resource memories through
//! the life cycle of the operator and terminated deterministically when the
//! resource is deleted or the operator exits.

pub mod causes;
pub mod containers;
pub mod error;
pub mod handlers;
pub mod invocation;
pub mod killer;
pub mod leaks;
pub mod logging;
pub mod patching;
mod runner;
pub mod settings;
pub mod sleeping;
pub mod stopper;
pub mod supervisor;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use causes::{DaemonCause, SpawningCause};
pub use containers::{Daemon, DaemonTask, ResourceMemories, ResourceMemory};
pub use error::SupervisorError;
pub use handlers::{
    DaemonContext, DaemonHandler, HandlerFailure, HandlerFn, HandlerResult, SpawningHandler,
    SyncDaemonContext, TimerHandler,
};
pub use invocation::{
    deliver_results, DefaultInvoker, HandlerInvoker, InvocationState, Outcome,
};
pub use leaks::{LeakSink, WarningLeakSink};
pub use logging::{LogCapture, LogEntry, LogLevel, ObjectLogger};
pub use patching::{KubePatchClient, PatchClient, PatchError};
pub use settings::{ExecutionSettings, OperatorSettings};
pub use sleeping::{sleep_or_wait, sleep_or_wait_any};
pub use stopper::{AsyncStopperChecker, DaemonStopper, StopReason, SyncStopperChecker};
pub use supervisor::{DaemonSupervisor, SupervisorDeps, DAEMON_POLLING_INTERVAL};
