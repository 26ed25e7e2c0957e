// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor-level errors

use thiserror::Error;

/// Errors surfaced by the daemon supervisor to its caller.
///
/// The termination protocols never raise; they communicate through delays
/// and logs. Only programming errors reach the caller.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("a daemon is spawned with no live body. This is a bug. Please report")]
    MissingLiveBody,
}
