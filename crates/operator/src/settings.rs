// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operator-wide settings

use serde::{Deserialize, Serialize};

/// Settings shared by all daemons of one operator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorSettings {
    pub execution: ExecutionSettings,
}

/// Handler execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    /// Size of the shared worker pool for synchronous handlers.
    pub max_sync_workers: usize,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self { max_sync_workers: 16 }
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
