// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-resource user scratchpad

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// An arbitrary data container shared by all handlers of one resource.
///
/// Cloning is cheap and clones share the underlying store, so a value stored
/// by one handler is visible to the daemons and timers of the same resource.
#[derive(Debug, Clone, Default)]
pub struct Memo {
    store: Arc<Mutex<HashMap<String, Value>>>,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.store.lock().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.store.lock().insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.store.lock().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.lock().contains_key(key)
    }
}

#[cfg(test)]
#[path = "memo_tests.rs"]
mod tests;
