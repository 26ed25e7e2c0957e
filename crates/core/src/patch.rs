// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accumulating JSON merge patches

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON merge patch accumulated across handler invocations.
///
/// Handlers and the result-delivery machinery write fragments into it; the
/// runner flushes the whole document to the cluster and clears it. An empty
/// patch is never applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    #[serde(flatten)]
    root: Map<String, Value>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn clear(&mut self) {
        self.root.clear();
    }

    /// The `status` subtree, created on first access.
    pub fn status_mut(&mut self) -> &mut Map<String, Value> {
        self.subtree_mut("status")
    }

    /// The `spec` subtree, created on first access.
    pub fn spec_mut(&mut self) -> &mut Map<String, Value> {
        self.subtree_mut("spec")
    }

    /// The `metadata` subtree, created on first access.
    pub fn meta_mut(&mut self) -> &mut Map<String, Value> {
        self.subtree_mut("metadata")
    }

    fn subtree_mut(&mut self, key: &str) -> &mut Map<String, Value> {
        let entry = self
            .root
            .entry(key.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        match entry.as_object_mut() {
            Some(map) => map,
            // just replaced with an object above
            None => unreachable!("patch subtree is not an object"),
        }
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.root.clone())
    }
}

impl std::fmt::Display for Patch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.root.clone()))
    }
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
