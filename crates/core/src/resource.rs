// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource identity and observed resource bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of a custom resource served by the operator.
///
/// The `uid` distinguishes re-created objects with the same name, so all
/// per-resource bookkeeping (memories, daemons) is keyed by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
    pub uid: String,
}

impl ResourceRef {
    /// The `apiVersion` string for this resource (`group/version`, or bare
    /// `version` for the core group).
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn is_namespaced(&self) -> bool {
        self.namespace.is_some()
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "[{}/{}]", ns, self.name),
            None => write!(f, "[{}]", self.name),
        }
    }
}

/// The most recently observed body of a resource, as raw JSON.
///
/// The supervisor never interprets the body beyond its metadata; it is
/// carried for user handlers and for patch application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    raw: Value,
}

impl Body {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn meta(&self) -> Option<&Value> {
        self.raw.get("metadata")
    }

    pub fn name(&self) -> Option<&str> {
        self.meta()?.get("name")?.as_str()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.meta()?.get("namespace")?.as_str()
    }

    pub fn uid(&self) -> Option<&str> {
        self.meta()?.get("uid")?.as_str()
    }

    /// Whether the object is marked for deletion (has a deletion timestamp).
    pub fn is_deleting(&self) -> bool {
        self.meta()
            .and_then(|m| m.get("deletionTimestamp"))
            .is_some_and(|v| !v.is_null())
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
