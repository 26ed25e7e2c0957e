// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake collaborators and builders for tests
//!
//! Available in-crate under `cfg(test)` and to other crates through the
//! `test-support` feature.

use crate::causes::SpawningCause;
use crate::handlers::{DaemonContext, HandlerFn};
use crate::invocation::HandlerInvoker;
use crate::leaks::LeakSink;
use crate::logging::{LogCapture, ObjectLogger};
use crate::patching::{PatchClient, PatchError};
use async_trait::async_trait;
use futures_util::FutureExt;
use okra_core::{Body, DaemonId, Patch, ResourceRef};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

pub fn test_resource(name: &str) -> ResourceRef {
    ResourceRef {
        group: "okra.dev".to_string(),
        version: "v1".to_string(),
        kind: "Widget".to_string(),
        namespace: Some("factory".to_string()),
        name: name.to_string(),
        uid: format!("uid-{}", name),
    }
}

pub fn test_body(resource: &ResourceRef) -> Body {
    Body::new(json!({
        "apiVersion": resource.api_version(),
        "kind": resource.kind,
        "metadata": {
            "name": resource.name,
            "namespace": resource.namespace,
            "uid": resource.uid,
        },
    }))
}

/// A spawning cause with a capturing logger.
pub fn capturing_cause(resource: &ResourceRef) -> (SpawningCause, LogCapture) {
    let (logger, capture) = ObjectLogger::capturing(resource);
    (SpawningCause { resource: resource.clone(), logger }, capture)
}

/// Patch client that records every applied patch; optionally fails.
#[derive(Default)]
pub struct FakePatchClient {
    applied: Mutex<Vec<(ResourceRef, Value)>>,
    fail: AtomicBool,
}

impl FakePatchClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let client = Self::default();
        client.fail.store(true, Ordering::SeqCst);
        Arc::new(client)
    }

    pub fn applied(&self) -> Vec<Value> {
        self.applied.lock().iter().map(|(_, v)| v.clone()).collect()
    }

    pub fn applied_count(&self) -> usize {
        self.applied.lock().len()
    }
}

#[async_trait]
impl PatchClient for FakePatchClient {
    async fn patch_obj(
        &self,
        resource: &ResourceRef,
        patch: &Patch,
        _body: &Body,
    ) -> Result<(), PatchError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PatchError::Rejected("fake patch client is failing".to_string()));
        }
        self.applied.lock().push((resource.clone(), patch.as_value()));
        Ok(())
    }
}

/// Leak sink that records abandoned daemons.
#[derive(Default)]
pub struct FakeLeakSink {
    abandoned: Mutex<Vec<(ResourceRef, DaemonId)>>,
}

impl FakeLeakSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn abandoned(&self) -> Vec<(ResourceRef, DaemonId)> {
        self.abandoned.lock().clone()
    }

    pub fn abandoned_count(&self) -> usize {
        self.abandoned.lock().len()
    }
}

impl LeakSink for FakeLeakSink {
    fn daemon_abandoned(&self, resource: &ResourceRef, daemon_id: &DaemonId) {
        self.abandoned.lock().push((resource.clone(), daemon_id.clone()));
    }
}

/// A handler that returns success immediately, counting its invocations.
pub fn counting_handler(counter: Arc<AtomicU32>) -> HandlerFn {
    HandlerFn::from_async(move |_ctx: DaemonContext| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
        .boxed()
    })
}

/// A daemon that parks on the stopper and exits as soon as it fires.
pub fn well_behaved_daemon_fn() -> HandlerFn {
    HandlerFn::from_async(|ctx: DaemonContext| {
        async move {
            ctx.stopper.wait().await;
            Ok(None)
        }
        .boxed()
    })
}

/// Invocation engine replaying a fixed outcome script, then succeeding.
pub struct ScriptedInvoker {
    outcomes: Mutex<Vec<crate::invocation::Outcome>>,
}

impl ScriptedInvoker {
    pub fn new(outcomes: Vec<crate::invocation::Outcome>) -> Arc<Self> {
        Arc::new(Self { outcomes: Mutex::new(outcomes) })
    }
}

#[async_trait]
impl HandlerInvoker for ScriptedInvoker {
    async fn execute_once(
        &self,
        _settings: &crate::settings::OperatorSettings,
        _handler: &crate::handlers::SpawningHandler,
        _cause: &crate::causes::DaemonCause,
        _state: &crate::invocation::InvocationState,
    ) -> crate::invocation::Outcome {
        let mut outcomes = self.outcomes.lock();
        if outcomes.is_empty() {
            crate::invocation::Outcome::Success { result: None }
        } else {
            outcomes.remove(0)
        }
    }
}
