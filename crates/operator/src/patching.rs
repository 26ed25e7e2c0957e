// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Patch application to the cluster

use async_trait::async_trait;
use kube::api::{Api, DynamicObject, Patch as KubePatch, PatchParams};
use kube::core::{ApiResource, GroupVersionKind};
use kube::Client;
use okra_core::{Body, Patch, ResourceRef};
use thiserror::Error;

/// Errors from applying a patch to the cluster.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("kubernetes api error: {0}")]
    Api(#[from] kube::Error),
    #[error("patch rejected: {0}")]
    Rejected(String),
}

/// Client boundary for applying accumulated patches.
///
/// Fire-and-forget from the runner's perspective: an error terminates the
/// runner, nothing is retried here.
#[async_trait]
pub trait PatchClient: Send + Sync {
    async fn patch_obj(
        &self,
        resource: &ResourceRef,
        patch: &Patch,
        body: &Body,
    ) -> Result<(), PatchError>;
}

/// Production patch client over the Kubernetes API.
///
/// The supervisor serves arbitrary custom resources, so the API surface is
/// resolved dynamically from the resource's group/version/kind.
#[derive(Clone)]
pub struct KubePatchClient {
    client: Client,
}

impl KubePatchClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn try_default() -> Result<Self, PatchError> {
        Ok(Self { client: Client::try_default().await? })
    }

    fn api_for(&self, resource: &ResourceRef) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(&resource.group, &resource.version, &resource.kind);
        let ar = ApiResource::from_gvk(&gvk);
        match &resource.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }
}

#[async_trait]
impl PatchClient for KubePatchClient {
    async fn patch_obj(
        &self,
        resource: &ResourceRef,
        patch: &Patch,
        _body: &Body,
    ) -> Result<(), PatchError> {
        let api = self.api_for(resource);
        api.patch(
            &resource.name,
            &PatchParams::default(),
            &KubePatch::Merge(patch.as_value()),
        )
        .await?;
        Ok(())
    }
}
