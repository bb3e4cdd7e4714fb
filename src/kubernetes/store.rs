// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Read/write access to Secrets and ManagedResources.

use crate::error::{ResourceManagerError, Result};
use crate::types::ManagedResource;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    api::{ListParams, PostParams},
    Api, Client, ResourceExt,
};
use tracing::{debug, instrument};

/// Operations the secret reconciler needs from the API server
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a Secret, `None` if it does not exist
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;

    /// List all ManagedResources in a namespace
    async fn list_managed_resources(&self, namespace: &str) -> Result<Vec<ManagedResource>>;

    /// Replace a Secret, guarded by its `resourceVersion`
    async fn replace_secret(&self, secret: &Secret) -> Result<Secret>;
}

/// [`SecretStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    #[instrument(skip(self))]
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(secrets.get_opt(name).await?)
    }

    #[instrument(skip(self))]
    async fn list_managed_resources(&self, namespace: &str) -> Result<Vec<ManagedResource>> {
        let resources: Api<ManagedResource> = Api::namespaced(self.client.clone(), namespace);
        let list = resources.list(&ListParams::default()).await?;
        debug!("Found {} ManagedResources in {}", list.items.len(), namespace);
        Ok(list.items)
    }

    #[instrument(
        skip(self, secret),
        fields(namespace = ?secret.metadata.namespace, name = ?secret.metadata.name)
    )]
    async fn replace_secret(&self, secret: &Secret) -> Result<Secret> {
        let namespace = secret.namespace().unwrap_or_default();
        let name = secret.name_any();
        let secrets: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);

        match secrets.replace(&name, &PostParams::default(), secret).await {
            Ok(updated) => Ok(updated),
            Err(kube::Error::Api(err)) if err.code == 404 => Err(ResourceManagerError::NotFound {
                kind: "Secret",
                namespace,
                name,
            }),
            Err(kube::Error::Api(err)) if err.code == 409 => Err(ResourceManagerError::Conflict {
                namespace,
                name,
                message: err.message,
            }),
            Err(e) => Err(e.into()),
        }
    }
}
