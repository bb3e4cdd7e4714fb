// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// A set of workload manifests, stored in Secrets of the same namespace,
/// that is applied and kept healthy by the resource manager of its class.
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "resources.geeko.me", version = "v1alpha1", kind = "ManagedResource")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct ManagedResourceSpec {
    /// Class of the resource manager responsible for this resource
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Secrets holding the manifests, in the namespace of the ManagedResource
    #[serde(default)]
    pub secret_refs: Vec<SecretRef>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, schemars::JsonSchema)]
pub struct SecretRef {
    pub name: String,
}

impl ManagedResource {
    /// Names of all referenced Secrets, in declaration order
    pub fn secret_names(&self) -> impl Iterator<Item = &str> {
        self.spec.secret_refs.iter().map(|r| r.name.as_str())
    }

    /// Check if this resource references the Secret with the given name
    pub fn references_secret(&self, name: &str) -> bool {
        self.secret_names().any(|n| n == name)
    }
}
