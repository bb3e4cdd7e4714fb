// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses and the secret store.

use crate::error::{ResourceManagerError, Result};
use crate::kubernetes::SecretStore;
use crate::types::{ManagedResource, ManagedResourceSpec, SecretRef};
use async_trait::async_trait;
use http::{Request, Response};
use k8s_openapi::api::core::v1::Secret;
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PUT requests matching the exact path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("path", &path)));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock Secret JSON response
pub fn secret_json(
    namespace: &str,
    name: &str,
    finalizers: &[&str],
    resource_version: &str,
) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "finalizers": finalizers,
            "resourceVersion": resource_version,
        },
        "type": "Opaque"
    })
    .to_string()
}

/// Create a mock ManagedResourceList JSON response from (name, class, secret refs)
pub fn managed_resource_list_json(
    namespace: &str,
    resources: &[(&str, Option<&str>, &[&str])],
) -> String {
    let items: Vec<serde_json::Value> = resources
        .iter()
        .map(|(name, class, refs)| {
            let secret_refs: Vec<serde_json::Value> = refs
                .iter()
                .map(|r| serde_json::json!({ "name": r }))
                .collect();
            serde_json::json!({
                "apiVersion": "resources.geeko.me/v1alpha1",
                "kind": "ManagedResource",
                "metadata": { "name": name, "namespace": namespace },
                "spec": {
                    "class": class,
                    "secretRefs": secret_refs,
                }
            })
        })
        .collect();

    serde_json::json!({
        "apiVersion": "resources.geeko.me/v1alpha1",
        "kind": "ManagedResourceList",
        "metadata": { "resourceVersion": "1" },
        "items": items,
    })
    .to_string()
}

/// Create a failure Status response
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    status_json(404, "NotFound", &format!("{} \"{}\" not found", resource, name))
}

pub fn make_managed_resource(
    namespace: &str,
    name: &str,
    class: Option<&str>,
    secret_refs: &[&str],
) -> ManagedResource {
    ManagedResource {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: ManagedResourceSpec {
            class: class.map(str::to_string),
            secret_refs: secret_refs
                .iter()
                .map(|n| SecretRef { name: n.to_string() })
                .collect(),
        },
    }
}

pub fn make_secret(namespace: &str, name: &str, finalizers: &[&str]) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            finalizers: Some(finalizers.iter().map(|f| f.to_string()).collect()),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn api_error(code: u16, reason: &str) -> ResourceManagerError {
    ResourceManagerError::KubeError(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("injected {}", reason),
        reason: reason.to_string(),
        code,
    }))
}

#[derive(Default)]
struct FakeState {
    secrets: BTreeMap<(String, String), Secret>,
    resources: Vec<ManagedResource>,
    version: u64,
    writes: u32,
    write_attempts: u32,
    concurrent_finalizer: Option<String>,
    always_conflict: bool,
    fail_writes: bool,
    fail_list: bool,
    hang_list: bool,
}

/// In-memory [`SecretStore`] enforcing `resourceVersion` compare-and-swap.
#[derive(Default)]
pub struct FakeSecretStore {
    state: Mutex<FakeState>,
}

impl FakeSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, namespace: &str, name: &str, finalizers: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.version += 1;
            let mut secret = make_secret(namespace, name, finalizers);
            secret.metadata.resource_version = Some(state.version.to_string());
            state
                .secrets
                .insert((namespace.to_string(), name.to_string()), secret);
        }
        self
    }

    pub fn with_resource(
        self,
        namespace: &str,
        name: &str,
        class: Option<&str>,
        secret_refs: &[&str],
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .resources
            .push(make_managed_resource(namespace, name, class, secret_refs));
        self
    }

    pub fn remove_resource(&self, namespace: &str, name: &str) {
        self.state.lock().unwrap().resources.retain(|r| {
            r.namespace().as_deref() != Some(namespace) || r.name_any() != name
        });
    }

    pub fn remove_secret(&self, namespace: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .secrets
            .remove(&(namespace.to_string(), name.to_string()));
    }

    /// Another writer adds the given finalizer right before the next write lands
    pub fn concurrent_write_before_next_update(&self, finalizer: &str) {
        self.state.lock().unwrap().concurrent_finalizer = Some(finalizer.to_string());
    }

    pub fn always_conflict(&self) {
        self.state.lock().unwrap().always_conflict = true;
    }

    pub fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }

    pub fn fail_list(&self) {
        self.state.lock().unwrap().fail_list = true;
    }

    pub fn hang_list(&self) {
        self.state.lock().unwrap().hang_list = true;
    }

    /// Successful writes so far
    pub fn writes(&self) -> u32 {
        self.state.lock().unwrap().writes
    }

    /// Write attempts so far, including rejected ones
    pub fn write_attempts(&self) -> u32 {
        self.state.lock().unwrap().write_attempts
    }

    pub fn finalizers(&self, namespace: &str, name: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .map(|s| s.finalizers().to_vec())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn list_managed_resources(&self, namespace: &str) -> Result<Vec<ManagedResource>> {
        let hang = {
            let state = self.state.lock().unwrap();
            if state.fail_list {
                return Err(api_error(500, "InternalError"));
            }
            state.hang_list
        };
        if hang {
            futures::future::pending::<()>().await;
        }

        Ok(self
            .state
            .lock()
            .unwrap()
            .resources
            .iter()
            .filter(|r| r.namespace().as_deref() == Some(namespace))
            .cloned()
            .collect())
    }

    async fn replace_secret(&self, secret: &Secret) -> Result<Secret> {
        let mut state = self.state.lock().unwrap();
        state.write_attempts += 1;

        let namespace = secret.namespace().unwrap_or_default();
        let name = secret.name_any();
        let key = (namespace.clone(), name.clone());

        if state.fail_writes {
            return Err(api_error(500, "InternalError"));
        }

        if let Some(finalizer) = state.concurrent_finalizer.take() {
            state.version += 1;
            let version = state.version.to_string();
            if let Some(stored) = state.secrets.get_mut(&key) {
                stored.finalizers_mut().push(finalizer);
                stored.metadata.resource_version = Some(version);
            }
        }

        let current_version = match state.secrets.get(&key) {
            Some(stored) => stored.resource_version(),
            None => {
                return Err(ResourceManagerError::NotFound {
                    kind: "Secret",
                    namespace,
                    name,
                })
            }
        };

        if state.always_conflict || current_version != secret.resource_version() {
            return Err(ResourceManagerError::Conflict {
                namespace,
                name,
                message: "the object has been modified".to_string(),
            });
        }

        state.version += 1;
        state.writes += 1;
        let mut updated = secret.clone();
        updated.metadata.resource_version = Some(state.version.to_string());
        state.secrets.insert(key, updated.clone());
        Ok(updated)
    }
}
