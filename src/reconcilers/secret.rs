// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret reconciler - keeps the class finalizer on every Secret that is
//! referenced by a ManagedResource of this class, and only on those.

use crate::config::Config;
use crate::constants::requeue;
use crate::error::{ResourceManagerError, Result};
use crate::filter::ClassFilter;
use crate::kubernetes::SecretStore;
use crate::retry::{update_with_retry, RetryPolicy, UpdateOutcome};
use crate::types::ManagedResource;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{controller, controller::Action, reflector::ObjectRef, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, error, info, warn, Instrument, Span};

const DEFAULT_SYNC_PERIOD_SECS: u64 = 3600;

/// Everything the reconciler talks to
pub struct ReconcilerDeps<S> {
    pub store: S,
    pub filter: ClassFilter,
    /// Fires when the process shuts down
    pub cancel: CancellationToken,
    /// Parent span of all reconcile logs
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSettings {
    pub retry: RetryPolicy,
    /// Requeue delay of converged Secrets, catching references dropped from
    /// ManagedResources that no watch event maps back to the Secret
    pub sync_period: Duration,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            sync_period: Duration::from_secs(DEFAULT_SYNC_PERIOD_SECS),
        }
    }
}

pub struct SecretReconciler<S> {
    store: S,
    filter: ClassFilter,
    cancel: CancellationToken,
    span: Span,
    settings: ReconcileSettings,
    error_counts: Mutex<HashMap<String, ErrorState>>,
}

/// Consecutive failures of one Secret
struct ErrorState {
    failures: u32,
    last_failure: Instant,
}

impl<S: SecretStore> SecretReconciler<S> {
    pub fn new(deps: ReconcilerDeps<S>, settings: ReconcileSettings) -> Self {
        Self {
            store: deps.store,
            filter: deps.filter,
            cancel: deps.cancel,
            span: deps.span,
            settings,
            error_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Converge the finalizers of one Secret with the ManagedResources
    /// currently referencing it.
    pub async fn reconcile_secret(&self, namespace: &str, name: &str) -> Result<Action> {
        let span = debug_span!(
            parent: &self.span,
            "reconcile_secret",
            secret = %format!("{}/{}", namespace, name),
            finalizer = %self.filter.finalizer_name()
        );
        self.converge(namespace, name).instrument(span).await
    }

    async fn converge(&self, namespace: &str, name: &str) -> Result<Action> {
        let Some(secret) = self.cancellable(self.store.get_secret(namespace, name)).await? else {
            debug!("Secret {}/{} has been deleted, nothing to do", namespace, name);
            return Ok(Action::await_change());
        };

        let resources = self
            .cancellable(self.store.list_managed_resources(namespace))
            .await?;
        let referenced = is_referenced(&self.filter, &resources, name);

        let finalizer = self.filter.finalizer_name();
        if desired_finalizers(secret.finalizers(), finalizer, referenced).is_none() {
            debug!("Finalizers of Secret {}/{} are up to date", namespace, name);
            return Ok(Action::requeue(self.settings.sync_period));
        }

        if referenced {
            info!(
                "Adding finalizer {} to Secret {}/{} because it is referenced by a ManagedResource",
                finalizer, namespace, name
            );
        } else {
            info!(
                "Removing finalizer {} from Secret {}/{} because no ManagedResource of class {} references it",
                finalizer,
                namespace,
                name,
                self.filter.class()
            );
        }

        let mut fetched = Some(secret);
        let outcome = update_with_retry(&self.settings.retry, &self.cancel, move || {
            self.apply_finalizer(namespace, name, referenced, fetched.take())
        })
        .await?;

        match outcome {
            UpdateOutcome::Done => Ok(Action::requeue(self.settings.sync_period)),
            UpdateOutcome::Degraded(e) => {
                // Fixed delay, not the growing error backoff.
                error!(
                    "Failed to update finalizer {} of Secret {}/{}: {}",
                    finalizer, namespace, name, e
                );
                Ok(Action::requeue(self.settings.retry.degraded_delay))
            }
        }
    }

    /// One read-modify-write of the finalizer list. Re-reads the Secret
    /// unless a fresh copy is passed in.
    async fn apply_finalizer(
        &self,
        namespace: &str,
        name: &str,
        referenced: bool,
        fetched: Option<Secret>,
    ) -> Result<()> {
        let mut secret = match fetched {
            Some(secret) => secret,
            None => self
                .cancellable(self.store.get_secret(namespace, name))
                .await?
                .ok_or_else(|| ResourceManagerError::NotFound {
                    kind: "Secret",
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })?,
        };

        let Some(finalizers) =
            desired_finalizers(secret.finalizers(), self.filter.finalizer_name(), referenced)
        else {
            return Ok(());
        };

        secret.metadata.finalizers = Some(finalizers);
        self.cancellable(self.store.replace_secret(&secret)).await?;
        Ok(())
    }

    async fn cancellable<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ResourceManagerError::Cancelled),
            result = operation => result,
        }
    }

    /// Requeue delay after the next failure of the given Secret
    fn next_error_delay(&self, key: &str) -> Duration {
        self.next_error_delay_at(key, Instant::now())
    }

    fn next_error_delay_at(&self, key: &str, now: Instant) -> Duration {
        let failures = match self.error_counts.lock() {
            Ok(mut counts) => {
                // A failing Secret is retried within ERROR_MAX_SECS; older
                // entries belong to Secrets deleted while failing.
                let stale_after = Duration::from_secs(2 * requeue::ERROR_MAX_SECS);
                counts.retain(|_, state| now.duration_since(state.last_failure) < stale_after);

                let state = counts.entry(key.to_string()).or_insert(ErrorState {
                    failures: 0,
                    last_failure: now,
                });
                state.failures = state.failures.saturating_add(1);
                state.last_failure = now;
                state.failures
            }
            Err(_) => 1,
        };

        let delay = requeue::ERROR_BASE_SECS
            .saturating_mul(1u64 << (failures - 1).min(16))
            .min(requeue::ERROR_MAX_SECS);
        Duration::from_secs(delay)
    }

    fn reset_errors(&self, key: &str) {
        if let Ok(mut counts) = self.error_counts.lock() {
            counts.remove(key);
        }
    }
}

impl<S: SecretStore + 'static> SecretReconciler<S> {
    pub async fn run(self, client: Client, config: &Config) -> anyhow::Result<()> {
        let (secrets, resources): (Api<Secret>, Api<ManagedResource>) =
            match config.watch_namespace.as_deref() {
                Some(namespace) => (
                    Api::namespaced(client.clone(), namespace),
                    Api::namespaced(client, namespace),
                ),
                None => (Api::all(client.clone()), Api::all(client)),
            };

        let cancel = self.cancel.clone();
        let context = Arc::new(self);

        let controller = Controller::new(secrets, WatcherConfig::default())
            .with_config(
                controller::Config::default().concurrency(config.max_concurrent_reconciles),
            )
            .watches(resources, WatcherConfig::default(), secrets_of_resource)
            .run(reconcile::<S>, error_policy::<S>, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled secret: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            });

        tokio::select! {
            _ = controller => warn!("Secret controller stopped unexpectedly"),
            _ = cancel.cancelled() => info!("Shutting down secret controller"),
        }

        Ok(())
    }
}

/// Check if any ManagedResource of the filter's class references the Secret
pub fn is_referenced(
    filter: &ClassFilter,
    resources: &[ManagedResource],
    secret_name: &str,
) -> bool {
    resources
        .iter()
        .any(|r| r.references_secret(secret_name) && filter.responsible(r))
}

/// Finalizer list after adding or removing `finalizer`, `None` if nothing changes.
/// Foreign finalizers keep their order.
pub fn desired_finalizers(
    current: &[String],
    finalizer: &str,
    referenced: bool,
) -> Option<Vec<String>> {
    let present = current.iter().any(|f| f == finalizer);
    match (referenced, present) {
        (true, false) => {
            let mut finalizers = current.to_vec();
            finalizers.push(finalizer.to_string());
            Some(finalizers)
        }
        (false, true) => Some(
            current
                .iter()
                .filter(|f| f.as_str() != finalizer)
                .cloned()
                .collect(),
        ),
        _ => None,
    }
}

/// Secrets to reconcile when a ManagedResource changes or is deleted
fn secrets_of_resource(resource: ManagedResource) -> Vec<ObjectRef<Secret>> {
    let Some(namespace) = resource.namespace() else {
        return Vec::new();
    };
    resource
        .secret_names()
        .map(|name| ObjectRef::new(name).within(&namespace))
        .collect()
}

fn secret_key(secret: &Secret) -> (String, String) {
    (secret.namespace().unwrap_or_default(), secret.name_any())
}

async fn reconcile<S: SecretStore + 'static>(
    secret: Arc<Secret>,
    ctx: Arc<SecretReconciler<S>>,
) -> Result<Action> {
    let (namespace, name) = secret_key(&secret);
    let action = ctx.reconcile_secret(&namespace, &name).await?;
    ctx.reset_errors(&format!("{}/{}", namespace, name));
    Ok(action)
}

fn error_policy<S: SecretStore + 'static>(
    secret: Arc<Secret>,
    error: &ResourceManagerError,
    ctx: Arc<SecretReconciler<S>>,
) -> Action {
    if matches!(error, ResourceManagerError::Cancelled) {
        return Action::await_change();
    }

    let (namespace, name) = secret_key(&secret);
    let delay = ctx.next_error_delay(&format!("{}/{}", namespace, name));
    error!(
        "Reconciliation of Secret {}/{} failed, retrying in {:?}: {}",
        namespace, name, delay, error
    );
    Action::requeue(delay)
}
