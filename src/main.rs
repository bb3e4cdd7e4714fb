// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

use resource_manager::config::Config;
use resource_manager::filter::ClassFilter;
use resource_manager::kubernetes::{wait_for_managed_resource_crd, KubeSecretStore};
use resource_manager::reconcilers::{ReconcileSettings, ReconcilerDeps, SecretReconciler};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting resource manager");

    // Load configuration
    let config = Config::from_env()?;
    let filter = ClassFilter::new(&config.resource_class)?;
    info!(
        "Configuration loaded: class={}, finalizer={}, watch_namespace={}",
        filter.class(),
        filter.finalizer_name(),
        config.watch_namespace.as_deref().unwrap_or("<all>")
    );

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_on_signal(cancel.clone()));

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    info!("Waiting for ManagedResource CRD to become available...");
    if !wait_for_managed_resource_crd(&client, &cancel).await? {
        info!("Shutdown requested before the ManagedResource CRD became available");
        return Ok(());
    }

    let reconciler = SecretReconciler::new(
        ReconcilerDeps {
            store: KubeSecretStore::new(client.clone()),
            filter,
            cancel,
            span: info_span!("secret_reconciler", class = %config.resource_class),
        },
        ReconcileSettings {
            sync_period: config.sync_period,
            ..Default::default()
        },
    );

    info!("Starting secret reconciler...");
    reconciler.run(client, &config).await?;

    info!("Resource manager stopped");
    Ok(())
}

async fn shutdown_on_signal(cancel: CancellationToken) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
    cancel.cancel();
}
