// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::constants::crd::{POLL_INTERVAL_SECS, POLL_MAX_INTERVAL_SECS};
use crate::constants::API_GROUP;
use crate::error::Result;
use kube::{discovery::Discovery, Client};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const KIND: &str = "ManagedResource";
const VERSION: &str = "v1alpha1";

/// Wait for the ManagedResource CRD to become available in the cluster.
/// This uses exponential backoff starting at POLL_INTERVAL_SECS seconds.
/// Returns `false` if shutdown was requested before the CRD showed up.
pub async fn wait_for_managed_resource_crd(
    client: &Client,
    cancel: &CancellationToken,
) -> Result<bool> {
    let mut interval = POLL_INTERVAL_SECS;

    loop {
        match check_managed_resource_crd_exists(client).await {
            Ok(true) => {
                info!("ManagedResource CRD ({}/{}) is available", API_GROUP, VERSION);
                return Ok(true);
            }
            Ok(false) => {
                info!(
                    "ManagedResource CRD ({}/{}) not yet available, waiting {} seconds...",
                    API_GROUP, VERSION, interval
                );
            }
            Err(e) => {
                warn!(
                    "Error checking for ManagedResource CRD: {}, retrying in {} seconds...",
                    e, interval
                );
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Ok(false),
            _ = sleep(Duration::from_secs(interval)) => {}
        }

        interval = next_interval(interval);
    }
}

/// Exponential backoff with max cap
fn next_interval(interval: u64) -> u64 {
    (interval * 2).min(POLL_MAX_INTERVAL_SECS)
}

/// Check if the ManagedResource CRD exists by attempting to discover it.
async fn check_managed_resource_crd_exists(client: &Client) -> Result<bool> {
    let discovery = Discovery::new(client.clone())
        .filter(&[API_GROUP])
        .run()
        .await?;

    let found = discovery
        .groups()
        .filter(|group| group.name() == API_GROUP)
        .flat_map(|group| group.recommended_resources())
        .any(|(ar, _)| ar.kind == KIND && ar.version == VERSION);
    Ok(found)
}
