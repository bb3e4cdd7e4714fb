// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::class;
use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_MAX_CONCURRENT_RECONCILES: u16 = 5;
const DEFAULT_SYNC_PERIOD_SECS: u64 = 3600;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Class of ManagedResources this instance is responsible for
    pub resource_class: String,
    /// Upper bound of Secrets reconciled in parallel
    pub max_concurrent_reconciles: u16,
    /// Restricts the watches to a single namespace when set
    pub watch_namespace: Option<String>,
    /// Interval at which converged Secrets are checked again
    pub sync_period: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let resource_class = match lookup("RESOURCE_CLASS") {
            None => class::DEFAULT.to_string(),
            Some(value) if value.trim().is_empty() => {
                bail!("RESOURCE_CLASS environment variable is set but empty")
            }
            Some(value) => value.trim().to_string(),
        };

        let max_concurrent_reconciles = match lookup("MAX_CONCURRENT_RECONCILES") {
            None => DEFAULT_MAX_CONCURRENT_RECONCILES,
            Some(value) => value
                .parse()
                .with_context(|| format!("Invalid MAX_CONCURRENT_RECONCILES: {}", value))?,
        };

        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty());

        let sync_period_secs: u64 = match lookup("SYNC_PERIOD_SECS") {
            None => DEFAULT_SYNC_PERIOD_SECS,
            Some(value) => value
                .parse()
                .with_context(|| format!("Invalid SYNC_PERIOD_SECS: {}", value))?,
        };
        if sync_period_secs == 0 {
            bail!("SYNC_PERIOD_SECS must be greater than zero");
        }

        Ok(Config {
            resource_class,
            max_concurrent_reconciles,
            watch_namespace,
            sync_period: Duration::from_secs(sync_period_secs),
        })
    }
}
