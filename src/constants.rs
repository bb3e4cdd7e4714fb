// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// API group of the ManagedResource custom resource
pub const API_GROUP: &str = "resources.geeko.me";

/// Resource classes and the finalizers derived from them
pub mod class {
    /// Class assumed for ManagedResources that do not declare one
    pub const DEFAULT: &str = "resources";
    /// Finalizer put on Secrets by the reconciler of the default class.
    /// Other classes append `-<class>`.
    pub const FINALIZER_BASE: &str = "resources.geeko.me/resource-manager";
}

/// Finalizer update retry configuration
pub mod retry {
    /// Attempts of a finalizer read-modify-write before giving up
    pub const MAX_ATTEMPTS: u32 = 4;
    /// Backoff before the second attempt, in milliseconds
    pub const INITIAL_BACKOFF_MILLIS: u64 = 10;
    /// Growth factor between consecutive backoffs
    pub const BACKOFF_FACTOR: u32 = 5;
    /// Upper bound of a single backoff, in milliseconds
    pub const MAX_BACKOFF_MILLIS: u64 = 1000;
    /// Requeue delay when the finalizer could not be converged
    pub const DEGRADED_REQUEUE_SECS: u64 = 5;
}

/// Requeue configuration for failed reconciliations
pub mod requeue {
    /// First requeue delay after a failed reconciliation
    pub const ERROR_BASE_SECS: u64 = 5;
    /// Cap for the requeue delay of repeatedly failing reconciliations
    pub const ERROR_MAX_SECS: u64 = 300;
}

/// CRD polling configuration
pub mod crd {
    /// Initial polling interval in seconds when waiting for CRD
    pub const POLL_INTERVAL_SECS: u64 = 10;
    /// Maximum polling interval in seconds (exponential backoff cap)
    pub const POLL_MAX_INTERVAL_SECS: u64 = 60;
}
