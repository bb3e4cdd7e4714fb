// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for CRD discovery and Secret/ManagedResource access.

pub mod crd;
pub mod store;

pub use crd::wait_for_managed_resource_crd;
pub use store::{KubeSecretStore, SecretStore};
