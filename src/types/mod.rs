// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource types watched by the operator.

pub mod managed_resource;

pub use managed_resource::{ManagedResource, ManagedResourceSpec, SecretRef};
