// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Class based partitioning of ManagedResources between operator instances.

use crate::constants::class;
use crate::error::{ResourceManagerError, Result};
use crate::types::ManagedResource;

const MAX_NAME_LENGTH: usize = 63;

/// Decides which ManagedResources belong to this operator instance and which
/// finalizer it puts on the Secrets they reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFilter {
    class: String,
    finalizer: String,
}

impl ClassFilter {
    pub fn new(resource_class: &str) -> Result<Self> {
        let resource_class = resource_class.trim();
        if resource_class.is_empty() {
            return Err(ResourceManagerError::InvalidClass(
                "resource class must not be empty".to_string(),
            ));
        }

        let finalizer = if resource_class == class::DEFAULT {
            class::FINALIZER_BASE.to_string()
        } else {
            format!("{}-{}", class::FINALIZER_BASE, resource_class)
        };

        if !is_qualified_name(&finalizer) {
            return Err(ResourceManagerError::InvalidClass(format!(
                "class {:?} yields finalizer {:?}, which is not a valid qualified name",
                resource_class, finalizer
            )));
        }

        Ok(Self {
            class: resource_class.to_string(),
            finalizer,
        })
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Finalizer identifying this class on Secrets
    pub fn finalizer_name(&self) -> &str {
        &self.finalizer
    }

    /// Check if this instance is responsible for the given ManagedResource.
    /// Resources without a class belong to the default class.
    pub fn responsible(&self, resource: &ManagedResource) -> bool {
        let resource_class = resource
            .spec
            .class
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(class::DEFAULT);
        resource_class == self.class
    }
}

/// Check the `<prefix>/<name>` form Kubernetes requires for finalizers.
/// The name part has at most 63 characters, alphanumeric at both ends,
/// with `-`, `_` and `.` allowed in between.
fn is_qualified_name(value: &str) -> bool {
    let name = match value.split_once('/') {
        Some((prefix, name)) if !prefix.is_empty() && !name.contains('/') => name,
        Some(_) => return false,
        None => value,
    };

    if name.is_empty() || name.len() > MAX_NAME_LENGTH {
        return false;
    }

    let bytes = name.as_bytes();
    bytes[0].is_ascii_alphanumeric()
        && bytes[bytes.len() - 1].is_ascii_alphanumeric()
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

impl Default for ClassFilter {
    fn default() -> Self {
        Self {
            class: class::DEFAULT.to_string(),
            finalizer: class::FINALIZER_BASE.to_string(),
        }
    }
}
