// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResourceManagerError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("Conflict while updating {namespace}/{name}: {message}")]
    Conflict {
        namespace: String,
        name: String,
        message: String,
    },

    #[error("Invalid resource class: {0}")]
    InvalidClass(String),

    #[error("Failed to decode object: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Operation cancelled by shutdown")]
    Cancelled,
}

impl ResourceManagerError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ResourceManagerError::NotFound { .. } => true,
            ResourceManagerError::KubeError(kube::Error::Api(err)) => err.code == 404,
            _ => false,
        }
    }

    pub fn is_conflict(&self) -> bool {
        match self {
            ResourceManagerError::Conflict { .. } => true,
            ResourceManagerError::KubeError(kube::Error::Api(err)) => err.code == 409,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResourceManagerError>;
