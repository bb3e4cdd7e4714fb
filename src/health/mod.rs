// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Health verdicts for applied workload objects.
//!
//! Every supported kind has its own predicate returning `Ok(())` when the
//! object is healthy and an [`Unhealthy`] diagnostic otherwise. The
//! diagnostics are shown to operators verbatim, so their wording is stable.

mod crd;
mod job;
mod pod;
mod replicas;

pub use crd::check_custom_resource_definition;
pub use job::check_job;
pub use pod::check_pod;
pub use replicas::{check_replica_set, check_replication_controller};

use crate::error::Result;
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{Pod, ReplicationController};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::DynamicObject;
use thiserror::Error;

const CONDITION_TRUE: &str = "True";
const CONDITION_FALSE: &str = "False";

/// Negative health verdict carrying the diagnostic for operators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct Unhealthy(String);

impl Unhealthy {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// A workload object of one of the kinds with a health policy
#[derive(Debug, Clone)]
pub enum Workload {
    CustomResourceDefinition(CustomResourceDefinition),
    Job(Job),
    Pod(Pod),
    ReplicaSet(ReplicaSet),
    ReplicationController(ReplicationController),
}

impl Workload {
    /// Decode a dynamic object into a typed workload.
    /// Any served version of a kind's API group is accepted and decoded into
    /// the current version's type. Returns `None` for kinds without a health
    /// policy.
    pub fn from_dynamic(object: DynamicObject) -> Result<Option<Self>> {
        let Some(types) = object.types.as_ref() else {
            return Ok(None);
        };
        let group = match types.api_version.split_once('/') {
            Some((group, _version)) => group,
            None => "",
        };

        let workload = match (group, types.kind.as_str()) {
            ("apiextensions.k8s.io", "CustomResourceDefinition") => {
                Workload::CustomResourceDefinition(decode(&object)?)
            }
            ("batch", "Job") => Workload::Job(decode(&object)?),
            ("", "Pod") => Workload::Pod(decode(&object)?),
            ("apps" | "extensions", "ReplicaSet") => Workload::ReplicaSet(decode(&object)?),
            ("", "ReplicationController") => Workload::ReplicationController(decode(&object)?),
            _ => return Ok(None),
        };

        Ok(Some(workload))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Workload::CustomResourceDefinition(_) => "CustomResourceDefinition",
            Workload::Job(_) => "Job",
            Workload::Pod(_) => "Pod",
            Workload::ReplicaSet(_) => "ReplicaSet",
            Workload::ReplicationController(_) => "ReplicationController",
        }
    }

    pub fn check(&self) -> std::result::Result<(), Unhealthy> {
        match self {
            Workload::CustomResourceDefinition(crd) => check_custom_resource_definition(crd),
            Workload::Job(job) => check_job(job),
            Workload::Pod(pod) => check_pod(pod),
            Workload::ReplicaSet(rs) => check_replica_set(rs),
            Workload::ReplicationController(rc) => check_replication_controller(rc),
        }
    }
}

/// Check the health of an arbitrary object. Kinds without a health policy
/// are healthy. The outer error only reports objects that cannot be decoded.
pub fn check_health(object: DynamicObject) -> Result<std::result::Result<(), Unhealthy>> {
    Ok(Workload::from_dynamic(object)?
        .map(|workload| workload.check())
        .unwrap_or(Ok(())))
}

fn decode<T: serde::de::DeserializeOwned>(object: &DynamicObject) -> Result<T> {
    Ok(serde_json::from_value(serde_json::to_value(object)?)?)
}

fn required_condition_missing(condition_type: &str) -> Unhealthy {
    Unhealthy::new(format!("condition {:?} is missing", condition_type))
}

fn check_condition_state(
    condition_type: &str,
    expected: &str,
    actual: &str,
    reason: Option<&str>,
    message: Option<&str>,
) -> std::result::Result<(), Unhealthy> {
    if expected != actual {
        return Err(Unhealthy::new(format!(
            "condition {:?} has invalid status {} (expected {}) due to {}: {}",
            condition_type,
            actual,
            expected,
            reason.unwrap_or_default(),
            message.unwrap_or_default()
        )));
    }
    Ok(())
}
