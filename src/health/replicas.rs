// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::Unhealthy;
use k8s_openapi::api::apps::v1::ReplicaSet;
use k8s_openapi::api::core::v1::ReplicationController;

/// A ReplicaSet is healthy if its controller observed the current generation
/// and at least the desired number of replicas is ready.
pub fn check_replica_set(rs: &ReplicaSet) -> Result<(), Unhealthy> {
    let status = rs.status.as_ref();
    check_replicas(
        "ReplicaSet",
        rs.metadata.generation.unwrap_or_default(),
        status.and_then(|s| s.observed_generation).unwrap_or_default(),
        rs.spec.as_ref().and_then(|s| s.replicas),
        status.and_then(|s| s.ready_replicas).unwrap_or_default(),
    )
}

/// Same policy as [`check_replica_set`].
pub fn check_replication_controller(rc: &ReplicationController) -> Result<(), Unhealthy> {
    let status = rc.status.as_ref();
    check_replicas(
        "ReplicationController",
        rc.metadata.generation.unwrap_or_default(),
        status.and_then(|s| s.observed_generation).unwrap_or_default(),
        rc.spec.as_ref().and_then(|s| s.replicas),
        status.and_then(|s| s.ready_replicas).unwrap_or_default(),
    )
}

fn check_replicas(
    kind: &str,
    generation: i64,
    observed_generation: i64,
    desired_replicas: Option<i32>,
    ready_replicas: i32,
) -> Result<(), Unhealthy> {
    if observed_generation < generation {
        return Err(Unhealthy::new(format!(
            "observed generation outdated ({}/{})",
            observed_generation, generation
        )));
    }

    if desired_replicas.is_some_and(|desired| ready_replicas < desired) {
        return Err(Unhealthy::new(format!(
            "{} does not have minimum availability",
            kind
        )));
    }

    Ok(())
}
