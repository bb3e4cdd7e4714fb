// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::{check_condition_state, Unhealthy, CONDITION_FALSE};
use k8s_openapi::api::batch::v1::Job;

const FAILED_CONDITION: &str = "Failed";

/// A Job is healthy if its `Failed` condition is missing or `False`.
pub fn check_job(job: &Job) -> Result<(), Unhealthy> {
    let failed = job
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .and_then(|conditions| conditions.iter().find(|c| c.type_ == FAILED_CONDITION));

    match failed {
        None => Ok(()),
        Some(condition) => check_condition_state(
            FAILED_CONDITION,
            CONDITION_FALSE,
            &condition.status,
            condition.reason.as_deref(),
            condition.message.as_deref(),
        ),
    }
}
