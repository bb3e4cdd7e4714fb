// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::Unhealthy;
use k8s_openapi::api::core::v1::Pod;

const HEALTHY_POD_PHASES: &[&str] = &["Running", "Succeeded"];

/// A Pod is healthy if its phase is `Running` or `Succeeded`.
pub fn check_pod(pod: &Pod) -> Result<(), Unhealthy> {
    let phase = pod
        .status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or_default();

    if HEALTHY_POD_PHASES.contains(&phase) {
        return Ok(());
    }

    let expected: Vec<String> = HEALTHY_POD_PHASES
        .iter()
        .map(|p| format!("{:?}", p))
        .collect();
    Err(Unhealthy::new(format!(
        "pod is in invalid phase {:?} (expected one of [{}])",
        phase,
        expected.join(" ")
    )))
}
