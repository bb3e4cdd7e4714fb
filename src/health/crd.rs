// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use super::{check_condition_state, required_condition_missing, Unhealthy};
use super::{CONDITION_FALSE, CONDITION_TRUE};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    CustomResourceDefinition, CustomResourceDefinitionCondition,
};

/// Conditions that must be present with status `True`
const REQUIRED_TRUE_CONDITIONS: &[&str] = &["NamesAccepted", "Established"];
/// Conditions that must have status `False` when present
const OPTIONAL_FALSE_CONDITIONS: &[&str] = &["Terminating"];

/// A CustomResourceDefinition is healthy if its `NamesAccepted` and `Established`
/// conditions are `True` and its `Terminating` condition is missing or `False`.
pub fn check_custom_resource_definition(
    crd: &CustomResourceDefinition,
) -> Result<(), Unhealthy> {
    let conditions = crd
        .status
        .as_ref()
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default();

    for condition_type in REQUIRED_TRUE_CONDITIONS {
        let condition = find_condition(conditions, condition_type)
            .ok_or_else(|| required_condition_missing(condition_type))?;
        check_condition_state(
            condition_type,
            CONDITION_TRUE,
            &condition.status,
            condition.reason.as_deref(),
            condition.message.as_deref(),
        )?;
    }

    for condition_type in OPTIONAL_FALSE_CONDITIONS {
        if let Some(condition) = find_condition(conditions, condition_type) {
            check_condition_state(
                condition_type,
                CONDITION_FALSE,
                &condition.status,
                condition.reason.as_deref(),
                condition.message.as_deref(),
            )?;
        }
    }

    Ok(())
}

fn find_condition<'a>(
    conditions: &'a [CustomResourceDefinitionCondition],
    condition_type: &str,
) -> Option<&'a CustomResourceDefinitionCondition> {
    conditions.iter().find(|c| c.type_ == condition_type)
}
