// src/report/legacy.rs
// Conversion of the older per-resource report documents

use sri_types::{Component, LegacyResourceSummary, Outcome, OutcomeStatus, TestCase};
use std::collections::BTreeMap;

use crate::error::{DashboardError, Result};

/// Test cases of a legacy resource summary, ordered by edge number
pub fn legacy_to_test_cases(legacy: &LegacyResourceSummary) -> Result<Vec<TestCase>> {
    let mut cases = legacy
        .summary
        .edges
        .iter()
        .map(|(edge_num, edge)| -> Result<TestCase> {
            let idx: u32 = edge_num.parse().map_err(|_| {
                DashboardError::Protocol(format!("edge number '{}' is not an integer", edge_num))
            })?;

            let tests: BTreeMap<String, Outcome> = edge
                .results
                .iter()
                .map(|(test_id, result)| -> Result<(String, Outcome)> {
                    let status = OutcomeStatus::parse(&result.outcome).ok_or_else(|| {
                        DashboardError::Protocol(format!(
                            "edge {} test '{}' has unknown outcome '{}'",
                            edge_num, test_id, result.outcome
                        ))
                    })?;
                    let messages = if result.errors.is_empty() {
                        vec![String::new()]
                    } else {
                        result.errors.clone()
                    };
                    Ok((test_id.clone(), Outcome::new(status, messages)))
                })
                .collect::<Result<_>>()?;

            let data = &edge.test_data;
            Ok(TestCase {
                idx,
                subject_category: data.subject_category.clone(),
                object_category: data.object_category.clone(),
                predicate: data.predicate.clone(),
                subject: data.subject.clone(),
                object: data.object.clone(),
                tests,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    cases.sort_by_key(|c| c.idx);
    Ok(cases)
}

/// Component and resource named by a document key such as `KP/molepro/resource_summary`
/// or `ARA/aragorn/molepro/resource_summary`
pub fn legacy_resource_key(document_key: &str) -> Option<(Component, String)> {
    let mut parts: Vec<&str> = document_key.split('/').collect();
    if parts.last() == Some(&"resource_summary") {
        parts.pop();
    }
    let (first, rest) = parts.split_first()?;
    let component = Component::parse(first)?;
    match (component, rest) {
        (Component::Kp, [kp]) => Some((component, kp.to_string())),
        (Component::Ara, [ara, kp]) => Some((component, format!("{}|{}", ara, kp))),
        _ => None,
    }
}
