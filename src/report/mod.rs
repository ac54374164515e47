// src/report/mod.rs
// Outcome tallies and consistency checks over summary reports

pub mod legacy;

pub use legacy::{legacy_resource_key, legacy_to_test_cases};

use sri_types::{
    Component, Outcome, OutcomeStatus, ResourceIndex, SummaryCounts, SummaryReport, TestCase,
};

use crate::error::{DashboardError, Result};

/// Outcome counts for one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTally {
    pub component: Component,
    pub resource: String,
    pub test_cases: usize,
    pub counts: SummaryCounts,
}

/// Outcome counts for a whole report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportTally {
    pub counts: SummaryCounts,
    pub test_cases: usize,
    pub resources: Vec<ResourceTally>,
}

impl ReportTally {
    /// Number of unit test outcome records
    pub fn outcomes(&self) -> u64 {
        self.counts.total()
    }

    /// Share of outcomes with the given status, 0.0 for an empty report
    pub fn ratio(&self, status: OutcomeStatus) -> f64 {
        match self.outcomes() {
            0 => 0.0,
            total => self.counts.get(status) as f64 / total as f64,
        }
    }
}

/// Count every outcome record in the report, resource by resource
pub fn tally(report: &SummaryReport) -> ReportTally {
    let mut tally = ReportTally::default();

    for component in Component::ALL {
        for (name, cases) in report.resources(component) {
            let mut counts = SummaryCounts::default();
            for case in cases {
                for outcome in case.tests.values() {
                    counts.record(outcome.status);
                }
            }
            tally.counts.failed += counts.failed;
            tally.counts.passed += counts.passed;
            tally.counts.skipped += counts.skipped;
            tally.test_cases += cases.len();
            tally.resources.push(ResourceTally {
                component,
                resource: name.clone(),
                test_cases: cases.len(),
                counts,
            });
        }
    }

    tally
}

/// Tally the report and check it against its declared `SUMMARY` block, if any
pub fn verify(report: &SummaryReport) -> Result<ReportTally> {
    let tally = tally(report);
    if let Some(declared) = report.summary {
        if declared != tally.counts {
            return Err(DashboardError::Protocol(format!(
                "SUMMARY declares {} failed / {} passed / {} skipped but the report holds {} / {} / {}",
                declared.failed,
                declared.passed,
                declared.skipped,
                tally.counts.failed,
                tally.counts.passed,
                tally.counts.skipped
            )));
        }
    }
    Ok(tally)
}

/// Copy of the report with `SUMMARY` recomputed from its contents
pub fn with_computed_summary(report: &SummaryReport) -> SummaryReport {
    let mut stamped = report.clone();
    stamped.summary = Some(tally(report).counts);
    stamped
}

/// KP and ARA resource names of the report
pub fn index(report: &SummaryReport) -> ResourceIndex {
    ResourceIndex {
        kp: report.kp.keys().cloned().collect(),
        ara: report.ara.keys().cloned().collect(),
    }
}

/// Report key of a KP tested through an ARA
pub fn ara_resource_key(ara_id: &str, kp_id: &str) -> String {
    format!("{}|{}", ara_id, kp_id)
}

/// One unit test that did not pass
#[derive(Debug, Clone, PartialEq)]
pub struct Finding<'a> {
    pub component: Component,
    pub resource: &'a str,
    pub case: &'a TestCase,
    pub test_id: &'a str,
    pub outcome: &'a Outcome,
}

/// Every outcome with the given status, in report order
pub fn findings(report: &SummaryReport, status: OutcomeStatus) -> Vec<Finding<'_>> {
    report
        .test_cases()
        .flat_map(|(component, resource, case)| {
            case.tests
                .iter()
                .filter(move |(_, outcome)| outcome.status == status)
                .map(move |(test_id, outcome)| Finding {
                    component,
                    resource,
                    case,
                    test_id: test_id.as_str(),
                    outcome,
                })
        })
        .collect()
}
