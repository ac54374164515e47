// src/cli/render.rs
// Plain-text rendering of protocol documents for the terminal

use sri_types::{
    Component, OutcomeStatus, RegistrySummary, ResourceIndex, SummaryReport, TestCase,
    TestRunStatus,
};
use std::fmt::Write;

use crate::report::{Finding, ReportTally};
use crate::run::RunTracker;

pub fn status_line(status: &TestRunStatus) -> String {
    if status.is_not_found() {
        format!("{}: not found", status.test_run_id)
    } else {
        format!("{}: {}% complete", status.test_run_id, status.percent_complete)
    }
}

pub fn progress_line(tracker: &RunTracker) -> String {
    format!("{} [poll {}] {}", tracker.run_id(), tracker.polls(), tracker.phase())
}

/// Totals followed by one line per resource
pub fn report_table(report: &SummaryReport, tally: &ReportTally) -> String {
    let mut out = String::new();
    if let Some(id) = &report.id {
        let _ = writeln!(out, "Test run {}", id);
    }
    let _ = writeln!(
        out,
        "{} test cases, {} outcomes: {} passed ({:.0}%), {} failed, {} skipped",
        tally.test_cases,
        tally.outcomes(),
        tally.counts.passed,
        tally.ratio(OutcomeStatus::Passed) * 100.0,
        tally.counts.failed,
        tally.counts.skipped
    );

    let width = tally
        .resources
        .iter()
        .map(|r| r.resource.len())
        .max()
        .unwrap_or(0);
    for r in &tally.resources {
        let _ = writeln!(
            out,
            "  {:<3} {:<width$}  cases {:>3}  passed {:>3}  failed {:>3}  skipped {:>3}",
            r.component.as_str(),
            r.resource,
            r.test_cases,
            r.counts.passed,
            r.counts.failed,
            r.counts.skipped,
            width = width
        );
    }
    out
}

pub fn findings(findings: &[Finding<'_>]) -> String {
    let mut out = String::new();
    for f in findings {
        let _ = writeln!(
            out,
            "{} {} #{} {} {}",
            f.component,
            f.resource,
            f.case.idx,
            f.test_id,
            f.case.triple_label()
        );
        for message in f.outcome.messages() {
            let _ = writeln!(out, "    {}", message);
        }
    }
    out
}

pub fn test_cases(cases: &[TestCase]) -> String {
    let mut out = String::new();
    for case in cases {
        let _ = writeln!(out, "#{} {}", case.idx, case.triple_label());
        for (test_id, outcome) in &case.tests {
            let _ = writeln!(out, "    {:<24} {}", test_id, outcome.status);
        }
    }
    out
}

pub fn registry(registry: &RegistrySummary, component: Option<Component>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} registered resources", registry.total);
    let entries = registry
        .hits
        .iter()
        .filter(|h| component.is_none_or(|c| h.info.translator.component == c));
    for entry in entries {
        let info = &entry.info;
        let _ = writeln!(
            out,
            "  {:<3} {:<24} {} v{} (TRAPI {}, Biolink {}){}",
            info.translator.component.as_str(),
            entry.resource_id().unwrap_or("?"),
            info.title,
            info.version,
            info.trapi.version,
            info.translator.biolink_version.as_deref().unwrap_or("?"),
            info.translator
                .team
                .as_deref()
                .map(|t| format!(" [{}]", t))
                .unwrap_or_default()
        );
    }
    out
}

pub fn index(run_id: &str, index: &ResourceIndex) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Test run {}", run_id);
    for kp in &index.kp {
        let _ = writeln!(out, "  KP  {}", kp);
    }
    for ara in &index.ara {
        let _ = writeln!(out, "  ARA {}", ara);
    }
    out
}
