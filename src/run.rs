// src/run.rs
// Client-observed lifecycle of a single test run

use sri_types::{COMPLETE_PERCENT, NOT_FOUND_PERCENT, TestRunStatus};
use std::fmt;
use tracing::{debug, warn};

use crate::error::{DashboardError, Result};

/// Where a run stands from the client's point of view.
///
/// `Submitted → InProgress(0..99) → Complete → ReportAvailable`, with
/// `NotFound` reachable from any polling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Submitted,
    InProgress(u8),
    Complete,
    ReportAvailable,
    NotFound,
}

impl RunPhase {
    /// No further polling is useful
    pub fn polling_done(&self) -> bool {
        matches!(self, Self::Complete | Self::ReportAvailable | Self::NotFound)
    }

    /// The run will never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ReportAvailable | Self::NotFound)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => write!(f, "submitted"),
            Self::InProgress(p) => write!(f, "in progress ({}%)", p),
            Self::Complete => write!(f, "complete"),
            Self::ReportAvailable => write!(f, "report available"),
            Self::NotFound => write!(f, "not found"),
        }
    }
}

/// Folds status observations for one run id into a [`RunPhase`].
///
/// Rejects observations that move progress backwards.
#[derive(Debug, Clone)]
pub struct RunTracker {
    run_id: String,
    phase: RunPhase,
    highest: Option<i32>,
    polls: u32,
}

impl RunTracker {
    pub fn submitted(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            phase: RunPhase::Submitted,
            highest: None,
            polls: 0,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Highest percentage seen so far
    pub fn percent_complete(&self) -> Option<i32> {
        self.highest
    }

    pub fn observe(&mut self, status: &TestRunStatus) -> Result<RunPhase> {
        self.polls += 1;

        if self.phase.is_terminal() {
            debug!(run_id = %self.run_id, phase = %self.phase, "ignoring status for settled run");
            return Ok(self.phase);
        }

        let percent = status.percent_complete;
        if percent == NOT_FOUND_PERCENT {
            self.phase = RunPhase::NotFound;
            return Ok(self.phase);
        }

        if status.test_run_id != self.run_id {
            warn!(
                run_id = %self.run_id,
                reported = %status.test_run_id,
                "status reply names a different run id"
            );
        }

        if !(0..=COMPLETE_PERCENT).contains(&percent) {
            return Err(DashboardError::Protocol(format!(
                "percent_complete {} for run '{}' is outside 0..=100",
                percent, self.run_id
            )));
        }

        if let Some(previous) = self.highest {
            if percent < previous {
                return Err(DashboardError::Protocol(format!(
                    "progress of run '{}' went backwards from {}% to {}%",
                    self.run_id, previous, percent
                )));
            }
        }

        self.highest = Some(percent);
        self.phase = if percent == COMPLETE_PERCENT {
            RunPhase::Complete
        } else {
            RunPhase::InProgress(percent as u8)
        };
        Ok(self.phase)
    }

    /// Record that the summary report was retrieved
    pub fn report_fetched(&mut self) -> Result<()> {
        match self.phase {
            RunPhase::Complete | RunPhase::ReportAvailable => {
                self.phase = RunPhase::ReportAvailable;
                Ok(())
            }
            other => Err(DashboardError::Protocol(format!(
                "report for run '{}' fetched while {}",
                self.run_id, other
            ))),
        }
    }
}
