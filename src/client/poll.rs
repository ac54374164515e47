// src/client/poll.rs
// Status polling loop: poll until complete, then fetch the report

use sri_types::SummaryReport;
use std::time::Duration;
use tracing::{debug, info};

use super::SriTestingClient;
use crate::error::{DashboardError, Result};
use crate::run::{RunPhase, RunTracker};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How often to poll and when to give up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// `None` polls until the run completes or disappears
    pub max_polls: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, max_polls: Option<u32>) -> Self {
        Self { interval, max_polls }
    }
}

impl SriTestingClient {
    /// Poll `run_id` until it reports 100%.
    ///
    /// `on_progress` sees the tracker after every observation. An unknown run
    /// ends in `NotFound`; running out of polls ends in `PollBudgetExhausted`.
    pub async fn wait_for_completion<F>(
        &self,
        run_id: &str,
        config: &PollConfig,
        mut on_progress: F,
    ) -> Result<RunTracker>
    where
        F: FnMut(&RunTracker),
    {
        let mut tracker = RunTracker::submitted(run_id);

        loop {
            let status = self.status(run_id).await?;
            let phase = tracker.observe(&status)?;
            on_progress(&tracker);

            if phase == RunPhase::NotFound {
                return Err(DashboardError::NotFound(format!(
                    "test run '{}' is unknown to the server",
                    run_id
                )));
            }
            if phase.polling_done() {
                info!(run_id = %run_id, polls = tracker.polls(), "test run complete");
                return Ok(tracker);
            }

            if config.max_polls.is_some_and(|max| tracker.polls() >= max) {
                return Err(DashboardError::PollBudgetExhausted {
                    run_id: run_id.to_string(),
                    polls: tracker.polls(),
                    percent_complete: tracker.percent_complete().unwrap_or(0),
                });
            }

            debug!(run_id = %run_id, phase = %phase, "waiting for next poll");
            tokio::time::sleep(config.interval).await;
        }
    }

    /// Poll to completion, then retrieve the summary report
    pub async fn wait_for_report(&self, run_id: &str, config: &PollConfig) -> Result<SummaryReport> {
        let mut tracker = self.wait_for_completion(run_id, config, |_| {}).await?;
        let report = self.summary(run_id).await?;
        tracker.report_fetched()?;
        Ok(report)
    }

    /// Fetch the summary, telling an unfinished run apart from an unknown one
    pub async fn summary_checked(&self, run_id: &str) -> Result<SummaryReport> {
        match self.summary(run_id).await {
            Err(DashboardError::NotFound(details)) => {
                let status = self.status(run_id).await?;
                if status.is_not_found() || status.is_complete() {
                    Err(DashboardError::NotFound(details))
                } else {
                    Err(DashboardError::NotReady {
                        run_id: run_id.to_string(),
                        percent_complete: status.percent_complete,
                    })
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{MockFetcher, MockRoutes};
    use crate::fixtures::{self, MOCK_TEST_RUN_ID};
    use serde_json::json;
    use std::sync::Arc;

    fn fast() -> PollConfig {
        PollConfig::new(Duration::from_millis(1), None)
    }

    #[tokio::test]
    async fn test_wait_for_report_on_canned_mock() {
        let client = SriTestingClient::new(Arc::new(fixtures::sri_testing_mock().unwrap()));
        let mut seen = Vec::new();
        let tracker = client
            .wait_for_completion(MOCK_TEST_RUN_ID, &fast(), |t| {
                seen.push(t.percent_complete().unwrap_or(-1))
            })
            .await
            .unwrap();
        assert_eq!(seen, vec![0, 50, 100]);
        assert_eq!(tracker.phase(), RunPhase::Complete);

        let report = client.summary(MOCK_TEST_RUN_ID).await.unwrap();
        assert_eq!(report.summary.unwrap().total(), 88);
    }

    #[tokio::test]
    async fn test_wait_for_unknown_run() {
        let client = SriTestingClient::new(Arc::new(fixtures::sri_testing_mock().unwrap()));
        let err = client.wait_for_report("2022-08-15_18-47-55", &fast()).await.unwrap_err();
        assert!(matches!(err, DashboardError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_poll_budget() {
        let mock = MockFetcher::new(
            MockRoutes::new()
                .on_get("/status/slow")
                .reply(200, json!({"test_run_id": "slow", "percent_complete": 10})),
        );
        let client = SriTestingClient::new(Arc::new(mock));
        let config = PollConfig::new(Duration::from_millis(1), Some(3));
        let err = client.wait_for_report("slow", &config).await.unwrap_err();
        match err {
            DashboardError::PollBudgetExhausted { polls, percent_complete, .. } => {
                assert_eq!(polls, 3);
                assert_eq!(percent_complete, 10);
            }
            other => panic!("expected PollBudgetExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_regression_aborts_polling() {
        let mock = MockFetcher::new(
            MockRoutes::new()
                .on_get("/status/r")
                .reply_once(200, json!({"test_run_id": "r", "percent_complete": 60}))
                .on_get("/status/r")
                .reply(200, json!({"test_run_id": "r", "percent_complete": 20})),
        );
        let client = SriTestingClient::new(Arc::new(mock));
        let err = client.wait_for_report("r", &fast()).await.unwrap_err();
        assert!(matches!(err, DashboardError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_summary_checked_reports_not_ready() {
        let mock = MockFetcher::new(
            MockRoutes::new()
                .on_get("/summary/r")
                .reply(404, json!({"details": "Summary for test run 'r' is not (yet) available?"}))
                .on_get("/status/r")
                .reply(200, json!({"test_run_id": "r", "percent_complete": 50})),
        );
        let client = SriTestingClient::new(Arc::new(mock));
        let err = client.summary_checked("r").await.unwrap_err();
        assert!(matches!(err, DashboardError::NotReady { percent_complete: 50, .. }));
    }

    #[test]
    fn test_default_config() {
        let config = PollConfig::default();
        assert_eq!(config.interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.max_polls, None);
    }
}
