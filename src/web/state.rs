// src/web/state.rs
// Stand-in server state: simulated test runs and the fixture documents they report

use chrono::Local;
use sri_types::{COMPLETE_PERCENT, RegistrySummary, SummaryReport, TestRunParameters};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::fixtures::{self, MOCK_TEST_RUN_ID};
use crate::report;

const RUN_ID_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// One simulated test run
#[derive(Debug, Clone)]
pub struct SimulatedRun {
    pub id: String,
    pub parameters: TestRunParameters,
    pub percent_complete: i32,
    /// Set once a status poll has answered 100; the report is served only after that
    pub completion_reported: bool,
    pub report: Arc<SummaryReport>,
}

/// Where new run ids come from
#[derive(Debug, Clone)]
enum RunIds {
    /// Local timestamp, suffixed on collision
    Timestamp,
    /// Every submission names the same run, like the dashboard's canned mock
    Fixed(String),
}

/// Simulated runs in submission order.
///
/// Each status poll answers the current percentage and then advances it by
/// `step`, so the first poll of a fresh run always answers 0.
#[derive(Debug)]
pub struct RunStore {
    runs: HashMap<String, SimulatedRun>,
    order: Vec<String>,
    step: i32,
    ids: RunIds,
    preassigned: VecDeque<String>,
}

impl RunStore {
    pub fn new(step: u8) -> Self {
        Self {
            runs: HashMap::new(),
            order: Vec::new(),
            step: i32::from(step.clamp(1, 100)),
            ids: RunIds::Timestamp,
            preassigned: VecDeque::new(),
        }
    }

    /// Hand out these ids, in order, before falling back to the normal scheme
    pub fn preassign(&mut self, ids: impl IntoIterator<Item = String>) {
        self.preassigned.extend(ids);
    }

    fn next_id(&mut self) -> String {
        if let Some(id) = self.preassigned.pop_front() {
            return id;
        }
        match &self.ids {
            RunIds::Fixed(id) => id.clone(),
            RunIds::Timestamp => {
                let base = Local::now().format(RUN_ID_FORMAT).to_string();
                let mut candidate = base.clone();
                let mut n = 2;
                while self.runs.contains_key(&candidate) {
                    candidate = format!("{}_{}", base, n);
                    n += 1;
                }
                candidate
            }
        }
    }

    /// Register a new run and return its id. Resubmitting an existing fixed id
    /// restarts that run from 0% under the same `/list` entry.
    pub fn start(&mut self, parameters: TestRunParameters, template: &SummaryReport) -> String {
        let id = self.next_id();
        if let Some(run) = self.runs.get_mut(&id) {
            debug!(run_id = %id, "restarting run");
            run.parameters = parameters;
            run.percent_complete = 0;
            run.completion_reported = false;
            return id;
        }

        let mut report = report::with_computed_summary(template);
        report.id = Some(id.clone());
        self.runs.insert(
            id.clone(),
            SimulatedRun {
                id: id.clone(),
                parameters,
                percent_complete: 0,
                completion_reported: false,
                report: Arc::new(report),
            },
        );
        self.order.push(id.clone());
        id
    }

    /// Current percentage of a run, advancing it for the next poll. `None` for unknown ids.
    pub fn poll(&mut self, id: &str) -> Option<i32> {
        let step = self.step;
        let run = self.runs.get_mut(id)?;
        let current = run.percent_complete;
        if current >= COMPLETE_PERCENT {
            run.completion_reported = true;
        } else {
            run.percent_complete = (current + step).min(COMPLETE_PERCENT);
        }
        Some(current)
    }

    /// Run whose completion has been observed
    pub fn completed(&self, id: &str) -> Option<&SimulatedRun> {
        self.runs.get(id).filter(|r| r.completion_reported)
    }

    /// Report of a run whose completion has been observed
    pub fn report(&self, id: &str) -> Option<Arc<SummaryReport>> {
        self.completed(id).map(|r| r.report.clone())
    }

    /// Most recently submitted run with an available report
    pub fn latest_report(&self) -> Option<Arc<SummaryReport>> {
        self.order.iter().rev().find_map(|id| self.report(id))
    }

    pub fn ids(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Simulated runs
    pub runs: Arc<RwLock<RunStore>>,
    /// Registry served by `/registry`
    pub registry: Arc<RegistrySummary>,
    /// Report every run produces
    pub template: Arc<SummaryReport>,
}

impl AppState {
    /// State over the bundled fixtures
    pub fn new(step: u8) -> Result<Self> {
        Ok(Self::with_documents(
            RunStore::new(step),
            fixtures::registry()?,
            fixtures::summary_report()?,
        ))
    }

    /// Every submission yields the canned mock run id
    pub fn canned(step: u8) -> Result<Self> {
        let mut store = RunStore::new(step);
        store.ids = RunIds::Fixed(MOCK_TEST_RUN_ID.to_string());
        Ok(Self::with_documents(
            store,
            fixtures::registry()?,
            fixtures::summary_report()?,
        ))
    }

    pub fn with_documents(store: RunStore, registry: RegistrySummary, template: SummaryReport) -> Self {
        Self {
            runs: Arc::new(RwLock::new(store)),
            registry: Arc::new(registry),
            template: Arc::new(template),
        }
    }
}
