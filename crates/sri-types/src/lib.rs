// crates/sri-types/src/lib.rs
// Shared types for the SRI Testing run/report protocol (native + WASM compatible)
// No native-only dependencies allowed here

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// `percent_complete` reported for a run id the server does not know
pub const NOT_FOUND_PERCENT: i32 = -1;

/// `percent_complete` of a finished run
pub const COMPLETE_PERCENT: i32 = 100;

/// Placeholder used in test cases whose triple could not be resolved
pub const UNKNOWN: &str = "UNKNOWN";

/// Run id handed back when submission parameters fail validation
pub const INVALID_PARAMETERS_RUN_ID: &str = "Invalid Parameters - test run not started...";

/// Worker data access timeout (seconds) when none is requested
pub const DEFAULT_WORKER_TIMEOUT: u64 = 120;

// ═══════════════════════════════════════
// RUN LIFECYCLE
// ═══════════════════════════════════════

/// Body of `POST /run_tests`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunParameters {
    /// TRAPI version overriding the registry `x-trapi` value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trapi_version: Option<String>,
    /// Biolink Model version overriding the registry `x-translator` value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biolink_version: Option<String>,
    /// Worker data access timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Log level handed to the test harness
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
}

impl TestRunParameters {
    pub fn effective_timeout(&self) -> u64 {
        self.timeout.unwrap_or(DEFAULT_WORKER_TIMEOUT)
    }
}

/// Response of `POST /run_tests`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunSession {
    pub test_run_id: String,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl TestRunSession {
    pub fn started(test_run_id: impl Into<String>) -> Self {
        Self {
            test_run_id: test_run_id.into(),
            errors: None,
        }
    }

    pub fn rejected(errors: Vec<String>) -> Self {
        Self {
            test_run_id: INVALID_PARAMETERS_RUN_ID.to_string(),
            errors: Some(errors),
        }
    }

    /// True when the server refused to start the run
    pub fn is_rejected(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }
}

/// Response of `GET /status/{run_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunStatus {
    pub test_run_id: String,
    pub percent_complete: i32,
}

impl TestRunStatus {
    pub fn new(test_run_id: impl Into<String>, percent_complete: i32) -> Self {
        Self {
            test_run_id: test_run_id.into(),
            percent_complete,
        }
    }

    pub fn not_found(test_run_id: impl Into<String>) -> Self {
        Self::new(test_run_id, NOT_FOUND_PERCENT)
    }

    pub fn is_not_found(&self) -> bool {
        self.percent_complete == NOT_FOUND_PERCENT
    }

    pub fn is_complete(&self) -> bool {
        self.percent_complete >= COMPLETE_PERCENT
    }
}

/// Error payload carried by 400/404 responses.
///
/// The dashboard mock uses `details`, the service itself `message`; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    #[serde(alias = "message")]
    pub details: String,
}

impl ApiMessage {
    pub fn new(details: impl Into<String>) -> Self {
        Self {
            details: details.into(),
        }
    }
}

/// Envelope used by the index and resource endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRunSummary<T> {
    pub test_run_id: String,
    pub summary: T,
}

// ═══════════════════════════════════════
// COMPONENTS & OUTCOMES
// ═══════════════════════════════════════

/// Translator component category under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Component {
    #[serde(rename = "KP")]
    Kp,
    #[serde(rename = "ARA")]
    Ara,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::Kp, Component::Ara];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kp => "KP",
            Self::Ara => "ARA",
        }
    }

    /// Parse component from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "KP" => Some(Self::Kp),
            "ARA" => Some(Self::Ara),
            _ => None,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status key of an outcome record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeStatus {
    Passed,
    Failed,
    Skipped,
}

impl OutcomeStatus {
    pub const ALL: [OutcomeStatus; 3] = [
        OutcomeStatus::Passed,
        OutcomeStatus::Failed,
        OutcomeStatus::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }

    /// Parse a status key; accepts `PASSED` as well as the legacy `passed`
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PASSED" => Some(Self::Passed),
            "FAILED" => Some(Self::Failed),
            "SKIPPED" => Some(Self::Skipped),
            _ => None,
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a JSON object could not be read as an outcome record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeError {
    Empty,
    Ambiguous(Vec<String>),
    UnknownStatus(String),
}

impl fmt::Display for OutcomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "outcome record has no status key"),
            Self::Ambiguous(keys) => {
                write!(f, "outcome record has several status keys: {}", keys.join(", "))
            }
            Self::UnknownStatus(key) => write!(f, "unknown outcome status '{}'", key),
        }
    }
}

impl std::error::Error for OutcomeError {}

/// One unit test result: exactly one status with its messages.
///
/// On the wire this is `{"PASSED": [""]}`; an empty string means "no message".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Vec<String>>",
    into = "BTreeMap<String, Vec<String>>"
)]
pub struct Outcome {
    pub status: OutcomeStatus,
    pub messages: Vec<String>,
}

impl Outcome {
    pub fn new(status: OutcomeStatus, messages: Vec<String>) -> Self {
        Self { status, messages }
    }

    pub fn passed() -> Self {
        Self::new(OutcomeStatus::Passed, vec![String::new()])
    }

    /// Messages with the empty "no message" markers removed
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .map(String::as_str)
            .filter(|m| !m.is_empty())
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for Outcome {
    type Error = OutcomeError;

    fn try_from(record: BTreeMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        if record.len() > 1 {
            return Err(OutcomeError::Ambiguous(record.into_keys().collect()));
        }
        let (key, messages) = record.into_iter().next().ok_or(OutcomeError::Empty)?;
        let status = OutcomeStatus::parse(&key).ok_or(OutcomeError::UnknownStatus(key))?;
        Ok(Self { status, messages })
    }
}

impl From<Outcome> for BTreeMap<String, Vec<String>> {
    fn from(outcome: Outcome) -> Self {
        BTreeMap::from([(outcome.status.as_str().to_string(), outcome.messages)])
    }
}

// ═══════════════════════════════════════
// SUMMARY REPORT
// ═══════════════════════════════════════

/// One S-P-O test triple and the unit tests run against it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub idx: u32,
    pub subject_category: String,
    pub object_category: String,
    pub predicate: String,
    pub subject: String,
    pub object: String,
    #[serde(default)]
    pub tests: BTreeMap<String, Outcome>,
}

impl TestCase {
    /// Edge label in the `(subject$category)--[predicate]->(object$category)` notation
    pub fn triple_label(&self) -> String {
        format!(
            "({}${})--[{}]->({}${})",
            self.subject, self.subject_category, self.predicate, self.object, self.object_category
        )
    }

    pub fn is_unknown(&self) -> bool {
        self.predicate == UNKNOWN && self.subject == UNKNOWN && self.object == UNKNOWN
    }
}

/// `SUMMARY` block of a report. Counts travel as strings (`"6"`) but integers are accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    #[serde(rename = "FAILED", with = "count_string", default)]
    pub failed: u64,
    #[serde(rename = "PASSED", with = "count_string", default)]
    pub passed: u64,
    #[serde(rename = "SKIPPED", with = "count_string", default)]
    pub skipped: u64,
}

impl SummaryCounts {
    pub fn total(&self) -> u64 {
        self.failed + self.passed + self.skipped
    }

    pub fn get(&self, status: OutcomeStatus) -> u64 {
        match status {
            OutcomeStatus::Passed => self.passed,
            OutcomeStatus::Failed => self.failed,
            OutcomeStatus::Skipped => self.skipped,
        }
    }

    pub fn record(&mut self, status: OutcomeStatus) {
        match status {
            OutcomeStatus::Passed => self.passed += 1,
            OutcomeStatus::Failed => self.failed += 1,
            OutcomeStatus::Skipped => self.skipped += 1,
        }
    }
}

mod count_string {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Int(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        match Count::deserialize(deserializer)? {
            Count::Int(n) => Ok(n),
            Count::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid count '{}'", s))),
        }
    }
}

/// Summary of a completed test run, keyed by component then resource name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "KP", default)]
    pub kp: BTreeMap<String, Vec<TestCase>>,
    #[serde(rename = "ARA", default)]
    pub ara: BTreeMap<String, Vec<TestCase>>,
    #[serde(rename = "SUMMARY", default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SummaryCounts>,
}

impl SummaryReport {
    pub fn resources(&self, component: Component) -> &BTreeMap<String, Vec<TestCase>> {
        match component {
            Component::Kp => &self.kp,
            Component::Ara => &self.ara,
        }
    }

    pub fn resource(&self, component: Component, name: &str) -> Option<&[TestCase]> {
        self.resources(component).get(name).map(Vec::as_slice)
    }

    /// Every test case in the report, KP resources first
    pub fn test_cases(&self) -> impl Iterator<Item = (Component, &str, &TestCase)> {
        Component::ALL.into_iter().flat_map(move |component| {
            self.resources(component).iter().flat_map(move |(name, cases)| {
                cases.iter().map(move |case| (component, name.as_str(), case))
            })
        })
    }
}

/// KP and ARA resource names present in a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIndex {
    #[serde(rename = "KP", default)]
    pub kp: Vec<String>,
    #[serde(rename = "ARA", default)]
    pub ara: Vec<String>,
}

/// Path key of `GET /details/{component}/{resource}/{test_id}/{idx}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetailKey {
    pub component: Component,
    pub resource: String,
    pub test_id: String,
    pub idx: u32,
}

impl DetailKey {
    pub fn new(
        component: Component,
        resource: impl Into<String>,
        test_id: impl Into<String>,
        idx: u32,
    ) -> Self {
        Self {
            component,
            resource: resource.into(),
            test_id: test_id.into(),
            idx,
        }
    }
}

// ═══════════════════════════════════════
// LEGACY RESOURCE SUMMARY
// ═══════════════════════════════════════

/// Older per-resource report document (`KP/<name>/resource_summary`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyResourceSummary {
    pub test_run_id: String,
    pub summary: LegacyEdgeSummaries,
}

/// Edge number → edge result, alongside the document key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEdgeSummaries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_key: Option<String>,
    #[serde(flatten)]
    pub edges: BTreeMap<String, LegacyEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEdge {
    pub test_data: LegacyTestData,
    #[serde(default)]
    pub results: BTreeMap<String, LegacyResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTestData {
    pub subject_category: String,
    pub object_category: String,
    pub predicate: String,
    pub subject: String,
    pub object: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyResult {
    pub outcome: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

// ═══════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════

/// Response of `GET /registry`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySummary {
    pub total: usize,
    #[serde(default)]
    pub hits: Vec<RegistryEntry>,
}

impl RegistrySummary {
    pub fn new(hits: Vec<RegistryEntry>) -> Self {
        Self {
            total: hits.len(),
            hits,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.hits.len()
    }

    pub fn of_component(&self, component: Component) -> impl Iterator<Item = &RegistryEntry> {
        self.hits
            .iter()
            .filter(move |h| h.info.translator.component == component)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub info: ServiceInfo,
}

impl RegistryEntry {
    /// Resource name as used in reports (`infores:test-kp-1` → `test-kp-1`)
    pub fn resource_id(&self) -> Option<&str> {
        self.info
            .translator
            .infores
            .as_deref()
            .map(|i| i.strip_prefix("infores:").unwrap_or(i))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub title: String,
    pub version: String,
    #[serde(rename = "x-translator")]
    pub translator: TranslatorInfo,
    #[serde(rename = "x-trapi")]
    pub trapi: TrapiInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatorInfo {
    pub component: Component,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infores: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(
        rename = "biolink-version",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub biolink_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrapiInfo {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_data_location: Option<String>,
}
