// src/web/validate.rs
// Submission parameter checks

use regex::Regex;
use std::sync::LazyLock;
use sri_types::TestRunParameters;

/// Major with optional minor/patch, pre-release and build metadata
static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    // SAFETY: static literal pattern; compilation cannot fail.
    #[allow(clippy::expect_used)]
    let re = Regex::new(r"^v?\d+(\.\d+)?(\.\d+)?(-[0-9A-Za-z.-]+)?(\+[0-9A-Za-z.-]+)?$")
        .expect("SemVer regex");
    re
});

/// Level names accepted for the harness logger
pub const LOG_LEVELS: [&str; 8] = [
    "CRITICAL", "FATAL", "ERROR", "WARN", "WARNING", "INFO", "DEBUG", "NOTSET",
];

pub fn is_valid_version(version: &str) -> bool {
    SEMVER.is_match(version.trim())
}

pub fn is_valid_log_level(level: &str) -> bool {
    LOG_LEVELS.contains(&level)
}

/// Every problem with the parameters; empty means the run may start.
/// Blank values count as unset.
pub fn validate_parameters(parameters: &TestRunParameters) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(v) = parameters.trapi_version.as_deref().filter(|v| !v.is_empty()) {
        if !is_valid_version(v) {
            errors.push(format!("'trapi_version' parameter '{}' is not a valid SemVer string!", v));
        }
    }
    if let Some(v) = parameters.biolink_version.as_deref().filter(|v| !v.is_empty()) {
        if !is_valid_version(v) {
            errors.push(format!("'biolink_version' parameter '{}' is not a valid SemVer string!", v));
        }
    }
    if let Some(log) = parameters.log.as_deref().filter(|l| !l.is_empty()) {
        if !is_valid_log_level(log) {
            errors.push(format!("'log' parameter '{}' is not a valid Logging level!", log));
        }
    }

    errors
}
