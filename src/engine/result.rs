//! Result aggregation and reporting.
//!
//! Collects step results and generates summaries.

use crate::platform::host;
use crate::{Check, CheckKind, CheckResult};
use serde::Serialize;

/// Result summary statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub passed: u32,
    pub warned: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total: u32,
    pub total_duration_ms: u64,
}

impl ResultSummary {
    fn from_checks(checks: &[Check]) -> Self {
        let mut summary = ResultSummary::default();

        for check in checks {
            summary.total += 1;

            match &check.result {
                Some(CheckResult::Pass { duration_ms, .. }) => {
                    summary.passed += 1;
                    summary.total_duration_ms += duration_ms;
                }
                Some(CheckResult::Warn { duration_ms, .. }) => {
                    summary.warned += 1;
                    summary.total_duration_ms += duration_ms;
                }
                Some(CheckResult::Fail { duration_ms, .. }) => {
                    summary.failed += 1;
                    summary.total_duration_ms += duration_ms;
                }
                Some(CheckResult::Skip { .. }) | None => {
                    summary.skipped += 1;
                }
            }
        }

        summary
    }
}

/// Everything that happened during one launch or preflight run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchReport {
    pub plan: String,
    pub timestamp: u64,
    pub hostname: String,
    pub checks: Vec<Check>,
    pub total_duration_ms: u64,
}

impl LaunchReport {
    /// Create a new empty report
    pub fn new(plan: &str) -> Self {
        LaunchReport {
            plan: plan.to_string(),
            timestamp: host::unix_timestamp(),
            hostname: String::new(),
            checks: Vec::new(),
            total_duration_ms: 0,
        }
    }

    /// Calculate summary statistics
    pub fn summary(&self) -> ResultSummary {
        ResultSummary::from_checks(&self.checks)
    }

    pub fn has_failures(&self) -> bool {
        self.checks
            .iter()
            .any(|c| c.result.as_ref().is_some_and(CheckResult::is_failure))
    }

    /// Look up a step by id
    pub fn check(&self, id: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.id == id)
    }

    pub fn by_kind(&self, kind: CheckKind) -> Vec<&Check> {
        self.checks.iter().filter(|c| c.kind == kind).collect()
    }
}

/// Result aggregator for collecting step results in execution order
pub struct ResultAggregator {
    plan: String,
    checks: Vec<Check>,
    hostname: String,
    total_duration_ms: u64,
}

impl ResultAggregator {
    pub fn new(plan: &str) -> Self {
        ResultAggregator {
            plan: plan.to_string(),
            checks: Vec::new(),
            hostname: String::new(),
            total_duration_ms: 0,
        }
    }

    /// Set report metadata
    pub fn set_metadata(&mut self, hostname: String, total_duration_ms: u64) {
        self.hostname = hostname;
        self.total_duration_ms = total_duration_ms;
    }

    /// Add a completed step
    pub fn add_result(&mut self, check: Check) {
        self.checks.push(check);
    }

    /// Check if there are any failures
    pub fn has_failures(&self) -> bool {
        self.checks
            .iter()
            .any(|c| c.result.as_ref().is_some_and(CheckResult::is_failure))
    }

    /// Get summary statistics
    pub fn get_summary(&self) -> ResultSummary {
        ResultSummary::from_checks(&self.checks)
    }

    /// Get only failed steps
    pub fn get_failures(&self) -> Vec<&Check> {
        self.checks
            .iter()
            .filter(|c| matches!(&c.result, Some(CheckResult::Fail { .. })))
            .collect()
    }

    /// Create final report
    pub fn to_report(&self) -> LaunchReport {
        LaunchReport {
            plan: self.plan.clone(),
            timestamp: host::unix_timestamp(),
            hostname: self.hostname.clone(),
            checks: self.checks.clone(),
            total_duration_ms: self.total_duration_ms,
        }
    }
}
