//! bi-launcher library
//!
//! Preflight checks and launcher for the BI dashboard and product
//! categorization toolkit.
//!
//! A launch is described by a [`plan::LaunchPlan`]: an ordered list of
//! prerequisites (interpreter, importable libraries), an ordered list of
//! required files, and the program to hand off to. The
//! [`engine::orchestrator::LaunchOrchestrator`] walks the plan step by step,
//! installs missing libraries when allowed, and finally runs the target with
//! inherited stdio, relaying its exit status.
//!
//! # Example
//!
//! ```no_run
//! use bi_launcher::config::LauncherConfig;
//! use bi_launcher::platform::process::SystemRunner;
//! use bi_launcher::run_plan;
//!
//! let config = LauncherConfig::default();
//! let outcome = run_plan(&config, Some("dashboard"), &SystemRunner).expect("unknown plan");
//! std::process::exit(i32::from(outcome.exit_code()));
//! ```

pub mod checks;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod plan;
pub mod platform;
pub mod version;

use config::{ConfigError, LauncherConfig};
use engine::orchestrator::{LaunchOrchestrator, LaunchOutcome, OrchestratorConfig};
use platform::process::ProcessRunner;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub use engine::orchestrator::LaunchOrchestrator as Orchestrator;
pub use engine::result::{LaunchReport as Report, ResultSummary};

/// Outcome of a single launch step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CheckResult {
    /// Step passed
    Pass {
        message: String,
        duration_ms: u64,
    },
    /// Step passed but something deserves attention
    Warn {
        message: String,
        details: String,
        duration_ms: u64,
    },
    /// Step failed
    Fail {
        message: String,
        details: String,
        duration_ms: u64,
    },
    /// Step was not evaluated
    Skip {
        reason: String,
    },
}

impl CheckResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, CheckResult::Fail { .. })
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckResult::Pass { message, .. } => write!(f, "PASS: {}", message),
            CheckResult::Warn { message, details, .. } => {
                write!(f, "WARN: {} ({})", message, details)
            }
            CheckResult::Fail { message, details, .. } => {
                write!(f, "FAIL: {} ({})", message, details)
            }
            CheckResult::Skip { reason } => write!(f, "SKIP: {}", reason),
        }
    }
}

/// What a launch step verifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// The interpreter that runs the target scripts
    Interpreter,
    /// An importable library
    Library,
    /// A required file on disk
    Artifact,
    /// Hand-off to the target program
    Delegation,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::Interpreter => write!(f, "Interpreter"),
            CheckKind::Library => write!(f, "Library"),
            CheckKind::Artifact => write!(f, "Artifact"),
            CheckKind::Delegation => write!(f, "Delegation"),
        }
    }
}

/// A launch step with its result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    /// Identifier assigned by position (e.g., "PRE-002", "ART-001")
    pub id: String,
    /// Human-readable name
    pub name: String,
    pub kind: CheckKind,
    /// What this step verifies
    pub description: String,
    /// Result of the step (None if not yet executed)
    pub result: Option<CheckResult>,
}

/// Why a launch was aborted.
///
/// Every variant is terminal to the run. The operator fixes the cause and
/// runs the launcher again.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaunchError {
    /// A prerequisite is absent and cannot (or may not) be installed
    #[error("{name} is missing: {reason}")]
    PrerequisiteMissing {
        check_id: String,
        name: String,
        reason: String,
        hint: Option<String>,
    },
    /// The install command for a missing prerequisite did not fix it
    #[error("installing {name} failed: {reason}")]
    RemediationFailed {
        check_id: String,
        name: String,
        command: String,
        reason: String,
    },
    /// A required file does not exist at any candidate location
    #[error("required file '{label}' was not found")]
    ArtifactMissing {
        check_id: String,
        label: String,
        hint: String,
        searched: Vec<PathBuf>,
    },
    /// The target program could not be started
    #[error("could not start {command}: {reason}")]
    DelegationFailed {
        check_id: String,
        command: String,
        reason: String,
    },
}

impl LaunchError {
    /// Id of the step that produced this error
    pub fn check_id(&self) -> &str {
        match self {
            LaunchError::PrerequisiteMissing { check_id, .. }
            | LaunchError::RemediationFailed { check_id, .. }
            | LaunchError::ArtifactMissing { check_id, .. }
            | LaunchError::DelegationFailed { check_id, .. } => check_id,
        }
    }

    /// Operator guidance: what to do about the failure
    pub fn details(&self) -> String {
        match self {
            LaunchError::PrerequisiteMissing { hint, .. } => hint.clone().unwrap_or_default(),
            LaunchError::RemediationFailed { command, .. } => {
                format!("Install it manually: {}", command)
            }
            LaunchError::ArtifactMissing { hint, searched, .. } => {
                let mut details = hint.clone();
                if !searched.is_empty() {
                    details.push_str("\nSearched:");
                    for path in searched {
                        details.push_str(&format!("\n  - {}", path.display()));
                    }
                }
                details
            }
            LaunchError::DelegationFailed { .. } => {
                "Check that the interpreter and the target script are runnable".to_string()
            }
        }
    }

    /// Process exit code for an aborted launch
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Report entry for the failing step
    pub fn to_check_result(&self, duration_ms: u64) -> CheckResult {
        CheckResult::Fail {
            message: self.to_string(),
            details: self.details(),
            duration_ms,
        }
    }
}

/// Resolve a plan by name and run it.
///
/// This is the main library entry point. `plan_name` of `None` selects the
/// configured default plan.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the plan is unknown or its definition is
/// invalid. Launch failures are not errors here; they are reported through
/// [`LaunchOutcome::Aborted`].
pub fn run_plan(
    config: &LauncherConfig,
    plan_name: Option<&str>,
    runner: &dyn ProcessRunner,
) -> Result<LaunchOutcome, ConfigError> {
    let plan = plan::profiles::resolve_plan(config, plan_name)?;
    let orchestrator = LaunchOrchestrator::new(OrchestratorConfig::from_launcher(config), runner);
    Ok(orchestrator.run(&plan))
}
