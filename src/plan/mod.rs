//! Launch plan data model.
//!
//! A [`LaunchPlan`] bundles everything the orchestrator needs for one run:
//! - Prerequisites: capabilities checked in order (interpreter, libraries)
//! - Artifacts: files that must exist before hand-off
//! - Delegation target: the program to run once every check passes
//!
//! Plans are plain values. Nothing here touches the filesystem or spawns
//! processes; that happens in `checks` and `engine`.

pub mod definition;
pub mod profiles;
pub mod version;

pub use version::{InvalidVersion, Version};

use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// What kind of capability a prerequisite stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrerequisiteKind {
    /// The script interpreter. Has no remediation.
    Interpreter {
        /// Versions below this fail the check
        minimum: Option<Version>,
        /// Versions below this pass with a warning
        recommended: Option<Version>,
    },
    /// An importable library, installable with the interpreter's package manager.
    Library {
        /// Distribution name passed to the installer (e.g. "dash-bootstrap-components")
        package: String,
        /// Importable module name (e.g. "dash_bootstrap_components")
        module: String,
    },
}

/// A named capability checked once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerequisite {
    pub name: String,
    pub kind: PrerequisiteKind,
}

impl Prerequisite {
    pub fn interpreter(minimum: Option<Version>, recommended: Option<Version>) -> Self {
        Prerequisite {
            name: "Python interpreter".to_string(),
            kind: PrerequisiteKind::Interpreter { minimum, recommended },
        }
    }

    /// A library whose module name is derived from the package name.
    pub fn library(package: &str) -> Self {
        Self::library_with_module(package, &module_name_for(package))
    }

    pub fn library_with_module(package: &str, module: &str) -> Self {
        Prerequisite {
            name: package.to_string(),
            kind: PrerequisiteKind::Library {
                package: package.to_string(),
                module: module.to_string(),
            },
        }
    }

    /// Whether a missing instance can be installed automatically
    pub fn has_remediation(&self) -> bool {
        matches!(self.kind, PrerequisiteKind::Library { .. })
    }
}

/// Importable module name for a package:
/// `dash-bootstrap-components` -> `dash_bootstrap_components`.
pub fn module_name_for(package: &str) -> String {
    package.trim().replace('-', "_")
}

/// A required file, looked up at each candidate location in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReference {
    /// Short name, also usable as a `{label}` placeholder in target arguments
    pub label: String,
    pub candidates: Vec<PathBuf>,
    /// Tells the operator how to supply the file
    pub hint: String,
    /// Environment variable that receives the resolved path in the child process
    pub export_as: Option<String>,
}

impl ArtifactReference {
    pub fn new(label: &str, candidates: Vec<PathBuf>, hint: &str) -> Self {
        ArtifactReference {
            label: label.to_string(),
            candidates,
            hint: hint.to_string(),
            export_as: None,
        }
    }

    pub fn exported_as(mut self, variable: &str) -> Self {
        self.export_as = Some(variable.to_string());
        self
    }
}

/// Program run by the delegation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Program {
    /// The interpreter resolved by the prerequisite checks
    Interpreter,
    /// A fixed executable name or path
    Executable(String),
}

/// The external program and its arguments.
///
/// Arguments may contain `{label}` placeholders that are replaced with the
/// resolved path of the artifact carrying that label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationTarget {
    pub program: Program,
    pub args: Vec<String>,
}

impl DelegationTarget {
    /// Run the artifact labelled `script_label` with the interpreter.
    pub fn script(script_label: &str) -> Self {
        DelegationTarget {
            program: Program::Interpreter,
            args: vec![format!("{{{}}}", script_label)],
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Labels referenced by placeholders, in order of appearance
    pub fn placeholders(&self) -> Vec<&str> {
        self.args
            .iter()
            .flat_map(|arg| placeholder_regex().captures_iter(arg))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Arguments with every known placeholder substituted.
    ///
    /// Placeholders without a resolved artifact are left untouched.
    pub fn render_args(&self, resolved: &BTreeMap<String, PathBuf>) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                placeholder_regex()
                    .replace_all(arg, |caps: &regex::Captures<'_>| match resolved.get(&caps[1]) {
                        Some(path) => path.display().to_string(),
                        None => caps[0].to_string(),
                    })
                    .into_owned()
            })
            .collect()
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{([A-Za-z0-9_-]+)\}").expect("placeholder pattern is valid")
    })
}

fn module_regex() -> &'static Regex {
    static MODULE: OnceLock<Regex> = OnceLock::new();
    MODULE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
            .expect("module pattern is valid")
    })
}

/// Reasons a plan cannot be run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("plan name must not be empty")]
    EmptyName,
    #[error("artifact label '{0}' is used more than once")]
    DuplicateArtifact(String),
    #[error("artifact '{0}' has no candidate paths")]
    NoCandidates(String),
    #[error("argument placeholder '{{{0}}}' does not name an artifact")]
    UnknownPlaceholder(String),
    #[error("'{0}' is not a valid module name")]
    InvalidModule(String),
    #[error("plan has neither a script nor a program to run")]
    NothingToRun,
}

/// Everything needed for one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub name: String,
    pub description: String,
    pub prerequisites: Vec<Prerequisite>,
    pub artifacts: Vec<ArtifactReference>,
    pub target: DelegationTarget,
}

impl LaunchPlan {
    /// Check the plan is internally consistent before anything runs.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.name.trim().is_empty() {
            return Err(PlanError::EmptyName);
        }

        for prerequisite in &self.prerequisites {
            if let PrerequisiteKind::Library { module, .. } = &prerequisite.kind {
                if !module_regex().is_match(module) {
                    return Err(PlanError::InvalidModule(module.clone()));
                }
            }
        }

        let mut labels = HashSet::new();
        for artifact in &self.artifacts {
            if !labels.insert(artifact.label.as_str()) {
                return Err(PlanError::DuplicateArtifact(artifact.label.clone()));
            }
            if artifact.candidates.is_empty() {
                return Err(PlanError::NoCandidates(artifact.label.clone()));
            }
        }

        if self.target.program == Program::Interpreter && self.target.args.is_empty() {
            return Err(PlanError::NothingToRun);
        }

        if let Some(unknown) = self
            .target
            .placeholders()
            .into_iter()
            .find(|label| !labels.contains(label))
        {
            return Err(PlanError::UnknownPlaceholder(unknown.to_string()));
        }

        Ok(())
    }

    /// Look up an artifact by label
    pub fn artifact(&self, label: &str) -> Option<&ArtifactReference> {
        self.artifacts.iter().find(|a| a.label == label)
    }
}
