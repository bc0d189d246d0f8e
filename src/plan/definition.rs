//! Serializable plan definitions.
//!
//! Built-in profiles and plans declared in the configuration file share the
//! same shape. A definition becomes a [`LaunchPlan`] once it is combined with
//! a [`PlanContext`] (search directories, path overrides, version policy).

use super::{
    ArtifactReference, DelegationTarget, LaunchPlan, PlanError, Prerequisite, Program, Version,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Artifact label given to a plan's script.
pub const SCRIPT_LABEL: &str = "script";

/// A library entry: either a bare package name or an explicit package/module pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackageSpec {
    Name(String),
    Detailed {
        package: String,
        #[serde(default)]
        module: Option<String>,
    },
}

impl PackageSpec {
    fn to_prerequisite(&self) -> Prerequisite {
        match self {
            PackageSpec::Name(package) => Prerequisite::library(package),
            PackageSpec::Detailed { package, module: Some(module) } => {
                Prerequisite::library_with_module(package, module)
            }
            PackageSpec::Detailed { package, module: None } => Prerequisite::library(package),
        }
    }
}

impl From<&str> for PackageSpec {
    fn from(package: &str) -> Self {
        PackageSpec::Name(package.to_string())
    }
}

/// A required file in a plan definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactDefinition {
    pub label: String,
    /// Relative paths are looked up in every search directory
    pub paths: Vec<PathBuf>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub export_as: Option<String>,
}

impl ArtifactDefinition {
    pub fn new(label: &str, path: &str) -> Self {
        ArtifactDefinition {
            label: label.to_string(),
            paths: vec![PathBuf::from(path)],
            hint: None,
            export_as: None,
        }
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }

    pub fn exported_as(mut self, variable: &str) -> Self {
        self.export_as = Some(variable.to_string());
        self
    }
}

/// Declarative form of a launch plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanDefinition {
    pub description: String,
    /// Script run by the interpreter; checked as the `script` artifact
    pub script: Option<PathBuf>,
    /// Executable run instead of the interpreter
    pub program: Option<String>,
    /// Check the interpreter before the libraries
    pub require_interpreter: bool,
    pub packages: Vec<PackageSpec>,
    pub artifacts: Vec<ArtifactDefinition>,
    /// Extra arguments after the script; may use `{label}` placeholders
    pub args: Vec<String>,
}

impl Default for PlanDefinition {
    fn default() -> Self {
        PlanDefinition {
            description: String::new(),
            script: None,
            program: None,
            require_interpreter: true,
            packages: Vec::new(),
            artifacts: Vec::new(),
            args: Vec::new(),
        }
    }
}

/// Run-time inputs used to turn a definition into a plan.
#[derive(Debug, Clone, Default)]
pub struct PlanContext {
    pub search_dirs: Vec<PathBuf>,
    /// Explicit paths by artifact label; replace the candidate search entirely
    pub overrides: BTreeMap<String, PathBuf>,
    pub minimum_version: Option<Version>,
    pub recommended_version: Option<Version>,
}

impl PlanContext {
    /// Candidate locations for a definition path
    pub fn candidates(&self, label: &str, paths: &[PathBuf]) -> Vec<PathBuf> {
        if let Some(explicit) = self.overrides.get(label) {
            return vec![explicit.clone()];
        }

        let mut candidates = Vec::new();
        for path in paths {
            for candidate in search(path, &self.search_dirs) {
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }
        candidates
    }
}

fn search(path: &Path, search_dirs: &[PathBuf]) -> Vec<PathBuf> {
    if path.is_absolute() || search_dirs.is_empty() {
        return vec![path.to_path_buf()];
    }
    search_dirs.iter().map(|dir| dir.join(path)).collect()
}

impl PlanDefinition {
    /// Build a validated plan named `name`.
    pub fn to_plan(&self, name: &str, context: &PlanContext) -> Result<LaunchPlan, PlanError> {
        let mut prerequisites = Vec::new();
        if self.require_interpreter {
            prerequisites.push(Prerequisite::interpreter(
                context.minimum_version,
                context.recommended_version,
            ));
        }
        prerequisites.extend(self.packages.iter().map(PackageSpec::to_prerequisite));

        let mut artifacts: Vec<ArtifactReference> = self
            .artifacts
            .iter()
            .map(|definition| {
                let hint = definition.hint.clone().unwrap_or_else(|| {
                    format!(
                        "Place {} next to the launcher or set its path in the configuration",
                        describe_paths(&definition.paths)
                    )
                });
                let mut artifact = ArtifactReference::new(
                    &definition.label,
                    context.candidates(&definition.label, &definition.paths),
                    &hint,
                );
                artifact.export_as = definition.export_as.clone();
                artifact
            })
            .collect();

        let target = match (&self.program, &self.script) {
            (Some(program), _) => {
                let mut target = DelegationTarget {
                    program: Program::Executable(program.clone()),
                    args: Vec::new(),
                };
                if let Some(script) = &self.script {
                    artifacts.push(script_artifact(script, context));
                    target.args.push(format!("{{{}}}", SCRIPT_LABEL));
                }
                target
            }
            (None, Some(script)) => {
                artifacts.push(script_artifact(script, context));
                DelegationTarget::script(SCRIPT_LABEL)
            }
            (None, None) => return Err(PlanError::NothingToRun),
        }
        .with_args(self.args.iter().cloned());

        let plan = LaunchPlan {
            name: name.to_string(),
            description: self.description.clone(),
            prerequisites,
            artifacts,
            target,
        };
        plan.validate()?;
        Ok(plan)
    }
}

fn script_artifact(script: &Path, context: &PlanContext) -> ArtifactReference {
    ArtifactReference::new(
        SCRIPT_LABEL,
        context.candidates(SCRIPT_LABEL, &[script.to_path_buf()]),
        &format!(
            "Keep {} in the same folder as the launcher",
            script.display()
        ),
    )
}

fn describe_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}
