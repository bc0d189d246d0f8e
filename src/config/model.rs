//! Configuration model and errors.

use crate::plan::definition::{PlanContext, PlanDefinition};
use crate::plan::profiles::{DATA_LABEL, DEFAULT_PLAN};
use crate::plan::{PlanError, Version};
use crate::platform::host;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Error surfaced while loading configuration or resolving a plan.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown plan '{name}' (available: {available})")]
    UnknownPlan { name: String, available: String },

    #[error("plan '{plan}' is invalid: {source}")]
    InvalidPlan {
        plan: String,
        #[source]
        source: PlanError,
    },
}

/// Resolved launcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// Interpreter program; when unset the usual names are tried in order
    pub interpreter: Option<String>,
    pub minimum_version: Option<Version>,
    /// Versions below this pass with a warning
    pub recommended_version: Option<Version>,
    pub default_plan: String,
    /// Explicit path of the dashboard data file
    pub data_file: Option<PathBuf>,
    /// Directories searched for relative artifact paths, in order.
    /// Defaults to the launcher's own folder, then the working directory.
    pub search_dirs: Vec<PathBuf>,
    /// Install missing libraries with pip before giving up
    pub install_missing: bool,
    /// Wait for Enter before exiting after a failed launch
    pub pause_on_error: bool,
    pub plans: BTreeMap<String, PlanDefinition>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        LauncherConfig {
            interpreter: None,
            minimum_version: Some(Version::new(3, 8, 0)),
            recommended_version: Some(Version::new(3, 9, 0)),
            default_plan: DEFAULT_PLAN.to_string(),
            data_file: None,
            search_dirs: default_search_dirs(),
            install_missing: true,
            pause_on_error: true,
            plans: BTreeMap::new(),
        }
    }
}

fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = host::launcher_dir().into_iter().collect();
    dirs.push(PathBuf::from("."));
    dirs
}

impl LauncherConfig {
    /// Inputs for turning plan definitions into plans
    pub fn plan_context(&self) -> PlanContext {
        let mut overrides = BTreeMap::new();
        if let Some(data_file) = &self.data_file {
            overrides.insert(DATA_LABEL.to_string(), data_file.clone());
        }

        PlanContext {
            search_dirs: self.search_dirs.clone(),
            overrides,
            minimum_version: self.minimum_version,
            recommended_version: self.recommended_version,
        }
    }
}
