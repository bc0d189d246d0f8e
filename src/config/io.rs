//! Configuration loading and override layering.

use super::{ConfigError, LauncherConfig};
use dirs_next::{config_dir, home_dir};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "BI_LAUNCHER_CONFIG";

/// Path of the dashboard data file.
pub const DATA_FILE_ENV: &str = "BI_LAUNCHER_DATA_FILE";

/// Data file variable understood by the dashboards themselves; honoured when
/// `BI_LAUNCHER_DATA_FILE` is not set.
pub const LEGACY_DATA_FILE_ENV: &str = "DATA_FILE_PATH";

/// Interpreter program.
pub const INTERPRETER_ENV: &str = "BI_LAUNCHER_INTERPRETER";

const CONFIG_FILE_NAME: &str = "launcher.yaml";

/// Returns the default path for the configuration file.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = non_empty(env::var(CONFIG_PATH_ENV).ok()) {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bi-launcher")
        .join(CONFIG_FILE_NAME)
}

/// Load configuration from an explicit path, or from the default location.
///
/// An explicitly named file must exist. A missing default file yields the
/// built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<LauncherConfig, ConfigError> {
    match explicit {
        Some(path) => load_config_from_path(path),
        None => {
            let path = default_config_path();
            if path.exists() {
                load_config_from_path(&path)
            } else {
                debug!(path = %path.display(), "no configuration file, using defaults");
                Ok(LauncherConfig::default())
            }
        }
    }
}

/// Loads and parses configuration from a specific path.
pub fn load_config_from_path(path: &Path) -> Result<LauncherConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded configuration file");
    parse_config(&content, path)
}

/// Parse YAML configuration text. `origin` is only used in error messages.
pub fn parse_config(content: &str, origin: &Path) -> Result<LauncherConfig, ConfigError> {
    if content.trim().is_empty() {
        return Ok(LauncherConfig::default());
    }

    let mut config: LauncherConfig =
        serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

    config.data_file = config.data_file.map(|p| expand_tilde(&p.to_string_lossy()));
    config.search_dirs = config
        .search_dirs
        .iter()
        .map(|p| expand_tilde(&p.to_string_lossy()))
        .collect();
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut LauncherConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let data_file =
        non_empty(lookup(DATA_FILE_ENV)).or_else(|| non_empty(lookup(LEGACY_DATA_FILE_ENV)));
    if let Some(path) = data_file {
        config.data_file = Some(expand_tilde(&path));
    }

    if let Some(interpreter) = non_empty(lookup(INTERPRETER_ENV)) {
        config.interpreter = Some(interpreter);
    }
}

/// Settings given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub interpreter: Option<String>,
    pub data_file: Option<PathBuf>,
    pub no_install: bool,
    pub no_pause: bool,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut LauncherConfig) {
        if let Some(interpreter) = &self.interpreter {
            config.interpreter = Some(interpreter.clone());
        }
        if let Some(data_file) = &self.data_file {
            config.data_file = Some(data_file.clone());
        }
        if self.no_install {
            config.install_missing = false;
        }
        if self.no_pause {
            config.pause_on_error = false;
        }
    }
}

/// Full resolution: file, then process environment, then command line.
pub fn resolve_config(
    explicit: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<LauncherConfig, ConfigError> {
    let mut config = load_config(explicit)?;
    apply_env_overrides(&mut config, |name| env::var(name).ok());
    overrides.apply(&mut config);
    Ok(config)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
