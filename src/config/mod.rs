//! Launcher configuration.
//!
//! Settings are layered, later layers winning:
//! 1. Built-in defaults
//! 2. `launcher.yaml` (explicit `--config`, `BI_LAUNCHER_CONFIG`, or the user config dir)
//! 3. Environment variables (`BI_LAUNCHER_DATA_FILE`, `DATA_FILE_PATH`, `BI_LAUNCHER_INTERPRETER`)
//! 4. Command line flags
//!
//! Environment variables are read exactly once, here. Everything downstream
//! receives the resolved [`LauncherConfig`] as an explicit parameter.

mod io;
mod model;

pub use io::{
    apply_env_overrides, default_config_path, load_config, load_config_from_path, parse_config,
    resolve_config, ConfigOverrides, CONFIG_PATH_ENV, DATA_FILE_ENV, INTERPRETER_ENV,
    LEGACY_DATA_FILE_ENV,
};
pub use model::{ConfigError, LauncherConfig};
