//! Library importability check with pip remediation.

use super::elapsed_ms;
use crate::platform::interpreter::{import_probe_command, pip_install_command};
use crate::platform::process::ProcessRunner;
use crate::{CheckResult, LaunchError};
use std::time::Instant;
use tracing::{info, warn};

/// Result of probing a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleState {
    /// Importable; carries `__version__` when the module defines one
    Installed(Option<String>),
    /// Import failed; carries the interpreter's last error line
    Missing(String),
}

/// Probe whether `module` can be imported by `program`.
pub fn probe(
    runner: &dyn ProcessRunner,
    program: &str,
    module: &str,
) -> Result<ModuleState, String> {
    let output = runner
        .capture(&import_probe_command(program, module))
        .map_err(|e| e.to_string())?;

    if output.success() {
        let version = output
            .stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string);
        Ok(ModuleState::Installed(version))
    } else {
        Ok(ModuleState::Missing(
            output
                .last_error_line()
                .unwrap_or("import failed")
                .to_string(),
        ))
    }
}

/// Check one library, installing it when `remediate` is set.
pub fn check(
    runner: &dyn ProcessRunner,
    check_id: &str,
    program: &str,
    package: &str,
    module: &str,
    remediate: bool,
) -> Result<CheckResult, LaunchError> {
    let start = Instant::now();
    let install = pip_install_command(program, package);

    let missing = |reason: String| LaunchError::PrerequisiteMissing {
        check_id: check_id.to_string(),
        name: package.to_string(),
        reason,
        hint: Some(format!("Install it with: {}", install)),
    };

    let reason = match probe(runner, program, module).map_err(&missing)? {
        ModuleState::Installed(version) => {
            return Ok(CheckResult::Pass {
                message: describe(package, version.as_deref()),
                duration_ms: elapsed_ms(start),
            });
        }
        ModuleState::Missing(reason) => reason,
    };

    if !remediate {
        return Err(missing(reason));
    }

    warn!(package = %package, "library missing, installing");
    let remediation_failed = |reason: String| LaunchError::RemediationFailed {
        check_id: check_id.to_string(),
        name: package.to_string(),
        command: install.to_string(),
        reason,
    };

    let output = runner
        .capture(&install)
        .map_err(|e| remediation_failed(e.to_string()))?;
    if !output.success() {
        let reason = output
            .last_error_line()
            .map(str::to_string)
            .unwrap_or_else(|| format!("installer finished with {}", output.status));
        return Err(remediation_failed(reason));
    }

    match probe(runner, program, module).map_err(&remediation_failed)? {
        ModuleState::Installed(version) => {
            info!(package = %package, "installed");
            Ok(CheckResult::Pass {
                message: format!("{} (installed now)", describe(package, version.as_deref())),
                duration_ms: elapsed_ms(start),
            })
        }
        ModuleState::Missing(reason) => Err(remediation_failed(format!(
            "'{}' still cannot be imported after installing: {}",
            module, reason
        ))),
    }
}

fn describe(package: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{} {}", package, version),
        None => format!("{} installed", package),
    }
}
