//! Interpreter presence and version check.

use super::elapsed_ms;
use crate::plan::Version;
use crate::platform::interpreter::{self, Interpreter};
use crate::platform::process::ProcessRunner;
use crate::{CheckResult, LaunchError};
use std::time::Instant;

const INSTALL_HINT: &str = "Install Python 3 from https://www.python.org/downloads/ \
    (tick \"Add Python to PATH\"), or set 'interpreter' in the configuration";

/// Detect the interpreter and apply the version policy.
///
/// Candidates below `minimum` are skipped; below `recommended` passes with a
/// warning.
pub fn check(
    runner: &dyn ProcessRunner,
    check_id: &str,
    name: &str,
    candidates: &[String],
    minimum: Option<Version>,
    recommended: Option<Version>,
) -> Result<(Interpreter, CheckResult), LaunchError> {
    let start = Instant::now();

    let found = interpreter::discover(runner, candidates, minimum).map_err(|reason| {
        LaunchError::PrerequisiteMissing {
            check_id: check_id.to_string(),
            name: name.to_string(),
            reason,
            hint: Some(INSTALL_HINT.to_string()),
        }
    })?;

    let duration_ms = elapsed_ms(start);
    let message = format!("{} {}", found.program, found.version);
    let result = match recommended {
        Some(recommended) if found.version < recommended => CheckResult::Warn {
            message,
            details: format!("Works, but {} or newer is recommended", recommended),
            duration_ms,
        },
        _ => CheckResult::Pass { message, duration_ms },
    };

    Ok((found, result))
}
