//! Python interpreter probing.
//!
//! Builds the commands used to detect the interpreter, probe a module, and
//! install a package, and parses their output.

use super::process::{CapturedOutput, CommandSpec, ProcessRunner};
use crate::plan::Version;
use tracing::debug;

/// Interpreter names tried, in order, when none is configured
#[cfg(windows)]
pub const DEFAULT_CANDIDATES: &[&str] = &["python", "py", "python3"];

/// Interpreter names tried, in order, when none is configured
#[cfg(not(windows))]
pub const DEFAULT_CANDIDATES: &[&str] = &["python3", "python"];

/// A working interpreter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub program: String,
    pub version: Version,
}

/// Candidate programs: the configured one only, or the defaults
pub fn candidates(configured: Option<&str>) -> Vec<String> {
    match configured {
        Some(program) => vec![program.to_string()],
        None => DEFAULT_CANDIDATES.iter().map(|c| c.to_string()).collect(),
    }
}

pub fn version_command(program: &str) -> CommandSpec {
    CommandSpec::new(program).arg("--version")
}

/// Import `module` and print its `__version__` (empty line when it has none)
pub fn import_probe_command(program: &str, module: &str) -> CommandSpec {
    CommandSpec::new(program).args([
        "-c".to_string(),
        format!(
            "import {} as _m; print(getattr(_m, '__version__', ''))",
            module
        ),
    ])
}

pub fn pip_install_command(program: &str, package: &str) -> CommandSpec {
    CommandSpec::new(program).args(["-m", "pip", "install", package, "-q"])
}

/// Parse "Python 3.11.5" from either stream (old interpreters print to stderr).
pub fn parse_version_output(output: &CapturedOutput) -> Option<Version> {
    [output.stdout.as_str(), output.stderr.as_str()]
        .iter()
        .flat_map(|stream| stream.lines())
        .find_map(|line| line.trim().strip_prefix("Python ").and_then(Version::parse))
}

/// Find the first candidate that runs and is at least `minimum`.
///
/// Older interpreters are skipped. Returns a reason listing every attempt
/// when none qualifies.
pub fn discover(
    runner: &dyn ProcessRunner,
    candidates: &[String],
    minimum: Option<Version>,
) -> Result<Interpreter, String> {
    let mut attempts = Vec::new();

    for program in candidates {
        match runner.capture(&version_command(program)) {
            Ok(output) => match parse_version_output(&output) {
                Some(version) if output.success() => match minimum {
                    Some(minimum) if version < minimum => {
                        debug!(program = %program, version = %version, "interpreter too old");
                        attempts.push(format!(
                            "{}: version {}, {} or newer is required",
                            program, version, minimum
                        ));
                    }
                    _ => {
                        debug!(program = %program, version = %version, "interpreter found");
                        return Ok(Interpreter {
                            program: program.clone(),
                            version,
                        });
                    }
                },
                _ => attempts.push(format!("{}: unexpected --version output", program)),
            },
            Err(e) => attempts.push(e.to_string()),
        }
    }

    if attempts.is_empty() {
        return Err("no interpreter candidates configured".to_string());
    }
    Err(attempts.join("; "))
}
