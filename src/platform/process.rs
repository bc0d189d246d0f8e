//! Child process execution.
//!
//! All process and filesystem access made by the checks and the orchestrator
//! goes through [`ProcessRunner`], so runs can be replayed against a scripted
//! runner in tests.
//!
//! # Graceful Degradation
//!
//! - Program not found: `ProbeError::Spawn` with the program name
//! - Non-UTF8 output: lossy conversion
//! - Killed by a signal: reported as `ExitState::Signal` (Unix only)

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::debug;

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables for the child, on top of the inherited environment
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(part: &str) -> String {
    if part.is_empty() || part.contains(char::is_whitespace) || part.contains('"') {
        format!("\"{}\"", part.replace('"', "\\\""))
    } else {
        part.to_string()
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExitState {
    Code(i32),
    /// Terminated by this signal number
    Signal(i32),
    Unknown,
}

impl ExitState {
    pub fn success(&self) -> bool {
        *self == ExitState::Code(0)
    }

    /// Exit code the launcher itself should return for this child.
    ///
    /// Codes outside `0..=255` become 1; signals become `128 + signal`.
    pub fn as_exit_code(&self) -> u8 {
        match *self {
            ExitState::Code(code) => u8::try_from(code).unwrap_or(1),
            ExitState::Signal(signal) => u8::try_from(128 + signal).unwrap_or(1),
            ExitState::Unknown => 1,
        }
    }

    fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitState::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitState::Signal(signal);
            }
        }

        ExitState::Unknown
    }
}

impl fmt::Display for ExitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitState::Code(code) => write!(f, "exit code {}", code),
            ExitState::Signal(signal) => write!(f, "signal {}", signal),
            ExitState::Unknown => write!(f, "unknown status"),
        }
    }
}

/// Output of a captured (non-interactive) command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub status: ExitState,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Last non-empty stderr line, for one-line diagnostics
    pub fn last_error_line(&self) -> Option<&str> {
        self.stderr.lines().rev().map(str::trim).find(|l| !l.is_empty())
    }
}

/// A command could not be run at all.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Executes commands and answers filesystem questions for the launcher.
pub trait ProcessRunner {
    /// Run to completion with stdin closed, capturing stdout and stderr.
    fn capture(&self, command: &CommandSpec) -> Result<CapturedOutput, ProbeError>;

    /// Run to completion with stdin, stdout and stderr inherited from the launcher.
    fn run_inherited(&self, command: &CommandSpec) -> Result<ExitState, ProbeError>;

    /// Whether a regular file exists at `path`
    fn path_exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Runs real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn capture(&self, command: &CommandSpec) -> Result<CapturedOutput, ProbeError> {
        debug!(command = %command, "capturing");
        let output = command
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ProbeError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        Ok(CapturedOutput {
            status: ExitState::from_status(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_inherited(&self, command: &CommandSpec) -> Result<ExitState, ProbeError> {
        debug!(command = %command, "running with inherited stdio");
        let status = command
            .to_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ProbeError::Spawn {
                program: command.program.clone(),
                source,
            })?;
        Ok(ExitState::from_status(status))
    }
}
