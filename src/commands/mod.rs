//! Command handlers for bi-launcher
//!
//! - `launch`: check prerequisites, then run the plan's target
//! - `check`: preflight report without launching
//! - `list`: available plans

pub mod check;
pub mod launch;
pub mod list;

/// What a command produced, for `main` to print and exit with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Report text for stdout (empty when nothing is to be printed)
    pub stdout: String,
    pub exit_code: u8,
    /// The operator should acknowledge a failure before the process exits
    pub acknowledge: bool,
}

impl CommandOutput {
    pub fn new(stdout: String, exit_code: u8) -> Self {
        CommandOutput {
            stdout,
            exit_code,
            acknowledge: false,
        }
    }
}
