//! Operator acknowledgment after a failed launch.

use std::io::{self, BufRead, IsTerminal, Write};

pub const PROMPT: &str = "Press Enter to exit...";

/// Whether a pause would be shown: enabled and stdin is an interactive terminal.
pub fn should_pause(enabled: bool) -> bool {
    enabled && io::stdin().is_terminal()
}

/// Wait for the operator to press Enter.
///
/// Returns `false` without blocking when pausing is disabled or stdin is not a
/// terminal (CI, pipes, tests).
pub fn pause_for_acknowledgment(enabled: bool) -> bool {
    if !should_pause(enabled) {
        return false;
    }

    let mut stderr = io::stderr();
    let _ = write!(stderr, "\n{}", PROMPT);
    let _ = stderr.flush();

    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
    true
}
