//! Launch command
//!
//! Streams one line per step to `progress` while the plan runs, then hands
//! the terminal to the target. On abort, writes the diagnostic and asks for
//! acknowledgment. With `--dry-run` it behaves like `check` and also prints
//! the command that would run.

use super::CommandOutput;
use crate::cli::args::Args;
use crate::cli::output::{get_formatter, TerminalFormatter};
use crate::config::{ConfigError, LauncherConfig};
use crate::engine::orchestrator::{LaunchObserver, LaunchOrchestrator, OrchestratorConfig};
use crate::plan::profiles::resolve_plan;
use crate::platform::process::{CommandSpec, ProcessRunner};
use crate::Check;
use std::io::Write;

struct StepPrinter<'a> {
    formatter: &'a TerminalFormatter,
    out: &'a mut dyn Write,
    quiet: bool,
}

impl LaunchObserver for StepPrinter<'_> {
    fn step_completed(&mut self, check: &Check) {
        if let Some(line) = self.formatter.format_check_line(check) {
            let _ = writeln!(self.out, "{}", line);
        }
    }

    fn delegating(&mut self, command: &CommandSpec) {
        if !self.quiet {
            let _ = writeln!(self.out, "Launching: {}", command);
            let _ = self.out.flush();
        }
    }
}

/// Run the launch command
pub fn run(
    args: &Args,
    config: &LauncherConfig,
    plan_name: Option<&str>,
    runner: &dyn ProcessRunner,
    progress: &mut dyn Write,
) -> Result<CommandOutput, ConfigError> {
    let plan = resolve_plan(config, plan_name)?;
    let orchestrator = LaunchOrchestrator::new(OrchestratorConfig::from_launcher(config), runner);

    if args.dry_run {
        let outcome = orchestrator.preflight(&plan);
        let formatter = get_formatter(args.format, args.color_enabled(), args.verbose, args.quiet);
        let exit_code = if outcome.command.is_some() { 0 } else { 1 };
        return Ok(CommandOutput::new(formatter.format_preflight(&outcome), exit_code));
    }

    let terminal = TerminalFormatter::new(args.color_enabled(), args.verbose, args.quiet);
    let outcome = {
        let mut printer = StepPrinter {
            formatter: &terminal,
            out: &mut *progress,
            quiet: args.quiet,
        };
        orchestrator.run_with(&plan, &mut printer)
    };

    let mut output = CommandOutput::new(String::new(), outcome.exit_code());
    if let Some(error) = outcome.error() {
        let _ = writeln!(progress, "\n{}", terminal.format_error(error));
        output.acknowledge = config.pause_on_error;
    }
    Ok(output)
}
