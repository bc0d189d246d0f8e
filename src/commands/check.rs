//! Preflight report command
//!
//! Runs every check of a plan without installing or launching anything.

use super::CommandOutput;
use crate::cli::args::Args;
use crate::cli::output::get_formatter;
use crate::config::{ConfigError, LauncherConfig};
use crate::engine::orchestrator::{LaunchOrchestrator, OrchestratorConfig};
use crate::plan::profiles::resolve_plan;
use crate::platform::process::ProcessRunner;

/// Run the check command
///
/// Exit code is 1 when any check failed, 0 otherwise (warnings included).
pub fn run(
    args: &Args,
    config: &LauncherConfig,
    plan_name: Option<&str>,
    runner: &dyn ProcessRunner,
) -> Result<CommandOutput, ConfigError> {
    let plan = resolve_plan(config, plan_name)?;
    let orchestrator = LaunchOrchestrator::new(OrchestratorConfig::from_launcher(config), runner);
    let outcome = orchestrator.preflight(&plan);

    let formatter = get_formatter(args.format, args.color_enabled(), args.verbose, args.quiet);
    let exit_code = if outcome.report.has_failures() { 1 } else { 0 };
    Ok(CommandOutput::new(formatter.format(&outcome.report), exit_code))
}
