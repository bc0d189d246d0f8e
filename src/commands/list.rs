//! Plan listing command

use super::CommandOutput;
use crate::cli::args::Args;
use crate::cli::output::get_formatter;
use crate::config::LauncherConfig;
use crate::plan::profiles::available_plans;

/// Run the list command
pub fn run(args: &Args, config: &LauncherConfig) -> CommandOutput {
    let formatter = get_formatter(args.format, args.color_enabled(), args.verbose, args.quiet);
    CommandOutput::new(formatter.format_plans(&available_plans(config)), 0)
}
