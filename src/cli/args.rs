//! Command line argument model.

use crate::config::ConfigOverrides;
use clap::{Parser, Subcommand, ValueEnum};
use std::env;
use std::path::PathBuf;

/// Checks prerequisites for the BI toolkit, then launches it.
#[derive(Debug, Parser)]
#[command(name = "bi-launcher", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file (default: <config dir>/bi-launcher/launcher.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Dashboard data file, used instead of searching for data.xlsx
    #[arg(long, global = true, value_name = "PATH")]
    pub data_file: Option<PathBuf>,

    /// Interpreter program to run the scripts with
    #[arg(long, global = true, value_name = "PROG")]
    pub interpreter: Option<String>,

    /// Do not install missing libraries
    #[arg(long, global = true)]
    pub no_install: bool,

    /// Exit immediately after a failure instead of waiting for Enter
    #[arg(long, global = true)]
    pub no_pause: bool,

    /// Run the checks and print the command without launching it
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Report format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Include timings and details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print failures and warnings
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Check prerequisites and launch a plan (default)
    Launch {
        /// Plan name (default plan when omitted)
        plan: Option<String>,
    },
    /// Run the checks only and print a report
    Check {
        plan: Option<String>,
    },
    /// List available plans
    List,
    /// Print build information
    Version,
}

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

impl Args {
    /// The subcommand, with no subcommand meaning `launch` of the default plan
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or(Command::Launch { plan: None })
    }

    /// Configuration settings given as flags
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            interpreter: self.interpreter.clone(),
            data_file: self.data_file.clone(),
            no_install: self.no_install,
            no_pause: self.no_pause,
        }
    }

    /// Colour is on unless `--no-color` is given or `NO_COLOR` is set
    pub fn color_enabled(&self) -> bool {
        !self.no_color && env::var_os("NO_COLOR").map_or(true, |v| v.is_empty())
    }
}
