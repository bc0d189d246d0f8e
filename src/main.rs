//! bi-launcher CLI entry point
//!
//! Checks the prerequisites of the BI toolkit and launches it.

use bi_launcher::cli::args::{Args, Command};
use bi_launcher::cli::prompt::pause_for_acknowledgment;
use bi_launcher::commands::{self, CommandOutput};
use bi_launcher::config::resolve_config;
use bi_launcher::platform::process::SystemRunner;
use bi_launcher::version::get_build_info;

use anyhow::Result;
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code for usage and configuration errors
const EXIT_CONFIG_ERROR: u8 = 2;

fn main() -> ExitCode {
    // clap exits with 2 on usage errors
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(args: &Args) -> Result<u8> {
    let command = args.command();
    if command == Command::Version {
        println!("{}", get_build_info());
        return Ok(0);
    }

    let config = match resolve_config(args.config.as_deref(), &args.overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    let runner = SystemRunner;
    let dispatched = match &command {
        Command::Launch { plan } => {
            commands::launch::run(args, &config, plan.as_deref(), &runner, &mut io::stderr())
        }
        Command::Check { plan } => commands::check::run(args, &config, plan.as_deref(), &runner),
        Command::List => Ok(commands::list::run(args, &config)),
        Command::Version => Ok(CommandOutput::default()),
    };

    let output = match dispatched {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run 'bi-launcher list' to see the available plans.");
            return Ok(EXIT_CONFIG_ERROR);
        }
    };

    if !output.stdout.is_empty() {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", output.stdout)?;
        stdout.flush()?;
    }

    if output.acknowledge {
        pause_for_acknowledgment(true);
    }

    Ok(output.exit_code)
}
