//! Output formatting for bi-launcher.
//!
//! Provides terminal and JSON formatters for reports, plan listings and
//! launch diagnostics.
//!
//! # Graceful Degradation
//!
//! - Non-TTY output: colour disabled via NO_COLOR or --no-color
//! - Empty reports: valid output with zero checks
//! - Serialization failure: a JSON object carrying the error message
//!
//! No function in this module will panic.

use crate::cli::args::OutputFormat;
use crate::engine::orchestrator::PreflightOutcome;
use crate::engine::result::{LaunchReport, ResultSummary};
use crate::plan::profiles::PlanSummary;
use crate::platform::process::CommandSpec;
use crate::{Check, CheckKind, CheckResult, LaunchError};
use serde::Serialize;

const RULE: &str =
    "--------------------------------------------------------------------------------";

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format a finished report
    fn format(&self, report: &LaunchReport) -> String;

    /// Format a preflight, including the command a launch would run
    fn format_preflight(&self, outcome: &PreflightOutcome) -> String;

    /// Format the plan listing
    fn format_plans(&self, plans: &[PlanSummary]) -> String;
}

/// Terminal (human-readable) formatter
pub struct TerminalFormatter {
    color: bool,
    verbose: bool,
    quiet: bool,
}

impl TerminalFormatter {
    pub fn new(color: bool, verbose: bool, quiet: bool) -> Self {
        TerminalFormatter {
            color,
            verbose,
            quiet,
        }
    }

    fn colorize(&self, text: &str, color_code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", color_code, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.colorize(text, "32")
    }

    fn yellow(&self, text: &str) -> String {
        self.colorize(text, "33")
    }

    fn red(&self, text: &str) -> String {
        self.colorize(text, "31")
    }

    fn gray(&self, text: &str) -> String {
        self.colorize(text, "90")
    }

    fn bold(&self, text: &str) -> String {
        self.colorize(text, "1")
    }

    /// One report line for a step, or `None` when quiet mode hides it.
    pub fn format_check_line(&self, check: &Check) -> Option<String> {
        let (status, message) = match &check.result {
            Some(CheckResult::Pass { message, duration_ms }) => {
                if self.quiet {
                    return None;
                }
                let msg = if self.verbose {
                    format!("{} ({}ms)", message, duration_ms)
                } else {
                    message.clone()
                };
                (self.green("[PASS]"), msg)
            }
            Some(CheckResult::Warn { message, details, duration_ms }) => {
                let msg = if self.verbose {
                    format!("{} - {} ({}ms)", message, details, duration_ms)
                } else {
                    message.clone()
                };
                (self.yellow("[WARN]"), msg)
            }
            Some(CheckResult::Fail { message, duration_ms, .. }) => {
                let msg = if self.verbose {
                    format!("{} ({}ms)", message, duration_ms)
                } else {
                    message.clone()
                };
                (self.red("[FAIL]"), msg)
            }
            Some(CheckResult::Skip { reason }) => {
                if self.quiet {
                    return None;
                }
                (self.gray("[SKIP]"), reason.clone())
            }
            None => (self.gray("[----]"), "Not executed".to_string()),
        };

        Some(format!("  {} {}: {} ({})", status, check.id, check.name, message))
    }

    /// Human-readable diagnostic for an aborted launch
    pub fn format_error(&self, error: &LaunchError) -> String {
        let mut output = format!("{} {}: {}", self.red("ERROR"), error.check_id(), error);
        for line in error.details().lines().filter(|l| !l.trim().is_empty()) {
            output.push_str("\n  ");
            output.push_str(line);
        }
        output
    }

    fn push_failure_details(&self, output: &mut String, check: &Check) {
        if let Some(CheckResult::Fail { details, .. }) = &check.result {
            for line in details.lines().filter(|l| !l.trim().is_empty()) {
                output.push_str(&format!("         {}\n", self.gray(line)));
            }
        }
    }

    fn push_sections(&self, output: &mut String, report: &LaunchReport) {
        let sections: [(&str, &[CheckKind]); 3] = [
            ("PREREQUISITES", &[CheckKind::Interpreter, CheckKind::Library]),
            ("REQUIRED FILES", &[CheckKind::Artifact]),
            ("LAUNCH", &[CheckKind::Delegation]),
        ];

        for (header, kinds) in sections {
            let lines: Vec<_> = report
                .checks
                .iter()
                .filter(|c| kinds.contains(&c.kind))
                .filter_map(|c| self.format_check_line(c).map(|line| (c, line)))
                .collect();

            if lines.is_empty() {
                continue;
            }

            output.push_str(&format!("{}\n", header));
            for (check, line) in lines {
                output.push_str(&line);
                output.push('\n');
                self.push_failure_details(output, check);
            }
            output.push('\n');
        }
    }

    fn push_summary(&self, output: &mut String, summary: &ResultSummary, total_duration_ms: u64) {
        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format!(
            "SUMMARY: {} passed, {} warnings, {} failed, {} skipped\n",
            summary.passed, summary.warned, summary.failed, summary.skipped
        ));
        output.push_str(&format!("Total time: {:.1}s\n", total_duration_ms as f64 / 1000.0));
    }
}

impl OutputFormatter for TerminalFormatter {
    fn format(&self, report: &LaunchReport) -> String {
        let mut output = String::new();

        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format!("{}\n", self.bold("bi-launcher report")));
        output.push_str(&format!("Plan: {}\n", report.plan));
        output.push_str(&format!("Host: {}\n", report.hostname));
        output.push_str(&format!("Timestamp: {}\n", format_timestamp(report.timestamp)));
        output.push_str(RULE);
        output.push_str("\n\n");

        self.push_sections(&mut output, report);

        let summary = report.summary();
        self.push_summary(&mut output, &summary, report.total_duration_ms);

        let (exit_code, exit_desc) = if summary.failed > 0 {
            (1, "failures detected")
        } else if summary.warned > 0 {
            (0, "warnings detected")
        } else {
            (0, "all checks passed")
        };
        output.push_str(&format!("Exit code: {} ({})\n", exit_code, exit_desc));
        output.push_str(RULE);

        output
    }

    fn format_preflight(&self, outcome: &PreflightOutcome) -> String {
        let mut output = self.format(&outcome.report);
        output.push('\n');
        match &outcome.command {
            Some(command) => {
                output.push_str(&format!("Would run: {}", command));
                for (key, value) in &command.env {
                    output.push_str(&format!("\n  with {}={}", key, value));
                }
            }
            None => output.push_str("Nothing would be launched: fix the failures above first."),
        }
        output
    }

    fn format_plans(&self, plans: &[PlanSummary]) -> String {
        let mut output = String::from("Available plans:\n\n");
        let width = plans.iter().map(|p| p.name.len()).max().unwrap_or(0);

        for plan in plans {
            let mut line = format!("  {:width$}  {}", plan.name, plan.description, width = width);
            if plan.is_default {
                line.push_str(&format!(" {}", self.green("(default)")));
            }
            if plan.configured {
                line.push_str(&format!(" {}", self.gray("[config]")));
            }
            output.push_str(&line);
            output.push('\n');

            if self.verbose {
                if let Some(script) = &plan.script {
                    output.push_str(&format!(
                        "  {:width$}  script: {}\n",
                        "",
                        script.display(),
                        width = width
                    ));
                }
            }
        }

        output.trim_end().to_string()
    }
}

/// JSON formatter
pub struct JsonFormatter {
    pretty: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    plan: &'a str,
    timestamp: u64,
    hostname: &'a str,
    total_duration_ms: u64,
    passed: bool,
    summary: ResultSummary,
    checks: &'a [Check],
}

impl<'a> JsonReport<'a> {
    fn new(report: &'a LaunchReport) -> Self {
        JsonReport {
            plan: &report.plan,
            timestamp: report.timestamp,
            hostname: &report.hostname,
            total_duration_ms: report.total_duration_ms,
            passed: !report.has_failures(),
            summary: report.summary(),
            checks: &report.checks,
        }
    }
}

#[derive(Serialize)]
struct JsonPreflight<'a> {
    #[serde(flatten)]
    report: JsonReport<'a>,
    command: Option<&'a CommandSpec>,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        JsonFormatter { pretty }
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }).to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, report: &LaunchReport) -> String {
        self.render(&JsonReport::new(report))
    }

    fn format_preflight(&self, outcome: &PreflightOutcome) -> String {
        self.render(&JsonPreflight {
            report: JsonReport::new(&outcome.report),
            command: outcome.command.as_ref(),
        })
    }

    fn format_plans(&self, plans: &[PlanSummary]) -> String {
        self.render(&plans)
    }
}

/// Get formatter for the specified output format
pub fn get_formatter(
    format: OutputFormat,
    color: bool,
    verbose: bool,
    quiet: bool,
) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(TerminalFormatter::new(color, verbose, quiet)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

/// Format a Unix timestamp as ISO 8601
fn format_timestamp(timestamp: u64) -> String {
    let days_since_epoch = timestamp / 86400;
    let time_of_day = timestamp % 86400;

    let hours = time_of_day / 3600;
    let minutes = (time_of_day % 3600) / 60;
    let seconds = time_of_day % 60;

    let mut year = 1970;
    let mut remaining_days = days_since_epoch;
    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if remaining_days < days_in_year {
            break;
        }
        remaining_days -= days_in_year;
        year += 1;
    }

    let mut month = 1;
    loop {
        let days = days_in_month(year, month);
        if remaining_days < days {
            break;
        }
        remaining_days -= days;
        month += 1;
    }

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year,
        month,
        remaining_days + 1,
        hours,
        minutes,
        seconds
    )
}

fn is_leap_year(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u64, month: u64) -> u64 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
