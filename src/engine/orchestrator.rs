//! Launch orchestrator.
//!
//! Walks a [`LaunchPlan`] in a fixed order:
//! 1. Prerequisites (`PRE-nnn`), installing missing libraries when allowed
//! 2. Artifacts (`ART-nnn`), first existing candidate wins
//! 3. Delegation (`RUN-001`), child runs with inherited stdio
//!
//! # Failure Semantics
//!
//! A launch stops at the first failing step and returns
//! [`LaunchOutcome::Aborted`]; later steps are never executed and never
//! appear in the report. Nothing is retried. A preflight runs every check,
//! never installs anything, and never spawns the target.
//!
//! Everything is sequential. The only long blocking call is the delegated
//! child, which runs until it exits.

use crate::checks::{self, elapsed_ms};
use crate::config::LauncherConfig;
use crate::engine::result::{LaunchReport, ResultAggregator};
use crate::plan::{LaunchPlan, Prerequisite, PrerequisiteKind, Program};
use crate::platform::host;
use crate::platform::interpreter::{self, Interpreter, DEFAULT_CANDIDATES};
use crate::platform::process::{CommandSpec, ExitState, ProcessRunner};
use crate::{Check, CheckKind, CheckResult, LaunchError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// Id of the delegation step
pub const DELEGATION_CHECK_ID: &str = "RUN-001";

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Interpreter program; `None` tries the platform defaults
    pub interpreter: Option<String>,
    /// Run the install command for missing libraries
    pub install_missing: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        OrchestratorConfig {
            interpreter: None,
            install_missing: true,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_launcher(config: &LauncherConfig) -> Self {
        OrchestratorConfig {
            interpreter: config.interpreter.clone(),
            install_missing: config.install_missing,
        }
    }
}

/// How a launch ended
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchOutcome {
    /// Every check passed and the target ran to completion
    Delegated { exit: ExitState, report: LaunchReport },
    /// A step failed; the target was not run (or could not be started)
    Aborted { error: LaunchError, report: LaunchReport },
}

impl LaunchOutcome {
    /// Exit code for the launcher process: the child's own, or 1 on abort
    pub fn exit_code(&self) -> u8 {
        match self {
            LaunchOutcome::Delegated { exit, .. } => exit.as_exit_code(),
            LaunchOutcome::Aborted { error, .. } => error.exit_code(),
        }
    }

    pub fn report(&self) -> &LaunchReport {
        match self {
            LaunchOutcome::Delegated { report, .. } | LaunchOutcome::Aborted { report, .. } => {
                report
            }
        }
    }

    pub fn error(&self) -> Option<&LaunchError> {
        match self {
            LaunchOutcome::Aborted { error, .. } => Some(error),
            LaunchOutcome::Delegated { .. } => None,
        }
    }

    pub fn was_delegated(&self) -> bool {
        matches!(self, LaunchOutcome::Delegated { .. })
    }
}

/// Result of a preflight: the report, plus the command a launch would run
/// when nothing failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PreflightOutcome {
    pub report: LaunchReport,
    pub command: Option<CommandSpec>,
}

/// Receives progress while a plan runs.
pub trait LaunchObserver {
    /// A step finished (called in execution order)
    fn step_completed(&mut self, _check: &Check) {}

    /// The target is about to start
    fn delegating(&mut self, _command: &CommandSpec) {}
}

impl LaunchObserver for () {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Launch,
    Preflight,
}

struct Session<'o> {
    aggregator: ResultAggregator,
    observer: &'o mut dyn LaunchObserver,
    started: Instant,
    interpreter: Option<Interpreter>,
    interpreter_failed: bool,
    resolved: BTreeMap<String, PathBuf>,
}

impl<'o> Session<'o> {
    fn new(plan: &LaunchPlan, observer: &'o mut dyn LaunchObserver) -> Self {
        Session {
            aggregator: ResultAggregator::new(&plan.name),
            observer,
            started: Instant::now(),
            interpreter: None,
            interpreter_failed: false,
            resolved: BTreeMap::new(),
        }
    }

    fn record(&mut self, check: Check) {
        self.observer.step_completed(&check);
        self.aggregator.add_result(check);
    }

    fn interpreter_program(&self, config: &OrchestratorConfig) -> String {
        if let Some(found) = &self.interpreter {
            return found.program.clone();
        }
        config
            .interpreter
            .clone()
            .unwrap_or_else(|| DEFAULT_CANDIDATES[0].to_string())
    }

    fn finish(mut self) -> LaunchReport {
        self.aggregator
            .set_metadata(host::hostname(), elapsed_ms(self.started));
        self.aggregator.to_report()
    }
}

/// Runs launch plans against a [`ProcessRunner`]
pub struct LaunchOrchestrator<'r> {
    config: OrchestratorConfig,
    runner: &'r dyn ProcessRunner,
}

impl<'r> LaunchOrchestrator<'r> {
    pub fn new(config: OrchestratorConfig, runner: &'r dyn ProcessRunner) -> Self {
        LaunchOrchestrator { config, runner }
    }

    /// Check everything, then run the target and relay its exit status.
    pub fn run(&self, plan: &LaunchPlan) -> LaunchOutcome {
        self.run_with(plan, &mut ())
    }

    /// [`run`](Self::run), reporting progress to `observer`
    pub fn run_with(&self, plan: &LaunchPlan, observer: &mut dyn LaunchObserver) -> LaunchOutcome {
        info!(plan = %plan.name, "starting launch");
        let mut session = Session::new(plan, observer);

        if let Err(error) = self.verify(plan, &mut session, Mode::Launch) {
            return LaunchOutcome::Aborted {
                error,
                report: session.finish(),
            };
        }

        let command = self.command_for(plan, &session);
        match self.delegate(plan, &command, &mut session) {
            Ok(exit) => LaunchOutcome::Delegated {
                exit,
                report: session.finish(),
            },
            Err(error) => LaunchOutcome::Aborted {
                error,
                report: session.finish(),
            },
        }
    }

    /// Run every check without installing or spawning anything.
    pub fn preflight(&self, plan: &LaunchPlan) -> PreflightOutcome {
        self.preflight_with(plan, &mut ())
    }

    /// [`preflight`](Self::preflight), reporting progress to `observer`
    pub fn preflight_with(
        &self,
        plan: &LaunchPlan,
        observer: &mut dyn LaunchObserver,
    ) -> PreflightOutcome {
        let mut session = Session::new(plan, observer);
        // Preflight mode records failures and keeps going
        let _ = self.verify(plan, &mut session, Mode::Preflight);

        let command = if session.aggregator.has_failures() {
            None
        } else {
            Some(self.command_for(plan, &session))
        };

        PreflightOutcome {
            report: session.finish(),
            command,
        }
    }

    fn verify(
        &self,
        plan: &LaunchPlan,
        session: &mut Session<'_>,
        mode: Mode,
    ) -> Result<(), LaunchError> {
        for (index, prerequisite) in plan.prerequisites.iter().enumerate() {
            let id = format!("PRE-{:03}", index + 1);
            let start = Instant::now();
            let step = prerequisite_step(&id, prerequisite);

            let outcome = match &prerequisite.kind {
                PrerequisiteKind::Interpreter { minimum, recommended } => {
                    let candidates = interpreter::candidates(self.config.interpreter.as_deref());
                    let outcome = checks::interpreter::check(
                        self.runner,
                        &id,
                        &prerequisite.name,
                        &candidates,
                        *minimum,
                        *recommended,
                    );
                    match outcome {
                        Ok((found, result)) => {
                            session.interpreter = Some(found);
                            Ok(result)
                        }
                        Err(error) => {
                            session.interpreter_failed = true;
                            Err(error)
                        }
                    }
                }
                PrerequisiteKind::Library { package, module } => {
                    if session.interpreter_failed {
                        session.record(with_result(
                            step,
                            CheckResult::Skip {
                                reason: "interpreter unavailable".to_string(),
                            },
                        ));
                        continue;
                    }
                    let program = session.interpreter_program(&self.config);
                    let remediate = mode == Mode::Launch && self.config.install_missing;
                    checks::library::check(self.runner, &id, &program, package, module, remediate)
                }
            };

            settle(session, step, outcome, start, mode)?;
        }

        for (index, artifact) in plan.artifacts.iter().enumerate() {
            let id = format!("ART-{:03}", index + 1);
            let start = Instant::now();
            let step = Check {
                id: id.clone(),
                name: artifact.label.clone(),
                kind: CheckKind::Artifact,
                description: format!("Required file '{}' exists", artifact.label),
                result: None,
            };

            let outcome =
                checks::artifact::resolve(self.runner, &id, artifact).map(|(path, result)| {
                    session.resolved.insert(artifact.label.clone(), path);
                    result
                });
            settle(session, step, outcome, start, mode)?;
        }

        Ok(())
    }

    /// The command the delegation step runs, given what has been resolved so far
    fn command_for(&self, plan: &LaunchPlan, session: &Session<'_>) -> CommandSpec {
        let program = match &plan.target.program {
            Program::Interpreter => session.interpreter_program(&self.config),
            Program::Executable(program) => program.clone(),
        };

        let mut command =
            CommandSpec::new(program).args(plan.target.render_args(&session.resolved));
        for artifact in &plan.artifacts {
            let resolved = session.resolved.get(&artifact.label);
            if let (Some(variable), Some(path)) = (&artifact.export_as, resolved) {
                command = command.env(variable.clone(), path.display().to_string());
            }
        }
        command
    }

    fn delegate(
        &self,
        plan: &LaunchPlan,
        command: &CommandSpec,
        session: &mut Session<'_>,
    ) -> Result<ExitState, LaunchError> {
        let step = Check {
            id: DELEGATION_CHECK_ID.to_string(),
            name: format!("Launch {}", plan.name),
            kind: CheckKind::Delegation,
            description: command.to_string(),
            result: None,
        };

        info!(command = %command, "delegating");
        session.observer.delegating(command);
        let start = Instant::now();

        match self.runner.run_inherited(command) {
            Ok(exit) => {
                let duration_ms = elapsed_ms(start);
                let result = if exit.success() {
                    CheckResult::Pass {
                        message: format!("{} finished successfully", plan.name),
                        duration_ms,
                    }
                } else {
                    CheckResult::Fail {
                        message: format!("{} finished with {}", plan.name, exit),
                        details: command.to_string(),
                        duration_ms,
                    }
                };
                session.record(with_result(step, result));
                Ok(exit)
            }
            Err(e) => {
                let error = LaunchError::DelegationFailed {
                    check_id: DELEGATION_CHECK_ID.to_string(),
                    command: command.to_string(),
                    reason: e.to_string(),
                };
                warn!(error = %error, "delegation failed");
                session.record(with_result(step, error.to_check_result(elapsed_ms(start))));
                Err(error)
            }
        }
    }
}

fn settle(
    session: &mut Session<'_>,
    step: Check,
    outcome: Result<CheckResult, LaunchError>,
    start: Instant,
    mode: Mode,
) -> Result<(), LaunchError> {
    match outcome {
        Ok(result) => {
            session.record(with_result(step, result));
            Ok(())
        }
        Err(error) => {
            warn!(check = %step.id, error = %error, "step failed");
            session.record(with_result(step, error.to_check_result(elapsed_ms(start))));
            match mode {
                Mode::Launch => Err(error),
                Mode::Preflight => Ok(()),
            }
        }
    }
}

fn prerequisite_step(id: &str, prerequisite: &Prerequisite) -> Check {
    let (kind, description) = match &prerequisite.kind {
        PrerequisiteKind::Interpreter { minimum, .. } => (
            CheckKind::Interpreter,
            match minimum {
                Some(minimum) => format!("Interpreter runs and is at least {}", minimum),
                None => "Interpreter runs".to_string(),
            },
        ),
        PrerequisiteKind::Library { module, .. } => {
            (CheckKind::Library, format!("Module '{}' can be imported", module))
        }
    };

    Check {
        id: id.to_string(),
        name: prerequisite.name.clone(),
        kind,
        description,
        result: None,
    }
}

fn with_result(mut check: Check, result: CheckResult) -> Check {
    check.result = Some(result);
    check
}
