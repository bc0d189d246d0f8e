//! Launch step checks.
//!
//! One module per step kind:
//! - Interpreter: presence and version policy
//! - Library: importability, with pip remediation
//! - Artifact: required files, first existing candidate wins
//!
//! # Failure Semantics
//!
//! Every check returns `Ok(CheckResult)` (Pass or Warn) when the step may
//! proceed and `Err(LaunchError)` when it may not. Checks never panic and
//! never decide whether the run continues; that is the orchestrator's job.

pub mod artifact;
pub mod interpreter;
pub mod library;

use std::time::Instant;

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
