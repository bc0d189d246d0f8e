//! Launch engine.
//!
//! Runs plans step by step and aggregates the step results into a report.

pub mod orchestrator;
pub mod result;
