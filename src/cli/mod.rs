//! CLI module: argument model, output formatting and the operator pause.

pub mod args;
pub mod output;
pub mod prompt;
