//! Platform abstraction layer.
//!
//! Provides consistent interfaces for:
//! - Running child processes (captured or with inherited stdio)
//! - Interpreter discovery and module probing
//! - Host metadata for reports

pub mod host;
pub mod interpreter;
pub mod process;
