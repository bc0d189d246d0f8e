//! Integration tests for bi-launcher.
//!
//! These tests drive the launcher against a scripted process runner and
//! real files in temporary directories.

pub mod config_tests;
pub mod orchestrator_tests;
