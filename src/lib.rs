// ABOUTME: Library root for hoist - exposes the orchestrator for the binary and tests.
// ABOUTME: The main binary is in main.rs.

pub mod channel;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod runtime;
pub mod shell;
pub mod ssh;
pub mod types;
