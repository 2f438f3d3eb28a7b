//! CLI module organization
//!
//! - args: CLI argument structures
//! - commands: command execution
//! - output: progress display and result rendering

pub mod args;
pub mod commands;
pub mod output;

pub use args::*;
pub use commands::*;
