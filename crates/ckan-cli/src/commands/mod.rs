//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod delete;
pub mod upload;
