//! formrender CLI library
//!
//! Exposes the command definitions and implementations so they can be
//! exercised without spawning the binary.

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::{Cli, Commands};
pub use error::{CliError, CliResult};
