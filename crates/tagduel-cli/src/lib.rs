//! Tagduel CLI library.
//!
//! This library provides the core functionality for the `tagduel` command-line
//! interface: argument parsing, configuration loading, and the command
//! implementations.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
