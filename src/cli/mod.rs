//! CLI module for the change-set tool.
//!
//! This module provides the command-line interface for creating and
//! inspecting CloudFormation change sets.

mod commands;
mod output;

pub use commands::{Cli, Commands, InvocationArgs, OutputFormat};
pub use output::OutputFormatter;
