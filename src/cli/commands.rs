//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{ChangeSetTrigger, InvocationOptions};
use crate::error::{ConfigError, Result};

/// cfn-changesets - Plan-then-apply CloudFormation deployments.
#[derive(Parser, Debug)]
#[command(name = "cfn-changesets")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the service file.
    #[arg(short, long, global = true, env = "CFN_CHANGESETS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a change set for the packaged template.
    Deploy {
        /// Invocation options.
        #[command(flatten)]
        invocation: InvocationArgs,
    },

    /// Show the change-set request without sending it.
    Plan {
        /// Invocation options.
        #[command(flatten)]
        invocation: InvocationArgs,
    },

    /// List the lifecycle hooks that would be registered.
    Hooks {
        /// Invocation options.
        #[command(flatten)]
        invocation: InvocationArgs,
    },
}

/// Flags shared by all commands.
#[derive(Args, Debug, Clone, Default)]
pub struct InvocationArgs {
    /// Target stage.
    #[arg(short, long)]
    pub stage: Option<String>,

    /// Target region.
    #[arg(short, long)]
    pub region: Option<String>,

    /// Require a change set, optionally naming it.
    #[arg(long, num_args = 0..=1, value_name = "NAME")]
    pub changeset: Option<Option<String>>,

    /// Deployment bucket (skips the bucket lookup).
    #[arg(long, env = "CFN_CHANGESETS_DEPLOYMENT_BUCKET")]
    pub bucket: Option<String>,

    /// Artifact directory inside the deployment bucket.
    #[arg(long)]
    pub artifact_dir: Option<String>,

    /// Reuse the stack's previous parameter values.
    #[arg(long)]
    pub reuse_parameters: bool,

    /// Compiled template declaring the parameters to reuse.
    #[arg(long)]
    pub template: Option<PathBuf>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl InvocationArgs {
    /// Converts the flags into raw invocation options.
    #[must_use]
    pub fn invocation_options(&self) -> InvocationOptions {
        let changeset = self.changeset.as_ref().map(|name| match name {
            Some(name) => ChangeSetTrigger::Named(name.clone()),
            None => ChangeSetTrigger::Requested,
        });

        let mut extra = serde_json::Map::new();
        if self.reuse_parameters {
            extra.insert("reuseParameters".into(), serde_json::Value::Bool(true));
        }

        InvocationOptions {
            stage: self.stage.clone(),
            region: self.region.clone(),
            changeset,
            extra,
        }
    }

    /// Returns the artifact directory the template was packaged into.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `--artifact-dir` is missing or empty.
    pub fn artifact_directory(&self) -> Result<&str> {
        self.artifact_dir
            .as_deref()
            .filter(|dir| !dir.trim_matches('/').is_empty())
            .ok_or_else(|| {
                ConfigError::validation(
                    "An artifact directory is required to locate the compiled template",
                    "artifactDir",
                )
                .into()
            })
    }
}
