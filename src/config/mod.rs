//! Configuration module for the change-set workflow.
//!
//! This module handles all configuration-related functionality:
//! - Parsing the `serverless.yml` service file
//! - Resolving invocation flags against persisted options
//! - Validation of names, roles and tags

mod options;
mod parser;
mod service;
mod validator;

pub use options::{
    deep_merge, ChangeSetTrigger, InvocationOptions, OptionsRecord, OptionsResolver,
    DEFAULT_REGION, DEFAULT_STAGE, OPTIONS_NAMESPACE,
};
pub use parser::{find_config_file, ConfigParser, DEFAULT_CONFIG_FILES};
pub use service::{ProviderConfig, ServiceConfig, ServiceContext};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
