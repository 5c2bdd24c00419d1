//! Service file parser.
//!
//! Loads `serverless.yml` from disk or a string, with `.env` support and
//! environment variable overrides.

use crate::error::{ConfigError, ChangeSetsError, Result};
use std::path::Path;
use tracing::{debug, info};

use super::service::ServiceConfig;

/// Configuration parser for service files.
#[derive(Debug, Default)]
pub struct ConfigParser {
    /// Base path for resolving relative paths.
    base_path: Option<std::path::PathBuf>,
}

impl ConfigParser {
    /// Creates a new configuration parser.
    #[must_use]
    pub const fn new() -> Self {
        Self { base_path: None }
    }

    /// Sets the base path for resolving relative paths.
    #[must_use]
    pub fn with_base_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Loads a service file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ServiceConfig> {
        let path = path.as_ref();
        info!("Loading service configuration from: {}", path.display());

        if !path.exists() {
            return Err(ChangeSetsError::Config(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ChangeSetsError::Config(ConfigError::ParseError {
                message: format!("Failed to read file: {e}"),
                location: Some(path.display().to_string()),
            })
        })?;

        self.parse_yaml(&content, Some(path))
    }

    /// Parses a service file from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid.
    pub fn parse_yaml(&self, content: &str, source: Option<&Path>) -> Result<ServiceConfig> {
        debug!("Parsing YAML service configuration");

        let config: ServiceConfig = serde_yaml::from_str(content).map_err(|e| {
            let location = source.map(|p| p.display().to_string());
            ChangeSetsError::Config(ConfigError::ParseError {
                message: format!("YAML parse error: {e}"),
                location,
            })
        })?;

        debug!("Successfully parsed configuration for service: {}", config.service);
        Ok(config)
    }

    /// Loads a service file with environment variable overrides.
    ///
    /// Recognised variables: `CFN_CHANGESETS_STAGE`, `CFN_CHANGESETS_REGION`
    /// and `CFN_CHANGESETS_DEPLOYMENT_BUCKET`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with_env(&self, path: impl AsRef<Path>) -> Result<ServiceConfig> {
        let mut config = self.load_file(path)?;
        Self::apply_env_overrides(&mut config, |name| std::env::var(name).ok());
        Ok(config)
    }

    /// Applies environment overrides to the provider section.
    fn apply_env_overrides(config: &mut ServiceConfig, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(stage) = lookup("CFN_CHANGESETS_STAGE") {
            debug!("Overriding provider.stage from environment");
            config.provider.stage = Some(stage);
        }

        if let Some(region) = lookup("CFN_CHANGESETS_REGION") {
            debug!("Overriding provider.region from environment");
            config.provider.region = Some(region);
        }

        if let Some(bucket) = lookup("CFN_CHANGESETS_DEPLOYMENT_BUCKET") {
            debug!("Overriding provider.deploymentBucket from environment");
            config.provider.deployment_bucket = Some(bucket);
        }
    }

    /// Loads the .env file if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the .env file exists but cannot be loaded.
    pub fn load_dotenv(&self) -> Result<()> {
        let env_path = self
            .base_path
            .as_ref()
            .map_or_else(|| std::path::PathBuf::from(".env"), |p| p.join(".env"));

        if env_path.exists() {
            info!("Loading environment from: {}", env_path.display());
            dotenvy::from_path(&env_path).map_err(|e| {
                ChangeSetsError::Config(ConfigError::ParseError {
                    message: format!("Failed to load .env file: {e}"),
                    location: Some(env_path.display().to_string()),
                })
            })?;
        } else {
            debug!(".env file not found at: {}", env_path.display());
        }

        Ok(())
    }
}

/// Default service file names to search for.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["serverless.yml", "serverless.yaml"];

/// Finds the service file in a directory or its parents.
///
/// # Errors
///
/// Returns an error if no service file is found.
pub fn find_config_file(start_dir: impl AsRef<Path>) -> Result<std::path::PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_CONFIG_FILES {
            let config_path = current.join(filename);
            if config_path.exists() {
                info!("Found service file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(ChangeSetsError::Config(ConfigError::FileNotFound {
        path: start.join(DEFAULT_CONFIG_FILES[0]),
    }))
}
