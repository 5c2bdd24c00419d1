//! Validation of the service file and resolved options.
//!
//! Catches values the control-plane would reject before any request is sent.

use crate::error::{ConfigError, ChangeSetsError, Result};
use tracing::debug;

use super::options::OptionsRecord;
use super::service::ServiceConfig;

/// Maximum length of stack and change-set names.
const MAX_NAME_LEN: usize = 128;

/// Key of the tag derived from the stage.
const STAGE_TAG: &str = "STAGE";

/// Validator for service configuration.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a service file together with the resolved options.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any check fails.
    pub fn validate(
        &self,
        config: &ServiceConfig,
        options: &OptionsRecord,
    ) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_service(config, &mut result);
        Self::validate_options(options, &mut result);
        Self::validate_provider(config, &mut result);

        if result.errors.is_empty() {
            debug!("Configuration validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(ChangeSetsError::Config(ConfigError::ValidationError {
                message: first_error.message.clone(),
                field: Some(first_error.field.clone()),
            }))
        }
    }

    fn validate_service(config: &ServiceConfig, result: &mut ValidationResult) {
        if config.service.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("service"),
                message: String::from("Service name cannot be empty"),
            });
        }

        if let Some(stack_name) = &config.provider.stack_name
            && !is_valid_name(stack_name)
        {
            result.errors.push(ValidationError {
                field: String::from("provider.stackName"),
                message: format!(
                    "Stack name '{stack_name}' is invalid. Must start with a letter and contain only alphanumerics and hyphens."
                ),
            });
        }
    }

    fn validate_options(options: &OptionsRecord, result: &mut ValidationResult) {
        if options.stage.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("stage"),
                message: String::from("Stage cannot be empty"),
            });
        }

        if options.region.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("region"),
                message: String::from("Region cannot be empty"),
            });
        }

        if let Some(name) = &options.change_set_name
            && !is_valid_name(name)
        {
            result.errors.push(ValidationError {
                field: String::from("changeSetName"),
                message: format!(
                    "Change set name '{name}' is invalid. Must start with a letter and contain only alphanumerics and hyphens."
                ),
            });
        }
    }

    fn validate_provider(config: &ServiceConfig, result: &mut ValidationResult) {
        if let Some(role) = &config.provider.cfn_role
            && !role.starts_with("arn:")
        {
            result.errors.push(ValidationError {
                field: String::from("provider.cfnRole"),
                message: format!("cfnRole '{role}' is not an IAM role ARN"),
            });
        }

        if config
            .provider
            .stack_tags
            .as_ref()
            .is_some_and(|tags| tags.contains_key(STAGE_TAG))
        {
            result.warnings.push(String::from(
                "provider.stackTags sets STAGE, which replaces the stage tag",
            ));
        }
    }
}

/// Checks a stack or change-set name against control-plane naming rules.
/// Names start with a letter and contain only ASCII alphanumerics and hyphens.
fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() || name.len() > MAX_NAME_LEN {
        return false;
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of warnings.
    #[must_use]
    pub const fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InvocationOptions, OptionsResolver};

    fn resolve(config: &ServiceConfig) -> OptionsRecord {
        OptionsResolver::for_service(config).resolve(&InvocationOptions::default())
    }

    fn parse(yaml: &str) -> ServiceConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("my-service-dev"));
        assert!(is_valid_name("MyStack1"));
        assert!(is_valid_name("a"));
    }

    #[test]
    fn test_invalid_name() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1-stack")); // starts with digit
        assert!(!is_valid_name("my_stack")); // underscore
        assert!(!is_valid_name(&"a".repeat(MAX_NAME_LEN + 1)));
    }

    #[test]
    fn test_valid_config() {
        let config = parse("service: my-service\n");
        let result = ConfigValidator::new().validate(&config, &resolve(&config)).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warning_count(), 0);
    }

    #[test]
    fn test_role_must_be_arn() {
        let config = parse(
            r"
service: my-service
provider:
  cfnRole: myrole
",
        );
        let err = ConfigValidator::new()
            .validate(&config, &resolve(&config))
            .unwrap_err();
        assert!(err.to_string().contains("cfnRole"));
    }

    #[test]
    fn test_stage_tag_override_warns() {
        let config = parse(
            r"
service: my-service
provider:
  stackTags:
    STAGE: overridden
",
        );
        let result = ConfigValidator::new().validate(&config, &resolve(&config)).unwrap();
        assert_eq!(result.warning_count(), 1);
    }

    #[test]
    fn test_invalid_change_set_name() {
        let config = parse("service: my-service\n");
        let mut options = resolve(&config);
        options.change_set_name = Some(String::from("release_1"));

        let result = ConfigValidator::new().validate(&config, &options);
        assert!(matches!(
            result,
            Err(ChangeSetsError::Config(ConfigError::ValidationError { field: Some(ref f), .. })) if f == "changeSetName"
        ));
    }
}
