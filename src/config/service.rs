//! Service configuration types.
//!
//! These structs map to the `serverless.yml` service file. Only the fields
//! the change-set workflow reads are modelled; the `custom` section is kept
//! as a free-form mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The root service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Service name.
    pub service: String,
    /// Provider section.
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Free-form plugin configuration.
    #[serde(default = "empty_object")]
    pub custom: Value,
}

/// Provider section of the service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Default stage.
    #[serde(default)]
    pub stage: Option<String>,
    /// Default region.
    #[serde(default)]
    pub region: Option<String>,
    /// Explicit stack name, replacing `{service}-{stage}`.
    #[serde(default)]
    pub stack_name: Option<String>,
    /// Custom stack tags, in declaration order.
    #[serde(default)]
    pub stack_tags: Option<Map<String, Value>>,
    /// Role assumed by the control-plane when applying the stack.
    #[serde(default)]
    pub cfn_role: Option<String>,
    /// Deployment bucket holding the packaged artifacts.
    #[serde(default)]
    pub deployment_bucket: Option<String>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Ambient service and template state read when a request is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceContext {
    /// Service name.
    pub service_name: String,
    /// Explicit stack name, if configured.
    pub stack_name: Option<String>,
    /// Artifact directory inside the deployment bucket.
    pub artifact_directory: String,
    /// Deployment bucket, when known up front.
    pub deployment_bucket: Option<String>,
    /// Custom stack tags, in declaration order.
    pub stack_tags: Vec<(String, String)>,
    /// Execution role ARN.
    pub cfn_role: Option<String>,
    /// Parameter keys declared by the compiled template.
    pub template_parameters: Vec<String>,
}

impl ServiceConfig {
    /// Returns the persisted options namespace under `custom`, if present.
    #[must_use]
    pub fn custom_section(&self, key: &str) -> Option<&Value> {
        self.custom.get(key)
    }

    /// Returns the custom stack tags as ordered key/value pairs.
    ///
    /// Non-string values are rendered as their JSON text.
    #[must_use]
    pub fn stack_tags(&self) -> Vec<(String, String)> {
        self.provider
            .stack_tags
            .as_ref()
            .map(|tags| {
                tags.iter()
                    .map(|(key, value)| {
                        let value = value
                            .as_str()
                            .map_or_else(|| value.to_string(), ToString::to_string);
                        (key.clone(), value)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Builds the request-time context for an artifact directory.
    #[must_use]
    pub fn context(&self, artifact_directory: impl Into<String>) -> ServiceContext {
        ServiceContext {
            service_name: self.service.clone(),
            stack_name: self.provider.stack_name.clone(),
            artifact_directory: artifact_directory.into(),
            deployment_bucket: self.provider.deployment_bucket.clone(),
            stack_tags: self.stack_tags(),
            cfn_role: self.provider.cfn_role.clone(),
            template_parameters: Vec::new(),
        }
    }
}

impl ServiceContext {
    /// Records the parameter keys declared by a compiled template.
    #[must_use]
    pub fn with_template(mut self, template: &Value) -> Self {
        self.template_parameters = template
            .get("Parameters")
            .and_then(Value::as_object)
            .map(|params| params.keys().cloned().collect())
            .unwrap_or_default();
        self
    }

    /// Overrides the deployment bucket.
    #[must_use]
    pub fn with_deployment_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.deployment_bucket = Some(bucket.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stack_tags_keep_declaration_order() {
        let config: ServiceConfig = serde_yaml::from_str(
            r"
service: my-service
provider:
  stackTags:
    zeta: last-alpha
    alpha: 1
",
        )
        .unwrap();

        assert_eq!(
            config.stack_tags(),
            vec![
                (String::from("zeta"), String::from("last-alpha")),
                (String::from("alpha"), String::from("1")),
            ]
        );
    }

    #[test]
    fn test_context_from_config() {
        let config: ServiceConfig = serde_yaml::from_str(
            r"
service: my-service
provider:
  cfnRole: arn:aws:iam::123456789012:role/myrole
  deploymentBucket: my-bucket
",
        )
        .unwrap();

        let context = config.context("somedir");
        assert_eq!(context.service_name, "my-service");
        assert_eq!(context.artifact_directory, "somedir");
        assert_eq!(context.deployment_bucket.as_deref(), Some("my-bucket"));
        assert_eq!(
            context.cfn_role.as_deref(),
            Some("arn:aws:iam::123456789012:role/myrole")
        );
        assert!(context.stack_tags.is_empty());
    }

    #[test]
    fn test_template_parameters() {
        let template = json!({
            "Resources": {},
            "Parameters": { "First": {}, "Second": {} }
        });
        let context = ServiceContext::default().with_template(&template);
        assert_eq!(context.template_parameters, vec!["First", "Second"]);

        let context = ServiceContext::default().with_template(&json!({}));
        assert!(context.template_parameters.is_empty());
    }
}
