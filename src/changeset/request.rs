//! Change-set request model.
//!
//! [`ChangeSetRequestBuilder`] holds everything except the change-set type,
//! so each submission attempt builds a fresh request from the same inputs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// File name of the compiled template inside the artifact directory.
pub const TEMPLATE_FILE_NAME: &str = "compiled-cloudformation-template.json";

/// Capabilities sent with every change set.
pub const CAPABILITIES: [&str; 2] = ["CAPABILITY_IAM", "CAPABILITY_NAMED_IAM"];

/// Key of the tag derived from the stage.
pub const STAGE_TAG_KEY: &str = "STAGE";

/// Whether the change set targets a new or an existing stack.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeSetType {
    /// The stack does not exist yet.
    Create,
    /// The stack already exists.
    Update,
}

impl ChangeSetType {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
        }
    }
}

impl fmt::Display for ChangeSetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stack tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

/// A template parameter reusing its previous value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    /// Parameter key.
    pub parameter_key: String,
    /// Whether to keep the stack's current value.
    pub use_previous_value: bool,
}

/// Payload of a `createChangeSet` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeSetRequest {
    /// Target stack.
    pub stack_name: String,
    /// Name of the change set.
    pub change_set_name: String,
    /// Acknowledged capabilities.
    pub capabilities: Vec<String>,
    /// Create or update.
    pub change_set_type: ChangeSetType,
    /// Template parameters.
    pub parameters: Vec<Parameter>,
    /// Location of the compiled template.
    #[serde(rename = "TemplateURL")]
    pub template_url: String,
    /// Stack tags.
    pub tags: Vec<Tag>,
    /// Execution role. Omitted from the payload when absent.
    #[serde(rename = "RoleARN", default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
}

/// Location of a packaged template in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLocation {
    /// Deployment bucket.
    pub bucket: String,
    /// Artifact directory inside the bucket.
    pub artifact_directory: String,
}

impl TemplateLocation {
    /// Creates a template location.
    #[must_use]
    pub fn new(bucket: impl Into<String>, artifact_directory: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            artifact_directory: artifact_directory.into(),
        }
    }

    /// Returns the HTTPS URL of the compiled template.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "https://s3.amazonaws.com/{}/{}/{TEMPLATE_FILE_NAME}",
            self.bucket, self.artifact_directory
        )
    }
}

/// Builds [`ChangeSetRequest`]s from fixed inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetRequestBuilder {
    stack_name: String,
    change_set_name: String,
    template_url: String,
    tags: Vec<Tag>,
    role_arn: Option<String>,
    parameters: Vec<Parameter>,
}

impl ChangeSetRequestBuilder {
    /// Starts a builder for a stack, change-set name and template.
    #[must_use]
    pub fn new(
        stack_name: impl Into<String>,
        change_set_name: impl Into<String>,
        location: &TemplateLocation,
    ) -> Self {
        Self {
            stack_name: stack_name.into(),
            change_set_name: change_set_name.into(),
            template_url: location.url(),
            tags: Vec::new(),
            role_arn: None,
            parameters: Vec::new(),
        }
    }

    /// Sets the tags: `STAGE` first, then the custom tags on top.
    ///
    /// A custom tag with an existing key replaces its value in place.
    #[must_use]
    pub fn tags(mut self, stage: &str, custom: &[(String, String)]) -> Self {
        let mut tags = vec![Tag {
            key: STAGE_TAG_KEY.to_string(),
            value: stage.to_string(),
        }];

        for (key, value) in custom {
            match tags.iter_mut().find(|tag| &tag.key == key) {
                Some(tag) => tag.value.clone_from(value),
                None => tags.push(Tag {
                    key: key.clone(),
                    value: value.clone(),
                }),
            }
        }

        self.tags = tags;
        self
    }

    /// Sets the execution role, if any.
    #[must_use]
    pub fn role_arn(mut self, role_arn: Option<&str>) -> Self {
        self.role_arn = role_arn.filter(|role| !role.is_empty()).map(ToString::to_string);
        self
    }

    /// Reuses the previous values of the given template parameters.
    #[must_use]
    pub fn previous_parameters(mut self, keys: &[String]) -> Self {
        self.parameters = keys
            .iter()
            .map(|key| Parameter {
                parameter_key: key.clone(),
                use_previous_value: true,
            })
            .collect();
        self
    }

    /// Returns the change-set name.
    #[must_use]
    pub fn change_set_name(&self) -> &str {
        &self.change_set_name
    }

    /// Builds a request of the given type.
    #[must_use]
    pub fn build(&self, change_set_type: ChangeSetType) -> ChangeSetRequest {
        ChangeSetRequest {
            stack_name: self.stack_name.clone(),
            change_set_name: self.change_set_name.clone(),
            capabilities: CAPABILITIES.iter().map(ToString::to_string).collect(),
            change_set_type,
            parameters: self.parameters.clone(),
            template_url: self.template_url.clone(),
            tags: self.tags.clone(),
            role_arn: self.role_arn.clone(),
        }
    }
}
