//! AWS CloudFormation transport.
//!
//! Serves the operations the change-set workflow issues on top of the AWS SDK.
//! Each call targets the region it is given.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::config::Region;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudformation::types::{Capability, ChangeSetType, Parameter, Tag};
use aws_sdk_cloudformation::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

use crate::changeset::{
    ChangeSetRequest, Parameter as RequestParameter, Tag as RequestTag,
};
use crate::error::ControlPlaneError;

use super::provider::{
    ProviderTransport, CLOUDFORMATION_SERVICE, CREATE_CHANGE_SET, DESCRIBE_STACK_RESOURCE,
};

/// Payload of a `describeStackResource` request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStackResourceRequest {
    /// Stack to inspect.
    pub stack_name: String,
    /// Logical id of the resource.
    pub logical_resource_id: String,
}

/// CloudFormation transport backed by the AWS SDK.
#[derive(Debug, Clone)]
pub struct AwsCloudFormationTransport {
    /// Shared SDK configuration (credentials, retry policy).
    sdk_config: SdkConfig,
}

impl AwsCloudFormationTransport {
    /// Creates a transport from the environment's AWS configuration.
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::load_from_env().await;
        Self { sdk_config }
    }

    /// Creates a transport from an existing SDK configuration.
    #[must_use]
    pub const fn with_sdk_config(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    /// Builds a client for a region.
    fn client(&self, region: &str) -> Client {
        let config = aws_sdk_cloudformation::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        Client::from_conf(config)
    }

    async fn create_change_set(
        &self,
        request: ChangeSetRequest,
        region: &str,
    ) -> Result<Value, ControlPlaneError> {
        let tags = sdk_tags(request.tags);
        let parameters = sdk_parameters(request.parameters);

        let output = self
            .client(region)
            .create_change_set()
            .stack_name(request.stack_name)
            .change_set_name(request.change_set_name)
            .set_capabilities(Some(
                request.capabilities.iter().map(|c| Capability::from(c.as_str())).collect(),
            ))
            .change_set_type(ChangeSetType::from(request.change_set_type.as_str()))
            .set_parameters(Some(parameters))
            .template_url(request.template_url)
            .set_tags(Some(tags))
            .set_role_arn(request.role_arn)
            .send()
            .await
            .map_err(into_control_plane_error)?;

        Ok(json!({
            "Id": output.id(),
            "StackId": output.stack_id(),
        }))
    }

    async fn describe_stack_resource(
        &self,
        request: DescribeStackResourceRequest,
        region: &str,
    ) -> Result<Value, ControlPlaneError> {
        let output = self
            .client(region)
            .describe_stack_resource()
            .stack_name(request.stack_name)
            .logical_resource_id(request.logical_resource_id)
            .send()
            .await
            .map_err(into_control_plane_error)?;

        let detail = output.stack_resource_detail();
        Ok(json!({
            "StackResourceDetail": {
                "LogicalResourceId": detail.and_then(|d| d.logical_resource_id()),
                "PhysicalResourceId": detail.and_then(|d| d.physical_resource_id()),
                "ResourceType": detail.and_then(|d| d.resource_type()),
            }
        }))
    }
}

#[async_trait]
impl ProviderTransport for AwsCloudFormationTransport {
    async fn request(
        &self,
        service: &str,
        operation: &str,
        payload: Value,
        stage: &str,
        region: &str,
    ) -> Result<Value, ControlPlaneError> {
        debug!("{service}.{operation} for stage {stage} in {region}");

        if service != CLOUDFORMATION_SERVICE {
            return Err(unsupported(service, operation));
        }

        match operation {
            CREATE_CHANGE_SET => {
                self.create_change_set(decode_payload(payload)?, region).await
            }
            DESCRIBE_STACK_RESOURCE => {
                self.describe_stack_resource(decode_payload(payload)?, region)
                    .await
            }
            _ => Err(unsupported(service, operation)),
        }
    }
}

/// Converts request tags into SDK tags, keeping their order.
fn sdk_tags(tags: Vec<RequestTag>) -> Vec<Tag> {
    tags.into_iter()
        .map(|tag| Tag::builder().key(tag.key).value(tag.value).build())
        .collect()
}

fn sdk_parameters(parameters: Vec<RequestParameter>) -> Vec<Parameter> {
    parameters
        .into_iter()
        .map(|param| {
            Parameter::builder()
                .parameter_key(param.parameter_key)
                .use_previous_value(param.use_previous_value)
                .build()
        })
        .collect()
}

/// Decodes a request payload into an operation input.
fn decode_payload<T: DeserializeOwned>(payload: Value) -> Result<T, ControlPlaneError> {
    serde_json::from_value(payload)
        .map_err(|e| ControlPlaneError::with_code("InvalidRequest", format!("Malformed payload: {e}")))
}

fn unsupported(service: &str, operation: &str) -> ControlPlaneError {
    ControlPlaneError::with_code(
        "UnsupportedOperation",
        format!("Unsupported operation {service}.{operation}"),
    )
}

/// Maps an SDK failure onto the service's code and message.
fn into_control_plane_error<E, R>(err: SdkError<E, R>) -> ControlPlaneError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(ToString::to_string);
    let message = err
        .message()
        .map_or_else(|| DisplayErrorContext(&err).to_string(), ToString::to_string);
    ControlPlaneError { code, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::ChangeSetType as RequestType;

    fn transport() -> AwsCloudFormationTransport {
        AwsCloudFormationTransport::with_sdk_config(SdkConfig::builder().build())
    }

    #[test]
    fn test_decode_change_set_payload() {
        let payload = json!({
            "StackName": "my-service-dev",
            "ChangeSetName": "my-service-dev-1",
            "Capabilities": ["CAPABILITY_IAM", "CAPABILITY_NAMED_IAM"],
            "ChangeSetType": "CREATE",
            "Parameters": [],
            "TemplateURL": "https://s3.amazonaws.com/b/d/compiled-cloudformation-template.json",
            "Tags": [{ "Key": "STAGE", "Value": "dev" }],
        });

        let request: ChangeSetRequest = decode_payload(payload).unwrap();
        assert_eq!(request.change_set_type, RequestType::Create);
        assert!(request.role_arn.is_none());
        assert_eq!(request.tags.len(), 1);
    }

    #[test]
    fn test_sdk_tags_and_parameters() {
        let tags = sdk_tags(vec![
            RequestTag { key: String::from("STAGE"), value: String::from("dev") },
            RequestTag { key: String::from("team"), value: String::from("platform") },
        ]);
        let keys: Vec<_> = tags.iter().map(Tag::key).collect();
        assert_eq!(keys, vec![Some("STAGE"), Some("team")]);
        assert_eq!(tags[1].value(), Some("platform"));

        let parameters = sdk_parameters(vec![RequestParameter {
            parameter_key: String::from("BucketName"),
            use_previous_value: true,
        }]);
        assert_eq!(parameters[0].parameter_key(), Some("BucketName"));
        assert_eq!(parameters[0].use_previous_value(), Some(true));
        assert!(sdk_parameters(Vec::new()).is_empty());
    }

    #[test]
    fn test_decode_malformed_payload() {
        let result: Result<ChangeSetRequest, _> = decode_payload(json!({ "StackName": 1 }));
        assert_eq!(result.unwrap_err().code.as_deref(), Some("InvalidRequest"));
    }

    #[tokio::test]
    async fn test_unsupported_operations() {
        let transport = transport();

        let err = transport
            .request("S3", "putObject", json!({}), "dev", "us-east-1")
            .await
            .unwrap_err();
        assert_eq!(err.code.as_deref(), Some("UnsupportedOperation"));

        let err = transport
            .request(CLOUDFORMATION_SERVICE, "deleteStack", json!({}), "dev", "us-east-1")
            .await
            .unwrap_err();
        assert_eq!(err.message, "Unsupported operation CloudFormation.deleteStack");
    }
}
