//! Deployment bucket resolution.

use serde_json::json;
use tracing::debug;

use crate::error::{ControlPlaneError, Result};
use crate::transport::{ProviderTransport, CLOUDFORMATION_SERVICE, DESCRIBE_STACK_RESOURCE};

/// Logical id of the stack's deployment bucket.
pub const DEPLOYMENT_BUCKET_LOGICAL_ID: &str = "ServerlessDeploymentBucket";

/// Returns the configured bucket, or looks it up in the stack's resources.
///
/// # Errors
///
/// Returns the lookup failure, or a failure if the stack reports no bucket.
pub async fn resolve_bucket_name<T>(
    transport: &T,
    configured: Option<&str>,
    stack_name: &str,
    stage: &str,
    region: &str,
) -> Result<String>
where
    T: ProviderTransport + ?Sized,
{
    if let Some(bucket) = configured.filter(|b| !b.is_empty()) {
        debug!("Using configured deployment bucket: {bucket}");
        return Ok(bucket.to_string());
    }

    let response = transport
        .request(
            CLOUDFORMATION_SERVICE,
            DESCRIBE_STACK_RESOURCE,
            json!({
                "StackName": stack_name,
                "LogicalResourceId": DEPLOYMENT_BUCKET_LOGICAL_ID,
            }),
            stage,
            region,
        )
        .await?;

    let bucket = response
        .pointer("/StackResourceDetail/PhysicalResourceId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            ControlPlaneError::new(format!(
                "Could not find deployment bucket of stack [{stack_name}]"
            ))
        })?;

    debug!("Resolved deployment bucket: {bucket}");
    Ok(bucket.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::MockTransport;

    #[tokio::test]
    async fn test_configured_bucket_skips_lookup() {
        let mut transport = MockTransport::new();
        transport.expect_request().never();

        let bucket = resolve_bucket_name(&transport, Some("configured"), "stack", "dev", "us-east-1")
            .await
            .unwrap();
        assert_eq!(bucket, "configured");
    }

    #[tokio::test]
    async fn test_bucket_lookup() {
        let mut transport = MockTransport::new();
        transport
            .expect_request()
            .withf(|service, operation, payload, stage, region| {
                service == CLOUDFORMATION_SERVICE
                    && operation == DESCRIBE_STACK_RESOURCE
                    && payload["LogicalResourceId"] == DEPLOYMENT_BUCKET_LOGICAL_ID
                    && payload["StackName"] == "my-service-dev"
                    && stage == "dev"
                    && region == "us-east-1"
            })
            .times(1)
            .returning(|_, _, _, _, _| {
                Ok(json!({ "StackResourceDetail": { "PhysicalResourceId": "looked-up" } }))
            });

        let bucket = resolve_bucket_name(&transport, None, "my-service-dev", "dev", "us-east-1")
            .await
            .unwrap();
        assert_eq!(bucket, "looked-up");
    }

    #[tokio::test]
    async fn test_missing_physical_id() {
        let mut transport = MockTransport::new();
        transport
            .expect_request()
            .returning(|_, _, _, _, _| Ok(json!({ "StackResourceDetail": {} })));

        let err = resolve_bucket_name(&transport, Some(""), "my-service-dev", "dev", "us-east-1")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Could not find deployment bucket of stack [my-service-dev]"
        );
    }
}
