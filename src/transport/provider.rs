//! Provider transport trait definition.
//!
//! The controller talks to the control-plane only through this interface.
//! Credentials, retries and backoff belong to the implementation.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ControlPlaneError;

/// Control-plane service name used for stack operations.
pub const CLOUDFORMATION_SERVICE: &str = "CloudFormation";

/// Operation registering a change set.
pub const CREATE_CHANGE_SET: &str = "createChangeSet";

/// Operation describing a single stack resource.
pub const DESCRIBE_STACK_RESOURCE: &str = "describeStackResource";

/// Authenticated request transport to the control-plane API.
#[async_trait]
pub trait ProviderTransport: Send + Sync {
    /// Sends one request and returns the decoded response.
    ///
    /// # Errors
    ///
    /// Returns the control-plane's failure, with its message intact.
    async fn request(
        &self,
        service: &str,
        operation: &str,
        payload: Value,
        stage: &str,
        region: &str,
    ) -> Result<Value, ControlPlaneError>;
}

#[async_trait]
impl ProviderTransport for Box<dyn ProviderTransport> {
    async fn request(
        &self,
        service: &str,
        operation: &str,
        payload: Value,
        stage: &str,
        region: &str,
    ) -> Result<Value, ControlPlaneError> {
        (**self).request(service, operation, payload, stage, region).await
    }
}

#[async_trait]
impl<T: ProviderTransport + ?Sized> ProviderTransport for &T {
    async fn request(
        &self,
        service: &str,
        operation: &str,
        payload: Value,
        stage: &str,
        region: &str,
    ) -> Result<Value, ControlPlaneError> {
        (**self).request(service, operation, payload, stage, region).await
    }
}
