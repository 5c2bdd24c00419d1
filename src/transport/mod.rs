//! Control-plane transport module.
//!
//! Defines the request interface the workflow depends on and its AWS
//! CloudFormation implementation.

mod aws;
mod provider;

pub use aws::{AwsCloudFormationTransport, DescribeStackResourceRequest};
pub use provider::{
    ProviderTransport, CLOUDFORMATION_SERVICE, CREATE_CHANGE_SET, DESCRIBE_STACK_RESOURCE,
};
