//! Change-set module.
//!
//! Request model and builder, failure classification, deployment bucket
//! resolution and the submitter that ties them together.

mod bucket;
mod classify;
mod request;
mod submitter;

pub use bucket::{resolve_bucket_name, DEPLOYMENT_BUCKET_LOGICAL_ID};
pub use classify::{classify_failure, FailureKind, NO_UPDATES_MESSAGE, STACK_MISSING_FRAGMENT};
pub use request::{
    ChangeSetRequest, ChangeSetRequestBuilder, ChangeSetType, Parameter, Tag, TemplateLocation,
    CAPABILITIES, STAGE_TAG_KEY, TEMPLATE_FILE_NAME,
};
pub use submitter::{ChangeSetSubmitter, SubmissionOutcome};
