//! Change-set submission.
//!
//! Builds the request from the resolved options and service state, submits
//! it as `UPDATE`, and applies the recovery policy: an empty change set is
//! success, an unknown stack earns one `CREATE` retry, anything else fails.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{OptionsRecord, ServiceContext};
use crate::error::{ChangeSetsError, Result};
use crate::naming::{Clock, StackNaming};
use crate::transport::{ProviderTransport, CLOUDFORMATION_SERVICE, CREATE_CHANGE_SET};

use super::bucket::resolve_bucket_name;
use super::classify::{classify_failure, FailureKind};
use super::request::{ChangeSetRequest, ChangeSetRequestBuilder, ChangeSetType, TemplateLocation};

/// How a submission settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// The control-plane accepted the change set.
    Submitted {
        /// Stack the change set belongs to.
        stack_name: String,
        /// Registered change-set name.
        change_set_name: String,
        /// Mode of the accepted attempt.
        change_set_type: ChangeSetType,
    },
    /// The template matches the live stack; nothing was registered.
    NoChanges {
        /// Stack that was compared.
        stack_name: String,
    },
    /// Direct deployment was already disabled; nothing was sent.
    Skipped,
}

/// Submits one change set for a stack.
#[derive(Debug)]
pub struct ChangeSetSubmitter<'a, T: ?Sized, N, C> {
    transport: &'a T,
    naming: &'a N,
    clock: &'a C,
    options: &'a OptionsRecord,
    service: &'a ServiceContext,
}

impl<'a, T, N, C> ChangeSetSubmitter<'a, T, N, C>
where
    T: ProviderTransport + ?Sized,
    N: StackNaming,
    C: Clock,
{
    /// Creates a submitter over borrowed collaborators.
    #[must_use]
    pub const fn new(
        transport: &'a T,
        naming: &'a N,
        clock: &'a C,
        options: &'a OptionsRecord,
        service: &'a ServiceContext,
    ) -> Self {
        Self {
            transport,
            naming,
            clock,
            options,
            service,
        }
    }

    /// Returns the configured change-set name, or `{stack}-{epoch millis}`.
    #[must_use]
    pub fn change_set_name(&self, stack_name: &str) -> String {
        match self.options.change_set_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("{stack_name}-{}", self.clock.now_millis()),
        }
    }

    /// Returns a builder holding every request field but the type.
    #[must_use]
    pub fn request_builder(
        &self,
        stack_name: &str,
        change_set_name: &str,
        bucket: &str,
    ) -> ChangeSetRequestBuilder {
        let location = TemplateLocation::new(bucket, self.service.artifact_directory.as_str());
        let builder = ChangeSetRequestBuilder::new(stack_name, change_set_name, &location)
            .tags(&self.options.stage, &self.service.stack_tags)
            .role_arn(self.service.cfn_role.as_deref());

        if self.options.reuse_parameters {
            builder.previous_parameters(&self.service.template_parameters)
        } else {
            builder
        }
    }

    /// Creates the change set.
    ///
    /// `deploys_disabled` reports whether direct deployment was forbidden
    /// before the workflow's own gate; if so nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns the control-plane failure unchanged when it is neither an
    /// empty change set nor an unknown stack, or when the `CREATE` retry fails.
    pub async fn submit(&self, deploys_disabled: bool) -> Result<SubmissionOutcome> {
        let stack_name = self.naming.stack_name();
        let change_set_name = self.change_set_name(&stack_name);

        if deploys_disabled {
            info!("Stack deployment is disabled, skipping ChangeSet [{change_set_name}]");
            return Ok(SubmissionOutcome::Skipped);
        }

        let bucket = resolve_bucket_name(
            self.transport,
            self.service.deployment_bucket.as_deref(),
            &stack_name,
            &self.options.stage,
            &self.options.region,
        )
        .await?;
        let builder = self.request_builder(&stack_name, &change_set_name, &bucket);

        info!("Creating CloudFormation ChangeSet [{change_set_name}]...");
        let Err(err) = self.send(&builder.build(ChangeSetType::Update)).await else {
            return Ok(SubmissionOutcome::Submitted {
                stack_name,
                change_set_name,
                change_set_type: ChangeSetType::Update,
            });
        };

        match err.as_control_plane().map(classify_failure) {
            Some(FailureKind::NoChanges) => {
                debug!("ChangeSet [{change_set_name}] has no changes");
                Ok(SubmissionOutcome::NoChanges { stack_name })
            }
            Some(FailureKind::StackMissing) => {
                info!("Stack [{stack_name}] does not exist. Creating a new empty stack...");
                self.send(&builder.build(ChangeSetType::Create)).await?;
                Ok(SubmissionOutcome::Submitted {
                    stack_name,
                    change_set_name,
                    change_set_type: ChangeSetType::Create,
                })
            }
            Some(FailureKind::Fatal) | None => Err(err),
        }
    }

    async fn send(&self, request: &ChangeSetRequest) -> Result<Value> {
        let payload = serde_json::to_value(request).map_err(|e| {
            ChangeSetsError::internal(format!("Failed to serialize change set request: {e}"))
        })?;

        let response = self
            .transport
            .request(
                CLOUDFORMATION_SERVICE,
                CREATE_CHANGE_SET,
                payload,
                &self.options.stage,
                &self.options.region,
            )
            .await?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControlPlaneError;
    use crate::naming::{FixedClock, ServiceStackNaming};
    use crate::transport::testing::MockTransport;
    use mockall::Sequence;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    const NOW: i64 = 1_510_926_650_275;

    fn options(change_set_name: Option<&str>) -> OptionsRecord {
        OptionsRecord {
            stage: String::from("dev"),
            region: String::from("us-east-1"),
            require_change_set: true,
            change_set_name: change_set_name.map(ToString::to_string),
            reuse_parameters: false,
        }
    }

    fn service() -> ServiceContext {
        ServiceContext {
            service_name: String::from("my-service"),
            artifact_directory: String::from("somedir"),
            deployment_bucket: Some(String::from("deployment-bucket")),
            ..ServiceContext::default()
        }
    }

    fn naming() -> ServiceStackNaming {
        ServiceStackNaming::new("my-service", "dev")
    }

    /// Records every payload and answers from a script of results.
    fn scripted(
        transport: &mut MockTransport,
        results: Vec<std::result::Result<Value, ControlPlaneError>>,
    ) -> Arc<Mutex<Vec<Value>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut seq = Sequence::new();
        for result in results {
            let seen = Arc::clone(&seen);
            transport
                .expect_request()
                .withf(|service, operation, _, stage, region| {
                    service == CLOUDFORMATION_SERVICE
                        && operation == CREATE_CHANGE_SET
                        && stage == "dev"
                        && region == "us-east-1"
                })
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_, _, payload, _, _| {
                    seen.lock().unwrap().push(payload);
                    result.clone()
                });
        }
        seen
    }

    #[tokio::test]
    async fn test_submits_update_change_set() {
        let mut transport = MockTransport::new();
        let seen = scripted(&mut transport, vec![Ok(json!({ "Id": "arn:changeset" }))]);
        let (naming, clock, options, service) = (naming(), FixedClock(NOW), options(Some("test")), service());

        let outcome = ChangeSetSubmitter::new(&transport, &naming, &clock, &options, &service)
            .submit(false)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SubmissionOutcome::Submitted {
                stack_name: String::from("my-service-dev"),
                change_set_name: String::from("test"),
                change_set_type: ChangeSetType::Update,
            }
        );
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0]["ChangeSetName"], json!("test"));
        assert_eq!(seen[0]["ChangeSetType"], json!("UPDATE"));
    }

    #[tokio::test]
    async fn test_generates_name_from_frozen_clock() {
        let mut transport = MockTransport::new();
        let seen = scripted(&mut transport, vec![Ok(json!({}))]);
        let (naming, clock, options, service) = (naming(), FixedClock(NOW), options(None), service());

        ChangeSetSubmitter::new(&transport, &naming, &clock, &options, &service)
            .submit(false)
            .await
            .unwrap();

        assert_eq!(
            seen.lock().unwrap()[0]["ChangeSetName"],
            json!("my-service-dev-1510926650275")
        );
    }

    #[tokio::test]
    async fn test_no_updates_is_success_without_retry() {
        let mut transport = MockTransport::new();
        let seen = scripted(
            &mut transport,
            vec![Err(ControlPlaneError::with_code(
                "ValidationError",
                "No updates are to be performed.",
            ))],
        );
        let (naming, clock, options, service) = (naming(), FixedClock(NOW), options(None), service());

        let outcome = ChangeSetSubmitter::new(&transport, &naming, &clock, &options, &service)
            .submit(false)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SubmissionOutcome::NoChanges { stack_name: String::from("my-service-dev") }
        );
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_stack_retries_once_as_create() {
        let mut transport = MockTransport::new();
        let seen = scripted(
            &mut transport,
            vec![
                Err(ControlPlaneError::new("Stack [my-service-dev] does not exist")),
                Ok(json!({})),
            ],
        );
        let (naming, clock, options, service) = (naming(), FixedClock(NOW), options(Some("test")), service());

        let outcome = ChangeSetSubmitter::new(&transport, &naming, &clock, &options, &service)
            .submit(false)
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            SubmissionOutcome::Submitted { change_set_type: ChangeSetType::Create, .. }
        ));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1]["ChangeSetType"], json!("CREATE"));
        let mut first = seen[0].clone();
        first["ChangeSetType"] = json!("CREATE");
        assert_eq!(first, seen[1]);
    }

    #[tokio::test]
    async fn test_failed_retry_propagates_second_error() {
        let mut transport = MockTransport::new();
        scripted(
            &mut transport,
            vec![
                Err(ControlPlaneError::new("Stack [my-service-dev] does not exist")),
                Err(ControlPlaneError::with_code("AccessDenied", "Not authorized to create stacks")),
            ],
        );
        let (naming, clock, options, service) = (naming(), FixedClock(NOW), options(None), service());

        let err = ChangeSetSubmitter::new(&transport, &naming, &clock, &options, &service)
            .submit(false)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Not authorized to create stacks");
        assert_eq!(
            err.as_control_plane().and_then(|e| e.code.as_deref()),
            Some("AccessDenied")
        );
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let mut transport = MockTransport::new();
        scripted(
            &mut transport,
            vec![Err(ControlPlaneError::with_code("Throttling", "Rate exceeded"))],
        );
        let (naming, clock, options, service) = (naming(), FixedClock(NOW), options(None), service());

        let err = ChangeSetSubmitter::new(&transport, &naming, &clock, &options, &service)
            .submit(false)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Rate exceeded");
    }

    #[tokio::test]
    async fn test_disabled_deploys_send_nothing() {
        let mut transport = MockTransport::new();
        transport.expect_request().never();
        let mut service = service();
        service.deployment_bucket = None;
        let (naming, clock, options) = (naming(), FixedClock(NOW), options(None));

        let outcome = ChangeSetSubmitter::new(&transport, &naming, &clock, &options, &service)
            .submit(true)
            .await
            .unwrap();

        assert_eq!(outcome, SubmissionOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_tags_role_and_reused_parameters() {
        let mut transport = MockTransport::new();
        let seen = scripted(&mut transport, vec![Ok(json!({}))]);
        let mut service = service();
        service.stack_tags = vec![
            (String::from("STAGE"), String::from("overridden")),
            (String::from("tag1"), String::from("value1")),
        ];
        service.cfn_role = Some(String::from("arn:aws:iam::123456789012:role/myrole"));
        service.template_parameters = vec![String::from("Existing")];
        let mut options = options(None);
        options.reuse_parameters = true;
        let (naming, clock) = (naming(), FixedClock(NOW));

        ChangeSetSubmitter::new(&transport, &naming, &clock, &options, &service)
            .submit(false)
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen[0]["Tags"],
            json!([
                { "Key": "STAGE", "Value": "overridden" },
                { "Key": "tag1", "Value": "value1" },
            ])
        );
        assert_eq!(seen[0]["RoleARN"], json!("arn:aws:iam::123456789012:role/myrole"));
        assert_eq!(
            seen[0]["Parameters"],
            json!([{ "ParameterKey": "Existing", "UsePreviousValue": true }])
        );
    }
}
