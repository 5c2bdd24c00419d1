//! Change-set lifecycle controller.
//!
//! Binds the workflow to the host's deploy lifecycle. When change sets are
//! required, three hooks are registered around the host's `updateStack`
//! step: lock direct deploys, create the change set, unlock.

use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::changeset::{ChangeSetRequest, ChangeSetSubmitter, ChangeSetType, SubmissionOutcome};
use crate::config::{OptionsRecord, ServiceContext};
use crate::error::{ChangeSetsError, ConfigError, Result};
use crate::gate::{DeploymentGate, DeploymentTarget};
use crate::naming::{Clock, ServiceStackNaming, StackNaming, SystemClock};
use crate::transport::ProviderTransport;

/// Lifecycle points the controller binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    /// Runs before the host's stack update; locks direct deploys.
    BeforeUpdateStack,
    /// Replaces the stack update; creates the change set.
    UpdateStack,
    /// Runs after the stack update; restores the lock state.
    AfterUpdateStack,
}

impl LifecycleHook {
    /// All hooks, in execution order.
    pub const ALL: [Self; 3] = [Self::BeforeUpdateStack, Self::UpdateStack, Self::AfterUpdateStack];

    /// Returns the host's identifier for this lifecycle point.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeforeUpdateStack => "before:aws:deploy:deploy:updateStack",
            Self::UpdateStack => "aws:deploy:deploy:updateStack",
            Self::AfterUpdateStack => "after:aws:deploy:deploy:updateStack",
        }
    }
}

impl fmt::Display for LifecycleHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleHook {
    type Err = ChangeSetsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| ChangeSetsError::internal(format!("Unknown lifecycle hook: {s}")))
    }
}

/// Controller for one invocation of the change-set workflow.
#[derive(Debug)]
pub struct ChangeSetController<T, N = ServiceStackNaming, C = SystemClock> {
    /// Resolved options.
    options: OptionsRecord,
    /// Service and template state.
    service: ServiceContext,
    /// Control-plane transport.
    transport: T,
    /// Stack naming.
    naming: N,
    /// Clock for generated change-set names.
    clock: C,
    /// Save-override-restore guard.
    gate: DeploymentGate,
}

impl<T: ProviderTransport> ChangeSetController<T> {
    /// Creates a controller with default naming and the system clock.
    #[must_use]
    pub fn new(options: OptionsRecord, service: ServiceContext, transport: T) -> Self {
        let naming = ServiceStackNaming::new(service.service_name.as_str(), options.stage.as_str())
            .with_explicit(service.stack_name.clone());

        Self {
            options,
            service,
            transport,
            naming,
            clock: SystemClock,
            gate: DeploymentGate::new(),
        }
    }
}

impl<T, N, C> ChangeSetController<T, N, C>
where
    T: ProviderTransport,
    N: StackNaming,
    C: Clock,
{
    /// Replaces the stack naming collaborator.
    #[must_use]
    pub fn with_naming<N2: StackNaming>(self, naming: N2) -> ChangeSetController<T, N2, C> {
        ChangeSetController {
            options: self.options,
            service: self.service,
            transport: self.transport,
            naming,
            clock: self.clock,
            gate: self.gate,
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ChangeSetController<T, N, C2> {
        ChangeSetController {
            options: self.options,
            service: self.service,
            transport: self.transport,
            naming: self.naming,
            clock,
            gate: self.gate,
        }
    }

    /// Returns the resolved options.
    #[must_use]
    pub const fn options(&self) -> &OptionsRecord {
        &self.options
    }

    /// Returns the registered hooks; empty unless change sets are required.
    #[must_use]
    pub fn hooks(&self) -> &'static [LifecycleHook] {
        if self.options.require_change_set {
            &LifecycleHook::ALL
        } else {
            &[]
        }
    }

    /// Forbids direct deploys, remembering the previous state.
    pub fn lock_stack_deployment(&mut self, target: &mut DeploymentTarget) {
        self.gate.acquire(target);
    }

    /// Restores the state seen by [`Self::lock_stack_deployment`].
    pub fn unlock_stack_deployment(&mut self, target: &mut DeploymentTarget) {
        self.gate.release(target);
    }

    /// Creates the change set for the current stack.
    ///
    /// # Errors
    ///
    /// Returns the control-plane failure when it cannot be recovered.
    pub async fn create_change_set(&self, target: &DeploymentTarget) -> Result<SubmissionOutcome> {
        self.submitter()
            .submit(self.gate.disabled_externally(target))
            .await
    }

    /// Runs one lifecycle hook.
    ///
    /// Returns the submission outcome for [`LifecycleHook::UpdateStack`], and
    /// `None` for the other hooks or when the hook is not registered.
    ///
    /// # Errors
    ///
    /// Returns the failure of the change-set submission.
    pub async fn run_hook(
        &mut self,
        hook: LifecycleHook,
        target: &mut DeploymentTarget,
    ) -> Result<Option<SubmissionOutcome>> {
        if !self.hooks().contains(&hook) {
            debug!("Hook {hook} is not registered");
            return Ok(None);
        }

        debug!("Running hook {hook}");
        match hook {
            LifecycleHook::BeforeUpdateStack => {
                self.lock_stack_deployment(target);
                Ok(None)
            }
            LifecycleHook::UpdateStack => self.create_change_set(target).await.map(Some),
            LifecycleHook::AfterUpdateStack => {
                self.unlock_stack_deployment(target);
                Ok(None)
            }
        }
    }

    /// Runs lock, create and unlock in order.
    ///
    /// The unlock runs whether or not the creation succeeded. Returns `None`
    /// when change sets are not required.
    ///
    /// # Errors
    ///
    /// Returns the failure of the change-set submission.
    pub async fn run_gated(
        &mut self,
        target: &mut DeploymentTarget,
    ) -> Result<Option<SubmissionOutcome>> {
        if !self.options.require_change_set {
            info!("Change sets are not required, leaving the deployment untouched");
            return Ok(None);
        }

        self.lock_stack_deployment(target);
        let result = self.create_change_set(target).await;
        self.unlock_stack_deployment(target);

        result.map(Some)
    }

    /// Builds the `UPDATE` request that would be submitted, without sending it.
    ///
    /// # Errors
    ///
    /// Returns an error if no deployment bucket is configured.
    pub fn preview(&self) -> Result<ChangeSetRequest> {
        let bucket = self
            .service
            .deployment_bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| {
                ConfigError::validation(
                    "A deployment bucket is required to preview a change set",
                    "provider.deploymentBucket",
                )
            })?;

        let submitter = self.submitter();
        let stack_name = self.naming.stack_name();
        let change_set_name = submitter.change_set_name(&stack_name);

        Ok(submitter
            .request_builder(&stack_name, &change_set_name, bucket)
            .build(ChangeSetType::Update))
    }

    fn submitter(&self) -> ChangeSetSubmitter<'_, T, N, C> {
        ChangeSetSubmitter::new(
            &self.transport,
            &self.naming,
            &self.clock,
            &self.options,
            &self.service,
        )
    }
}
