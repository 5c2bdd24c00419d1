//! Deployment gate for suspending direct stack updates.
//!
//! The host owns a [`DeploymentTarget`] and consults it before running its
//! own direct-apply step. [`DeploymentGate`] saves the target's flag, forbids
//! direct applies while a change set is created, then restores the saved value.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shared descriptor of the deployment target.
///
/// Passed by reference to both the host's apply logic and the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentTarget {
    /// Whether direct applies are currently forbidden.
    should_not_deploy: bool,
}

impl DeploymentTarget {
    /// Creates a target with the given gate state.
    #[must_use]
    pub const fn new(should_not_deploy: bool) -> Self {
        Self { should_not_deploy }
    }

    /// Returns true if direct applies are forbidden.
    #[must_use]
    pub const fn should_not_deploy(&self) -> bool {
        self.should_not_deploy
    }

    /// Sets the gate state.
    pub const fn set_should_not_deploy(&mut self, value: bool) {
        self.should_not_deploy = value;
    }

    /// Returns true if the host may run its direct apply.
    #[must_use]
    pub const fn allows_direct_apply(&self) -> bool {
        !self.should_not_deploy
    }
}

/// Save-override-restore guard around a [`DeploymentTarget`].
///
/// `acquire` and `release` are called once each, in that order, even when
/// the work between them fails.
#[derive(Debug, Default)]
pub struct DeploymentGate {
    /// Flag value seen by `acquire`, until `release` restores it.
    saved: Option<bool>,
}

impl DeploymentGate {
    /// Creates an idle gate.
    #[must_use]
    pub const fn new() -> Self {
        Self { saved: None }
    }

    /// Saves the current flag and forbids direct applies.
    pub fn acquire(&mut self, target: &mut DeploymentTarget) {
        let previous = target.should_not_deploy();
        debug!("Locking stack deployment (previous shouldNotDeploy={previous})");
        self.saved = Some(previous);
        target.set_should_not_deploy(true);
    }

    /// Restores the flag saved by `acquire`.
    ///
    /// Without a prior `acquire` the target is left untouched.
    pub fn release(&mut self, target: &mut DeploymentTarget) {
        if let Some(previous) = self.saved.take() {
            debug!("Unlocking stack deployment (restoring shouldNotDeploy={previous})");
            target.set_should_not_deploy(previous);
        }
    }

    /// Returns the flag value saved by `acquire`, while held.
    #[must_use]
    pub const fn saved_state(&self) -> Option<bool> {
        self.saved
    }

    /// Returns true between `acquire` and `release`.
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.saved.is_some()
    }

    /// Returns true if direct applies were forbidden independently of this gate.
    ///
    /// While held this is the saved value; otherwise the target's current flag.
    #[must_use]
    pub const fn disabled_externally(&self, target: &DeploymentTarget) -> bool {
        match self.saved {
            Some(previous) => previous,
            None => target.should_not_deploy(),
        }
    }
}
