//! Classification of control-plane failures.
//!
//! All wording the workflow depends on lives here.

use crate::error::ControlPlaneError;

/// Exact message returned when a change set would be empty.
pub const NO_UPDATES_MESSAGE: &str = "No updates are to be performed.";

/// Fragment of the message returned for an unknown stack.
pub const STACK_MISSING_FRAGMENT: &str = "does not exist";

/// What a failed submission means for the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Nothing to record; treated as success.
    NoChanges,
    /// Target stack is unknown; retry once as `CREATE`.
    StackMissing,
    /// Anything else; propagated unchanged.
    Fatal,
}

/// Classifies a failed `createChangeSet` call.
///
/// CloudFormation reports both recoverable cases under the generic
/// `ValidationError` code, so only the message tells them apart.
#[must_use]
pub fn classify_failure(err: &ControlPlaneError) -> FailureKind {
    if err.message == NO_UPDATES_MESSAGE {
        FailureKind::NoChanges
    } else if err.message.contains(STACK_MISSING_FRAGMENT) {
        FailureKind::StackMissing
    } else {
        FailureKind::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_updates_requires_exact_message() {
        let err = ControlPlaneError::with_code("ValidationError", NO_UPDATES_MESSAGE);
        assert_eq!(classify_failure(&err), FailureKind::NoChanges);

        let err = ControlPlaneError::new("No updates are to be performed. Really.");
        assert_eq!(classify_failure(&err), FailureKind::Fatal);
    }

    #[test]
    fn test_stack_missing_matches_fragment() {
        let err = ControlPlaneError::with_code(
            "ValidationError",
            "Stack [my-service-dev] does not exist",
        );
        assert_eq!(classify_failure(&err), FailureKind::StackMissing);
    }

    #[test]
    fn test_other_failures_are_fatal() {
        let err = ControlPlaneError::with_code("Throttling", "Rate exceeded");
        assert_eq!(classify_failure(&err), FailureKind::Fatal);
    }
}
