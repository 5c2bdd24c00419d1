//! Stack naming and clock collaborators.

use chrono::Utc;

/// Derives a stack's canonical name.
pub trait StackNaming {
    /// Returns the stack name.
    fn stack_name(&self) -> String;
}

/// Default naming: an explicit stack name, or `{service}-{stage}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStackNaming {
    service: String,
    stage: String,
    explicit: Option<String>,
}

impl ServiceStackNaming {
    /// Creates a naming strategy for a service and stage.
    #[must_use]
    pub fn new(service: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            stage: stage.into(),
            explicit: None,
        }
    }

    /// Uses an explicit stack name when one is configured.
    #[must_use]
    pub fn with_explicit(mut self, explicit: Option<String>) -> Self {
        self.explicit = explicit.filter(|name| !name.is_empty());
        self
    }
}

impl StackNaming for ServiceStackNaming {
    fn stack_name(&self) -> String {
        self.explicit
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.service, self.stage))
    }
}

/// Source of the current time in epoch milliseconds.
pub trait Clock {
    /// Returns milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock frozen at a fixed reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stack_name() {
        let naming = ServiceStackNaming::new("my-service", "dev");
        assert_eq!(naming.stack_name(), "my-service-dev");
    }

    #[test]
    fn test_explicit_stack_name() {
        let naming = ServiceStackNaming::new("my-service", "dev")
            .with_explicit(Some(String::from("custom-stack")));
        assert_eq!(naming.stack_name(), "custom-stack");

        let naming = ServiceStackNaming::new("my-service", "dev").with_explicit(Some(String::new()));
        assert_eq!(naming.stack_name(), "my-service-dev");
    }

    #[test]
    fn test_clocks() {
        assert_eq!(FixedClock(1_510_926_650_275).now_millis(), 1_510_926_650_275);
        assert!(SystemClock.now_millis() > 1_510_926_650_275);
    }
}
