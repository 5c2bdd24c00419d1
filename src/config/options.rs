//! Options resolution.
//!
//! Merges built-in defaults, the persisted `custom.cf-changesets` section and
//! the invocation flags into one immutable [`OptionsRecord`]. Later tiers win;
//! mapping values merge recursively and scalars overwrite.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::service::ServiceConfig;

/// Namespace key under `custom` holding the persisted options.
pub const OPTIONS_NAMESPACE: &str = "cf-changesets";

/// Stage used when nothing else supplies one.
pub const DEFAULT_STAGE: &str = "dev";

/// Region used when nothing else supplies one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Invocation key carrying the change-set trigger.
const TRIGGER_KEY: &str = "changeset";

/// How the invocation asked for the gated workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSetTrigger {
    /// Bare flag, no explicit name.
    Requested,
    /// Flag carrying a change-set name.
    Named(String),
}

/// Raw invocation options.
#[derive(Debug, Clone, Default)]
pub struct InvocationOptions {
    /// Stage flag.
    pub stage: Option<String>,
    /// Region flag.
    pub region: Option<String>,
    /// Change-set trigger, if given.
    pub changeset: Option<ChangeSetTrigger>,
    /// Any further free-form flags.
    pub extra: Map<String, Value>,
}

/// Resolved, immutable options for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsRecord {
    /// Target stage.
    pub stage: String,
    /// Target region.
    pub region: String,
    /// Whether the gated workflow activates.
    pub require_change_set: bool,
    /// Explicit change-set name.
    pub change_set_name: Option<String>,
    /// Whether to reuse previous parameter values.
    pub reuse_parameters: bool,
}

/// Merges the option tiers into an [`OptionsRecord`].
#[derive(Debug, Clone)]
pub struct OptionsResolver {
    defaults: Map<String, Value>,
    persisted: Value,
}

impl Default for OptionsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionsResolver {
    /// Creates a resolver with built-in defaults and no persisted options.
    #[must_use]
    pub fn new() -> Self {
        let mut defaults = Map::new();
        defaults.insert("stage".into(), Value::from(DEFAULT_STAGE));
        defaults.insert("region".into(), Value::from(DEFAULT_REGION));
        defaults.insert("requireChangeSet".into(), Value::Bool(false));
        defaults.insert("reuseParameters".into(), Value::Bool(false));

        Self {
            defaults,
            persisted: Value::Null,
        }
    }

    /// Creates a resolver for a service file.
    ///
    /// The provider's stage and region replace the built-in defaults and
    /// `custom.cf-changesets` becomes the persisted tier.
    #[must_use]
    pub fn for_service(config: &ServiceConfig) -> Self {
        let mut resolver = Self::new();
        if let Some(stage) = &config.provider.stage {
            resolver.defaults.insert("stage".into(), Value::from(stage.as_str()));
        }
        if let Some(region) = &config.provider.region {
            resolver.defaults.insert("region".into(), Value::from(region.as_str()));
        }
        match config.custom_section(OPTIONS_NAMESPACE) {
            Some(section) => resolver.with_persisted(section),
            None => resolver,
        }
    }

    /// Sets the persisted tier from the `custom.cf-changesets` section.
    #[must_use]
    pub fn with_persisted(mut self, section: &Value) -> Self {
        self.persisted = section.clone();
        self
    }

    /// Resolves the final options.
    #[must_use]
    pub fn resolve(&self, invocation: &InvocationOptions) -> OptionsRecord {
        let mut merged = Value::Object(self.defaults.clone());
        deep_merge(&mut merged, &self.persisted);
        deep_merge(&mut merged, &invocation_layer(invocation));

        let mut record = OptionsRecord {
            stage: string_field(&merged, "stage").unwrap_or_else(|| DEFAULT_STAGE.to_string()),
            region: string_field(&merged, "region")
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            require_change_set: bool_field(&merged, "requireChangeSet"),
            change_set_name: string_field(&merged, "changeSetName").filter(|n| !n.is_empty()),
            reuse_parameters: bool_field(&merged, "reuseParameters"),
        };

        match &invocation.changeset {
            Some(ChangeSetTrigger::Named(name)) if !name.is_empty() => {
                record.require_change_set = true;
                record.change_set_name = Some(name.clone());
            }
            Some(_) => record.require_change_set = true,
            None => {}
        }

        debug!(
            "Resolved options: stage={}, region={}, requireChangeSet={}",
            record.stage, record.region, record.require_change_set
        );
        record
    }
}

/// Builds the invocation tier, leaving the trigger out.
fn invocation_layer(invocation: &InvocationOptions) -> Value {
    let mut layer: Map<String, Value> = invocation
        .extra
        .iter()
        .filter(|(key, _)| key.as_str() != TRIGGER_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    // An empty flag leaves the lower tiers in charge.
    if let Some(stage) = invocation.stage.as_deref().filter(|s| !s.is_empty()) {
        layer.insert("stage".into(), Value::from(stage));
    }
    if let Some(region) = invocation.region.as_deref().filter(|r| !r.is_empty()) {
        layer.insert("region".into(), Value::from(region));
    }
    Value::Object(layer)
}

/// Merges `source` into `target`.
///
/// Objects merge key by key, anything else overwrites. `null` in the source
/// counts as absent.
pub fn deep_merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (_, Value::Null) => {}
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None if !value.is_null() => {
                        target.insert(key.clone(), value.clone());
                    }
                    None => {}
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

fn string_field(merged: &Value, key: &str) -> Option<String> {
    merged.get(key).and_then(Value::as_str).map(ToString::to_string)
}

fn bool_field(merged: &Value, key: &str) -> bool {
    merged.get(key).and_then(Value::as_bool).unwrap_or(false)
}
