//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::changeset::{ChangeSetRequest, SubmissionOutcome};
use crate::controller::LifecycleHook;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Request field row for table display.
#[derive(Tabled)]
struct RequestFieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Hook row for table display.
#[derive(Tabled)]
struct HookRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Lifecycle event")]
    event: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a change-set request for display.
    #[must_use]
    pub fn format_request(&self, request: &ChangeSetRequest) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(request).unwrap_or_default(),
            OutputFormat::Text => Self::format_request_text(request),
        }
    }

    fn format_request_text(request: &ChangeSetRequest) -> String {
        let tags = request
            .tags
            .iter()
            .map(|tag| format!("{}={}", tag.key, tag.value))
            .collect::<Vec<_>>()
            .join(", ");
        let parameters = if request.parameters.is_empty() {
            String::from("(none)")
        } else {
            request
                .parameters
                .iter()
                .map(|p| p.parameter_key.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut rows = vec![
            RequestFieldRow { field: String::from("Stack"), value: request.stack_name.clone() },
            RequestFieldRow {
                field: String::from("Change set"),
                value: request.change_set_name.clone(),
            },
            RequestFieldRow {
                field: String::from("Type"),
                value: request.change_set_type.to_string(),
            },
            RequestFieldRow { field: String::from("Template"), value: request.template_url.clone() },
            RequestFieldRow {
                field: String::from("Capabilities"),
                value: request.capabilities.join(", "),
            },
            RequestFieldRow { field: String::from("Tags"), value: tags },
            RequestFieldRow { field: String::from("Parameters"), value: parameters },
        ];
        if let Some(role) = &request.role_arn {
            rows.push(RequestFieldRow { field: String::from("Role"), value: role.clone() });
        }

        let mut output = String::new();
        let _ = writeln!(output, "\nChange set request\n");
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');
        output
    }

    /// Formats a submission outcome for display.
    #[must_use]
    pub fn format_outcome(&self, outcome: &SubmissionOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => Self::format_outcome_text(outcome),
        }
    }

    fn format_outcome_text(outcome: &SubmissionOutcome) -> String {
        match outcome {
            SubmissionOutcome::Submitted {
                stack_name,
                change_set_name,
                change_set_type,
            } => format!(
                "{} Change set {} ({}) created for stack {}\n",
                "✓".green(),
                change_set_name.bold(),
                change_set_type,
                stack_name
            ),
            SubmissionOutcome::NoChanges { stack_name } => format!(
                "{} No changes required - stack {} is up to date.\n",
                "✓".green(),
                stack_name
            ),
            SubmissionOutcome::Skipped => format!(
                "{} Stack deployment is disabled, no change set created.\n",
                "⚠".yellow()
            ),
        }
    }

    /// Formats the registered lifecycle hooks.
    #[must_use]
    pub fn format_hooks(&self, hooks: &[LifecycleHook]) -> String {
        match self.format {
            OutputFormat::Json => {
                let names: Vec<&str> = hooks.iter().map(|h| h.as_str()).collect();
                serde_json::to_string_pretty(&names).unwrap_or_default()
            }
            OutputFormat::Text => {
                if hooks.is_empty() {
                    return String::from(
                        "Change sets are not required; no lifecycle hooks registered.\n",
                    );
                }
                let rows: Vec<HookRow> = hooks
                    .iter()
                    .enumerate()
                    .map(|(i, hook)| HookRow { index: i + 1, event: hook.to_string() })
                    .collect();
                let mut output = Table::new(rows).to_string();
                output.push('\n');
                output
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::{ChangeSetRequestBuilder, ChangeSetType, TemplateLocation};

    fn request() -> ChangeSetRequest {
        ChangeSetRequestBuilder::new(
            "my-service-dev",
            "my-service-dev-1",
            &TemplateLocation::new("deployment-bucket", "somedir"),
        )
        .tags("dev", &[])
        .build(ChangeSetType::Update)
    }

    #[test]
    fn test_request_json_matches_wire_format() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_request(&request())).unwrap();
        assert_eq!(value["ChangeSetType"], "UPDATE");
        assert!(value.get("RoleARN").is_none());
    }

    #[test]
    fn test_request_text_lists_fields() {
        let text = OutputFormatter::new(OutputFormat::Text).format_request(&request());
        assert!(text.contains("my-service-dev-1"));
        assert!(text.contains("STAGE=dev"));
        assert!(text.contains("(none)"));
        assert!(!text.contains("Role"));
    }

    #[test]
    fn test_outcome_json_is_tagged() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_outcome(&SubmissionOutcome::Skipped)).unwrap();
        assert_eq!(value["outcome"], "skipped");
    }

    #[test]
    fn test_hooks_text() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        assert!(formatter.format_hooks(&[]).contains("no lifecycle hooks"));
        assert!(formatter
            .format_hooks(&LifecycleHook::ALL)
            .contains("before:aws:deploy:deploy:updateStack"));
    }
}
