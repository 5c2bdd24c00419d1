// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # CloudFormation Change Sets
//!
//! Plan-then-apply deployments for CloudFormation stacks.
//!
//! ## Overview
//!
//! Instead of updating a stack directly, the workflow registers a named,
//! inspectable **change set** describing the difference between the packaged
//! template and the live stack. Applying it is a separate, explicit action.
//!
//! ## Architecture
//!
//! 1. **Options**: invocation flags merged over `custom.cf-changesets`
//! 2. **Gate**: direct stack updates are locked while the change set is created
//! 3. **Submitter**: builds the request, creates the stack on first deploy,
//!    and treats an empty change set as success
//!
//! ## Modules
//!
//! - [`config`]: Service file parsing, options resolution and validation
//! - [`gate`]: Deployment target descriptor and lock guard
//! - [`naming`]: Stack naming and clocks
//! - [`transport`]: Control-plane request transport
//! - [`changeset`]: Request model, failure classification and submission
//! - [`controller`]: Lifecycle hooks and gated execution
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! service: my-service
//!
//! provider:
//!   name: aws
//!   stage: dev
//!   stackTags:
//!     team: platform
//!
//! custom:
//!   cf-changesets:
//!     requireChangeSet: true
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod changeset;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod gate;
pub mod naming;
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

pub use changeset::{ChangeSetRequest, ChangeSetSubmitter, ChangeSetType, SubmissionOutcome};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, OptionsRecord, OptionsResolver, ServiceConfig};
pub use controller::{ChangeSetController, LifecycleHook};
pub use error::{ChangeSetsError, ControlPlaneError, Result};
pub use gate::{DeploymentGate, DeploymentTarget};
pub use naming::{Clock, FixedClock, StackNaming, SystemClock};
pub use transport::{AwsCloudFormationTransport, ProviderTransport};
