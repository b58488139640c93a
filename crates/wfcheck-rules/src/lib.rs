//! Assertion recorder, workflow rules and suite driver for wfcheck.
//!
//! A suite loads the CI and release workflows, runs a fixed list of
//! [`rules::Rule`]s against them and collects every outcome on a
//! [`Recorder`]. Rules compare against an [`Expectations`] value, which
//! defaults to a Bun package published to npm.

pub mod expectations;
pub mod recorder;
pub mod rules;
pub mod suite;

pub use expectations::Expectations;
pub use recorder::Recorder;
pub use rules::{Rule, SuiteInput};
pub use suite::{
    apply_rules, describe_error, run, run_documents, SuiteKind, SuiteReport, SuiteRun,
    WorkflowPaths,
};
