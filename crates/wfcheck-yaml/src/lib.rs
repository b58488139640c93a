//! Workflow YAML loader for wfcheck.
//!
//! Parses pipeline definitions into a tagged [`Value`] tree and wraps the root
//! in a [`WorkflowDocument`], which resolves the trigger block under either
//! `on` or boolean `true`.
//!
//! # Example
//! ```
//! let doc = wfcheck_yaml::parse("name: CI\non:\n  push: {}\njobs: {}\n").unwrap();
//! assert!(doc.has_triggers());
//! assert_eq!(doc.name().and_then(|v| v.as_str()), Some("CI"));
//! ```

pub mod document;
mod loader;
pub mod value;

pub use document::{action_refs, run_commands, steps, trigger_keys, WorkflowDocument};
pub use loader::{load, parse};
pub use value::{Key, Mapping, Value, ValueKind};
