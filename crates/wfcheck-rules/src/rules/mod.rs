//! Workflow rules.
//!
//! Each rule is a unit struct implementing [`Rule`]. A rule reads the loaded
//! documents and records outcomes on the [`Recorder`]; it never fails, and a
//! malformed shape degrades to a failed check.

pub mod consistency;
pub mod environment;
pub mod jobs;
pub mod security;
pub mod steps;
pub mod structure;
pub mod triggers;

use wfcheck_yaml::{Value, WorkflowDocument};

use crate::expectations::Expectations;
use crate::recorder::Recorder;

// ---------------------------------------------------------------------------
// Rule trait
// ---------------------------------------------------------------------------

pub trait Rule: Send + Sync {
    /// Stable identifier, used in logs.
    fn name(&self) -> &str;
    /// Section header printed before the rule runs.
    fn title(&self) -> &str;
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder);
}

/// Documents and expectations shared by every rule in a suite run.
#[derive(Debug, Clone, Copy)]
pub struct SuiteInput<'a> {
    pub release: &'a WorkflowDocument,
    pub ci: Option<&'a WorkflowDocument>,
    pub expectations: &'a Expectations,
}

impl<'a> SuiteInput<'a> {
    /// Loaded documents with their display labels, CI first.
    pub fn labeled(&self) -> Vec<(&'static str, &'a WorkflowDocument)> {
        let mut docs = Vec::with_capacity(2);
        if let Some(ci) = self.ci {
            docs.push(("CI", ci));
        }
        docs.push(("Release", self.release));
        docs
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A field that may be written as a single scalar or a list of them.
/// `None` for any other shape.
pub(crate) fn one_or_many(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::String(_) => Some(vec![value]),
        Value::Sequence(items) => Some(items.iter().collect()),
        _ => None,
    }
}
