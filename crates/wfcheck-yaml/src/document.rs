use std::path::{Path, PathBuf};

use wfcheck_types::{Result, WfcheckError};

use crate::value::{Key, Mapping, Value};

/// Keys under which the trigger block may appear, in lookup order.
///
/// YAML 1.1 parsers read a bare `on` as boolean `true`; YAML 1.2 parsers keep
/// it as the string. Both spellings resolve to the same block.
pub fn trigger_keys() -> [Key; 2] {
    [Key::String("on".into()), Key::Bool(true)]
}

/// One parsed workflow file.
#[derive(Debug, Clone)]
pub struct WorkflowDocument {
    path: Option<PathBuf>,
    root: Value,
    triggers: Option<Value>,
}

impl WorkflowDocument {
    /// Wrap a parsed tree, resolving the trigger block once.
    pub fn from_value(root: Value, path: Option<PathBuf>) -> Self {
        let triggers = root.as_mapping().and_then(|map| {
            trigger_keys()
                .iter()
                .find_map(|key| map.get_key(key))
                .cloned()
        });
        Self {
            path,
            root,
            triggers,
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The trigger block, regardless of how `on` was tokenized.
    pub fn triggers(&self) -> Option<&Value> {
        self.triggers.as_ref()
    }

    pub fn has_triggers(&self) -> bool {
        self.triggers.is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    pub fn name(&self) -> Option<&Value> {
        self.root.get("name")
    }

    /// Top-level `env` block, if it is a mapping.
    pub fn env(&self) -> Option<&Mapping> {
        self.root.get("env").and_then(Value::as_mapping)
    }

    /// Jobs in declaration order. Empty when `jobs` is absent or malformed.
    pub fn jobs(&self) -> Vec<(String, &Value)> {
        self.root
            .get("jobs")
            .and_then(Value::as_mapping)
            .map(|jobs| jobs.iter().map(|(k, v)| (k.to_string(), v)).collect())
            .unwrap_or_default()
    }

    pub fn job_names(&self) -> Vec<String> {
        self.jobs().into_iter().map(|(name, _)| name).collect()
    }

    pub fn job(&self, name: &str) -> Option<&Value> {
        self.root.get("jobs").and_then(|jobs| jobs.get(name))
    }

    /// Re-serialize the tree as YAML text.
    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml_ng::to_string(&serde_yaml_ng::Value::from(&self.root))
            .map_err(|err| WfcheckError::Other(format!("failed to re-serialize workflow: {err}")))
    }
}

/// Steps of a job. Empty when `steps` is absent or not a sequence.
pub fn steps(job: &Value) -> &[Value] {
    job.get("steps").and_then(Value::as_sequence).unwrap_or(&[])
}

/// `run` commands of a job's steps, in order.
pub fn run_commands(job: &Value) -> Vec<&str> {
    steps(job).iter().filter_map(|s| s.get_str("run")).collect()
}

/// `uses` references of a job's steps, in order.
pub fn action_refs(job: &Value) -> Vec<&str> {
    steps(job).iter().filter_map(|s| s.get_str("uses")).collect()
}
