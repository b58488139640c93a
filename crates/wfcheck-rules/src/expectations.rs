//! Literal values the rules compare workflows against.
//!
//! Defaults describe a Bun package released to npm from a `build` job and a
//! `publish` job. A YAML file can override any subset of the fields.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;
use wfcheck_types::{Result, WfcheckError};
use wfcheck_yaml::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Expectations {
    /// Required top-level `name` of the release workflow.
    pub workflow_name: String,
    /// Runner label every job must use.
    pub runner: String,
    pub allowed_runners: Vec<String>,
    pub release_types: Vec<String>,
    pub tag_pattern: String,
    pub valid_events: Vec<String>,
    /// Top-level env values that must hold in every workflow.
    pub env: BTreeMap<String, Value>,
    /// Job that only reads repository contents and runs first.
    pub read_only_job: String,
    /// The one job allowed to hold write scopes.
    pub publishing_job: String,
    pub publish_permissions: BTreeMap<String, String>,
    pub permission_levels: Vec<String>,
    pub checkout_action: String,
    pub setup: SetupExpectation,
    pub build_commands: Vec<String>,
    pub artifact: ArtifactExpectation,
    pub publish: PublishExpectation,
    pub min_build_steps: usize,
    pub min_publish_steps: usize,
    pub floating_aliases: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetupExpectation {
    pub action: String,
    pub option: String,
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactExpectation {
    pub name: String,
    pub path: String,
    pub upload_action: String,
    pub upload_step: String,
    pub download_action: String,
    pub download_step: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishExpectation {
    pub step_name: String,
    /// Substring that identifies the publish step among run commands.
    pub marker: String,
    pub command: String,
    pub secret: String,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

impl Default for Expectations {
    fn default() -> Self {
        Self {
            workflow_name: "Release".into(),
            runner: "ubuntu-latest".into(),
            allowed_runners: strings(&["ubuntu-latest", "ubuntu-22.04", "ubuntu-20.04"]),
            release_types: strings(&["published"]),
            tag_pattern: "v*.*.*".into(),
            valid_events: strings(&[
                "push",
                "pull_request",
                "release",
                "workflow_dispatch",
                "schedule",
                "repository_dispatch",
                "workflow_call",
            ]),
            env: BTreeMap::from([("HUSKY".to_owned(), Value::Integer(0))]),
            read_only_job: "build".into(),
            publishing_job: "publish".into(),
            publish_permissions: BTreeMap::from([
                ("contents".to_owned(), "write".to_owned()),
                ("packages".to_owned(), "write".to_owned()),
            ]),
            permission_levels: strings(&["read", "write", "none"]),
            checkout_action: "actions/checkout@v5".into(),
            setup: SetupExpectation::default(),
            build_commands: strings(&["bun ci", "bun run build"]),
            artifact: ArtifactExpectation::default(),
            publish: PublishExpectation::default(),
            min_build_steps: 3,
            min_publish_steps: 4,
            floating_aliases: strings(&["latest", "main", "master"]),
        }
    }
}

impl Default for SetupExpectation {
    fn default() -> Self {
        Self {
            action: "oven-sh/setup-bun@v2".into(),
            option: "bun-version".into(),
            value: Value::from("latest"),
        }
    }
}

impl Default for ArtifactExpectation {
    fn default() -> Self {
        Self {
            name: "build-output".into(),
            path: "./dist".into(),
            upload_action: "actions/upload-artifact".into(),
            upload_step: "Upload build artifacts".into(),
            download_action: "actions/download-artifact".into(),
            download_step: "Download build artifacts".into(),
        }
    }
}

impl Default for PublishExpectation {
    fn default() -> Self {
        Self {
            step_name: "Publish to npm".into(),
            marker: "npm publish".into(),
            command: "bunx npm publish --access public".into(),
            secret: "NPM_TOKEN".into(),
        }
    }
}

impl Expectations {
    /// Parse an expectations override file. Fields it omits keep their defaults.
    pub fn from_yaml(source: &str) -> Result<Self> {
        serde_yaml_ng::from_str(source).map_err(|err| WfcheckError::Expectations(err.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => WfcheckError::NotFound {
                path: path.to_path_buf(),
            },
            _ => WfcheckError::Io(err),
        })?;
        let expectations = Self::from_yaml(&source)?;
        tracing::debug!(path = %path.display(), "loaded expectations");
        Ok(expectations)
    }
}
