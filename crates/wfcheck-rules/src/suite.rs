//! Suite driver: loads the workflows, applies a fixed rule list, and turns
//! the outcome into an exit code or a serializable report.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use wfcheck_types::{CheckResult, Result, RunSummary, Warning, WfcheckError};
use wfcheck_yaml::WorkflowDocument;

use crate::expectations::Expectations;
use crate::recorder::Recorder;
use crate::rules::consistency::{
    ActionVersionDriftRule, ConcurrencyControlRule, ConsistentRunnerRule, CrossLeastPrivilegeRule,
    PermissionsDeclaredRule, ReadOnlyJobPermissionsRule, SetupPatternsRule,
};
use crate::rules::environment::{ConsistentEnvRule, EnvNamingRule, PinnedEnvRule};
use crate::rules::jobs::{
    JobIsolationRule, LeastPrivilegeRule, NeedsReferencesRule, PermissionLevelsRule,
    PublishingJobRule, ReadOnlyJobRule, RunnerLabelsRule,
};
use crate::rules::security::{
    CurlPipeRule, HardcodedSecretKeysRule, HardcodedTokenRule, NoSudoRule, SecretEchoRule,
    SecretInterpolationRule,
};
use crate::rules::steps::{ActionPinningRule, BuildStepsRule, PublishStepsRule, StepIdsUniqueRule};
use crate::rules::structure::{DocumentShapeRule, TopLevelKeysRule};
use crate::rules::triggers::{ReleaseTriggersRule, TriggerEventsRule, WildcardBranchRule};
use crate::rules::{Rule, SuiteInput};

// ---------------------------------------------------------------------------
// SuiteKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuiteKind {
    Release,
    Consistency,
    EdgeCases,
    Schema,
}

impl SuiteKind {
    /// Every suite, in the order `all` runs them.
    pub const ALL: [SuiteKind; 4] = [
        SuiteKind::Release,
        SuiteKind::Consistency,
        SuiteKind::EdgeCases,
        SuiteKind::Schema,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SuiteKind::Release => "release",
            SuiteKind::Consistency => "consistency",
            SuiteKind::EdgeCases => "edge-cases",
            SuiteKind::Schema => "schema",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SuiteKind::Release => "GitHub Actions Release Workflow Test Suite",
            SuiteKind::Consistency => "GitHub Actions Workflow Consistency Test Suite",
            SuiteKind::EdgeCases => "GitHub Actions Workflow Edge Case Test Suite",
            SuiteKind::Schema => "GitHub Actions Workflow Schema Validation Suite",
        }
    }

    /// Whether the suite reads the CI workflow as well as the release one.
    pub fn needs_ci(self) -> bool {
        !matches!(self, SuiteKind::Release)
    }

    /// Rules in the order they run.
    pub fn rules(self) -> Vec<Box<dyn Rule>> {
        match self {
            SuiteKind::Release => vec![
                Box::new(DocumentShapeRule),
                Box::new(TopLevelKeysRule),
                Box::new(ReleaseTriggersRule),
                Box::new(PinnedEnvRule),
                Box::new(ReadOnlyJobRule),
                Box::new(BuildStepsRule),
                Box::new(PublishingJobRule),
                Box::new(PublishStepsRule),
                Box::new(LeastPrivilegeRule),
                Box::new(JobIsolationRule),
                Box::new(ActionPinningRule),
                Box::new(SecretInterpolationRule),
            ],
            SuiteKind::Consistency => vec![
                Box::new(PermissionsDeclaredRule),
                Box::new(ConsistentRunnerRule),
                Box::new(ConsistentEnvRule),
                Box::new(ActionVersionDriftRule),
                Box::new(SetupPatternsRule),
                Box::new(CrossLeastPrivilegeRule),
                Box::new(HardcodedSecretKeysRule),
                Box::new(ConcurrencyControlRule),
                Box::new(ReadOnlyJobPermissionsRule),
            ],
            SuiteKind::EdgeCases => vec![
                Box::new(NoSudoRule),
                Box::new(CurlPipeRule),
                Box::new(WildcardBranchRule),
                Box::new(SecretEchoRule),
                Box::new(HardcodedTokenRule),
                Box::new(EnvNamingRule),
            ],
            SuiteKind::Schema => vec![
                Box::new(TriggerEventsRule),
                Box::new(RunnerLabelsRule),
                Box::new(PermissionLevelsRule),
                Box::new(StepIdsUniqueRule),
                Box::new(NeedsReferencesRule),
            ],
        }
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SuiteKind {
    type Err = WfcheckError;

    fn from_str(s: &str) -> Result<Self> {
        SuiteKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| WfcheckError::Other(format!("unknown suite '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Where the two workflow files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowPaths {
    pub ci: PathBuf,
    pub release: PathBuf,
}

impl Default for WorkflowPaths {
    fn default() -> Self {
        Self {
            ci: PathBuf::from(".github/workflows/ci.yml"),
            release: PathBuf::from(".github/workflows/release.yml"),
        }
    }
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

/// Outcome of one suite: the recorder with every check, or the load error
/// that stopped the suite before any rule ran.
#[derive(Debug)]
pub struct SuiteRun {
    pub kind: SuiteKind,
    pub recorder: Recorder,
    pub error: Option<WfcheckError>,
}

impl SuiteRun {
    pub fn exit_code(&self) -> i32 {
        if self.error.is_some() {
            1
        } else {
            self.recorder.summary().exit_code()
        }
    }

    pub fn summary(&self) -> RunSummary {
        self.recorder.summary()
    }

    pub fn report(&self) -> SuiteReport {
        SuiteReport {
            suite: self.kind,
            generated_at: Utc::now(),
            summary: self.summary(),
            results: self.recorder.results().to_vec(),
            warnings: self.recorder.warnings().to_vec(),
            error: self.error.as_ref().map(ErrorReport::from),
        }
    }
}

/// Serializable form of a [`SuiteRun`].
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: SuiteKind,
    pub generated_at: DateTime<Utc>,
    pub summary: RunSummary,
    pub results: Vec<CheckResult>,
    pub warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
}

impl From<&WfcheckError> for ErrorReport {
    fn from(err: &WfcheckError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// The `ERROR:` line printed when a suite cannot start.
pub fn describe_error(err: &WfcheckError) -> String {
    match err {
        WfcheckError::NotFound { path } => format!("ERROR: Could not find {}", path.display()),
        WfcheckError::Parse { .. } => format!("ERROR: Failed to parse YAML: {err}"),
        other => format!("ERROR: Unexpected error: {other}"),
    }
}

/// Load the documents a suite needs and run it.
///
/// The CI workflow is loaded first when the suite needs it, then the release
/// workflow. Load failures are reported on the recorder's stream and yield a
/// run with no results.
pub fn run(
    kind: SuiteKind,
    paths: &WorkflowPaths,
    expectations: &Expectations,
    rec: Recorder,
) -> SuiteRun {
    tracing::info!(suite = %kind, "suite started");
    rec.banner(kind.title());

    let loaded = load_documents(kind, paths);
    match loaded {
        Ok((release, ci)) => finish(kind, &release, ci.as_ref(), expectations, rec),
        Err(err) => fail(kind, err, rec),
    }
}

fn load_documents(
    kind: SuiteKind,
    paths: &WorkflowPaths,
) -> Result<(WorkflowDocument, Option<WorkflowDocument>)> {
    let ci = if kind.needs_ci() {
        Some(wfcheck_yaml::load(&paths.ci)?)
    } else {
        None
    };
    let release = wfcheck_yaml::load(&paths.release)?;
    Ok((release, ci))
}

/// Run a suite against documents already in memory.
pub fn run_documents(
    kind: SuiteKind,
    release: &WorkflowDocument,
    ci: Option<&WorkflowDocument>,
    expectations: &Expectations,
    rec: Recorder,
) -> SuiteRun {
    tracing::info!(suite = %kind, "suite started");
    rec.banner(kind.title());
    if kind.needs_ci() && ci.is_none() {
        let err = WfcheckError::Other(format!("the {kind} suite needs the CI workflow"));
        return fail(kind, err, rec);
    }
    finish(kind, release, ci, expectations, rec)
}

fn fail(kind: SuiteKind, err: WfcheckError, rec: Recorder) -> SuiteRun {
    tracing::warn!(suite = %kind, error = %err, "suite aborted");
    rec.note(&describe_error(&err));
    SuiteRun {
        kind,
        recorder: rec,
        error: Some(err),
    }
}

fn finish(
    kind: SuiteKind,
    release: &WorkflowDocument,
    ci: Option<&WorkflowDocument>,
    expectations: &Expectations,
    mut rec: Recorder,
) -> SuiteRun {
    let input = SuiteInput {
        release,
        ci,
        expectations,
    };
    apply_rules(&kind.rules(), &input, &mut rec);
    let exit_code = rec.print_summary();
    let summary = rec.summary();
    tracing::info!(
        suite = %kind,
        passed = summary.passed,
        failed = summary.failed,
        warnings = summary.warnings,
        exit_code,
        "suite finished"
    );
    SuiteRun {
        kind,
        recorder: rec,
        error: None,
    }
}

/// Apply rules in order, each under its own section header.
pub fn apply_rules(rules: &[Box<dyn Rule>], input: &SuiteInput<'_>, rec: &mut Recorder) {
    for rule in rules {
        tracing::debug!(rule = rule.name(), "applying rule");
        rec.section(&format!("Testing {}", rule.title()));
        rule.apply(input, rec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::fixtures;

    #[test]
    fn suite_names_round_trip_through_from_str() {
        for kind in SuiteKind::ALL {
            assert_eq!(kind.name().parse::<SuiteKind>().unwrap(), kind);
        }
        assert!("documentation".parse::<SuiteKind>().is_err());
    }

    #[test]
    fn only_release_suite_runs_without_ci() {
        assert!(!SuiteKind::Release.needs_ci());
        assert!(SuiteKind::Consistency.needs_ci());
        assert!(SuiteKind::EdgeCases.needs_ci());
        assert!(SuiteKind::Schema.needs_ci());
    }

    #[test]
    fn rule_names_are_unique_across_suites() {
        let mut names: Vec<String> = SuiteKind::ALL
            .iter()
            .flat_map(|kind| kind.rules())
            .map(|rule| rule.name().to_string())
            .collect();
        let count = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), count);
    }

    #[test]
    fn fixtures_pass_every_suite() {
        let release = fixtures::doc(fixtures::RELEASE);
        let ci = fixtures::doc(fixtures::CI);
        let exp = Expectations::default();
        for kind in SuiteKind::ALL {
            let run = run_documents(kind, &release, Some(&ci), &exp, Recorder::quiet());
            let failures: Vec<&str> = run.recorder.failures().map(|r| r.name.as_str()).collect();
            assert!(failures.is_empty(), "{kind}: {failures:?}");
            assert_eq!(run.exit_code(), 0);
            assert!(run.summary().total > 0);
        }
    }

    #[test]
    fn missing_ci_document_is_an_error() {
        let release = fixtures::doc(fixtures::RELEASE);
        let exp = Expectations::default();
        let run = run_documents(SuiteKind::Schema, &release, None, &exp, Recorder::quiet());
        assert_eq!(run.exit_code(), 1);
        assert!(run.recorder.results().is_empty());
        assert!(matches!(run.error, Some(WfcheckError::Other(_))));
    }

    #[test]
    fn describe_error_distinguishes_classes() {
        let missing = WfcheckError::NotFound {
            path: PathBuf::from(".github/workflows/release.yml"),
        };
        assert_eq!(
            describe_error(&missing),
            "ERROR: Could not find .github/workflows/release.yml"
        );
        let parse = WfcheckError::Parse {
            path: PathBuf::from("ci.yml"),
            line: 2,
            col: 3,
            message: "bad".into(),
        };
        assert!(describe_error(&parse).starts_with("ERROR: Failed to parse YAML:"));
        let other = WfcheckError::Other("boom".into());
        assert_eq!(describe_error(&other), "ERROR: Unexpected error: boom");
    }

    #[test]
    fn report_carries_error_kind() {
        let run = SuiteRun {
            kind: SuiteKind::Release,
            recorder: Recorder::quiet(),
            error: Some(WfcheckError::NotFound {
                path: PathBuf::from("release.yml"),
            }),
        };
        let report = run.report();
        assert_eq!(report.error.as_ref().map(|e| e.kind), Some("not_found"));
        assert_eq!(report.summary.total, 0);
    }
}
