//! Cross-file consistency between the CI and release workflows.

use std::collections::{BTreeMap, BTreeSet};

use wfcheck_yaml::{action_refs, Value, WorkflowDocument};

use super::jobs::contents_level;
use super::steps::{action_name, pin_of};
use super::{Rule, SuiteInput};
use crate::recorder::Recorder;

/// Every job declares its permissions explicitly.
pub struct PermissionsDeclaredRule;
impl Rule for PermissionsDeclaredRule {
    fn name(&self) -> &str { "permissions_declared" }
    fn title(&self) -> &str { "Consistent Permissions Usage" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        for (label, doc) in input.labeled() {
            for (job_name, job) in doc.jobs() {
                rec.check(
                    job.contains_key("permissions"),
                    format!("{label} workflow job '{job_name}' has permissions defined"),
                );
            }
        }
    }
}

pub struct ConsistentRunnerRule;
impl Rule for ConsistentRunnerRule {
    fn name(&self) -> &str { "consistent_runner" }
    fn title(&self) -> &str { "Consistent Runner OS" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let runner = input.expectations.runner.as_str();
        for (label, doc) in input.labeled() {
            for (job_name, job) in doc.jobs() {
                rec.equal(
                    job.get("runs-on"),
                    runner,
                    format!("{label} job '{job_name}' runs on {runner}"),
                );
            }
        }
    }
}

/// Versions each action is referenced with, keyed by action name.
/// A reference without `@` contributes `None`.
pub fn action_versions(doc: &WorkflowDocument) -> BTreeMap<String, BTreeSet<Option<String>>> {
    let mut versions: BTreeMap<String, BTreeSet<Option<String>>> = BTreeMap::new();
    for (_, job) in doc.jobs() {
        for action in action_refs(job) {
            versions
                .entry(action_name(action).to_owned())
                .or_default()
                .insert(pin_of(action).map(str::to_owned));
        }
    }
    versions
}

/// Shared actions use the same version in both files. Drift is advisory:
/// it produces a warning and still counts as a pass.
pub struct ActionVersionDriftRule;
impl Rule for ActionVersionDriftRule {
    fn name(&self) -> &str { "action_version_drift" }
    fn title(&self) -> &str { "Consistent Action Versions" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let Some(ci) = input.ci else { return };
        let ci_actions = action_versions(ci);
        let release_actions = action_versions(input.release);

        for (action, ci_versions) in &ci_actions {
            let Some(release_versions) = release_actions.get(action) else { continue };
            // Multiple versions inside one file are not compared.
            let (Some(ci_version), Some(release_version)) =
                (single(ci_versions), single(release_versions))
            else {
                continue;
            };
            if ci_version == release_version {
                rec.check(
                    true,
                    format!("Action '{action}' uses consistent version across workflows"),
                );
            } else {
                rec.warn(format!(
                    "Action '{action}' uses different versions: CI={}, Release={}",
                    display_pin(ci_version),
                    display_pin(release_version)
                ));
                rec.acknowledge(format!("Action '{action}' version drift is advisory"));
            }
        }
    }
}

fn single<T>(set: &BTreeSet<T>) -> Option<&T> {
    if set.len() == 1 {
        set.iter().next()
    } else {
        None
    }
}

fn display_pin(pin: &Option<String>) -> &str {
    pin.as_deref().unwrap_or("unpinned")
}

/// Both files check out the code and set up the toolchain.
pub struct SetupPatternsRule;
impl Rule for SetupPatternsRule {
    fn name(&self) -> &str { "setup_patterns" }
    fn title(&self) -> &str { "Consistent Setup Patterns" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let exp = input.expectations;
        let checkout = action_name(&exp.checkout_action);
        let setup = action_name(&exp.setup.action);
        let uses = |doc: &WorkflowDocument, action: &str| {
            doc.jobs()
                .iter()
                .any(|(_, job)| action_refs(job).iter().any(|r| r.contains(action)))
        };
        for (label, doc) in input.labeled() {
            rec.check(uses(doc, checkout), format!("{label} workflow checks out code"));
        }
        for (label, doc) in input.labeled() {
            rec.check(uses(doc, setup), format!("{label} workflow uses {setup}"));
        }
    }
}

/// `Some(holds)` when the job has `contents: read`, `None` when the check
/// does not apply. Only the publishing job may pair it with `packages: write`.
pub fn least_privilege_holds(job_name: &str, job: &Value, publishing_job: &str) -> Option<bool> {
    let perms = job.get("permissions")?;
    if perms.get_str("contents") != Some("read") {
        return None;
    }
    Some(perms.get_str("packages") != Some("write") || job_name == publishing_job)
}

pub struct CrossLeastPrivilegeRule;
impl Rule for CrossLeastPrivilegeRule {
    fn name(&self) -> &str { "cross_least_privilege" }
    fn title(&self) -> &str { "Least Privilege Principle Across Workflows" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let publishing = input.expectations.publishing_job.as_str();
        for (label, doc) in input.labeled() {
            for (job_name, job) in doc.jobs() {
                if let Some(holds) = least_privilege_holds(&job_name, job, publishing) {
                    rec.check(
                        holds,
                        format!(
                            "{label} job '{job_name}' with contents:read doesn't have unnecessary write permissions"
                        ),
                    );
                }
            }
        }
    }
}

/// The CI workflow cancels superseded runs.
pub struct ConcurrencyControlRule;
impl Rule for ConcurrencyControlRule {
    fn name(&self) -> &str { "concurrency_control" }
    fn title(&self) -> &str { "Concurrency Control" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let Some(ci) = input.ci else { return };
        rec.check(
            ci.contains_key("concurrency"),
            "CI workflow has concurrency control configured",
        );
        if let Some(concurrency) = ci.get("concurrency") {
            rec.check(
                concurrency.contains_key("group"),
                "CI workflow concurrency has group defined",
            );
            rec.check(
                concurrency.contains_key("cancel-in-progress"),
                "CI workflow concurrency has cancel-in-progress defined",
            );
        }
    }
}

/// The release read-only job declares `contents: read` and nothing more.
pub struct ReadOnlyJobPermissionsRule;
impl Rule for ReadOnlyJobPermissionsRule {
    fn name(&self) -> &str { "read_only_job_permissions" }
    fn title(&self) -> &str { "Read-Only Job Permissions" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let name = &input.expectations.read_only_job;
        let perms = input
            .release
            .job(name)
            .and_then(|job| job.get("permissions"));
        rec.check(
            perms.is_some(),
            format!("Release workflow job '{name}' has permissions defined"),
        );
        if let Some(perms) = perms {
            rec.equal(
                perms.get("contents"),
                "read",
                format!("Release workflow job '{name}' has 'contents: read' permission"),
            );
            rec.check_not(
                contents_level(perms).contains("write"),
                format!("Release workflow job '{name}' follows least privilege (no write)"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectations::Expectations;
    use crate::rules::fixtures;

    fn run(rule: &dyn Rule, release: &str, ci: &str) -> Recorder {
        let release = fixtures::doc(release);
        let ci = fixtures::doc(ci);
        let exp = Expectations::default();
        let input = SuiteInput {
            release: &release,
            ci: Some(&ci),
            expectations: &exp,
        };
        let mut rec = Recorder::quiet();
        rule.apply(&input, &mut rec);
        rec
    }

    fn failed_names(rec: &Recorder) -> Vec<String> {
        rec.failures().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn fixtures_are_consistent() {
        let rules: [&dyn Rule; 7] = [
            &PermissionsDeclaredRule,
            &ConsistentRunnerRule,
            &ActionVersionDriftRule,
            &SetupPatternsRule,
            &CrossLeastPrivilegeRule,
            &ConcurrencyControlRule,
            &ReadOnlyJobPermissionsRule,
        ];
        for rule in rules {
            let rec = run(rule, fixtures::RELEASE, fixtures::CI);
            assert_eq!(failed_names(&rec), Vec::<String>::new(), "{}", rule.name());
            assert!(rec.warnings().is_empty());
        }
    }

    #[test]
    fn drift_warns_and_counts_as_pass() {
        let ci = fixtures::CI.replace("oven-sh/setup-bun@v2", "oven-sh/setup-bun@v1");
        let rec = run(&ActionVersionDriftRule, fixtures::RELEASE, &ci);
        let summary = rec.summary();
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.failed, 0);
        // checkout is consistent, setup-bun drifted.
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.total, 2);
        assert!(rec.warnings()[0].message.contains("CI=v1, Release=v2"));
    }

    #[test]
    fn multiple_versions_in_one_file_are_skipped() {
        let ci = fixtures::CI.replace(
            "      - run: bun test\n",
            "      - run: bun test\n      - uses: oven-sh/setup-bun@v1\n",
        );
        let rec = run(&ActionVersionDriftRule, fixtures::RELEASE, &ci);
        assert_eq!(rec.summary().total, 1);
        assert!(rec.warnings().is_empty());
    }

    #[test]
    fn action_versions_collects_pins() {
        let doc = fixtures::doc(fixtures::RELEASE);
        let versions = action_versions(&doc);
        assert_eq!(
            versions.get("actions/checkout"),
            Some(&BTreeSet::from([Some("v5".to_string())]))
        );
        assert!(versions.contains_key("actions/upload-artifact"));
    }

    #[test]
    fn least_privilege_depends_on_job_name() {
        let job = fixtures::doc("permissions:\n  contents: read\n  packages: write\n");
        assert_eq!(least_privilege_holds("publish", job.root(), "publish"), Some(true));
        assert_eq!(least_privilege_holds("build", job.root(), "publish"), Some(false));

        let writer = fixtures::doc("permissions:\n  contents: write\n");
        assert_eq!(least_privilege_holds("build", writer.root(), "publish"), None);
        let bare = fixtures::doc("runs-on: ubuntu-latest\n");
        assert_eq!(least_privilege_holds("build", bare.root(), "publish"), None);
    }

    #[test]
    fn missing_concurrency_fails_once() {
        let ci = fixtures::CI.replace(
            "concurrency:\n  group: ci-${{ github.ref }}\n  cancel-in-progress: true\n",
            "",
        );
        let rec = run(&ConcurrencyControlRule, fixtures::RELEASE, &ci);
        assert_eq!(rec.summary().total, 1);
        assert_eq!(rec.summary().failed, 1);
    }

    #[test]
    fn missing_permissions_and_runner_drift_fail() {
        let ci = fixtures::CI
            .replace("    permissions:\n      contents: read\n", "")
            .replace("runs-on: ubuntu-latest", "runs-on: ubuntu-22.04");
        let rec = run(&PermissionsDeclaredRule, fixtures::RELEASE, &ci);
        assert_eq!(
            failed_names(&rec),
            vec!["CI workflow job 'test' has permissions defined"]
        );
        let rec = run(&ConsistentRunnerRule, fixtures::RELEASE, &ci);
        assert_eq!(
            failed_names(&rec),
            vec!["CI job 'test' runs on ubuntu-latest"]
        );
    }
}
