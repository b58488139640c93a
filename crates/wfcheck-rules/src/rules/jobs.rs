//! Job shape: runners, permissions and dependencies.

use wfcheck_yaml::{Value, ValueKind};

use super::{one_or_many, Rule, SuiteInput};
use crate::recorder::Recorder;

/// The read-only job runs on the expected runner with `contents: read`.
pub struct ReadOnlyJobRule;
impl Rule for ReadOnlyJobRule {
    fn name(&self) -> &str { "read_only_job" }
    fn title(&self) -> &str { "Read-Only Job Configuration" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let exp = input.expectations;
        let name = &exp.read_only_job;
        let job = input.release.job(name);
        rec.check(job.is_some(), format!("Workflow has '{name}' job"));
        let Some(job) = job else { return };

        rec.equal(
            job.get("runs-on"),
            exp.runner.as_str(),
            format!("Job '{name}' runs on {}", exp.runner),
        );
        rec.check(
            job.contains_key("permissions"),
            format!("Job '{name}' has permissions defined"),
        );
        if let Some(perms) = job.get("permissions") {
            rec.kind_of(
                Some(perms),
                ValueKind::Mapping,
                format!("Job '{name}' permissions is a mapping"),
            );
            rec.equal(
                perms.get("contents"),
                "read",
                format!("Job '{name}' has 'contents: read' permission"),
            );
        }
        rec.check(
            job.contains_key("steps"),
            format!("Job '{name}' has steps defined"),
        );
    }
}

/// The publishing job depends on the read-only job and holds its write scopes.
pub struct PublishingJobRule;
impl Rule for PublishingJobRule {
    fn name(&self) -> &str { "publishing_job" }
    fn title(&self) -> &str { "Publishing Job Configuration" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let exp = input.expectations;
        let name = &exp.publishing_job;
        let upstream = exp.read_only_job.as_str();
        let job = input.release.job(name);
        rec.check(job.is_some(), format!("Workflow has '{name}' job"));
        let Some(job) = job else { return };

        rec.equal(
            job.get("runs-on"),
            exp.runner.as_str(),
            format!("Job '{name}' runs on {}", exp.runner),
        );
        rec.check(
            job.contains_key("needs"),
            format!("Job '{name}' has 'needs' dependency"),
        );
        if let Some(needs) = job.get("needs") {
            let check_name = format!("Job '{name}' depends on '{upstream}' job");
            match needs {
                Value::String(_) => {
                    rec.equal(Some(needs), upstream, check_name);
                }
                Value::Sequence(_) => {
                    rec.contains(upstream, Some(needs), check_name);
                }
                _ => {
                    rec.check(false, check_name);
                }
            }
        }

        rec.check(
            job.contains_key("permissions"),
            format!("Job '{name}' has permissions defined"),
        );
        if let Some(perms) = job.get("permissions") {
            rec.kind_of(
                Some(perms),
                ValueKind::Mapping,
                format!("Job '{name}' permissions is a mapping"),
            );
            for (scope, level) in &exp.publish_permissions {
                rec.equal(
                    perms.get(scope),
                    level.as_str(),
                    format!("Job '{name}' has '{scope}: {level}' permission"),
                );
            }
        }
    }
}

/// Read-only job never writes; publishing job holds exactly what it needs.
pub struct LeastPrivilegeRule;
impl Rule for LeastPrivilegeRule {
    fn name(&self) -> &str { "least_privilege" }
    fn title(&self) -> &str { "Security: Principle of Least Privilege" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let exp = input.expectations;
        let read_only = &exp.read_only_job;
        if let Some(perms) = input
            .release
            .job(read_only)
            .and_then(|job| job.get("permissions"))
        {
            let contents = contents_level(perms);
            rec.check(
                contents.contains("read"),
                format!("Job '{read_only}' has minimal 'read' permissions"),
            );
            rec.check_not(
                contents.contains("write"),
                format!("Job '{read_only}' does not have 'write' permissions"),
            );
        }

        let publishing = &exp.publishing_job;
        if let Some(perms) = input
            .release
            .job(publishing)
            .and_then(|job| job.get("permissions"))
        {
            for (scope, level) in &exp.publish_permissions {
                rec.equal(
                    perms.get(scope),
                    level.as_str(),
                    format!("Job '{publishing}' has '{level}' permissions for {scope}"),
                );
            }
        }
    }
}

/// The `contents` level as text, empty when absent.
pub(crate) fn contents_level(perms: &Value) -> String {
    perms
        .get("contents")
        .map(Value::to_plain_string)
        .unwrap_or_default()
}

/// The read-only job runs first; the publishing job waits on something.
pub struct JobIsolationRule;
impl Rule for JobIsolationRule {
    fn name(&self) -> &str { "job_dependencies" }
    fn title(&self) -> &str { "Job Dependencies and Isolation" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let exp = input.expectations;
        let has_needs = |name: &str| {
            input
                .release
                .job(name)
                .is_some_and(|job| job.contains_key("needs"))
        };
        rec.check_not(
            has_needs(&exp.read_only_job),
            format!(
                "Job '{}' does not depend on other jobs (runs first)",
                exp.read_only_job
            ),
        );
        rec.check(
            has_needs(&exp.publishing_job),
            format!("Job '{}' has dependencies", exp.publishing_job),
        );
    }
}

/// String `runs-on` labels come from the allowed set.
pub struct RunnerLabelsRule;
impl Rule for RunnerLabelsRule {
    fn name(&self) -> &str { "valid_runner_labels" }
    fn title(&self) -> &str { "Valid Runner Labels" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let allowed = Value::from(input.expectations.allowed_runners.clone());
        for (label, doc) in input.labeled() {
            for (job_name, job) in doc.jobs() {
                if let Some(runs_on) = job.get_str("runs-on") {
                    rec.contains(
                        runs_on,
                        Some(&allowed),
                        format!("{label} job '{job_name}' uses valid runner"),
                    );
                }
            }
        }
    }
}

/// Every permission level is one of the known levels.
pub struct PermissionLevelsRule;
impl Rule for PermissionLevelsRule {
    fn name(&self) -> &str { "valid_permission_levels" }
    fn title(&self) -> &str { "Valid Permission Levels" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let levels = Value::from(input.expectations.permission_levels.clone());
        for (label, doc) in input.labeled() {
            for (job_name, job) in doc.jobs() {
                let Some(perms) = job.get("permissions") else { continue };
                let Some(map) = perms.as_mapping() else {
                    rec.kind_of(
                        Some(perms),
                        ValueKind::Mapping,
                        format!("{label} job '{job_name}' permissions is a mapping"),
                    );
                    continue;
                };
                for (scope, level) in map.iter() {
                    rec.contains(
                        level.clone(),
                        Some(&levels),
                        format!("{label} job '{job_name}' permission '{scope}' level valid"),
                    );
                }
            }
        }
    }
}

/// Every `needs` entry names a job in the same workflow.
pub struct NeedsReferencesRule;
impl Rule for NeedsReferencesRule {
    fn name(&self) -> &str { "needs_references" }
    fn title(&self) -> &str { "Valid Needs References" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        for (label, doc) in input.labeled() {
            let job_names = Value::from(doc.job_names());
            for (job_name, job) in doc.jobs() {
                let Some(needs) = job.get("needs") else { continue };
                let check_name = format!("{label} job '{job_name}' needs valid job");
                match one_or_many(needs) {
                    Some(needed) => {
                        for item in needed {
                            rec.contains(item.clone(), Some(&job_names), check_name.as_str());
                        }
                    }
                    None => {
                        rec.check(false, check_name);
                    }
                }
            }
        }
    }
}
