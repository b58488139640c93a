//! Step shape: build and publish sequences, action pinning and step ids.

use std::collections::HashSet;

use wfcheck_yaml::{run_commands, steps, Key, Value, ValueKind};

use super::{Rule, SuiteInput};
use crate::expectations::ArtifactExpectation;
use crate::recorder::Recorder;

/// Action reference without its `@version` suffix.
pub fn action_name(action: &str) -> &str {
    action.split_once('@').map_or(action, |(name, _)| name)
}

/// The version pinned after `@`, if any.
pub fn pin_of(action: &str) -> Option<&str> {
    action.split('@').nth(1)
}

/// Whether a pin names a moving ref rather than a release.
pub fn is_floating(pin: &str, aliases: &[String]) -> bool {
    aliases.iter().any(|alias| alias == pin)
}

fn uses_action<'a>(steps: &'a [Value], action: &str) -> Option<&'a Value> {
    steps
        .iter()
        .find(|step| step.get_str("uses").is_some_and(|uses| uses.contains(action)))
}

/// Records the artifact step checks and whether the step was found.
fn check_artifact_step(
    rec: &mut Recorder,
    steps: &[Value],
    action: &str,
    step_name: &str,
    artifact: &ArtifactExpectation,
    verb: &str,
) -> bool {
    let Some(step) = uses_action(steps, action) else { return false };
    rec.equal(
        step.get("name"),
        step_name,
        format!("Artifact {verb} step has descriptive name"),
    );
    rec.check(
        step.contains_key("with"),
        format!("Artifact {verb} has 'with' configuration"),
    );
    if let Some(with) = step.get("with") {
        rec.equal(
            with.get("name"),
            artifact.name.as_str(),
            format!("Artifact {verb} name is '{}'", artifact.name),
        );
        rec.equal(
            with.get("path"),
            artifact.path.as_str(),
            format!("Artifact {verb} path is '{}'", artifact.path),
        );
    }
    true
}

/// Checkout, tool setup, build commands and artifact upload in the read-only job.
pub struct BuildStepsRule;
impl Rule for BuildStepsRule {
    fn name(&self) -> &str { "build_steps" }
    fn title(&self) -> &str { "Build Job Steps" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let exp = input.expectations;
        let name = &exp.read_only_job;
        // A missing job is reported by the job rules.
        let Some(job) = input.release.job(name) else { return };
        if !rec.kind_of(
            job.get("steps"),
            ValueKind::Sequence,
            format!("Job '{name}' steps is a list"),
        ) {
            return;
        }
        let steps = steps(job);

        rec.check(
            steps.len() >= exp.min_build_steps,
            format!(
                "Job '{name}' has at least {} steps (found {})",
                exp.min_build_steps,
                steps.len()
            ),
        );
        rec.equal(
            steps.first().and_then(|step| step.get("uses")),
            exp.checkout_action.as_str(),
            format!("First step uses {}", exp.checkout_action),
        );

        let setup = &exp.setup;
        let setup_name = action_name(&setup.action);
        let setup_step = uses_action(steps, setup_name);
        if let Some(step) = setup_step {
            rec.equal(
                step.get("uses"),
                setup.action.as_str(),
                format!("Setup step uses {}", setup.action),
            );
            rec.check(
                step.contains_key("with"),
                "Setup step has 'with' configuration",
            );
            if let Some(with) = step.get("with") {
                rec.equal(
                    with.get(&setup.option),
                    setup.value.clone(),
                    format!(
                        "Setup '{}' is set to '{}'",
                        setup.option,
                        setup.value.to_plain_string()
                    ),
                );
            }
        }
        rec.check(
            setup_step.is_some(),
            format!("Job '{name}' contains {setup_name} step"),
        );

        let commands = Value::from(run_commands(job));
        for command in &exp.build_commands {
            rec.contains(
                command.as_str(),
                Some(&commands),
                format!("Job '{name}' runs '{command}'"),
            );
        }

        let artifact = &exp.artifact;
        let uploaded = check_artifact_step(
            rec,
            steps,
            &artifact.upload_action,
            &artifact.upload_step,
            artifact,
            "upload",
        );
        rec.check(uploaded, format!("Job '{name}' uploads artifacts"));
    }
}

/// Artifact download and the publish command in the publishing job.
pub struct PublishStepsRule;
impl Rule for PublishStepsRule {
    fn name(&self) -> &str { "publish_steps" }
    fn title(&self) -> &str { "Publish Job Steps" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let exp = input.expectations;
        let name = &exp.publishing_job;
        let Some(job) = input.release.job(name) else { return };
        if !rec.kind_of(
            job.get("steps"),
            ValueKind::Sequence,
            format!("Job '{name}' steps is a list"),
        ) {
            return;
        }
        let steps = steps(job);

        rec.check(
            steps.len() >= exp.min_publish_steps,
            format!(
                "Job '{name}' has at least {} steps (found {})",
                exp.min_publish_steps,
                steps.len()
            ),
        );

        let artifact = &exp.artifact;
        let downloaded = check_artifact_step(
            rec,
            steps,
            &artifact.download_action,
            &artifact.download_step,
            artifact,
            "download",
        );
        rec.check(downloaded, format!("Job '{name}' downloads artifacts"));

        let publish = &exp.publish;
        let publish_step = steps.iter().find(|step| {
            step.get_str("run")
                .is_some_and(|run| run.contains(&publish.marker))
        });
        if let Some(step) = publish_step {
            rec.equal(
                step.get("name"),
                publish.step_name.as_str(),
                "Publish step has descriptive name",
            );
            rec.check(
                step.get_str("run")
                    .is_some_and(|run| run.contains(&publish.command)),
                format!("Publish command uses '{}'", publish.command),
            );
            rec.check(
                step.contains_key("env"),
                "Publish step has environment variables",
            );
            if let Some(env) = step.get("env") {
                rec.contains(
                    publish.secret.as_str(),
                    Some(env),
                    format!("Publish step uses {} secret", publish.secret),
                );
            }
        }
        rec.check(
            publish_step.is_some(),
            format!("Job '{name}' runs '{}'", publish.marker),
        );
    }
}

/// Every action reference carries a version that is not a moving alias.
pub struct ActionPinningRule;
impl Rule for ActionPinningRule {
    fn name(&self) -> &str { "action_pinning" }
    fn title(&self) -> &str { "Action Version Pinning" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let aliases = &input.expectations.floating_aliases;
        for (job_name, job) in input.release.jobs() {
            for (i, step) in steps(job).iter().enumerate() {
                let Some(action) = step.get_str("uses") else { continue };
                rec.check(
                    action.contains('@'),
                    format!(
                        "Job '{job_name}' step {} action '{action}' is pinned with @version",
                        i + 1
                    ),
                );
                if let Some(pin) = pin_of(action) {
                    rec.check_not(
                        is_floating(pin, aliases),
                        format!(
                            "Job '{job_name}' action '{action}' uses specific version (not {})",
                            aliases.join(", ")
                        ),
                    );
                }
            }
        }
    }
}

/// Declared step ids are unique within each job.
pub struct StepIdsUniqueRule;
impl Rule for StepIdsUniqueRule {
    fn name(&self) -> &str { "unique_step_ids" }
    fn title(&self) -> &str { "Unique Step IDs" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        for (label, doc) in input.labeled() {
            for (job_name, job) in doc.jobs() {
                let mut seen = HashSet::new();
                for step in steps(job) {
                    let Some(id) = step.get("id") else { continue };
                    // Typed keys: integer 1 and string '1' are different ids.
                    let key = Key::from_value(id).unwrap_or_else(|| Key::Other(id.to_string()));
                    rec.check(
                        seen.insert(key),
                        format!(
                            "{label} job '{job_name}' step ID '{}' unique",
                            id.to_plain_string()
                        ),
                    );
                }
            }
        }
    }
}
