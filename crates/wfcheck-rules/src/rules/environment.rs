//! Top-level environment variables.

use super::{Rule, SuiteInput};
use crate::recorder::Recorder;

/// Expected env values on the release workflow.
pub struct PinnedEnvRule;
impl Rule for PinnedEnvRule {
    fn name(&self) -> &str { "environment" }
    fn title(&self) -> &str { "Environment Variables" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let env = input.release.env();
        for (key, expected) in &input.expectations.env {
            rec.equal(
                env.and_then(|e| e.get(key)),
                expected.clone(),
                format!(
                    "{key} environment variable is set to {}",
                    expected.to_plain_string()
                ),
            );
        }
    }
}

/// Expected env values hold in every loaded workflow.
pub struct ConsistentEnvRule;
impl Rule for ConsistentEnvRule {
    fn name(&self) -> &str { "consistent_environment" }
    fn title(&self) -> &str { "Consistent Environment Variables" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        for (label, doc) in input.labeled() {
            let env = doc.env();
            for (key, expected) in &input.expectations.env {
                rec.equal(
                    env.and_then(|e| e.get(key)),
                    expected.clone(),
                    format!(
                        "{label} workflow sets {key} to {}",
                        expected.to_plain_string()
                    ),
                );
            }
        }
    }
}

/// Top-level env names are UPPER_CASE.
pub struct EnvNamingRule;
impl Rule for EnvNamingRule {
    fn name(&self) -> &str { "env_naming" }
    fn title(&self) -> &str { "Environment Variable Naming" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        for (label, doc) in input.labeled() {
            let Some(env) = doc.env() else { continue };
            for key in env.keys() {
                let key = key.to_string();
                rec.check(
                    is_upper_case_name(&key),
                    format!("{label} env var '{key}' is UPPER_CASE"),
                );
            }
        }
    }
}

/// At least one letter and no lowercase letters. Digits and `_` are allowed.
pub fn is_upper_case_name(name: &str) -> bool {
    name.chars().any(char::is_alphabetic) && !name.chars().any(char::is_lowercase)
}
