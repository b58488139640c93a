//! Structural validity of the release workflow.

use wfcheck_yaml::ValueKind;

use super::{Rule, SuiteInput};
use crate::recorder::Recorder;

const REQUIRED_KEYS: &[&str] = &["name", "jobs"];

/// Root is a non-empty mapping with the keys every workflow needs.
pub struct DocumentShapeRule;
impl Rule for DocumentShapeRule {
    fn name(&self) -> &str { "yaml_validity" }
    fn title(&self) -> &str { "YAML Validity" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let doc = input.release;
        rec.kind_of(
            Some(doc.root()),
            ValueKind::Mapping,
            "Workflow YAML parses to a mapping",
        );
        rec.check(!doc.root().is_empty(), "Workflow YAML is not empty");
        for key in REQUIRED_KEYS {
            rec.check(
                doc.contains_key(key),
                format!("Workflow has required key '{key}'"),
            );
        }
        rec.check(doc.has_triggers(), "Workflow has trigger configuration");
    }
}

/// Expected name plus the trigger, `jobs` and `env` sections.
pub struct TopLevelKeysRule;
impl Rule for TopLevelKeysRule {
    fn name(&self) -> &str { "structure" }
    fn title(&self) -> &str { "Workflow Structure" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let doc = input.release;
        let expected = &input.expectations.workflow_name;
        rec.equal(
            doc.name(),
            expected.as_str(),
            format!("Workflow name is '{expected}'"),
        );
        rec.check(doc.has_triggers(), "Workflow has trigger configuration");
        rec.check(doc.contains_key("jobs"), "Workflow has 'jobs' section");
        rec.check(doc.contains_key("env"), "Workflow has 'env' section");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectations::Expectations;
    use crate::rules::fixtures;

    fn run(rule: &dyn Rule, source: &str) -> Recorder {
        let doc = fixtures::doc(source);
        let exp = Expectations::default();
        let input = SuiteInput {
            release: &doc,
            ci: None,
            expectations: &exp,
        };
        let mut rec = Recorder::quiet();
        rule.apply(&input, &mut rec);
        rec
    }

    #[test]
    fn valid_release_passes_shape_checks() {
        let rec = run(&DocumentShapeRule, fixtures::RELEASE);
        assert_eq!(rec.summary().failed, 0);
        assert_eq!(rec.summary().total, 5);
    }

    #[test]
    fn scalar_document_fails_shape_checks() {
        let rec = run(&DocumentShapeRule, "just a string\n");
        let failed: Vec<&str> = rec.failures().map(|r| r.name.as_str()).collect();
        assert!(failed.contains(&"Workflow YAML parses to a mapping"));
        assert!(failed.contains(&"Workflow YAML is not empty"));
        assert!(failed.contains(&"Workflow has trigger configuration"));
    }

    #[test]
    fn boolean_trigger_key_counts_as_triggers() {
        let source = fixtures::RELEASE.replace("\non:\n", "\ntrue:\n");
        let rec = run(&TopLevelKeysRule, &source);
        assert_eq!(rec.summary().failed, 0);
    }

    #[test]
    fn wrong_name_and_missing_env_fail() {
        let rec = run(&TopLevelKeysRule, "name: Deploy\non: push\njobs: {}\n");
        let failed: Vec<&str> = rec.failures().map(|r| r.name.as_str()).collect();
        assert_eq!(
            failed,
            vec!["Workflow name is 'Release'", "Workflow has 'env' section"]
        );
    }
}
