//! Trigger configuration.

use wfcheck_yaml::{Value, ValueKind};

use super::{Rule, SuiteInput};
use crate::recorder::Recorder;

/// Release, tag push and manual dispatch triggers on the release workflow.
pub struct ReleaseTriggersRule;
impl Rule for ReleaseTriggersRule {
    fn name(&self) -> &str { "triggers" }
    fn title(&self) -> &str { "Workflow Triggers" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let exp = input.expectations;
        let triggers = input.release.triggers();
        if !rec.kind_of(
            triggers,
            ValueKind::Mapping,
            "Workflow trigger configuration is a mapping",
        ) {
            return;
        }
        let Some(triggers) = triggers else { return };

        rec.check(
            triggers.contains_key("release"),
            "Workflow triggers on 'release' events",
        );
        if let Some(release) = triggers.get("release") {
            rec.equal(
                release.get("types"),
                exp.release_types.clone(),
                format!(
                    "Release trigger types include '{}'",
                    exp.release_types.join("', '")
                ),
            );
        }

        rec.check(
            triggers.contains_key("push"),
            "Workflow triggers on 'push' events",
        );
        if let Some(push) = triggers.get("push") {
            rec.check(push.contains_key("tags"), "Push trigger has tags filter");
            rec.contains(
                exp.tag_pattern.as_str(),
                push.get("tags"),
                format!("Tags filter includes semver pattern '{}'", exp.tag_pattern),
            );
        }

        rec.check(
            triggers.contains_key("workflow_dispatch"),
            "Workflow has manual trigger (workflow_dispatch)",
        );
    }
}

/// `push.branches` never matches every branch.
pub struct WildcardBranchRule;
impl Rule for WildcardBranchRule {
    fn name(&self) -> &str { "no_wildcard_branches" }
    fn title(&self) -> &str { "No Wildcard Branch Triggers" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        for (label, doc) in input.labeled() {
            let Some(branches) = doc
                .triggers()
                .and_then(|t| t.get("push"))
                .and_then(|push| push.get("branches"))
            else {
                continue;
            };
            let branches: Vec<&Value> = match branches {
                Value::Sequence(items) => items.iter().collect(),
                other => vec![other],
            };
            for branch in branches {
                rec.check_not(
                    matches!(branch.as_str(), Some("*" | "**")),
                    format!("{label} no wildcard branch triggers"),
                );
            }
        }
    }
}

/// Every trigger event is one the CI provider knows.
pub struct TriggerEventsRule;
impl Rule for TriggerEventsRule {
    fn name(&self) -> &str { "valid_trigger_events" }
    fn title(&self) -> &str { "Valid Trigger Events" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let valid = Value::from(input.expectations.valid_events.clone());
        for (label, doc) in input.labeled() {
            for event in trigger_events(doc.triggers()) {
                rec.contains(
                    event.as_str(),
                    Some(&valid),
                    format!("{label} uses valid event '{event}'"),
                );
            }
        }
    }
}

/// Event names from any of the three trigger spellings:
/// `on: push`, `on: [push, release]` or a mapping keyed by event.
pub fn trigger_events(triggers: Option<&Value>) -> Vec<String> {
    match triggers {
        Some(Value::Mapping(map)) => map.keys().map(|k| k.to_string()).collect(),
        Some(Value::Sequence(items)) => items.iter().map(Value::to_plain_string).collect(),
        Some(Value::String(event)) => vec![event.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectations::Expectations;
    use crate::rules::fixtures;

    fn run(rule: &dyn Rule, release: &str, ci: Option<&str>) -> Recorder {
        let release = fixtures::doc(release);
        let ci = ci.map(fixtures::doc);
        let exp = Expectations::default();
        let input = SuiteInput {
            release: &release,
            ci: ci.as_ref(),
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
    fn release_triggers_pass_on_fixture() {
        let rec = run(&ReleaseTriggersRule, fixtures::RELEASE, None);
        assert_eq!(rec.summary().failed, 0);
        assert_eq!(rec.summary().total, 7);
    }

    #[test]
    fn boolean_trigger_key_gives_identical_outcomes() {
        let as_on = run(&ReleaseTriggersRule, fixtures::RELEASE, None);
        let source = fixtures::RELEASE.replace("\non:\n", "\ntrue:\n");
        let as_true = run(&ReleaseTriggersRule, &source, None);
        assert_eq!(as_on.results(), as_true.results());
    }

    #[test]
    fn non_mapping_triggers_stop_early() {
        let rec = run(&ReleaseTriggersRule, "name: Release\non: [push]\njobs: {}\n", None);
        assert_eq!(rec.summary().total, 1);
        assert_eq!(rec.summary().failed, 1);
    }

    #[test]
    fn empty_tag_list_fails_pattern_check() {
        let source = fixtures::RELEASE.replace("    tags:\n      - \"v*.*.*\"\n", "    tags: []\n");
        let rec = run(&ReleaseTriggersRule, &source, None);
        assert_eq!(
            failed_names(&rec),
            vec!["Tags filter includes semver pattern 'v*.*.*'"]
        );
    }

    #[test]
    fn release_without_types_fails() {
        let source = fixtures::RELEASE.replace("    types: [published]\n", "    types: [created]\n");
        let rec = run(&ReleaseTriggersRule, &source, None);
        assert_eq!(
            failed_names(&rec),
            vec!["Release trigger types include 'published'"]
        );
    }

    #[test]
    fn wildcard_branches_fail() {
        let ci = "name: CI\non:\n  push:\n    branches: ['**', main]\njobs: {}\n";
        let rec = run(&WildcardBranchRule, fixtures::RELEASE, Some(ci));
        assert_eq!(rec.summary().total, 2);
        assert_eq!(failed_names(&rec), vec!["CI no wildcard branch triggers"]);
    }

    #[test]
    fn trigger_events_from_every_shape() {
        assert_eq!(trigger_events(Some(&Value::from("push"))), vec!["push"]);
        assert_eq!(
            trigger_events(Some(&Value::from(vec!["push", "release"]))),
            vec!["push", "release"]
        );
        assert!(trigger_events(None).is_empty());
    }

    #[test]
    fn unknown_event_fails() {
        let ci = "name: CI\non:\n  push: {}\n  deployment_status: {}\njobs: {}\n";
        let rec = run(&TriggerEventsRule, fixtures::RELEASE, Some(ci));
        assert_eq!(
            failed_names(&rec),
            vec!["CI uses valid event 'deployment_status'"]
        );
        assert_eq!(rec.summary().passed, 4);
    }
}
