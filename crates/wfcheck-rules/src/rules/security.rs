//! Security hygiene: secret references, privilege escalation, remote scripts
//! and leaked credentials.

use regex::Regex;
use wfcheck_types::Result;
use wfcheck_yaml::steps;

use super::{Rule, SuiteInput};
use crate::recorder::Recorder;

const SUSPICIOUS_KEYS: &[&str] = &["password:", "token:", "api_key:", "secret:"];

const PIPE_TO_SHELL_PATTERNS: &[&str] = &[
    r"(?i)curl.*\|.*sh",
    r"(?i)curl.*\|.*bash",
    r"(?i)wget.*\|.*sh",
];

const TOKEN_PATTERNS: &[&str] = &[
    r"ghp_[a-zA-Z0-9]{36}",
    r"gho_[a-zA-Z0-9]{36}",
    r"npm_[a-zA-Z0-9]{36}",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

/// Whether a value is a `${{ ... }}` expression rather than literal text.
pub fn is_interpolated(value: &str) -> bool {
    value.contains("${{") && value.contains("}}")
}

/// Text for whole-document scans. A document that cannot be re-serialized
/// records a failed check, so the scan never passes on empty input.
fn scan_text(label: &str, text: Result<String>, rec: &mut Recorder) -> Option<String> {
    match text {
        Ok(text) => Some(text),
        Err(err) => {
            tracing::warn!(workflow = label, error = %err, "cannot scan workflow text");
            rec.check(false, format!("{label} workflow text can be scanned"));
            None
        }
    }
}

/// `(job name, run command)` for every step with a `run` in the document.
fn run_steps<'a>(doc: &'a wfcheck_yaml::WorkflowDocument) -> Vec<(String, &'a str)> {
    doc.jobs()
        .into_iter()
        .flat_map(|(job_name, job)| {
            steps(job)
                .iter()
                .filter_map(|step| step.get_str("run"))
                .map(move |run| (job_name.clone(), run))
        })
        .collect()
}

/// Step env values that mention secrets use expression syntax.
pub struct SecretInterpolationRule;
impl Rule for SecretInterpolationRule {
    fn name(&self) -> &str { "secret_handling" }
    fn title(&self) -> &str { "Secret Handling" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        for (job_name, job) in input.release.jobs() {
            for step in steps(job) {
                let Some(env) = step.get("env").and_then(|e| e.as_mapping()) else {
                    continue;
                };
                for (_, value) in env.iter() {
                    let Some(text) = value.as_str() else { continue };
                    if text.contains("secrets.") {
                        rec.check(
                            is_interpolated(text),
                            format!("Job '{job_name}' properly references secret with ${{{{ }}}}"),
                        );
                    }
                }
            }
        }
    }
}

/// Secret-looking keys only appear alongside secret references.
pub struct HardcodedSecretKeysRule;
impl Rule for HardcodedSecretKeysRule {
    fn name(&self) -> &str { "no_hardcoded_secrets" }
    fn title(&self) -> &str { "No Hardcoded Secrets" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        for (label, doc) in input.labeled() {
            let Some(text) = scan_text(label, doc.to_yaml_string(), rec) else {
                continue;
            };
            let lowered = text.to_lowercase();
            for pattern in SUSPICIOUS_KEYS {
                if lowered.contains(pattern) {
                    rec.check(
                        text.contains("secrets.") || text.contains("${{"),
                        format!("{label} workflow uses proper secret references for {pattern}"),
                    );
                }
            }
        }
    }
}

pub struct NoSudoRule;
impl Rule for NoSudoRule {
    fn name(&self) -> &str { "no_sudo" }
    fn title(&self) -> &str { "No Sudo Commands" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        for (label, doc) in input.labeled() {
            for (job_name, run) in run_steps(doc) {
                rec.check_not(
                    run.to_lowercase().contains("sudo"),
                    format!("{label} job '{job_name}' does not use sudo"),
                );
            }
        }
    }
}

/// No remote script is piped straight into a shell.
pub struct CurlPipeRule;
impl Rule for CurlPipeRule {
    fn name(&self) -> &str { "no_curl_pipe_to_shell" }
    fn title(&self) -> &str { "No Curl Pipe to Shell" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let patterns = compile(PIPE_TO_SHELL_PATTERNS);
        for (label, doc) in input.labeled() {
            for (job_name, run) in run_steps(doc) {
                for pattern in &patterns {
                    rec.check_not(
                        pattern.is_match(run),
                        format!("{label} job '{job_name}' no curl pipe to shell"),
                    );
                }
            }
        }
    }
}

pub struct SecretEchoRule;
impl Rule for SecretEchoRule {
    fn name(&self) -> &str { "no_secret_echo" }
    fn title(&self) -> &str { "Secrets Not Logged" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        for (label, doc) in input.labeled() {
            for (job_name, run) in run_steps(doc) {
                let run = run.to_lowercase();
                rec.check_not(
                    run.contains("echo") && run.contains("secret"),
                    format!("{label} job '{job_name}' doesn't echo secrets"),
                );
            }
        }
    }
}

/// No literal GitHub or npm token anywhere in the document.
pub struct HardcodedTokenRule;
impl Rule for HardcodedTokenRule {
    fn name(&self) -> &str { "no_hardcoded_tokens" }
    fn title(&self) -> &str { "No Hardcoded Tokens" }
    fn apply(&self, input: &SuiteInput<'_>, rec: &mut Recorder) {
        let patterns = compile(TOKEN_PATTERNS);
        for (label, doc) in input.labeled() {
            let Some(text) = scan_text(label, doc.to_yaml_string(), rec) else {
                continue;
            };
            for pattern in &patterns {
                rec.check(
                    !pattern.is_match(&text),
                    format!("{label} no hardcoded tokens"),
                );
            }
        }
    }
}
