//! Assertion recorder: accumulates check outcomes and prints the transcript.

use wfcheck_types::{CheckResult, RunSummary, Warning};
use wfcheck_yaml::{Value, ValueKind};

const SEPARATOR_WIDTH: usize = 70;

/// Collects pass/fail outcomes and warnings for one suite run.
///
/// Every record call prints a line immediately when echo is enabled, so the
/// console shows progress while rules run. [`Recorder::quiet`] records the
/// same outcomes without printing.
#[derive(Debug)]
pub struct Recorder {
    results: Vec<CheckResult>,
    warnings: Vec<Warning>,
    echo: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            warnings: Vec::new(),
            echo: true,
        }
    }

    pub fn quiet() -> Self {
        Self {
            echo: false,
            ..Self::new()
        }
    }

    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    fn record(&mut self, name: String, passed: bool, detail: Option<String>) -> bool {
        tracing::debug!(check = %name, passed, "check recorded");
        if self.echo {
            if passed {
                println!("PASS: {name}");
            } else {
                println!("FAIL: {name}");
                if let Some(detail) = &detail {
                    for line in detail.lines() {
                        println!("  {line}");
                    }
                }
            }
        }
        self.results.push(if passed {
            CheckResult::pass(name)
        } else {
            CheckResult::fail(name, detail)
        });
        passed
    }

    /// Passes iff `actual` is present and deep-equal to `expected`.
    pub fn equal(
        &mut self,
        actual: Option<&Value>,
        expected: impl Into<Value>,
        name: impl Into<String>,
    ) -> bool {
        let expected = expected.into();
        let passed = actual == Some(&expected);
        let detail = (!passed).then(|| {
            format!(
                "Expected: {expected}\nActual: {}",
                actual.map_or_else(|| "None".to_string(), Value::to_string)
            )
        });
        self.record(name.into(), passed, detail)
    }

    /// Passes iff `item` is a key of a mapping container or an element of a
    /// sequence container. Missing and scalar containers fail.
    pub fn contains(
        &mut self,
        item: impl Into<Value>,
        container: Option<&Value>,
        name: impl Into<String>,
    ) -> bool {
        let item = item.into();
        let passed = container.is_some_and(|c| c.contains(&item));
        let detail = (!passed).then(|| {
            format!(
                "Expected {item} to be in {}",
                container.map_or_else(|| "None".to_string(), Value::to_string)
            )
        });
        self.record(name.into(), passed, detail)
    }

    pub fn check(&mut self, condition: bool, name: impl Into<String>) -> bool {
        let detail = (!condition).then(|| "Condition was false".to_string());
        self.record(name.into(), condition, detail)
    }

    pub fn check_not(&mut self, condition: bool, name: impl Into<String>) -> bool {
        let detail = condition.then(|| "Condition was true".to_string());
        self.record(name.into(), !condition, detail)
    }

    /// Passes iff `value` is present and has the expected runtime shape.
    pub fn kind_of(
        &mut self,
        value: Option<&Value>,
        kind: ValueKind,
        name: impl Into<String>,
    ) -> bool {
        let actual = value.map(Value::kind);
        let passed = actual == Some(kind);
        let detail = (!passed).then(|| {
            format!(
                "Expected type {kind}, got {}",
                actual.map_or_else(|| "nothing".to_string(), |k| k.to_string())
            )
        });
        self.record(name.into(), passed, detail)
    }

    /// Record a passing result without printing a PASS line.
    pub fn acknowledge(&mut self, name: impl Into<String>) {
        let name = name.into();
        tracing::debug!(check = %name, "check acknowledged");
        self.results.push(CheckResult::pass(name));
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "warning recorded");
        if self.echo {
            println!("WARN: {message}");
        }
        self.warnings.push(Warning { message });
    }

    /// Print a section header for the next group of checks.
    pub fn section(&self, title: &str) {
        if self.echo {
            println!("\n--- {title} ---");
        }
    }

    pub fn banner(&self, title: &str) {
        if self.echo {
            let rule = "=".repeat(SEPARATOR_WIDTH);
            println!("{rule}\n{title}\n{rule}");
        }
    }

    /// Print a free-form line (diagnostics from the driver).
    pub fn note(&self, line: &str) {
        if self.echo {
            println!("{line}");
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_results(&self.results, &self.warnings)
    }

    /// Format the end-of-run report.
    pub fn render_summary(&self) -> String {
        let summary = self.summary();
        let mut out = format!(
            "\n{}\nTEST SUMMARY: {}/{} checks passed\n",
            "=".repeat(SEPARATOR_WIDTH),
            summary.passed,
            summary.total
        );
        if !self.warnings.is_empty() {
            out.push_str(&format!("\n{} warnings:\n", self.warnings.len()));
            for warning in &self.warnings {
                out.push_str(&format!("  - {}\n", warning.message));
            }
        }
        if summary.failed > 0 {
            out.push_str(&format!("\n{} checks FAILED:\n", summary.failed));
            for failure in self.failures() {
                out.push_str(&format!("\nFAIL: {}\n", failure.name));
                if let Some(detail) = &failure.detail {
                    for line in detail.lines() {
                        out.push_str(&format!("  {line}\n"));
                    }
                }
            }
        } else {
            out.push_str("\nAll checks passed!\n");
            if !self.warnings.is_empty() {
                out.push_str("Note: review the warnings above\n");
            }
        }
        out
    }

    /// Print the report and return the exit code.
    pub fn print_summary(&self) -> i32 {
        if self.echo {
            print!("{}", self.render_summary());
        }
        self.summary().exit_code()
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
