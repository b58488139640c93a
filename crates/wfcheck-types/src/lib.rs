//! Shared types for the wfcheck workflow analyzer.
//!
//! This crate provides the foundational types used across all other wfcheck crates:
//! - `WfcheckError`: unified error taxonomy
//! - `CheckResult`: one named pass/fail outcome
//! - `Warning`: advisory, non-fatal annotation
//! - `RunSummary`: totals derived from a finished run

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Unified error type for all wfcheck subsystems.
#[derive(Debug, thiserror::Error)]
pub enum WfcheckError {
    // === Load Errors ===
    #[error("Could not find {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to parse YAML in {} at line {line}, col {col}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        col: usize,
        message: String,
    },

    // === Configuration Errors ===
    #[error("Invalid expectations: {0}")]
    Expectations(String),

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl WfcheckError {
    /// Returns `true` for the two fatal load classes (missing file, bad syntax).
    pub fn is_load_error(&self) -> bool {
        matches!(self, WfcheckError::NotFound { .. } | WfcheckError::Parse { .. })
    }

    /// Short machine-friendly label for the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            WfcheckError::NotFound { .. } => "not_found",
            WfcheckError::Parse { .. } => "parse_error",
            WfcheckError::Expectations(_) => "expectations",
            WfcheckError::Io(_) => "io",
            WfcheckError::Json(_) => "json",
            WfcheckError::Other(_) => "other",
        }
    }
}

/// A convenience alias for `Result<T, WfcheckError>`.
pub type Result<T> = std::result::Result<T, WfcheckError>;

// ---------------------------------------------------------------------------
// CheckResult: one named boolean outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CheckResult {
    pub fn pass(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            detail: None,
        }
    }

    pub fn fail(name: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            detail,
        }
    }
}

// ---------------------------------------------------------------------------
// Warning: advisory finding, never affects the exit code
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub message: String,
}

// ---------------------------------------------------------------------------
// RunSummary: derived totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warnings: usize,
}

impl RunSummary {
    /// Compute totals from recorded results and warnings.
    pub fn from_results(results: &[CheckResult], warnings: &[Warning]) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            warnings: warnings.len(),
        }
    }

    /// Process exit code: 0 when nothing failed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 {
            0
        } else {
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_load_error() {
        let err = WfcheckError::NotFound {
            path: PathBuf::from(".github/workflows/release.yml"),
        };
        assert!(err.is_load_error());
        assert_eq!(err.kind(), "not_found");
        assert!(err.to_string().contains("release.yml"));
    }

    #[test]
    fn parse_error_display_includes_position() {
        let err = WfcheckError::Parse {
            path: PathBuf::from("ci.yml"),
            line: 3,
            col: 7,
            message: "did not find expected key".into(),
        };
        assert!(err.is_load_error());
        let text = err.to_string();
        assert!(text.contains("line 3"));
        assert!(text.contains("col 7"));
    }

    #[test]
    fn other_errors_are_not_load_errors() {
        assert!(!WfcheckError::Other("boom".into()).is_load_error());
        assert!(!WfcheckError::Expectations("bad".into()).is_load_error());
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: WfcheckError = io_err.into();
        assert!(matches!(err, WfcheckError::Io(_)));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: WfcheckError = json_err.into();
        assert!(matches!(err, WfcheckError::Json(_)));
    }

    #[test]
    fn summary_counts_add_up() {
        let results = vec![
            CheckResult::pass("a"),
            CheckResult::fail("b", Some("Condition was false".into())),
            CheckResult::pass("c"),
        ];
        let warnings = vec![Warning {
            message: "drift".into(),
        }];
        let summary = RunSummary::from_results(&results, &warnings);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed + summary.failed, summary.total);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn empty_summary_exits_zero() {
        let summary = RunSummary::from_results(&[], &[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn check_result_serializes_without_empty_detail() {
        let json = serde_json::to_string(&CheckResult::pass("x")).unwrap();
        assert_eq!(json, r#"{"name":"x","passed":true}"#);
    }
}
