use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A problem resolved on disk. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct Problem {
    pub name: String,
    pub source_dir: PathBuf,
    pub testcases_dir: PathBuf,
}

/// One testcase fixture.
///
/// `id` is the fixture filename with the `.test` extension stripped;
/// `ordinal` is its position under natural ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub id: String,
    pub ordinal: usize,
    pub fixture_path: PathBuf,
}

/// Which testcases a run covers: everything, or a single named fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestcaseSelector {
    All,
    Named(String),
}

impl TestcaseSelector {
    /// `"All"` (any casing) is the wildcard; anything else names a testcase.
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("all") {
            TestcaseSelector::All
        } else {
            TestcaseSelector::Named(raw.to_string())
        }
    }
}

/// Raw capture from one solution subprocess run.
///
/// Produced by the process runner, consumed by the result parser.
#[derive(Debug, Clone)]
pub struct ExecutionOutput {
    pub testcase_id: String,
    /// Merged stdout followed by stderr.
    pub combined_output: String,
    /// `None` when the child was killed or no code was reported.
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub timed_out: bool,
}

/// Outcome classification for a single testcase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    ParseError,
    TimeLimitExceeded,
    RuntimeError,
}

/// Structured verdict recovered from a subprocess's output.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub status: TestStatus,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub diagnostics: String,
}

/// The per-testcase results document validated against the registered
/// schema and written as a run artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub problem: String,
    pub testcase: String,
    pub status: TestStatus,
    /// `-1` when the child reported no exit code (killed on timeout).
    pub exit_code: i32,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,
}

/// One schema violation: where in the document, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    pub path: String,
    pub reason: String,
}

/// Aggregate outcome of one orchestrator invocation.
#[derive(Debug, Clone, Serialize)]
pub struct TestRunSummary {
    pub run_id: Uuid,
    pub problem: String,
    pub started_at: DateTime<Utc>,
    pub passed: u32,
    pub failed: u32,
    pub first_error: Option<String>,
    pub success: bool,
}

impl TestRunSummary {
    pub fn new(problem: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            problem: problem.to_string(),
            started_at: Utc::now(),
            passed: 0,
            failed: 0,
            first_error: None,
            success: false,
        }
    }

    /// Record one testcase failure, keeping only the first error message.
    pub fn record_failure(&mut self, message: String) {
        self.failed += 1;
        if self.first_error.is_none() {
            self.first_error = Some(message);
        }
    }

    /// Exit contract exposed upward: 0 iff every selected testcase passed.
    pub fn status_code(&self) -> i32 {
        if self.success {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_wildcard_is_case_insensitive() {
        assert_eq!(TestcaseSelector::parse("All"), TestcaseSelector::All);
        assert_eq!(TestcaseSelector::parse("all"), TestcaseSelector::All);
        assert_eq!(TestcaseSelector::parse("ALL"), TestcaseSelector::All);
        assert_eq!(
            TestcaseSelector::parse("testcase1"),
            TestcaseSelector::Named("testcase1".to_string())
        );
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&TestStatus::TimeLimitExceeded).unwrap();
        assert_eq!(json, "\"time_limit_exceeded\"");
        let json = serde_json::to_string(&TestStatus::ParseError).unwrap();
        assert_eq!(json, "\"parse_error\"");
    }

    #[test]
    fn summary_keeps_first_error_only() {
        let mut summary = TestRunSummary::new("TwoSum");
        summary.record_failure("first".to_string());
        summary.record_failure("second".to_string());
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.first_error.as_deref(), Some("first"));
    }

    #[test]
    fn results_document_omits_empty_detail() {
        let doc = ResultsDocument {
            problem: "TwoSum".to_string(),
            testcase: "testcase1".to_string(),
            status: TestStatus::Passed,
            exit_code: 0,
            duration_ms: 12,
            expected: None,
            actual: None,
            diagnostics: None,
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("expected").is_none());
        assert_eq!(value["status"], "passed");
    }
}
