//! Result parsing: raw subprocess capture to structured verdict.
//!
//! The generated harness prints a fixed line grammar:
//!
//! ```text
//! <free-form diagnostic lines>
//! Result: PASSED        (or: Result: FAILED)
//! Expected: <text>      (optional failure detail)
//! Actual: <text>        (optional failure detail)
//! ```
//!
//! Classification order mirrors execution severity: a timeout outranks
//! everything, a non-zero (or missing) exit code outranks content, and only
//! then does the `Result:` line decide pass/fail. Output with no
//! recognizable `Result:` line yields a ParseError verdict: a failed
//! testcase, never a crashed pipeline.

use localjudge_common::types::{ExecutionOutput, TestStatus, Verdict};

const RESULT_PREFIX: &str = "Result:";
const EXPECTED_PREFIX: &str = "Expected:";
const ACTUAL_PREFIX: &str = "Actual:";

/// Interpret one testcase's raw capture.
pub fn parse(output: &ExecutionOutput) -> Verdict {
    if output.timed_out {
        return Verdict {
            status: TestStatus::TimeLimitExceeded,
            expected: None,
            actual: None,
            diagnostics: output.combined_output.clone(),
        };
    }

    if output.exit_code != Some(0) {
        return Verdict {
            status: TestStatus::RuntimeError,
            expected: None,
            actual: None,
            diagnostics: output.combined_output.clone(),
        };
    }

    let mut result_value: Option<String> = None;
    let mut expected: Option<String> = None;
    let mut actual: Option<String> = None;
    let mut diagnostics: Vec<&str> = Vec::new();

    for line in output.combined_output.lines() {
        let trimmed = line.trim();
        if let Some(value) = trimmed.strip_prefix(RESULT_PREFIX) {
            if result_value.is_none() {
                result_value = Some(value.trim().to_string());
            }
        } else if let Some(value) = trimmed.strip_prefix(EXPECTED_PREFIX) {
            if expected.is_none() {
                expected = Some(value.trim().to_string());
            }
        } else if let Some(value) = trimmed.strip_prefix(ACTUAL_PREFIX) {
            if actual.is_none() {
                actual = Some(value.trim().to_string());
            }
        } else if !trimmed.is_empty() {
            diagnostics.push(line);
        }
    }

    let status = match result_value.as_deref() {
        Some("PASSED") => TestStatus::Passed,
        Some("FAILED") => TestStatus::Failed,
        // Unknown value or no Result line at all: the capture does not
        // match the grammar.
        _ => {
            return Verdict {
                status: TestStatus::ParseError,
                expected: None,
                actual: None,
                diagnostics: output.combined_output.clone(),
            };
        }
    };

    Verdict {
        status,
        expected,
        actual,
        diagnostics: diagnostics.join("\n"),
    }
}
