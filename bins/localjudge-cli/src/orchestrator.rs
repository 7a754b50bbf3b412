//! Test orchestration: the glue layer that drives one run.
//!
//! **Responsibility:**
//! Select testcases, execute each through the process runner, route the
//! capture through the result parser and the schema validator, write the
//! per-testcase artifacts, and aggregate the run summary.
//!
//! This module knows nothing about:
//! - How the solution executes (runner's job)
//! - How output is interpreted (parser's job)
//! - How documents are checked (validator's job)
//!
//! **Failure policy:**
//! A testcase's own failure (spawn error, non-zero exit, timeout, parse
//! error, schema violation) never aborts the batch; every selected
//! testcase is attempted and the aggregate reflects all of them. Only
//! setup-time conditions (unwritable output dir, unknown named testcase)
//! end the run early.

use crate::parser;
use crate::runner::ProcessRunner;
use crate::testcases::TestCaseRepository;
use crate::validator::ValidationContext;
use localjudge_common::error::HarnessError;
use localjudge_common::types::{
    ExecutionOutput, ResultsDocument, SchemaViolation, TestCase, TestRunSummary, TestStatus,
    TestcaseSelector, Verdict,
};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const SUMMARY_FILE: &str = "summary.json";

pub struct TestOrchestrator<'a> {
    runner: ProcessRunner,
    validation: &'a ValidationContext,
}

impl<'a> TestOrchestrator<'a> {
    pub fn new(runner: ProcessRunner, validation: &'a ValidationContext) -> Self {
        Self { runner, validation }
    }

    /// Exit contract exposed upward: status code 0 iff every selected
    /// testcase passed execution, parsing, and schema validation; the
    /// message carries the first encountered failure verbatim.
    pub async fn run_tests(
        &self,
        exe: &Path,
        testcases_dir: &Path,
        output_dir: &Path,
        problem_name: &str,
        selector: &TestcaseSelector,
    ) -> (i32, String) {
        match self
            .run(exe, testcases_dir, output_dir, problem_name, selector)
            .await
        {
            Ok(summary) => (
                summary.status_code(),
                summary.first_error.clone().unwrap_or_default(),
            ),
            Err(err) => (1, err.to_string()),
        }
    }

    /// Run the selected testcases and return the aggregate summary.
    pub async fn run(
        &self,
        exe: &Path,
        testcases_dir: &Path,
        output_dir: &Path,
        problem_name: &str,
        selector: &TestcaseSelector,
    ) -> Result<TestRunSummary, HarnessError> {
        fs::create_dir_all(output_dir)?;

        let repository = TestCaseRepository::new(testcases_dir);
        let selected = repository.select(selector)?;

        let mut summary = TestRunSummary::new(problem_name);
        info!(
            run_id = %summary.run_id,
            problem = %problem_name,
            testcases = selected.len(),
            "starting test run"
        );
        println!(
            "→ Running {} testcase(s) for {}",
            selected.len(),
            problem_name
        );

        if selected.is_empty() {
            warn!(problem = %problem_name, "no testcases selected");
        }

        for (position, testcase) in selected.iter().enumerate() {
            println!(
                "  Running testcase {} ({}/{})",
                testcase.id,
                position + 1,
                selected.len()
            );

            match self.runner.execute(exe, testcase).await {
                Ok(output) => {
                    self.record(&output, testcase, problem_name, output_dir, &mut summary)?;
                }
                Err(err) => {
                    println!("    ✗ {err}");
                    summary.record_failure(format!("testcase '{}': {err}", testcase.id));
                }
            }
        }

        summary.success = summary.failed == 0;

        let summary_path = output_dir.join(SUMMARY_FILE);
        let rendered =
            serde_json::to_string_pretty(&summary).map_err(|source| HarnessError::Json {
                path: summary_path.clone(),
                source,
            })?;
        fs::write(&summary_path, rendered)?;

        println!("→ {} passed, {} failed", summary.passed, summary.failed);
        info!(
            run_id = %summary.run_id,
            passed = summary.passed,
            failed = summary.failed,
            success = summary.success,
            "test run finished"
        );
        Ok(summary)
    }

    /// Parse, validate, and persist one executed testcase.
    fn record(
        &self,
        output: &ExecutionOutput,
        testcase: &TestCase,
        problem_name: &str,
        output_dir: &Path,
        summary: &mut TestRunSummary,
    ) -> Result<(), HarnessError> {
        fs::write(
            output_dir.join(format!("{}.out", testcase.id)),
            &output.combined_output,
        )?;

        let verdict = parser::parse(output);
        let document = build_document(problem_name, output, &verdict);

        let document_path = output_dir.join(format!("{}.results.json", testcase.id));
        let value = serde_json::to_value(&document).map_err(|source| HarnessError::Json {
            path: document_path.clone(),
            source,
        })?;
        fs::write(
            &document_path,
            serde_json::to_string_pretty(&value).map_err(|source| HarnessError::Json {
                path: document_path.clone(),
                source,
            })?,
        )?;

        let violations = self.validation.validate(&value);
        if !violations.is_empty() {
            println!("    ✗ results document failed validation");
            summary.record_failure(describe_violation(testcase, &violations[0]));
            return Ok(());
        }

        match verdict.status {
            TestStatus::Passed => {
                println!("    ✓ passed ({}ms)", output.duration_ms);
                summary.passed += 1;
            }
            _ => {
                print_failure(&verdict);
                summary.record_failure(describe_failure(testcase, &verdict, output));
            }
        }
        Ok(())
    }
}

fn build_document(
    problem_name: &str,
    output: &ExecutionOutput,
    verdict: &Verdict,
) -> ResultsDocument {
    ResultsDocument {
        problem: problem_name.to_string(),
        testcase: output.testcase_id.clone(),
        status: verdict.status,
        exit_code: output.exit_code.unwrap_or(-1),
        duration_ms: output.duration_ms,
        expected: verdict.expected.clone(),
        actual: verdict.actual.clone(),
        diagnostics: if verdict.diagnostics.is_empty() {
            None
        } else {
            Some(verdict.diagnostics.clone())
        },
    }
}

fn print_failure(verdict: &Verdict) {
    match verdict.status {
        TestStatus::Failed => {
            println!("    ✗ output mismatch");
            if let (Some(expected), Some(actual)) = (&verdict.expected, &verdict.actual) {
                println!("    Expected: \"{expected}\"");
                println!("    Got:      \"{actual}\"");
            }
        }
        TestStatus::ParseError => println!("    ✗ unparseable output"),
        TestStatus::TimeLimitExceeded => println!("    ✗ timeout"),
        TestStatus::RuntimeError => println!("    ✗ runtime error"),
        TestStatus::Passed => {}
    }
}

fn describe_failure(testcase: &TestCase, verdict: &Verdict, output: &ExecutionOutput) -> String {
    match verdict.status {
        TestStatus::Failed => match (&verdict.expected, &verdict.actual) {
            (Some(expected), Some(actual)) => format!(
                "testcase '{}' failed: expected \"{expected}\", got \"{actual}\"",
                testcase.id
            ),
            _ => format!("testcase '{}' failed", testcase.id),
        },
        TestStatus::ParseError => {
            format!("testcase '{}' produced unparseable output", testcase.id)
        }
        TestStatus::TimeLimitExceeded => {
            format!(
                "testcase '{}' timed out after {}ms",
                testcase.id, output.duration_ms
            )
        }
        TestStatus::RuntimeError => format!(
            "testcase '{}' exited with code {}",
            testcase.id,
            output.exit_code.unwrap_or(-1)
        ),
        TestStatus::Passed => String::new(),
    }
}

fn describe_violation(testcase: &TestCase, violation: &SchemaViolation) -> String {
    if violation.path.is_empty() {
        format!(
            "testcase '{}' failed results validation: {}",
            testcase.id, violation.reason
        )
    } else {
        format!(
            "testcase '{}' failed results validation at {}: {}",
            testcase.id, violation.path, violation.reason
        )
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use crate::config::InputMode;
    use serde_json::json;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    fn results_schema_context() -> ValidationContext {
        ValidationContext::register(&json!({
            "type": "object",
            "required": ["problem", "testcase", "status", "exit_code", "duration_ms"],
            "properties": {
                "problem": {"type": "string"},
                "testcase": {"type": "string"},
                "status": {
                    "type": "string",
                    "enum": ["passed", "failed", "parse_error",
                             "time_limit_exceeded", "runtime_error"]
                },
                "exit_code": {"type": "integer"},
                "duration_ms": {"type": "integer", "minimum": 0},
                "expected": {"type": "string"},
                "actual": {"type": "string"},
                "diagnostics": {"type": "string"}
            }
        }))
        .unwrap()
    }

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("solution");
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn write_fixture(testcases_dir: &Path, id: &str, body: &str) {
        fs::create_dir_all(testcases_dir).unwrap();
        fs::write(testcases_dir.join(format!("{id}.test")), body).unwrap();
    }

    fn orchestrator(context: &ValidationContext) -> TestOrchestrator<'_> {
        TestOrchestrator::new(ProcessRunner::new(5_000, InputMode::Argument), context)
    }

    #[tokio::test]
    async fn passing_single_testcase_returns_zero_and_empty_message() {
        let dir = tempfile::tempdir().unwrap();
        let testcases = dir.path().join("testcases");
        let output_dir = dir.path().join("testcase_output");
        write_fixture(&testcases, "t1", "input");
        let exe = write_script(dir.path(), "echo \"Result: PASSED\"");

        let context = results_schema_context();
        let (code, message) = orchestrator(&context)
            .run_tests(
                &exe,
                &testcases,
                &output_dir,
                "TwoSum",
                &TestcaseSelector::Named("t1".to_string()),
            )
            .await;

        assert_eq!(code, 0);
        assert_eq!(message, "");
        assert!(output_dir.join("t1.out").is_file());
        assert!(output_dir.join("t1.results.json").is_file());
        assert!(output_dir.join("summary.json").is_file());
    }

    #[tokio::test]
    async fn all_selector_attempts_every_testcase_despite_failures() {
        let dir = tempfile::tempdir().unwrap();
        let testcases = dir.path().join("testcases");
        let output_dir = dir.path().join("out");
        for id in ["t1", "t2", "t10"] {
            write_fixture(&testcases, id, "input");
        }
        let exe = write_script(
            dir.path(),
            "echo \"Result: FAILED\"\necho \"Expected: 1\"\necho \"Actual: 2\"",
        );

        let context = results_schema_context();
        let summary = orchestrator(&context)
            .run(
                &exe,
                &testcases,
                &output_dir,
                "TwoSum",
                &TestcaseSelector::All,
            )
            .await
            .unwrap();

        assert_eq!(summary.passed, 0);
        assert_eq!(summary.failed, 3);
        assert!(!summary.success);
        // Every testcase was attempted, not just the first failure.
        for id in ["t1", "t2", "t10"] {
            assert!(output_dir.join(format!("{id}.out")).is_file());
        }
        // Natural order means t1 fails first.
        assert!(summary.first_error.unwrap().contains("t1"));
    }

    #[tokio::test]
    async fn mixed_results_are_counted_per_testcase() {
        let dir = tempfile::tempdir().unwrap();
        let testcases = dir.path().join("testcases");
        let output_dir = dir.path().join("out");
        write_fixture(&testcases, "t1", "pass");
        write_fixture(&testcases, "t2", "fail");
        write_fixture(&testcases, "t10", "pass");
        let exe = write_script(
            dir.path(),
            "if grep -q pass \"$1\"; then echo \"Result: PASSED\"; else echo \"Result: FAILED\"; fi",
        );

        let context = results_schema_context();
        let summary = orchestrator(&context)
            .run(
                &exe,
                &testcases,
                &output_dir,
                "TwoSum",
                &TestcaseSelector::All,
            )
            .await
            .unwrap();

        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert!(summary.first_error.unwrap().contains("t2"));
    }

    #[tokio::test]
    async fn schema_violation_fails_the_testcase_and_names_it() {
        let dir = tempfile::tempdir().unwrap();
        let testcases = dir.path().join("testcases");
        let output_dir = dir.path().join("out");
        write_fixture(&testcases, "t1", "input");
        let exe = write_script(dir.path(), "echo \"Result: PASSED\"");

        // A schema the document cannot satisfy.
        let context = ValidationContext::register(&json!({
            "type": "object",
            "required": ["nonexistent_field"]
        }))
        .unwrap();

        let (code, message) = TestOrchestrator::new(
            ProcessRunner::new(5_000, InputMode::Argument),
            &context,
        )
        .run_tests(
            &exe,
            &testcases,
            &output_dir,
            "TwoSum",
            &TestcaseSelector::All,
        )
        .await;

        assert_ne!(code, 0);
        assert!(message.contains("t1"));
        assert!(message.contains("validation"));
    }

    #[tokio::test]
    async fn missing_named_testcase_is_fatal_before_any_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let testcases = dir.path().join("testcases");
        let output_dir = dir.path().join("out");
        write_fixture(&testcases, "t1", "input");
        let exe = write_script(dir.path(), "echo \"Result: PASSED\"");

        let context = results_schema_context();
        let (code, message) = orchestrator(&context)
            .run_tests(
                &exe,
                &testcases,
                &output_dir,
                "TwoSum",
                &TestcaseSelector::Named("t99".to_string()),
            )
            .await;

        assert_eq!(code, 1);
        assert!(message.contains("t99"));
        // Nothing executed, so no per-testcase artifact exists.
        assert!(!output_dir.join("t1.out").exists());
        assert!(!output_dir.join("t99.out").exists());
    }

    #[tokio::test]
    async fn timeout_is_recorded_as_that_testcase_failure() {
        let dir = tempfile::tempdir().unwrap();
        let testcases = dir.path().join("testcases");
        let output_dir = dir.path().join("out");
        write_fixture(&testcases, "t1", "input");
        let exe = write_script(dir.path(), "sleep 5\necho \"Result: PASSED\"");

        let context = results_schema_context();
        let orchestrator = TestOrchestrator::new(
            ProcessRunner::new(100, InputMode::Argument),
            &context,
        );
        let summary = orchestrator
            .run(
                &exe,
                &testcases,
                &output_dir,
                "TwoSum",
                &TestcaseSelector::All,
            )
            .await
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert!(summary.first_error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn spawn_failure_continues_through_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let testcases = dir.path().join("testcases");
        let output_dir = dir.path().join("out");
        write_fixture(&testcases, "t1", "input");
        write_fixture(&testcases, "t2", "input");

        let context = results_schema_context();
        let summary = orchestrator(&context)
            .run(
                Path::new("/nonexistent/solution_cpp"),
                &testcases,
                &output_dir,
                "TwoSum",
                &TestcaseSelector::All,
            )
            .await
            .unwrap();

        // Both testcases were attempted and both recorded as failures.
        assert_eq!(summary.failed, 2);
        assert!(!summary.success);
    }

    #[tokio::test]
    async fn empty_selection_is_a_successful_run() {
        let dir = tempfile::tempdir().unwrap();
        let testcases = dir.path().join("testcases");
        fs::create_dir_all(&testcases).unwrap();
        let output_dir = dir.path().join("out");
        let exe = write_script(dir.path(), "echo \"Result: PASSED\"");

        let context = results_schema_context();
        let (code, message) = orchestrator(&context)
            .run_tests(
                &exe,
                &testcases,
                &output_dir,
                "TwoSum",
                &TestcaseSelector::All,
            )
            .await;

        assert_eq!(code, 0);
        assert_eq!(message, "");
    }
}
