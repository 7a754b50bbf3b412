//! Subprocess execution for a single testcase.
//!
//! **Core Responsibility:**
//! Run the compiled solution once, capture what it printed, and report how
//! it exited. Nothing here interprets verdicts or scores.
//!
//! **Execution Rules:**
//! - Explicit argument-vector spawn; the fixture reaches the child either
//!   as its single argument or on stdin, per the language configuration.
//! - Hard per-testcase timeout via `tokio::time::timeout`; `kill_on_drop`
//!   guarantees a timed-out child is terminated when the wait future is
//!   dropped, so a hanging solution can never stall the batch.
//! - Spawn failures (missing binary, permission error) surface before any
//!   timeout logic applies.
//! - Every invocation is self-contained: no shared environment, working
//!   directory, or file handles across testcases.

use crate::config::InputMode;
use localjudge_common::error::HarnessError;
use localjudge_common::types::{ExecutionOutput, TestCase};
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

pub struct ProcessRunner {
    timeout: Duration,
    input_mode: InputMode,
}

impl ProcessRunner {
    pub fn new(timeout_ms: u64, input_mode: InputMode) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            input_mode,
        }
    }

    /// Execute the solution against one testcase fixture.
    ///
    /// Returns the merged stdout+stderr capture, the exit code, and the
    /// wall-clock duration; `timed_out` is set instead of an error when the
    /// budget is exceeded.
    pub async fn execute(
        &self,
        exe: &Path,
        testcase: &TestCase,
    ) -> Result<ExecutionOutput, HarnessError> {
        let mut command = Command::new(exe);
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match self.input_mode {
            InputMode::Argument => {
                command.arg(&testcase.fixture_path);
                command.stdin(Stdio::null());
            }
            InputMode::Stdin => {
                let fixture = std::fs::File::open(&testcase.fixture_path)?;
                command.stdin(Stdio::from(fixture));
            }
        }

        let started = Instant::now();
        let child = command.spawn().map_err(|source| HarnessError::Spawn {
            exe: exe.to_path_buf(),
            source,
        })?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
                combined.push_str(&String::from_utf8_lossy(&output.stderr));
                let exit_code = output.status.code();
                debug!(
                    testcase = %testcase.id,
                    exit_code = ?exit_code,
                    duration_ms,
                    "solution process finished"
                );
                Ok(ExecutionOutput {
                    testcase_id: testcase.id.clone(),
                    combined_output: combined,
                    exit_code,
                    duration_ms,
                    timed_out: false,
                })
            }
            Ok(Err(source)) => Err(HarnessError::Io(source)),
            Err(_) => {
                // The wait future owned the child; dropping it triggers
                // kill_on_drop, so the subprocess is gone by the time we
                // report the timeout.
                let duration_ms = started.elapsed().as_millis() as u64;
                warn!(
                    testcase = %testcase.id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "solution process timed out"
                );
                Ok(ExecutionOutput {
                    testcase_id: testcase.id.clone(),
                    combined_output: format!(
                        "[execution timed out after {}ms]",
                        self.timeout.as_millis()
                    ),
                    exit_code: None,
                    duration_ms,
                    timed_out: true,
                })
            }
        }
    }
}
