//! Hypervisor process invocation.
//!
//! The runner knows nothing about the hypervisor protocol: it takes an
//! argument list, runs the executable and hands back exit code and raw
//! output. Interpreting a nonzero exit is the caller's job.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use vboxmon_shared::errors::{VboxError, VboxResult};

/// Captured result of a process that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Build a successful output with the given stdout text.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into().into_bytes(),
            stderr: Vec::new(),
        }
    }

    /// Build a failed output with the given exit code and stderr text.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: Vec::new(),
            stderr: stderr.into().into_bytes(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Stdout decoded lossily as UTF-8.
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded lossily as UTF-8, trimmed.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Short human readable description of how the process ended.
    pub fn describe_exit(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Process exited (with any exit code).
    Completed(ProcessOutput),
    /// Process exceeded its timeout and was killed.
    TimedOut,
}

impl ProcessOutcome {
    /// Treat a timeout as an error, for callers that never pass a timeout
    /// or cannot continue without output.
    pub fn into_output(self) -> VboxResult<ProcessOutput> {
        match self {
            ProcessOutcome::Completed(output) => Ok(output),
            ProcessOutcome::TimedOut => {
                Err(VboxError::Process("process timed out".to_string()))
            }
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, ProcessOutcome::TimedOut)
    }
}

/// Runs the hypervisor executable.
///
/// Implemented by [`CommandRunner`] for the real tool and by scripted fakes
/// in tests.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run the executable with `args`.
    ///
    /// # Returns
    /// * `Ok(ProcessOutcome::Completed)` - Process exited, whatever its exit code
    /// * `Ok(ProcessOutcome::TimedOut)` - `timeout` elapsed, process killed
    /// * `Err(VboxError::Process)` - Process could not be spawned or awaited
    async fn execute(
        &self,
        args: &[String],
        timeout: Option<Duration>,
    ) -> VboxResult<ProcessOutcome>;
}

/// [`ProcessRunner`] that spawns a real executable.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    executable: PathBuf,
}

impl CommandRunner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    async fn execute(
        &self,
        args: &[String],
        timeout: Option<Duration>,
    ) -> VboxResult<ProcessOutcome> {
        tracing::trace!(
            executable = %self.executable.display(),
            ?args,
            ?timeout,
            "Running hypervisor command"
        );

        let child = Command::new(&self.executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout must not leave the child behind
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                VboxError::Process(format!(
                    "failed to spawn {}: {}",
                    self.executable.display(),
                    e
                ))
            })?;

        let wait = child.wait_with_output();
        let output = match timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(result) => result,
                Err(_) => return Ok(ProcessOutcome::TimedOut),
            },
            None => wait.await,
        }
        .map_err(|e| {
            VboxError::Process(format!(
                "failed to wait for {}: {}",
                self.executable.display(),
                e
            ))
        })?;

        Ok(ProcessOutcome::Completed(ProcessOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_execute_captures_stdout_and_exit_code() {
        let runner = CommandRunner::new("/bin/sh");
        let outcome = runner
            .execute(&args(&["-c", "echo hello; exit 3"]), None)
            .await
            .expect("sh should spawn");

        let output = outcome.into_output().unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout_text(), "hello\n");
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_execute_captures_stderr() {
        let runner = CommandRunner::new("/bin/sh");
        let output = runner
            .execute(&args(&["-c", "echo oops >&2"]), None)
            .await
            .unwrap()
            .into_output()
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stderr_text(), "oops");
    }

    #[tokio::test]
    async fn test_execute_timeout_is_an_outcome() {
        let runner = CommandRunner::new("/bin/sh");
        let outcome = runner
            .execute(
                &args(&["-c", "sleep 5"]),
                Some(Duration::from_millis(100)),
            )
            .await
            .expect("timeout is not an error");

        assert!(outcome.is_timed_out());
        assert!(outcome.into_output().is_err());
    }

    #[tokio::test]
    async fn test_execute_missing_binary_is_error() {
        let runner = CommandRunner::new("/nonexistent/path/to/vboxmanage");
        let result = runner.execute(&args(&["list", "vms"]), None).await;

        assert!(matches!(result, Err(VboxError::Process(_))));
    }

    #[test]
    fn test_describe_exit() {
        assert_eq!(ProcessOutput::failed(2, "").describe_exit(), "exit code 2");
        let signalled = ProcessOutput {
            exit_code: None,
            ..Default::default()
        };
        assert_eq!(signalled.describe_exit(), "terminated by signal");
    }
}
