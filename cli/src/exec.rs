//! External command execution behind the [`Executor`] trait.
use anyhow::{Context as _, Result};
use std::io::Write as _;
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

use crate::error::ResourceError;

/// How often a child with a time limit is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

impl ExecResult {
    /// Convert a non-zero exit into a [`ResourceError::ExecutionFailed`].
    fn checked(self, program: &str) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        Err(ResourceError::ExecutionFailed {
            program: program.to_string(),
            exit_code: self.code.unwrap_or(-1),
            stderr: self.stderr.trim().to_string(),
        }
        .into())
    }
}

/// Abstraction over process execution so installers can be tested without
/// touching the real system.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command and fail if it exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started or exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, returning the result even when it exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error only if the program cannot be started.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command with an optional time limit, failing on non-zero exit.
    ///
    /// When the limit is exceeded the child is killed and
    /// [`ResourceError::TimedOut`] is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started, exits non-zero, or
    /// exceeds `timeout`.
    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ExecResult>;

    /// Run a command with `input` on its standard input and extra
    /// environment variables, failing on non-zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be started, stdin cannot be
    /// written, or the program exits non-zero.
    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
        input: &str,
    ) -> Result<ExecResult>;

    /// Check whether `program` is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] that spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        self.run_unchecked(program, args)?.checked(program)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ExecResult> {
        let Some(limit) = timeout else {
            return self.run(program, args);
        };

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to execute: {program}"))?;

        wait_with_deadline(child, program, limit)?.checked(program)
    }

    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        env: &[(String, String)],
        input: &str,
    ) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in env {
            cmd.env(key, value);
        }
        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to execute: {program}"))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .with_context(|| format!("writing stdin of {program}"))?;
        }

        let output = child
            .wait_with_output()
            .with_context(|| format!("waiting for {program}"))?;
        ExecResult::from(output).checked(program)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Wait for `child` to exit, killing it once `limit` has elapsed.
///
/// Output pipes are drained on helper threads so a chatty child cannot
/// block on a full pipe while we poll.
fn wait_with_deadline(mut child: Child, program: &str, limit: Duration) -> Result<ExecResult> {
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);
    let deadline = Instant::now() + limit;

    let status = loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("waiting for {program}"))?
        {
            break status;
        }
        if Instant::now() >= deadline {
            child.kill().ok();
            child.wait().ok();
            return Err(ResourceError::TimedOut {
                program: program.to_string(),
                seconds: limit.as_secs(),
            }
            .into());
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let collect = |handle: Option<std::thread::JoinHandle<String>>| {
        handle
            .and_then(|h| h.join().ok())
            .unwrap_or_default()
    };

    Ok(ExecResult {
        stdout: collect(stdout),
        stderr: collect(stderr),
        success: status.success(),
        code: status.code(),
    })
}

/// Read a pipe to completion on a background thread.
fn drain<R: std::io::Read + Send + 'static>(mut pipe: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf).ok();
        String::from_utf8_lossy(&buf).to_string()
    })
}
