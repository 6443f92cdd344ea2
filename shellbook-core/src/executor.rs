//! Shell executor.
//!
//! Runs one command line through the host shell and captures everything it
//! produced. Execution never fails from the caller's point of view: spawn
//! errors and signals come back as an [`ExecutionResult`] like any other.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;

/// Shown instead of a blank result when a command printed nothing and succeeded.
pub const NO_OUTPUT_MARKER: &str = "[INFO] Command executed with no output.";

/// Raw outcome of one command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecutionResult {
    /// Any stderr output or a non-zero exit counts as an error.
    ///
    /// Tools that log warnings to stderr are flagged too; the AI fix flow is
    /// keyed off this classification.
    pub fn is_error(&self) -> bool {
        !self.stderr.is_empty() || self.exit_code != 0
    }

    /// Text shown to the user and sent to the model on a fix request.
    pub fn display_text(&self) -> String {
        let mut out = String::new();
        let stdout = self.stdout.trim();
        let stderr = self.stderr.trim();

        if !self.stdout.is_empty() {
            out.push_str(&format!("[STDOUT]:\n{}\n", stdout));
        }
        if !self.stderr.is_empty() {
            out.push_str(&format!("[STDERR]:\n{}\n", stderr));
        }
        if self.exit_code != 0 {
            out.push_str(&format!("\n[Exit Code: {}]", self.exit_code));
        }

        let trimmed = out.trim();
        if trimmed.is_empty() {
            NO_OUTPUT_MARKER.to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// The process could not be started at all.
    pub fn spawn_failure(err: &std::io::Error) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("[Execution Error]: {}", err),
            exit_code: -1,
        }
    }
}

/// Anything able to run a command line in a working directory.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str, cwd: &Path) -> ExecutionResult;
}

/// Runs commands through the system shell so that pipes, redirects, globs
/// and builtins behave exactly as typed.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    program: String,
    flag: String,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellExecutor {
    pub fn new() -> Self {
        #[cfg(windows)]
        let (program, flag) = ("cmd", "/C");

        #[cfg(not(windows))]
        let (program, flag) = ("sh", "-c");

        Self::with_shell(program, flag)
    }

    /// Use a specific shell, e.g. `("bash", "-c")`.
    pub fn with_shell(program: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            flag: flag.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, command: &str, cwd: &Path) -> ExecutionResult {
        tracing::info!("Executing in {}: {}", cwd.display(), command);

        let output = tokio::process::Command::new(&self.program)
            .arg(&self.flag)
            .arg(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => {
                let result = ExecutionResult {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    // Killed by a signal: no code to report.
                    exit_code: output.status.code().unwrap_or(-1),
                };
                tracing::debug!(
                    "Finished `{}` exit={} stdout={}B stderr={}B",
                    command,
                    result.exit_code,
                    result.stdout.len(),
                    result.stderr.len()
                );
                result
            }
            Err(e) => {
                tracing::warn!("Failed to spawn `{}`: {}", command, e);
                ExecutionResult::spawn_failure(&e)
            }
        }
    }
}
