//! Command cell state machine.
//!
//! ```text
//! Idle ──run──▶ Running ──result──▶ Completed | Failed
//!                  ▲                        │
//!                  └─────────re-run─────────┘
//! ```
//!
//! A cell never spawns anything itself. `begin_run` performs the synchronous
//! part of a run (guards, `cd`) and hands back a [`RunTicket`] for the
//! session to dispatch; `finish_run` applies the executor's answer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::directory::{self, DirectoryContext, DirectoryError};
use crate::executor::ExecutionResult;

pub type CellId = Uuid;

/// Shown when run is requested on a cell with no command.
pub const EMPTY_COMMAND_NOTICE: &str = "[INFO] No command entered.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl CellState {
    pub fn is_finished(self) -> bool {
        matches!(self, CellState::Completed | CellState::Failed)
    }
}

impl std::fmt::Display for CellState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CellState::Idle => "idle",
            CellState::Running => "running",
            CellState::Completed => "completed",
            CellState::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    #[error("cell is still running")]
    Busy,

    #[error("no failed run to fix (cell is {state})")]
    FixUnavailable { state: CellState },

    #[error("cell has no AI suggestion yet")]
    NoSuggestion,
}

/// Latest outcome of a cell, as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub display: String,
    pub is_error: bool,
    /// Directory the command ran in.
    pub cwd: PathBuf,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl CellResult {
    fn from_execution(exec: ExecutionResult, cwd: PathBuf, started: Option<Instant>) -> Self {
        let display = exec.display_text();
        let is_error = exec.is_error();
        Self {
            stdout: exec.stdout,
            stderr: exec.stderr,
            exit_code: exec.exit_code,
            display,
            is_error,
            cwd,
            finished_at: Utc::now(),
            duration_ms: started
                .map(|s| s.elapsed().as_millis() as i64)
                .unwrap_or(0),
        }
    }

    fn from_directory(outcome: Result<PathBuf, DirectoryError>, cwd: PathBuf) -> Self {
        let (stderr, exit_code, display) = match outcome {
            Ok(path) => (
                String::new(),
                0,
                format!("[INFO] Working directory is now {}", path.display()),
            ),
            Err(e) => {
                let msg = e.to_string();
                (msg.clone(), 1, format!("[STDERR]:\n{}\n\n[Exit Code: 1]", msg))
            }
        };
        Self {
            stdout: String::new(),
            is_error: exit_code != 0,
            stderr,
            exit_code,
            display,
            cwd,
            finished_at: Utc::now(),
            duration_ms: 0,
        }
    }
}

/// Work order for the executor, produced by [`CommandCell::begin_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    pub cell_id: CellId,
    pub run_id: u64,
    pub command: String,
    pub cwd: PathBuf,
}

/// What `begin_run` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStart {
    /// Nothing to run; the notice was not stored as a result.
    Empty,
    /// A run is already in flight; the request was ignored.
    AlreadyRunning,
    /// Handled in place (`cd`); the cell is already in a final state.
    Finished {
        directory_changed: Option<PathBuf>,
    },
    /// The cell is `Running`; dispatch the ticket.
    Dispatch(RunTicket),
}

#[derive(Debug)]
pub struct CommandCell {
    id: CellId,
    command_text: String,
    directory: Arc<DirectoryContext>,
    state: CellState,
    last_result: Option<CellResult>,
    ai_suggestion: Option<String>,
    run_id: u64,
    started: Option<Instant>,
}

impl CommandCell {
    pub fn new(command_text: impl Into<String>, directory: Arc<DirectoryContext>) -> Self {
        Self {
            id: Uuid::new_v4(),
            command_text: command_text.into(),
            directory,
            state: CellState::Idle,
            last_result: None,
            ai_suggestion: None,
            run_id: 0,
            started: None,
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn command_text(&self) -> &str {
        &self.command_text
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn last_result(&self) -> Option<&CellResult> {
        self.last_result.as_ref()
    }

    pub fn ai_suggestion(&self) -> Option<&str> {
        self.ai_suggestion.as_deref()
    }

    pub fn directory(&self) -> &Arc<DirectoryContext> {
        &self.directory
    }

    /// Prompt label for this cell (the shared directory's path).
    pub fn prompt(&self) -> String {
        self.directory.prompt()
    }

    /// Replace the command text. Rejected while a run is in flight.
    pub fn edit(&mut self, new_text: impl Into<String>) -> Result<(), CellError> {
        if self.state == CellState::Running {
            return Err(CellError::Busy);
        }
        self.command_text = new_text.into();
        Ok(())
    }

    pub fn begin_run(&mut self) -> RunStart {
        if self.state == CellState::Running {
            tracing::debug!("Cell {} already running; ignoring run request", self.id);
            return RunStart::AlreadyRunning;
        }
        if self.command_text.trim().is_empty() {
            return RunStart::Empty;
        }

        self.run_id += 1;
        self.state = CellState::Running;
        self.started = Some(Instant::now());

        if let Some(target) = directory::parse_cd(&self.command_text) {
            let cwd = self.directory.current_path();
            let outcome = self.directory.change_directory(target);
            let changed = outcome.as_ref().ok().cloned();
            self.settle(CellResult::from_directory(outcome, cwd));
            return RunStart::Finished {
                directory_changed: changed,
            };
        }

        RunStart::Dispatch(RunTicket {
            cell_id: self.id,
            run_id: self.run_id,
            command: self.command_text.clone(),
            cwd: self.directory.current_path(),
        })
    }

    /// Apply an executor result. Returns false when the result belongs to a
    /// run this cell is no longer waiting for.
    pub fn finish_run(&mut self, run_id: u64, cwd: PathBuf, exec: ExecutionResult) -> bool {
        if self.state != CellState::Running || run_id != self.run_id {
            return false;
        }
        let result = CellResult::from_execution(exec, cwd, self.started);
        self.settle(result);
        true
    }

    fn settle(&mut self, result: CellResult) {
        self.state = if result.is_error {
            CellState::Failed
        } else {
            CellState::Completed
        };
        self.started = None;
        self.last_result = Some(result);
    }

    /// Payload for an AI fix request: the command and its displayed failure.
    pub fn fix_request(&self) -> Result<(String, String), CellError> {
        match (&self.state, &self.last_result) {
            (CellState::Failed, Some(result)) => {
                Ok((self.command_text.clone(), result.display.clone()))
            }
            _ => Err(CellError::FixUnavailable { state: self.state }),
        }
    }

    pub fn set_ai_suggestion(&mut self, markdown: impl Into<String>) {
        self.ai_suggestion = Some(markdown.into());
    }
}
