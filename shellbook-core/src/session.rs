//! Session manager.
//!
//! Owns the ordered cell collection and is the only place it changes. All
//! mutation happens on whoever holds `&mut Session`; command executions run
//! on tokio tasks and report back through an internal channel that
//! [`Session::next_completion`] drains.

use std::path::PathBuf;
use std::sync::Arc;

use shellbook_neural::{AssistBackend, AssistError};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cell::{CellError, CellId, CellState, CommandCell, EMPTY_COMMAND_NOTICE, RunStart};
use crate::directory::DirectoryContext;
use crate::executor::{CommandExecutor, ExecutionResult};
use crate::runtime::parser::CommandParser;
use crate::SessionEvent;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no cell with id {0}")]
    UnknownCell(CellId),

    #[error(transparent)]
    Cell(#[from] CellError),

    #[error(transparent)]
    Assist(#[from] AssistError),
}

/// What a run request turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Handed to the executor; the result arrives via `next_completion`.
    Dispatched,
    /// Ignored: the cell already has a run in flight.
    AlreadyRunning,
    /// Ignored: the command text is blank.
    Empty,
    /// Finished synchronously (`cd`).
    Finished(CellState),
}

#[derive(Debug)]
struct Completion {
    cell_id: CellId,
    run_id: u64,
    cwd: PathBuf,
    result: ExecutionResult,
}

pub struct Session {
    cells: Vec<CommandCell>,
    directory: Arc<DirectoryContext>,
    executor: Arc<dyn CommandExecutor>,
    assist: Arc<dyn AssistBackend>,
    events: mpsc::UnboundedSender<SessionEvent>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cells", &self.cells.len())
            .field("directory", &self.directory.current_path())
            .finish()
    }
}

impl Session {
    /// Build a session around its collaborators. The receiver carries every
    /// change a renderer needs to stay in step with the collection.
    pub fn new(
        directory: Arc<DirectoryContext>,
        executor: Arc<dyn CommandExecutor>,
        assist: Arc<dyn AssistBackend>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        info!("Session started in {}", directory.current_path().display());

        let session = Self {
            cells: Vec::new(),
            directory,
            executor,
            assist,
            events,
            completions_tx,
            completions_rx,
        };
        (session, events_rx)
    }

    fn emit(&self, event: SessionEvent) {
        // A host without a renderer may drop the receiver.
        let _ = self.events.send(event);
    }

    // ----------------------------------------------------------------
    // Queries
    // ----------------------------------------------------------------

    pub fn cells(&self) -> &[CommandCell] {
        &self.cells
    }

    pub fn cell(&self, id: CellId) -> Option<&CommandCell> {
        self.cells.iter().find(|c| c.id() == id)
    }

    pub fn position(&self, id: CellId) -> Option<usize> {
        self.cells.iter().position(|c| c.id() == id)
    }

    pub fn directory(&self) -> &Arc<DirectoryContext> {
        &self.directory
    }

    pub fn prompt(&self) -> String {
        self.directory.prompt()
    }

    fn cell_mut(&mut self, id: CellId) -> Result<&mut CommandCell, SessionError> {
        self.cells
            .iter_mut()
            .find(|c| c.id() == id)
            .ok_or(SessionError::UnknownCell(id))
    }

    // ----------------------------------------------------------------
    // Manual cell operations
    // ----------------------------------------------------------------

    /// Append one cell without touching the others.
    pub fn add_cell(&mut self, command_text: impl Into<String>) -> CellId {
        let cell = CommandCell::new(command_text, self.directory.clone());
        let id = cell.id();
        self.cells.push(cell);
        debug!("Added cell {}. Total cells: {}", id, self.cells.len());
        self.emit(SessionEvent::CellAdded {
            id,
            index: self.cells.len() - 1,
        });
        id
    }

    /// Remove a cell in any state. A run in flight keeps going but its
    /// result is dropped when it arrives.
    pub fn delete_cell(&mut self, id: CellId) -> Result<(), SessionError> {
        let index = self.position(id).ok_or(SessionError::UnknownCell(id))?;
        let cell = self.cells.remove(index);
        if cell.state() == CellState::Running {
            debug!("Deleted cell {} while running; its result will be discarded", id);
        }
        debug!("Deleted cell. Remaining cells: {}", self.cells.len());
        self.emit(SessionEvent::CellRemoved { id });
        Ok(())
    }

    pub fn edit_cell(&mut self, id: CellId, new_text: impl Into<String>) -> Result<(), SessionError> {
        self.cell_mut(id)?.edit(new_text)?;
        self.emit(SessionEvent::CellUpdated { id });
        Ok(())
    }

    /// Start a cell. Returns immediately; shell commands finish later.
    pub fn run_cell(&mut self, id: CellId) -> Result<RunStatus, SessionError> {
        let start = self.cell_mut(id)?.begin_run();

        let status = match start {
            RunStart::Empty => {
                self.emit(SessionEvent::Notice(EMPTY_COMMAND_NOTICE.to_string()));
                return Ok(RunStatus::Empty);
            }
            RunStart::AlreadyRunning => return Ok(RunStatus::AlreadyRunning),
            RunStart::Finished { directory_changed } => {
                if let Some(path) = directory_changed {
                    self.emit(SessionEvent::DirectoryChanged(path));
                }
                let state = self.cell(id).map(|c| c.state()).unwrap_or(CellState::Idle);
                RunStatus::Finished(state)
            }
            RunStart::Dispatch(ticket) => {
                let executor = self.executor.clone();
                let tx = self.completions_tx.clone();
                tokio::spawn(async move {
                    let result = executor.execute(&ticket.command, &ticket.cwd).await;
                    let _ = tx.send(Completion {
                        cell_id: ticket.cell_id,
                        run_id: ticket.run_id,
                        cwd: ticket.cwd,
                        result,
                    });
                });
                RunStatus::Dispatched
            }
        };

        self.emit(SessionEvent::CellUpdated { id });
        Ok(status)
    }

    /// Start every cell that is not already running, in display order.
    /// Cells still run independently; nothing waits for its predecessor.
    pub fn run_all(&mut self) -> Vec<(CellId, RunStatus)> {
        let ids: Vec<CellId> = self.cells.iter().map(|c| c.id()).collect();
        ids.into_iter()
            .filter_map(|id| self.run_cell(id).ok().map(|s| (id, s)))
            .collect()
    }

    // ----------------------------------------------------------------
    // Completions
    // ----------------------------------------------------------------

    /// Wait for the next execution to finish and apply it. Results for
    /// deleted or superseded runs are skipped. Pends forever when nothing
    /// is in flight, so use it inside `select!`.
    pub async fn next_completion(&mut self) -> Option<CellId> {
        loop {
            let completion = self.completions_rx.recv().await?;
            if let Some(id) = self.apply_completion(completion) {
                return Some(id);
            }
        }
    }

    /// Apply every completion that has already arrived, without waiting.
    pub fn drain_completions(&mut self) -> Vec<CellId> {
        let mut applied = Vec::new();
        while let Ok(completion) = self.completions_rx.try_recv() {
            if let Some(id) = self.apply_completion(completion) {
                applied.push(id);
            }
        }
        applied
    }

    fn apply_completion(&mut self, completion: Completion) -> Option<CellId> {
        let Completion {
            cell_id,
            run_id,
            cwd,
            result,
        } = completion;

        let Some(cell) = self.cells.iter_mut().find(|c| c.id() == cell_id) else {
            debug!("Discarding result for deleted cell {}", cell_id);
            return None;
        };
        if !cell.finish_run(run_id, cwd, result) {
            debug!("Discarding stale result for cell {} (run {})", cell_id, run_id);
            return None;
        }

        self.emit(SessionEvent::CellUpdated { id: cell_id });
        Some(cell_id)
    }

    // ----------------------------------------------------------------
    // AI flows
    // ----------------------------------------------------------------

    /// Translate a request and replace the whole collection with one cell
    /// per returned command. On service failure nothing changes.
    pub async fn submit_request(&mut self, request: &str) -> Result<usize, SessionError> {
        info!("Submitting request: {}", request);
        let markdown = self.assist.translate(request).await.inspect_err(|e| {
            warn!("Translate failed: {}", e);
        })?;
        let commands = CommandParser::parse(&markdown);
        Ok(self.replace_cells(commands))
    }

    /// Ask the model to fix a failed cell. The suggestion is stored on the
    /// cell and then applied through [`Session::on_ai_fix_ready`].
    pub async fn request_ai_fix(&mut self, id: CellId) -> Result<usize, SessionError> {
        let (command, error) = self.cell(id).ok_or(SessionError::UnknownCell(id))?.fix_request()?;

        info!("Requesting AI fix for `{}`", command);
        let markdown = self
            .assist
            .suggest_fix(&command, &error)
            .await
            .inspect_err(|e| warn!("Fix request failed: {}", e))?;

        self.cell_mut(id)?.set_ai_suggestion(markdown);
        self.emit(SessionEvent::CellUpdated { id });
        self.on_ai_fix_ready(id)
    }

    /// Replace the collection with the commands in a cell's suggestion.
    pub fn on_ai_fix_ready(&mut self, id: CellId) -> Result<usize, SessionError> {
        let suggestion = self
            .cell(id)
            .ok_or(SessionError::UnknownCell(id))?
            .ai_suggestion()
            .ok_or(CellError::NoSuggestion)?;
        let commands = CommandParser::parse(suggestion);
        Ok(self.replace_cells(commands))
    }

    /// Swap in a fresh collection built before the old one is detached, so
    /// observers never see a half-populated session.
    fn replace_cells(&mut self, commands: Vec<String>) -> usize {
        let fresh: Vec<CommandCell> = commands
            .into_iter()
            .map(|cmd| CommandCell::new(cmd, self.directory.clone()))
            .collect();
        let added: Vec<CellId> = fresh.iter().map(|c| c.id()).collect();

        let old = std::mem::replace(&mut self.cells, fresh);
        let removed: Vec<CellId> = old.iter().map(|c| c.id()).collect();
        drop(old);

        info!("Replaced {} cell(s) with {}", removed.len(), added.len());
        let count = added.len();
        self.emit(SessionEvent::CellsReplaced { removed, added });
        if count == 0 {
            self.emit(SessionEvent::Notice(
                "[INFO] The response contained no commands.".to_string(),
            ));
        }
        count
    }
}
