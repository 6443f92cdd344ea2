//! The line-oriented host around a [`Session`].
//!
//! `handle_line` applies one line of input; session events are turned into
//! [`OutputLine`]s that the caller prints with [`crate::render::print_lines`].

use shellbook_core::{CellId, RunStatus, Session, SessionError, SessionEvent};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::builtins::{self, Builtin, Input};
use crate::render::{self, OutputLine};

/// Whether the main loop keeps reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct ShellbookApp {
    session: Session,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    output: Vec<OutputLine>,
}

impl ShellbookApp {
    pub fn new(session: Session, events: mpsc::UnboundedReceiver<SessionEvent>) -> Self {
        Self {
            session,
            events,
            output: Vec::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Take everything rendered since the last call.
    pub fn take_output(&mut self) -> Vec<OutputLine> {
        std::mem::take(&mut self.output)
    }

    pub fn prompt(&self) -> String {
        self.session.prompt()
    }

    /// Wait for the next finished execution and render it. Pends while
    /// nothing is running.
    pub async fn next_completion(&mut self) -> Option<CellId> {
        let id = self.session.next_completion().await;
        self.pump_events();
        id
    }

    pub async fn handle_line(&mut self, line: &str) -> Flow {
        let flow = match builtins::parse_input(line) {
            Input::Empty => Flow::Continue,
            Input::Request(text) => {
                self.output.push(OutputLine::muted("🧠 Asking the model..."));
                if let Err(e) = self.session.submit_request(&text).await {
                    self.report(e);
                }
                Flow::Continue
            }
            Input::Builtin(builtin) => self.dispatch(builtin).await,
        };
        // Runs that finished while we were busy.
        self.session.drain_completions();
        self.pump_events();
        flow
    }

    async fn dispatch(&mut self, builtin: Builtin) -> Flow {
        debug!("Builtin: {:?}", builtin);
        match builtin {
            Builtin::Help => {
                self.output.extend(builtins::help_text().into_iter().map(OutputLine::normal));
            }
            Builtin::Exit => return Flow::Exit,
            Builtin::Clear => {
                // Only the screen; the cells stay.
                self.output.push(OutputLine::normal("\x1b[2J\x1b[H"));
            }
            Builtin::Pwd => {
                let cwd = self.session.directory().current_path();
                self.output.push(OutputLine::normal(cwd.display().to_string()));
            }
            Builtin::List => self.list(),
            Builtin::Add(cmd) => {
                self.session.add_cell(cmd);
            }
            Builtin::Sh(cmd) => {
                let id = self.session.add_cell(cmd);
                self.run(id);
            }
            Builtin::Run(n) => {
                if let Some(id) = self.cell_at(n) {
                    self.run(id);
                }
            }
            Builtin::RunAll => {
                if self.session.cells().is_empty() {
                    self.output.push(OutputLine::info("[INFO] Nothing to run."));
                }
                for (id, status) in self.session.run_all() {
                    self.run_feedback(id, status);
                }
            }
            Builtin::Edit(n, cmd) => {
                if let Some(id) = self.cell_at(n)
                    && let Err(e) = self.session.edit_cell(id, cmd)
                {
                    self.report(e);
                }
            }
            Builtin::Delete(n) => {
                if let Some(id) = self.cell_at(n)
                    && let Err(e) = self.session.delete_cell(id)
                {
                    self.report(e);
                }
            }
            Builtin::Fix(n) => {
                if let Some(id) = self.cell_at(n) {
                    self.output.push(OutputLine::muted("🧠 Asking the model for a fix..."));
                    if let Err(e) = self.session.request_ai_fix(id).await {
                        self.report(e);
                    }
                }
            }
            Builtin::Usage(usage) => {
                self.output.push(OutputLine::error(format!("Usage: {}", usage)));
            }
            Builtin::Unknown(name) => {
                self.output.push(OutputLine::error(format!(
                    "Unknown command: {} (try !help)",
                    name
                )));
            }
        }
        Flow::Continue
    }

    fn run(&mut self, id: CellId) {
        match self.session.run_cell(id) {
            Ok(status) => self.run_feedback(id, status),
            Err(e) => self.report(e),
        }
    }

    fn run_feedback(&mut self, id: CellId, status: RunStatus) {
        if status == RunStatus::AlreadyRunning {
            let n = self.session.position(id).map_or(0, |i| i + 1);
            self.output
                .push(OutputLine::info(format!("[INFO] Cell {} is already running.", n)));
        }
    }

    /// Resolve a 1-based cell number, reporting when it is out of range.
    fn cell_at(&mut self, n: usize) -> Option<CellId> {
        let id = n
            .checked_sub(1)
            .and_then(|i| self.session.cells().get(i))
            .map(|c| c.id());
        if id.is_none() {
            self.output.push(OutputLine::error(format!(
                "No cell {} ({} cell(s) in the notebook)",
                n,
                self.session.cells().len()
            )));
        }
        id
    }

    fn list(&mut self) {
        if self.session.cells().is_empty() {
            self.output
                .push(OutputLine::info("[INFO] No cells. Ask for something or use !add."));
            return;
        }
        let lines: Vec<OutputLine> = self
            .session
            .cells()
            .iter()
            .enumerate()
            .flat_map(|(i, cell)| render::cell_lines(i + 1, cell))
            .collect();
        self.output.extend(lines);
    }

    fn report(&mut self, error: SessionError) {
        warn!("{}", error);
        self.output.push(OutputLine::error(format!("[Error]: {}", error)));
    }

    /// Translate pending session events into output.
    pub fn pump_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.render_event(event);
        }
    }

    fn render_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::CellAdded { id, index } => {
                if let Some(cell) = self.session.cell(id) {
                    let header = render::cell_header(index + 1, cell);
                    self.output.push(header);
                }
            }
            SessionEvent::CellUpdated { id } => {
                // Cells deleted since the event was queued are skipped.
                if let (Some(i), Some(cell)) = (self.session.position(id), self.session.cell(id)) {
                    let lines = render::cell_lines(i + 1, cell);
                    self.output.extend(lines);
                }
            }
            SessionEvent::CellRemoved { .. } => {
                self.output.push(OutputLine::muted(format!(
                    "Deleted. {} cell(s) left.",
                    self.session.cells().len()
                )));
            }
            SessionEvent::CellsReplaced { added, .. } => {
                if added.is_empty() {
                    return;
                }
                self.output
                    .push(OutputLine::success(format!("✨ {} new cell(s):", added.len())));
                self.list();
                self.output.push(OutputLine::muted("Use !run <n> or !runall."));
            }
            SessionEvent::DirectoryChanged(path) => {
                debug!("Directory is now {}", path.display());
            }
            SessionEvent::Notice(text) => self.output.push(OutputLine::info(text)),
        }
    }
}
