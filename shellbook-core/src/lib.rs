pub mod cell;
pub mod directory;
pub mod executor;
pub mod runtime;
pub mod session;

// Re-export the main types so users can just use `shellbook_core::Session`
pub use cell::{CellId, CellResult, CellState, CommandCell};
pub use directory::{DirectoryContext, DirectoryError};
pub use executor::{CommandExecutor, ExecutionResult, ShellExecutor};
pub use runtime::parser::CommandParser;
pub use session::{RunStatus, Session, SessionError};

use std::path::PathBuf;

/// The event stream from a session. A renderer listens to this to stay in
/// lock-step with the cell collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    CellAdded { id: CellId, index: usize },
    /// State, text, result or suggestion of a cell changed.
    CellUpdated { id: CellId },
    CellRemoved { id: CellId },
    /// The whole collection was swapped in one step.
    CellsReplaced { removed: Vec<CellId>, added: Vec<CellId> },
    DirectoryChanged(PathBuf),
    Notice(String),
}
