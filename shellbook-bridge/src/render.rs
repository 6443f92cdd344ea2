//! Text rendering of cells for the line-oriented front-end.
//!
//! Everything here produces [`OutputLine`]s; only [`print_lines`] touches
//! the terminal.

use chrono::Local;
use crossterm::style::Stylize;
use shellbook_core::{CellState, CommandCell};

/// Semantic line classification for coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Normal,
    /// Failed output; shown in red.
    Error,
    Success,
    Info,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub kind: LineKind,
}

impl OutputLine {
    pub fn normal(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: LineKind::Normal }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: LineKind::Error }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: LineKind::Info }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: LineKind::Success }
    }

    pub fn muted(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: LineKind::Muted }
    }
}

pub fn state_icon(state: CellState) -> &'static str {
    match state {
        CellState::Idle => "○",
        CellState::Running => "⏳",
        CellState::Completed => "✅",
        CellState::Failed => "❌",
    }
}

/// One-line summary: `[2] ❌ ls asdf`.
pub fn cell_header(position: usize, cell: &CommandCell) -> OutputLine {
    let text = if cell.command_text().trim().is_empty() {
        "<empty>"
    } else {
        cell.command_text()
    };
    OutputLine::normal(format!("[{}] {} {}", position, state_icon(cell.state()), text))
}

/// Header plus the latest result and AI suggestion, indented.
pub fn cell_lines(position: usize, cell: &CommandCell) -> Vec<OutputLine> {
    let mut lines = vec![cell_header(position, cell)];

    if cell.state() == CellState::Running {
        lines.push(OutputLine::muted(format!("    [Running]: {}", cell.command_text().trim())));
        return lines;
    }

    if let Some(result) = cell.last_result() {
        for line in result.display.lines() {
            let text = format!("    {}", line);
            lines.push(if result.is_error {
                OutputLine::error(text)
            } else {
                OutputLine::normal(text)
            });
        }
        let finished = result.finished_at.with_timezone(&Local).format("%H:%M:%S");
        lines.push(OutputLine::muted(format!(
            "    exit {} · {} ms · {} · {}",
            result.exit_code,
            result.duration_ms,
            finished,
            result.cwd.display()
        )));
        if result.is_error && cell.ai_suggestion().is_none() {
            lines.push(OutputLine::info(format!(
                "    💡 !fix {} asks the model for a corrected command",
                position
            )));
        }
    }

    if let Some(suggestion) = cell.ai_suggestion() {
        lines.push(OutputLine::info("    🧠 Suggested fix:"));
        for line in suggestion.lines() {
            lines.push(OutputLine::info(format!("      {}", line)));
        }
    }

    lines
}

/// Write lines to stdout, colored by kind.
pub fn print_lines(lines: &[OutputLine]) {
    for line in lines {
        match line.kind {
            LineKind::Normal => println!("{}", line.text),
            LineKind::Error => println!("{}", line.text.as_str().red()),
            LineKind::Success => println!("{}", line.text.as_str().green()),
            LineKind::Info => println!("{}", line.text.as_str().cyan()),
            LineKind::Muted => println!("{}", line.text.as_str().dark_grey()),
        }
    }
}
