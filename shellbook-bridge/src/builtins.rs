//! Built-in `!` commands.
//!
//! Anything not starting with `!` is a plain-language request for the
//! model. Cell numbers are 1-based, as shown by `!list`.

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    /// Free text for the translate flow.
    Request(String),
    Builtin(Builtin),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builtin {
    Help,
    Add(String),
    /// Append a cell and run it straight away.
    Sh(String),
    Run(usize),
    RunAll,
    Edit(usize, String),
    Fix(usize),
    Delete(usize),
    List,
    Pwd,
    Clear,
    Exit,
    /// Known command, bad arguments. Carries the usage line.
    Usage(&'static str),
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if !line.starts_with('!') {
        return Input::Request(line.to_string());
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let builtin = match name {
        "!help" | "!?" => Builtin::Help,
        "!exit" | "!quit" => Builtin::Exit,
        "!clear" | "!cls" => Builtin::Clear,
        "!list" | "!ls" => Builtin::List,
        "!pwd" => Builtin::Pwd,
        "!runall" => Builtin::RunAll,
        "!add" => match rest {
            "" => Builtin::Usage("!add <command>"),
            cmd => Builtin::Add(cmd.to_string()),
        },
        "!sh" => match rest {
            "" => Builtin::Usage("!sh <command>"),
            cmd => Builtin::Sh(cmd.to_string()),
        },
        "!run" => index_arg(rest).map_or(Builtin::Usage("!run <n>"), Builtin::Run),
        "!fix" => index_arg(rest).map_or(Builtin::Usage("!fix <n>"), Builtin::Fix),
        "!del" | "!rm" => index_arg(rest).map_or(Builtin::Usage("!del <n>"), Builtin::Delete),
        "!edit" => {
            let (n, cmd) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            match (index_arg(n), cmd.trim()) {
                (Some(n), cmd) if !cmd.is_empty() => Builtin::Edit(n, cmd.to_string()),
                _ => Builtin::Usage("!edit <n> <command>"),
            }
        }
        other => Builtin::Unknown(other.to_string()),
    };
    Input::Builtin(builtin)
}

/// A 1-based cell number. Zero is rejected.
fn index_arg(arg: &str) -> Option<usize> {
    arg.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

pub fn help_text() -> Vec<String> {
    [
        "╔══════════════════════════════════════════════════════════╗",
        "║          Shellbook Built-in Commands                     ║",
        "╚══════════════════════════════════════════════════════════╝",
        "",
        "  <anything else>     Ask the model; its commands replace the cells",
        "",
        "  !add <command>      Append a cell",
        "  !sh <command>       Append a cell and run it",
        "  !run <n>            Run cell n",
        "  !runall             Run every cell",
        "  !edit <n> <command> Replace the text of cell n",
        "  !fix <n>            Ask the model to fix failed cell n",
        "  !del <n>            Delete cell n",
        "  !list, !ls          Show all cells",
        "",
        "  !pwd                Show the working directory",
        "  !clear, !cls        Clear the screen",
        "  !help               Show this help",
        "  !exit, !quit        Leave Shellbook",
        "",
        "  `cd` cells change the notebook's directory; every later run uses it.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
