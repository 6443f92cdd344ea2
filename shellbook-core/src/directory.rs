//! Session-wide working directory.
//!
//! One [`DirectoryContext`] exists per session and every cell holds an `Arc`
//! to it. Only a successful `cd` mutates it; the host process's own working
//! directory is never touched, the executor is handed this path instead.

use std::borrow::Cow;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    #[error("cd: {0}: No such file or directory")]
    NotFound(String),

    #[error("cd: {0}: Not a directory")]
    NotADirectory(String),

    #[error("cd: {0}: Permission denied")]
    PermissionDenied(String),

    #[error("cd: {0}")]
    Other(String),
}

impl DirectoryError {
    fn from_io(target: &str, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(target.to_string()),
            io::ErrorKind::NotADirectory => Self::NotADirectory(target.to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(target.to_string()),
            _ => Self::Other(format!("{}: {}", target, err)),
        }
    }
}

#[derive(Debug)]
struct DirState {
    current: PathBuf,
    previous: Option<PathBuf>,
}

#[derive(Debug)]
pub struct DirectoryContext {
    state: RwLock<DirState>,
}

impl DirectoryContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            state: RwLock::new(DirState {
                current: path.into(),
                previous: None,
            }),
        }
    }

    /// Start from the process's working directory.
    pub fn from_process() -> io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn current_path(&self) -> PathBuf {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.current.clone()
    }

    pub fn previous_path(&self) -> Option<PathBuf> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.previous.clone()
    }

    /// Prompt label: the current path, verbatim.
    pub fn prompt(&self) -> String {
        self.current_path().display().to_string()
    }

    /// Change directory with POSIX `cd` semantics. The argument is expanded
    /// the way `sh` would (`$VAR`, `${VAR}`, `~`, `~user`, quotes, backslash
    /// escapes, a single glob match, trailing comments); `-L`, `-P` and `--`
    /// are honoured. On error nothing changes.
    pub fn change_directory(&self, target: &str) -> Result<PathBuf, DirectoryError> {
        // Held for the whole resolution so concurrent changes serialize.
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let args = CdArgs::parse(target)?;
        let (requested, label) = match args.operand.as_deref() {
            None => (home_or_err()?, "~".to_string()),
            Some("-") => (
                state
                    .previous
                    .clone()
                    .ok_or_else(|| DirectoryError::Other("OLDPWD not set".into()))?,
                "-".to_string(),
            ),
            Some(word) => {
                let path = if args.tilde {
                    expand_tilde(word)?
                } else if args.glob {
                    expand_glob(&state.current, word)?
                } else {
                    PathBuf::from(word)
                };
                (state.current.join(path), word.to_string())
            }
        };

        let resolved = if args.physical {
            validate(&requested, &label)?;
            requested
                .canonicalize()
                .map_err(|e| DirectoryError::from_io(&label, &e))?
        } else {
            let logical = normalize_logical(&requested);
            validate(&logical, &label)?;
            logical
        };

        debug!("cd {} -> {}", label, resolved.display());
        let old = std::mem::replace(&mut state.current, resolved.clone());
        state.previous = Some(old);
        info!("Working directory is now {}", resolved.display());

        Ok(resolved)
    }
}

/// A `cd` argument list after expansion and quote removal.
#[derive(Debug, Default)]
struct CdArgs {
    operand: Option<String>,
    /// `-P`: resolve symlinks.
    physical: bool,
    /// The operand began with an unquoted `~`.
    tilde: bool,
    /// The operand holds unquoted glob characters.
    glob: bool,
}

impl CdArgs {
    fn parse(raw: &str) -> Result<Self, DirectoryError> {
        let raw = raw.trim();
        let quoted = raw.contains(['\'', '"', '\\']);

        // Single quotes and `\$` suppress parameter expansion.
        let expanded: Cow<'_, str> = if raw.contains('\'') || raw.contains("\\$") {
            Cow::Borrowed(raw)
        } else {
            shellexpand::env_with_context_no_errors(raw, |var| {
                Some(std::env::var(var).unwrap_or_default())
            })
        };

        let words = shlex::split(&expanded)
            .ok_or_else(|| DirectoryError::Other("unterminated quote".into()))?;

        let mut args = CdArgs::default();
        let mut rest = words.into_iter().peekable();
        while let Some(flag) = rest.next_if(|w| w.len() > 1 && w.starts_with('-')) {
            match flag.as_str() {
                "--" => break,
                "-L" => args.physical = false,
                "-P" => args.physical = true,
                other => {
                    return Err(DirectoryError::Other(format!("{}: invalid option", other)));
                }
            }
        }

        args.operand = rest.next().filter(|w| !w.is_empty());
        if rest.next().is_some() {
            return Err(DirectoryError::Other("too many arguments".into()));
        }
        if let Some(word) = &args.operand {
            let unquoted_tilde = !raw.contains("'~") && !raw.contains("\"~") && !raw.contains("\\~");
            args.tilde = word.starts_with('~') && unquoted_tilde;
            args.glob = !quoted && word.contains(['*', '?', '[']);
        }
        Ok(args)
    }
}

fn home_or_err() -> Result<PathBuf, DirectoryError> {
    home_dir().ok_or_else(|| DirectoryError::Other("HOME not set".into()))
}

/// `~`, `~/x`, `~user` and `~user/x`.
fn expand_tilde(word: &str) -> Result<PathBuf, DirectoryError> {
    let body = &word[1..];
    let (user, rest) = body.split_once('/').unwrap_or((body, ""));
    let base = if user.is_empty() {
        home_or_err()?
    } else {
        user_home(user).ok_or_else(|| DirectoryError::NotFound(word.to_string()))?
    };
    Ok(if rest.is_empty() { base } else { base.join(rest) })
}

#[cfg(unix)]
fn user_home(name: &str) -> Option<PathBuf> {
    nix::unistd::User::from_name(name).ok().flatten().map(|u| u.dir)
}

#[cfg(not(unix))]
fn user_home(_name: &str) -> Option<PathBuf> {
    None
}

/// Pathname expansion against `cwd`. No match keeps the word literal, as
/// `sh` does; more than one match is too many arguments for `cd`.
fn expand_glob(cwd: &Path, word: &str) -> Result<PathBuf, DirectoryError> {
    let pattern = if Path::new(word).is_absolute() {
        word.to_string()
    } else {
        format!("{}/{}", glob::Pattern::escape(&cwd.to_string_lossy()), word)
    };
    let Ok(paths) = glob::glob(&pattern) else {
        return Ok(PathBuf::from(word));
    };
    let mut matches = paths.filter_map(Result::ok);
    match (matches.next(), matches.next()) {
        (None, _) => Ok(PathBuf::from(word)),
        (Some(only), None) => Ok(only),
        (Some(_), Some(_)) => Err(DirectoryError::Other("too many arguments".into())),
    }
}

/// Resolve `.` and `..` lexically, keeping symlinked components as typed.
fn normalize_logical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `/..` is `/`.
                if !out.pop() && !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Check that `path` is an enterable directory.
fn validate(path: &Path, label: &str) -> Result<(), DirectoryError> {
    let meta = std::fs::metadata(path).map_err(|e| DirectoryError::from_io(label, &e))?;
    if !meta.is_dir() {
        return Err(DirectoryError::NotADirectory(label.to_string()));
    }

    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::unistd::{AccessFlags, access};

        match access(path, AccessFlags::X_OK) {
            Ok(()) => {}
            Err(Errno::EACCES) | Err(Errno::EPERM) => {
                return Err(DirectoryError::PermissionDenied(label.to_string()));
            }
            Err(e) => return Err(DirectoryError::Other(format!("{}: {}", label, e.desc()))),
        }
    }

    Ok(())
}

/// The invoking user's home directory. `$HOME` wins, as it does for `cd`.
pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .or_else(|| directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf()))
}

/// If `command` is a bare `cd` (no pipes, lists or redirections), return its
/// argument. Compound lines such as `cd build && make` go to the shell.
pub fn parse_cd(command: &str) -> Option<&str> {
    let trimmed = command.trim();
    let rest = trimmed.strip_prefix("cd")?;
    if !(rest.is_empty() || rest.starts_with(char::is_whitespace)) {
        return None;
    }
    if rest.contains(['&', ';', '|', '>', '<', '`', '\n']) || rest.contains("$(") {
        return None;
    }
    Some(rest.trim())
}
