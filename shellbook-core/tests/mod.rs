use shellbook_core::cell::{CellError, EMPTY_COMMAND_NOTICE, RunStart};
use shellbook_core::directory::{self, DirectoryContext, DirectoryError};
use shellbook_core::executor::{CommandExecutor, ExecutionResult, NO_OUTPUT_MARKER, ShellExecutor};
use shellbook_core::{CellResult, CellState, CommandCell, CommandParser};

use std::path::PathBuf;
use std::sync::Arc;

fn canonical(p: impl Into<PathBuf>) -> PathBuf {
    p.into().canonicalize().unwrap()
}

// ============================================================================
// CommandParser Tests
// ============================================================================

#[test]
fn test_parse_single_block_skips_comments() {
    let md = "```bash\necho hello\n# a comment\nls -la\n```\n";
    assert_eq!(CommandParser::parse(md), vec!["echo hello", "ls -la"]);
}

#[test]
fn test_parse_no_block_is_empty() {
    assert!(CommandParser::parse("Just run ls, it's easy.").is_empty());
    assert!(CommandParser::parse("").is_empty());
}

#[test]
fn test_parse_ignores_other_languages() {
    let md = "```python\nprint('hi')\n```\n```bash\nls\n```";
    assert_eq!(CommandParser::parse(md), vec!["ls"]);
}

#[test]
fn test_parse_multiple_blocks_keep_order() {
    let md = "\
Intro text.

```bash
# 1. update
sudo apt update
sudo apt install python3-pip -y  # Ensure pip is installed
```

Some prose in between.

```bash
   pipreqs . --encoding utf-8 --force

```
";
    assert_eq!(
        CommandParser::parse(md),
        vec![
            "sudo apt update",
            "sudo apt install python3-pip -y  # Ensure pip is installed",
            "pipreqs . --encoding utf-8 --force",
        ]
    );
}

#[test]
fn test_parse_strips_leading_whitespace_only() {
    let md = "```bash\n    echo  spaced  \n```";
    assert_eq!(CommandParser::parse(md), vec!["echo  spaced  "]);
}

#[test]
fn test_parse_indented_comment_skipped() {
    let md = "```bash\n  # indented comment\nwhoami\n```";
    assert_eq!(CommandParser::parse(md), vec!["whoami"]);
}

#[test]
fn test_parse_crlf_line_endings() {
    let md = "```bash\r\nls\r\npwd\r\n```\r\n";
    assert_eq!(CommandParser::parse(md), vec!["ls", "pwd"]);
}

#[test]
fn test_parse_unterminated_block_still_yields() {
    let md = "**Command:**\n```bash\ndf -h";
    assert_eq!(CommandParser::parse(md), vec!["df -h"]);
}

// ============================================================================
// ExecutionResult Tests
// ============================================================================

#[test]
fn test_execution_result_no_output_marker() {
    let r = ExecutionResult::default();
    assert!(!r.is_error());
    assert_eq!(r.display_text(), NO_OUTPUT_MARKER);
}

#[test]
fn test_execution_result_stdout_only() {
    let r = ExecutionResult {
        stdout: "hello\n".to_string(),
        stderr: String::new(),
        exit_code: 0,
    };
    assert!(!r.is_error());
    assert_eq!(r.display_text(), "[STDOUT]:\nhello");
}

#[test]
fn test_execution_result_stderr_counts_as_error() {
    let r = ExecutionResult {
        stdout: String::new(),
        stderr: "warning: deprecated\n".to_string(),
        exit_code: 0,
    };
    assert!(r.is_error());
    assert_eq!(r.display_text(), "[STDERR]:\nwarning: deprecated");
}

#[test]
fn test_execution_result_exit_code_counts_as_error() {
    let r = ExecutionResult {
        stdout: "partial\n".to_string(),
        stderr: "ls: cannot access 'asdf'\n".to_string(),
        exit_code: 2,
    };
    assert!(r.is_error());
    assert_eq!(
        r.display_text(),
        "[STDOUT]:\npartial\n[STDERR]:\nls: cannot access 'asdf'\n\n[Exit Code: 2]"
    );
}

#[test]
fn test_execution_result_silent_failure() {
    let r = ExecutionResult {
        exit_code: 1,
        ..Default::default()
    };
    assert!(r.is_error());
    assert_eq!(r.display_text(), "[Exit Code: 1]");
}

#[test]
fn test_spawn_failure_result() {
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such shell");
    let r = ExecutionResult::spawn_failure(&err);
    assert_eq!(r.exit_code, -1);
    assert!(r.is_error());
    assert!(r.stderr.contains("[Execution Error]"));
}

// ============================================================================
// ShellExecutor Tests
// ============================================================================

#[cfg(unix)]
#[tokio::test]
async fn test_shell_executor_echo() {
    let dir = tempfile::tempdir().unwrap();
    let r = ShellExecutor::new().execute("echo shell_test", dir.path()).await;
    assert_eq!(r.stdout, "shell_test\n");
    assert_eq!(r.exit_code, 0);
    assert!(!r.is_error());
}

#[cfg(unix)]
#[tokio::test]
async fn test_shell_executor_pipes_and_redirects() {
    let dir = tempfile::tempdir().unwrap();
    let exec = ShellExecutor::new();
    let r = exec
        .execute("printf 'b\\na\\n' | sort > out.txt && cat out.txt", dir.path())
        .await;
    assert_eq!(r.stdout, "a\nb\n");
    assert!(dir.path().join("out.txt").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_shell_executor_runs_in_given_directory() {
    let dir = tempfile::tempdir().unwrap();
    let r = ShellExecutor::new().execute("pwd -P", dir.path()).await;
    assert_eq!(PathBuf::from(r.stdout.trim()), canonical(dir.path()));
}

#[cfg(unix)]
#[tokio::test]
async fn test_shell_executor_nonzero_exit_is_data() {
    let dir = tempfile::tempdir().unwrap();
    let r = ShellExecutor::new()
        .execute("echo oops >&2; exit 3", dir.path())
        .await;
    assert_eq!(r.exit_code, 3);
    assert_eq!(r.stderr, "oops\n");
    assert!(r.is_error());
}

#[cfg(unix)]
#[tokio::test]
async fn test_shell_executor_does_not_read_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let r = ShellExecutor::new().execute("cat", dir.path()).await;
    assert_eq!(r.exit_code, 0);
    assert_eq!(r.display_text(), NO_OUTPUT_MARKER);
}

#[tokio::test]
async fn test_shell_executor_spawn_failure_never_panics() {
    let dir = tempfile::tempdir().unwrap();
    let exec = ShellExecutor::with_shell("/definitely/not/a/shell", "-c");
    let r = exec.execute("echo hi", dir.path()).await;
    assert_eq!(r.exit_code, -1);
    assert!(r.stderr.contains("[Execution Error]"));
}

#[tokio::test]
async fn test_shell_executor_missing_cwd_is_reported() {
    let exec = ShellExecutor::new();
    let r = exec
        .execute("echo hi", std::path::Path::new("/nonexistent-xyz"))
        .await;
    assert!(r.is_error());
}

// ============================================================================
// parse_cd Tests
// ============================================================================

#[test]
fn test_parse_cd_variants() {
    assert_eq!(directory::parse_cd("cd"), Some(""));
    assert_eq!(directory::parse_cd("cd /tmp"), Some("/tmp"));
    assert_eq!(directory::parse_cd("  cd   ~  "), Some("~"));
    assert_eq!(directory::parse_cd("cd \"My Docs\""), Some("\"My Docs\""));
}

#[test]
fn test_parse_cd_rejects_non_cd() {
    assert_eq!(directory::parse_cd("ls"), None);
    assert_eq!(directory::parse_cd("cdrom"), None);
    assert_eq!(directory::parse_cd("echo cd"), None);
}

#[test]
fn test_parse_cd_leaves_compound_lines_to_shell() {
    assert_eq!(directory::parse_cd("cd build && make"), None);
    assert_eq!(directory::parse_cd("cd /tmp; ls"), None);
    assert_eq!(directory::parse_cd("cd $(mktemp -d)"), None);
}

// ============================================================================
// DirectoryContext Tests
// ============================================================================

#[test]
fn test_directory_from_process() {
    let ctx = DirectoryContext::from_process().unwrap();
    assert_eq!(ctx.current_path(), std::env::current_dir().unwrap());
}

#[test]
fn test_prompt_is_current_path_verbatim() {
    let ctx = DirectoryContext::new("/some/where");
    assert_eq!(ctx.prompt(), "/some/where");
}

#[test]
fn test_cd_absolute() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = DirectoryContext::new("/");
    let path = ctx.change_directory(dir.path().to_str().unwrap()).unwrap();
    assert_eq!(path, canonical(dir.path()));
    assert_eq!(ctx.current_path(), canonical(dir.path()));
    assert_eq!(ctx.prompt(), canonical(dir.path()).display().to_string());
}

#[test]
fn test_cd_relative_resolves_against_current() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let ctx = DirectoryContext::new(canonical(dir.path()));
    ctx.change_directory("sub").unwrap();
    assert_eq!(ctx.current_path(), canonical(dir.path().join("sub")));
    ctx.change_directory("..").unwrap();
    assert_eq!(ctx.current_path(), canonical(dir.path()));
}

#[test]
fn test_cd_quoted_path_with_space() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("My Docs")).unwrap();
    let ctx = DirectoryContext::new(canonical(dir.path()));
    ctx.change_directory("\"My Docs\"").unwrap();
    assert_eq!(ctx.current_path(), canonical(dir.path().join("My Docs")));
}

#[test]
fn test_cd_home_and_bare_cd_agree() {
    let Some(home) = directory::home_dir() else {
        return;
    };
    let ctx = DirectoryContext::new("/");
    let a = ctx.change_directory("~").unwrap();
    ctx.change_directory("/").unwrap();
    let b = ctx.change_directory("").unwrap();
    assert_eq!(a, b);
    assert_eq!(a, home);
}

#[test]
fn test_cd_nonexistent_is_not_found_and_unchanged() {
    let ctx = DirectoryContext::new("/");
    let before = ctx.current_path();
    let err = ctx.change_directory("/nonexistent-xyz").unwrap_err();
    assert_eq!(err, DirectoryError::NotFound("/nonexistent-xyz".to_string()));
    assert_eq!(err.to_string(), "cd: /nonexistent-xyz: No such file or directory");
    assert_eq!(ctx.current_path(), before);
}

#[test]
fn test_cd_into_file_is_not_a_directory() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "x").unwrap();
    let ctx = DirectoryContext::new(canonical(dir.path()));
    let err = ctx.change_directory("notes.txt").unwrap_err();
    assert!(matches!(err, DirectoryError::NotADirectory(_)));
    assert_eq!(ctx.current_path(), canonical(dir.path()));
}

#[cfg(unix)]
#[test]
fn test_cd_permission_denied() {
    use std::os::unix::fs::PermissionsExt;

    if nix::unistd::geteuid().is_root() {
        // root bypasses directory permissions
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let locked = dir.path().join("locked");
    std::fs::create_dir(&locked).unwrap();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

    let ctx = DirectoryContext::new(canonical(dir.path()));
    let err = ctx.change_directory("locked").unwrap_err();
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(err, DirectoryError::PermissionDenied(_)));
    assert_eq!(ctx.current_path(), canonical(dir.path()));
}

#[test]
fn test_cd_dash_returns_to_previous() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let ctx = DirectoryContext::new(canonical(a.path()));

    let err = ctx.change_directory("-").unwrap_err();
    assert!(matches!(err, DirectoryError::Other(_)));

    ctx.change_directory(b.path().to_str().unwrap()).unwrap();
    assert_eq!(ctx.previous_path(), Some(canonical(a.path())));
    ctx.change_directory("-").unwrap();
    assert_eq!(ctx.current_path(), canonical(a.path()));
}

// ============================================================================
// cd Argument Expansion Tests
// ============================================================================

fn cd_line(ctx: &DirectoryContext, line: &str) -> Result<PathBuf, DirectoryError> {
    ctx.change_directory(directory::parse_cd(line).unwrap())
}

#[test]
fn test_cd_expands_home_variable() {
    let Some(home) = directory::home_dir() else {
        return;
    };
    let ctx = DirectoryContext::new("/");
    assert_eq!(cd_line(&ctx, "cd $HOME").unwrap(), home);
    ctx.change_directory("/").unwrap();
    assert_eq!(cd_line(&ctx, "cd ${HOME}").unwrap(), home);
    ctx.change_directory("/").unwrap();
    assert_eq!(cd_line(&ctx, "cd \"$HOME\"").unwrap(), home);
}

#[test]
fn test_cd_variable_with_suffix() {
    let Some(home) = directory::home_dir() else {
        return;
    };
    let ctx = DirectoryContext::new("/");
    assert_eq!(cd_line(&ctx, "cd $HOME/.").unwrap(), home);
}

#[test]
fn test_cd_single_quotes_block_expansion() {
    let ctx = DirectoryContext::new("/");
    let err = cd_line(&ctx, "cd '$HOME'").unwrap_err();
    assert_eq!(err, DirectoryError::NotFound("$HOME".to_string()));
    assert_eq!(ctx.current_path(), PathBuf::from("/"));
}

#[test]
fn test_cd_unset_variable_goes_home() {
    let Some(home) = directory::home_dir() else {
        return;
    };
    let ctx = DirectoryContext::new("/");
    assert_eq!(cd_line(&ctx, "cd $SHELLBOOK_SURELY_UNSET_VAR").unwrap(), home);
}

#[test]
fn test_cd_backslash_escaped_space() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("a b")).unwrap();
    let ctx = DirectoryContext::new(canonical(dir.path()));
    cd_line(&ctx, "cd a\\ b").unwrap();
    assert_eq!(ctx.current_path(), canonical(dir.path().join("a b")));
}

#[test]
fn test_cd_ignores_trailing_comment() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let ctx = DirectoryContext::new(canonical(dir.path()));
    cd_line(&ctx, "cd sub # into the build dir").unwrap();
    assert_eq!(ctx.current_path(), canonical(dir.path().join("sub")));
}

#[test]
fn test_cd_too_many_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = DirectoryContext::new(canonical(dir.path()));
    let err = cd_line(&ctx, "cd one two").unwrap_err();
    assert_eq!(err.to_string(), "cd: too many arguments");
    assert_eq!(ctx.current_path(), canonical(dir.path()));
}

#[test]
fn test_cd_double_dash_and_options() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    let ctx = DirectoryContext::new(canonical(dir.path()));
    cd_line(&ctx, "cd -- sub").unwrap();
    assert_eq!(ctx.current_path(), canonical(dir.path().join("sub")));

    let err = cd_line(&ctx, "cd -x ..").unwrap_err();
    assert!(matches!(err, DirectoryError::Other(_)));
}

#[test]
fn test_cd_glob_single_match() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("project-alpha")).unwrap();
    let ctx = DirectoryContext::new(canonical(dir.path()));
    cd_line(&ctx, "cd proj*").unwrap();
    assert_eq!(ctx.current_path(), canonical(dir.path().join("project-alpha")));
}

#[test]
fn test_cd_glob_many_matches_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("build-a")).unwrap();
    std::fs::create_dir(dir.path().join("build-b")).unwrap();
    let ctx = DirectoryContext::new(canonical(dir.path()));
    let err = cd_line(&ctx, "cd build-*").unwrap_err();
    assert_eq!(err.to_string(), "cd: too many arguments");
}

#[cfg(unix)]
#[test]
fn test_cd_tilde_user() {
    use nix::unistd::{User, getuid};

    let Ok(Some(me)) = User::from_uid(getuid()) else {
        return;
    };
    let ctx = DirectoryContext::new("/");
    let Ok(path) = cd_line(&ctx, &format!("cd ~{}", me.name)) else {
        // account without an existing home directory
        return;
    };
    assert_eq!(path, me.dir);
}

#[cfg(unix)]
#[test]
fn test_cd_keeps_symlinks_logical_unless_physical() {
    let dir = tempfile::tempdir().unwrap();
    let root = canonical(dir.path());
    std::fs::create_dir(root.join("real")).unwrap();
    std::os::unix::fs::symlink(root.join("real"), root.join("link")).unwrap();

    let ctx = DirectoryContext::new(root.clone());
    cd_line(&ctx, "cd link").unwrap();
    assert_eq!(ctx.prompt(), root.join("link").display().to_string());

    cd_line(&ctx, "cd ..").unwrap();
    assert_eq!(ctx.current_path(), root);

    cd_line(&ctx, "cd -P link").unwrap();
    assert_eq!(ctx.current_path(), root.join("real"));
}

// ============================================================================
// CommandCell Tests
// ============================================================================

fn cell_in(text: &str, dir: &std::path::Path) -> CommandCell {
    CommandCell::new(text, Arc::new(DirectoryContext::new(canonical(dir))))
}

#[test]
fn test_cell_starts_idle() {
    let dir = tempfile::tempdir().unwrap();
    let cell = cell_in("ls", dir.path());
    assert_eq!(cell.state(), CellState::Idle);
    assert!(cell.last_result().is_none());
    assert!(cell.ai_suggestion().is_none());
    assert_eq!(cell.prompt(), canonical(dir.path()).display().to_string());
}

#[test]
fn test_cell_empty_command_does_not_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut cell = cell_in("   ", dir.path());
    assert_eq!(cell.begin_run(), RunStart::Empty);
    assert_eq!(cell.state(), CellState::Idle);
    assert_eq!(EMPTY_COMMAND_NOTICE, "[INFO] No command entered.");
}

#[test]
fn test_cell_begin_run_issues_ticket_with_exact_text() {
    let dir = tempfile::tempdir().unwrap();
    let mut cell = cell_in(" echo hi | wc -c ", dir.path());
    match cell.begin_run() {
        RunStart::Dispatch(ticket) => {
            assert_eq!(ticket.command, " echo hi | wc -c ");
            assert_eq!(ticket.cwd, canonical(dir.path()));
            assert_eq!(ticket.cell_id, cell.id());
        }
        other => panic!("Expected Dispatch, got {:?}", other),
    }
    assert_eq!(cell.state(), CellState::Running);
}

#[test]
fn test_cell_second_run_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mut cell = cell_in("sleep 1", dir.path());
    assert!(matches!(cell.begin_run(), RunStart::Dispatch(_)));
    assert_eq!(cell.begin_run(), RunStart::AlreadyRunning);
}

#[test]
fn test_cell_finish_success_and_failure() {
    let dir = tempfile::tempdir().unwrap();
    let cwd = canonical(dir.path());
    let mut cell = cell_in("ls asdf", dir.path());

    let RunStart::Dispatch(ticket) = cell.begin_run() else {
        panic!("Expected Dispatch");
    };
    let failed = ExecutionResult {
        stdout: String::new(),
        stderr: "ls: cannot access 'asdf'\n".to_string(),
        exit_code: 2,
    };
    assert!(cell.finish_run(ticket.run_id, cwd.clone(), failed));
    assert_eq!(cell.state(), CellState::Failed);
    let result = cell.last_result().unwrap();
    assert!(result.is_error);
    assert_eq!(result.exit_code, 2);
    assert_eq!(result.cwd, cwd);

    cell.edit("ls").unwrap();
    let RunStart::Dispatch(ticket) = cell.begin_run() else {
        panic!("Expected Dispatch");
    };
    let ok = ExecutionResult {
        stdout: "a\n".to_string(),
        ..Default::default()
    };
    assert!(cell.finish_run(ticket.run_id, cwd, ok));
    assert_eq!(cell.state(), CellState::Completed);
    assert_eq!(cell.last_result().unwrap().display, "[STDOUT]:\na");
}

#[test]
fn test_cell_rejects_stale_run_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut cell = cell_in("ls", dir.path());
    let RunStart::Dispatch(ticket) = cell.begin_run() else {
        panic!("Expected Dispatch");
    };
    assert!(!cell.finish_run(ticket.run_id + 1, PathBuf::from("/"), ExecutionResult::default()));
    assert_eq!(cell.state(), CellState::Running);
}

#[test]
fn test_cell_finish_when_not_running_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let mut cell = cell_in("ls", dir.path());
    assert!(!cell.finish_run(0, PathBuf::from("/"), ExecutionResult::default()));
    assert_eq!(cell.state(), CellState::Idle);
}

#[test]
fn test_cell_edit_while_running_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut cell = cell_in("ls", dir.path());
    let _ = cell.begin_run();
    assert_eq!(cell.edit("pwd"), Err(CellError::Busy));
    assert_eq!(cell.command_text(), "ls");
}

#[test]
fn test_cell_fix_request_requires_failure() {
    let dir = tempfile::tempdir().unwrap();
    let mut cell = cell_in("ls", dir.path());
    assert_eq!(
        cell.fix_request(),
        Err(CellError::FixUnavailable { state: CellState::Idle })
    );

    let RunStart::Dispatch(ticket) = cell.begin_run() else {
        panic!("Expected Dispatch");
    };
    assert!(matches!(
        cell.fix_request(),
        Err(CellError::FixUnavailable { state: CellState::Running })
    ));

    cell.finish_run(ticket.run_id, PathBuf::from("/"), ExecutionResult::default());
    assert!(matches!(
        cell.fix_request(),
        Err(CellError::FixUnavailable { state: CellState::Completed })
    ));
}

#[test]
fn test_cell_fix_request_payload() {
    let dir = tempfile::tempdir().unwrap();
    let mut cell = cell_in("ls asdf", dir.path());
    let RunStart::Dispatch(ticket) = cell.begin_run() else {
        panic!("Expected Dispatch");
    };
    cell.finish_run(
        ticket.run_id,
        PathBuf::from("/"),
        ExecutionResult {
            stderr: "no such file\n".to_string(),
            exit_code: 2,
            ..Default::default()
        },
    );
    let (command, error) = cell.fix_request().unwrap();
    assert_eq!(command, "ls asdf");
    assert_eq!(error, "[STDERR]:\nno such file\n\n[Exit Code: 2]");
}

#[test]
fn test_cell_cd_failure_is_a_result_not_a_fault() {
    let dir = tempfile::tempdir().unwrap();
    let mut cell = cell_in("cd /nonexistent-xyz", dir.path());
    assert_eq!(
        cell.begin_run(),
        RunStart::Finished {
            directory_changed: None
        }
    );
    assert_eq!(cell.state(), CellState::Failed);
    let result = cell.last_result().unwrap();
    assert_eq!(result.exit_code, 1);
    assert!(result.stderr.contains("No such file or directory"));
    assert_eq!(cell.directory().current_path(), canonical(dir.path()));
    assert!(cell.fix_request().is_ok());
}

#[test]
fn test_cell_cd_success_moves_shared_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("inner")).unwrap();
    let shared = Arc::new(DirectoryContext::new(canonical(dir.path())));
    let mut cd = CommandCell::new("cd inner", shared.clone());
    let other = CommandCell::new("ls", shared.clone());

    let start = cd.begin_run();
    let target = canonical(dir.path().join("inner"));
    assert_eq!(
        start,
        RunStart::Finished {
            directory_changed: Some(target.clone())
        }
    );
    assert_eq!(cd.state(), CellState::Completed);
    assert_eq!(other.prompt(), target.display().to_string());
}

#[test]
fn test_cell_result_serialization() {
    let dir = tempfile::tempdir().unwrap();
    let mut cell = cell_in("echo hi", dir.path());
    let RunStart::Dispatch(ticket) = cell.begin_run() else {
        panic!("Expected Dispatch");
    };
    cell.finish_run(
        ticket.run_id,
        ticket.cwd,
        ExecutionResult {
            stdout: "hi\n".to_string(),
            ..Default::default()
        },
    );
    let json = serde_json::to_string(cell.last_result().unwrap()).unwrap();
    let back: CellResult = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, cell.last_result().unwrap());
}
