//! Launching external programs as foreground children.
//!
//! The launcher resolves the executable through `PATH`, spawns it in its
//! own process group, hands it the terminal, blocks until it finishes and
//! takes the terminal back. At most one external command runs at a time;
//! there is no job table and no backgrounding.

use std::borrow::Cow;
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::command::{Command, ExitCode};
use crate::terminal::Terminal;

/// Execute `command` as an external program and block until it completes.
///
/// An unresolvable name is an error the session reports and survives; the
/// child's exit status is collected but never propagated to the shell's
/// own exit status.
pub fn run(command: &Command, terminal: &Terminal) -> Result<ExitCode> {
    let name = command.name().context("cannot launch an empty command")?;
    let search_paths = env::var_os("PATH").unwrap_or_default();
    let executable = find_command_path(&search_paths, Path::new(name))
        .with_context(|| format!("{name}: command not found"))?
        .into_owned();
    tracing::debug!(executable = %executable.display(), "launching foreground command");
    spawn_foreground(&executable, command.args(), terminal)
}

/// Foreground execution protocol, parent side.
///
/// Both parent and child call `setpgid` for the new group so the handoff
/// does not depend on which of the two is scheduled first. The terminal is
/// reclaimed unconditionally once the wait returns.
#[cfg(unix)]
fn spawn_foreground(executable: &Path, args: &[String], terminal: &Terminal) -> Result<ExitCode> {
    use std::os::unix::process::CommandExt;

    use nix::errno::Errno;
    use nix::sys::signal::SigHandler;
    use nix::unistd::{self, Pid};

    use crate::terminal::{JOB_CONTROL_SIGNALS, set_disposition, stdin_fd};

    let interactive = terminal.interactive();
    let mut cmd = std::process::Command::new(executable);
    cmd.args(args);

    // SAFETY: the closure runs between fork and exec and performs only
    // async-signal-safe syscalls (setpgid, tcsetpgrp, sigaction).
    unsafe {
        cmd.pre_exec(move || {
            let pid = unistd::getpid();
            unistd::setpgid(pid, pid).map_err(errno_to_io)?;
            if interactive {
                unistd::tcsetpgrp(stdin_fd(), pid).map_err(errno_to_io)?;
            }
            // The shell ignores these while idle; a foreground child must
            // not inherit that suppression.
            for sig in JOB_CONTROL_SIGNALS {
                set_disposition(sig, SigHandler::SigDfl).map_err(errno_to_io)?;
            }
            Ok(())
        });
    }

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            // An exec failure happens after the child has already moved
            // itself into its own group and taken the terminal; the
            // foreground must come back to the shell even though the
            // child never started.
            if let Err(reclaim_err) = terminal.reclaim() {
                tracing::warn!("terminal reclaim failed: {reclaim_err}");
            }
            return Err(err)
                .with_context(|| format!("failed to start {}", executable.display()));
        }
    };
    let child_pid = Pid::from_raw(child.id() as i32);

    // Mirror of the child's own setpgid. EACCES means the child already
    // exec'd (and so already moved itself); ESRCH means it is already gone.
    match unistd::setpgid(child_pid, child_pid) {
        Ok(()) | Err(Errno::EACCES) | Err(Errno::ESRCH) => {}
        Err(err) => tracing::warn!("setpgid for child {child_pid} failed: {err}"),
    }
    if let Err(err) = terminal.give_terminal_to(child_pid) {
        tracing::warn!("terminal handoff failed: {err}");
    }

    let status = wait_for(child_pid);

    // The terminal comes back to the shell no matter how the child ended.
    if let Err(err) = terminal.reclaim() {
        tracing::warn!("terminal reclaim failed: {err}");
    }
    Ok(status)
}

#[cfg(not(unix))]
fn spawn_foreground(executable: &Path, args: &[String], _terminal: &Terminal) -> Result<ExitCode> {
    let status = std::process::Command::new(executable)
        .args(args)
        .status()
        .with_context(|| format!("failed to start {}", executable.display()))?;
    Ok(status.code().unwrap_or(1))
}

/// Block until `pid` exits or dies to a signal, retrying on EINTR.
#[cfg(unix)]
fn wait_for(pid: nix::unistd::Pid) -> ExitCode {
    use nix::errno::Errno;
    use nix::sys::wait::{WaitStatus, waitpid};

    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => return code,
            Ok(WaitStatus::Signaled(_, sig, _)) => return 128 + sig as i32,
            Ok(_) => continue,
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return 0,
            Err(err) => {
                tracing::error!("waitpid failed: {err}");
                return 1;
            }
        }
    }
}

#[cfg(unix)]
fn errno_to_io(errno: nix::errno::Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(errno as i32)
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returned if it exists.
/// - `./foo` on Unix, or any `./`-prefixed path elsewhere: returned if it
///   exists relative to the current directory.
/// - Single path component (no separators): each directory in
///   `search_paths` (PATH) is tried in order, first existing match wins.
/// - Relative path with multiple components (e.g. `bin/sh`): checked
///   against the current directory.
/// - Empty path: `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => None,
        (Some(component), None) => {
            find_in_path(search_paths, component.as_os_str()).map(Cow::Owned)
        }
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in env::split_paths(search_paths) {
        let path = dir.join(cmd);
        if let Some(path) = find_by_path(&path) {
            return Some(path.to_owned());
        }
    }
    None
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn osstr(s: &str) -> &OsStr {
        OsStr::new(s)
    }

    #[test]
    #[cfg(unix)]
    fn absolute_existing_path_resolves() {
        let path = Path::new("/bin/sh");
        let found = find_command_path(osstr("/bin"), path).expect("/bin/sh should exist");
        assert_eq!(found.as_ref(), path);
    }

    #[test]
    #[cfg(unix)]
    fn absolute_missing_path_is_none() {
        let res = find_command_path(osstr("/bin"), Path::new("/bin/no-such-program"));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn single_component_found_via_path_search() {
        let found =
            find_command_path(osstr("/bin"), Path::new("sh")).expect("'sh' should be in /bin");
        assert!(found.as_ref().starts_with("/bin"));
        assert!(found.as_ref().ends_with("sh"));
    }

    #[test]
    #[cfg(unix)]
    fn single_component_missing_from_path_is_none() {
        let res = find_command_path(osstr("/bin"), Path::new("no-such-program"));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn empty_path_is_none() {
        let res = find_command_path(osstr("/bin"), Path::new(""));
        assert!(res.is_none());
    }

    #[test]
    #[cfg(unix)]
    fn valid_command_runs_to_completion() {
        let cmd = Command::parse("/bin/sh -c true");
        let code = run(&cmd, &Terminal::non_interactive()).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    #[cfg(unix)]
    fn failing_child_exit_code_is_collected() {
        let cmd = Command::parse("/bin/sh -c false");
        let code = run(&cmd, &Terminal::non_interactive()).unwrap();
        assert_ne!(code, 0);
    }

    #[test]
    #[cfg(unix)]
    fn exec_failure_on_non_executable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-program");
        std::fs::write(&path, "plain data").unwrap();

        // Resolves (the file exists) but exec is refused, so the failure
        // surfaces after the child-side setup has already run.
        let cmd = Command::parse(&path.display().to_string());
        let err = run(&cmd, &Terminal::non_interactive()).unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }

    #[test]
    fn nonexistent_command_reports_not_found() {
        let cmd = Command::parse("definitely-no-such-command-xyz");
        let err = run(&cmd, &Terminal::non_interactive()).unwrap_err();
        assert!(err.to_string().contains("command not found"));
    }
}
