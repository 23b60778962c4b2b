//! Built-in commands known to the shell at compile time.
//!
//! Builtins are parsed with [`argh`] (`FromArgs`) and executed directly
//! in-process, never spawned. Dispatch goes through a list of factories;
//! a factory that does not recognize the name returns `None`, which tells
//! the session to fall through to external execution.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};

use crate::command::Command;
use crate::env;
use crate::line_source::LineSource;

/// What the session loop should do after a handled builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading input.
    Continue,
    /// Tear the session down and terminate with success status.
    Exit,
}

/// A builtin command: a name plus an argh-parsed argument structure.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd".
    fn name() -> &'static str;

    /// Execute the command. `history` is the line-source collaborator,
    /// read by the `history` builtin and ignored by the others.
    fn execute(self, stdout: &mut dyn Write, history: &dyn LineSource) -> Result<Outcome>;
}

/// Object-safe wrapper over [`BuiltinCommand`] instances.
pub(crate) trait ExecutableBuiltin {
    fn execute(self: Box<Self>, stdout: &mut dyn Write, history: &dyn LineSource)
    -> Result<Outcome>;
}

impl<T: BuiltinCommand> ExecutableBuiltin for T {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        history: &dyn LineSource,
    ) -> Result<Outcome> {
        match T::execute(*self, stdout, history) {
            Ok(outcome) => Ok(outcome),
            // A builtin that failed internally still counts as handled;
            // the failure is the user's problem, not the session's.
            Err(err) => {
                eprintln!("{err:#}");
                Ok(Outcome::Continue)
            }
        }
    }
}

/// Factory allowing creation of [`ExecutableBuiltin`] instances by name.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Tries to create a builtin from a name and its arguments.
pub(crate) trait BuiltinFactory {
    /// `None` when the name is not this factory's builtin.
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableBuiltin>>;
}

impl<T: BuiltinCommand + 'static> BuiltinFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableBuiltin>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

/// Fallback for recognized builtins with bad arguments: report the argh
/// message (help text to stdout, errors to stderr) and carry on.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableBuiltin for InvalidArgs {
    fn execute(
        self: Box<Self>,
        stdout: &mut dyn Write,
        _history: &dyn LineSource,
    ) -> Result<Outcome> {
        if self.is_error {
            eprintln!("{}", self.output);
        } else {
            writeln!(stdout, "{}", self.output)?;
        }
        Ok(Outcome::Continue)
    }
}

/// The builtin set the session starts with: `exit`, `cd`, `history`.
pub(crate) fn default_builtins() -> Vec<Box<dyn BuiltinFactory>> {
    vec![
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<History>::default()),
    ]
}

/// Try `command` against the builtin factories.
///
/// Returns `Some` when the command was recognized and handled, whether or
/// not the handled action itself succeeded; `None` tells the caller to
/// fall through to external execution.
pub(crate) fn dispatch(
    factories: &[Box<dyn BuiltinFactory>],
    command: &Command,
    stdout: &mut dyn Write,
    history: &dyn LineSource,
) -> Option<Outcome> {
    let name = command.name()?;
    let args: Vec<&str> = command.args().iter().map(String::as_str).collect();
    for factory in factories {
        if let Some(builtin) = factory.try_create(name, &args) {
            return Some(match builtin.execute(stdout, history) {
                Ok(outcome) => outcome,
                Err(err) => {
                    eprintln!("{name}: {err:#}");
                    Outcome::Continue
                }
            });
        }
    }
    None
}

#[derive(FromArgs)]
/// Leave the shell, restoring the terminal on the way out.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, _history: &dyn LineSource) -> Result<Outcome> {
        Ok(Outcome::Exit)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; defaults to the home directory ($HOME,
    /// falling back to the passwd entry) when omitted
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, _history: &dyn LineSource) -> Result<Outcome> {
        // Only an omitted target means "home"; an explicit empty string
        // is a target like any other and fails below with ENOENT.
        let target = match self.target {
            Some(t) => PathBuf::from(t),
            None => env::home_dir().context("cd: cannot determine home directory")?,
        };
        // On failure the working directory is left exactly as it was.
        std::env::set_current_dir(&target)
            .with_context(|| format!("cd: {}", target.display()))?;
        Ok(Outcome::Continue)
    }
}

#[derive(FromArgs)]
/// List previously entered command lines, oldest first.
pub struct History {}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Write, history: &dyn LineSource) -> Result<Outcome> {
        for (index, line) in history.history().iter().enumerate() {
            writeln!(stdout, "{:5}  {}", index + 1, line)?;
        }
        Ok(Outcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_source::ScriptedSource;
    use std::env as stdenv;
    use std::fs;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX.get_or_init(|| Mutex::new(())).lock().unwrap()
    }

    fn empty_source() -> ScriptedSource {
        ScriptedSource::new(Vec::<String>::new())
    }

    #[test]
    fn exit_signals_session_teardown() {
        let cmd = Exit {};
        let mut out = Vec::<u8>::new();
        let outcome = cmd.execute(&mut out, &empty_source()).unwrap();
        assert_eq!(outcome, Outcome::Exit);
        assert!(out.is_empty());
    }

    #[test]
    fn cd_to_absolute_path_changes_directory() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let temp = tempfile::tempdir().unwrap();
        let canonical = fs::canonicalize(temp.path()).unwrap();

        let cmd = Cd {
            target: Some(canonical.to_string_lossy().to_string()),
        };
        let res = cmd.execute(&mut Vec::<u8>::new(), &empty_source());
        assert!(res.is_ok());
        assert_eq!(
            fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(),
            canonical
        );

        stdenv::set_current_dir(orig).unwrap();
    }

    #[test]
    fn cd_nonexistent_path_errors_and_keeps_cwd() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        let cmd = Cd {
            target: Some(format!("/no-such-dir-{}", std::process::id())),
        };
        let res = cmd.execute(&mut Vec::<u8>::new(), &empty_source());
        assert!(res.is_err());
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn cd_empty_target_errors_and_keeps_cwd() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();

        // An explicit "" is not the same as no target at all.
        let cmd = Cd {
            target: Some(String::new()),
        };
        let res = cmd.execute(&mut Vec::<u8>::new(), &empty_source());
        assert!(res.is_err());
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn cd_without_target_goes_home() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let home = match crate::env::home_dir() {
            Some(dir) if dir.exists() => dir,
            _ => return, // no resolvable home in this environment
        };

        let cmd = Cd { target: None };
        let res = cmd.execute(&mut Vec::<u8>::new(), &empty_source());
        assert!(res.is_ok());
        assert_eq!(
            fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(),
            fs::canonicalize(home).unwrap()
        );

        stdenv::set_current_dir(orig).unwrap();
    }

    #[test]
    fn history_prints_one_based_indices() {
        let mut source = empty_source();
        source.record("echo hi");
        source.record("ls -la");

        let mut out = Vec::<u8>::new();
        History {}.execute(&mut out, &source).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "    1  echo hi\n    2  ls -la\n");
    }

    #[test]
    fn empty_history_prints_nothing_and_succeeds() {
        let mut out = Vec::<u8>::new();
        let outcome = History {}.execute(&mut out, &empty_source()).unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert!(out.is_empty());
    }

    #[test]
    fn dispatch_falls_through_for_unknown_names() {
        let factories = default_builtins();
        let cmd = Command::parse("no-such-builtin --flag");
        let handled = dispatch(&factories, &cmd, &mut Vec::<u8>::new(), &empty_source());
        assert!(handled.is_none());
    }

    #[test]
    fn dispatch_handles_builtin_with_bad_args() {
        let factories = default_builtins();
        // `exit` takes no arguments; the parse failure still counts as
        // handled, so the session must not try to exec "exit".
        let cmd = Command::parse("exit now please");
        let handled = dispatch(&factories, &cmd, &mut Vec::<u8>::new(), &empty_source());
        assert_eq!(handled, Some(Outcome::Continue));
    }

    #[test]
    fn dispatch_recognizes_exit() {
        let factories = default_builtins();
        let cmd = Command::parse("exit");
        let handled = dispatch(&factories, &cmd, &mut Vec::<u8>::new(), &empty_source());
        assert_eq!(handled, Some(Outcome::Exit));
    }
}
