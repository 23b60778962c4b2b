//! Environment lookups the shell needs at startup and for `cd`.

use std::env as stdenv;
use std::path::PathBuf;

/// Environment variable consulted for the interactive prompt string.
pub const PROMPT_VAR: &str = "SHELL_PROMPT";

/// Prompt used when [`PROMPT_VAR`] is unset.
pub const DEFAULT_PROMPT: &str = "shell> ";

/// Resolve the prompt string from the named environment variable, falling
/// back to [`DEFAULT_PROMPT`] when it is unset or empty.
pub fn get_prompt(var: &str) -> String {
    match stdenv::var(var) {
        Ok(value) if !value.is_empty() => value,
        _ => DEFAULT_PROMPT.to_string(),
    }
}

/// The invoking user's home directory.
///
/// `$HOME` wins when set; otherwise the user database is consulted by uid,
/// the same fallback `cd` without arguments has always used in shells.
pub fn home_dir() -> Option<PathBuf> {
    if let Ok(home) = stdenv::var("HOME") {
        if !home.is_empty() {
            return Some(PathBuf::from(home));
        }
    }
    passwd_home()
}

#[cfg(unix)]
fn passwd_home() -> Option<PathBuf> {
    use nix::unistd::{User, getuid};
    User::from_uid(getuid()).ok().flatten().map(|user| user.dir)
}

#[cfg(not(unix))]
fn passwd_home() -> Option<PathBuf> {
    None
}
