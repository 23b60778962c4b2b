//! Lexical analysis for the shell: whitespace trimming and tokenization.
//!
//! The grammar here is deliberately tiny: a command line is a sequence of
//! whitespace-delimited words, nothing more. Quoting, escaping, globbing and
//! operators are out of scope for this shell.

/// Return a view of `line` with leading and trailing whitespace removed.
///
/// Internal whitespace is untouched. An all-whitespace input becomes the
/// empty string. This borrows from the input and never allocates.
pub fn trim_whitespace(line: &str) -> &str {
    line.trim()
}

/// Fallback token cap used when the platform limit cannot be queried.
const DEFAULT_MAX_TOKENS: usize = 4096;

/// Upper bound on the number of tokens in a single command line.
///
/// Derived from `sysconf(ARG_MAX)` the same way the kernel bounds an exec
/// argument list; a line that somehow exceeds it is truncated rather than
/// rejected.
pub fn max_tokens() -> usize {
    #[cfg(unix)]
    {
        use nix::unistd::{SysconfVar, sysconf};
        if let Ok(Some(arg_max)) = sysconf(SysconfVar::ARG_MAX) {
            return (arg_max / 2) as usize;
        }
    }
    DEFAULT_MAX_TOKENS
}

/// Split a command line into an ordered sequence of whitespace-delimited
/// tokens.
///
/// Runs of whitespace act as a single delimiter, so consecutive separators
/// never produce empty tokens. An empty or all-whitespace input yields an
/// empty vector, which callers treat as "no command entered": a no-op, not
/// an error. The token count is capped at [`max_tokens`]; anything beyond
/// the cap is dropped.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    split_with_cap(line, max_tokens())
}

/// [`split_into_tokens`] with an explicit token cap.
fn split_with_cap(line: &str, cap: usize) -> Vec<String> {
    line.split_whitespace()
        .take(cap)
        .map(str::to_owned)
        .collect()
}
