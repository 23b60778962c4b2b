use crate::lexer;

/// Conventional process exit code: 0 for success, non-zero for failure.
pub type ExitCode = i32;

/// A parsed command line: an ordered, owned sequence of argument strings.
///
/// The first element names the program or builtin; the rest are its
/// arguments. A `Command` may be empty, which denotes "no command entered"
/// and is treated as a no-op by the session loop. Instances are produced
/// fresh for each input line and dropped at the end of the iteration, so
/// the argument storage is released exactly once by ownership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    argv: Vec<String>,
}

impl Command {
    /// Parse one raw input line: trim surrounding whitespace, then split
    /// into whitespace-delimited tokens.
    pub fn parse(line: &str) -> Self {
        let trimmed = lexer::trim_whitespace(line);
        Self {
            argv: lexer::split_into_tokens(trimmed),
        }
    }

    /// True when the line contained no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.argv.is_empty()
    }

    /// The program or builtin name, when present.
    pub fn name(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// Arguments after the name. Empty for an empty command.
    pub fn args(&self) -> &[String] {
        if self.argv.is_empty() {
            &[]
        } else {
            &self.argv[1..]
        }
    }

    /// The full argument vector, name included.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}
