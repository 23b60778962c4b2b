//! The shell session: initialization, the read-eval loop, teardown.
//!
//! A session moves through three states. Initialization claims the
//! terminal and resolves the prompt; the running loop reads, parses and
//! dispatches one line at a time; teardown happens by ownership, with the
//! terminal modes restored when the [`Terminal`] drops.

use anyhow::Result;

use crate::builtin::{self, BuiltinFactory, Outcome};
use crate::command::Command;
use crate::env;
use crate::external;
use crate::line_source::{LineSource, ReadOutcome, RustylineSource};
use crate::terminal::Terminal;

/// An interactive shell session.
///
/// Owns the prompt, the terminal state, the line-source collaborator and
/// the builtin set. All session state is explicit here rather than
/// process-global, so tests can run a whole session against a scripted
/// line source and a non-interactive terminal.
pub struct Shell {
    prompt: String,
    terminal: Terminal,
    line_source: Box<dyn LineSource>,
    builtins: Vec<Box<dyn BuiltinFactory>>,
}

impl Shell {
    /// Initialize a session on the real terminal and environment.
    ///
    /// Claims process-group leadership and terminal foreground when stdin
    /// is a terminal; a failure there is fatal to startup. The prompt
    /// comes from `SHELL_PROMPT` with a fixed default.
    pub fn new() -> Result<Self> {
        let terminal = Terminal::init()?;
        let line_source = Box::new(RustylineSource::new()?);
        let prompt = env::get_prompt(env::PROMPT_VAR);
        Ok(Self::with_parts(prompt, terminal, line_source))
    }

    /// Assemble a session from explicit parts. Tests use this with a
    /// scripted line source.
    pub(crate) fn with_parts(
        prompt: String,
        terminal: Terminal,
        line_source: Box<dyn LineSource>,
    ) -> Self {
        Self {
            prompt,
            terminal,
            line_source,
            builtins: builtin::default_builtins(),
        }
    }

    /// The read-eval loop.
    ///
    /// Runs until `exit` or end-of-input, both of which terminate the
    /// session successfully. Command failures of any kind are reported
    /// and the loop keeps going.
    pub fn repl(&mut self) -> Result<()> {
        loop {
            match self.line_source.next_line(&self.prompt)? {
                // End-of-input is treated exactly like `exit`.
                ReadOutcome::Eof => break,
                // Ctrl-C at the prompt just gets a fresh prompt.
                ReadOutcome::Interrupted => continue,
                ReadOutcome::Line(line) => {
                    if self.eval(&line) == Outcome::Exit {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Evaluate one input line: trim, tokenize, dispatch builtins, else
    /// launch externally.
    pub(crate) fn eval(&mut self, line: &str) -> Outcome {
        let command = Command::parse(line);
        if command.is_empty() {
            // A blank line is a silent no-op, not an error.
            return Outcome::Continue;
        }
        self.line_source.record(crate::lexer::trim_whitespace(line));

        let mut stdout = std::io::stdout();
        if let Some(outcome) = builtin::dispatch(
            &self.builtins,
            &command,
            &mut stdout,
            self.line_source.as_ref(),
        ) {
            return outcome;
        }

        match external::run(&command, &self.terminal) {
            // The child's status is collected but deliberately not
            // surfaced in the prompt or the shell's own exit status.
            Ok(status) => tracing::debug!(status, "foreground command finished"),
            Err(err) => eprintln!("minishell: {err:#}"),
        }
        Outcome::Continue
    }
}
