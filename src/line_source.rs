//! The line-source collaborator: where raw input lines come from.
//!
//! Line editing and history storage are deliberately outside the shell
//! core. The session only sees this trait, so tests can drive the loop
//! with a scripted source instead of a terminal.

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// What a single read attempt produced.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete input line, without the trailing newline.
    Line(String),
    /// End of input. The session treats this exactly like `exit`.
    Eof,
    /// The read was interrupted at the prompt (Ctrl-C); show a fresh one.
    Interrupted,
}

/// Source of input lines plus the history store behind the `history`
/// builtin.
pub trait LineSource {
    /// Display `prompt` and obtain one line of input.
    fn next_line(&mut self, prompt: &str) -> Result<ReadOutcome>;

    /// Append a line to the history.
    fn record(&mut self, line: &str);

    /// Recorded lines, oldest first. In-memory only, per session.
    fn history(&self) -> &[String];
}

/// [`LineSource`] backed by rustyline: line editing, arrow-key history
/// recall, the usual interactive niceties.
pub struct RustylineSource {
    editor: DefaultEditor,
    // Mirror of the editor's history so the `history` builtin can list
    // entries without going through the editor's search API.
    entries: Vec<String>,
}

impl RustylineSource {
    pub fn new() -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            entries: Vec::new(),
        })
    }
}

impl LineSource for RustylineSource {
    fn next_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(err) => Err(err.into()),
        }
    }

    fn record(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            tracing::debug!("failed to record history entry: {err}");
        }
        self.entries.push(line.to_string());
    }

    fn history(&self) -> &[String] {
        &self.entries
    }
}

/// A canned sequence of lines for tests; reads past the end report `Eof`.
#[cfg(test)]
pub(crate) struct ScriptedSource {
    lines: std::collections::VecDeque<String>,
    entries: Vec<String>,
}

#[cfg(test)]
impl ScriptedSource {
    pub(crate) fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            entries: Vec::new(),
        }
    }
}

#[cfg(test)]
impl LineSource for ScriptedSource {
    fn next_line(&mut self, _prompt: &str) -> Result<ReadOutcome> {
        match self.lines.pop_front() {
            Some(line) => Ok(ReadOutcome::Line(line)),
            None => Ok(ReadOutcome::Eof),
        }
    }

    fn record(&mut self, line: &str) {
        self.entries.push(line.to_string());
    }

    fn history(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_source_yields_lines_then_eof() {
        let mut source = ScriptedSource::new(["one", "two"]);
        assert_eq!(
            source.next_line("> ").unwrap(),
            ReadOutcome::Line("one".into())
        );
        assert_eq!(
            source.next_line("> ").unwrap(),
            ReadOutcome::Line("two".into())
        );
        assert_eq!(source.next_line("> ").unwrap(), ReadOutcome::Eof);
    }

    #[test]
    fn recorded_lines_show_up_in_history_in_order() {
        let mut source = ScriptedSource::new(Vec::<String>::new());
        source.record("first");
        source.record("second");
        assert_eq!(source.history(), ["first", "second"]);
    }
}
