//! A small interactive command-line shell.
//!
//! The shell reads a line, splits it into a command and arguments,
//! recognizes a few built-in commands (`exit`, `cd`, `history`) and
//! otherwise launches an external program as a foreground child, handing
//! it exclusive control of the terminal until it finishes.
//!
//! The interesting part is the execution pipeline: tokenization in
//! [`lexer`], builtin dispatch in `builtin`, and foreground spawning with
//! process-group and terminal handoff in `external`/`terminal`. The
//! [`session::Shell`] type wires these together around a pluggable line
//! source, so the whole loop is testable without a terminal.

mod builtin;
pub mod command;
pub mod env;
mod external;
pub mod lexer;
pub mod line_source;
pub mod session;
pub mod terminal;

pub use builtin::Outcome;
pub use session::Shell;
