//! A small interactive command-line interpreter.
//!
//! The crate is built around a single read–tokenize–dispatch–execute loop:
//! a line is read from the terminal, split into whitespace-delimited tokens,
//! and the first token either selects one of the built-in commands or names
//! an external program that is spawned and waited on synchronously. The two
//! substantial pieces are the process launcher in [`mod@external`] (spawn,
//! block until a terminal state, classify exit vs. signal) and the recursive
//! policy-driven directory remover in [`mod@remove`] behind `rm -r`.
//!
//! The main entry point is [`Interpreter`], which wires the builtin registry
//! to the loop. The [`command`] and [`env`] modules expose the traits and
//! types needed to implement additional commands.

pub mod builtin;
pub mod command;
pub mod env;
pub mod external;
mod interpreter;
pub mod lexer;
pub mod remove;

/// Re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
