use crate::env::Environment;
use anyhow::Result;
use std::io::{Read, Write};

/// Exit classification of an external process: the code it exited with,
/// or `128 + signal` when it was terminated by a signal.
pub type ExitCode = i32;

/// Loop-continuation status returned by every dispatched command.
///
/// Only the `exit` builtin (and end-of-input on the reader side) produce
/// [`Flow::Exit`]; everything else, including failed commands, continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// A command instance ready to run against the given IO streams and environment.
pub trait ExecutableCommand {
    fn execute(
        self: Box<Self>,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Flow>;
}

/// Creates command instances by name.
///
/// `try_create` returns `None` when the name does not match, so a registry
/// can probe an ordered list of factories until one claims the command.
pub trait CommandFactory {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
