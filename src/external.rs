//! Launching programs that are not builtins.
//!
//! Resolution mirrors what a typical shell does: absolute and multi-component
//! paths are taken as-is, single-component names are searched along `PATH`.
//! The spawned child inherits the interpreter's stdio and runs to a terminal
//! state before control returns to the dispatch loop.

use crate::command::ExitCode;
use crate::env::Environment;
use anyhow::{Context, Result, anyhow};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

/// Resolve `name`, spawn it with `args`, and block until the child reaches a
/// terminal state.
///
/// The returned code is the child's exit status, or `128 + signal` when it
/// was killed by a signal. A stopped child is not terminal; `wait` keeps
/// waiting through job-control stops, and reaps the child so no zombie
/// remains. Spawn failure is an error confined to the parent.
pub fn launch(env: &Environment, name: &str, args: &[&str]) -> Result<ExitCode> {
    let search_paths = env.get_var("PATH").unwrap_or_default();
    let executable = find_command_path(OsStr::new(&search_paths), Path::new(name))
        .ok_or_else(|| anyhow!("command not found: {name}"))?;

    let mut child = std::process::Command::new(executable.as_ref())
        .args(args)
        .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(&env.current_dir)
        .spawn()
        .with_context(|| format!("failed to launch '{name}'"))?;

    let exit_status = child
        .wait()
        .with_context(|| format!("failed to wait for '{name}'"))?;
    Ok(classify(exit_status))
}

/// Map a terminal [`ExitStatus`] to a single exit code.
pub fn classify(exit_status: ExitStatus) -> ExitCode {
    match exit_status.code() {
        Some(code) => code,
        None => terminated_by_signal(exit_status),
    }
}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
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
        (Some(x), None) => find_in_path(search_paths, x.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    for dir in std::env::split_paths(search_paths) {
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
