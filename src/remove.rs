//! Recursive, policy-driven directory removal — the engine behind `rm -r`.
//!
//! Removal walks the tree by ordinary call-stack recursion, each call owning
//! its own joined path. Confirmation is a small injected capability
//! ([`Prompter`]) so interactive runs and scripted tests share one code path.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

/// The four independent `rm` flags, parsed once per invocation and copied
/// unchanged through every recursive call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemovePolicy {
    pub recursive: bool,
    pub force: bool,
    pub verbose: bool,
    pub interactive: bool,
}

/// Aggregate result of one `remove_tree` call.
///
/// No per-entry error list is retained; callers only learn whether the
/// subtree is fully gone, partially gone, or was never opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every entry and the directory itself were removed.
    Complete,
    /// Some entries were skipped, declined, or failed; the root remains.
    Partial,
    /// The root could not be opened as a directory.
    Failed,
}

impl Outcome {
    pub fn is_complete(self) -> bool {
        matches!(self, Outcome::Complete)
    }
}

/// Synchronous yes/no confirmation.
///
/// `confirm` writes the question to `out` and blocks for an answer;
/// unrecognized input re-prompts until a case-insensitive y/yes/n/no
/// is given. An exhausted input stream counts as "no".
pub trait Prompter {
    fn confirm(&mut self, out: &mut dyn Write, prompt: &str) -> io::Result<bool>;
}

/// Production [`Prompter`] reading answers line-by-line from a stream.
pub struct LinePrompter<'a> {
    input: &'a mut dyn Read,
}

impl<'a> LinePrompter<'a> {
    pub fn new(input: &'a mut dyn Read) -> Self {
        Self { input }
    }
}

impl Prompter for LinePrompter<'_> {
    fn confirm(&mut self, out: &mut dyn Write, prompt: &str) -> io::Result<bool> {
        loop {
            write!(out, "{prompt} ")?;
            out.flush()?;
            let Some(answer) = read_answer(&mut *self.input)? else {
                return Ok(false);
            };
            match answer.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => {}
            }
        }
    }
}

/// Read one line from `input`, without the trailing newline.
///
/// Returns `None` once the stream is exhausted before any byte is read,
/// so callers never spin on end-of-input.
fn read_answer(input: &mut dyn Read) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    let mut saw_any = false;
    loop {
        if input.read(&mut byte)? == 0 {
            break;
        }
        saw_any = true;
        if byte[0] == b'\n' {
            break;
        }
        buf.push(byte[0]);
    }
    if !saw_any {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Remove the directory at `path` and everything below it, under `policy`.
///
/// Entry classification follows the metadata query (symlinks are seen as
/// their target type). Interactive confirmation applies to every regular
/// file and once more to each directory before it is removed; a declined
/// entry is skipped without counting as an error, but blocks full success.
///
/// Sibling enumeration short-circuits at the first entry whose removal
/// *fails*; whatever entries remain unvisited are left untouched. Declined
/// entries do not short-circuit.
///
/// `Err` is returned only for IO failures on `out` or the prompter;
/// filesystem failures fold into the [`Outcome`].
pub fn remove_tree(
    path: &Path,
    policy: RemovePolicy,
    prompter: &mut dyn Prompter,
    out: &mut dyn Write,
) -> io::Result<Outcome> {
    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(_) => return Ok(Outcome::Failed),
    };

    let mut declined = false;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => return Ok(Outcome::Partial),
        };
        let child = path.join(entry.file_name());

        // An entry that vanished between enumeration and this query is a
        // metadata failure like any other.
        let meta = match fs::metadata(&child) {
            Ok(meta) => meta,
            Err(_) => return Ok(Outcome::Partial),
        };

        if meta.is_dir() {
            let sub = remove_tree(&child, policy, prompter, out)?;
            if !sub.is_complete() {
                return Ok(Outcome::Partial);
            }
        } else {
            if policy.interactive {
                let prompt = format!("rm: remove file '{}'?", child.display());
                if !prompter.confirm(out, &prompt)? {
                    declined = true;
                    continue;
                }
            }
            if fs::remove_file(&child).is_err() {
                return Ok(Outcome::Partial);
            }
            if policy.verbose {
                writeln!(out, "removed file '{}'", child.display())?;
            }
        }
    }

    if declined {
        return Ok(Outcome::Partial);
    }

    if policy.interactive {
        let prompt = format!("rm: remove directory '{}'?", path.display());
        if !prompter.confirm(out, &prompt)? {
            return Ok(Outcome::Partial);
        }
    }
    if fs::remove_dir(path).is_err() {
        return Ok(Outcome::Partial);
    }
    if policy.verbose {
        writeln!(out, "removed directory '{}'", path.display())?;
    }
    Ok(Outcome::Complete)
}
