//! Commands handled entirely inside the interpreter process.
//!
//! Each builtin is a struct parsed from the argument vector with [`argh`]
//! and executed against the loop's IO streams and [`Environment`]. Argument
//! mistakes are always recoverable: they print a diagnostic and the loop
//! goes back to the prompt.

use crate::command::{CommandFactory, ExecutableCommand, Flow};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::remove::{LinePrompter, Prompter, RemovePolicy, remove_tree};
use anyhow::{Context, Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed
/// directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command using provided IO streams and environment.
    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Flow>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Flow> {
        match BuiltinCommand::execute(*self, stdin, stdout, env) {
            Ok(flow) => Ok(flow),
            Err(err) => {
                eprintln!("lsh: {err:#}");
                Ok(Flow::Continue)
            }
        }
    }
}

/// Stand-in command produced when argh rejects the arguments (or the user
/// asked for `--help`); it prints argh's output and continues the loop.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        if self.is_error {
            eprintln!("{}", self.output);
        } else {
            writeln!(stdout, "{}", self.output)?;
        }
        Ok(Flow::Continue)
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

/// Fixed, ordered name → factory table, built once at startup and never
/// mutated afterwards. Lookup is a case-sensitive exact match.
pub struct Registry {
    factories: Vec<Box<dyn CommandFactory>>,
}

impl Registry {
    /// Registry order; `help` numbers its listing from this table.
    pub const NAMES: [&'static str; 14] = [
        "cd", "ls", "pwd", "echo", "cat", "cp", "mv", "mkdir", "rmdir", "rm", "touch", "chmod",
        "help", "exit",
    ];

    /// The full builtin set, in [`Registry::NAMES`] order.
    pub fn with_default_builtins() -> Self {
        let registry = Self {
            factories: vec![
                Box::new(Factory::<Cd>::default()),
                Box::new(Factory::<Ls>::default()),
                Box::new(Factory::<Pwd>::default()),
                Box::new(Factory::<Echo>::default()),
                Box::new(Factory::<Cat>::default()),
                Box::new(Factory::<Cp>::default()),
                Box::new(Factory::<Mv>::default()),
                Box::new(Factory::<Mkdir>::default()),
                Box::new(Factory::<Rmdir>::default()),
                Box::new(Factory::<Rm>::default()),
                Box::new(Factory::<Touch>::default()),
                Box::new(Factory::<Chmod>::default()),
                Box::new(Factory::<Help>::default()),
                Box::new(Factory::<Exit>::default()),
            ],
        };
        debug_assert_eq!(registry.factories.len(), Self::NAMES.len());
        registry
    }

    pub fn lookup(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        self.factories
            .iter()
            .find_map(|factory| factory.try_create(name, args))
    }

    pub fn count(&self) -> usize {
        self.factories.len()
    }

    pub fn names(&self) -> &'static [&'static str] {
        &Self::NAMES
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Flow> {
        let target = match &self.target {
            Some(t) if !t.is_empty() => PathBuf::from(t),
            _ => {
                if let Some(home) = env.get_var("HOME") {
                    PathBuf::from(home)
                } else {
                    return Err(anyhow!("cd: no target and HOME not set"));
                }
            }
        };

        let new_dir = if target.is_absolute() {
            target
        } else {
            env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: can't canonicalize {}", new_dir.display()))?;

        env::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        env.current_dir = canonical;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// List directory contents.
pub struct Ls {
    #[argh(switch, short = 'a')]
    /// include entries whose names begin with a dot.
    pub all: bool,

    #[argh(switch, short = 'l')]
    /// use a long listing format.
    pub long: bool,

    #[argh(positional)]
    /// directory to list; defaults to the current directory.
    pub dir: Option<String>,
}

#[cfg(unix)]
fn long_entry(name: &str, meta: &fs::Metadata) -> String {
    use chrono::{DateTime, Local};
    use std::os::unix::fs::MetadataExt;
    let mode = meta.mode();
    let mut bits = String::with_capacity(10);
    bits.push(if meta.is_dir() { 'd' } else { '-' });
    for (bit, ch) in [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ] {
        bits.push(if mode & bit != 0 { ch } else { '-' });
    }
    let mtime = meta
        .modified()
        .map(|t| DateTime::<Local>::from(t).format("%b %d %H:%M").to_string())
        .unwrap_or_else(|_| String::from("?"));
    format!(
        "{} {:2} {:5} {:5} {:10} {} {}",
        bits,
        meta.nlink(),
        meta.uid(),
        meta.gid(),
        meta.len(),
        mtime,
        name
    )
}

#[cfg(not(unix))]
fn long_entry(name: &str, _meta: &fs::Metadata) -> String {
    name.to_string()
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        let dir = self.dir.as_deref().unwrap_or(".");
        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("ls: cannot open '{dir}'"))? {
            let entry = entry.with_context(|| format!("ls: cannot read '{dir}'"))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.all && name.starts_with('.') {
                continue;
            }
            names.push(name);
        }
        names.sort();

        for name in names {
            if self.long {
                let path = Path::new(dir).join(&name);
                match fs::metadata(&path) {
                    Ok(meta) => writeln!(stdout, "{}", long_entry(&name, &meta))?,
                    Err(err) => eprintln!("lsh: ls: cannot stat '{}': {err}", path.display()),
                }
            } else {
                writeln!(stdout, "{name}")?;
            }
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Flow> {
        writeln!(stdout, "{}", env.current_dir.to_string_lossy())?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// write the arguments to standard output, separated by spaces.
/// by default, a trailing newline is printed.
pub struct Echo {
    #[argh(switch, short = 'n')]
    /// do not output the trailing newline.
    pub no_newline: bool,

    #[argh(positional, greedy)]
    /// values to print as-is, separated by spaces.
    pub args: Vec<String>,
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        let s = self.args.join(" ");
        if self.no_newline {
            write!(stdout, "{}", s)?;
        } else {
            writeln!(stdout, "{}", s)?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// print file(s) to stdout; with no operands, copy stdin through.
pub struct Cat {
    #[argh(positional, greedy)]
    /// files to concatenate, in order.
    pub files: Vec<String>,
}

impl BuiltinCommand for Cat {
    fn name() -> &'static str {
        "cat"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        if self.files.is_empty() {
            std::io::copy(stdin, stdout)?;
            return Ok(Flow::Continue);
        }
        for fname in self.files {
            let mut f =
                fs::File::open(&fname).with_context(|| format!("cat: cannot open '{fname}'"))?;
            std::io::copy(&mut f, stdout)?;
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// copy a file.
pub struct Cp {
    #[argh(positional)]
    /// source file.
    pub src: String,

    #[argh(positional)]
    /// destination path.
    pub dst: String,
}

impl BuiltinCommand for Cp {
    fn name() -> &'static str {
        "cp"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        fs::copy(&self.src, &self.dst)
            .with_context(|| format!("cp: cannot copy '{}' to '{}'", self.src, self.dst))?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// move (rename) a file or directory.
pub struct Mv {
    #[argh(positional)]
    /// source path.
    pub src: String,

    #[argh(positional)]
    /// destination path.
    pub dst: String,
}

impl BuiltinCommand for Mv {
    fn name() -> &'static str {
        "mv"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        fs::rename(&self.src, &self.dst)
            .with_context(|| format!("mv: cannot move '{}' to '{}'", self.src, self.dst))?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// create a directory.
pub struct Mkdir {
    #[argh(positional)]
    /// directory to create.
    pub dir: String,
}

impl BuiltinCommand for Mkdir {
    fn name() -> &'static str {
        "mkdir"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        fs::create_dir(&self.dir)
            .with_context(|| format!("mkdir: cannot create '{}'", self.dir))?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// remove an empty directory.
pub struct Rmdir {
    #[argh(positional)]
    /// directory to remove; must be empty.
    pub dir: String,
}

impl BuiltinCommand for Rmdir {
    fn name() -> &'static str {
        "rmdir"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        fs::remove_dir(&self.dir)
            .with_context(|| format!("rmdir: cannot remove '{}'", self.dir))?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// remove files; directories only with --recursive.
pub struct Rm {
    #[argh(switch, short = 'r')]
    /// remove directories and their contents recursively.
    pub recursive: bool,

    #[argh(switch, short = 'f')]
    /// ignore nonexistent files and failures, never escalate them to errors.
    pub force: bool,

    #[argh(switch, short = 'v')]
    /// report each removal.
    pub verbose: bool,

    #[argh(switch, short = 'i')]
    /// prompt before every removal.
    pub interactive: bool,

    #[argh(positional, greedy)]
    /// files or directories to remove.
    pub paths: Vec<String>,
}

impl BuiltinCommand for Rm {
    fn name() -> &'static str {
        "rm"
    }

    fn execute(
        self,
        stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        if self.paths.is_empty() {
            return Err(anyhow!("rm: missing file or directory argument"));
        }
        let policy = RemovePolicy {
            recursive: self.recursive,
            force: self.force,
            verbose: self.verbose,
            interactive: self.interactive,
        };
        let mut prompter = LinePrompter::new(stdin);

        for path in &self.paths {
            let p = Path::new(path);
            let meta = match fs::metadata(p) {
                Ok(meta) => meta,
                Err(err) => {
                    if policy.force {
                        continue;
                    }
                    return Err(
                        anyhow::Error::new(err).context(format!("rm: cannot stat '{path}'"))
                    );
                }
            };

            if meta.is_dir() {
                if !policy.recursive {
                    return Err(anyhow!("rm: cannot remove '{path}': Is a directory"));
                }
                let outcome = remove_tree(p, policy, &mut prompter, stdout)?;
                if !outcome.is_complete() && !policy.force {
                    return Err(anyhow!("rm: cannot fully remove directory '{path}'"));
                }
            } else {
                if policy.interactive
                    && !prompter.confirm(stdout, &format!("rm: remove file '{path}'?"))?
                {
                    continue;
                }
                match fs::remove_file(p) {
                    Ok(()) => {
                        if policy.verbose {
                            writeln!(stdout, "removed '{path}'")?;
                        }
                    }
                    Err(err) => {
                        if !policy.force {
                            return Err(anyhow::Error::new(err)
                                .context(format!("rm: cannot remove '{path}'")));
                        }
                    }
                }
            }
        }
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// update a file's modification time, creating it if missing.
pub struct Touch {
    #[argh(positional)]
    /// file to touch.
    pub file: String,
}

impl BuiltinCommand for Touch {
    fn name() -> &'static str {
        "touch"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&self.file)
            .with_context(|| format!("touch: cannot open '{}'", self.file))?;
        file.set_modified(SystemTime::now())
            .with_context(|| format!("touch: cannot update times of '{}'", self.file))?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// change a file's permission bits.
pub struct Chmod {
    #[argh(positional)]
    /// octal mode, e.g. 644.
    pub mode: String,

    #[argh(positional)]
    /// file to change.
    pub file: String,
}

impl BuiltinCommand for Chmod {
    fn name() -> &'static str {
        "chmod"
    }

    #[cfg(unix)]
    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        use std::os::unix::fs::PermissionsExt;
        let mode = u32::from_str_radix(&self.mode, 8)
            .map_err(|_| anyhow!("chmod: invalid mode '{}'", self.mode))?;
        fs::set_permissions(&self.file, fs::Permissions::from_mode(mode))
            .with_context(|| format!("chmod: cannot change mode of '{}'", self.file))?;
        Ok(Flow::Continue)
    }

    #[cfg(not(unix))]
    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        Err(anyhow!("chmod: not supported on this platform"))
    }
}

#[derive(FromArgs)]
/// list the built-in commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        writeln!(stdout, "lsh, a little interactive shell")?;
        writeln!(stdout, "Type program names and arguments, and hit enter to execute.")?;
        writeln!(stdout, "The following are built-in commands:")?;
        for (i, name) in Registry::NAMES.iter().enumerate() {
            writeln!(stdout, "({})  {}", i + 1, name)?;
        }
        writeln!(stdout, "Use the 'man' command for information on other programs.")?;
        Ok(Flow::Continue)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored; accepted so stray arguments do not turn into parse errors.
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _stdin: &mut dyn Read,
        _stdout: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Flow> {
        Ok(Flow::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env as stdenv;
    use std::io::Cursor;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::UNIX_EPOCH;

    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX.get_or_init(|| Mutex::new(())).lock().unwrap()
    }

    fn test_env() -> Environment {
        Environment {
            vars: HashMap::new(),
            current_dir: stdenv::current_dir().unwrap(),
        }
    }

    fn make_unique_temp_dir(tag: &str) -> PathBuf {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("lsh_builtin_{}_{}_{}", tag, std::process::id(), nanos));
        fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn pwd_prints_current_dir() {
        let _lock = lock_current_dir();
        let mut env = test_env();
        let cur = env.current_dir.clone();

        let mut out = Vec::new();
        let flow = Pwd {}
            .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();

        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", cur.to_string_lossy())
        );
    }

    #[test]
    fn echo_with_and_without_newline() {
        let mut env = test_env();

        let mut out1 = Vec::new();
        Echo {
            no_newline: false,
            args: vec!["hello".into(), "world".into()],
        }
        .execute(&mut Cursor::new(Vec::new()), &mut out1, &mut env)
        .unwrap();
        assert_eq!(String::from_utf8(out1).unwrap(), "hello world\n");

        let mut out2 = Vec::new();
        Echo {
            no_newline: true,
            args: vec!["foo".into(), "bar".into()],
        }
        .execute(&mut Cursor::new(Vec::new()), &mut out2, &mut env)
        .unwrap();
        assert_eq!(String::from_utf8(out2).unwrap(), "foo bar");
    }

    #[test]
    fn cd_to_absolute_path_and_back() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("cd_abs");
        let canonical_temp = fs::canonicalize(&temp).unwrap();
        let orig = stdenv::current_dir().unwrap();

        let mut env = test_env();
        let cmd = Cd {
            target: Some(canonical_temp.to_string_lossy().to_string()),
        };
        let res = cmd.execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);

        assert!(res.is_ok());
        assert_eq!(fs::canonicalize(stdenv::current_dir().unwrap()).unwrap(), canonical_temp);
        assert_eq!(env.current_dir, canonical_temp);

        stdenv::set_current_dir(orig).expect("failed to restore cwd");
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn cd_nonexistent_path_errors() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut env = test_env();

        let cmd = Cd {
            target: Some(format!("nonexistent_dir_for_lsh_test_{}", std::process::id())),
        };
        let res = cmd.execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);

        assert!(res.is_err());
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn cat_reads_file_and_stdin() {
        let temp = make_unique_temp_dir("cat");
        let file = temp.join("f");
        fs::write(&file, "hello\nworld\n").unwrap();

        let mut env = test_env();
        let mut out = Vec::new();
        Cat {
            files: vec![file.to_string_lossy().to_string()],
        }
        .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "hello\nworld\n");

        let mut out = Vec::new();
        Cat { files: Vec::new() }
            .execute(&mut Cursor::new(b"from stdin\n".to_vec()), &mut out, &mut env)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "from stdin\n");

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn cp_copies_and_mv_renames() {
        let temp = make_unique_temp_dir("cp_mv");
        let src = temp.join("src");
        let copy = temp.join("copy");
        let moved = temp.join("moved");
        fs::write(&src, "payload").unwrap();

        let mut env = test_env();
        Cp {
            src: src.to_string_lossy().to_string(),
            dst: copy.to_string_lossy().to_string(),
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
        .unwrap();
        assert_eq!(fs::read_to_string(&copy).unwrap(), "payload");

        Mv {
            src: copy.to_string_lossy().to_string(),
            dst: moved.to_string_lossy().to_string(),
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
        .unwrap();
        assert!(!copy.exists());
        assert_eq!(fs::read_to_string(&moved).unwrap(), "payload");

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn mkdir_then_rmdir_round_trip() {
        let temp = make_unique_temp_dir("mkdir");
        let dir = temp.join("fresh");
        let mut env = test_env();

        Mkdir {
            dir: dir.to_string_lossy().to_string(),
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
        .unwrap();
        assert!(dir.is_dir());

        Rmdir {
            dir: dir.to_string_lossy().to_string(),
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
        .unwrap();
        assert!(!dir.exists());

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn touch_creates_missing_file() {
        let temp = make_unique_temp_dir("touch");
        let file = temp.join("new_file");
        let mut env = test_env();

        Touch {
            file: file.to_string_lossy().to_string(),
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
        .unwrap();
        assert!(file.is_file());

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    #[cfg(unix)]
    fn chmod_sets_permission_bits() {
        use std::os::unix::fs::PermissionsExt;
        let temp = make_unique_temp_dir("chmod");
        let file = temp.join("f");
        fs::write(&file, "x").unwrap();
        let mut env = test_env();

        Chmod {
            mode: "600".to_string(),
            file: file.to_string_lossy().to_string(),
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
        .unwrap();

        let mode = fs::metadata(&file).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn chmod_rejects_bad_mode() {
        let mut env = test_env();
        let res = Chmod {
            mode: "9z".to_string(),
            file: "whatever".to_string(),
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);
        assert!(res.is_err());
    }

    #[test]
    #[cfg(unix)]
    fn ls_hides_dotfiles_unless_all() {
        let temp = make_unique_temp_dir("ls");
        fs::write(temp.join("visible"), "").unwrap();
        fs::write(temp.join(".hidden"), "").unwrap();
        let mut env = test_env();

        let mut out = Vec::new();
        Ls {
            all: false,
            long: false,
            dir: Some(temp.to_string_lossy().to_string()),
        }
        .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
        .unwrap();
        let listing = String::from_utf8(out).unwrap();
        assert!(listing.contains("visible"));
        assert!(!listing.contains(".hidden"));

        let mut out = Vec::new();
        Ls {
            all: true,
            long: true,
            dir: Some(temp.to_string_lossy().to_string()),
        }
        .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
        .unwrap();
        let listing = String::from_utf8(out).unwrap();
        assert!(listing.contains(".hidden"));
        // Long format leads with the type/permission column.
        assert!(listing.lines().all(|l| l.starts_with('-') || l.starts_with('d')));
        // Freshly created files carry this month's modification time.
        let month = chrono::Local::now().format("%b").to_string();
        assert!(listing.contains(&month));

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn rm_removes_flat_file() {
        let temp = make_unique_temp_dir("rm_flat");
        let file = temp.join("f");
        fs::write(&file, "x").unwrap();
        let mut env = test_env();

        let flow = Rm {
            recursive: false,
            force: false,
            verbose: false,
            interactive: false,
            paths: vec![file.to_string_lossy().to_string()],
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
        .unwrap();

        assert_eq!(flow, Flow::Continue);
        assert!(!file.exists());
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn rm_refuses_directory_without_recursive() {
        let temp = make_unique_temp_dir("rm_dir");
        let mut env = test_env();

        let res = Rm {
            recursive: false,
            force: false,
            verbose: false,
            interactive: false,
            paths: vec![temp.to_string_lossy().to_string()],
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);

        let err = res.unwrap_err();
        assert!(err.to_string().contains("Is a directory"));
        assert!(temp.exists());
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn rm_recursive_removes_tree() {
        let temp = make_unique_temp_dir("rm_tree");
        fs::create_dir(temp.join("sub")).unwrap();
        fs::write(temp.join("sub").join("f"), "x").unwrap();
        fs::write(temp.join("g"), "x").unwrap();
        let mut env = test_env();

        Rm {
            recursive: true,
            force: true,
            verbose: false,
            interactive: false,
            paths: vec![temp.to_string_lossy().to_string()],
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
        .unwrap();

        assert!(!temp.exists());
    }

    #[test]
    fn rm_interactive_no_keeps_file() {
        let temp = make_unique_temp_dir("rm_i");
        let file = temp.join("keep_me");
        fs::write(&file, "x").unwrap();
        let mut env = test_env();

        let mut out = Vec::new();
        Rm {
            recursive: false,
            force: false,
            verbose: false,
            interactive: true,
            paths: vec![file.to_string_lossy().to_string()],
        }
        .execute(&mut Cursor::new(b"n\n".to_vec()), &mut out, &mut env)
        .unwrap();

        assert!(file.exists());
        assert!(String::from_utf8(out).unwrap().contains("remove file"));
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn rm_force_ignores_missing_paths() {
        let mut env = test_env();
        let flow = Rm {
            recursive: false,
            force: true,
            verbose: false,
            interactive: false,
            paths: vec!["definitely_not_a_real_path_anywhere".to_string()],
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
        .unwrap();
        assert_eq!(flow, Flow::Continue);
    }

    #[test]
    fn rm_without_paths_is_an_error() {
        let mut env = test_env();
        let res = Rm {
            recursive: false,
            force: false,
            verbose: false,
            interactive: false,
            paths: Vec::new(),
        }
        .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env);
        assert!(res.unwrap_err().to_string().contains("missing file"));
    }

    #[test]
    fn help_numbers_every_builtin() {
        let mut env = test_env();
        let mut out = Vec::new();
        Help {}
            .execute(&mut Cursor::new(Vec::new()), &mut out, &mut env)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        for name in Registry::NAMES {
            assert!(text.contains(name));
        }
        assert!(text.contains(&format!("({})", Registry::NAMES.len())));
    }

    #[test]
    fn exit_requests_loop_termination() {
        let mut env = test_env();
        let flow = Exit { _args: Vec::new() }
            .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
            .unwrap();
        assert_eq!(flow, Flow::Exit);
    }

    #[test]
    fn registry_lookup_is_exact_and_case_sensitive() {
        let registry = Registry::with_default_builtins();
        assert!(registry.lookup("echo", &["hi"]).is_some());
        assert!(registry.lookup("Echo", &["hi"]).is_none());
        assert!(registry.lookup("ech", &[]).is_none());
        assert_eq!(registry.count(), Registry::NAMES.len());
        assert_eq!(registry.names(), &Registry::NAMES);
    }

    #[test]
    fn every_listed_builtin_is_registered() {
        let registry = Registry::with_default_builtins();
        for name in Registry::NAMES {
            assert!(
                registry.lookup(name, &[]).is_some(),
                "'{name}' is listed by help but not claimed by any factory"
            );
        }
    }

    #[test]
    fn unknown_flag_becomes_recoverable_diagnostic() {
        let registry = Registry::with_default_builtins();
        let cmd = registry
            .lookup("rm", &["--definitely-not-a-flag", "x"])
            .expect("rm should still be claimed");
        let mut env = test_env();
        let flow = cmd
            .execute(&mut Cursor::new(Vec::new()), &mut Vec::new(), &mut env)
            .unwrap();
        assert_eq!(flow, Flow::Continue);
    }
}
