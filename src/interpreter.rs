use crate::builtin::Registry;
use crate::command::Flow;
use crate::env::Environment;
use crate::external;
use crate::lexer;
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive interpreter: prompt, read, tokenize, dispatch, repeat.
///
/// Dispatch resolves the command name against the builtin [`Registry`]
/// first; anything else is handed to the external process launcher. Only
/// the `exit` builtin and end-of-input stop the loop.
///
/// Example
/// ```
/// use lsh::Interpreter;
/// use lsh::command::Flow;
/// let mut sh = Interpreter::default();
/// let flow = sh.run("echo", &["hello", "world"]).unwrap();
/// assert_eq!(flow, Flow::Continue);
/// ```
pub struct Interpreter {
    env: Environment,
    registry: Registry,
}

impl Interpreter {
    pub fn new(registry: Registry) -> Self {
        Self {
            env: Environment::new(),
            registry,
        }
    }

    /// Dispatch a single command invocation by name with arguments.
    ///
    /// Builtins run synchronously in-process; everything else goes through
    /// the launcher, which blocks until the child reaches a terminal state.
    /// The child's exit classification is not surfaced to the loop: failed
    /// external commands print a diagnostic and the session continues.
    pub fn run(&mut self, name: &str, args: &[&str]) -> Result<Flow> {
        if let Some(cmd) = self.registry.lookup(name, args) {
            let mut stdin = std::io::stdin().lock();
            let mut stdout = std::io::stdout().lock();
            return cmd.execute(&mut stdin, &mut stdout, &mut self.env);
        }
        if let Err(err) = external::launch(&self.env, name, args) {
            eprintln!("lsh: {err:#}");
        }
        Ok(Flow::Continue)
    }

    /// The read–tokenize–dispatch–execute loop.
    ///
    /// End-of-input on an empty line terminates the session the same way
    /// `exit` does; Ctrl-C abandons the current line and re-prompts.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(&self.render_prompt()) {
                Ok(line) => {
                    let tokens = lexer::split_line(&line);
                    let Some((name, args)) = tokens.split_first() else {
                        continue;
                    };
                    rl.add_history_entry(line.as_str())?;
                    let args: Vec<&str> = args.iter().map(String::as_str).collect();
                    match self.run(name, &args) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Exit) => break,
                        Err(err) => eprintln!("lsh: {err:#}"),
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("lsh: readline: {err}");
                    break;
                }
            }
        }

        Ok(())
    }

    fn render_prompt(&self) -> String {
        match self.env.get_var("USER") {
            Some(user) => format!(
                "\x1b[35m{}\x1b[0m in \x1b[32m{}\x1b[0m \x1b[33mλ\x1b[0m ",
                user,
                self.env.current_dir.to_string_lossy()
            ),
            None => String::from("lsh: unknown user@lsh: "),
        }
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the full builtin set registered.
    fn default() -> Self {
        Self::new(Registry::with_default_builtins())
    }
}
