use crate::builtin::{BuiltinKind, BuiltinTable};
use crate::command::{ExitOutcome, Stage};
use crate::config::DEFAULT_PROMPT;
use crate::error::ShellError;
use crate::external::run_external;
use crate::pipeline::run_pipeline;
use crate::signal::TERMINATED_MESSAGE;
use crate::tokenizer::{self, ArgVector, PipePosition};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{BufRead, Write};

/// The shell: resolves each parsed line to a builtin, an external program or a
/// two-stage pipeline, and runs it.
///
/// Example
/// ```
/// use mini_shell::{ExitOutcome, Interpreter};
/// let sh = Interpreter::default();
/// let mut out = Vec::new();
/// let outcome = sh.execute_line("help", &mut std::io::empty(), &mut out);
/// assert_eq!(outcome, Some(ExitOutcome::Success));
/// assert!(String::from_utf8(out).unwrap().starts_with("cd\n"));
/// ```
pub struct Interpreter {
    builtins: BuiltinTable,
    prompt: String,
}

impl Interpreter {
    pub fn new(builtins: BuiltinTable) -> Self {
        Self {
            builtins,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn builtins(&self) -> &BuiltinTable {
        &self.builtins
    }

    /// Truncates, tokenizes and dispatches one input line.
    ///
    /// Returns `None` when the line is skipped: blank lines, and lines starting with
    /// `|`, which share the blank line's sentinel.
    pub fn execute_line(
        &self,
        line: &str,
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
    ) -> Option<ExitOutcome> {
        let line = tokenizer::truncate_line(line);
        let (pipe, args) = tokenizer::parse(line);
        match pipe {
            PipePosition::Empty | PipePosition::At(0) => {
                tracing::trace!(?pipe, "line skipped");
                None
            }
            _ => Some(self.dispatch(&args, pipe, stdin, stdout)),
        }
    }

    /// Routes a non-empty argument vector.
    ///
    /// * builtin without a pipe: run in this process;
    /// * pipe after the first token: run a pipeline, with `help` as the only builtin
    ///   allowed to feed it in-process;
    /// * anything else: fork and exec an external program.
    ///
    /// `stdin` and `stdout` are only used by builtins running in this process.
    pub fn dispatch(
        &self,
        args: &ArgVector<'_>,
        pipe: PipePosition,
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
    ) -> ExitOutcome {
        let Some(name) = args.command() else {
            return ExitOutcome::Success;
        };
        let builtin = self.builtins.resolve(name);

        match (builtin, pipe) {
            (Some(index), PipePosition::NoPipe) => {
                tracing::debug!(builtin = name, "running builtin");
                self.builtins.run_in_process(index, args, stdin, stdout)
            }
            (_, PipePosition::At(at)) if at > 0 => {
                let (left, right) = args.split_at_pipe(at);
                self.exit_if_requested(left, stdin, stdout);
                self.exit_if_requested(right, stdin, stdout);

                let first = match builtin {
                    Some(index) if self.builtins.get(index).kind() == BuiltinKind::Help => {
                        Stage::Builtin {
                            table: &self.builtins,
                            index,
                            args: left,
                        }
                    }
                    _ => Stage::Exec(left),
                };
                tracing::debug!(?first, second = ?right, "running pipeline");
                report(run_pipeline(first, right))
            }
            _ => {
                tracing::debug!(program = name, "running external command");
                report(run_external(args))
            }
        }
    }

    /// `exit` ends the shell wherever it appears as a command, pipelines included.
    fn exit_if_requested(&self, stage: &[&str], stdin: &mut dyn BufRead, stdout: &mut dyn Write) {
        let Some(index) = stage.first().and_then(|name| self.builtins.resolve(name)) else {
            return;
        };
        if self.builtins.get(index).kind() == BuiltinKind::Exit {
            self.builtins.run_in_process(index, stage, stdin, stdout);
        }
    }

    /// Reads and runs lines until end of input or `exit`.
    ///
    /// With `use_editor` set, lines are read through rustyline with history;
    /// otherwise the prompt is printed and plain lines are read from standard input.
    pub fn repl(&self, use_editor: bool) -> anyhow::Result<()> {
        if use_editor {
            self.repl_with_editor()
        } else {
            self.repl_plain()
        }
    }

    fn repl_with_editor(&self) -> anyhow::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(&self.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    self.run_line(&line);
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl-C at the prompt never reaches the signal handler in raw mode
                    let mut stdout = std::io::stdout();
                    stdout.write_all(TERMINATED_MESSAGE.as_bytes())?;
                    stdout.flush()?;
                    return Ok(());
                }
                Err(ReadlineError::Eof) => return Ok(()),
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn repl_plain(&self) -> anyhow::Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let mut raw = Vec::new();

        loop {
            write!(stdout, "{}", self.prompt)?;
            stdout.flush()?;

            raw.clear();
            if stdin.lock().read_until(b'\n', &mut raw)? == 0 {
                return Ok(());
            }
            let line = String::from_utf8_lossy(&raw);
            self.run_line(&line);
        }
    }

    fn run_line(&self, line: &str) {
        let mut stdin = std::io::stdin().lock();
        let mut stdout = std::io::stdout();
        if let Some(outcome) = self.execute_line(line, &mut stdin, &mut stdout) {
            tracing::debug!(?outcome, "line finished");
        }
    }
}

impl Default for Interpreter {
    /// An interpreter with the standard builtins: `cd`, `help`, `exit`, `guess`.
    fn default() -> Self {
        Self::new(BuiltinTable::standard())
    }
}

fn report(result: Result<ExitOutcome, ShellError>) -> ExitOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("mini-shell: {}", e);
            ExitOutcome::Failure
        }
    }
}
