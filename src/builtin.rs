use crate::command::{ExitCode, ExitOutcome};
use crate::game::GuessingGame;
use anyhow::{Result, anyhow};
use std::env;
use std::io::{BufRead, Write};

/// Message printed when `cd` cannot switch directories.
pub const CD_ERROR: &str = "Error: unable to change to specified path.";

/// Built-in commands known to the shell at compile time.
///
/// Builtins take their argument vector as-is, with no flag parsing, and are
/// executed directly in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "cd".
    fn name() -> &'static str;

    /// Usage line shown by `help`.
    fn usage() -> &'static str;

    /// One-sentence summary shown by `help`.
    fn synopsis() -> &'static str;

    /// Builds the command from the arguments that follow its name.
    fn from_args(args: &[&str]) -> Self;

    /// Executes the command using provided IO streams and the builtin table.
    ///
    /// Return value should follow shell conventions: 0 for success, non-zero for error.
    fn execute(
        self,
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        builtins: &BuiltinTable,
    ) -> Result<ExitCode>;
}

type Handler =
    fn(&[&str], &mut dyn BufRead, &mut dyn Write, &BuiltinTable) -> Result<ExitCode>;

/// Builds `T` from `args` and runs it.
///
/// Execution errors print their message to `stdout` and yield a non-zero code.
fn invoke<T: BuiltinCommand>(
    args: &[&str],
    stdin: &mut dyn BufRead,
    stdout: &mut dyn Write,
    builtins: &BuiltinTable,
) -> Result<ExitCode> {
    let cmd = T::from_args(args.get(1..).unwrap_or_default());
    match cmd.execute(stdin, stdout, builtins) {
        Ok(code) => Ok(code),
        Err(e) => {
            tracing::debug!(builtin = T::name(), "{:#}", e);
            writeln!(stdout, "{}", e)?;
            Ok(1)
        }
    }
}

/// Identifies each builtin independently of its table position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Cd,
    Help,
    Exit,
    Guess,
}

/// Position of a builtin inside a [`BuiltinTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinIndex(usize);

/// One registry entry: name, help text and handler.
pub struct Builtin {
    kind: BuiltinKind,
    name: &'static str,
    usage: &'static str,
    synopsis: &'static str,
    handler: Handler,
}

impl Builtin {
    fn of<T: BuiltinCommand>(kind: BuiltinKind) -> Self {
        Self {
            kind,
            name: T::name(),
            usage: T::usage(),
            synopsis: T::synopsis(),
            handler: invoke::<T>,
        }
    }

    pub fn kind(&self) -> BuiltinKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn usage(&self) -> &'static str {
        self.usage
    }

    pub fn synopsis(&self) -> &'static str {
        self.synopsis
    }

    /// Runs the builtin with `args` (the command name included) and returns its exit code.
    pub fn call(
        &self,
        args: &[&str],
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        builtins: &BuiltinTable,
    ) -> Result<ExitCode> {
        (self.handler)(args, stdin, stdout, builtins)
    }
}

/// Immutable, ordered lookup table of the shell's builtins.
///
/// Built once at startup and shared by reference; lookups are a linear scan.
pub struct BuiltinTable {
    entries: Vec<Builtin>,
}

impl BuiltinTable {
    /// `cd`, `help`, `exit`, `guess`, in that order.
    pub fn standard() -> Self {
        Self {
            entries: vec![
                Builtin::of::<Cd>(BuiltinKind::Cd),
                Builtin::of::<Help>(BuiltinKind::Help),
                Builtin::of::<Exit>(BuiltinKind::Exit),
                Builtin::of::<Guess>(BuiltinKind::Guess),
            ],
        }
    }

    /// Case-sensitive exact lookup by name.
    pub fn resolve(&self, name: &str) -> Option<BuiltinIndex> {
        self.entries
            .iter()
            .position(|b| b.name == name)
            .map(BuiltinIndex)
    }

    pub fn get(&self, index: BuiltinIndex) -> &Builtin {
        &self.entries[index.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Builtin> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs a builtin in the current process.
    ///
    /// The outcome is always [`ExitOutcome::Success`]: a builtin that reports a problem
    /// (a failed `cd`, say) has still run.
    pub fn run_in_process(
        &self,
        index: BuiltinIndex,
        args: &[&str],
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
    ) -> ExitOutcome {
        let builtin = self.get(index);
        match builtin.call(args, stdin, stdout, self) {
            Ok(code) => tracing::debug!(builtin = builtin.name, code, "builtin finished"),
            Err(e) => tracing::warn!(builtin = builtin.name, "builtin output failed: {:#}", e),
        }
        if let Err(e) = stdout.flush() {
            tracing::warn!("failed to flush builtin output: {}", e);
        }
        ExitOutcome::Success
    }
}

impl Default for BuiltinTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Change the shell working directory.
pub struct Cd {
    /// Target directory; later arguments are ignored.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn usage() -> &'static str {
        "cd <dir>"
    }

    fn synopsis() -> &'static str {
        "Change the shell working directory to the specified directory."
    }

    fn from_args(args: &[&str]) -> Self {
        Self {
            target: args.first().map(|dir| dir.to_string()),
        }
    }

    fn execute(
        self,
        _stdin: &mut dyn BufRead,
        _stdout: &mut dyn Write,
        _builtins: &BuiltinTable,
    ) -> Result<ExitCode> {
        let target = self.target.ok_or_else(|| anyhow!(CD_ERROR))?;
        env::set_current_dir(&target).map_err(|e| {
            tracing::debug!(path = %target, "chdir failed: {}", e);
            anyhow!(CD_ERROR)
        })?;
        Ok(0)
    }
}

/// Display a summary of each built-in shell function.
pub struct Help;

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn usage() -> &'static str {
        "help"
    }

    fn synopsis() -> &'static str {
        "Display a summary of each built-in shell function."
    }

    fn from_args(_args: &[&str]) -> Self {
        Self
    }

    fn execute(
        self,
        _stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        builtins: &BuiltinTable,
    ) -> Result<ExitCode> {
        for builtin in builtins.iter() {
            writeln!(stdout, "{}", builtin.name())?;
            writeln!(stdout, "-usage: {}", builtin.usage())?;
            writeln!(stdout, "-synopsis: {}", builtin.synopsis())?;
            writeln!(stdout)?;
        }
        Ok(0)
    }
}

/// Terminate the shell.
pub struct Exit;

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn usage() -> &'static str {
        "exit"
    }

    fn synopsis() -> &'static str {
        "Terminate the shell."
    }

    /// Arguments are ignored; the shell always exits with status 0.
    fn from_args(_args: &[&str]) -> Self {
        Self
    }

    fn execute(
        self,
        _stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        _builtins: &BuiltinTable,
    ) -> Result<ExitCode> {
        stdout.flush()?;
        std::io::stdout().flush()?;
        std::process::exit(0)
    }
}

/// Play a number guessing game.
pub struct Guess;

impl BuiltinCommand for Guess {
    fn name() -> &'static str {
        "guess"
    }

    fn usage() -> &'static str {
        "guess"
    }

    fn synopsis() -> &'static str {
        "Plays a guessing game with the user."
    }

    fn from_args(_args: &[&str]) -> Self {
        Self
    }

    fn execute(
        self,
        stdin: &mut dyn BufRead,
        stdout: &mut dyn Write,
        _builtins: &BuiltinTable,
    ) -> Result<ExitCode> {
        let result = GuessingGame::from_clock().play(stdin, stdout)?;
        tracing::debug!(?result, "guessing game over");
        Ok(0)
    }
}
