use crate::builtin::{BuiltinIndex, BuiltinTable};
use nix::sys::wait::WaitStatus;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Exit status a child uses when its program cannot be started.
pub const EXIT_NOT_FOUND: ExitCode = 1;

/// Aggregate result of running one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    Failure,
}

impl ExitOutcome {
    pub fn from_code(code: ExitCode) -> Self {
        if code == 0 {
            ExitOutcome::Success
        } else {
            ExitOutcome::Failure
        }
    }

    /// Maps a reaped child's status: only a normal exit with code 0 is a success.
    pub fn from_wait_status(status: WaitStatus) -> Self {
        match status {
            WaitStatus::Exited(_, code) => Self::from_code(code),
            _ => ExitOutcome::Failure,
        }
    }

    /// Both outcomes must succeed for the combination to succeed.
    pub fn and(self, other: ExitOutcome) -> Self {
        if self.is_success() && other.is_success() {
            ExitOutcome::Success
        } else {
            ExitOutcome::Failure
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitOutcome::Success
    }
}

/// What a forked pipeline child does once its standard streams are wired.
#[derive(Clone, Copy)]
pub enum Stage<'a> {
    /// Run a builtin inside the child, then exit.
    Builtin {
        table: &'a BuiltinTable,
        index: BuiltinIndex,
        args: &'a [&'a str],
    },
    /// Replace the child's program image with an external program.
    Exec(&'a [&'a str]),
}

impl<'a> Stage<'a> {
    pub fn args(&self) -> &'a [&'a str] {
        match *self {
            Stage::Builtin { args, .. } => args,
            Stage::Exec(args) => args,
        }
    }

    pub fn name(&self) -> &'a str {
        self.args().first().copied().unwrap_or("")
    }
}

impl std::fmt::Debug for Stage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Builtin { table, index, args } => f
                .debug_struct("Builtin")
                .field("name", &table.get(*index).name())
                .field("args", args)
                .finish(),
            Stage::Exec(args) => f.debug_tuple("Exec").field(args).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::Pid;

    #[test]
    fn zero_exit_is_success() {
        let pid = Pid::from_raw(1);
        assert_eq!(
            ExitOutcome::from_wait_status(WaitStatus::Exited(pid, 0)),
            ExitOutcome::Success
        );
        assert_eq!(
            ExitOutcome::from_wait_status(WaitStatus::Exited(pid, 3)),
            ExitOutcome::Failure
        );
    }

    #[test]
    fn killed_child_is_failure() {
        let pid = Pid::from_raw(1);
        let status = WaitStatus::Signaled(pid, nix::sys::signal::Signal::SIGKILL, false);
        assert_eq!(ExitOutcome::from_wait_status(status), ExitOutcome::Failure);
    }

    #[test]
    fn combined_outcome_needs_both() {
        use ExitOutcome::*;
        assert_eq!(Success.and(Success), Success);
        assert_eq!(Success.and(Failure), Failure);
        assert_eq!(Failure.and(Success), Failure);
        assert_eq!(Failure.and(Failure), Failure);
    }

    #[test]
    fn stage_name_is_first_argument() {
        let args = ["wc", "-l"];
        assert_eq!(Stage::Exec(&args).name(), "wc");
        assert_eq!(Stage::Exec(&[]).name(), "");
    }
}
