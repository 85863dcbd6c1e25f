use crate::command::{EXIT_NOT_FOUND, ExitOutcome};
use crate::error::{Result, ShellError};
use nix::errno::Errno;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::{ForkResult, Pid, execvp, fork};
use std::ffi::CString;
use std::io::Write;

/// An external program invocation, converted to C strings ahead of `fork`.
///
/// Everything the child needs is allocated here, so the child only calls `execvp`,
/// `write` and `_exit` between forking and replacing its image.
pub(crate) struct CommandLine {
    argv: Vec<CString>,
    not_found: Vec<u8>,
}

impl CommandLine {
    pub(crate) fn new(args: &[&str]) -> Result<Self> {
        let argv = args
            .iter()
            .map(|a| CString::new(*a).map_err(|_| ShellError::NulByte(a.to_string())))
            .collect::<Result<Vec<_>>>()?;
        let name = args.first().copied().unwrap_or_default();
        Ok(Self {
            argv,
            not_found: format!("command not found: {}\n", name).into_bytes(),
        })
    }

    /// Replaces the current process image with the program.
    ///
    /// Only call this in a forked child. When the program cannot be started the
    /// child reports it on standard error and exits with [`EXIT_NOT_FOUND`].
    pub(crate) fn exec(&self) -> ! {
        if let Some(program) = self.argv.first() {
            crate::signal::reset_for_exec();
            // execvp only returns on failure
            let _ = execvp(program, self.argv.as_slice());
        }
        let _ = nix::unistd::write(std::io::stderr(), &self.not_found);
        exit_child(EXIT_NOT_FOUND)
    }
}

/// Ends a forked child without running exit handlers or flushing inherited buffers.
pub(crate) fn exit_child(code: i32) -> ! {
    unsafe { libc::_exit(code) }
}

/// Pushes out anything buffered on standard output so a child doesn't inherit it.
pub(crate) fn flush_stdout() {
    if let Err(e) = std::io::stdout().flush() {
        tracing::warn!("failed to flush stdout before fork: {}", e);
    }
}

/// Blocks until `pid` terminates.
pub(crate) fn wait_for(pid: Pid) -> Result<WaitStatus> {
    loop {
        match waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            other => return other.map_err(ShellError::Wait),
        }
    }
}

/// Runs an external program in a child process and waits for it.
///
/// The result is [`ExitOutcome::Success`] only if the child exits with status 0.
/// A program that cannot be found is reported by the child itself.
pub fn run_external(args: &[&str]) -> Result<ExitOutcome> {
    let command = CommandLine::new(args)?;
    flush_stdout();

    match unsafe { fork() }.map_err(ShellError::Fork)? {
        ForkResult::Child => command.exec(),
        ForkResult::Parent { child } => {
            tracing::debug!(pid = %child, program = args.first().copied().unwrap_or_default(), "spawned child");
            let status = wait_for(child)?;
            tracing::debug!(pid = %child, ?status, "child reaped");
            Ok(ExitOutcome::from_wait_status(status))
        }
    }
}
