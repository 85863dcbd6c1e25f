//! Two-stage pipelines: `stage1 | stage2` over a single OS pipe.

use crate::command::{EXIT_NOT_FOUND, ExitOutcome, Stage};
use crate::error::{Result, ShellError};
use crate::external::{CommandLine, exit_child, flush_stdout, wait_for};
use nix::sys::wait::WaitStatus;
use nix::unistd::{ForkResult, Pid, dup2, fork, pipe};
use std::fs::File;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};

const REDIRECT_FAILED: &[u8] = b"mini-shell: failed to redirect standard stream\n";

/// Runs `first | second` and waits for both children.
///
/// The pipe is created before either fork so both children inherit it; every
/// process then closes the ends it does not use, otherwise the reader would never
/// see end-of-stream. The result is [`ExitOutcome::Success`] only if both children
/// exit with status 0.
pub fn run_pipeline(first: Stage<'_>, second: &[&str]) -> Result<ExitOutcome> {
    let first_command = CommandLine::new(first.args())?;
    let second_command = CommandLine::new(second)?;

    let (read_end, write_end) = pipe().map_err(ShellError::Pipe)?;
    flush_stdout();

    let writer = match unsafe { fork() }.map_err(ShellError::Fork)? {
        ForkResult::Child => {
            drop(read_end);
            run_writer(first, &first_command, write_end)
        }
        ForkResult::Parent { child } => child,
    };

    let reader = match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            drop(write_end);
            run_reader(&second_command, read_end)
        }
        Ok(ForkResult::Parent { child }) => child,
        Err(e) => {
            // let the first child see a closed pipe, then reap it
            drop(read_end);
            drop(write_end);
            if let Err(wait_err) = wait_for(writer) {
                tracing::warn!(pid = %writer, "failed to reap pipeline child: {}", wait_err);
            }
            return Err(ShellError::Fork(e));
        }
    };

    drop(read_end);
    drop(write_end);
    tracing::debug!(%writer, %reader, first = ?first, "pipeline spawned");

    let (first_status, second_status) = reap_both(writer, reader);
    let (first_status, second_status) = (first_status?, second_status?);
    tracing::debug!(?first_status, ?second_status, "pipeline reaped");

    Ok(ExitOutcome::from_wait_status(first_status)
        .and(ExitOutcome::from_wait_status(second_status)))
}

/// Waits for both children even when waiting for the first one fails.
fn reap_both(first: Pid, second: Pid) -> (Result<WaitStatus>, Result<WaitStatus>) {
    let first_status = wait_for(first);
    (first_status, wait_for(second))
}

fn redirect_or_exit(fd: &OwnedFd, target: RawFd) {
    if dup2(fd.as_raw_fd(), target).is_err() {
        let _ = nix::unistd::write(std::io::stderr(), REDIRECT_FAILED);
        exit_child(EXIT_NOT_FOUND);
    }
}

/// Child side of stage 1: standard output goes into the pipe.
fn run_writer(stage: Stage<'_>, command: &CommandLine, write_end: OwnedFd) -> ! {
    redirect_or_exit(&write_end, libc::STDOUT_FILENO);
    match stage {
        Stage::Builtin { table, index, args } => {
            // the parent may hold the stdin lock across fork, so leave stdin alone
            let mut out = File::from(write_end);
            table.run_in_process(index, args, &mut std::io::empty(), &mut out);
            drop(out);
            exit_child(0)
        }
        Stage::Exec(_) => {
            drop(write_end);
            command.exec()
        }
    }
}

/// Child side of stage 2: standard input comes from the pipe.
fn run_reader(command: &CommandLine, read_end: OwnedFd) -> ! {
    redirect_or_exit(&read_end, libc::STDIN_FILENO);
    drop(read_end);
    command.exec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::BuiltinTable;

    #[test]
    fn silent_producer_into_failing_consumer_fails() {
        let outcome = run_pipeline(Stage::Exec(&["true"]), &["false"]).unwrap();
        assert_eq!(outcome, ExitOutcome::Failure);
    }

    #[test]
    fn failing_producer_fails() {
        let outcome = run_pipeline(Stage::Exec(&["false"]), &["true"]).unwrap();
        assert_eq!(outcome, ExitOutcome::Failure);
    }

    #[test]
    fn data_flows_through_the_pipe() {
        let outcome = run_pipeline(Stage::Exec(&["echo", "hello"]), &["grep", "-q", "hello"]).unwrap();
        assert_eq!(outcome, ExitOutcome::Success);

        let outcome = run_pipeline(Stage::Exec(&["echo", "hello"]), &["grep", "-q", "bye"]).unwrap();
        assert_eq!(outcome, ExitOutcome::Failure);
    }

    #[test]
    fn reader_sees_end_of_stream() {
        // wc only finishes once every write end is closed
        let outcome = run_pipeline(
            Stage::Exec(&["seq", "1", "5000"]),
            &["sh", "-c", "test $(wc -l) -eq 5000"],
        )
        .unwrap();
        assert_eq!(outcome, ExitOutcome::Success);
    }

    #[test]
    fn unknown_program_in_either_stage_fails() {
        let name = format!("no_such_program_{}", std::process::id());
        let outcome = run_pipeline(Stage::Exec(&[name.as_str()]), &["cat"]).unwrap();
        assert_eq!(outcome, ExitOutcome::Failure);

        let outcome = run_pipeline(Stage::Exec(&["true"]), &[name.as_str()]).unwrap();
        assert_eq!(outcome, ExitOutcome::Failure);
    }

    #[test]
    fn empty_second_stage_fails() {
        let outcome = run_pipeline(Stage::Exec(&["true"]), &[]).unwrap();
        assert_eq!(outcome, ExitOutcome::Failure);
    }

    #[test]
    fn help_builtin_feeds_the_pipe() {
        let table = BuiltinTable::standard();
        let index = table.resolve("help").unwrap();
        let stage = Stage::Builtin {
            table: &table,
            index,
            args: &["help"],
        };
        let outcome = run_pipeline(stage, &["sh", "-c", "test $(wc -l) -eq 16"]).unwrap();
        assert_eq!(outcome, ExitOutcome::Success);

        let outcome = run_pipeline(stage, &["grep", "-q", "^guess$"]).unwrap();
        assert_eq!(outcome, ExitOutcome::Success);
    }

    #[test]
    fn help_stage_runs_while_stdin_is_locked() {
        let table = BuiltinTable::standard();
        let index = table.resolve("help").unwrap();
        let stage = Stage::Builtin {
            table: &table,
            index,
            args: &["help"],
        };
        let _stdin = std::io::stdin().lock();
        let outcome = run_pipeline(stage, &["sh", "-c", "test $(wc -l) -eq 16"]).unwrap();
        assert_eq!(outcome, ExitOutcome::Success);
    }

    #[test]
    fn second_child_is_reaped_when_first_wait_fails() {
        let child = std::process::Command::new("true").spawn().unwrap();
        let pid = Pid::from_raw(child.id() as i32);
        // not our child, so waitpid fails with ECHILD
        let stranger = Pid::from_raw(1);

        let (first, second) = reap_both(stranger, pid);
        assert!(matches!(first, Err(ShellError::Wait(_))));
        assert_eq!(second.unwrap(), WaitStatus::Exited(pid, 0));
    }

    #[test]
    fn nul_byte_is_rejected_before_any_fork() {
        let err = run_pipeline(Stage::Exec(&["echo", "x\0"]), &["cat"]).unwrap_err();
        assert!(matches!(err, ShellError::NulByte(_)));
    }
}
