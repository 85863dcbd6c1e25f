use nix::sys::signal::{SigHandler, Signal, signal};

/// Printed when the shell is interrupted.
pub const TERMINATED_MESSAGE: &str = "mini shell terminated\n";

extern "C" fn on_interrupt(_: libc::c_int) {
    // only async-signal-safe calls in here
    unsafe {
        libc::write(
            libc::STDOUT_FILENO,
            TERMINATED_MESSAGE.as_ptr().cast(),
            TERMINATED_MESSAGE.len(),
        );
        libc::_exit(0);
    }
}

/// Makes `SIGINT` print [`TERMINATED_MESSAGE`] and end the shell with status 0.
///
/// Running children are left alone.
pub fn install() -> nix::Result<()> {
    unsafe { signal(Signal::SIGINT, SigHandler::Handler(on_interrupt)) }?;
    Ok(())
}

/// Restores default dispositions that `exec` would otherwise carry into a child.
///
/// The Rust runtime ignores `SIGPIPE`, and ignored signals survive `exec`; programs
/// such as `yes` rely on being killed by it when their reader goes away.
pub(crate) fn reset_for_exec() {
    let _ = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) };
}
