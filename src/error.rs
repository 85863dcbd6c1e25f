use nix::errno::Errno;
use thiserror::Error;

/// Failures of the shell process itself while setting up or reaping children.
///
/// A child that cannot find its program is *not* an error here: it reports the
/// problem itself and exits with a failure status.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("failed to create pipe: {0}")]
    Pipe(#[source] Errno),

    #[error("failed to fork: {0}")]
    Fork(#[source] Errno),

    #[error("failed to wait for child: {0}")]
    Wait(#[source] Errno),

    #[error("argument contains a NUL byte: {0:?}")]
    NulByte(String),
}

pub type Result<T> = std::result::Result<T, ShellError>;
