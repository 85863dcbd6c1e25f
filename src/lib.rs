//! A minimal interactive command interpreter.
//!
//! Each input line is split on whitespace, then run as a builtin (`cd`, `help`,
//! `exit`, `guess`), as an external program in a forked child, or as a two-command
//! pipeline joined by a single OS pipe. The shell waits for every child it starts
//! before reading the next line.
//!
//! The main entry point is [`Interpreter`]. The [`tokenizer`], [`external`] and
//! [`pipeline`] modules expose the individual stages for embedding and testing.

pub mod builtin;
pub mod command;
pub mod config;
pub mod error;
pub mod external;
pub mod game;
mod interpreter;
pub mod logging;
pub mod pipeline;
pub mod signal;
pub mod tokenizer;

pub use command::{ExitOutcome, Stage};
pub use config::Config;
pub use error::ShellError;
/// Just a convenient re-export of the interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
