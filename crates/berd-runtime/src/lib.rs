#![forbid(unsafe_code)]

//! Runtime: the line editor loop and everything it drives.
//!
//! # Role in berd
//! `berd-runtime` sits on top of `berd-core`'s event layer. It owns the
//! edit buffer and its on-screen mirror, classifies submitted input into
//! commands, and runs `read(...)`/`run(...)` through an external
//! interpreter. The `berd` binary only wires configuration, logging, and a
//! [`berd_core::TerminalSession`] into a [`Program`].
//!
//! # Key components
//! - [`EditBuffer`]: pending input, including continuation newlines.
//! - [`Renderer`]: echo, erase, clear, and prompt output.
//! - [`classify`]: pure mapping from text to [`Command`].
//! - [`Dispatcher`]: side effects for each command.
//! - [`ProcessRunner`]: staging file plus interpreter child process.
//! - [`Program`]: the event loop.

pub mod command;
pub mod config;
pub mod dispatcher;
pub mod edit_buffer;
pub mod process_runner;
pub mod program;
pub mod renderer;

pub use command::{BuiltIn, Command, classify};
pub use config::{DEFAULT_CLI_NAME, ReplConfig};
pub use dispatcher::{Dispatcher, ExitReason, Flow, help_text};
pub use edit_buffer::EditBuffer;
pub use process_runner::{
    DEFAULT_INTERPRETER, DEFAULT_STAGING_FILE, InterpreterCommand, ProcessRunner, RunError,
    RunOutcome, SnippetRunner,
};
pub use program::{LoopState, Program};
pub use renderer::Renderer;
