#![forbid(unsafe_code)]

//! Core: terminal lifecycle, canonical key events, key bindings, and
//! per-platform rendering handlers for the berd REPL.
//!
//! # Role in berd
//! `berd-core` is the terminal boundary. It converts crossterm input into
//! canonical [`event::Event`]s, decodes them into line-editor actions
//! ([`keybinding::ReplKey`]), and owns raw mode through
//! [`terminal_session::TerminalSession`]. `berd-runtime` builds the editor
//! loop on top of the [`terminal_session::EventSource`] trait.

pub mod event;
pub mod keybinding;
pub mod platform;
pub mod terminal_session;

pub use event::{Event, KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use keybinding::ReplKey;
pub use platform::{PlatformHandler, PlatformTable, UnsupportedPlatform};
pub use terminal_session::{
    EventSource, InterruptHandle, ScriptedEvents, TerminalError, TerminalSession,
};
