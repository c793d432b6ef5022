#![forbid(unsafe_code)]

//! Classification of a submitted buffer into a [`Command`].
//!
//! Classification is pure and total: every string maps to exactly one
//! variant, in a single pass.
//!
//! # Rules
//!
//! 1. Leading/trailing whitespace is trimmed.
//! 2. Keywords compare case-insensitively, except `cd`, which must be
//!    lowercase. Payloads keep their case (`READ(Foo.Berd)` is
//!    `Read("Foo.Berd")`).
//! 3. First match wins, in this order: built-in name, `exit`,
//!    `read(...)`, `run(...)`, `cd <path>`, otherwise unknown.
//! 4. A structured call without its closing `)` is [`Command::Unknown`].

use std::fmt;

/// Zero-argument commands handled inside the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltIn {
    Help,
    Clear,
    Ls,
    Pwd,
}

impl BuiltIn {
    pub const ALL: [BuiltIn; 4] = [BuiltIn::Help, BuiltIn::Clear, BuiltIn::Ls, BuiltIn::Pwd];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Clear => "clear",
            Self::Ls => "ls",
            Self::Pwd => "pwd",
        }
    }

    /// Match a case-folded keyword.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }
}

impl fmt::Display for BuiltIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    BuiltIn(BuiltIn),
    /// `read(<path>)`: run the file at path through the interpreter.
    Read(String),
    /// `run(<snippet>)`: run the snippet through the interpreter.
    Run(String),
    /// `cd <path>`; an empty path means the operand was missing.
    ChangeDir(String),
    Exit,
    /// Anything else, trimmed but otherwise as typed.
    Unknown(String),
}

const EXIT: &str = "exit";
const READ_OPEN: &str = "read(";
const RUN_OPEN: &str = "run(";
const CD: &str = "cd";
const CALL_CLOSE: char = ')';

/// Classify a submitted buffer.
#[must_use]
pub fn classify(raw: &str) -> Command {
    let text = raw.trim();
    let folded = text.to_lowercase();

    if let Some(builtin) = BuiltIn::from_name(&folded) {
        return Command::BuiltIn(builtin);
    }
    if folded == EXIT {
        return Command::Exit;
    }
    if let Some(path) = structured_call(text, READ_OPEN) {
        return Command::Read(path.to_string());
    }
    if let Some(snippet) = structured_call(text, RUN_OPEN) {
        return Command::Run(snippet.to_string());
    }
    if let Some(path) = change_dir(text) {
        return Command::ChangeDir(path.to_string());
    }
    Command::Unknown(text.to_string())
}

/// Payload of `keyword(payload)`, keyword compared case-insensitively.
///
/// Returns `None` when the keyword is absent or the call is not closed.
fn structured_call<'a>(text: &'a str, open: &str) -> Option<&'a str> {
    let head = text.get(..open.len())?;
    if !head.eq_ignore_ascii_case(open) {
        return None;
    }
    text[open.len()..].strip_suffix(CALL_CLOSE)
}

/// Path operand of `cd`, which must be separated by whitespace.
fn change_dir(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(CD)?;
    if rest.is_empty() {
        return Some("");
    }
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim_start())
}
