#![forbid(unsafe_code)]

//! Per-platform clear-screen and backspace rendering strategies.
//!
//! The table is built once from [`PlatformTable::builtin`] and never mutated.
//! Looking up an operating system that has no entry is a typed failure
//! ([`UnsupportedPlatform`]); callers decide how to degrade, usually with
//! [`PlatformHandler::fallback`].
//!
//! Operating system identifiers are the values of [`std::env::consts::OS`].

use std::fmt;

/// How the renderer clears the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearStrategy {
    /// `CSI 2 J` followed by cursor home.
    Screen,
    /// Like [`ClearStrategy::Screen`], and also purge scrollback (`CSI 3 J`).
    ScreenAndScrollback,
}

/// How the renderer removes the last echoed character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseStrategy {
    /// Backspace, space, backspace. Needs reliable cursor control.
    CursorControl,
    /// Clear the whole screen and redraw prompt plus buffer.
    Redraw,
}

/// Rendering procedures for one operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformHandler {
    pub clear: ClearStrategy,
    pub erase: EraseStrategy,
}

impl PlatformHandler {
    /// Handler used when the running OS has no table entry.
    ///
    /// Redraw never depends on cursor movement semantics, so it renders
    /// correctly on any terminal that understands a screen clear.
    #[must_use]
    pub const fn fallback() -> Self {
        Self {
            clear: ClearStrategy::Screen,
            erase: EraseStrategy::Redraw,
        }
    }
}

/// Lookup failure for an operating system without a registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedPlatform {
    pub os: String,
}

impl fmt::Display for UnsupportedPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported platform: {}", self.os)
    }
}

impl std::error::Error for UnsupportedPlatform {}

/// Immutable OS → handler table.
#[derive(Debug, Clone)]
pub struct PlatformTable {
    entries: Vec<(&'static str, PlatformHandler)>,
}

const UNIX_LIKE: PlatformHandler = PlatformHandler {
    clear: ClearStrategy::ScreenAndScrollback,
    erase: EraseStrategy::CursorControl,
};

const WINDOWS: PlatformHandler = PlatformHandler {
    clear: ClearStrategy::Screen,
    erase: EraseStrategy::Redraw,
};

impl PlatformTable {
    /// The table shipped with the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_entries(vec![
            ("linux", UNIX_LIKE),
            ("macos", UNIX_LIKE),
            ("freebsd", UNIX_LIKE),
            ("netbsd", UNIX_LIKE),
            ("openbsd", UNIX_LIKE),
            ("dragonfly", UNIX_LIKE),
            ("windows", WINDOWS),
        ])
    }

    /// Build a table from explicit entries. Later duplicates are ignored.
    #[must_use]
    pub fn from_entries(entries: Vec<(&'static str, PlatformHandler)>) -> Self {
        let mut deduped: Vec<(&'static str, PlatformHandler)> = Vec::with_capacity(entries.len());
        for (os, handler) in entries {
            if !deduped.iter().any(|(existing, _)| *existing == os) {
                deduped.push((os, handler));
            }
        }
        Self { entries: deduped }
    }

    /// Look up the handler for `os`.
    pub fn handler(&self, os: &str) -> Result<PlatformHandler, UnsupportedPlatform> {
        self.entries
            .iter()
            .find(|(id, _)| *id == os)
            .map(|(_, handler)| *handler)
            .ok_or_else(|| UnsupportedPlatform { os: os.to_string() })
    }

    /// Look up the handler for the operating system this binary runs on.
    pub fn current(&self) -> Result<PlatformHandler, UnsupportedPlatform> {
        self.handler(std::env::consts::OS)
    }
}

/// Pure lookup against the built-in table.
pub fn platform_handler(os: &str) -> Result<PlatformHandler, UnsupportedPlatform> {
    PlatformTable::builtin().handler(os)
}
