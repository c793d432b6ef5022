#![forbid(unsafe_code)]

//! Key bindings for the line editor.
//!
//! Maps canonical [`KeyEvent`]s onto the handful of actions the loop
//! controller understands.
//!
//! | Key | Action |
//! |-----|--------|
//! | printable char (no Ctrl/Alt) | [`ReplKey::Character`] |
//! | Enter (any modifiers) | [`ReplKey::Enter`] |
//! | Ctrl+Space / NUL / Ctrl+@ | [`ReplKey::ExplicitContinuation`] |
//! | Backspace / Ctrl+H | [`ReplKey::Backspace`] |
//! | Ctrl+C | [`ReplKey::Interrupt`] |
//! | Ctrl+L | [`ReplKey::RedrawRequest`] |
//!
//! Multi-line continuation has exactly one trigger. Shift+Enter is not
//! reported consistently across terminals and input methods, so it is
//! treated as a plain Enter.

use crate::event::{KeyCode, KeyEvent, KeyEventKind, Modifiers};

/// Ctrl+Space as delivered by most terminals.
#[must_use]
pub const fn continuation_key() -> KeyEvent {
    KeyEvent::new(KeyCode::Char(' ')).with_modifiers(Modifiers::CTRL)
}

/// Line-editor action decoded from a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplKey {
    /// Insert a character at the end of the buffer.
    Character(char),
    /// Submit the buffer.
    Enter,
    /// Embed a newline without submitting.
    ExplicitContinuation,
    /// Delete the last character.
    Backspace,
    /// Terminate the REPL.
    Interrupt,
    /// Clear the screen and redraw the prompt and buffer.
    RedrawRequest,
    /// Anything the editor ignores.
    Other,
}

impl ReplKey {
    /// Decode a key event.
    ///
    /// Release events are always [`ReplKey::Other`]; Windows consoles report
    /// both press and release for every key.
    #[must_use]
    pub fn from_key(key: &KeyEvent) -> Self {
        if key.kind == KeyEventKind::Release {
            return Self::Other;
        }

        if key.ctrl() {
            return match key.code {
                KeyCode::Char('c' | 'C') => Self::Interrupt,
                KeyCode::Char('l' | 'L') => Self::RedrawRequest,
                KeyCode::Char(' ' | '@') | KeyCode::Null => Self::ExplicitContinuation,
                KeyCode::Char('h' | 'H') | KeyCode::Backspace => Self::Backspace,
                KeyCode::Enter => Self::Enter,
                _ => Self::Other,
            };
        }

        match key.code {
            KeyCode::Enter => Self::Enter,
            KeyCode::Backspace => Self::Backspace,
            KeyCode::Null => Self::ExplicitContinuation,
            KeyCode::Char(c) if !key.alt() && !c.is_control() => Self::Character(c),
            _ => Self::Other,
        }
    }
}

impl From<KeyEvent> for ReplKey {
    fn from(key: KeyEvent) -> Self {
        Self::from_key(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code)
    }

    fn ctrl(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code).with_modifiers(Modifiers::CTRL)
    }

    #[test]
    fn printable_chars_insert() {
        assert_eq!(ReplKey::from(key(KeyCode::Char('a'))), ReplKey::Character('a'));
        assert_eq!(ReplKey::from(key(KeyCode::Char('('))), ReplKey::Character('('));
        assert_eq!(ReplKey::from(key(KeyCode::Char('é'))), ReplKey::Character('é'));
    }

    #[test]
    fn shifted_chars_insert() {
        let upper = KeyEvent::new(KeyCode::Char('A')).with_modifiers(Modifiers::SHIFT);
        assert_eq!(ReplKey::from(upper), ReplKey::Character('A'));
    }

    #[test]
    fn control_bindings() {
        assert_eq!(ReplKey::from(ctrl(KeyCode::Char('c'))), ReplKey::Interrupt);
        assert_eq!(ReplKey::from(ctrl(KeyCode::Char('l'))), ReplKey::RedrawRequest);
        assert_eq!(
            ReplKey::from(ctrl(KeyCode::Char(' '))),
            ReplKey::ExplicitContinuation
        );
        assert_eq!(ReplKey::from(ctrl(KeyCode::Char('h'))), ReplKey::Backspace);
        assert_eq!(ReplKey::from(ctrl(KeyCode::Char('x'))), ReplKey::Other);
    }

    #[test]
    fn continuation_key_decodes() {
        assert_eq!(
            ReplKey::from(continuation_key()),
            ReplKey::ExplicitContinuation
        );
    }

    #[test]
    fn null_is_continuation() {
        assert_eq!(ReplKey::from(key(KeyCode::Null)), ReplKey::ExplicitContinuation);
    }

    #[test]
    fn shift_enter_is_plain_enter() {
        let shifted = KeyEvent::new(KeyCode::Enter).with_modifiers(Modifiers::SHIFT);
        assert_eq!(ReplKey::from(shifted), ReplKey::Enter);
    }

    #[test]
    fn release_events_are_ignored() {
        let release = KeyEvent::new(KeyCode::Char('a')).with_kind(KeyEventKind::Release);
        assert_eq!(ReplKey::from(release), ReplKey::Other);
        let repeat = KeyEvent::new(KeyCode::Char('a')).with_kind(KeyEventKind::Repeat);
        assert_eq!(ReplKey::from(repeat), ReplKey::Character('a'));
    }

    #[test]
    fn alt_chars_and_navigation_are_ignored() {
        let alt = KeyEvent::new(KeyCode::Char('x')).with_modifiers(Modifiers::ALT);
        assert_eq!(ReplKey::from(alt), ReplKey::Other);
        assert_eq!(ReplKey::from(key(KeyCode::Left)), ReplKey::Other);
        assert_eq!(ReplKey::from(key(KeyCode::Tab)), ReplKey::Other);
        assert_eq!(ReplKey::from(key(KeyCode::Escape)), ReplKey::Other);
    }
}
