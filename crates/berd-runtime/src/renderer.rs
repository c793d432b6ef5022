#![forbid(unsafe_code)]

//! Terminal output for the line editor.
//!
//! The renderer mirrors [`EditBuffer`] state on the terminal. The loop
//! controller pairs every buffer mutation with exactly one renderer call in
//! the same handling step, so display and buffer never diverge.
//!
//! Output is written for a raw-mode terminal: every line break is `CR LF`.
//!
//! # Erase strategies
//!
//! | Situation | Output |
//! |-----------|--------|
//! | `CursorControl`, ordinary char | `BS SP BS` per display column |
//! | `CursorControl`, embedded newline | cursor up, move to end of previous line |
//! | `Redraw`, zero-width char, or soft-wrapped line | clear screen, redraw prompt and buffer |

use std::io::{self, Write};

use berd_core::platform::{ClearStrategy, EraseStrategy, PlatformHandler, UnsupportedPlatform};
use crossterm::{cursor, queue, terminal};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::edit_buffer::EditBuffer;

const ERASE_CELL: &[u8] = b"\x08 \x08";
const CRLF: &str = "\r\n";

/// Reflects edit buffer state back to the terminal.
#[derive(Debug)]
pub struct Renderer<W: Write> {
    out: W,
    prompt: String,
    handler: PlatformHandler,
    unsupported: Option<UnsupportedPlatform>,
    width: Option<u16>,
}

impl<W: Write> Renderer<W> {
    /// Create a renderer for the given platform lookup result.
    ///
    /// An unsupported platform is not fatal: the renderer switches to
    /// [`PlatformHandler::fallback`] and keeps the error for reporting.
    pub fn new(
        out: W,
        prompt: impl Into<String>,
        platform: Result<PlatformHandler, UnsupportedPlatform>,
    ) -> Self {
        let (handler, unsupported) = match platform {
            Ok(handler) => (handler, None),
            Err(err) => {
                tracing::warn!(os = %err.os, "no platform handler registered, using redraw fallback");
                (PlatformHandler::fallback(), Some(err))
            }
        };
        Self {
            out,
            prompt: prompt.into(),
            handler,
            unsupported,
            width: None,
        }
    }

    /// Set the terminal width used to detect soft-wrapped lines.
    pub fn set_width(&mut self, width: Option<u16>) {
        self.width = width.filter(|w| *w > 0);
    }

    #[must_use]
    pub fn width(&self) -> Option<u16> {
        self.width
    }

    #[must_use]
    pub fn handler(&self) -> PlatformHandler {
        self.handler
    }

    /// The lookup failure that forced the fallback handler, if any.
    #[must_use]
    pub fn unsupported_platform(&self) -> Option<&UnsupportedPlatform> {
        self.unsupported.as_ref()
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Print the prompt.
    pub fn prompt(&mut self) -> io::Result<()> {
        self.out.write_all(self.prompt.as_bytes())?;
        self.out.flush()
    }

    /// Write a typed character at the cursor.
    pub fn echo(&mut self, ch: char) -> io::Result<()> {
        let mut utf8 = [0u8; 4];
        self.out.write_all(ch.encode_utf8(&mut utf8).as_bytes())?;
        self.out.flush()
    }

    /// Emit a raw-mode line terminator.
    pub fn new_line(&mut self) -> io::Result<()> {
        self.out.write_all(CRLF.as_bytes())?;
        self.out.flush()
    }

    /// Remove `removed` from the display. `buffer` is the state after removal.
    pub fn erase_last(&mut self, removed: char, buffer: &EditBuffer) -> io::Result<()> {
        if self.handler.erase == EraseStrategy::Redraw {
            return self.redraw(ClearStrategy::Screen, buffer);
        }

        if removed == '\n' {
            let column = self.line_width(buffer);
            if self.fits(column) {
                queue!(
                    self.out,
                    cursor::MoveUp(1),
                    cursor::MoveToColumn(saturating_u16(column))
                )?;
                return self.out.flush();
            }
            return self.redraw(ClearStrategy::Screen, buffer);
        }

        let cells = removed.width().unwrap_or(0);
        let before = self.line_width(buffer) + cells;
        if cells == 0 || !self.fits(before) {
            return self.redraw(ClearStrategy::Screen, buffer);
        }

        for _ in 0..cells {
            self.out.write_all(ERASE_CELL)?;
        }
        self.out.flush()
    }

    /// Clear the screen with the platform strategy, then redraw prompt and buffer.
    pub fn clear(&mut self, buffer: &EditBuffer) -> io::Result<()> {
        self.redraw(self.handler.clear, buffer)
    }

    /// Print a block of output, ending with a line break.
    pub fn print_line(&mut self, text: &str) -> io::Result<()> {
        let mut lines = text.split('\n');
        if let Some(first) = lines.next() {
            self.out.write_all(first.trim_end_matches('\r').as_bytes())?;
        }
        for line in lines {
            self.out.write_all(CRLF.as_bytes())?;
            self.out.write_all(line.trim_end_matches('\r').as_bytes())?;
        }
        self.out.write_all(CRLF.as_bytes())?;
        self.out.flush()
    }

    /// Report a non-fatal error.
    pub fn report(&mut self, message: impl std::fmt::Display) -> io::Result<()> {
        self.print_line(&message.to_string())
    }

    /// Clear the screen with the platform strategy and home the cursor.
    pub fn clear_screen(&mut self) -> io::Result<()> {
        self.queue_clear(self.handler.clear)?;
        self.out.flush()
    }

    fn queue_clear(&mut self, strategy: ClearStrategy) -> io::Result<()> {
        queue!(self.out, terminal::Clear(terminal::ClearType::All))?;
        if strategy == ClearStrategy::ScreenAndScrollback {
            queue!(self.out, terminal::Clear(terminal::ClearType::Purge))?;
        }
        queue!(self.out, cursor::MoveTo(0, 0))
    }

    fn redraw(&mut self, strategy: ClearStrategy, buffer: &EditBuffer) -> io::Result<()> {
        self.queue_clear(strategy)?;
        self.out.write_all(self.prompt.as_bytes())?;
        let mut lines = buffer.as_str().split('\n');
        if let Some(first) = lines.next() {
            self.out.write_all(first.as_bytes())?;
        }
        for line in lines {
            self.out.write_all(CRLF.as_bytes())?;
            self.out.write_all(line.as_bytes())?;
        }
        self.out.flush()
    }

    /// Display width of the line the cursor is on, prompt included.
    fn line_width(&self, buffer: &EditBuffer) -> usize {
        let line = buffer.current_line().width();
        if buffer.is_multiline() {
            line
        } else {
            self.prompt.width() + line
        }
    }

    /// True when a line of `columns` cells has not reached the right margin.
    fn fits(&self, columns: usize) -> bool {
        self.width.is_none_or(|w| columns < usize::from(w))
    }
}

fn saturating_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use berd_core::platform::platform_handler;

    fn renderer(os: &str) -> Renderer<Vec<u8>> {
        Renderer::new(Vec::new(), "dreamberd> ", platform_handler(os))
    }

    fn output(r: &Renderer<Vec<u8>>) -> String {
        String::from_utf8(r.writer().clone()).unwrap()
    }

    fn buffer(text: &str) -> EditBuffer {
        let mut buf = EditBuffer::new();
        for ch in text.chars() {
            buf.append(ch);
        }
        buf
    }

    #[test]
    fn echo_writes_char() {
        let mut r = renderer("linux");
        r.echo('a').unwrap();
        r.echo('é').unwrap();
        assert_eq!(output(&r), "aé");
    }

    #[test]
    fn new_line_is_crlf() {
        let mut r = renderer("linux");
        r.new_line().unwrap();
        assert_eq!(output(&r), "\r\n");
    }

    #[test]
    fn erase_uses_backspace_space_backspace() {
        let mut r = renderer("linux");
        r.erase_last('x', &buffer("ab")).unwrap();
        assert_eq!(output(&r), "\x08 \x08");
    }

    #[test]
    fn erase_wide_char_clears_two_cells() {
        let mut r = renderer("macos");
        r.erase_last('界', &buffer("a")).unwrap();
        assert_eq!(output(&r), "\x08 \x08\x08 \x08");
    }

    #[test]
    fn erase_on_windows_redraws() {
        let mut r = renderer("windows");
        r.erase_last('c', &buffer("ab")).unwrap();
        assert_eq!(output(&r), "\x1b[2J\x1b[1;1Hdreamberd> ab");
    }

    #[test]
    fn erase_newline_moves_to_previous_line_end() {
        let mut r = renderer("linux");
        r.erase_last('\n', &buffer("abc")).unwrap();
        // prompt (11 cells) + "abc"
        assert_eq!(output(&r), "\x1b[1A\x1b[15G");
    }

    #[test]
    fn erase_at_right_margin_redraws() {
        let mut r = renderer("linux");
        r.set_width(Some(12));
        r.erase_last('b', &buffer("a")).unwrap();
        assert_eq!(output(&r), "\x1b[2J\x1b[1;1Hdreamberd> a");
    }

    #[test]
    fn clear_purges_scrollback_on_unix() {
        let mut r = renderer("linux");
        r.clear(&buffer("a\nb")).unwrap();
        assert_eq!(output(&r), "\x1b[2J\x1b[3J\x1b[1;1Hdreamberd> a\r\nb");
    }

    #[test]
    fn clear_screen_has_no_prompt() {
        let mut r = renderer("windows");
        r.clear_screen().unwrap();
        assert_eq!(output(&r), "\x1b[2J\x1b[1;1H");
    }

    #[test]
    fn unsupported_platform_falls_back() {
        let r = renderer("plan9");
        assert_eq!(r.handler(), PlatformHandler::fallback());
        assert_eq!(r.unsupported_platform().map(|e| e.os.as_str()), Some("plan9"));
    }

    #[test]
    fn print_line_translates_newlines() {
        let mut r = renderer("linux");
        r.print_line("one\ntwo\r\nthree").unwrap();
        assert_eq!(output(&r), "one\r\ntwo\r\nthree\r\n");
    }

    #[test]
    fn zero_width_is_not_a_width() {
        let mut r = renderer("linux");
        r.set_width(Some(0));
        assert_eq!(r.width(), None);
    }
}
