#![forbid(unsafe_code)]

//! Unsent input accumulated between dispatches.
//!
//! # Invariants
//!
//! 1. The buffer never contains the submitting Enter; multi-line input is
//!    an explicit embedded `\n` added by [`EditBuffer::append_continuation`].
//! 2. No operation fails. [`EditBuffer::backspace`] on an empty buffer
//!    returns `None` and leaves the buffer untouched.
//! 3. `char_count` always equals `text.chars().count()`.

/// Mutable text accumulator for the line editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditBuffer {
    text: String,
    char_count: usize,
}

impl EditBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one character.
    pub fn append(&mut self, ch: char) {
        self.text.push(ch);
        self.char_count += 1;
    }

    /// Append an embedded newline without submitting the buffer.
    pub fn append_continuation(&mut self) {
        self.append('\n');
    }

    /// Remove and return the last character, if any.
    pub fn backspace(&mut self) -> Option<char> {
        let removed = self.text.pop()?;
        self.char_count -= 1;
        Some(removed)
    }

    /// Take the contents, leaving the buffer empty.
    pub fn drain(&mut self) -> String {
        self.char_count = 0;
        std::mem::take(&mut self.text)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.char_count
    }

    /// Text after the last embedded newline.
    #[must_use]
    pub fn current_line(&self) -> &str {
        match self.text.rfind('\n') {
            Some(idx) => &self.text[idx + 1..],
            None => &self.text,
        }
    }

    /// True when the buffer spans more than one line.
    #[must_use]
    pub fn is_multiline(&self) -> bool {
        self.text.contains('\n')
    }
}
