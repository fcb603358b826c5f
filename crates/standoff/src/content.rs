//! Shared text content
//!
//! Text lives in one append-only buffer. Elements never store text, they only
//! point into the buffer with spans, so offsets stay valid for the lifetime of
//! the buffer. Once a document owns the buffer it is shared read-only through
//! `Arc`, and two documents have the same content exactly when they hold the
//! same `Arc`.

use std::fmt;

use crate::types::Span;

/// Append-only text store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentBuffer {
    text: String,
}

impl ContentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
        }
    }

    /// Append text, returning the span it now occupies
    pub fn push_str(&mut self, text: &str) -> Span {
        let start = self.text.len();
        self.text.push_str(text);
        Span::new(start, self.text.len())
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Text between two absolute offsets, clamped to the buffer
    ///
    /// Offsets that fall inside a multi-byte character yield an empty string.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.text.len());
        let start = start.min(end);
        self.text.get(start..end).unwrap_or("")
    }

    /// Whether `pos` is at the start or end of a character, or at the buffer end
    pub fn is_char_boundary(&self, pos: usize) -> bool {
        self.text.is_char_boundary(pos)
    }

    pub fn slice_span(&self, span: Span) -> &str {
        self.slice(span.start, span.end)
    }
}

impl From<String> for ContentBuffer {
    fn from(text: String) -> Self {
        Self { text }
    }
}

impl From<&str> for ContentBuffer {
    fn from(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

/// A document's window over the buffer
///
/// Offsets taken by [`ContentView`] are relative to the window start.
#[derive(Debug, Clone, Copy)]
pub struct ContentView<'a> {
    buffer: &'a ContentBuffer,
    window: Span,
}

impl<'a> ContentView<'a> {
    pub fn new(buffer: &'a ContentBuffer, window: Span) -> Self {
        Self { buffer, window }
    }

    /// Absolute span covered by this view
    pub fn window(&self) -> Span {
        self.window
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn as_str(&self) -> &'a str {
        self.buffer.slice_span(self.window)
    }

    /// Text between two window-relative offsets
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        let start = (self.window.start + start).min(self.window.end);
        let end = (self.window.start + end).min(self.window.end);
        self.buffer.slice(start, end)
    }
}

impl fmt::Display for ContentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
