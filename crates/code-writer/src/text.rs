//! Plain writer: accumulates text and re-indents it.

use crate::buffer::{units, Buffer, Unit};
use crate::{Emitted, Origin, Writer};

/// Accumulates generated text without tracking where it came from.
#[derive(Debug, Clone)]
pub struct TextWriter {
    buffer: Buffer,
}

impl TextWriter {
    /// Creates a writer that indents with `indent_unit` per level.
    pub fn new(indent_unit: impl Into<String>) -> Self {
        Self {
            buffer: Buffer::new(indent_unit),
        }
    }

    /// Returns the text written so far.
    pub fn content(&self) -> &str {
        self.buffer.content()
    }

    /// Appends `text`, inserting the active indent after every line break.
    pub fn write_text(&mut self, text: &str) {
        if self.buffer.indent.is_empty() && self.buffer.push_unindented(text) {
            return;
        }

        for unit in units(text) {
            match unit {
                Unit::Char(ch) => self.buffer.push_char(ch),
                Unit::Break(line_break) => {
                    self.buffer.push_break(line_break);
                }
            }
        }
    }

    /// Consumes the writer and returns the text.
    pub fn finish(self) -> String {
        self.buffer.into_content()
    }
}

impl Default for TextWriter {
    fn default() -> Self {
        Self::new("\t")
    }
}

impl Writer for TextWriter {
    fn write(&mut self, text: &str, _origin: Option<Origin<'_>>) {
        self.write_text(text);
    }

    fn indent(&mut self) {
        self.buffer.indent.push();
    }

    fn unindent(&mut self) {
        self.buffer.indent.pop();
    }

    fn end(self: Box<Self>) -> Emitted {
        Emitted {
            content: self.finish(),
            source_map: None,
        }
    }
}
