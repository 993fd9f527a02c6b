//! Output buffer shared by both writers.

/// Splits text into characters and line breaks.
///
/// `\r\n`, `\r` and `\n` each come out as a single break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Unit<'a> {
    Char(char),
    Break(&'a str),
}

pub(crate) struct Units<'a> {
    text: &'a str,
    pos: usize,
}

pub(crate) fn units(text: &str) -> Units<'_> {
    Units { text, pos: 0 }
}

impl<'a> Iterator for Units<'a> {
    type Item = Unit<'a>;

    fn next(&mut self) -> Option<Unit<'a>> {
        let rest = &self.text[self.pos..];
        let ch = rest.chars().next()?;
        let unit = match ch {
            '\r' if rest.as_bytes().get(1) == Some(&b'\n') => Unit::Break(&rest[..2]),
            '\r' | '\n' => Unit::Break(&rest[..1]),
            _ => Unit::Char(ch),
        };
        self.pos += match unit {
            Unit::Char(ch) => ch.len_utf8(),
            Unit::Break(text) => text.len(),
        };
        Some(unit)
    }
}

/// A stack of a fixed indent unit.
#[derive(Debug, Clone)]
pub(crate) struct Indent {
    unit: String,
    current: String,
    width: u32,
}

impl Indent {
    pub(crate) fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            current: String::new(),
            width: 0,
        }
    }

    pub(crate) fn push(&mut self) {
        self.current.push_str(&self.unit);
        self.width += utf16_len(&self.unit);
    }

    pub(crate) fn pop(&mut self) {
        if self.current.len() >= self.unit.len() && !self.unit.is_empty() {
            self.current.truncate(self.current.len() - self.unit.len());
            self.width -= utf16_len(&self.unit);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Width of the active indent in UTF-16 code units.
    pub(crate) fn width(&self) -> u32 {
        self.width
    }
}

/// Accumulated output with indentation after every line break.
#[derive(Debug, Clone)]
pub(crate) struct Buffer {
    content: String,
    pub(crate) indent: Indent,
    /// Byte offset just past a lone `\r` that ended the last write.
    open_cr: Option<usize>,
}

impl Buffer {
    pub(crate) fn new(indent_unit: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            indent: Indent::new(indent_unit),
            open_cr: None,
        }
    }

    pub(crate) fn content(&self) -> &str {
        &self.content
    }

    pub(crate) fn into_content(self) -> String {
        self.content
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        self.content.push(ch);
        self.open_cr = None;
    }

    /// Appends text verbatim, for use while no indent is active.
    ///
    /// Falls back to [`push_break`](Self::push_break) handling when a `\r`
    /// from the previous write is still waiting for its `\n`.
    pub(crate) fn push_unindented(&mut self, text: &str) -> bool {
        if self.open_cr.is_some() || text.is_empty() {
            return false;
        }
        self.content.push_str(text);
        self.open_cr = text.ends_with('\r').then_some(self.content.len());
        true
    }

    /// Appends a line break and the active indent.
    ///
    /// Returns false when the break is the `\n` half of a `\r\n` split across
    /// two writes; that `\n` joins the earlier break instead of starting a line.
    pub(crate) fn push_break(&mut self, line_break: &str) -> bool {
        if line_break == "\n" {
            if let Some(at) = self.open_cr.take() {
                self.content.insert(at, '\n');
                return false;
            }
        }
        self.content.push_str(line_break);
        let after = self.content.len();
        self.content.push_str(&self.indent.current);
        self.open_cr = (line_break == "\r").then_some(after);
        true
    }
}

pub(crate) fn utf16_len(text: &str) -> u32 {
    text.chars().map(|ch| ch.len_utf16() as u32).sum()
}
