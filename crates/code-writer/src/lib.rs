//! Text writers for mapchain.
//!
//! A writer accumulates generated text, re-indents it after every line break
//! and, when asked to, records a source map of where each span came from.
//!
//! # Example
//!
//! ```
//! use code_writer::{create_writer, Origin, WriterOptions};
//! use source_map::{Original, SourceLocation};
//!
//! let mut writer = create_writer(&WriterOptions {
//!     source_map: true,
//!     ..Default::default()
//! });
//! writer.write("/* banner */\n", None);
//! writer.write("let x = 1;", Some(Origin::new("input.js")));
//!
//! let emitted = writer.end();
//! let map = emitted.source_map.expect("mapping writer");
//! assert_eq!(
//!     map.get_source(1, 4, false, false),
//!     Some(SourceLocation::Original(Original::new("input.js", 0, 4))),
//! );
//! ```

mod buffer;
mod char_class;
mod map_writer;
mod text;

pub use char_class::{classify, CharClass};
pub use map_writer::SourceMapWriter;
pub use text::TextWriter;

use source_map::SourceMapBuilder;
use std::ops::Range;

/// Options for [`create_writer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Record a source map alongside the text.
    pub source_map: bool,
    /// Text inserted once per indent level after every line break.
    pub indent: String,
    /// Record one point per generated line instead of one per token.
    pub line_mappings_only: bool,
    /// Name of the generated file, written into the map.
    pub file: Option<String>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            source_map: false,
            indent: "\t".to_string(),
            line_mappings_only: false,
            file: None,
        }
    }
}

/// Where a written span came from.
#[derive(Debug, Clone, Copy)]
pub struct Origin<'a> {
    /// Path of the file the text was read from.
    pub path: &'a str,
    /// The file's own source map. When present, its points are copied
    /// instead of inferring new ones.
    pub map: Option<&'a SourceMapBuilder>,
    /// 0-indexed line of the first written character in `path`.
    pub line: u32,
    /// 0-indexed UTF-16 column of the first written character in `path`.
    pub column: u32,
}

impl<'a> Origin<'a> {
    /// Text starting at the beginning of `path`.
    pub fn new(path: &'a str) -> Self {
        Self {
            path,
            map: None,
            line: 0,
            column: 0,
        }
    }

    /// Copies points from the file's own map.
    pub fn with_map(mut self, map: &'a SourceMapBuilder) -> Self {
        self.map = Some(map);
        self
    }

    /// Text starting at `(line, column)` of `path`.
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.line = line;
        self.column = column;
        self
    }
}

/// Something generated text can be written to.
pub trait Writer {
    /// Appends `text`. `origin` says where it was read from; `None` marks
    /// text the caller generated itself.
    fn write(&mut self, text: &str, origin: Option<Origin<'_>>);

    /// Appends `text[range]`.
    ///
    /// `origin` describes the position of `range.start`. A range that runs
    /// past `text` or splits a character writes nothing.
    fn write_slice(&mut self, text: &str, range: Range<usize>, origin: Option<Origin<'_>>) {
        match text.get(range.clone()) {
            Some(slice) => self.write(slice, origin),
            None => tracing::warn!(?range, len = text.len(), "slice out of bounds, skipped"),
        }
    }

    /// Increases the indent applied after the next line break.
    fn indent(&mut self);

    /// Decreases the indent applied after the next line break.
    fn unindent(&mut self);

    /// Consumes the writer.
    fn end(self: Box<Self>) -> Emitted;
}

/// The output of a finished writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    /// The generated text.
    pub content: String,
    /// The recorded map, if the writer kept one.
    pub source_map: Option<SourceMapBuilder>,
}

impl Emitted {
    /// Composes the recorded map over `previous`, the map of the input this
    /// output was produced from.
    ///
    /// `file` names that input in the recorded map; `None` uses
    /// `previous`'s own `file`. Without a recorded map this does nothing.
    pub fn chain(mut self, previous: &SourceMapBuilder, file: Option<&str>) -> Self {
        if let Some(map) = &mut self.source_map {
            map.apply_source_map(previous, file);
        }
        self
    }
}

/// Creates a [`SourceMapWriter`] when `options.source_map` is set and a
/// [`TextWriter`] otherwise.
pub fn create_writer(options: &WriterOptions) -> Box<dyn Writer> {
    if options.source_map {
        Box::new(SourceMapWriter::new(options))
    } else {
        Box::new(TextWriter::new(options.indent.as_str()))
    }
}
