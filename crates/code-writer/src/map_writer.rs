//! Mapping writer: accumulates text and records a source map alongside it.

use crate::buffer::{units, utf16_len, Buffer, Unit};
use crate::char_class::{classify, CharClass};
use crate::{Emitted, Origin, Writer, WriterOptions};
use source_map::{Mapping, OriginalRef, SourceLocation, SourceMapBuilder};
use tracing::debug;

/// Accumulates generated text and the mapping of every span written into it.
///
/// Columns count UTF-16 code units.
#[derive(Debug, Clone)]
pub struct SourceMapWriter {
    buffer: Buffer,
    builder: SourceMapBuilder,
    line_mappings_only: bool,
    line: u32,
    column: u32,
    /// Whether the last recorded point carries an origin.
    covered: bool,
}

impl SourceMapWriter {
    /// Creates a writer from options.
    pub fn new(options: &WriterOptions) -> Self {
        let mut builder = SourceMapBuilder::new();
        if let Some(file) = &options.file {
            builder.set_file(file.as_str());
        }
        Self {
            buffer: Buffer::new(options.indent.as_str()),
            builder,
            line_mappings_only: options.line_mappings_only,
            line: 0,
            column: 0,
            covered: false,
        }
    }

    /// Returns the text written so far.
    pub fn content(&self) -> &str {
        self.buffer.content()
    }

    /// Returns the map recorded so far.
    pub fn source_map(&self) -> &SourceMapBuilder {
        &self.builder
    }

    /// Returns the current generated `(line, column)`.
    pub fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    /// Consumes the writer and returns the text and the map.
    pub fn finish(self) -> (String, SourceMapBuilder) {
        debug!(
            lines = self.line + 1,
            sources = self.builder.sources().len(),
            "finished mapped output"
        );
        (self.buffer.into_content(), self.builder)
    }

    fn push_break(&mut self, line_break: &str) {
        if self.buffer.push_break(line_break) {
            self.line += 1;
            self.column = self.buffer.indent.width();
        }
    }

    fn push_char(&mut self, ch: char) {
        self.buffer.push_char(ch);
        self.column += ch.len_utf16() as u32;
    }

    fn insert(&mut self, original: Option<OriginalRef>) {
        self.covered = original.is_some();
        self.builder.insert_mapping(
            self.line,
            Mapping {
                generated_column: self.column,
                original,
            },
        );
    }

    /// Stops the last recorded origin from leaking into text that has none.
    ///
    /// Points are only ever appended, so the last one recorded covers the
    /// current position on this line and, by line inheritance, on later ones.
    fn mark_unmapped(&mut self) {
        if self.covered {
            self.insert(None);
        }
    }

    fn write_generated(&mut self, text: &str) {
        let mut marked = false;
        for unit in units(text) {
            match unit {
                Unit::Break(line_break) => self.push_break(line_break),
                Unit::Char(ch) => {
                    if !marked {
                        self.mark_unmapped();
                        marked = true;
                    }
                    self.push_char(ch);
                }
            }
        }
    }

    /// Synthesizes points wherever the character class changes.
    fn write_inferred(&mut self, text: &str, origin: &Origin<'_>) {
        let source = self.builder.add_source(origin.path);
        let mut source_line = origin.line;
        let mut source_column = origin.column;
        let mut previous: Option<CharClass> = None;

        for unit in units(text) {
            match unit {
                Unit::Break(line_break) => {
                    self.push_break(line_break);
                    source_line += 1;
                    source_column = 0;
                    previous = Some(CharClass::LineBreak);
                }
                Unit::Char(ch) => {
                    let class = classify(ch);
                    let boundary = if self.line_mappings_only {
                        matches!(previous, None | Some(CharClass::LineBreak))
                    } else {
                        previous != Some(class)
                    };
                    if boundary {
                        self.insert(Some(OriginalRef {
                            source,
                            line: source_line,
                            column: source_column,
                            name: None,
                        }));
                    }
                    previous = Some(class);
                    self.push_char(ch);
                    source_column += ch.len_utf16() as u32;
                }
            }
        }
    }

    /// Re-emits the points of the source's own map at their new positions.
    fn write_copied(&mut self, text: &str, origin: &Origin<'_>, map: &SourceMapBuilder) {
        let mut source_line = origin.line;
        let mut source_column = origin.column;
        let mut cursor = 0;
        let mut line_start = true;

        for unit in units(text) {
            match unit {
                Unit::Break(line_break) => {
                    self.push_break(line_break);
                    source_line += 1;
                    source_column = 0;
                    cursor = 0;
                    line_start = true;
                }
                Unit::Char(ch) => {
                    let points = map.table().line(source_line).unwrap_or_default();
                    while cursor < points.len() && points[cursor].generated_column < source_column
                    {
                        cursor += 1;
                    }

                    if cursor < points.len() && points[cursor].generated_column == source_column {
                        let original = self.import(map, points[cursor].original);
                        self.insert(original);
                        cursor += 1;
                    } else if line_start {
                        // Nothing starts here; inherit whatever covers the position.
                        match map.get_source(source_line, source_column, true, true) {
                            Some(SourceLocation::Original(found)) => {
                                let source = self.builder.add_source(found.source);
                                self.carry_content(map, found.source, source);
                                let name = found.name.map(|name| self.builder.add_name(name));
                                self.insert(Some(OriginalRef {
                                    source,
                                    line: found.line,
                                    column: found.column,
                                    name,
                                }));
                            }
                            Some(SourceLocation::Unmapped) => self.insert(None),
                            None => self.mark_unmapped(),
                        }
                    }

                    line_start = false;
                    self.push_char(ch);
                    source_column += ch.len_utf16() as u32;
                }
            }
        }
    }

    /// Translates a point of `map` into this writer's tables.
    fn import(&mut self, map: &SourceMapBuilder, original: Option<OriginalRef>) -> Option<OriginalRef> {
        let original = original?;
        let path = map.table().source(original.source)?;
        let source = self.builder.add_source(path);
        self.carry_content(map, path, source);
        let name = original
            .name
            .and_then(|name| map.table().name(name))
            .map(|name| self.builder.add_name(name));
        Some(OriginalRef {
            source,
            line: original.line,
            column: original.column,
            name,
        })
    }

    fn carry_content(&mut self, map: &SourceMapBuilder, path: &str, source: u32) {
        if self.builder.table().source_content(source).is_some() {
            return;
        }
        if let Some(content) = map.source_content(path) {
            self.builder.set_source_content(path, content);
        }
    }
}

impl Writer for SourceMapWriter {
    fn write(&mut self, text: &str, origin: Option<Origin<'_>>) {
        match origin {
            None => self.write_generated(text),
            Some(origin) => match origin.map {
                Some(map) => self.write_copied(text, &origin, map),
                None => self.write_inferred(text, &origin),
            },
        }
    }

    fn indent(&mut self) {
        self.buffer.indent.push();
    }

    fn unindent(&mut self) {
        self.buffer.indent.pop();
    }

    fn end(self: Box<Self>) -> Emitted {
        let (content, source_map) = self.finish();
        Emitted {
            content,
            source_map: Some(source_map),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use source_map::Original;

    fn mapped_writer() -> SourceMapWriter {
        SourceMapWriter::new(&WriterOptions {
            source_map: true,
            ..Default::default()
        })
    }

    fn columns(writer: &SourceMapWriter, line: u32) -> Vec<u32> {
        writer
            .source_map()
            .table()
            .line(line)
            .unwrap_or_default()
            .iter()
            .map(|m| m.generated_column)
            .collect()
    }

    #[test]
    fn test_inference_splits_on_class_changes() {
        let mut writer = mapped_writer();
        writer.write("a;b", Some(Origin::new("in.js")));
        assert_eq!(columns(&writer, 0), vec![0, 1, 2]);
    }

    #[test]
    fn test_inference_keeps_runs_together() {
        let mut writer = mapped_writer();
        writer.write("foo = bar(1);", Some(Origin::new("in.js")));
        // foo, ' ', '=', ' ', bar, '(', 1, ')', ';'
        assert_eq!(columns(&writer, 0), vec![0, 3, 4, 5, 6, 9, 10, 11, 12]);
    }

    #[test]
    fn test_line_mappings_only() {
        let mut writer = SourceMapWriter::new(&WriterOptions {
            source_map: true,
            line_mappings_only: true,
            ..Default::default()
        });
        writer.write("a;b\nc d", Some(Origin::new("in.js")));
        assert_eq!(columns(&writer, 0), vec![0]);
        assert_eq!(columns(&writer, 1), vec![0]);
        assert_eq!(
            writer.source_map().get_source(1, 0, false, false),
            Some(SourceLocation::Original(Original::new("in.js", 1, 0)))
        );
    }

    #[test]
    fn test_line_breaks_advance_one_line_each() {
        let mut writer = mapped_writer();
        writer.write("a\r\nb\rc\nd", None);
        assert_eq!(writer.position(), (3, 1));
        writer.write("\r", None);
        writer.write("\n", None);
        assert_eq!(writer.position(), (4, 0));
        assert_eq!(writer.content(), "a\r\nb\rc\nd\r\n");
    }

    #[test]
    fn test_columns_count_utf16_units() {
        let mut writer = mapped_writer();
        writer.write("😀x", Some(Origin::new("in.js")));
        assert_eq!(writer.position(), (0, 3));
        assert_eq!(
            writer.source_map().get_source(0, 1, false, false),
            Some(SourceLocation::Original(Original::new("in.js", 0, 0)))
        );
        assert_eq!(
            writer.source_map().get_source(0, 2, false, false),
            Some(SourceLocation::Original(Original::new("in.js", 0, 2)))
        );
    }

    #[test]
    fn test_indent_shifts_generated_columns() {
        let mut writer = SourceMapWriter::new(&WriterOptions {
            source_map: true,
            indent: "  ".to_string(),
            ..Default::default()
        });
        writer.indent();
        writer.write("x\ny", Some(Origin::new("in.js").at(4, 2)));
        assert_eq!(writer.content(), "x\n  y");
        assert_eq!(
            writer.source_map().get_source(1, 2, false, false),
            Some(SourceLocation::Original(Original::new("in.js", 5, 0)))
        );
        assert_eq!(
            writer.source_map().get_source(0, 0, false, false),
            Some(SourceLocation::Original(Original::new("in.js", 4, 2)))
        );
    }

    #[test]
    fn test_generated_text_is_marked_unmapped() {
        let mut writer = mapped_writer();
        writer.write("a", Some(Origin::new("in.js")));
        writer.write(" + 1", None);
        assert_eq!(
            writer.source_map().get_source(0, 2, false, false),
            Some(SourceLocation::Unmapped)
        );

        // Nothing to cut off: no marker is added.
        let mut writer = mapped_writer();
        writer.write("header\n", None);
        assert!(writer.source_map().is_empty());
    }

    #[test]
    fn test_generated_lines_after_mapped_text_are_unmapped() {
        let mut writer = mapped_writer();
        writer.indent();
        writer.write("(function () {\n", None);
        writer.write("let a = 1;", Some(Origin::new("in.js")));
        writer.unindent();
        writer.write("\n})();\n", None);

        assert_eq!(writer.content(), "(function () {\n\tlet a = 1;\n})();\n");
        assert_eq!(columns(&writer, 2), vec![0]);
        let map = writer.source_map();
        assert_eq!(map.get_source(2, 3, true, true), Some(SourceLocation::Unmapped));
        assert_eq!(map.get_source(3, 0, true, true), Some(SourceLocation::Unmapped));
        assert_eq!(map.get_source(0, 3, true, true), None);
    }

    #[test]
    fn test_copy_mode_reuses_input_points() {
        let mut input = SourceMapBuilder::new();
        input.add_mapping(0, 0, Some(Original::new("orig.ts", 10, 0)));
        input.add_mapping(0, 4, Some(Original::new("orig.ts", 10, 8).with_name("value")));
        input.add_mapping(1, 2, Some(Original::new("orig.ts", 11, 0)));
        input.set_source_content("orig.ts", "let value;");

        let mut writer = mapped_writer();
        writer.write("// banner\n", None);
        writer.write(
            "var value;\n  ok",
            Some(Origin::new("mid.js").with_map(&input)),
        );

        let map = writer.source_map();
        assert_eq!(columns(&writer, 1), vec![0, 4]);
        assert_eq!(
            map.get_source(1, 4, false, false),
            Some(SourceLocation::Original(
                Original::new("orig.ts", 10, 8).with_name("value")
            ))
        );
        // Line 2 starts before the first input point on that line, so the
        // previous line's mapping is inherited at its start.
        assert_eq!(columns(&writer, 2), vec![0, 2]);
        assert_eq!(
            map.get_source(2, 0, false, false),
            Some(SourceLocation::Original(Original::new("orig.ts", 11, 0)))
        );
        assert_eq!(map.sources(), &["orig.ts".to_string()]);
        assert_eq!(map.source_content("orig.ts"), Some("let value;"));
    }

    #[test]
    fn test_copy_mode_starts_mid_line() {
        let mut input = SourceMapBuilder::new();
        input.add_mapping(3, 0, Some(Original::new("orig.ts", 0, 0)));
        input.add_mapping(3, 6, Some(Original::new("orig.ts", 0, 20)));

        let mut writer = mapped_writer();
        writer.write("xy", Some(Origin::new("mid.js").with_map(&input).at(3, 5)));

        assert_eq!(columns(&writer, 0), vec![0, 1]);
        assert_eq!(
            writer.source_map().get_source(0, 0, false, false),
            Some(SourceLocation::Original(Original::new("orig.ts", 0, 5)))
        );
        assert_eq!(
            writer.source_map().get_source(0, 1, false, false),
            Some(SourceLocation::Original(Original::new("orig.ts", 0, 20)))
        );
    }
}
