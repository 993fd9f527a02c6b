//! Source map builder: parse, query, compose and serialize mapping tables.

use crate::codec::{decode_mappings, encode_mappings};
use crate::input::SourceMapInput;
use crate::mapping::{Mapping, MappingTable, OriginalRef};
use crate::raw::{RawSourceMap, ToRawSourceMap};
use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;
use std::ops::Range;
use tracing::debug;

/// A position in an original source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Original<'a> {
    /// Path of the original source.
    pub source: &'a str,
    /// 0-indexed line in the source.
    pub line: u32,
    /// 0-indexed column in the source.
    pub column: u32,
    /// Identifier name at this position.
    pub name: Option<&'a str>,
}

impl<'a> Original<'a> {
    /// Creates a position without a name.
    pub fn new(source: &'a str, line: u32, column: u32) -> Self {
        Self {
            source,
            line,
            column,
            name: None,
        }
    }

    /// Attaches an identifier name.
    pub fn with_name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }
}

/// The result of looking up a generated position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLocation<'a> {
    /// The position is covered by a point that has no known origin.
    Unmapped,
    /// The position maps into an original source.
    Original(Original<'a>),
}

impl<'a> SourceLocation<'a> {
    /// Returns the original position, if any.
    pub fn original(&self) -> Option<&Original<'a>> {
        match self {
            SourceLocation::Unmapped => None,
            SourceLocation::Original(original) => Some(original),
        }
    }
}

/// A position in the generated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeneratedLocation {
    /// 0-indexed generated line.
    pub line: u32,
    /// 0-indexed generated column.
    pub column: u32,
}

/// Owns a mapping table and the metadata written next to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMapBuilder {
    file: Option<String>,
    source_root: Option<String>,
    table: MappingTable,
}

impl SourceMapBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a serialized or structured source map.
    ///
    /// Indexed maps and versions other than 3 are rejected.
    pub fn parse<'a>(input: impl Into<SourceMapInput<'a>>) -> Result<Self> {
        let raw = input.into().normalize()?;
        if raw.sections.is_some() {
            return Err(Error::IndexedMap);
        }
        if let Some(version) = raw.version {
            if version != 3 {
                return Err(Error::UnsupportedVersion(version));
            }
        }

        let sources: Vec<String> = raw
            .sources
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
        let mut sources_content = raw.sources_content.unwrap_or_default();
        sources_content.truncate(sources.len());

        let mut table = MappingTable::new();
        table.load_tables(sources, sources_content, raw.names);
        decode_mappings(&raw.mappings, &mut table)?;

        debug!(
            file = raw.file.as_deref().unwrap_or(""),
            sources = table.sources().len(),
            lines = table.line_count(),
            "parsed source map"
        );

        Ok(Self {
            file: raw.file,
            source_root: raw.source_root,
            table,
        })
    }

    /// Returns the name of the generated file.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Sets the name of the generated file.
    pub fn set_file(&mut self, file: impl Into<String>) {
        self.file = Some(file.into());
    }

    /// Returns the source root.
    pub fn source_root(&self) -> Option<&str> {
        self.source_root.as_deref()
    }

    /// Sets the source root.
    pub fn set_source_root(&mut self, root: impl Into<String>) {
        self.source_root = Some(root.into());
    }

    /// Returns the underlying table.
    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    /// Returns the interned source paths.
    pub fn sources(&self) -> &[String] {
        self.table.sources()
    }

    /// Returns the interned identifier names.
    pub fn names(&self) -> &[String] {
        self.table.names()
    }

    /// Returns true if no point has been recorded.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Registers a source path and returns its index.
    pub fn add_source(&mut self, path: &str) -> u32 {
        self.table.add_source(path)
    }

    /// Registers an identifier name and returns its index.
    pub fn add_name(&mut self, name: &str) -> u32 {
        self.table.add_name(name)
    }

    /// Embeds the content of a source, registering the source if needed.
    pub fn set_source_content(&mut self, path: &str, content: impl Into<String>) {
        let index = self.table.add_source(path);
        self.table.set_source_content(index, Some(content.into()));
    }

    /// Returns the embedded content of a source.
    pub fn source_content(&self, path: &str) -> Option<&str> {
        self.table.source_content(self.table.find_source(path)?)
    }

    /// Records that generated `(line, column)` comes from `original`.
    ///
    /// `None` records a point with no known origin. An existing point at the
    /// same column is replaced.
    pub fn add_mapping(&mut self, line: u32, column: u32, original: Option<Original<'_>>) -> Mapping {
        let original = original.map(|original| OriginalRef {
            source: self.table.add_source(original.source),
            line: original.line,
            column: original.column,
            name: original.name.map(|name| self.table.add_name(name)),
        });
        let mapping = Mapping {
            generated_column: column,
            original,
        };
        self.table.insert(line, mapping);
        mapping
    }

    /// Inserts a point whose indices came from [`add_source`](Self::add_source)
    /// and [`add_name`](Self::add_name).
    pub fn insert_mapping(&mut self, line: u32, mapping: Mapping) {
        self.table.insert(line, mapping);
    }

    /// Finds the original position of generated `(line, column)`.
    ///
    /// The nearest point at or before `column` on the same line wins. With
    /// `align_column` the distance to that point is added to the original
    /// column. With `align_line`, a line without a qualifying point inherits
    /// the last point of the nearest earlier non-empty line, moved down by the
    /// number of lines in between; names do not carry over to other lines.
    pub fn get_source(
        &self,
        line: u32,
        column: u32,
        align_column: bool,
        align_line: bool,
    ) -> Option<SourceLocation<'_>> {
        let on_line = self
            .table
            .line(line)
            .and_then(|points| points.iter().rev().find(|m| m.generated_column <= column));
        if let Some(mapping) = on_line {
            let shift = if align_column {
                column - mapping.generated_column
            } else {
                0
            };
            return Some(self.locate(mapping.original, 0, shift, None, true));
        }

        if !align_line {
            return None;
        }
        let (found_line, mapping) = self.last_point_before(line)?;
        let column = if align_column { column } else { 0 };
        Some(self.locate(mapping.original, line - found_line, 0, Some(column), false))
    }

    fn locate(
        &self,
        original: Option<OriginalRef>,
        line_shift: u32,
        column_shift: u32,
        column_override: Option<u32>,
        keep_name: bool,
    ) -> SourceLocation<'_> {
        let Some(original) = original else {
            return SourceLocation::Unmapped;
        };
        let Some(source) = self.table.source(original.source) else {
            return SourceLocation::Unmapped;
        };
        SourceLocation::Original(Original {
            source,
            line: original.line.saturating_add(line_shift),
            column: column_override.unwrap_or_else(|| original.column.saturating_add(column_shift)),
            name: original
                .name
                .filter(|_| keep_name)
                .and_then(|name| self.table.name(name)),
        })
    }

    /// Finds every generated position that originates from `source` at `line`.
    ///
    /// Without a column, every point on that source line is returned. With a
    /// column, only points starting at or before it are considered and the
    /// closest ones are returned; ties are all kept.
    pub fn get_all_generated(
        &self,
        source: &str,
        line: u32,
        column: Option<u32>,
    ) -> Vec<GeneratedLocation> {
        let Some(index) = self.table.find_source(source) else {
            return Vec::new();
        };

        let mut found = Vec::new();
        let mut best = u32::MAX;
        for (generated_line, points) in self.table.lines() {
            for mapping in points {
                let Some(original) = mapping.original else {
                    continue;
                };
                if original.source != index || original.line != line {
                    continue;
                }
                let location = GeneratedLocation {
                    line: generated_line,
                    column: mapping.generated_column,
                };
                let Some(column) = column else {
                    found.push(location);
                    continue;
                };
                if original.column > column {
                    continue;
                }
                let offset = column - original.column;
                if offset < best {
                    best = offset;
                    found.clear();
                    found.push(location);
                } else if offset == best {
                    found.push(location);
                }
            }
        }
        found
    }

    /// Chains an earlier pass into this one.
    ///
    /// `self` maps an intermediate artifact to the final output and `other`
    /// maps the true sources to that intermediate artifact, which `self` knows
    /// as `file` (defaulting to `other.file()`). Afterwards `self` maps the
    /// true sources straight to the final output. Points that cannot be
    /// resolved through `other` become points with no known origin.
    pub fn apply_source_map(&mut self, other: &SourceMapBuilder, file: Option<&str>) {
        let Some(file) = file.or(other.file()) else {
            debug!("skipping source map composition: no file name to replace");
            return;
        };
        let Some(replaced) = self.table.find_source(file) else {
            debug!(file, "skipping source map composition: file is not a source");
            return;
        };

        // Detach the points first so removing the entry cannot confuse them
        // with the entries shifted into its slot.
        let mut pending = Vec::new();
        for line in 0..self.table.line_count() as u32 {
            let Some(points) = self.table.line(line) else {
                continue;
            };
            for (index, mapping) in points.iter().enumerate() {
                if let Some(original) = mapping.original {
                    if original.source == replaced {
                        pending.push((line, index, original));
                    }
                }
            }
        }
        for &(line, index, _) in &pending {
            self.table.line_mut(line)[index].original = None;
        }
        self.table.remove_source(replaced);

        let mut unresolved = 0usize;
        for &(line, index, original) in &pending {
            let resolved = match other.get_source(original.line, original.column, true, true) {
                Some(SourceLocation::Original(resolved)) => resolved,
                _ => {
                    unresolved += 1;
                    continue;
                }
            };
            let source = self.table.add_source(resolved.source);
            if self.table.source_content(source).is_none() {
                if let Some(content) = other.source_content(resolved.source) {
                    self.table.set_source_content(source, Some(content.to_string()));
                }
            }
            let name = resolved.name.map(|name| self.table.add_name(name));
            self.table.line_mut(line)[index].original = Some(OriginalRef {
                source,
                line: resolved.line,
                column: resolved.column,
                name,
            });
        }

        debug!(
            file,
            resolved = pending.len() - unresolved,
            unresolved,
            "applied source map"
        );
    }

    /// Materializes line-start points for every line of the map.
    pub fn compute_lines(&mut self) {
        let end = self.table.line_count() as u32;
        self.compute_lines_in(0..end);
    }

    /// Materializes line-start points for the lines in `range`.
    ///
    /// A line that does not start with a point at column 0 inherits the last
    /// point of the nearest earlier non-empty line, moved down by the line
    /// distance. Consumers never guess that continuation, so it is written
    /// out explicitly.
    pub fn compute_lines_in(&mut self, range: Range<u32>) {
        let mut computed = 0usize;
        let mut inherited = self.last_point_before(range.start);
        for line in range {
            let starts_at_zero = self
                .table
                .line(line)
                .and_then(|points| points.first())
                .is_some_and(|first| first.generated_column == 0);

            if !starts_at_zero {
                // Materialized even when there is nothing to inherit.
                self.table.line_mut(line);
                if let Some((previous, Mapping { original: Some(original), .. })) = inherited {
                    self.table.insert(
                        line,
                        Mapping {
                            generated_column: 0,
                            original: Some(OriginalRef {
                                source: original.source,
                                line: original.line.saturating_add(line - previous),
                                column: 0,
                                name: None,
                            }),
                        },
                    );
                    computed += 1;
                }
            }

            if let Some(last) = self.table.line(line).and_then(|points| points.last()) {
                inherited = Some((line, *last));
            }
        }
        debug!(computed, "computed line-start mappings");
    }

    /// The last point of the nearest non-empty line above `line`.
    fn last_point_before(&self, line: u32) -> Option<(u32, Mapping)> {
        let end = line.min(self.table.line_count() as u32);
        (0..end)
            .rev()
            .find_map(|previous| Some((previous, *self.table.line(previous)?.last()?)))
    }

    /// Produces the wire form of this map.
    pub fn to_raw(&self) -> RawSourceMap {
        let sources = self.table.sources();
        let sources_content = if self.table.sources_content().iter().any(Option::is_some) {
            let mut content = self.table.sources_content().to_vec();
            content.resize(sources.len(), None);
            Some(content)
        } else {
            None
        };

        RawSourceMap {
            version: Some(3),
            file: self.file.clone(),
            source_root: self.source_root.clone(),
            sources: sources.iter().cloned().map(Some).collect(),
            sources_content,
            names: self.table.names().to_vec(),
            mappings: encode_mappings(&self.table),
            sections: None,
        }
    }

    /// Serializes to JSON and wraps it in a base64 `data:` URL.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:application/json;charset=utf-8;base64,{}",
            STANDARD.encode(self.to_string())
        )
    }
}

impl ToRawSourceMap for SourceMapBuilder {
    fn to_raw(&self) -> RawSourceMap {
        SourceMapBuilder::to_raw(self)
    }
}

impl fmt::Display for SourceMapBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_raw().to_json().map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
