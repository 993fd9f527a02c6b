//! The in-memory mapping table.

/// Where a mapping point came from in an original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginalRef {
    /// Index into the table's sources.
    pub source: u32,
    /// 0-indexed line in the source.
    pub line: u32,
    /// 0-indexed column in the source.
    pub column: u32,
    /// Index into the table's names.
    pub name: Option<u32>,
}

/// A single correspondence between a generated column and an original position.
///
/// A point without an original marks generated text with no known origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mapping {
    /// 0-indexed column in the generated line.
    pub generated_column: u32,
    /// The original position, if any.
    pub original: Option<OriginalRef>,
}

impl Mapping {
    /// Creates a point with no known origin.
    #[inline]
    pub fn unmapped(generated_column: u32) -> Self {
        Self {
            generated_column,
            original: None,
        }
    }

    /// Returns true if this point carries an original position.
    #[inline]
    pub fn has_source(&self) -> bool {
        self.original.is_some()
    }
}

/// Mapping points per generated line, plus the interned sources and names.
///
/// Lines are stored in a sparse arena: a line without points costs a single
/// `None` slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    lines: Vec<Option<Vec<Mapping>>>,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    names: Vec<String>,
}

impl MappingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of generated lines the table spans.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if no line holds a point.
    pub fn is_empty(&self) -> bool {
        self.lines.iter().flatten().all(Vec::is_empty)
    }

    /// Returns the points of a generated line, if the line is materialized.
    pub fn line(&self, line: u32) -> Option<&[Mapping]> {
        self.lines.get(line as usize)?.as_deref()
    }

    /// Returns the points of a generated line, materializing it if needed.
    pub(crate) fn line_mut(&mut self, line: u32) -> &mut Vec<Mapping> {
        let index = line as usize;
        if index >= self.lines.len() {
            self.lines.resize_with(index + 1, || None);
        }
        self.lines[index].get_or_insert_with(Vec::new)
    }

    /// Iterates over `(line, points)` for every materialized line.
    pub fn lines(&self) -> impl Iterator<Item = (u32, &[Mapping])> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(line, points)| Some((line as u32, points.as_deref()?)))
    }

    pub(crate) fn lines_mut(&mut self) -> impl Iterator<Item = &mut Vec<Mapping>> {
        self.lines.iter_mut().flatten()
    }

    /// Pads the arena so that it spans at least `count` lines.
    pub(crate) fn ensure_lines(&mut self, count: usize) {
        if count > self.lines.len() {
            self.lines.resize_with(count, || None);
        }
    }

    /// Inserts a point, keeping the line sorted by generated column.
    ///
    /// A point at an existing column replaces the old one. The scan starts at
    /// the end of the line since forward writing appends almost always.
    pub fn insert(&mut self, line: u32, mapping: Mapping) {
        let points = self.line_mut(line);
        let mut index = points.len();
        while index > 0 {
            let previous = points[index - 1].generated_column;
            if previous == mapping.generated_column {
                points[index - 1] = mapping;
                return;
            }
            if previous < mapping.generated_column {
                break;
            }
            index -= 1;
        }
        points.insert(index, mapping);
    }

    /// Returns the interned sources.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Returns the interned names.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the source at `index`.
    pub fn source(&self, index: u32) -> Option<&str> {
        self.sources.get(index as usize).map(String::as_str)
    }

    /// Returns the name at `index`.
    pub fn name(&self, index: u32) -> Option<&str> {
        self.names.get(index as usize).map(String::as_str)
    }

    /// Returns the embedded content of the source at `index`.
    pub fn source_content(&self, index: u32) -> Option<&str> {
        self.sources_content.get(index as usize)?.as_deref()
    }

    /// Returns the content table, aligned by index with the sources.
    pub fn sources_content(&self) -> &[Option<String>] {
        &self.sources_content
    }

    /// Looks a source up without registering it.
    pub fn find_source(&self, path: &str) -> Option<u32> {
        intern_lookup(&self.sources, path)
    }

    /// Looks a name up without registering it.
    pub fn find_name(&self, name: &str) -> Option<u32> {
        intern_lookup(&self.names, name)
    }

    /// Registers a source path and returns its index.
    ///
    /// A case-insensitive match counts as the same source, so `A.js` and
    /// `a.js` share one entry.
    pub fn add_source(&mut self, path: &str) -> u32 {
        if let Some(index) = self.find_source(path) {
            return index;
        }
        self.sources.push(path.to_string());
        (self.sources.len() - 1) as u32
    }

    /// Registers an identifier name and returns its index.
    pub fn add_name(&mut self, name: &str) -> u32 {
        if let Some(index) = self.find_name(name) {
            return index;
        }
        self.names.push(name.to_string());
        (self.names.len() - 1) as u32
    }

    /// Sets the embedded content of the source at `index`.
    pub fn set_source_content(&mut self, index: u32, content: Option<String>) {
        let index = index as usize;
        if index >= self.sources_content.len() {
            if content.is_none() {
                return;
            }
            self.sources_content.resize_with(index + 1, || None);
        }
        self.sources_content[index] = content;
    }

    /// Removes the source at `index` with its content and shifts the greater
    /// source indices of every point down by one.
    ///
    /// Points that referenced the removed source are left untouched; callers
    /// rewrite them first.
    pub(crate) fn remove_source(&mut self, index: u32) {
        if (index as usize) >= self.sources.len() {
            return;
        }
        self.sources.remove(index as usize);
        if (index as usize) < self.sources_content.len() {
            self.sources_content.remove(index as usize);
        }
        for original in self
            .lines
            .iter_mut()
            .flatten()
            .flatten()
            .filter_map(|mapping| mapping.original.as_mut())
        {
            if original.source > index {
                original.source -= 1;
            }
        }
    }

    /// Loads tables verbatim from a parsed map, keeping their indices stable.
    pub(crate) fn load_tables(
        &mut self,
        sources: Vec<String>,
        sources_content: Vec<Option<String>>,
        names: Vec<String>,
    ) {
        self.sources = sources;
        self.sources_content = sources_content;
        self.names = names;
    }
}

fn intern_lookup(table: &[String], value: &str) -> Option<u32> {
    table
        .iter()
        .position(|entry| entry == value)
        .or_else(|| {
            table
                .iter()
                .position(|entry| entry.eq_ignore_ascii_case(value))
        })
        .map(|index| index as u32)
}
