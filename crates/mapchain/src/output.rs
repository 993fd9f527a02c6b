//! Output formatting.

use crate::cli::OutputFormat;
use serde::Serialize;
use source_map::{GeneratedLocation, SourceLocation, SourceMapBuilder};

/// A position in generated or original text (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column number.
    pub column: u32,
}

/// An original position as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OriginalPosition {
    /// Original source path.
    pub source: String,
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column number.
    pub column: u32,
    /// Identifier name, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The answer to a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupReport {
    /// The queried generated position.
    pub generated: Position,
    /// Whether any mapping covers the position.
    pub mapped: bool,
    /// Where it came from, when known.
    pub original: Option<OriginalPosition>,
}

impl LookupReport {
    /// Builds a report from the builder's answer.
    pub fn new(generated: Position, location: Option<SourceLocation<'_>>) -> Self {
        let original = location.as_ref().and_then(SourceLocation::original).map(|original| {
            OriginalPosition {
                source: original.source.to_string(),
                line: original.line,
                column: original.column,
                name: original.name.map(str::to_string),
            }
        });
        Self {
            generated,
            mapped: location.is_some(),
            original,
        }
    }
}

/// One decoded point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectedPoint {
    /// Generated column.
    pub generated_column: u32,
    /// Where the column came from; `None` marks generated text.
    pub original: Option<OriginalPosition>,
}

/// All points of one generated line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectedLine {
    /// 0-indexed generated line.
    pub line: u32,
    /// Points in column order.
    pub points: Vec<InspectedPoint>,
}

/// A decoded source map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    /// Generated file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Original sources.
    pub sources: Vec<String>,
    /// Identifier names.
    pub names: Vec<String>,
    /// Non-empty lines.
    pub lines: Vec<InspectedLine>,
}

impl InspectReport {
    /// Resolves every point of `map` against its tables.
    pub fn new(map: &SourceMapBuilder) -> Self {
        let table = map.table();
        let lines = table
            .lines()
            .filter(|(_, points)| !points.is_empty())
            .map(|(line, points)| InspectedLine {
                line,
                points: points
                    .iter()
                    .map(|point| InspectedPoint {
                        generated_column: point.generated_column,
                        original: point.original.map(|original| OriginalPosition {
                            source: table.source(original.source).unwrap_or_default().to_string(),
                            line: original.line,
                            column: original.column,
                            name: original
                                .name
                                .and_then(|name| table.name(name))
                                .map(str::to_string),
                        }),
                    })
                    .collect(),
            })
            .collect();

        Self {
            file: map.file().map(str::to_string),
            sources: map.sources().to_vec(),
            names: map.names().to_vec(),
            lines,
        }
    }
}

/// Formats command results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a lookup result.
    pub fn lookup(&self, report: &LookupReport) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report),
            OutputFormat::Human => {
                let target = match (&report.original, report.mapped) {
                    (Some(original), _) => format_original(original),
                    (None, true) => "(generated)".to_string(),
                    (None, false) => "(no mapping)".to_string(),
                };
                Ok(format!(
                    "{}:{} -> {}",
                    report.generated.line + 1,
                    report.generated.column + 1,
                    target
                ))
            }
        }
    }

    /// Formats the generated positions of an original position.
    pub fn generated(&self, positions: &[GeneratedLocation]) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Json => {
                let positions: Vec<Position> = positions
                    .iter()
                    .map(|p| Position {
                        line: p.line,
                        column: p.column,
                    })
                    .collect();
                serde_json::to_string_pretty(&positions)
            }
            OutputFormat::Human if positions.is_empty() => Ok("(no mapping)".to_string()),
            OutputFormat::Human => Ok(positions
                .iter()
                .map(|p| format!("{}:{}", p.line + 1, p.column + 1))
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Formats a decoded map.
    pub fn inspect(&self, report: &InspectReport) -> Result<String, serde_json::Error> {
        if self.format == OutputFormat::Json {
            return serde_json::to_string_pretty(report);
        }

        let mut output = String::new();
        if let Some(file) = &report.file {
            output.push_str(&format!("file: {}\n", file));
        }
        output.push_str(&format!("sources: {}\n", report.sources.join(", ")));
        if !report.names.is_empty() {
            output.push_str(&format!("names: {}\n", report.names.join(", ")));
        }
        for line in &report.lines {
            output.push_str(&format!("line {}\n", line.line + 1));
            for point in &line.points {
                let target = point
                    .original
                    .as_ref()
                    .map(format_original)
                    .unwrap_or_else(|| "(generated)".to_string());
                output.push_str(&format!("  {:>4} -> {}\n", point.generated_column + 1, target));
            }
        }
        Ok(output.trim_end().to_string())
    }
}

fn format_original(original: &OriginalPosition) -> String {
    let mut out = format!("{}:{}:{}", original.source, original.line + 1, original.column + 1);
    if let Some(name) = &original.name {
        out.push_str(&format!(" ({})", name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use source_map::Original;

    fn sample() -> SourceMapBuilder {
        let mut map = SourceMapBuilder::new();
        map.set_file("out.js");
        map.add_mapping(0, 0, Some(Original::new("in.ts", 2, 4).with_name("main")));
        map.add_mapping(0, 9, None);
        map.add_mapping(2, 2, Some(Original::new("in.ts", 3, 0)));
        map
    }

    #[test]
    fn test_lookup_human() {
        let map = sample();
        let formatter = Formatter::new(OutputFormat::Human);
        let position = Position { line: 0, column: 3 };

        let found = LookupReport::new(position, map.get_source(0, 3, true, true));
        assert_eq!(formatter.lookup(&found).unwrap(), "1:4 -> in.ts:3:8 (main)");

        let generated = LookupReport::new(Position { line: 0, column: 10 }, map.get_source(0, 10, true, true));
        assert_eq!(formatter.lookup(&generated).unwrap(), "1:11 -> (generated)");

        let missing = LookupReport::new(Position { line: 2, column: 0 }, map.get_source(2, 0, false, false));
        assert_eq!(formatter.lookup(&missing).unwrap(), "3:1 -> (no mapping)");
    }

    #[test]
    fn test_lookup_json() {
        let map = sample();
        let report = LookupReport::new(Position { line: 2, column: 5 }, map.get_source(2, 5, false, false));
        let json: serde_json::Value =
            serde_json::from_str(&Formatter::new(OutputFormat::Json).lookup(&report).unwrap()).unwrap();
        insta::assert_json_snapshot!(json, @r#"
        {
          "generated": {
            "column": 5,
            "line": 2
          },
          "mapped": true,
          "original": {
            "column": 0,
            "line": 3,
            "source": "in.ts"
          }
        }
        "#);
    }

    #[test]
    fn test_inspect_human() {
        let report = InspectReport::new(&sample());
        let text = Formatter::new(OutputFormat::Human).inspect(&report).unwrap();
        assert_eq!(
            text,
            "file: out.js\n\
             sources: in.ts\n\
             names: main\n\
             line 1\n     \
             1 -> in.ts:3:5 (main)\n    \
             10 -> (generated)\n\
             line 3\n     \
             3 -> in.ts:4:1"
        );
    }

    #[test]
    fn test_generated_positions() {
        let formatter = Formatter::new(OutputFormat::Human);
        assert_eq!(formatter.generated(&[]).unwrap(), "(no mapping)");
        let positions = [
            GeneratedLocation { line: 0, column: 0 },
            GeneratedLocation { line: 4, column: 2 },
        ];
        assert_eq!(formatter.generated(&positions).unwrap(), "1:1\n5:3");
    }
}
