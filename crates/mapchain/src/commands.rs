//! Subcommand execution.

use crate::cli::{Args, Command};
use crate::config::Config;
use crate::output::{Formatter, InspectReport, LookupReport, Position};
use camino::{Utf8Path, Utf8PathBuf};
use code_writer::{create_writer, Origin, WriterOptions};
use source_map::{
    find_source_mapping_url, upsert_source_mapping_url, ByteOffset, LineIndex, SourceMapBuilder,
};
use std::fs;
use thiserror::Error;
use tracing::{debug, warn};

/// Command errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file is not a usable source map.
    #[error("invalid source map {path}: {source}")]
    InvalidMap {
        path: Utf8PathBuf,
        #[source]
        source: source_map::Error,
    },

    /// Failed to serialize output.
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The file has no sourceMappingURL comment.
    #[error("{0} has no sourceMappingURL comment")]
    NoSourceMappingUrl(Utf8PathBuf),

    /// A byte offset lies past the end of the generated file.
    #[error("offset {offset} is outside {path}")]
    OffsetOutOfRange { path: Utf8PathBuf, offset: u32 },

    /// A byte offset splits a character.
    #[error("offset {offset} is not on a character boundary in {path}")]
    OffsetNotOnBoundary { path: Utf8PathBuf, offset: u32 },

    /// Lines and columns on the command line start at 1.
    #[error("lines and columns start at 1")]
    ZeroPosition,

    /// Neither a line/column pair nor an offset was given.
    #[error("either --line and --column or --generated and --offset is required")]
    MissingPosition,
}

/// Runs the selected subcommand and returns what should be printed.
pub fn run(args: &Args, config: &Config) -> Result<String, CommandError> {
    let formatter = Formatter::new(args.output);
    match &args.command {
        Command::Compose {
            map,
            previous,
            file,
            fill_lines,
            out,
        } => compose(
            map,
            previous,
            file.as_deref(),
            *fill_lines,
            out.as_deref(),
            config,
        ),
        Command::Lookup {
            map,
            line,
            column,
            generated,
            offset,
            exact,
        } => {
            let map = read_map(map)?;
            let position = match (line, column, generated, offset) {
                (Some(line), Some(column), _, _) => one_based(*line, *column)?,
                (_, _, Some(generated), Some(offset)) => offset_position(generated, *offset)?,
                _ => return Err(CommandError::MissingPosition),
            };
            let report = lookup(&map, position, *exact);
            Ok(formatter.lookup(&report)?)
        }
        Command::Find {
            map,
            source,
            line,
            column,
        } => {
            let map = read_map(map)?;
            let start = one_based(*line, column.unwrap_or(1))?;
            let positions =
                map.get_all_generated(source, start.line, column.map(|_| start.column));
            Ok(formatter.generated(&positions)?)
        }
        Command::Inspect { map } => {
            let map = read_map(map)?;
            Ok(formatter.inspect(&InspectReport::new(&map))?)
        }
        Command::Url {
            file,
            set,
            remove,
            block,
            write,
        } => url(file, set.as_deref(), *remove, *block, *write, config),
        Command::Generate {
            source,
            out,
            line_only,
            indent,
            wrap,
        } => generate(
            source,
            out,
            GenerateOptions {
                line_only: *line_only || config.line_mappings_only.unwrap_or(false),
                indent: indent
                    .clone()
                    .or_else(|| config.indent.clone())
                    .unwrap_or_else(|| "\t".to_string()),
                wrap: *wrap,
            },
            config,
        ),
    }
}

fn read(path: &Utf8Path) -> Result<String, CommandError> {
    fs::read_to_string(path).map_err(|source| CommandError::Read {
        path: path.to_owned(),
        source,
    })
}

fn write(path: &Utf8Path, content: &str) -> Result<(), CommandError> {
    fs::write(path, content).map_err(|source| CommandError::Write {
        path: path.to_owned(),
        source,
    })
}

/// Reads and parses a source map file.
pub fn read_map(path: &Utf8Path) -> Result<SourceMapBuilder, CommandError> {
    let text = read(path)?;
    SourceMapBuilder::parse(text.as_str()).map_err(|source| CommandError::InvalidMap {
        path: path.to_owned(),
        source,
    })
}

fn one_based(line: u32, column: u32) -> Result<Position, CommandError> {
    if line == 0 || column == 0 {
        return Err(CommandError::ZeroPosition);
    }
    Ok(Position {
        line: line - 1,
        column: column - 1,
    })
}

/// Converts a byte offset in `path` to a line and UTF-16 column.
fn offset_position(path: &Utf8Path, offset: u32) -> Result<Position, CommandError> {
    let text = read(path)?;
    let index = LineIndex::new(&text);
    let line_col = index
        .line_col(ByteOffset::from(offset))
        .ok_or_else(|| CommandError::OffsetOutOfRange {
            path: path.to_owned(),
            offset,
        })?;
    let start = index
        .line_start(line_col.line)
        .map(u32::from)
        .unwrap_or_default() as usize;
    let prefix = text
        .get(start..offset as usize)
        .ok_or_else(|| CommandError::OffsetNotOnBoundary {
            path: path.to_owned(),
            offset,
        })?;
    Ok(Position {
        line: line_col.line,
        column: prefix.encode_utf16().count() as u32,
    })
}

fn lookup(map: &SourceMapBuilder, position: Position, exact: bool) -> LookupReport {
    let align = !exact;
    let location = map.get_source(position.line, position.column, align, align);
    let location = if exact {
        // Without alignment the nearest earlier point still answers; only a
        // point starting at the column counts as exact.
        let starts_here = map
            .table()
            .line(position.line)
            .is_some_and(|points| points.iter().any(|p| p.generated_column == position.column));
        location.filter(|_| starts_here)
    } else {
        location
    };
    LookupReport::new(position, location)
}

/// The file name a previous map's output goes by in the composed map.
fn previous_file_name<'a>(map: &'a SourceMapBuilder, path: &'a Utf8Path) -> Option<&'a str> {
    map.file().or_else(|| {
        let name = path.file_name()?;
        Some(name.strip_suffix(".map").unwrap_or(name))
    })
}

fn compose(
    map_path: &Utf8Path,
    previous: &[Utf8PathBuf],
    file: Option<&str>,
    fill_lines: bool,
    out: Option<&Utf8Path>,
    config: &Config,
) -> Result<String, CommandError> {
    let mut map = read_map(map_path)?;
    for path in previous {
        let earlier = read_map(path)?;
        let Some(name) = previous_file_name(&earlier, path) else {
            warn!(%path, "cannot tell which source this map replaces");
            continue;
        };
        if map.table().find_source(name).is_none() {
            warn!(%path, name, "map does not reference this file");
        }
        map.apply_source_map(&earlier, Some(name));
    }
    if fill_lines {
        map.compute_lines();
    }
    if let Some(file) = file {
        map.set_file(file);
    }

    let json = serialize(&map, config)?;
    match out {
        Some(out) => {
            write(out, &json)?;
            debug!(%out, sources = map.sources().len(), "wrote composed map");
            Ok(String::new())
        }
        None => Ok(json),
    }
}

fn serialize(map: &SourceMapBuilder, config: &Config) -> Result<String, CommandError> {
    let mut raw = map.to_raw();
    if !config.include_sources_content() {
        raw.sources_content = None;
    }
    Ok(raw.to_json()?)
}

fn url(
    file: &Utf8Path,
    set: Option<&str>,
    remove: bool,
    block: bool,
    write_back: bool,
    config: &Config,
) -> Result<String, CommandError> {
    let content = read(file)?;
    if set.is_none() && !remove {
        return find_source_mapping_url(&content)
            .map(str::to_string)
            .ok_or_else(|| CommandError::NoSourceMappingUrl(file.to_owned()));
    }

    let updated = upsert_source_mapping_url(&content, set, config.comment_style(block));
    if write_back {
        write(file, &updated)?;
        Ok(String::new())
    } else {
        Ok(updated)
    }
}

/// Resolved settings for `generate`.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Record one mapping per line.
    pub line_only: bool,
    /// Indent unit.
    pub indent: String,
    /// Wrap the body in an immediately invoked function.
    pub wrap: bool,
}

/// Loads the map a `sourceMappingURL` in `content` points at, if it is a
/// readable file next to `source`.
fn input_map(source: &Utf8Path, content: &str) -> Option<SourceMapBuilder> {
    let url = find_source_mapping_url(content)?;
    if url.starts_with("data:") || url.contains("://") {
        debug!(%source, "ignoring non-file sourceMappingURL");
        return None;
    }
    let path = source.parent().unwrap_or(Utf8Path::new("")).join(url);
    match read_map(&path) {
        Ok(map) => Some(map),
        Err(e) => {
            warn!(error = %e, "falling back to inferred mappings");
            None
        }
    }
}

fn generate(
    source: &Utf8Path,
    out: &Utf8Path,
    options: GenerateOptions,
    config: &Config,
) -> Result<String, CommandError> {
    let content = read(source)?;
    let previous = input_map(source, &content);
    let body = match previous {
        Some(_) => upsert_source_mapping_url(&content, None, Default::default()),
        None => content.clone(),
    };
    let body = body.trim_end_matches(['\n', '\r']);

    let out_name = out.file_name().unwrap_or(out.as_str());
    let map_name = format!("{}.map", out_name);
    let mut writer = create_writer(&WriterOptions {
        source_map: true,
        indent: options.indent,
        line_mappings_only: options.line_only,
        file: Some(out_name.to_string()),
    });

    let mut origin = Origin::new(source.as_str());
    if let Some(map) = &previous {
        origin = origin.with_map(map);
    }
    if options.wrap {
        writer.indent();
        writer.write("(function () {\n", None);
        writer.write(body, Some(origin));
        writer.unindent();
        writer.write("\n})();\n", None);
    } else {
        writer.write(body, Some(origin));
        writer.write("\n", None);
    }

    let emitted = writer.end();
    let mut map = emitted.source_map.unwrap_or_default();
    if previous.is_none() && config.include_sources_content() {
        map.set_source_content(source.as_str(), content.as_str());
    }

    let output = upsert_source_mapping_url(
        &emitted.content,
        Some(&map_name),
        config.comment_style(false),
    );
    let map_path = out.with_file_name(&map_name);
    write(out, &output)?;
    write(&map_path, &serialize(&map, config)?)?;
    debug!(%out, %map_path, copied = previous.is_some(), "generated output");

    Ok(format!("wrote {} and {}", out, map_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use source_map::{Original, SourceLocation};

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    #[test]
    fn test_one_based() {
        assert_eq!(one_based(1, 1).unwrap(), Position { line: 0, column: 0 });
        assert!(matches!(one_based(0, 3), Err(CommandError::ZeroPosition)));
    }

    #[test]
    fn test_offset_position_counts_utf16() {
        let (_dir, root) = temp_root();
        let path = root.join("out.js");
        fs::write(&path, "first\r\nlet é😀 = 1;").unwrap();

        // `=` is at byte 7 + "let é😀 ".len() == 7 + 11.
        let position = offset_position(&path, 18).unwrap();
        assert_eq!(position, Position { line: 1, column: 8 });

        assert!(matches!(
            offset_position(&path, 14),
            Err(CommandError::OffsetNotOnBoundary { .. })
        ));
        assert!(matches!(
            offset_position(&path, 500),
            Err(CommandError::OffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn test_exact_lookup() {
        let mut map = SourceMapBuilder::new();
        map.add_mapping(0, 4, Some(Original::new("a.ts", 1, 0)));

        let aligned = lookup(&map, Position { line: 0, column: 6 }, false);
        assert_eq!(aligned.original.map(|o| o.column), Some(2));

        let exact = lookup(&map, Position { line: 0, column: 6 }, true);
        assert!(!exact.mapped);
        let exact = lookup(&map, Position { line: 0, column: 4 }, true);
        assert_eq!(exact.original.map(|o| (o.line, o.column)), Some((1, 0)));
    }

    #[test]
    fn test_previous_file_name() {
        let mut map = SourceMapBuilder::new();
        assert_eq!(
            previous_file_name(&map, Utf8Path::new("dist/mid.js.map")),
            Some("mid.js")
        );
        map.set_file("named.js");
        assert_eq!(
            previous_file_name(&map, Utf8Path::new("dist/mid.js.map")),
            Some("named.js")
        );
    }

    #[test]
    fn test_compose_writes_file() {
        let (_dir, root) = temp_root();
        let last = root.join("out.js.map");
        let earlier = root.join("mid.js.map");
        fs::write(
            &last,
            r#"{"version":3,"sources":["mid.js"],"mappings":"AAAA,IAAI"}"#,
        )
        .unwrap();
        fs::write(
            &earlier,
            r#"{"version":3,"sources":["src.ts"],"sourcesContent":["x"],"mappings":"AAEA"}"#,
        )
        .unwrap();

        let out = root.join("final.map");
        let printed = compose(
            &last,
            &[earlier],
            Some("out.js"),
            false,
            Some(&out),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(printed, "");

        let composed = read_map(&out).unwrap();
        assert_eq!(composed.file(), Some("out.js"));
        assert_eq!(composed.sources(), &["src.ts".to_string()]);
        assert_eq!(composed.source_content("src.ts"), Some("x"));
        assert_eq!(
            composed.get_source(0, 4, false, false),
            Some(SourceLocation::Original(Original::new("src.ts", 2, 4)))
        );
    }

    #[test]
    fn test_compose_without_sources_content() {
        let (_dir, root) = temp_root();
        let last = root.join("out.js.map");
        let earlier = root.join("mid.js.map");
        fs::write(&last, r#"{"version":3,"sources":["mid.js"],"mappings":"AAAA"}"#).unwrap();
        fs::write(
            &earlier,
            r#"{"version":3,"sources":["src.ts"],"sourcesContent":["x"],"mappings":"AAAA"}"#,
        )
        .unwrap();

        let config = Config {
            include_sources_content: Some(false),
            ..Default::default()
        };
        let json = compose(&last, &[earlier], None, false, None, &config).unwrap();
        insta::assert_snapshot!(json, @r#"{"version":3,"sources":["src.ts"],"mappings":"AAAA"}"#);
    }

    #[test]
    fn test_invalid_map_reports_path() {
        let (_dir, root) = temp_root();
        let path = root.join("bad.map");
        fs::write(&path, r#"{"version":2,"mappings":""}"#).unwrap();
        let error = read_map(&path).unwrap_err();
        assert!(error.to_string().starts_with("invalid source map"));
        assert!(error.to_string().contains("bad.map"));
    }

    #[test]
    fn test_url_print_and_update() {
        let (_dir, root) = temp_root();
        let path = root.join("app.js");
        fs::write(&path, "run();\n//# sourceMappingURL=old.map\n").unwrap();
        let config = Config::default();

        assert_eq!(url(&path, None, false, false, false, &config).unwrap(), "old.map");
        assert_eq!(
            url(&path, Some("new.map"), false, false, false, &config).unwrap(),
            "run();\n//# sourceMappingURL=new.map\n"
        );

        url(&path, None, true, false, true, &config).unwrap();
        assert!(matches!(
            url(&path, None, false, false, false, &config),
            Err(CommandError::NoSourceMappingUrl(_))
        ));
    }

    #[test]
    fn test_generate_infers_mappings() {
        let (_dir, root) = temp_root();
        let source = root.join("in.js");
        fs::write(&source, "let a = 1;\nlet b = 2;\n").unwrap();
        let out = root.join("out.js");

        let message = generate(
            &source,
            &out,
            GenerateOptions {
                line_only: false,
                indent: "  ".to_string(),
                wrap: true,
            },
            &Config::default(),
        )
        .unwrap();
        assert!(message.starts_with("wrote "));

        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "(function () {\n  let a = 1;\n  let b = 2;\n})();\n//# sourceMappingURL=out.js.map"
        );
        let map = read_map(&root.join("out.js.map")).unwrap();
        assert_eq!(map.file(), Some("out.js"));
        assert_eq!(map.source_content(source.as_str()), Some("let a = 1;\nlet b = 2;\n"));
        assert_eq!(
            map.get_source(2, 6, false, false),
            Some(SourceLocation::Original(Original::new(source.as_str(), 1, 4)))
        );
        assert_eq!(map.get_source(0, 3, false, false), None);
    }

    #[test]
    fn test_generate_copies_existing_map() {
        let (_dir, root) = temp_root();
        let source = root.join("mid.js");
        fs::write(&source, "var x=1;\n//# sourceMappingURL=mid.js.map\n").unwrap();
        fs::write(
            root.join("mid.js.map"),
            r#"{"version":3,"file":"mid.js","sources":["src.ts"],"names":["x"],"mappings":"AAAA,IAAIA"}"#,
        )
        .unwrap();
        let out = root.join("out.js");

        generate(
            &source,
            &out,
            GenerateOptions {
                line_only: false,
                indent: "\t".to_string(),
                wrap: false,
            },
            &Config::default(),
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "var x=1;\n//# sourceMappingURL=out.js.map"
        );
        let map = read_map(&root.join("out.js.map")).unwrap();
        assert_eq!(map.sources(), &["src.ts".to_string()]);
        assert_eq!(
            map.get_source(0, 4, false, false),
            Some(SourceLocation::Original(
                Original::new("src.ts", 0, 4).with_name("x")
            ))
        );
    }
}
