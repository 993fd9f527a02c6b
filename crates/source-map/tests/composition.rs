//! Tests for chaining maps across several transformation passes.

use pretty_assertions::assert_eq;
use source_map::{GeneratedLocation, Original, SourceLocation, SourceMapBuilder};

/// `(generated line, generated column) -> (source, line, column)` for each point.
fn builder_from(file: Option<&str>, points: &[(u32, u32, &str, u32, u32)]) -> SourceMapBuilder {
    let mut builder = SourceMapBuilder::new();
    if let Some(file) = file {
        builder.set_file(file);
    }
    for &(line, column, source, source_line, source_column) in points {
        builder.add_mapping(
            line,
            column,
            Some(Original::new(source, source_line, source_column)),
        );
    }
    builder
}

#[test]
fn test_three_passes_collapse_into_one() {
    // app.ts -> app.js (type stripping), app.js -> bundle.js (bundling),
    // bundle.js -> bundle.min.js (minification).
    let compiled = builder_from(
        Some("app.js"),
        &[(0, 0, "app.ts", 0, 0), (1, 0, "app.ts", 2, 0), (1, 4, "app.ts", 2, 10)],
    );
    let bundled = builder_from(
        Some("bundle.js"),
        &[(10, 0, "app.js", 0, 0), (11, 2, "app.js", 1, 0), (12, 0, "lib.js", 0, 0)],
    );
    let mut minified = builder_from(
        None,
        &[(0, 0, "bundle.js", 10, 0), (0, 20, "bundle.js", 11, 6), (0, 40, "bundle.js", 12, 0)],
    );

    minified.apply_source_map(&bundled, None);
    minified.apply_source_map(&compiled, None);

    assert_eq!(
        minified.sources(),
        &["lib.js".to_string(), "app.ts".to_string()]
    );
    assert_eq!(
        minified.get_source(0, 0, false, false),
        Some(SourceLocation::Original(Original::new("app.ts", 0, 0)))
    );
    // bundle 11:6 -> app.js 1:4 -> app.ts 2:10
    assert_eq!(
        minified.get_source(0, 20, false, false),
        Some(SourceLocation::Original(Original::new("app.ts", 2, 10)))
    );
    assert_eq!(
        minified.get_source(0, 41, true, false),
        Some(SourceLocation::Original(Original::new("lib.js", 0, 1)))
    );
}

#[test]
fn test_composition_survives_serialization() {
    let earlier = builder_from(Some("mid.js"), &[(3, 0, "src.js", 30, 0)]);
    let mut later = builder_from(None, &[(0, 0, "mid.js", 3, 2)]);

    let earlier = SourceMapBuilder::parse(earlier.to_string().as_str()).unwrap();
    later.apply_source_map(&earlier, None);

    let reparsed = SourceMapBuilder::parse(later.to_string().as_str()).unwrap();
    assert_eq!(
        reparsed.get_source(0, 0, false, false),
        Some(SourceLocation::Original(Original::new("src.js", 30, 2)))
    );
}

#[test]
fn test_composition_keeps_names_from_earlier_pass() {
    let mut earlier = SourceMapBuilder::new();
    earlier.set_file("mid.js");
    earlier.add_mapping(0, 0, Some(Original::new("src.js", 0, 0).with_name("original")));

    let mut later = SourceMapBuilder::new();
    later.add_mapping(0, 0, Some(Original::new("mid.js", 0, 0).with_name("renamed")));
    later.apply_source_map(&earlier, None);

    assert_eq!(
        later.get_source(0, 0, false, false),
        Some(SourceLocation::Original(
            Original::new("src.js", 0, 0).with_name("original")
        ))
    );

    let mut unnamed = SourceMapBuilder::new();
    unnamed.set_file("mid.js");
    unnamed.add_mapping(0, 0, Some(Original::new("src.js", 0, 0)));
    let mut later = SourceMapBuilder::new();
    later.add_mapping(0, 0, Some(Original::new("mid.js", 0, 0).with_name("renamed")));
    later.apply_source_map(&unnamed, None);

    assert_eq!(
        later.get_source(0, 0, false, false),
        Some(SourceLocation::Original(Original::new("src.js", 0, 0)))
    );
}

#[test]
fn test_reverse_lookup_after_composition() {
    let earlier = builder_from(Some("mid.js"), &[(0, 0, "src.js", 5, 0)]);
    let mut later = builder_from(None, &[(2, 4, "mid.js", 0, 0), (3, 0, "mid.js", 0, 3)]);
    later.apply_source_map(&earlier, None);

    assert_eq!(
        later.get_all_generated("src.js", 5, None),
        vec![
            GeneratedLocation { line: 2, column: 4 },
            GeneratedLocation { line: 3, column: 0 },
        ]
    );
    assert_eq!(
        later.get_all_generated("src.js", 5, Some(3)),
        vec![GeneratedLocation { line: 3, column: 0 }]
    );
}

#[test]
fn test_compute_lines_before_serializing() {
    let mut builder = builder_from(None, &[(1, 0, "a.js", 101, 0), (3, 0, "a.js", 201, 0)]);
    builder.compute_lines();

    insta::assert_snapshot!(
        builder.to_raw().mappings,
        @";AAqGA;AACA;AAmGA"
    );
}
