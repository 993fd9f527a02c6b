//! Source map v3 support for mapchain.
//!
//! This crate tracks how every position of a generated file corresponds to a
//! position in one or more original sources, across any number of chained
//! transformation passes. It provides:
//! - A base64 VLQ codec
//! - A sparse per-line mapping table with interned sources and names
//! - Parsing, querying, composition and serialization of source maps
//! - Helpers for `sourceMappingURL` comments
//!
//! # Example
//!
//! ```
//! use source_map::{Original, SourceLocation, SourceMapBuilder};
//!
//! // Stage two: intermediate `app.js` to the minified output.
//! let mut minified = SourceMapBuilder::new();
//! minified.add_mapping(0, 10, Some(Original::new("app.js", 4, 2)));
//!
//! // Stage one: `app.ts` to the intermediate `app.js`.
//! let mut compiled = SourceMapBuilder::new();
//! compiled.set_file("app.js");
//! compiled.add_mapping(4, 0, Some(Original::new("app.ts", 6, 0)));
//!
//! minified.apply_source_map(&compiled, None);
//! assert_eq!(
//!     minified.get_source(0, 10, true, true),
//!     Some(SourceLocation::Original(Original::new("app.ts", 6, 2))),
//! );
//! ```

mod builder;
mod codec;
mod error;
mod input;
mod line_index;
mod mapping;
mod raw;
mod url;
pub mod vlq;

pub use builder::{GeneratedLocation, Original, SourceLocation, SourceMapBuilder};
pub use error::{Error, Result};
pub use input::{strip_xssi_guard, SourceMapInput};
pub use line_index::{ByteOffset, LineCol, LineIndex};
pub use mapping::{Mapping, MappingTable, OriginalRef};
pub use raw::{RawSourceMap, ToRawSourceMap};
pub use url::{find_source_mapping_url, upsert_source_mapping_url, CommentStyle};
pub use vlq::VlqError;
