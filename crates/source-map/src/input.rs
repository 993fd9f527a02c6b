//! The shapes a source map can be handed to the parser in.

use crate::raw::{RawSourceMap, ToRawSourceMap};
use crate::{Error, Result};

/// Prefix some servers put in front of JSON to defeat cross-site script inclusion.
const XSSI_GUARD: &str = ")]}'";

/// Input accepted by [`SourceMapBuilder::parse`](crate::SourceMapBuilder::parse).
pub enum SourceMapInput<'a> {
    /// Serialized JSON text, optionally prefixed with the `)]}'` guard.
    Json(&'a str),
    /// An already structured map.
    Raw(RawSourceMap),
    /// Something that can produce a structured map on demand.
    Generator(&'a dyn ToRawSourceMap),
}

impl SourceMapInput<'_> {
    /// Produces the one structured form every parse starts from.
    pub fn normalize(self) -> Result<RawSourceMap> {
        match self {
            SourceMapInput::Json(text) => {
                let value: serde_json::Value = serde_json::from_str(strip_xssi_guard(text))?;
                if !value.is_object() {
                    return Err(Error::UnsupportedFormat {
                        reason: "expected a JSON object".to_string(),
                    });
                }
                Ok(serde_json::from_value(value)?)
            }
            SourceMapInput::Raw(raw) => Ok(raw),
            SourceMapInput::Generator(generator) => Ok(generator.to_raw()),
        }
    }
}

/// Strips a leading BOM, whitespace, and the anti-XSSI guard line.
pub fn strip_xssi_guard(text: &str) -> &str {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    match text.strip_prefix(XSSI_GUARD) {
        Some(rest) => rest.trim_start(),
        None => text,
    }
}

impl<'a> From<&'a str> for SourceMapInput<'a> {
    fn from(text: &'a str) -> Self {
        SourceMapInput::Json(text)
    }
}

impl<'a> From<&'a String> for SourceMapInput<'a> {
    fn from(text: &'a String) -> Self {
        SourceMapInput::Json(text.as_str())
    }
}

impl From<RawSourceMap> for SourceMapInput<'_> {
    fn from(raw: RawSourceMap) -> Self {
        SourceMapInput::Raw(raw)
    }
}

impl<'a> From<&'a crate::SourceMapBuilder> for SourceMapInput<'a> {
    fn from(builder: &'a crate::SourceMapBuilder) -> Self {
        SourceMapInput::Generator(builder)
    }
}
