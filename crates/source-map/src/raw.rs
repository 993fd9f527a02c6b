//! The serialized (JSON) shape of a version 3 source map.

use serde::{Deserialize, Serialize};

/// A source map as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceMap {
    /// Declared format version. Always `3` when produced by this crate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,

    /// Name of the generated file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Prefix for every entry in `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    /// Original source paths. `null` entries are read as empty paths.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Option<String>>,

    /// Original source contents, aligned with `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,

    /// Identifier names referenced by mappings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,

    /// The encoded mapping segments.
    #[serde(default)]
    pub mappings: String,

    /// Present on indexed maps only; never produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<serde_json::Value>,
}

impl RawSourceMap {
    /// Serializes to compact JSON text.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Anything that can produce the structured form of a source map.
pub trait ToRawSourceMap {
    /// Produces the structured form.
    fn to_raw(&self) -> RawSourceMap;
}

impl ToRawSourceMap for RawSourceMap {
    fn to_raw(&self) -> RawSourceMap {
        self.clone()
    }
}
