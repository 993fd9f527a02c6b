//! Source map error types.

use crate::vlq::VlqError;
use thiserror::Error;

/// A specialized result type for source map operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error that occurred while reading a source map.
#[derive(Debug, Error)]
pub enum Error {
    /// The input is neither JSON text nor an object.
    #[error("unsupported source map format: {reason}")]
    UnsupportedFormat {
        /// A description of the problem.
        reason: String,
    },

    /// Indexed source maps (with `sections`) are not supported.
    #[error("unsupported source map format: indexed source maps are not supported")]
    IndexedMap,

    /// The declared `version` is not 3.
    #[error("unsupported source map format: version {0}")]
    UnsupportedVersion(u64),

    /// The JSON text could not be parsed.
    #[error("invalid source map JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A digit in `mappings` could not be decoded.
    #[error("malformed mappings on generated line {line}: {source}")]
    Vlq {
        /// The generated line being decoded.
        line: u32,
        /// The underlying decode failure.
        source: VlqError,
    },

    /// A segment did not have 1, 4 or 5 fields.
    #[error("malformed mappings on generated line {line}: segment has {fields} fields")]
    InvalidSegment {
        /// The generated line being decoded.
        line: u32,
        /// The number of fields found.
        fields: usize,
    },

    /// A decoded position came out negative or too large.
    #[error("malformed mappings on generated line {line}: {field} out of range")]
    ValueOutOfRange {
        /// The generated line being decoded.
        line: u32,
        /// The field that left the valid range.
        field: &'static str,
    },

    /// A segment referenced a source that does not exist.
    #[error("mapping on generated line {line} references missing source #{index}")]
    SourceIndexOutOfRange {
        /// The generated line being decoded.
        line: u32,
        /// The referenced source index.
        index: u32,
    },

    /// A segment referenced a name that does not exist.
    #[error("mapping on generated line {line} references missing name #{index}")]
    NameIndexOutOfRange {
        /// The generated line being decoded.
        line: u32,
        /// The referenced name index.
        index: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::Vlq {
            line: 3,
            source: VlqError::InvalidDigit {
                position: 7,
                found: '!',
            },
        };
        assert_eq!(
            error.to_string(),
            "malformed mappings on generated line 3: invalid base64 VLQ digit '!' at offset 7"
        );
        assert_eq!(
            Error::UnsupportedVersion(2).to_string(),
            "unsupported source map format: version 2"
        );
    }
}
