//! Configuration loading.

use camino::Utf8Path;
use serde::Deserialize;
use source_map::CommentStyle;
use std::fs;
use tracing::{debug, warn};

/// File looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "mapchain.json";

/// Settings read from `mapchain.json`.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Indent unit for wrapped output.
    pub indent: Option<String>,

    /// Record one mapping per generated line.
    pub line_mappings_only: Option<bool>,

    /// Comment form used when a sourceMappingURL is appended.
    pub url_style: Option<UrlStyle>,

    /// Embed original file contents in written maps.
    pub include_sources_content: Option<bool>,
}

/// Comment form of an appended sourceMappingURL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlStyle {
    /// `//# sourceMappingURL=...`
    Line,
    /// `/*# sourceMappingURL=... */`
    Block,
}

impl From<UrlStyle> for CommentStyle {
    fn from(style: UrlStyle) -> Self {
        match style {
            UrlStyle::Line => CommentStyle::Line,
            UrlStyle::Block => CommentStyle::Block,
        }
    }
}

impl Config {
    /// Loads `path`, or `mapchain.json` in `dir` when no path is given.
    ///
    /// A missing default file yields the default configuration. A file that
    /// cannot be read or parsed is reported and ignored.
    pub fn load(dir: &Utf8Path, path: Option<&Utf8Path>) -> Self {
        let path = match path {
            Some(path) => path.to_owned(),
            None => {
                let path = dir.join(CONFIG_FILE);
                if !path.exists() {
                    return Self::default();
                }
                path
            }
        };

        match fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|text| Self::parse(&text).map_err(|e| e.to_string()))
        {
            Ok(config) => {
                debug!(%path, "loaded configuration");
                config
            }
            Err(e) => {
                warn!(%path, error = %e, "ignoring unreadable configuration");
                Self::default()
            }
        }
    }

    /// Parses configuration text.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Whether maps should embed original file contents.
    pub fn include_sources_content(&self) -> bool {
        self.include_sources_content.unwrap_or(true)
    }

    /// The comment form for appended URLs, unless a flag overrides it.
    pub fn comment_style(&self, block_flag: bool) -> CommentStyle {
        if block_flag {
            CommentStyle::Block
        } else {
            self.url_style.map(CommentStyle::from).unwrap_or_default()
        }
    }
}
