//! Reading and rewriting `sourceMappingURL` comments in generated text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static SOURCE_MAPPING_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"/\*[#@][ \t]*sourceMappingURL[ \t]*=[ \t]*(?P<block>[^\s'"]*?)\s*\*/|//[#@][ \t]*sourceMappingURL[ \t]*=[ \t]*(?P<line>[^\s'"]*)"#,
    )
    .expect("sourceMappingURL pattern is valid")
});

/// How a new `sourceMappingURL` comment is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentStyle {
    /// `//# sourceMappingURL=...`, for scripts.
    #[default]
    Line,
    /// `/*# sourceMappingURL=... */`, for stylesheets.
    Block,
}

impl CommentStyle {
    /// Renders a comment pointing at `url`.
    pub fn render(self, url: &str) -> String {
        match self {
            CommentStyle::Line => format!("//# sourceMappingURL={url}"),
            CommentStyle::Block => format!("/*# sourceMappingURL={url} */"),
        }
    }
}

fn last_comment(content: &str) -> Option<Captures<'_>> {
    SOURCE_MAPPING_URL.captures_iter(content).last()
}

/// Returns the URL of the last `sourceMappingURL` comment in `content`.
pub fn find_source_mapping_url(content: &str) -> Option<&str> {
    let captures = last_comment(content)?;
    captures
        .name("block")
        .or_else(|| captures.name("line"))
        .map(|url| url.as_str())
}

/// Points the `sourceMappingURL` comment of `content` at `url`.
///
/// An existing comment keeps its form and only has its URL replaced; `None`
/// deletes it. Without an existing comment one is appended in `style`.
pub fn upsert_source_mapping_url(content: &str, url: Option<&str>, style: CommentStyle) -> String {
    let Some(captures) = last_comment(content) else {
        let Some(url) = url else {
            return content.to_string();
        };
        let mut out = String::with_capacity(content.len() + url.len() + 24);
        out.push_str(content);
        if !out.is_empty() && !out.ends_with(['\n', '\r']) {
            out.push('\n');
        }
        out.push_str(&style.render(url));
        return out;
    };

    let Some(url) = url else {
        let Some(comment) = captures.get(0) else {
            return content.to_string();
        };
        let mut start = comment.start();
        let mut end = comment.end();
        if content[end..].trim().is_empty() {
            end = content.len();
            let before = &content[..start];
            start = before
                .strip_suffix("\r\n")
                .or_else(|| before.strip_suffix(['\n', '\r']))
                .map_or(start, str::len);
        }
        return format!("{}{}", &content[..start], &content[end..]);
    };

    match captures.name("block").or_else(|| captures.name("line")) {
        Some(old) => format!("{}{}{}", &content[..old.start()], url, &content[old.end()..]),
        None => content.to_string(),
    }
}
