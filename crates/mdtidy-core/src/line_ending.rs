//! Line ending detection and normalization
//!
//! Rewrites are written against `\n`. Documents that use `\r\n` are
//! converted to `\n` for the rewrite and back afterwards.

use serde::{Deserialize, Serialize};

/// Line ending style of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Unix-style line endings (LF)
    #[default]
    Lf,
    /// Windows-style line endings (CRLF)
    CrLf,
}

impl LineEnding {
    /// Get the line ending string
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// `CrLf` if any line of `text` ends in `\r\n`
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}

/// Run `f` over `text` with `\n` line endings, then restore the detected style
///
/// A document with any `\r\n` is treated as CRLF throughout, so lone `\n`
/// line breaks in it come back as `\r\n`.
pub fn with_lf<F>(text: &str, f: F) -> String
where
    F: FnOnce(&str) -> String,
{
    match LineEnding::detect(text) {
        LineEnding::Lf => f(text),
        LineEnding::CrLf => f(&text.replace("\r\n", "\n")).replace('\n', "\r\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect() {
        assert_eq!(LineEnding::detect("a\nb\n"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb\r\n"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("a\rb"), LineEnding::Lf);
        assert_eq!(LineEnding::detect(""), LineEnding::Lf);
    }

    #[test]
    fn test_as_str() {
        assert_eq!(LineEnding::Lf.as_str(), "\n");
        assert_eq!(LineEnding::CrLf.as_str(), "\r\n");
    }

    #[test]
    fn test_with_lf_hides_carriage_returns() {
        let result = with_lf("a\r\n\r\nb\r\n", |text| {
            assert!(!text.contains('\r'), "callback saw {:?}", text);
            text.replace("\n\n", "\n")
        });

        assert_eq!(result, "a\r\nb\r\n");
    }

    #[test]
    fn test_with_lf_leaves_lf_text_alone() {
        assert_eq!(with_lf("a\nb", |text| format!("{}\n", text)), "a\nb\n");
    }

    #[test]
    fn test_mixed_endings_come_back_as_crlf() {
        assert_eq!(with_lf("a\r\nb\nc", str::to_string), "a\r\nb\r\nc");
    }
}
