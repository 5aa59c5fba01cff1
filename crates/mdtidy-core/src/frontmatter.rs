//! Location of the YAML frontmatter block at the start of a document

use std::ops::Range;

const DELIMITER: &str = "---";

/// A YAML frontmatter block delimited by `---` lines at document start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontmatter {
    /// Text between the delimiter lines, without the line break that
    /// precedes the closing delimiter
    pub body: Range<usize>,
    /// Offset just past the closing delimiter line, including its newline
    pub end: usize,
}

impl Frontmatter {
    /// Find the frontmatter block, if the document starts with one
    ///
    /// The first line must be a bare `---` and some later line must be a
    /// bare `---` as well (trailing spaces and tabs are tolerated on both).
    /// Delimiter lines may end in `\r\n`.
    pub fn find(text: &str) -> Option<Self> {
        let first_end = text.find('\n')?;
        if !is_delimiter(&text[..first_end]) {
            return None;
        }

        let body_start = first_end + 1;
        let mut line_start = body_start;

        while line_start < text.len() {
            let line_end = text[line_start..]
                .find('\n')
                .map_or(text.len(), |i| line_start + i);

            if is_delimiter(&text[line_start..line_end]) {
                let body_end = if line_start > body_start {
                    let newline = line_start - 1;
                    if newline > body_start && text[..newline].ends_with('\r') {
                        newline - 1
                    } else {
                        newline
                    }
                } else {
                    body_start
                };
                let end = if line_end < text.len() {
                    line_end + 1
                } else {
                    line_end
                };
                return Some(Self {
                    body: body_start..body_end,
                    end,
                });
            }

            line_start = line_end + 1;
        }

        None
    }

    /// The body text of this block within `text`
    pub fn body_str<'a>(&self, text: &'a str) -> &'a str {
        &text[self.body.clone()]
    }

    /// Whether the block has no content between its delimiters
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end_matches([' ', '\t', '\r']) == DELIMITER
}
