//! Heading blank lines
//!
//! Normalizes the blank lines around ATX headings. Runs on a masked copy of
//! the document, so `#` lines inside code blocks, frontmatter, links,
//! wikilinks and tags are never treated as headings. Documents with `\r\n`
//! line endings are rewritten as `\n` and converted back, so their blank
//! lines are recognised and no bare `\n` is spliced in.
//!
//! The rewrite runs four passes in order:
//!
//! 1. spacing around each heading (depends on `bottom`)
//! 2. collapse of blank lines between adjacent headings, unless
//!    `emptyLineInBlankSections` is set
//! 3. removal of blank lines at the document edges next to a heading
//! 4. removal of blank lines between the frontmatter and a first heading,
//!    unless `emptyLineAfterYaml` is set

use std::sync::{Arc, OnceLock};

use mdtidy_core::{with_lf, with_masked, Frontmatter, RegionKind};
use regex::Regex;

use crate::error::RuleError;
use crate::example::Example;
use crate::options::OptionBuilder;
use crate::registry::RuleRegistry;
use crate::rule::{RuleCategory, RuleDescriptor};

pub const ALIAS: &str = "heading-blank-lines";

/// Regions hidden from the rewrite
const PROTECTED: [RegionKind; 5] = [
    RegionKind::CodeBlock,
    RegionKind::YamlFrontmatter,
    RegionKind::MarkdownLink,
    RegionKind::WikiLink,
    RegionKind::Tag,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingBlankLinesOptions {
    /// Require a blank line after each heading
    pub bottom: bool,
    /// Keep one blank line between the frontmatter and a first heading
    pub empty_line_after_yaml: bool,
    /// Keep blank lines between headings with nothing in between
    pub empty_line_in_blank_sections: bool,
}

impl Default for HeadingBlankLinesOptions {
    fn default() -> Self {
        Self {
            bottom: true,
            empty_line_after_yaml: true,
            empty_line_in_blank_sections: true,
        }
    }
}

/// A heading line, wherever it is
fn heading_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#+[ \t][^\n]*").unwrap())
}

/// A heading line with the blank lines before it
fn blank_lines_before_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n(?:[ \t]*\n)*(#+[ \t][^\n]*)").unwrap())
}

/// A heading line with its newline and the blank lines after it
fn blank_lines_after_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(#+[ \t][^\n]*)\n(?:[ \t]*\n)*").unwrap())
}

/// Two headings separated only by blank lines
fn blank_section() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(#+[ \t][^\n]*)\n(?:[ \t]*\n)+(#+[ \t])").unwrap())
}

/// Blank lines at the start of the text, followed by a heading
fn leading_blank_lines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\A(?:[ \t]*\n)+(#+[ \t])").unwrap())
}

/// A final heading line and everything blank after it
fn trailing_blank_lines() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^(#+[ \t][^\n]*)\n(?:[ \t]*\n)*[ \t]*\z").unwrap())
}

/// Normalize blank lines around headings
pub fn heading_blank_lines(text: &str, options: &HeadingBlankLinesOptions) -> String {
    with_masked(text, &PROTECTED, |masked| {
        with_lf(masked, |lf| rewrite(lf, options))
    })
}

fn rewrite(text: &str, options: &HeadingBlankLinesOptions) -> String {
    let mut text = if options.bottom {
        surround_headings(text)
    } else {
        space_before_headings(text)
    };

    if !options.empty_line_in_blank_sections {
        text = collapse_blank_sections(&text);
    }

    text = trim_document_edges(&text);

    if !options.empty_line_after_yaml {
        text = remove_gap_after_frontmatter(&text);
    }

    text
}

/// Exactly one blank line before and after every heading
fn surround_headings(text: &str) -> String {
    let text = heading_line().replace_all(text, "\n\n${0}\n\n");
    let text = blank_lines_before_heading().replace_all(&text, "\n\n${1}");
    blank_lines_after_heading()
        .replace_all(&text, "${1}\n\n")
        .into_owned()
}

/// Exactly one blank line before every heading, none after
fn space_before_headings(text: &str) -> String {
    let text = blank_lines_after_heading().replace_all(text, "${1}\n");
    blank_lines_before_heading()
        .replace_all(&text, "\n\n${1}")
        .into_owned()
}

/// Join headings that only have blank lines between them
///
/// Repeats until stable, since each match consumes the start of the next
/// heading and a run of empty sections needs one round per heading.
fn collapse_blank_sections(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = blank_section().replace_all(&current, "${1}\n${2}");
        if next == current {
            return current;
        }
        current = next.into_owned();
    }
}

fn trim_document_edges(text: &str) -> String {
    let text = leading_blank_lines().replace(text, "${1}");
    trailing_blank_lines().replace(&text, "${1}").into_owned()
}

fn remove_gap_after_frontmatter(text: &str) -> String {
    let Some(frontmatter) = Frontmatter::find(text) else {
        return text.to_string();
    };

    let (head, rest) = text.split_at(frontmatter.end);
    let rest = leading_blank_lines().replace(rest, "${1}");
    format!("{}{}", head, rest)
}

/// The rule as a catalog entry
pub fn descriptor() -> RuleDescriptor<HeadingBlankLinesOptions> {
    RuleDescriptor::new(
        "Heading blank lines",
        ALIAS,
        "All headings have one blank line both before and after (except where the heading is at the beginning or end of the document).",
        RuleCategory::Spacing,
        heading_blank_lines,
    )
    .option(OptionBuilder::boolean(
        "bottom",
        "Bottom",
        "Insert a blank line after headings",
        |o: &HeadingBlankLinesOptions| o.bottom,
        |o: &mut HeadingBlankLinesOptions, v| o.bottom = v,
    ))
    .option(OptionBuilder::boolean(
        "emptyLineAfterYaml",
        "Empty Line Between Yaml and Header",
        "Keep the empty line between the YAML frontmatter and a heading",
        |o: &HeadingBlankLinesOptions| o.empty_line_after_yaml,
        |o: &mut HeadingBlankLinesOptions, v| o.empty_line_after_yaml = v,
    ))
    .option(OptionBuilder::boolean(
        "emptyLineInBlankSections",
        "Empty Line In Blank Sections",
        "Keep the empty line between headings that have no content between them",
        |o: &HeadingBlankLinesOptions| o.empty_line_in_blank_sections,
        |o: &mut HeadingBlankLinesOptions, v| o.empty_line_in_blank_sections = v,
    ))
    .example(Example::new(
        "Headings should be surrounded by blank lines",
        "# H1\n## H2\n\n\n# H1\nline\n## H2\n\n",
        "# H1\n\n## H2\n\n# H1\n\nline\n\n## H2",
    ))
    .example(
        Example::new(
            "With `bottom = false`",
            "# H1\n\nline\n## H2\n\n\nline",
            "# H1\nline\n\n## H2\nline",
        )
        .with_option("bottom", false),
    )
    .example(
        Example::new(
            "Empty line before header and after YAML is removed with `emptyLineAfterYaml = false`",
            "---\nkey: value\n---\n# Header\nParagraph here...",
            "---\nkey: value\n---\n# Header\n\nParagraph here...",
        )
        .with_option("emptyLineAfterYaml", false),
    )
    .example(
        Example::new(
            "Empty lines between headings are removed with `emptyLineInBlankSections = false` and `bottom = false`",
            "# H1\n\n## H2\n\n## H2\ncontent",
            "# H1\n## H2\n## H2\ncontent",
        )
        .with_option("bottom", false)
        .with_option("emptyLineInBlankSections", false),
    )
    .example(Example::new(
        "Headings inside code blocks are left alone",
        "# Heading\n```\n# Not a heading\n\n\n```\ntext",
        "# Heading\n\n```\n# Not a heading\n\n\n```\ntext",
    ))
}

pub fn register(registry: &mut RuleRegistry) -> Result<(), RuleError> {
    registry.register(Arc::new(descriptor()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Rule;

    fn run(text: &str) -> String {
        heading_blank_lines(text, &HeadingBlankLinesOptions::default())
    }

    fn run_with(text: &str, bottom: bool, after_yaml: bool, blank_sections: bool) -> String {
        let options = HeadingBlankLinesOptions {
            bottom,
            empty_line_after_yaml: after_yaml,
            empty_line_in_blank_sections: blank_sections,
        };
        heading_blank_lines(text, &options)
    }

    #[test]
    fn test_examples_hold() {
        let failures = descriptor().verify_examples();
        assert!(failures.is_empty(), "failing examples: {:#?}", failures);
    }

    #[test]
    fn test_inserts_blank_lines_around_heading() {
        assert_eq!(run("text\n# H\nmore"), "text\n\n# H\n\nmore");
    }

    #[test]
    fn test_collapses_extra_blank_lines() {
        assert_eq!(run("text\n\n\n\n# H\n\n\n\nmore"), "text\n\n# H\n\nmore");
    }

    #[test]
    fn test_whitespace_only_lines_count_as_blank() {
        assert_eq!(run("text\n  \n\t\n# H\n \nmore"), "text\n\n# H\n\nmore");
    }

    #[test]
    fn test_crlf_blank_lines_collapse() {
        assert_eq!(
            run("text\r\n\r\n\r\n# H\r\n\r\n\r\nmore\r\n"),
            "text\r\n\r\n# H\r\n\r\nmore\r\n"
        );
    }

    #[test]
    fn test_crlf_blank_lines_inserted() {
        assert_eq!(run("text\r\n# H\r\nmore"), "text\r\n\r\n# H\r\n\r\nmore");
        assert_eq!(
            run_with("# H\r\n \r\n\r\ntext", false, true, true),
            "# H\r\ntext"
        );
    }

    #[test]
    fn test_crlf_code_block_kept_verbatim() {
        let text = "# H\r\n```\r\n# not heading\r\n\r\n\r\n```\r\ntext";
        assert_eq!(
            run(text),
            "# H\r\n\r\n```\r\n# not heading\r\n\r\n\r\n```\r\ntext"
        );
    }

    #[test]
    fn test_crlf_frontmatter_gap_removed() {
        assert_eq!(
            run_with("---\r\ntitle: x\r\n---\r\n\r\n# H\r\ntext", true, false, true),
            "---\r\ntitle: x\r\n---\r\n# H\r\n\r\ntext"
        );
    }

    #[test]
    fn test_heading_at_document_start() {
        assert_eq!(run("\n\n# H\ntext"), "# H\n\ntext");
    }

    #[test]
    fn test_heading_at_document_end() {
        assert_eq!(run("text\n# H\n\n\n"), "text\n\n# H");
        assert_eq!(run("text\n# H"), "text\n\n# H");
    }

    #[test]
    fn test_leading_blank_lines_before_text_kept() {
        assert_eq!(run("\n\ntext\n# H"), "\n\ntext\n\n# H");
    }

    #[test]
    fn test_hash_without_space_is_not_heading() {
        let text = "text\n#hashtag\nmore\n#\n";
        assert_eq!(run(text), text);
    }

    #[test]
    fn test_indented_hash_is_not_heading() {
        let text = "text\n    # code\nmore";
        assert_eq!(run(text), text);
    }

    #[test]
    fn test_fenced_code_untouched() {
        let text = "```md\n# A\n# B\n\n\n# C\n```";
        assert_eq!(run(text), text);
    }

    #[test]
    fn test_inline_code_and_tags_untouched() {
        let text = "text with `# code` and #tag\nmore";
        assert_eq!(run(text), text);
    }

    #[test]
    fn test_consecutive_headings_not_merged() {
        assert_eq!(run("# A\n# B\n# C"), "# A\n\n# B\n\n# C");
    }

    #[test]
    fn test_bottom_false_allows_text_right_after() {
        assert_eq!(run_with("# H\n\n\ntext", false, true, true), "# H\ntext");
        assert_eq!(run_with("text\n# H\ntext", false, true, true), "text\n\n# H\ntext");
    }

    #[test]
    fn test_blank_sections_collapse_with_bottom() {
        assert_eq!(
            run_with("# A\n\n## B\n\n## C\n\ntext", true, true, false),
            "# A\n## B\n## C\n\ntext"
        );
    }

    #[test]
    fn test_blank_sections_kept_by_default() {
        assert_eq!(run("# A\n## B"), "# A\n\n## B");
    }

    #[test]
    fn test_frontmatter_gap_kept_by_default() {
        assert_eq!(
            run("---\ntitle: x\n---\n# H\ntext"),
            "---\ntitle: x\n---\n\n# H\n\ntext"
        );
    }

    #[test]
    fn test_frontmatter_gap_removed() {
        assert_eq!(
            run_with("---\ntitle: x\n---\n\n\n# H\ntext", true, false, true),
            "---\ntitle: x\n---\n# H\n\ntext"
        );
    }

    #[test]
    fn test_frontmatter_gap_before_text_kept() {
        let text = "---\ntitle: x\n---\n\ntext\n\n# H";
        assert_eq!(run_with(text, true, false, true), text);
    }

    #[test]
    fn test_frontmatter_hash_lines_untouched() {
        let text = "---\n# comment: yes\n---\ntext";
        assert_eq!(run(text), text);
    }

    #[test]
    fn test_no_headings_is_identity() {
        let text = "\n\nsome text\n\n\n\nmore text\n\n";
        assert_eq!(run(text), text);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(run(""), "");
    }

    #[test]
    fn test_idempotent_on_examples() {
        for example in descriptor().examples() {
            let once = descriptor().apply(example.before, &example.options).unwrap();
            let twice = descriptor().apply(&once, &example.options).unwrap();
            assert_eq!(once, twice, "not idempotent: {}", example.description);
        }
    }

    #[test]
    fn test_descriptor_options() {
        let rule = descriptor();
        let keys: Vec<_> = rule.options().iter().map(|o| o.key).collect();

        assert_eq!(keys, vec!["bottom", "emptyLineAfterYaml", "emptyLineInBlankSections"]);
        assert!(rule
            .default_values()
            .values()
            .all(|v| v.as_bool() == Some(true)));
    }
}
