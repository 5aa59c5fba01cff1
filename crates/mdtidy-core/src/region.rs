//! Detection of protected regions in Markdown text
//!
//! Protected regions are spans that rules must never rewrite: code,
//! YAML frontmatter, Markdown links, wiki-links and inline tags. Regions
//! are found per kind in a fixed priority order; a later kind never
//! splits or nests inside an earlier one.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::frontmatter::Frontmatter;

/// A class of content excluded from rewriting
///
/// Variant order is the classification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegionKind {
    /// Fenced code blocks and inline code spans
    CodeBlock,
    /// The body of the leading `---` delimited block
    YamlFrontmatter,
    /// `[text](target)` and `![alt](target)`
    MarkdownLink,
    /// `[[target]]` and `![[target]]`
    WikiLink,
    /// `#tag`
    Tag,
}

impl RegionKind {
    /// All kinds, in priority order
    pub const ALL: [RegionKind; 5] = [
        RegionKind::CodeBlock,
        RegionKind::YamlFrontmatter,
        RegionKind::MarkdownLink,
        RegionKind::WikiLink,
        RegionKind::Tag,
    ];

    /// Short lowercase label, used inside placeholders
    pub fn label(&self) -> &'static str {
        match self {
            RegionKind::CodeBlock => "code",
            RegionKind::YamlFrontmatter => "yaml",
            RegionKind::MarkdownLink => "link",
            RegionKind::WikiLink => "wikilink",
            RegionKind::Tag => "tag",
        }
    }

    /// Candidate byte ranges for this kind, left to right, non-overlapping
    fn candidates(&self, text: &str) -> Vec<Range<usize>> {
        match self {
            RegionKind::CodeBlock => code_candidates(text),
            RegionKind::YamlFrontmatter => Frontmatter::find(text)
                .filter(|fm| !fm.is_empty())
                .map(|fm| vec![fm.body])
                .unwrap_or_default(),
            RegionKind::MarkdownLink => link_regex().find_iter(text).map(|m| m.range()).collect(),
            RegionKind::WikiLink => wiki_link_regex().find_iter(text).map(|m| m.range()).collect(),
            RegionKind::Tag => tag_candidates(text),
        }
    }
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One protected match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedSpan {
    pub start: usize,
    pub end: usize,
    pub kind: RegionKind,
    /// The exact bytes of `text[start..end]`
    pub original: String,
}

impl ProtectedSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    fn overlaps(&self, range: &Range<usize>) -> bool {
        self.start < range.end && range.start < self.end
    }

    fn is_inside(&self, range: &Range<usize>) -> bool {
        range.start <= self.start && self.end <= range.end
    }
}

/// Find protected regions of the requested kinds
///
/// Kinds are processed in priority order regardless of how `kinds` is
/// ordered. A candidate that partially overlaps, or sits inside, an
/// accepted span is dropped; a candidate that fully contains accepted spans
/// replaces them. The result is grouped by kind in priority order and is
/// left-to-right within each kind.
pub fn find_regions(text: &str, kinds: &[RegionKind]) -> Vec<ProtectedSpan> {
    let mut wanted = kinds.to_vec();
    wanted.sort();
    wanted.dedup();

    let mut accepted: Vec<ProtectedSpan> = Vec::new();

    for kind in wanted {
        let mut found = Vec::new();

        for range in kind.candidates(text) {
            if range.is_empty() {
                continue;
            }
            let blocked = accepted
                .iter()
                .any(|span| span.overlaps(&range) && !span.is_inside(&range));
            if blocked {
                continue;
            }

            accepted.retain(|span| !span.is_inside(&range));
            found.push(ProtectedSpan {
                start: range.start,
                end: range.end,
                kind,
                original: text[range].to_string(),
            });
        }

        accepted.extend(found);
    }

    accepted
}

/// Find protected regions of every kind
pub fn find_all_regions(text: &str) -> Vec<ProtectedSpan> {
    find_regions(text, &RegionKind::ALL)
}

/// An opening code fence: the marker character and its run length
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    len: usize,
}

impl Fence {
    fn parse(line: &str) -> Option<Self> {
        let rest = strip_fence_prefix(line);
        let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
        let len = rest.chars().take_while(|c| *c == marker).count();
        if len < 3 {
            return None;
        }
        // Backtick fences cannot carry backticks in their info string
        if marker == '`' && rest[len..].contains('`') {
            return None;
        }
        Some(Self { marker, len })
    }

    fn is_closed_by(&self, line: &str) -> bool {
        let rest = strip_fence_prefix(line);
        let run = rest.chars().take_while(|c| *c == self.marker).count();
        run >= self.len && rest[run * self.marker.len_utf8()..].trim().is_empty()
    }
}

/// Indentation and blockquote markers allowed before a fence
fn strip_fence_prefix(line: &str) -> &str {
    line.trim_start_matches([' ', '\t', '>'])
}

/// Fenced blocks, from the opening line start to the closing line end
///
/// The closing line's `\r\n` or `\n` is not part of the block. An unclosed
/// fence runs to the end of the document.
fn fenced_blocks(text: &str) -> Vec<Range<usize>> {
    let mut blocks = Vec::new();
    let mut open: Option<(usize, Fence)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let content = content.strip_suffix('\r').unwrap_or(content);

        if let Some((start, fence)) = open {
            if fence.is_closed_by(content) {
                blocks.push(start..offset + content.len());
                open = None;
            }
        } else if let Some(fence) = Fence::parse(content) {
            open = Some((offset, fence));
        }

        offset += line.len();
    }

    if let Some((start, _)) = open {
        blocks.push(start..text.len());
    }

    blocks
}

fn code_candidates(text: &str) -> Vec<Range<usize>> {
    let fences = fenced_blocks(text);
    let mut candidates = Vec::with_capacity(fences.len());
    let mut gap_start = 0;

    for fence in fences.iter().cloned().chain(std::iter::once(text.len()..text.len())) {
        let gap = &text[gap_start..fence.start];
        candidates.extend(
            inline_code_regex()
                .find_iter(gap)
                .map(|m| gap_start + m.start()..gap_start + m.end()),
        );
        if !fence.is_empty() {
            gap_start = fence.end;
            candidates.push(fence);
        }
    }

    candidates
}

fn tag_candidates(text: &str) -> Vec<Range<usize>> {
    tag_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .filter(|m| m.as_str()[1..].chars().any(|c| !c.is_ascii_digit()))
        .map(|m| m.range())
        .collect()
}

fn inline_code_regex() -> &'static Regex {
    static INLINE_CODE_REGEX: OnceLock<Regex> = OnceLock::new();
    INLINE_CODE_REGEX.get_or_init(|| Regex::new(r"`[^`\n]+`").unwrap())
}

fn link_regex() -> &'static Regex {
    static LINK_REGEX: OnceLock<Regex> = OnceLock::new();
    LINK_REGEX.get_or_init(|| {
        // One level of nested brackets in the text, one level of parens in the target
        Regex::new(r"!?\[(?:[^\[\]\n]|\[[^\[\]\n]*\])*\]\((?:[^()\n]|\([^()\n]*\))*\)").unwrap()
    })
}

fn wiki_link_regex() -> &'static Regex {
    static WIKI_LINK_REGEX: OnceLock<Regex> = OnceLock::new();
    WIKI_LINK_REGEX.get_or_init(|| Regex::new(r"!?\[\[[^\[\]\n]+\]\]").unwrap())
}

fn tag_regex() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| Regex::new(r"(?m)(?:^|[ \t])(#[\p{L}\p{N}_/\-]+)").unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn originals(spans: &[ProtectedSpan]) -> Vec<&str> {
        spans.iter().map(|s| s.original.as_str()).collect()
    }

    #[test]
    fn test_fenced_backtick_block() {
        let text = "# H\n```rust\n# not a heading\n```\ntext";
        let spans = find_regions(text, &[RegionKind::CodeBlock]);

        assert_eq!(originals(&spans), vec!["```rust\n# not a heading\n```"]);
        assert_eq!(spans[0].kind, RegionKind::CodeBlock);
        assert_eq!(&text[spans[0].range()], spans[0].original);
    }

    #[test]
    fn test_fenced_tilde_block_needs_matching_marker() {
        let text = "~~~~\n```\n~~~\n~~~~\nafter";
        let spans = find_regions(text, &[RegionKind::CodeBlock]);

        assert_eq!(originals(&spans), vec!["~~~~\n```\n~~~\n~~~~"]);
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let text = "before\n```\n# H\n\n";
        let spans = find_regions(text, &[RegionKind::CodeBlock]);

        assert_eq!(originals(&spans), vec!["```\n# H\n\n"]);
    }

    #[test]
    fn test_fence_inside_blockquote() {
        let text = "> ```\n> # H\n> ```\n";
        let spans = find_regions(text, &[RegionKind::CodeBlock]);

        assert_eq!(originals(&spans), vec!["> ```\n> # H\n> ```"]);
    }

    #[test]
    fn test_crlf_fence_stops_before_line_break() {
        let text = "```\r\n# H\r\n```\r\ntext";
        let spans = find_regions(text, &[RegionKind::CodeBlock]);

        assert_eq!(originals(&spans), vec!["```\r\n# H\r\n```"]);
    }

    #[test]
    fn test_inline_code_outside_fences() {
        let text = "a `one` b\n```\n`inside`\n```\nc `two`";
        let spans = find_regions(text, &[RegionKind::CodeBlock]);

        assert_eq!(
            originals(&spans),
            vec!["`one`", "```\n`inside`\n```", "`two`"]
        );
    }

    #[test]
    fn test_yaml_body_only() {
        let text = "---\ntitle: x\ntags: [a]\n---\n# H";
        let spans = find_regions(text, &[RegionKind::YamlFrontmatter]);

        assert_eq!(originals(&spans), vec!["title: x\ntags: [a]"]);
    }

    #[test]
    fn test_empty_yaml_has_no_span() {
        let spans = find_regions("---\n---\n# H", &[RegionKind::YamlFrontmatter]);
        assert!(spans.is_empty());
    }

    #[test]
    fn test_markdown_links() {
        let text = "see [the [docs]](http://x.io/a_(b)) and ![img](p.png)";
        let spans = find_regions(text, &[RegionKind::MarkdownLink]);

        assert_eq!(
            originals(&spans),
            vec!["[the [docs]](http://x.io/a_(b))", "![img](p.png)"]
        );
    }

    #[test]
    fn test_wiki_links() {
        let text = "[[Page#Heading|alias]] and ![[embed.png]] but not [[broken";
        let spans = find_regions(text, &[RegionKind::WikiLink]);

        assert_eq!(originals(&spans), vec!["[[Page#Heading|alias]]", "![[embed.png]]"]);
    }

    #[test]
    fn test_tags() {
        let text = "#start middle #mid/nested\n# Heading #tail\nissue#1 #123 #v2";
        let spans = find_regions(text, &[RegionKind::Tag]);

        assert_eq!(originals(&spans), vec!["#start", "#mid/nested", "#tail", "#v2"]);
    }

    #[test]
    fn test_heading_marker_is_not_tag() {
        let spans = find_regions("# Title\n## Sub\n###\n", &[RegionKind::Tag]);
        assert!(spans.is_empty());
    }

    #[test]
    fn test_priority_code_over_tag() {
        let text = "` #notatag` #tag";
        let spans = find_regions(text, &[RegionKind::Tag, RegionKind::CodeBlock]);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].kind, RegionKind::CodeBlock);
        assert_eq!(spans[0].original, "` #notatag`");
        assert_eq!(spans[1].kind, RegionKind::Tag);
        assert_eq!(spans[1].original, "#tag");
    }

    #[test]
    fn test_link_absorbs_inline_code() {
        let text = "[`code`](target)";
        let spans = find_all_regions(text);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, RegionKind::MarkdownLink);
        assert_eq!(spans[0].original, text);
    }

    #[test]
    fn test_yaml_absorbs_inline_code() {
        let text = "---\ncmd: `ls`\n---\n";
        let spans = find_all_regions(text);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].kind, RegionKind::YamlFrontmatter);
    }

    #[test]
    fn test_tag_inside_link_dropped() {
        let text = "[see #label](x) [[Note]] #real";
        let spans = find_all_regions(text);

        assert_eq!(
            spans.iter().map(|s| s.kind).collect::<Vec<_>>(),
            vec![RegionKind::MarkdownLink, RegionKind::WikiLink, RegionKind::Tag]
        );
        assert_eq!(spans[2].original, "#real");
    }

    #[test]
    fn test_spans_never_overlap() {
        let text = "---\na: `b`\n---\n# H #t [x](y) `z` [[w]]\n```\n[q](r)\n```\n";
        let mut spans = find_all_regions(text);
        spans.sort_by_key(|s| s.start);

        for pair in spans.windows(2) {
            assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_no_regions() {
        assert!(find_all_regions("").is_empty());
        assert!(find_all_regions("# Plain\n\ntext only\n").is_empty());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(RegionKind::WikiLink.label(), "wikilink");
        assert_eq!(RegionKind::YamlFrontmatter.to_string(), "yaml");
    }

    #[test]
    fn test_kind_deserializes_from_kebab_case() {
        use serde::de::value::{Error, StrDeserializer};
        use serde::de::IntoDeserializer;

        let de: StrDeserializer<'_, Error> = "wiki-link".into_deserializer();
        assert_eq!(RegionKind::deserialize(de).unwrap(), RegionKind::WikiLink);
    }
}
