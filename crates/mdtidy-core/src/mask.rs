//! Placeholder masking of protected regions
//!
//! Each protected span is swapped for an opaque token before a rewrite runs
//! and swapped back afterwards. Tokens are wrapped in a pair of private-use
//! code points that do not occur anywhere in the input, so a token can
//! never collide with document text, and they contain no whitespace, `#`,
//! brackets or backticks, so no rewrite pattern can match or split one.

use std::collections::HashSet;

use crate::region::{find_regions, ProtectedSpan, RegionKind};

/// A document with its protected regions replaced by placeholder tokens
#[derive(Debug, Clone)]
pub struct MaskedText {
    text: String,
    spans: Vec<ProtectedSpan>,
    open: char,
    close: char,
}

impl MaskedText {
    /// Mask every region of the given kinds in `text`
    ///
    /// Token ids follow the classifier order (kind priority, then position).
    pub fn new(text: &str, kinds: &[RegionKind]) -> Self {
        let (open, close) = pick_sentinels(text);
        let spans = find_regions(text, kinds);

        let mut order: Vec<usize> = (0..spans.len()).collect();
        order.sort_by_key(|&id| spans[id].start);

        let mut masked = Self {
            text: String::with_capacity(text.len()),
            spans,
            open,
            close,
        };

        let mut cursor = 0;
        for id in order {
            let (start, end) = (masked.spans[id].start, masked.spans[id].end);
            let token = masked.placeholder(id);
            masked.text.push_str(&text[cursor..start]);
            masked.text.push_str(&token);
            cursor = end;
        }
        masked.text.push_str(&text[cursor..]);

        masked
    }

    /// The masked text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The spans that were masked, indexed by token id
    pub fn spans(&self) -> &[ProtectedSpan] {
        &self.spans
    }

    pub fn placeholder_count(&self) -> usize {
        self.spans.len()
    }

    /// The token standing in for span `id`
    pub fn placeholder(&self, id: usize) -> String {
        let label = self.spans.get(id).map_or("", |span| span.kind.label());
        format!("{}{}{}{}", self.open, label, id, self.close)
    }

    /// Substitute every token in `transformed` with its original content
    ///
    /// Tokens that do not belong to this mask are copied through unchanged.
    pub fn restore(&self, transformed: &str) -> String {
        if self.spans.is_empty() {
            return transformed.to_string();
        }

        let mut restored = String::with_capacity(transformed.len() + self.masked_len());
        let mut rest = transformed;

        while let Some(pos) = rest.find(self.open) {
            restored.push_str(&rest[..pos]);
            let after = &rest[pos + self.open.len_utf8()..];

            match self.token_at(after) {
                Some((id, consumed)) => {
                    restored.push_str(&self.spans[id].original);
                    rest = &after[consumed..];
                }
                None => {
                    restored.push(self.open);
                    rest = after;
                }
            }
        }
        restored.push_str(rest);

        restored
    }

    /// Ids of spans whose token does not appear exactly once in `transformed`
    pub fn missing_placeholders(&self, transformed: &str) -> Vec<usize> {
        (0..self.spans.len())
            .filter(|&id| transformed.matches(&self.placeholder(id)).count() != 1)
            .collect()
    }

    /// Parse `<label><id><close>` at the start of `s`
    fn token_at(&self, s: &str) -> Option<(usize, usize)> {
        let close = s.find(self.close)?;
        let inner = &s[..close];
        let digits = inner.find(|c: char| c.is_ascii_digit())?;
        let id: usize = inner[digits..].parse().ok()?;
        let span = self.spans.get(id)?;

        (inner[..digits] == *span.kind.label()).then_some((id, close + self.close.len_utf8()))
    }

    fn masked_len(&self) -> usize {
        self.spans.iter().map(ProtectedSpan::len).sum()
    }
}

/// Run `f` over `text` with the given region kinds masked, then restore them
pub fn with_masked<F>(text: &str, kinds: &[RegionKind], f: F) -> String
where
    F: FnOnce(&str) -> String,
{
    let masked = MaskedText::new(text, kinds);
    let transformed = f(masked.text());
    masked.restore(&transformed)
}

/// Choose a pair of private-use code points absent from `text`
fn pick_sentinels(text: &str) -> (char, char) {
    let used: HashSet<char> = text.chars().filter(|c| is_private_use(*c)).collect();

    (0xE000u32..0xF8FF)
        .step_by(2)
        .chain((0xF0000u32..0xFFFFD).step_by(2))
        .filter_map(|cp| Some((char::from_u32(cp)?, char::from_u32(cp + 1)?)))
        .find(|(open, close)| !used.contains(open) && !used.contains(close))
        .unwrap_or(('\u{E000}', '\u{E001}'))
}

fn is_private_use(c: char) -> bool {
    matches!(c, '\u{E000}'..='\u{F8FF}' | '\u{F0000}'..='\u{FFFFD}' | '\u{100000}'..='\u{10FFFD}')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RegionKind; 5] = RegionKind::ALL;

    #[test]
    fn test_masks_and_restores_exactly() {
        let text = "---\ntitle: x\n---\n# H `code` [l](t) [[w]] #tag\n```\n# in code\n\n\n```\n";
        let masked = MaskedText::new(text, &ALL);

        assert!(!masked.text().contains("# in code"));
        assert!(!masked.text().contains("#tag"));
        assert!(masked.text().starts_with("---\n"));
        assert_eq!(masked.placeholder_count(), 6);
        assert_eq!(masked.restore(masked.text()), text);
    }

    #[test]
    fn test_yaml_delimiters_stay_visible() {
        let text = "---\na: 1\nb: 2\n---\n# H";
        let masked = MaskedText::new(text, &[RegionKind::YamlFrontmatter]);

        let token = masked.placeholder(0);
        assert_eq!(masked.text(), format!("---\n{}\n---\n# H", token));
    }

    #[test]
    fn test_only_requested_kinds_masked() {
        let text = "`code` #tag";
        let masked = MaskedText::new(text, &[RegionKind::Tag]);

        assert!(masked.text().starts_with("`code` "));
        assert!(!masked.text().contains("#tag"));
    }

    #[test]
    fn test_restore_survives_blank_line_edits() {
        let text = "# H\n```\ncode\n```\n# Next";
        let masked = MaskedText::new(text, &ALL);

        let transformed = masked.text().replace('\n', "\n\n");
        let restored = masked.restore(&transformed);

        assert_eq!(restored, "# H\n\n```\ncode\n```\n\n# Next");
    }

    #[test]
    fn test_placeholders_have_no_pattern_characters() {
        let text = "[a](b) `c` #d [[e]]";
        let masked = MaskedText::new(text, &ALL);

        for id in 0..masked.placeholder_count() {
            let token = masked.placeholder(id);
            assert!(
                !token.contains(|c: char| c.is_whitespace() || "#[]`()-".contains(c)),
                "token {:?} contains a pattern character",
                token
            );
        }
    }

    #[test]
    fn test_sentinels_avoid_existing_private_use_chars() {
        let text = "\u{E000}\u{E001} `code`";
        let masked = MaskedText::new(text, &ALL);

        assert!(!masked.placeholder(0).contains('\u{E000}'));
        assert_eq!(masked.restore(masked.text()), text);
    }

    #[test]
    fn test_missing_placeholders_reported() {
        let text = "`a` and `b`";
        let masked = MaskedText::new(text, &ALL);
        let first = masked.placeholder(0);

        let damaged = masked.text().replace(&first, "");
        assert_eq!(masked.missing_placeholders(&damaged), vec![0]);
        assert!(masked.missing_placeholders(masked.text()).is_empty());
    }

    #[test]
    fn test_with_masked_hides_regions_from_callback() {
        let text = "# H\n`# x`\n";
        let result = with_masked(text, &ALL, |masked| {
            assert!(!masked.contains("# x"));
            masked.replace('H', "Heading")
        });

        assert_eq!(result, "# Heading\n`# x`\n");
    }

    #[test]
    fn test_no_regions_is_identity() {
        let text = "plain text\n\n# H\n";
        let masked = MaskedText::new(text, &ALL);

        assert_eq!(masked.text(), text);
        assert_eq!(masked.restore("changed"), "changed");
    }

    #[test]
    fn test_unicode_content_preserved() {
        let text = "# Überschrift\n`код` #標籤 [[ページ]]\n";
        let masked = MaskedText::new(text, &ALL);

        assert_eq!(masked.restore(masked.text()), text);
    }
}
