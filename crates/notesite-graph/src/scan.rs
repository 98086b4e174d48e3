//! Wiki-link token scanner.
//!
//! Tokens use the `[[target]]` grammar with optional `|alias` display text,
//! optional `#section` fragment, and a `!` prefix for embeds. Tokens inside
//! fenced code blocks, indented code, or inline code spans are ignored.
//! Tokens never span lines.

use std::ops::Range;

/// Raw wiki-link token before resolution against the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawWikiLink {
    /// Target text with alias and fragment stripped.
    pub target: String,
    pub alias: Option<String>,
    pub fragment: Option<String>,
    pub embed: bool,
    /// 1-based line within the scanned text.
    pub line: usize,
    /// Byte span of the whole token (including `!` for embeds).
    pub span: Range<usize>,
}

impl RawWikiLink {
    /// Display text: the alias when present, otherwise the bare target.
    pub fn label(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.target)
    }
}

/// Scan `text` for wiki-link tokens in document order.
pub fn scan_wiki_links(text: &str) -> Vec<RawWikiLink> {
    let mut links = Vec::new();
    let mut fence: Option<Fence> = None;
    let mut offset = 0usize;

    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let trimmed = line.trim_end_matches(['\r', '\n']);

        if let Some(active) = fence {
            if is_closing_fence(trimmed, active) {
                fence = None;
            }
            offset += line.len();
            continue;
        }

        if let Some(opened) = detect_fence_start(trimmed) {
            fence = Some(opened);
            offset += line.len();
            continue;
        }

        if is_indented_code_line(trimmed) {
            offset += line.len();
            continue;
        }

        scan_line(trimmed, offset, idx + 1, &mut links);
        offset += line.len();
    }

    links
}

fn scan_line(line: &str, line_offset: usize, line_no: usize, links: &mut Vec<RawWikiLink>) {
    let bytes = line.as_bytes();
    let mut index = 0usize;
    let mut in_code_span = false;

    while index < bytes.len() {
        match bytes[index] {
            b'`' => {
                in_code_span = !in_code_span;
                index += 1;
            }
            b'[' if !in_code_span && bytes.get(index + 1) == Some(&b'[') => {
                let inner_start = index + 2;
                match line[inner_start..].find("]]") {
                    Some(rel_close) => {
                        let inner = &line[inner_start..inner_start + rel_close];
                        let embed = index > 0 && bytes[index - 1] == b'!';
                        let token_start = if embed { index - 1 } else { index };
                        let token_end = inner_start + rel_close + 2;

                        if let Some(link) = parse_inner(inner, embed) {
                            links.push(RawWikiLink {
                                span: line_offset + token_start..line_offset + token_end,
                                line: line_no,
                                ..link
                            });
                        }
                        index = token_end;
                    }
                    None => break,
                }
            }
            _ => index += 1,
        }
    }
}

fn parse_inner(inner: &str, embed: bool) -> Option<RawWikiLink> {
    let (target_part, alias) = match inner.split_once('|') {
        Some((target, alias)) => (target, Some(alias.trim().to_owned())),
        None => (inner, None),
    };

    let (target, fragment) = match target_part.split_once('#') {
        Some((target, fragment)) => (target, Some(fragment.trim().to_owned())),
        None => (target_part, None),
    };

    let target = target.trim();
    if target.is_empty() {
        return None;
    }

    Some(RawWikiLink {
        target: target.to_owned(),
        alias: alias.filter(|alias| !alias.is_empty()),
        fragment: fragment.filter(|fragment| !fragment.is_empty()),
        embed,
        line: 0,
        span: 0..0,
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct Fence {
    fence_char: char,
    fence_len: usize,
}

fn detect_fence_start(line: &str) -> Option<Fence> {
    let rest = line.trim_start();
    if line.len() - rest.len() > 3 {
        return None;
    }

    let mut chars = rest.chars();
    let first = chars.next()?;
    if first != '`' && first != '~' {
        return None;
    }

    let mut count = 1usize;
    for ch in chars {
        if ch == first {
            count += 1;
        } else {
            break;
        }
    }

    if count < 3 {
        return None;
    }

    Some(Fence {
        fence_char: first,
        fence_len: count,
    })
}

fn is_closing_fence(line: &str, fence: Fence) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    let count = trimmed.chars().take_while(|&ch| ch == fence.fence_char).count();
    count >= fence.fence_len && trimmed.chars().all(|ch| ch == fence.fence_char)
}

fn is_indented_code_line(line: &str) -> bool {
    let mut width = 0usize;
    for ch in line.chars() {
        match ch {
            ' ' => {
                width += 1;
                if width >= 4 {
                    return true;
                }
            }
            '\t' => return true,
            _ => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_basic_token_with_span() {
        let links = scan_wiki_links("See [[Kalman Filter]] for details.\n");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "Kalman Filter");
        assert_eq!(links[0].label(), "Kalman Filter");
        assert_eq!(links[0].line, 1);
        assert_eq!(&"See [[Kalman Filter]] for details.\n"[links[0].span.clone()], "[[Kalman Filter]]");
    }

    #[test]
    fn alias_and_fragment_are_split_out() {
        let links = scan_wiki_links("[[Kalman Filter#Prediction|the KF notes]]");
        assert_eq!(links[0].target, "Kalman Filter");
        assert_eq!(links[0].fragment.as_deref(), Some("Prediction"));
        assert_eq!(links[0].label(), "the KF notes");
    }

    #[test]
    fn embed_prefix_is_detected() {
        let links = scan_wiki_links("![[diagram.png]]\n");
        assert!(links[0].embed);
        assert_eq!(links[0].target, "diagram.png");
        assert_eq!(links[0].span, 0..16);
    }

    #[test]
    fn code_fences_suppress_tokens() {
        let text = "```\n[[Hidden]]\n```\n[[Visible]]\n";
        let links = scan_wiki_links(text);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "Visible");
        assert_eq!(links[0].line, 4);
    }

    #[test]
    fn inline_code_spans_suppress_tokens() {
        let links = scan_wiki_links("use `[[Result]]` but also [[Option]]\n");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "Option");
    }

    #[test]
    fn indented_code_suppresses_tokens() {
        let links = scan_wiki_links("    [[NotALink]]\nplain [[Link]]\n");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].target, "Link");
    }

    #[test]
    fn empty_target_is_skipped() {
        assert!(scan_wiki_links("[[]] and [[ ]]\n").is_empty());
    }

    #[test]
    fn multiple_tokens_on_one_line_keep_order() {
        let links = scan_wiki_links("[[A]] then [[B|bee]]\n");
        let targets: Vec<_> = links.iter().map(|l| l.target.as_str()).collect();
        assert_eq!(targets, vec!["A", "B"]);
    }
}
