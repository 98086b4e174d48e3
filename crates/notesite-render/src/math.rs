//! Math block protection.
//!
//! Math is not typeset at build time; `$$...$$` display blocks and `$...$`
//! inline spans are lifted out before the Markdown transform and restored
//! verbatim (HTML-escaped) afterwards so a downstream typesetter sees the
//! original delimiters. Dollars inside fenced, indented, or inline code are
//! literal text and never open a span.

use std::ops::Range;

/// A protected math segment awaiting restoration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MathSegment {
    pub placeholder: String,
    /// Raw source including delimiters.
    pub raw: String,
    pub display: bool,
}

/// Replace math spans with opaque placeholders the Markdown transform will
/// pass through untouched.
pub fn protect_math(body: &str) -> (String, Vec<MathSegment>) {
    let code = code_regions(body);
    let mut output = String::with_capacity(body.len());
    let mut segments = Vec::new();
    let bytes = body.as_bytes();
    let mut index = 0usize;

    while index < bytes.len() {
        if let Some(region) = region_at(&code, index) {
            output.push_str(&body[index..region.end]);
            index = region.end;
            continue;
        }

        if bytes[index] == b'\\' && index + 1 < bytes.len() {
            let escaped = escape_len(body, index);
            output.push_str(&body[index..index + escaped]);
            index += escaped;
            continue;
        }

        if bytes[index] == b'$' {
            let display = bytes.get(index + 1) == Some(&b'$');
            let open_len = if display { 2 } else { 1 };
            if let Some(end) = find_closing(body, index + open_len, display) {
                if !overlaps_code(&code, index, end) {
                    let raw = &body[index..end];
                    let placeholder = format!("@@MATH{}@@", segments.len());
                    output.push_str(&placeholder);
                    segments.push(MathSegment {
                        placeholder,
                        raw: raw.to_owned(),
                        display,
                    });
                    index = end;
                    continue;
                }
            }
        }

        let ch_len = body[index..].chars().next().map(char::len_utf8).unwrap_or(1);
        output.push_str(&body[index..index + ch_len]);
        index += ch_len;
    }

    (output, segments)
}

/// Restore protected segments into rendered HTML, escaping the math text.
/// Display blocks shed the `<p>` the Markdown transform wrapped around the
/// placeholder so the `<div>` stands on its own.
pub fn restore_math(html: &str, segments: &[MathSegment]) -> String {
    let mut restored = html.to_owned();
    for segment in segments {
        let class = if segment.display {
            "math display"
        } else {
            "math inline"
        };
        let tag = if segment.display { "div" } else { "span" };
        let replacement = format!(
            "<{tag} class=\"{class}\">{}</{tag}>",
            escape_text(&segment.raw)
        );

        if segment.display {
            let wrapped = format!("<p>{}</p>", segment.placeholder);
            if restored.contains(&wrapped) {
                restored = restored.replace(&wrapped, &replacement);
                continue;
            }
        }
        restored = restored.replace(&segment.placeholder, &replacement);
    }
    restored
}

/// Byte length of a backslash escape at `index`: the backslash plus the
/// whole escaped character, which may be multibyte.
fn escape_len(body: &str, index: usize) -> usize {
    1 + body[index + 1..]
        .chars()
        .next()
        .map(char::len_utf8)
        .unwrap_or(0)
}

/// Find the end (exclusive, past the closing delimiter) of a math span
/// opened at `start`. Inline spans must close on the same line and must not
/// be empty.
fn find_closing(body: &str, start: usize, display: bool) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut index = start;

    while index < bytes.len() {
        match bytes[index] {
            b'\\' if index + 1 < bytes.len() => index += escape_len(body, index),
            b'$' if display => {
                if bytes.get(index + 1) == Some(&b'$') {
                    return Some(index + 2);
                }
                index += 1;
            }
            b'$' => {
                if index == start {
                    return None;
                }
                return Some(index + 1);
            }
            b'\n' if !display => return None,
            _ => index += 1,
        }
    }

    None
}

/// Byte ranges of `body` occupied by code: fenced blocks (fence lines
/// included), indented code lines, and inline backtick spans.
fn code_regions(body: &str) -> Vec<Range<usize>> {
    let mut regions = Vec::new();
    let mut fence: Option<Fence> = None;
    let mut offset = 0usize;

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\r', '\n']);

        if let Some(active) = fence {
            regions.push(offset..offset + line.len());
            if is_closing_fence(trimmed, active) {
                fence = None;
            }
            offset += line.len();
            continue;
        }

        if let Some(opened) = detect_fence_start(trimmed) {
            fence = Some(opened);
            regions.push(offset..offset + line.len());
            offset += line.len();
            continue;
        }

        if is_indented_code_line(trimmed) {
            regions.push(offset..offset + line.len());
            offset += line.len();
            continue;
        }

        inline_code_spans(trimmed, offset, &mut regions);
        offset += line.len();
    }

    regions
}

fn inline_code_spans(line: &str, line_offset: usize, regions: &mut Vec<Range<usize>>) {
    let bytes = line.as_bytes();
    let mut index = 0usize;

    while index < bytes.len() {
        if bytes[index] == b'`' {
            match line[index + 1..].find('`') {
                Some(rel_close) => {
                    let end = index + 1 + rel_close + 1;
                    regions.push(line_offset + index..line_offset + end);
                    index = end;
                }
                None => break,
            }
        } else {
            index += 1;
        }
    }
}

fn region_at(regions: &[Range<usize>], index: usize) -> Option<&Range<usize>> {
    regions
        .iter()
        .find(|region| region.start <= index && index < region.end)
}

fn overlaps_code(regions: &[Range<usize>], start: usize, end: usize) -> bool {
    regions
        .iter()
        .any(|region| region.start < end && start < region.end)
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
    let count = trimmed
        .chars()
        .take_while(|&ch| ch == fence.fence_char)
        .count();
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

fn escape_text(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
