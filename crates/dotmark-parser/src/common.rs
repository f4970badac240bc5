use serde::{Deserialize, Serialize};
use std::cmp::min;
use std::ops::Range;

/// Byte range into the source a token or node was produced from.
#[derive(Debug, PartialEq, Eq, Default, Clone, Serialize, Deserialize)]
pub struct Span {
    pub range: Range<usize>,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { range: start..end }
    }

    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn get_with_margin<'a>(&self, input: &'a str, margin: usize) -> &'a str {
        let start = floor_boundary(input, self.range.start.saturating_sub(margin));
        let end = floor_boundary(input, min(self.range.end + margin, input.len()));
        &input[start..end]
    }
}

fn floor_boundary(input: &str, mut idx: usize) -> usize {
    while idx > 0 && !input.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self { range }
    }
}

/// Maps byte positions of a text cut out of a larger source back onto that source. Each segment
/// pairs a position in the text with the source position it was taken from. Segments are sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMap {
    segments: Vec<(usize, usize)>,
}

impl Default for SourceMap {
    fn default() -> Self {
        SourceMap::offset(0)
    }
}

impl SourceMap {
    /// A text copied verbatim from `start` bytes into the source.
    pub fn offset(start: usize) -> Self {
        SourceMap {
            segments: vec![(0, start)],
        }
    }

    pub fn map(&self, pos: usize) -> usize {
        let idx = self.segments.partition_point(|(local, _)| *local <= pos);
        let (local, source) = idx
            .checked_sub(1)
            .and_then(|i| self.segments.get(i))
            .or_else(|| self.segments.first())
            .copied()
            .unwrap_or_default();
        (source + pos).saturating_sub(local)
    }

    /// Maps a range. The end is taken from the last byte so it never lands past a stripped prefix.
    pub fn map_range(&self, start: usize, end: usize) -> Span {
        let mapped_end = if end > start {
            self.map(end - 1) + 1
        } else {
            self.map(start)
        };
        Span::new(self.map(start), mapped_end)
    }

    /// The map of the text starting `start` bytes in.
    pub fn slice(&self, start: usize) -> SourceMap {
        let mut segments = vec![(0, self.map(start))];
        segments.extend(
            self.segments
                .iter()
                .filter(|(local, _)| *local > start)
                .map(|(local, source)| (local - start, *source)),
        );
        SourceMap { segments }
    }
}

/// Text assembled from pieces of a source, remembering where each piece came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedText {
    pub text: String,
    pub map: SourceMap,
}

impl Default for MappedText {
    fn default() -> Self {
        MappedText {
            text: String::new(),
            map: SourceMap { segments: vec![] },
        }
    }
}

impl MappedText {
    /// Appends `piece`, whose first byte sits where `map` starts.
    pub fn push(&mut self, piece: &str, map: &SourceMap) {
        if piece.is_empty() {
            return;
        }
        let base = self.text.len();
        for &(local, source) in &map.segments {
            if local > 0 && local >= piece.len() {
                break;
            }
            self.add_segment(base + local, source);
        }
        self.text.push_str(piece);
    }

    /// The text from byte `start` on.
    pub fn slice(&self, start: usize) -> MappedText {
        MappedText {
            text: self.text[start..].to_string(),
            map: self.map.slice(start),
        }
    }

    fn add_segment(&mut self, local: usize, source: usize) {
        if let Some(&(last_local, last_source)) = self.map.segments.last() {
            if last_source + (local - last_local) == source {
                return;
            }
        }
        self.map.segments.push((local, source));
    }
}

/// Removes the indentation shared by every non-blank line, as well as leading and trailing
/// blank lines.
pub fn trim_indent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let lines = &lines[first..=last];

    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indentation_width(l))
        .min()
        .unwrap_or_default();

    lines
        .iter()
        .map(|l| strip_indentation(l, indent))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Removes up to `width` columns of leading spaces or tabs from each line. Tabs count as four
/// columns.
pub fn strip_indentation(line: &str, width: usize) -> &str {
    let mut columns = 0;
    for (idx, c) in line.char_indices() {
        if columns >= width {
            return &line[idx..];
        }
        match c {
            ' ' => columns += 1,
            '\t' => columns += 4,
            _ => return &line[idx..],
        }
    }
    ""
}

/// Counts the leading indentation columns of `line`. Tabs count as four columns.
pub fn indentation_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Splits a trailing `{#id}` from `text`, returning the remaining text and the id.
pub fn split_custom_id(text: &str) -> (&str, Option<String>) {
    let trimmed = text.trim_end();
    if let Some(stripped) = trimmed.strip_suffix('}') {
        if let Some(open) = stripped.rfind("{#") {
            let id = &stripped[open + 2..];
            let before = &stripped[..open];
            let separated = before.is_empty() || before.ends_with([' ', '\t']);
            if !id.is_empty() && !id.contains('}') && separated {
                return (before.trim_end(), Some(id.to_string()));
            }
        }
    }
    (text, None)
}

/// Strips a delimiter pair (`"..."`, `'...'` or `(...)`) from a title-like string.
pub fn trim_delimiters(text: &str) -> &str {
    let text = text.trim();
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some('"'), Some('"')) | (Some('\''), Some('\'')) | (Some('('), Some(')'))
            if text.len() >= 2 =>
        {
            &text[1..text.len() - 1]
        }
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_indent_keeps_relative_indentation() {
        assert_eq!(
            trim_indent("\n    body content\n  body content\n"),
            "  body content\nbody content"
        );
        assert_eq!(
            trim_indent("  body content\n\n  body content"),
            "body content\n\nbody content"
        );
        assert_eq!(trim_indent("   \n  "), "");
    }

    #[test]
    fn custom_id_suffix() {
        assert_eq!(
            split_custom_id("Title {#my-id}"),
            ("Title", Some("my-id".to_string()))
        );
        assert_eq!(split_custom_id("Title{#x}"), ("Title{#x}", None));
        assert_eq!(split_custom_id("{#only}"), ("", Some("only".to_string())));
        assert_eq!(split_custom_id("No id"), ("No id", None));
    }

    #[test]
    fn delimiters() {
        assert_eq!(trim_delimiters("\"Caption\""), "Caption");
        assert_eq!(trim_delimiters("(Caption)"), "Caption");
        assert_eq!(trim_delimiters("'x'"), "x");
        assert_eq!(trim_delimiters("plain"), "plain");
        assert_eq!(trim_delimiters("\""), "\"");
    }

    #[test]
    fn mapped_text_follows_its_pieces() {
        let mut mapped = MappedText::default();
        mapped.push("ab\n", &SourceMap::offset(12));
        mapped.push("cd", &SourceMap::offset(20));
        assert_eq!(mapped.text, "ab\ncd");
        assert_eq!(mapped.map.map(0), 12);
        assert_eq!(mapped.map.map(2), 14);
        assert_eq!(mapped.map.map(3), 20);
        assert_eq!(mapped.map.map_range(1, 5), Span::new(13, 22));
        // A range ending at a line break stays before the next line's prefix.
        assert_eq!(mapped.map.map_range(0, 3), Span::new(12, 15));

        let inner = mapped.map.slice(2);
        assert_eq!(inner.map(0), 14);
        assert_eq!(inner.map(1), 20);
    }

    #[test]
    fn contiguous_pieces_share_a_segment() {
        let mut mapped = MappedText::default();
        mapped.push("ab", &SourceMap::offset(5));
        mapped.push("cd", &SourceMap::offset(7));
        assert_eq!(mapped.map, SourceMap::offset(5));
    }

    #[test]
    fn span_margin_respects_char_boundaries() {
        let input = "héllo world";
        let span = Span::new(3, 5);
        assert_eq!(span.get_with_margin(input, 1), "éllo");
    }
}
