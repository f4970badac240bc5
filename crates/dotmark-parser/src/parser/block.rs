use super::{ParseContext, ParseError, Parser};
use crate::ast::{
    normalize_label, BlockQuote, BlockQuoteKind, Code, FootnoteDefinition, Heading, LinkDefinition,
    List, ListItem, ListProperties, Math, Node, Table, TableAlignment, TableCell,
};
use crate::common::{
    indentation_width, split_custom_id, strip_indentation, trim_delimiters, MappedText,
};
use crate::lexer::patterns::list_patterns;
use crate::lexer::Token;
use crate::Flavor;
use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;
use std::rc::Rc;

lazy_static! {
    static ref FENCE_INFO: Regex = Regex::new(
        r#"^(?P<lang>[^\s"'{]+)?[ \t]*(?P<caption>"[^"]*"|'[^']*')?[ \t]*(?:\{#(?P<id>[^}]+)\})?"#
    )
    .expect("invalid regex expression");
    static ref QUOTE_PREFIX: Regex =
        Regex::new(r"(?m)^ {0,3}>[ \t]?").expect("invalid regex expression");
    static ref QUOTE_KIND: Regex =
        Regex::new(r"(?i)\A(tip|note|warning|important):[ \t]*").expect("invalid regex expression");
    static ref TASK: Regex = Regex::new(r"\A\[([ xX])\][ \t]+").expect("invalid regex expression");
    static ref TABLE_METADATA: Regex = Regex::new(
        r#"^[ \t]*(?P<title>"[^"\n]*"|'[^'\n]*'|\([^)\n]*\))?[ \t]*(?:\{#(?P<id>[^}\n]+)\})?[ \t]*$"#
    )
    .expect("invalid regex expression");
}

impl<'c, C: ParseContext + ?Sized> Parser<'c, C> {
    pub(super) fn paragraph(&mut self, token: &Token) -> Result<Node, ParseError> {
        let text = self.mapped_lines(token.text.trim_end(), 0, |_, line| line.trim_start());
        Ok(Node::Paragraph(self.parse_inline_mapped(text)?))
    }

    pub(super) fn heading(&mut self, token: &Token) -> Result<Node, ParseError> {
        let depth = token.named("hashes").unwrap_or_default().len() as u8;
        let is_decorative = token.named("decorative") == Some("!");
        let (text, custom_id) = split_custom_id(token.named("text").unwrap_or_default());
        let text = self.mapped(text, token.named_start("text").unwrap_or_default());
        Ok(Node::Heading(Heading {
            depth,
            text: self.parse_inline_mapped(text)?,
            is_decorative,
            custom_id,
        }))
    }

    pub(super) fn setext_heading(&mut self, token: &Token) -> Result<Node, ParseError> {
        let depth = if token.named("underline").unwrap_or_default().starts_with('=') {
            1
        } else {
            2
        };
        let raw = token.named("text").unwrap_or_default();
        let start = token.named_start("text").unwrap_or_default() + raw.len()
            - raw.trim_start().len();
        let (text, custom_id) = split_custom_id(raw.trim());
        let text = self.mapped(text, start);
        Ok(Node::Heading(Heading {
            depth,
            text: self.parse_inline_mapped(text)?,
            is_decorative: false,
            custom_id,
        }))
    }

    pub(super) fn block_code(&mut self, token: &Token) -> Node {
        let content = token
            .text
            .lines()
            .map(|l| strip_indentation(l, 4))
            .collect::<Vec<_>>()
            .join("\n");
        Node::Code(Code {
            language: None,
            content: content.trim_end_matches('\n').to_string(),
            caption: None,
            custom_id: None,
        })
    }

    pub(super) fn fenced_code(&mut self, token: &Token) -> Node {
        let info = token.named("fenceinfo").unwrap_or_default().trim();
        let (language, caption, custom_id) = match FENCE_INFO.captures(info) {
            Some(caps) if self.flavor() == Flavor::Extended => (
                caps.name("lang").map(|m| m.as_str().to_string()),
                caps.name("caption")
                    .map(|m| trim_delimiters(m.as_str()).to_string()),
                caps.name("id").map(|m| m.as_str().to_string()),
            ),
            _ => (
                info.split_whitespace().next().map(str::to_string),
                None,
                None,
            ),
        };
        let content = token.named("code").unwrap_or_default();
        Node::Code(Code {
            language,
            content: content.strip_suffix('\n').unwrap_or(content).to_string(),
            caption,
            custom_id,
        })
    }

    pub(super) fn math(&mut self, token: &Token) -> Node {
        let expression = token.named("math").unwrap_or_default();
        Node::Math(Math {
            expression: expression.trim().to_string(),
            custom_id: token.named("mathid").map(str::to_string),
        })
    }

    pub(super) fn link_definition(&mut self, token: &Token) -> Result<Node, ParseError> {
        let label = token.named("linklabel").unwrap_or_default();
        let text = self.mapped(label, token.named_start("linklabel").unwrap_or_default());
        let definition = LinkDefinition {
            label: normalize_label(label),
            text: self.parse_inline_mapped(text)?,
            url: token.named("linkurl").unwrap_or_default().to_string(),
            title: token
                .named("linktitle")
                .map(|t| trim_delimiters(t).to_string()),
        };
        self.ctx.register_link_definition(&definition);
        Ok(Node::LinkDefinition(definition))
    }

    pub(super) fn footnote_definition(&mut self, token: &Token) -> Result<Node, ParseError> {
        let text = self.mapped_dedent(
            token.named("foottext").unwrap_or_default(),
            token.named_start("foottext").unwrap_or_default(),
        );
        Ok(Node::FootnoteDefinition(FootnoteDefinition {
            label: token.named("footlabel").unwrap_or_default().to_string(),
            text: self.parse_inline_mapped(text)?,
        }))
    }

    pub(super) fn block_quote(&mut self, token: &Token) -> Result<Node, ParseError> {
        let stripped = self.mapped_lines(&token.text, 0, |_, line| match QUOTE_PREFIX.find(line) {
            Some(prefix) => &line[prefix.end()..],
            None => line,
        });
        let typed = QUOTE_KIND.captures(&stripped.text).map(|caps| {
            let kind = match caps[1].to_lowercase().as_str() {
                "tip" => BlockQuoteKind::Tip,
                "note" => BlockQuoteKind::Note,
                "warning" => BlockQuoteKind::Warning,
                _ => BlockQuoteKind::Important,
            };
            (kind, caps.get(0).map(|m| m.end()).unwrap_or_default())
        });
        let (kind, content) = match typed {
            Some((kind, prefix_len)) => (Some(kind), stripped.slice(prefix_len)),
            None => (None, stripped),
        };

        let mut children: Vec<Node> = self
            .parse_blocks_mapped(content)?
            .into_iter()
            .filter(|n| *n != Node::Newline)
            .collect();

        // A trailing single-item bullet list names the quote's author.
        let has_attribution = children.len() > 1
            && matches!(
                children.last(),
                Some(Node::List(list)) if !list.is_ordered() && list.children.len() == 1
            );
        let attribution = match has_attribution.then(|| children.pop()).flatten() {
            Some(Node::List(mut list)) => list.children.pop().map(attribution_content),
            _ => None,
        };

        Ok(Node::BlockQuote(BlockQuote {
            kind,
            attribution,
            children,
        }))
    }

    pub(super) fn list(&mut self, token: &Token) -> Result<Node, ParseError> {
        let mut children = self.parse_with(&token.text, list_patterns(), self.region(0))?;
        while children.last() == Some(&Node::Newline) {
            children.pop();
        }
        let is_loose = children.iter().any(|n| *n == Node::Newline);
        let properties = Rc::new(ListProperties { is_loose });

        let mut items: Vec<Node> = children
            .into_iter()
            .filter(|n| *n != Node::Newline)
            .collect();
        for item in items.iter_mut() {
            if let Node::ListItem(item) = item {
                item.owner = Rc::downgrade(&properties);
            }
        }

        let start = if token.kind == crate::lexer::TokenKind::OrderedList {
            let digits: String = token
                .text
                .trim_start()
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            Some(digits.parse().unwrap_or(1))
        } else {
            None
        };

        Ok(Node::List(List {
            start,
            properties,
            children: items,
        }))
    }

    pub(super) fn list_item(&mut self, token: &Token) -> Result<Node, ParseError> {
        let marker = token.group(0);
        let rest = &token.text[marker.len()..];

        let first = rest.lines().next().unwrap_or_default();
        let spacing = first.len() - first.trim_start().len();
        let first = first.trim_start();
        // Content indentation: the marker plus the spaces after it.
        let indent = if first.is_empty() {
            marker.len() + 1
        } else {
            marker.len() + spacing
        };
        let task = TASK
            .captures(first)
            .map(|caps| !caps[1].trim().is_empty());

        let content = self.mapped_lines(rest, marker.len(), |n, line| {
            if n > 0 {
                return strip_indentation(line, indent);
            }
            let line = line.trim_start();
            match TASK.find(line) {
                Some(task) => &line[task.end()..],
                None => line,
            }
        });
        let children = self.parse_blocks_mapped(content)?;

        Ok(Node::ListItem(ListItem {
            task,
            owner: Default::default(),
            children: children
                .into_iter()
                .filter(|n| *n != Node::Newline)
                .collect(),
        }))
    }

    pub(super) fn table(&mut self, token: &Token) -> Result<Node, ParseError> {
        let delimiter = token.named("delimiter").unwrap_or_default();
        let alignments: Vec<TableAlignment> = split_row(delimiter)
            .iter()
            .map(|pieces| alignment(&cell_text(delimiter, pieces)))
            .collect();
        let columns = alignments.len();

        let header = self.cells(
            token.named("header").unwrap_or_default(),
            token.named_start("header").unwrap_or_default(),
            columns,
        )?;
        let mut rows = vec![];
        let mut at = token.named_start("rows").unwrap_or_default();
        for line in token.named("rows").unwrap_or_default().split_inclusive('\n') {
            let row = line.trim_end_matches('\n');
            if !row.trim().is_empty() {
                rows.push(self.cells(row, at, columns)?);
            }
            at += line.len();
        }

        let (caption, custom_id) = token
            .named("metadata")
            .and_then(|m| TABLE_METADATA.captures(m.trim_end()))
            .map(|caps| {
                (
                    caps.name("title")
                        .map(|t| trim_delimiters(t.as_str()).to_string()),
                    caps.name("id").map(|i| i.as_str().to_string()),
                )
            })
            .unwrap_or_default();

        Ok(Node::Table(Table {
            alignments,
            header,
            rows,
            caption,
            custom_id,
        }))
    }

    /// Parses one table row found at byte `start` of the token, dropping excess cells and
    /// back-filling missing ones.
    fn cells(
        &mut self,
        row: &str,
        start: usize,
        columns: usize,
    ) -> Result<Vec<TableCell>, ParseError> {
        let mut cells = vec![];
        for pieces in split_row(row).into_iter().take(columns) {
            let mut text = MappedText::default();
            for piece in pieces {
                text.push(&row[piece.clone()], &self.region(start + piece.start));
            }
            cells.push(TableCell {
                text: self.parse_inline_mapped(text)?,
            });
        }
        cells.resize_with(columns, TableCell::default);
        Ok(cells)
    }

    /// Like [crate::trim_indent], for the text at byte `idx` of the token.
    fn mapped_dedent(&self, text: &str, idx: usize) -> MappedText {
        let mut start = None;
        let mut end = 0;
        let mut at = 0;
        for line in text.split_inclusive('\n') {
            let content = line.trim_end_matches(['\n', '\r']);
            if !content.trim().is_empty() {
                start.get_or_insert(at);
                end = at + content.len();
            }
            at += line.len();
        }
        let Some(start) = start else {
            return MappedText::default();
        };
        let body = &text[start..end];
        let indent = body
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(indentation_width)
            .min()
            .unwrap_or_default();
        self.mapped_lines(body, idx + start, |_, line| strip_indentation(line, indent))
    }
}

fn attribution_content(item: Node) -> Vec<Node> {
    match item {
        Node::ListItem(item) => match <[Node; 1]>::try_from(item.children) {
            Ok([Node::Paragraph(text)]) => text,
            Ok([other]) => vec![other],
            Err(children) => children,
        },
        other => vec![other],
    }
}

/// Splits a table row on unescaped pipes into the byte ranges making up each cell. An escaped
/// pipe loses its backslash, so it starts a range of its own. Empty cells are discarded and the
/// others are trimmed.
fn split_row(row: &str) -> Vec<Vec<Range<usize>>> {
    let mut cells = vec![];
    let mut current = vec![];
    let mut start = 0;
    let mut chars = row.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some((_, '|'))) => {
                current.push(start..idx);
                start = idx + 1;
                chars.next();
            }
            '|' => {
                current.push(start..idx);
                cells.push(std::mem::take(&mut current));
                start = idx + 1;
            }
            _ => {}
        }
    }
    current.push(start..row.len());
    cells.push(current);

    cells
        .into_iter()
        .map(|pieces| pieces.into_iter().filter(|p| !p.is_empty()).collect::<Vec<_>>())
        .filter(|pieces| !pieces.is_empty())
        .map(|pieces| trim_pieces(row, pieces))
        .collect()
}

fn trim_pieces(row: &str, mut pieces: Vec<Range<usize>>) -> Vec<Range<usize>> {
    for piece in pieces.iter_mut() {
        let text = &row[piece.clone()];
        piece.start += text.len() - text.trim_start().len();
        if !piece.is_empty() {
            break;
        }
    }
    for piece in pieces.iter_mut().rev() {
        let text = &row[piece.clone()];
        piece.end -= text.len() - text.trim_end().len();
        if !piece.is_empty() {
            break;
        }
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

fn cell_text(row: &str, pieces: &[Range<usize>]) -> String {
    pieces.iter().map(|p| &row[p.clone()]).collect()
}

fn alignment(delimiter: &str) -> TableAlignment {
    match (delimiter.starts_with(':'), delimiter.ends_with(':')) {
        (true, true) => TableAlignment::Center,
        (true, false) => TableAlignment::Left,
        (false, true) => TableAlignment::Right,
        (false, false) => TableAlignment::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_blocks, RecordingContext};

    fn parse(source: &str) -> Vec<Node> {
        let mut ctx = RecordingContext::new(Flavor::Extended);
        parse_blocks(source, &mut ctx).unwrap()
    }

    fn list(node: &Node) -> &List {
        match node {
            Node::List(list) => list,
            other => panic!("expected a list, found {:?}", other),
        }
    }

    fn item(node: &Node) -> &ListItem {
        match node {
            Node::ListItem(item) => item,
            other => panic!("expected a list item, found {:?}", other),
        }
    }

    macro_rules! looseness_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            paste::item! {
            #[test]
            fn [<looseness_ $name>]() {
                let (input, loose, items): (&str, bool, usize) = $value;
                let nodes = parse(input);
                let list = list(&nodes[0]);
                assert_eq!(list.is_loose(), loose);
                assert_eq!(list.children.len(), items);
                assert!(list.children.iter().all(|n| item(n).is_loose() == loose));
            }
            }
        )*
        }
    }

    looseness_tests! {
        tight: ("- a\n- b\n- c\n", false, 3),
        loose: ("- a\n\n- b\n- c\n", true, 3),
        trailing_blank_lines: ("- a\n- b\n\n\nparagraph\n", false, 2),
        single: ("- a\n", false, 1),
    }

    #[test]
    fn list_fixture() {
        let nodes = parse(include_str!("../../resources/tests/lists.md"));
        let nodes: Vec<&Node> = nodes.iter().filter(|n| **n != Node::Newline).collect();

        let ordered = list(nodes[0]);
        assert_eq!(ordered.start, Some(3));
        assert_eq!(ordered.children.len(), 2);
        let nested = item(&ordered.children[0]);
        assert!(matches!(nested.children[1], Node::List(_)));

        let tasks = list(nodes[1]);
        assert_eq!(item(&tasks.children[0]).task, Some(true));
        assert_eq!(item(&tasks.children[1]).task, Some(false));
        assert_eq!(
            item(&tasks.children[1]).children,
            vec![Node::Paragraph(vec![Node::text("todo")])]
        );
    }

    #[test]
    fn item_content_is_dedented() {
        let nodes = parse("-   a\n    continued\n\n    ```\n    code\n    ```\n");
        let first = item(&list(&nodes[0]).children[0]);
        assert_eq!(
            first.children[0],
            Node::Paragraph(vec![Node::text("a\ncontinued")])
        );
        assert!(matches!(&first.children[1], Node::Code(c) if c.content == "code"));
    }

    #[test]
    fn indented_code() {
        let nodes = parse("    let a = 1;\n      nested\n");
        assert_eq!(
            nodes[0],
            Node::Code(Code {
                language: None,
                content: "let a = 1;\n  nested".into(),
                caption: None,
                custom_id: None,
            })
        );
    }

    #[test]
    fn math_blocks() {
        let nodes = parse("$$$\nx^2\n$$$ {#eq}\n\n$ y $\n");
        assert_eq!(
            nodes[0],
            Node::Math(Math {
                expression: "x^2".into(),
                custom_id: Some("eq".into())
            })
        );
        assert_eq!(
            nodes[2],
            Node::Math(Math {
                expression: "y".into(),
                custom_id: None
            })
        );
    }

    #[test]
    fn quote_without_attribution_keeps_single_list() {
        let nodes = parse("> - only item\n");
        match &nodes[0] {
            Node::BlockQuote(q) => {
                assert!(q.attribution.is_none());
                assert!(matches!(q.children[0], Node::List(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn row_splitting() {
        let texts = |row: &str| -> Vec<String> {
            split_row(row).iter().map(|p| cell_text(row, p)).collect()
        };
        assert_eq!(texts("| a | b |"), vec!["a", "b"]);
        assert_eq!(texts("a||b"), vec!["a", "b"]);
        assert_eq!(texts("a| |b"), vec!["a", "", "b"]);
        assert_eq!(texts("a \\| b | c"), vec!["a | b", "c"]);
        assert_eq!(split_row("a \\| b | c")[0], vec![0..2, 3..6]);
    }
}
