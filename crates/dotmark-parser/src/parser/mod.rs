//! Token-to-node parsing. Every token visit produces exactly one node; some visits lex and parse
//! an inner region again (list items, quotes, emphasis, link labels).
mod block;
mod expression;
mod inline;

pub use expression::parse_expression;

use crate::ast::{Ast, CallId, FunctionCallNode, LinkDefinition, Node};
use crate::common::{MappedText, SourceMap, Span};
use crate::lexer::patterns::{block_patterns, inline_patterns};
use crate::lexer::{LexError, Lexer, Token, TokenKind, TokenPattern};
use crate::Flavor;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("lexical error at offset {offset}: no pattern matches '{snippet}'")]
    Lexical { offset: usize, snippet: String },
    #[error("syntax error: {message}")]
    Syntax { span: Span, message: String },
}

impl From<LexError> for ParseError {
    fn from(value: LexError) -> Self {
        match value {
            LexError::NoMatch { offset, snippet } => ParseError::Lexical { offset, snippet },
            LexError::Walk(e) => ParseError::Syntax {
                span: e.range().into(),
                message: e.to_string(),
            },
        }
    }
}

/// What the parser needs from its surroundings: the active flavor, fresh call ids and a place to
/// register the calls and link definitions it finds.
pub trait ParseContext {
    fn flavor(&self) -> Flavor;

    fn next_call_id(&mut self) -> CallId;

    fn register_call(&mut self, call: &FunctionCallNode);

    fn register_link_definition(&mut self, definition: &LinkDefinition);
}

/// A standalone context that records what the parser registers.
#[derive(Debug, Clone, Default)]
pub struct RecordingContext {
    pub flavor: Flavor,
    pub calls: Vec<CallId>,
    pub link_definitions: Vec<LinkDefinition>,
    next_id: u64,
}

impl RecordingContext {
    pub fn new(flavor: Flavor) -> Self {
        RecordingContext {
            flavor,
            ..Default::default()
        }
    }
}

impl ParseContext for RecordingContext {
    fn flavor(&self) -> Flavor {
        self.flavor
    }

    fn next_call_id(&mut self) -> CallId {
        self.next_id += 1;
        CallId(self.next_id)
    }

    fn register_call(&mut self, call: &FunctionCallNode) {
        self.calls.push(call.id);
    }

    fn register_link_definition(&mut self, definition: &LinkDefinition) {
        self.link_definitions.push(definition.clone());
    }
}

pub struct Parser<'c, C: ParseContext + ?Sized> {
    ctx: &'c mut C,
    /// Maps the region being parsed onto the document.
    map: SourceMap,
    /// Start of the current token within that region.
    token_start: usize,
}

impl<'c, C: ParseContext + ?Sized> Parser<'c, C> {
    pub fn new(ctx: &'c mut C) -> Self {
        Parser {
            ctx,
            map: SourceMap::default(),
            token_start: 0,
        }
    }

    fn flavor(&self) -> Flavor {
        self.ctx.flavor()
    }

    pub fn parse_blocks(&mut self, source: &str) -> Result<Vec<Node>, ParseError> {
        self.parse_with(source, block_patterns(self.flavor()), SourceMap::default())
    }

    pub(crate) fn parse_blocks_mapped(&mut self, text: MappedText) -> Result<Vec<Node>, ParseError> {
        self.parse_with(&text.text, block_patterns(self.flavor()), text.map)
    }

    pub fn parse_inline(&mut self, source: &str) -> Result<Vec<Node>, ParseError> {
        let nodes = self.parse_with(source, inline_patterns(self.flavor()), SourceMap::default())?;
        Ok(merge_text(nodes))
    }

    pub(crate) fn parse_inline_mapped(&mut self, text: MappedText) -> Result<Vec<Node>, ParseError> {
        let nodes = self.parse_with(&text.text, inline_patterns(self.flavor()), text.map)?;
        Ok(merge_text(nodes))
    }

    /// Lexes and parses `source`, whose positions `map` places in the document.
    pub(crate) fn parse_with(
        &mut self,
        source: &str,
        patterns: &[TokenPattern],
        map: SourceMap,
    ) -> Result<Vec<Node>, ParseError> {
        let tokens = Lexer::new(source, patterns)
            .with_source_map(map.clone())
            .tokenize()?;

        let outer = (std::mem::replace(&mut self.map, map), self.token_start);
        let mut nodes = Vec::with_capacity(tokens.len());
        let mut start = 0;
        let mut result = Ok(());
        for token in tokens {
            self.token_start = start;
            start += token.text.len();
            match self.parse_token(token) {
                Ok(node) => nodes.push(node),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        (self.map, self.token_start) = outer;
        result.map(|_| nodes)
    }

    /// The source map of the current token's text from byte `idx` on.
    fn region(&self, idx: usize) -> SourceMap {
        self.map.slice(self.token_start + idx)
    }

    /// A piece of the current token's text starting at byte `idx`.
    fn mapped(&self, piece: &str, idx: usize) -> MappedText {
        let mut text = MappedText::default();
        text.push(piece, &self.region(idx));
        text
    }

    /// Joins the lines of `text`, found at byte `idx` of the current token, after `strip` removes
    /// a prefix from each. Line breaks are kept.
    fn mapped_lines<'t>(
        &self,
        text: &'t str,
        idx: usize,
        mut strip: impl FnMut(usize, &'t str) -> &'t str,
    ) -> MappedText {
        let mut mapped = MappedText::default();
        let mut at = idx;
        for (n, line) in text.split_inclusive('\n').enumerate() {
            let content = line.trim_end_matches('\n').trim_end_matches('\r');
            let stripped = strip(n, content);
            mapped.push(stripped, &self.region(at + content.len() - stripped.len()));
            if line.ends_with('\n') {
                mapped.push("\n", &self.region(at + line.len() - 1));
            }
            at += line.len();
        }
        mapped
    }

    fn parse_token(&mut self, token: Token) -> Result<Node, ParseError> {
        match token.kind {
            TokenKind::Newline => Ok(Node::Newline),
            TokenKind::BlockCode => Ok(self.block_code(&token)),
            TokenKind::FencedCode => Ok(self.fenced_code(&token)),
            TokenKind::MultilineMath | TokenKind::OnelineMath => Ok(self.math(&token)),
            TokenKind::HorizontalRule => Ok(Node::HorizontalRule),
            TokenKind::Heading => self.heading(&token),
            TokenKind::SetextHeading => self.setext_heading(&token),
            TokenKind::LinkDefinition => self.link_definition(&token),
            TokenKind::FootnoteDefinition => self.footnote_definition(&token),
            TokenKind::BlockQuote => self.block_quote(&token),
            TokenKind::UnorderedList | TokenKind::OrderedList => self.list(&token),
            TokenKind::ListItem => self.list_item(&token),
            TokenKind::PageBreak => Ok(Node::PageBreak),
            TokenKind::Table => self.table(&token),
            TokenKind::Html => Ok(Node::Html(token.text.trim_end().to_string())),
            TokenKind::BlockFunctionCall => self.function_call(token, true),
            TokenKind::Paragraph => self.paragraph(&token),

            TokenKind::Escape => Ok(Node::Text(token.named("escaped").unwrap_or_default().into())),
            TokenKind::Entity => Ok(self.entity(&token)),
            TokenKind::Comment => Ok(Node::Comment),
            TokenKind::LineBreak => Ok(Node::LineBreak),
            TokenKind::CodeSpan => Ok(self.code_span(&token)),
            TokenKind::InlineMath => Ok(Node::MathSpan(
                token.named("math").unwrap_or_default().trim().to_string(),
            )),
            TokenKind::Image => self.image(&token),
            TokenKind::ReferenceImage => self.reference_image(&token),
            TokenKind::Link => self.link(&token),
            TokenKind::ReferenceFootnote => Ok(Node::ReferenceFootnote(
                token.named("footref").unwrap_or_default().to_string(),
            )),
            TokenKind::ReferenceLink => self.reference_link(&token),
            TokenKind::DiamondAutolink | TokenKind::UrlAutolink => Ok(self.autolink(&token)),
            TokenKind::InlineFunctionCall => self.function_call(token, false),
            TokenKind::StrongEmphasis
            | TokenKind::Strong
            | TokenKind::Emphasis
            | TokenKind::Strikethrough => self.styled(&token),
            TokenKind::TextSymbol => Ok(self.text_symbol(&token)),
            TokenKind::CriticalContent => Ok(Node::CriticalContent(token.text)),
            TokenKind::PlainText => Ok(Node::Text(token.text)),
        }
    }

    fn function_call(&mut self, token: Token, is_block: bool) -> Result<Node, ParseError> {
        let walked = match token.walker_result.map(|r| r.value) {
            Some(crate::lexer::Walked::FunctionCall(call)) => call,
            _ => {
                return Err(ParseError::Syntax {
                    span: token.span,
                    message: "function call token without a walked call".into(),
                })
            }
        };
        let (name, arguments) = expression::fold_chain(walked, &token.span)?;
        let node = FunctionCallNode {
            id: self.ctx.next_call_id(),
            name,
            arguments,
            is_block,
            span: token.span,
            state: Default::default(),
            children: vec![],
        };
        tracing::trace!(call = %node.name, id = %node.id, "registering function call");
        self.ctx.register_call(&node);
        Ok(Node::FunctionCall(node))
    }
}

/// Joins adjacent text nodes.
pub(crate) fn merge_text(nodes: Vec<Node>) -> Vec<Node> {
    let mut merged: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match (merged.last_mut(), node) {
            (Some(Node::Text(previous)), Node::Text(text)) => previous.push_str(&text),
            (_, node) => merged.push(node),
        }
    }
    merged
}

/// Parses a whole document.
pub fn parse<C: ParseContext + ?Sized>(source: &str, ctx: &mut C) -> Result<Ast, ParseError> {
    let nodes = Parser::new(ctx).parse_blocks(source)?;
    Ok(Ast {
        nodes,
        source: source.to_string(),
    })
}

pub fn parse_blocks<C: ParseContext + ?Sized>(
    source: &str,
    ctx: &mut C,
) -> Result<Vec<Node>, ParseError> {
    Parser::new(ctx).parse_blocks(source)
}

pub fn parse_inline<C: ParseContext + ?Sized>(
    source: &str,
    ctx: &mut C,
) -> Result<Vec<Node>, ParseError> {
    Parser::new(ctx).parse_inline(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{
        Argument, BlockQuoteKind, CallState, Expression, Heading, Style, TableAlignment,
        UncheckedCall,
    };

    fn parse_extended(source: &str) -> (Vec<Node>, RecordingContext) {
        let mut ctx = RecordingContext::new(Flavor::Extended);
        let nodes = parse_blocks(source, &mut ctx).unwrap();
        (nodes, ctx)
    }

    fn without_newlines(nodes: Vec<Node>) -> Vec<Node> {
        nodes.into_iter().filter(|n| *n != Node::Newline).collect()
    }

    fn calls(nodes: &[Node]) -> Vec<&FunctionCallNode> {
        let mut found = vec![];
        for node in nodes {
            if let Node::FunctionCall(call) = node {
                found.push(call);
            }
            for children in node.child_lists() {
                found.extend(calls(children));
            }
        }
        found
    }

    fn dynamic(text: &str) -> Expression {
        Expression::Dynamic(text.to_string())
    }

    #[test]
    fn headings() {
        let (nodes, _) = parse_extended("# Title {#custom}\n\n##! Decorative\n\nSetext\n---\n");
        let nodes = without_newlines(nodes);
        assert_eq!(
            nodes,
            vec![
                Node::Heading(Heading {
                    depth: 1,
                    text: vec![Node::text("Title")],
                    is_decorative: false,
                    custom_id: Some("custom".into()),
                }),
                Node::Heading(Heading {
                    depth: 2,
                    text: vec![Node::text("Decorative")],
                    is_decorative: true,
                    custom_id: None,
                }),
                Node::Heading(Heading {
                    depth: 2,
                    text: vec![Node::text("Setext")],
                    is_decorative: false,
                    custom_id: None,
                }),
            ]
        );
    }

    #[test]
    fn block_call_with_arguments_and_body() {
        let (nodes, ctx) =
            parse_extended(".function {arg1} {arg2}\n    body content\n\n    body content\n");
        let found = calls(&nodes);
        assert_eq!(found.len(), 1);
        let call = found[0];
        assert_eq!(call.name, "function");
        assert!(call.is_block);
        assert_eq!(call.state, CallState::Pending);
        assert_eq!(
            call.arguments,
            vec![
                Argument::positional(dynamic("arg1")),
                Argument::positional(dynamic("arg2")),
                Argument::body("body content\n\nbody content"),
            ]
        );
        assert_eq!(ctx.calls, vec![call.id]);
    }

    #[test]
    fn chained_calls_nest_their_predecessor() {
        let (nodes, ctx) = parse_extended(".foo {x}::bar name:{y}\n");
        let call = calls(&nodes)[0];
        assert_eq!(call.name, "bar");
        assert_eq!(
            call.arguments,
            vec![
                Argument::positional(Expression::Call(UncheckedCall {
                    name: "foo".into(),
                    arguments: vec![Argument::positional(dynamic("x"))],
                    span: call.span.clone(),
                })),
                Argument::named("name", dynamic("y")),
            ]
        );
        // Only the outermost call is a node.
        assert_eq!(ctx.calls.len(), 1);
    }

    #[test]
    fn inline_calls_are_registered_in_document_order() {
        let (nodes, ctx) = parse_extended("Hello .name {a}, and .other\n\n.block\n");
        let found = calls(&nodes);
        assert_eq!(
            found.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["name", "other", "block"]
        );
        assert_eq!(ctx.calls, found.iter().map(|c| c.id).collect::<Vec<_>>());
        assert!(!found[0].is_block);
        assert!(found[2].is_block);
    }

    #[test]
    fn nested_call_arguments_become_expressions() {
        let (nodes, _) = parse_extended(".sum {.multiply {2} by:{3}} {Total: .pi}\n");
        let call = calls(&nodes)[0];
        match &call.arguments[0].value {
            Expression::Call(inner) => {
                assert_eq!(inner.name, "multiply");
                assert_eq!(inner.arguments.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &call.arguments[1].value {
            Expression::Composed(parts) => {
                assert_eq!(parts[0], dynamic("Total: "));
                assert!(matches!(&parts[1], Expression::Call(c) if c.name == "pi"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unbalanced_braces_are_syntax_errors() {
        let mut ctx = RecordingContext::new(Flavor::Extended);
        let err = parse_blocks("Text .call {unclosed\n", &mut ctx).unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    macro_rules! call_span_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            paste::item! {
            #[test]
            fn [<call_span_in_ $name>]() {
                let (source, expected): (&str, &str) = $value;
                let (nodes, _) = parse_extended(source);
                let span = calls(&nodes)[0].span.clone();
                assert_eq!(&source[span.range], expected);
            }
            }
        )*
        }
    }

    call_span_tests! {
        heading: ("Intro.\n\n# Title .docname\n", ".docname"),
        setext_heading: ("Intro.\n\nTitle .docname\n===\n", ".docname"),
        paragraph_continuation: ("Intro\n   indented .docname\n", ".docname"),
        list_item: ("Intro.\n\n- first\n- second .sum {1} {2}\n", ".sum {1} {2}"),
        nested_list: ("- a\n  - b .docname\n", ".docname"),
        task: ("- [x] done .docname\n", ".docname"),
        quote: ("Intro.\n\n> Tip: first line\n> see .call {x} now\n", ".call {x}"),
        emphasis: ("Some *styled .docname* text\n", ".docname"),
        link_label: ("[see .docname](https://example.com)\n", ".docname"),
        table_cell: ("| a | b |\n|---|---|\n| x | .docname |\n", ".docname"),
        escaped_table_cell: ("| a | b |\n|---|---|\n| x \\| y | .docname |\n", ".docname"),
        footnote: ("Text[^1]\n\n[^1]: first\n    then .docname\n", ".docname"),
    }

    macro_rules! error_span_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            paste::item! {
            #[test]
            fn [<error_span_in_ $name>]() {
                let (source, expected): (&str, std::ops::Range<usize>) = $value;
                let mut ctx = RecordingContext::new(Flavor::Extended);
                match parse_blocks(source, &mut ctx).unwrap_err() {
                    ParseError::Syntax { span, .. } => {
                        assert_eq!(span, Span::from(expected));
                        assert!(source[span.range].starts_with('{'));
                    }
                    other => panic!("unexpected {:?}", other),
                }
            }
            }
        )*
        }
    }

    error_span_tests! {
        paragraph: ("Text .call {unclosed\n", 11..20),
        list_item: ("Intro paragraph here.\n\n- item .call {unclosed\n", 36..45),
        quote: ("> first\n> then .call {open\n", 21..26),
        heading: ("Intro.\n\n# Title .call {open\n", 22..27),
    }

    #[test]
    fn heading_call_keeps_its_document_position() {
        let (nodes, _) = parse_extended("Intro.\n\n# Title .docname\n");
        assert_eq!(calls(&nodes)[0].span, Span::new(16, 24));
    }

    #[test]
    fn block_quote_with_type_and_attribution() {
        let (nodes, _) = parse_extended("> Tip: be *kind*\n> - Someone\n");
        match &nodes[0] {
            Node::BlockQuote(quote) => {
                assert_eq!(quote.kind, Some(BlockQuoteKind::Tip));
                assert_eq!(quote.attribution, Some(vec![Node::text("Someone")]));
                assert_eq!(
                    quote.children,
                    vec![Node::Paragraph(vec![
                        Node::text("be "),
                        Node::Styled(vec![Node::text("kind")], Style::Emphasis)
                    ])]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn table_alignment_and_metadata() {
        let (nodes, _) = parse_extended(
            "| a | b | c | d |\n|:-:|:--|--:|---|\n| 1 | 2 |\n\"Caption\" {#tbl}\n",
        );
        match &nodes[0] {
            Node::Table(table) => {
                assert_eq!(
                    table.alignments,
                    vec![
                        TableAlignment::Center,
                        TableAlignment::Left,
                        TableAlignment::Right,
                        TableAlignment::None
                    ]
                );
                assert_eq!(table.rows.len(), 1);
                assert_eq!(table.rows[0].len(), 4);
                assert!(table.rows[0][3].text.is_empty());
                assert_eq!(table.caption.as_deref(), Some("Caption"));
                assert_eq!(table.custom_id.as_deref(), Some("tbl"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn escaped_pipes_stay_in_cells() {
        let (nodes, _) = parse_extended("a | b\n--|--\nx \\| y | z\n");
        match &nodes[0] {
            Node::Table(table) => {
                assert_eq!(table.rows[0][0].text, vec![Node::text("x | y")]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn fenced_code_info() {
        let (nodes, _) = parse_extended("```rust \"Example\" {#ex}\nlet x = 1;\n```\n");
        match &nodes[0] {
            Node::Code(code) => {
                assert_eq!(code.language.as_deref(), Some("rust"));
                assert_eq!(code.caption.as_deref(), Some("Example"));
                assert_eq!(code.custom_id.as_deref(), Some("ex"));
                assert_eq!(code.content, "let x = 1;");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn inline_markup() {
        let mut ctx = RecordingContext::new(Flavor::Extended);
        let nodes = parse_inline(
            "a ` b ` [l](https://x.y \"t\") ![i](img.png) (c) x~~y~~ \\* &amp;",
            &mut ctx,
        )
        .unwrap();
        assert_eq!(nodes[0], Node::text("a "));
        assert_eq!(nodes[1], Node::CodeSpan("b".into()));
        assert!(matches!(&nodes[3], Node::Link(l) if l.url == "https://x.y" && l.title.as_deref() == Some("t")));
        assert!(matches!(&nodes[5], Node::Image(i) if i.link.url == "img.png"));
        assert_eq!(nodes[7], Node::TextSymbol('©'));
        assert_eq!(nodes[9], Node::Styled(vec![Node::text("y")], Style::Strikethrough));
        assert_eq!(nodes[10], Node::text(" * "));
        assert_eq!(nodes[11], Node::CriticalContent("&".into()));
    }

    #[test]
    fn base_flavor_keeps_calls_as_text() {
        let mut ctx = RecordingContext::new(Flavor::Base);
        let nodes = parse_blocks(".center {x}\n", &mut ctx).unwrap();
        assert_eq!(nodes, vec![Node::Paragraph(vec![Node::text(".center {x}")])]);
        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn link_definitions_are_registered() {
        let (_, ctx) = parse_extended("[Home]: https://example.com\n");
        assert_eq!(ctx.link_definitions.len(), 1);
        assert_eq!(ctx.link_definitions[0].label, "home");
    }

    #[test]
    fn document_fixture() {
        let source = include_str!("../../resources/tests/document.md");
        let mut ctx = RecordingContext::new(Flavor::Extended);
        let ast = parse(source, &mut ctx).unwrap();
        let found = calls(&ast.nodes);
        assert_eq!(
            found.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["docname", "center", "sum", "foreach", "tableofcontents"]
        );
        assert!(ast.to_json().unwrap().contains("\"FunctionCall\""));
    }
}
