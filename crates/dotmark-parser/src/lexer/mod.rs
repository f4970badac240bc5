//! Regex-driven tokenizer. A [Lexer] walks its source from left to right and, at every offset,
//! tries an ordered list of [TokenPattern]s. The first pattern producing a non-empty match wins.
//! Some constructs (function calls, lists, code spans) can't be delimited by a regular
//! expression alone: their pattern only flags the start and hands the extent over to a walker.
pub mod patterns;
pub(crate) mod scanners;

use crate::common::{SourceMap, Span};
use crate::walker::{WalkError, WalkedCall};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Block
    Newline,
    BlockCode,
    FencedCode,
    MultilineMath,
    OnelineMath,
    HorizontalRule,
    Heading,
    SetextHeading,
    LinkDefinition,
    FootnoteDefinition,
    BlockQuote,
    UnorderedList,
    OrderedList,
    ListItem,
    PageBreak,
    Table,
    Html,
    BlockFunctionCall,
    Paragraph,

    // Inline
    Escape,
    Entity,
    Comment,
    LineBreak,
    CodeSpan,
    InlineMath,
    Image,
    ReferenceImage,
    Link,
    ReferenceFootnote,
    ReferenceLink,
    DiamondAutolink,
    UrlAutolink,
    InlineFunctionCall,
    StrongEmphasis,
    Strong,
    Emphasis,
    Strikethrough,
    TextSymbol,
    CriticalContent,
    PlainText,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// What a walker decided about the construct flagged by its pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Walked {
    /// The walker only measured the construct.
    Extent,
    FunctionCall(WalkedCall),
}

/// Outcome of a walker: the walked value and the number of bytes it consumed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalkedResult {
    pub value: Walked,
    pub end: usize,
}

/// A walker receives the input from the current offset and the captures of its flag pattern.
/// `Ok(None)` means the construct isn't there after all and the lexer moves on to the next
/// pattern.
pub type Walker = fn(&str, &regex::Captures) -> Result<Option<WalkedResult>, WalkError>;

/// Guard over the whole source and the current offset, for context a regex can't look back at.
pub type Guard = fn(&str, usize) -> bool;

pub struct TokenPattern {
    pub name: &'static str,
    pub kind: TokenKind,
    pub regex: Regex,
    pub walker: Option<Walker>,
    pub guard: Option<Guard>,
}

impl TokenPattern {
    /// `regex` is anchored to the current offset.
    pub fn new(name: &'static str, kind: TokenKind, regex: &str) -> Self {
        TokenPattern {
            name,
            kind,
            regex: anchored(regex),
            walker: None,
            guard: None,
        }
    }

    pub fn flag(name: &'static str, kind: TokenKind, regex: &str, walker: Walker) -> Self {
        TokenPattern {
            walker: Some(walker),
            ..TokenPattern::new(name, kind, regex)
        }
    }

    pub fn guarded(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }
}

fn anchored(regex: &str) -> Regex {
    Regex::new(&format!(r"\A(?:{})", regex)).expect("invalid regex expression")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    /// Capture groups in order. Non-participating groups are empty strings.
    pub groups: Vec<String>,
    pub named_groups: HashMap<String, String>,
    /// Where each participating named group starts within `text`.
    pub named_starts: HashMap<String, usize>,
    pub walker_result: Option<WalkedResult>,
}

impl Token {
    pub fn group(&self, idx: usize) -> &str {
        self.groups.get(idx).map(String::as_str).unwrap_or_default()
    }

    pub fn named(&self, name: &str) -> Option<&str> {
        self.named_groups
            .get(name)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn named_start(&self, name: &str) -> Option<usize> {
        self.named_starts.get(name).copied()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexError {
    #[error("no token pattern matches at offset {offset}: '{snippet}'")]
    NoMatch { offset: usize, snippet: String },
    #[error(transparent)]
    Walk(#[from] WalkError),
}

pub struct Lexer<'a> {
    source: &'a str,
    patterns: &'a [TokenPattern],
    map: SourceMap,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, patterns: &'a [TokenPattern]) -> Self {
        Lexer {
            source,
            patterns,
            map: SourceMap::default(),
        }
    }

    /// Reports spans relative to an enclosing source `offset` bytes in.
    pub fn with_offset(self, offset: usize) -> Self {
        self.with_source_map(SourceMap::offset(offset))
    }

    /// Reports spans and error offsets in the coordinates of the source `map` points into.
    pub fn with_source_map(mut self, map: SourceMap) -> Self {
        self.map = map;
        self
    }

    pub fn tokenize(&self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        let mut pos = 0;
        while pos < self.source.len() {
            let token = self.next_token(pos)?;
            pos += token.text.len();
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&self, pos: usize) -> Result<Token, LexError> {
        let rest = &self.source[pos..];

        for pattern in self.patterns {
            if let Some(guard) = pattern.guard {
                if !guard(self.source, pos) {
                    continue;
                }
            }

            let Some(caps) = pattern.regex.captures(rest) else {
                continue;
            };

            let (len, walker_result) = match pattern.walker {
                None => (caps.get(0).map(|m| m.end()).unwrap_or_default(), None),
                Some(walker) => match walker(rest, &caps)
                    .map_err(|e| e.map_positions(|at| self.map.map(pos + at)))?
                {
                    Some(result) => (result.end, Some(result)),
                    None => continue,
                },
            };
            if len == 0 {
                continue;
            }

            let groups = caps
                .iter()
                .skip(1)
                .map(|g| g.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect();
            let named_groups = pattern
                .regex
                .capture_names()
                .flatten()
                .map(|name| {
                    let value = caps.name(name).map(|m| m.as_str()).unwrap_or_default();
                    (name.to_string(), value.to_string())
                })
                .collect();
            let named_starts = pattern
                .regex
                .capture_names()
                .flatten()
                .filter_map(|name| caps.name(name).map(|m| (name.to_string(), m.start())))
                .collect();

            return Ok(Token {
                kind: pattern.kind,
                text: rest[..len].to_string(),
                span: self.map.map_range(pos, pos + len),
                groups,
                named_groups,
                named_starts,
                walker_result,
            });
        }

        let snippet = rest.chars().take(16).collect();
        Err(LexError::NoMatch {
            offset: self.map.map(pos),
            snippet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::patterns::*;
    use super::*;
    use crate::Flavor;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn covers_input_without_gaps() {
        let source = "# Title\n\nSome *text* here.\n\n- a\n- b\n";
        let tokens = Lexer::new(source, block_patterns(Flavor::Extended))
            .tokenize()
            .unwrap();
        let mut expected_start = 0;
        for token in &tokens {
            assert_eq!(token.span.start(), expected_start);
            expected_start = token.span.end();
        }
        assert_eq!(expected_start, source.len());
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Heading,
                TokenKind::Newline,
                TokenKind::Paragraph,
                TokenKind::Newline,
                TokenKind::UnorderedList
            ]
        );
    }

    #[test]
    fn unmatched_input_is_a_lexical_error() {
        let patterns = [TokenPattern::new("digits", TokenKind::PlainText, r"[0-9]+")];
        let err = Lexer::new("12ab", &patterns).tokenize().unwrap_err();
        assert_eq!(
            err,
            LexError::NoMatch {
                offset: 2,
                snippet: "ab".to_string()
            }
        );
    }

    #[test]
    fn offsets_shift_spans() {
        let patterns = [TokenPattern::new("any", TokenKind::PlainText, r"(?s:.)+")];
        let tokens = Lexer::new("abc", &patterns)
            .with_offset(10)
            .tokenize()
            .unwrap();
        assert_eq!(tokens[0].span, Span::new(10, 13));
    }

    #[test]
    fn source_maps_place_spans_and_errors() {
        use crate::common::MappedText;

        let patterns = [
            TokenPattern::new("word", TokenKind::PlainText, r"[a-z]+\n?"),
            TokenPattern::flag("call", TokenKind::InlineFunctionCall, r"\.", |input, _| {
                crate::walker::inline_call(input)
            }),
        ];
        // Two lines whose `> ` prefixes were stripped.
        let mut mapped = MappedText::default();
        mapped.push("ab\n", &SourceMap::offset(2));
        mapped.push(".x {y", &SourceMap::offset(7));

        let lexer = Lexer::new(&mapped.text, &patterns).with_source_map(mapped.map.clone());
        let err = lexer.tokenize().unwrap_err();
        assert_eq!(err.to_string(), "unbalanced braces in an argument of 'x' at offset 10");
        match err {
            LexError::Walk(e) => assert_eq!(e.range(), 10..12),
            other => panic!("unexpected {:?}", other),
        }

        let tokens = Lexer::new("ab\ncd", &patterns)
            .with_source_map(mapped.map)
            .tokenize()
            .unwrap();
        assert_eq!(tokens[0].span, Span::new(2, 5));
        assert_eq!(tokens[1].span, Span::new(7, 9));
    }

    #[test]
    fn first_matching_pattern_wins() {
        let patterns = [
            TokenPattern::new("a", TokenKind::Strong, r"ab"),
            TokenPattern::new("b", TokenKind::Emphasis, r"abc"),
            TokenPattern::new("rest", TokenKind::PlainText, r"(?s:.)"),
        ];
        let tokens = Lexer::new("abc", &patterns).tokenize().unwrap();
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Strong, TokenKind::PlainText]
        );
    }

    #[test]
    fn inline_calls_need_a_separator_before_the_dot() {
        let tokens = Lexer::new("e.g .call", inline_patterns(Flavor::Extended))
            .tokenize()
            .unwrap();
        assert!(tokens
            .iter()
            .filter(|t| t.kind == TokenKind::InlineFunctionCall)
            .all(|t| t.text == ".call"));
        assert_eq!(
            tokens
                .iter()
                .filter(|t| t.kind == TokenKind::InlineFunctionCall)
                .count(),
            1
        );
    }
}
