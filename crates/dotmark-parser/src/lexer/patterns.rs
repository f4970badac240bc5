//! Ordered token pattern sets, one per source region and flavor.
use super::scanners;
use super::{TokenKind, TokenPattern};
use crate::walker::{walk_block_call, walk_inline_call};
use crate::Flavor;
use lazy_static::lazy_static;

const NEWLINE: &str = r"(?:[ \t]*\n)+|[ \t]+\z";
const BACKTICK_FENCE: &str = r"(?m) {0,3}`{3,}(?P<fenceinfo>[^`\n]*)\n(?P<code>(?s:.*?))(?:^ {0,3}`{3,}[ \t]*$\n?|\z)";
const TILDE_FENCE: &str = r"(?m) {0,3}~{3,}(?P<fenceinfo>[^\n]*)\n(?P<code>(?s:.*?))(?:^ {0,3}~{3,}[ \t]*$\n?|\z)";
const MULTILINE_MATH: &str = r"(?m) {0,3}\$\$\$[ \t]*\n(?P<math>(?s:.*?))(?:^ {0,3}\$\$\$[ \t]*(?:\{#(?P<mathid>[^}\n]+)\})?[ \t]*$\n?|\z)";
const ONELINE_MATH: &str = r" {0,3}\$[ \t]+(?P<math>[^\n]+?)[ \t]+\$[ \t]*(?:\{#(?P<mathid>[^}\n]+)\})?[ \t]*(?:\n|\z)";
const BLOCK_CODE: &str = r"(?:(?: {4}|\t)[^\n]*(?:\n|\z))+";
const HORIZONTAL_RULE: &str =
    r" {0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})(?:\n|\z)";
const HEADING: &str =
    r" {0,3}(?P<hashes>#{1,6})(?:[ \t]+(?P<text>[^\n]*?))?(?:[ \t]+#+)?[ \t]*(?:\n|\z)";
const DECORATIVE_HEADING: &str = r" {0,3}(?P<hashes>#{1,6})(?P<decorative>!?)(?:[ \t]+(?P<text>[^\n]*?))?(?:[ \t]+#+)?[ \t]*(?:\n|\z)";
const SETEXT_HEADING: &str =
    r" {0,3}(?P<text>[^\n]*\S[^\n]*?)[ \t]*\n {0,3}(?P<underline>=+|-+)[ \t]*(?:\n|\z)";
const LINK_DEFINITION: &str = r#" {0,3}\[(?P<linklabel>[^\]\n^][^\]\n]*)\]:[ \t]*<?(?P<linkurl>[^\s>]+)>?(?:[ \t]+(?P<linktitle>"[^"\n]*"|'[^'\n]*'|\([^)\n]*\)))?[ \t]*(?:\n|\z)"#;
const FOOTNOTE_DEFINITION: &str = r" {0,3}\[\^(?P<footlabel>[^\]\n]+)\]:[ \t]*(?P<foottext>[^\n]*(?:\n(?: {2,}|\t)[^\n]*)*)(?:\n|\z)";
const BLOCK_QUOTE: &str = r"(?: {0,3}>[^\n]*(?:\n|\z))+";
const UNORDERED_LIST: &str = r" {0,3}[*+-](?:[ \t]|\n|\z)";
const ORDERED_LIST: &str = r" {0,3}\d{1,9}[.)](?:[ \t]|\n|\z)";
const LIST_ITEM: &str = r"( {0,3}(?:[*+-]|\d{1,9}[.)]))(?:[ \t]|\n|\z)";
const PAGE_BREAK: &str = r" {0,3}<<<[ \t]*(?:\n|\z)";
const TABLE: &str = r" {0,3}(?P<header>[^\n]*\|[^\n]*)\n {0,3}(?P<delimiter>\|?[ \t]*:?-+:?[ \t]*(?:\|[ \t]*:?-+:?[ \t]*)*\|?)[ \t]*(?:\n|\z)(?P<rows>(?:[^\n]*\|[^\n]*(?:\n|\z))*)";
const TABLE_WITH_METADATA: &str = r#" {0,3}(?P<header>[^\n]*\|[^\n]*)\n {0,3}(?P<delimiter>\|?[ \t]*:?-+:?[ \t]*(?:\|[ \t]*:?-+:?[ \t]*)*\|?)[ \t]*(?:\n|\z)(?P<rows>(?:[^\n]*\|[^\n]*(?:\n|\z))*)(?P<metadata>[ \t]*(?:(?:"[^"\n]*"|'[^'\n]*'|\([^)\n]*\))(?:[ \t]+\{#[^}\n]+\})?|\{#[^}\n]+\})[ \t]*(?:\n|\z))?"#;
const HTML: &str =
    r" {0,3}<(?:!--|/?[A-Za-z][A-Za-z0-9-]*)[^\n]*(?:\n[^\n]*\S[^\n]*)*(?:\n|\z)";
const BLOCK_FUNCTION_CALL: &str = r" {0,3}\.[A-Za-z0-9_]";
const PARAGRAPH: &str = r"[^\n]*\S";

const ESCAPE: &str = r"\\(?P<escaped>[!-/:-@\[-`{-~])";
const ENTITY: &str = r"&(?:#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[A-Za-z][A-Za-z0-9]{1,31});";
const COMMENT: &str = r"<!--(?s:.*?)-->";
const LINE_BREAK: &str = r"(?: {2,}|\\)\n";
const CODE_SPAN: &str = r"`+";
const INLINE_MATH: &str = r"\$[ \t](?P<math>[^$\n]+?)[ \t]\$";
const IMAGE: &str = r#"!\[(?P<imglabel>[^\]\n]*)\]\([ \t]*<?(?P<imgurl>[^\s)>]*)>?(?:[ \t]+(?P<imgtitle>"[^"\n]*"|'[^'\n]*'|\([^)\n]*\)))?[ \t]*\)"#;
const SIZED_IMAGE: &str = r#"!(?:\((?P<imgwidth>[0-9.]+[a-z%]*|_)(?:x(?P<imgheight>[0-9.]+[a-z%]*|_))?\))?\[(?P<imglabel>[^\]\n]*)\]\([ \t]*<?(?P<imgurl>[^\s)>]*)>?(?:[ \t]+(?P<imgtitle>"[^"\n]*"|'[^'\n]*'|\([^)\n]*\)))?[ \t]*\)"#;
const REFERENCE_IMAGE: &str = r"!\[(?P<imglabel>[^\]\n]*)\]\[(?P<imgref>[^\]\n]*)\]";
const LINK: &str = r#"\[(?P<linklabel>(?:[^\]\n\\]|\\.)*)\]\([ \t]*<?(?P<linkurl>[^\s)>]*)>?(?:[ \t]+(?P<linktitle>"[^"\n]*"|'[^'\n]*'|\([^)\n]*\)))?[ \t]*\)"#;
const REFERENCE_FOOTNOTE: &str = r"\[\^(?P<footref>[^\]\n]+)\]";
const REFERENCE_LINK: &str = r"\[(?P<reflabel>[^\]\n]+)\](?:\[(?P<refref>[^\]\n]*)\])?";
const DIAMOND_AUTOLINK: &str =
    r"<(?P<autourl>[A-Za-z][A-Za-z0-9+.-]{1,31}:[^\s<>]*|[^\s<>@]+@[^\s<>@]+\.[A-Za-z]+)>";
const URL_AUTOLINK: &str = r#"(?P<url>https?://[^\s<]*[^\s<.,:;"')\]*_~])"#;
const INLINE_FUNCTION_CALL: &str = r"\.[A-Za-z0-9_]";
const STRONG_EMPHASIS_ASTERISK: &str = r"\*\*\*([^*\s]|[^*\s][^*]*?[^*\s])\*\*\*";
const STRONG_EMPHASIS_UNDERSCORE: &str = r"___([^_\s]|[^_\s][^_]*?[^_\s])___\b";
const STRONG_ASTERISK: &str =
    r"\*\*([^*\s]|[^*\s](?:[^*]|\*[^*\n]+\*)*?(?:[^*\s]|\*[^*\n]+\*))\*\*";
const STRONG_UNDERSCORE: &str = r"__([^_\s]|[^_\s](?:[^_]|_[^_\n]+_)*?(?:[^_\s]|_[^_\n]+_))__\b";
const EMPHASIS_ASTERISK: &str =
    r"\*([^*\s]|[^*\s](?:[^*]|\*\*[^*\n]+\*\*)*?(?:[^*\s]|\*\*[^*\n]+\*\*))\*";
const EMPHASIS_UNDERSCORE: &str =
    r"_([^_\s]|[^_\s](?:[^_]|__[^_\n]+__)*?(?:[^_\s]|__[^_\n]+__))_\b";
const STRIKETHROUGH: &str = r"~~([^~\s]|[^~\s][^~]*?[^~\s])~~";
const TEXT_SYMBOL: &str = r"\([cC]\)|\([rR]\)|\((?:tm|TM)\)|\.\.\.|->|<-|=>|<=|>=|!=|\+-|---|--";
const CRITICAL_CONTENT: &str = r"[<>&]";
const PLAIN_TEXT: &str = r"\s+|(?s:.)[^\s\\`*_~\[\]!<>&$.(\-=+]*";
const EXPRESSION_TEXT: &str = r"(?s:.)[^.]*";

/// Whether the character before `pos` allows an inline construct to open there.
fn call_boundary(source: &str, pos: usize) -> bool {
    match source[..pos].chars().next_back() {
        None => true,
        Some(c) if c.is_whitespace() => true,
        Some(c) => !(c.is_alphanumeric() || c == '.' || c == '\\'),
    }
}

fn word_boundary(source: &str, pos: usize) -> bool {
    !source[..pos]
        .chars()
        .next_back()
        .map(char::is_alphanumeric)
        .unwrap_or(false)
}

fn block(flavor: Flavor) -> Vec<TokenPattern> {
    use TokenKind::*;
    let extended = flavor == Flavor::Extended;

    let mut patterns = vec![
        TokenPattern::new("newline", Newline, NEWLINE),
        TokenPattern::new("backtick fence", FencedCode, BACKTICK_FENCE),
        TokenPattern::new("tilde fence", FencedCode, TILDE_FENCE),
    ];
    if extended {
        patterns.push(TokenPattern::new(
            "multiline math",
            MultilineMath,
            MULTILINE_MATH,
        ));
    }
    patterns.extend([
        TokenPattern::new("block code", BlockCode, BLOCK_CODE),
        TokenPattern::new("horizontal rule", HorizontalRule, HORIZONTAL_RULE),
        TokenPattern::new(
            "heading",
            Heading,
            if extended { DECORATIVE_HEADING } else { HEADING },
        ),
        TokenPattern::new("footnote definition", FootnoteDefinition, FOOTNOTE_DEFINITION),
        TokenPattern::new("link definition", LinkDefinition, LINK_DEFINITION),
        TokenPattern::new("block quote", BlockQuote, BLOCK_QUOTE),
        TokenPattern::flag(
            "unordered list",
            UnorderedList,
            UNORDERED_LIST,
            scanners::unordered_list,
        ),
        TokenPattern::flag(
            "ordered list",
            OrderedList,
            ORDERED_LIST,
            scanners::ordered_list,
        ),
    ]);
    if extended {
        patterns.extend([
            TokenPattern::new("page break", PageBreak, PAGE_BREAK),
            TokenPattern::new("oneline math", OnelineMath, ONELINE_MATH),
        ]);
    }
    patterns.extend([
        TokenPattern::new(
            "table",
            Table,
            if extended { TABLE_WITH_METADATA } else { TABLE },
        ),
        TokenPattern::new("setext heading", SetextHeading, SETEXT_HEADING),
        TokenPattern::new("html", Html, HTML),
    ]);
    if extended {
        patterns.push(TokenPattern::flag(
            "block function call",
            BlockFunctionCall,
            BLOCK_FUNCTION_CALL,
            walk_block_call,
        ));
    }
    patterns.push(TokenPattern::flag(
        "paragraph",
        Paragraph,
        PARAGRAPH,
        if extended {
            scanners::extended_paragraph
        } else {
            scanners::paragraph
        },
    ));
    patterns
}

fn inline(flavor: Flavor, links: bool) -> Vec<TokenPattern> {
    use TokenKind::*;
    let extended = flavor == Flavor::Extended;

    let mut patterns = vec![
        TokenPattern::new("escape", Escape, ESCAPE),
        TokenPattern::new("comment", Comment, COMMENT),
        TokenPattern::new("line break", LineBreak, LINE_BREAK),
        TokenPattern::flag("code span", CodeSpan, CODE_SPAN, scanners::code_span),
    ];
    if extended {
        patterns.push(TokenPattern::new("inline math", InlineMath, INLINE_MATH));
    }
    patterns.extend([
        TokenPattern::new("image", Image, if extended { SIZED_IMAGE } else { IMAGE }),
        TokenPattern::new("reference image", ReferenceImage, REFERENCE_IMAGE),
    ]);
    if links {
        patterns.extend([
            TokenPattern::new("link", Link, LINK),
            TokenPattern::new("reference footnote", ReferenceFootnote, REFERENCE_FOOTNOTE),
            TokenPattern::new("reference link", ReferenceLink, REFERENCE_LINK),
            TokenPattern::new("diamond autolink", DiamondAutolink, DIAMOND_AUTOLINK),
            TokenPattern::new("url autolink", UrlAutolink, URL_AUTOLINK).guarded(word_boundary),
        ]);
    }
    patterns.push(TokenPattern::new("entity", Entity, ENTITY));
    if extended {
        patterns.push(
            TokenPattern::flag(
                "inline function call",
                InlineFunctionCall,
                INLINE_FUNCTION_CALL,
                walk_inline_call,
            )
            .guarded(call_boundary),
        );
    }
    patterns.extend([
        TokenPattern::new("strong emphasis", StrongEmphasis, STRONG_EMPHASIS_ASTERISK),
        TokenPattern::new("strong emphasis", StrongEmphasis, STRONG_EMPHASIS_UNDERSCORE)
            .guarded(word_boundary),
        TokenPattern::new("strong", Strong, STRONG_ASTERISK),
        TokenPattern::new("strong", Strong, STRONG_UNDERSCORE).guarded(word_boundary),
        TokenPattern::new("emphasis", Emphasis, EMPHASIS_ASTERISK),
        TokenPattern::new("emphasis", Emphasis, EMPHASIS_UNDERSCORE).guarded(word_boundary),
        TokenPattern::new("strikethrough", Strikethrough, STRIKETHROUGH),
    ]);
    if extended {
        patterns.push(TokenPattern::new("text symbol", TextSymbol, TEXT_SYMBOL));
    }
    patterns.extend([
        TokenPattern::new("critical content", CriticalContent, CRITICAL_CONTENT),
        TokenPattern::new("text", PlainText, PLAIN_TEXT),
    ]);
    patterns
}

fn list_body() -> Vec<TokenPattern> {
    vec![
        TokenPattern::new("newline", TokenKind::Newline, NEWLINE),
        TokenPattern::flag(
            "list item",
            TokenKind::ListItem,
            LIST_ITEM,
            scanners::list_item,
        ),
    ]
}

fn expression() -> Vec<TokenPattern> {
    vec![
        TokenPattern::flag(
            "function call",
            TokenKind::InlineFunctionCall,
            INLINE_FUNCTION_CALL,
            walk_inline_call,
        )
        .guarded(call_boundary),
        TokenPattern::new("text", TokenKind::PlainText, EXPRESSION_TEXT),
    ]
}

lazy_static! {
    static ref BASE_BLOCK: Vec<TokenPattern> = block(Flavor::Base);
    static ref EXTENDED_BLOCK: Vec<TokenPattern> = block(Flavor::Extended);
    static ref BASE_INLINE: Vec<TokenPattern> = inline(Flavor::Base, true);
    static ref EXTENDED_INLINE: Vec<TokenPattern> = inline(Flavor::Extended, true);
    static ref BASE_LINK_LABEL: Vec<TokenPattern> = inline(Flavor::Base, false);
    static ref EXTENDED_LINK_LABEL: Vec<TokenPattern> = inline(Flavor::Extended, false);
    static ref LIST_BODY: Vec<TokenPattern> = list_body();
    static ref EXPRESSION: Vec<TokenPattern> = expression();
}

pub fn block_patterns(flavor: Flavor) -> &'static [TokenPattern] {
    match flavor {
        Flavor::Base => &BASE_BLOCK,
        Flavor::Extended => &EXTENDED_BLOCK,
    }
}

pub fn inline_patterns(flavor: Flavor) -> &'static [TokenPattern] {
    match flavor {
        Flavor::Base => &BASE_INLINE,
        Flavor::Extended => &EXTENDED_INLINE,
    }
}

/// Inline patterns without links, so a link's label can't contain another link.
pub fn link_label_patterns(flavor: Flavor) -> &'static [TokenPattern] {
    match flavor {
        Flavor::Base => &BASE_LINK_LABEL,
        Flavor::Extended => &EXTENDED_LINK_LABEL,
    }
}

pub fn list_patterns() -> &'static [TokenPattern] {
    &LIST_BODY
}

/// Patterns splitting an argument value into function calls and plain text.
pub fn expression_patterns() -> &'static [TokenPattern] {
    &EXPRESSION
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{Lexer, Token};

    fn lex(source: &str, patterns: &[TokenPattern]) -> Vec<(TokenKind, String)> {
        Lexer::new(source, patterns)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t: Token| (t.kind, t.text))
            .collect()
    }

    macro_rules! block_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            paste::item! {
            #[test]
            fn [<block_ $name>]() {
                let (input, expected): (&str, Vec<TokenKind>) = $value;
                let kinds: Vec<TokenKind> = lex(input, block_patterns(Flavor::Extended))
                    .into_iter()
                    .map(|(k, _)| k)
                    .collect();
                assert_eq!(kinds, expected);
            }
            }
        )*
        }
    }

    block_tests! {
        heading: ("# Title\n", vec![TokenKind::Heading]),
        decorative_heading: ("#! Title", vec![TokenKind::Heading]),
        setext: ("Title\n=====\n", vec![TokenKind::SetextHeading]),
        fence: ("```rust\nfn main() {}\n```\n", vec![TokenKind::FencedCode]),
        unterminated_fence: ("```\ncode", vec![TokenKind::FencedCode]),
        tilde_fence: ("~~~\ncode\n~~~", vec![TokenKind::FencedCode]),
        block_code: ("    indented\n    code\n", vec![TokenKind::BlockCode]),
        rule: ("---\n", vec![TokenKind::HorizontalRule]),
        quote: ("> a\n> b\n", vec![TokenKind::BlockQuote]),
        bullet_list: ("- a\n- b\n", vec![TokenKind::UnorderedList]),
        ordered_list: ("1. a\n2. b\n", vec![TokenKind::OrderedList]),
        page_break: ("<<<\n", vec![TokenKind::PageBreak]),
        oneline_math: ("$ x^2 $\n", vec![TokenKind::OnelineMath]),
        multiline_math: ("$$$\nx\n$$$\n", vec![TokenKind::MultilineMath]),
        table: ("a | b\n--|--\n1 | 2\n", vec![TokenKind::Table]),
        link_definition: ("[label]: https://example.com \"Title\"\n", vec![TokenKind::LinkDefinition]),
        footnote_definition: ("[^1]: A note\n", vec![TokenKind::FootnoteDefinition]),
        html: ("<div>\n  text\n</div>\n", vec![TokenKind::Html]),
        block_call: (".center\n    body\n", vec![TokenKind::BlockFunctionCall]),
        call_followed_by_text: (".center {x} and more\n", vec![TokenKind::Paragraph]),
        paragraph_then_heading: ("a\nb\n# c", vec![TokenKind::Paragraph, TokenKind::Heading]),
        paragraph_then_call: ("a\n.call {x}\n", vec![TokenKind::Paragraph, TokenKind::BlockFunctionCall]),
    }

    #[test]
    fn base_flavor_has_no_function_calls() {
        let kinds: Vec<TokenKind> = lex(".center {x}\n", block_patterns(Flavor::Base))
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(kinds, vec![TokenKind::Paragraph]);
    }

    #[test]
    fn inline_tokens() {
        let tokens = lex(
            "a **b** `c` $ d $ .e {f}",
            inline_patterns(Flavor::Extended),
        );
        let kinds: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::PlainText,
                TokenKind::PlainText,
                TokenKind::Strong,
                TokenKind::PlainText,
                TokenKind::CodeSpan,
                TokenKind::PlainText,
                TokenKind::InlineMath,
                TokenKind::PlainText,
                TokenKind::InlineFunctionCall,
            ]
        );
        assert_eq!(tokens.last().unwrap().1, ".e {f}");
    }

    #[test]
    fn emphasis_may_contain_strong() {
        let tokens = lex("*a **b** c*", inline_patterns(Flavor::Extended));
        assert_eq!(tokens, vec![(TokenKind::Emphasis, "*a **b** c*".to_string())]);
    }

    #[test]
    fn intraword_underscores_stay_text() {
        let tokens = lex("snake_case_name", inline_patterns(Flavor::Extended));
        assert!(tokens.iter().all(|(k, _)| *k == TokenKind::PlainText));
    }

    #[test]
    fn expression_splits_calls_from_text() {
        let tokens = lex("Hello .name {x}!", expression_patterns());
        let kinds: Vec<TokenKind> = tokens.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::PlainText,
                TokenKind::InlineFunctionCall,
                TokenKind::PlainText
            ]
        );
    }
}
