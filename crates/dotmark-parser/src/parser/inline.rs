use super::{merge_text, ParseContext, ParseError, Parser};
use crate::ast::{normalize_label, Image, Link, Node, ReferenceImage, ReferenceLink, Style};
use crate::common::trim_delimiters;
use crate::lexer::patterns::link_label_patterns;
use crate::lexer::{Token, TokenKind};

impl<'c, C: ParseContext + ?Sized> Parser<'c, C> {
    /// Link labels can hold any inline content except other links.
    fn label(&mut self, token: &Token, group: &str) -> Result<Vec<Node>, ParseError> {
        let text = token.named(group).unwrap_or_default();
        let map = self.region(token.named_start(group).unwrap_or_default());
        let nodes = self.parse_with(text, link_label_patterns(self.flavor()), map)?;
        Ok(merge_text(nodes))
    }

    pub(super) fn entity(&mut self, token: &Token) -> Node {
        match decode_entity(&token.text) {
            Some(c @ ('<' | '>' | '&')) => Node::CriticalContent(c.to_string()),
            Some(c) => Node::Text(c.to_string()),
            None => Node::Text(token.text.clone()),
        }
    }

    pub(super) fn code_span(&mut self, token: &Token) -> Node {
        let run = token.text.chars().take_while(|c| *c == '`').count();
        let inner = &token.text[run..token.text.len() - run];
        let content = inner.replace('\n', " ");
        let stripped = match content.strip_prefix(' ').and_then(|c| c.strip_suffix(' ')) {
            Some(stripped) if !content.trim().is_empty() => stripped.to_string(),
            _ => content.clone(),
        };
        Node::CodeSpan(stripped)
    }

    pub(super) fn image(&mut self, token: &Token) -> Result<Node, ParseError> {
        let size = |name| token.named(name).filter(|s| *s != "_").map(str::to_string);
        Ok(Node::Image(Image {
            link: Link {
                label: self.label(token, "imglabel")?,
                url: token.named("imgurl").unwrap_or_default().to_string(),
                title: token
                    .named("imgtitle")
                    .map(|t| trim_delimiters(t).to_string()),
            },
            width: size("imgwidth"),
            height: size("imgheight"),
        }))
    }

    pub(super) fn reference_image(&mut self, token: &Token) -> Result<Node, ParseError> {
        let label = token.named("imglabel").unwrap_or_default();
        Ok(Node::ReferenceImage(ReferenceImage {
            label: self.label(token, "imglabel")?,
            reference: normalize_label(token.named("imgref").unwrap_or(label)),
            fallback: token.text.clone(),
        }))
    }

    pub(super) fn link(&mut self, token: &Token) -> Result<Node, ParseError> {
        Ok(Node::Link(Link {
            label: self.label(token, "linklabel")?,
            url: token.named("linkurl").unwrap_or_default().to_string(),
            title: token
                .named("linktitle")
                .map(|t| trim_delimiters(t).to_string()),
        }))
    }

    pub(super) fn reference_link(&mut self, token: &Token) -> Result<Node, ParseError> {
        let label = token.named("reflabel").unwrap_or_default();
        Ok(Node::ReferenceLink(ReferenceLink {
            label: self.label(token, "reflabel")?,
            // `[label][]` and `[label]` both refer to their own label.
            reference: normalize_label(token.named("refref").unwrap_or(label)),
            fallback: token.text.clone(),
        }))
    }

    pub(super) fn autolink(&mut self, token: &Token) -> Node {
        let text = token
            .named("autourl")
            .or_else(|| token.named("url"))
            .unwrap_or_default();
        let url = if text.contains('@') && !text.contains(':') {
            format!("mailto:{}", text)
        } else {
            text.to_string()
        };
        Node::Link(Link {
            label: vec![Node::text(text)],
            url,
            title: None,
        })
    }

    pub(super) fn styled(&mut self, token: &Token) -> Result<Node, ParseError> {
        let style = match token.kind {
            TokenKind::StrongEmphasis => Style::StrongEmphasis,
            TokenKind::Strong => Style::Strong,
            TokenKind::Strikethrough => Style::Strikethrough,
            _ => Style::Emphasis,
        };
        let inner = token.group(0);
        let text = self.mapped(inner, token.text.find(inner).unwrap_or_default());
        Ok(Node::Styled(self.parse_inline_mapped(text)?, style))
    }

    pub(super) fn text_symbol(&mut self, token: &Token) -> Node {
        match text_symbol(&token.text) {
            Some(symbol) => Node::TextSymbol(symbol),
            None => Node::Text(token.text.clone()),
        }
    }
}

fn text_symbol(text: &str) -> Option<char> {
    Some(match text.to_lowercase().as_str() {
        "(c)" => '©',
        "(r)" => '®',
        "(tm)" => '™',
        "..." => '…',
        "->" => '→',
        "<-" => '←',
        "=>" => '⇒',
        "<=" => '≤',
        ">=" => '≥',
        "!=" => '≠',
        "+-" => '±',
        "--" => '–',
        "---" => '—',
        _ => return None,
    })
}

/// Decodes a named or numeric character reference. Unknown names decode to `None`.
fn decode_entity(entity: &str) -> Option<char> {
    let name = entity.strip_prefix('&')?.strip_suffix(';')?;
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code).filter(|c| *c != '\0');
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "reg" => '®',
        "trade" => '™',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "laquo" => '«',
        "raquo" => '»',
        "euro" => '€',
        "deg" => '°',
        "times" => '×',
        "divide" => '÷',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_inline, RecordingContext};
    use crate::Flavor;

    fn inline(source: &str) -> Vec<Node> {
        let mut ctx = RecordingContext::new(Flavor::Extended);
        parse_inline(source, &mut ctx).unwrap()
    }

    macro_rules! symbol_tests {
        ($($name:ident: $value:expr,)*) => {
        $(
            paste::item! {
            #[test]
            fn [<symbol_ $name>]() {
                let (input, expected): (&str, char) = $value;
                assert_eq!(inline(input), vec![Node::TextSymbol(expected)]);
            }
            }
        )*
        }
    }

    symbol_tests! {
        copyright: ("(c)", '©'),
        trademark: ("(TM)", '™'),
        ellipsis: ("...", '…'),
        arrow: ("->", '→'),
        em_dash: ("---", '—'),
        en_dash: ("--", '–'),
        not_equal: ("!=", '≠'),
    }

    #[test]
    fn entities() {
        assert_eq!(decode_entity("&#65;"), Some('A'));
        assert_eq!(decode_entity("&#x41;"), Some('A'));
        assert_eq!(decode_entity("&copy;"), Some('©'));
        assert_eq!(decode_entity("&unknown;"), None);
        assert_eq!(inline("&unknown;"), vec![Node::text("&unknown;")]);
        assert_eq!(inline("&lt;"), vec![Node::CriticalContent("<".into())]);
    }

    #[test]
    fn code_span_spacing() {
        assert_eq!(inline("`` a`b ``"), vec![Node::CodeSpan("a`b".into())]);
        assert_eq!(inline("`  `"), vec![Node::CodeSpan("  ".into())]);
        assert_eq!(inline("`a\nb`"), vec![Node::CodeSpan("a b".into())]);
    }

    #[test]
    fn sized_images() {
        match &inline("!(150x_)[Logo](logo.png \"Our logo\")")[0] {
            Node::Image(image) => {
                assert_eq!(image.width.as_deref(), Some("150"));
                assert_eq!(image.height, None);
                assert_eq!(image.link.title.as_deref(), Some("Our logo"));
                assert_eq!(image.link.label, vec![Node::text("Logo")]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn reference_links() {
        let nodes = inline("[Read *this*][Home] and [home]");
        match &nodes[0] {
            Node::ReferenceLink(link) => {
                assert_eq!(link.reference, "home");
                assert_eq!(link.fallback, "[Read *this*][Home]");
                assert_eq!(
                    link.label[1],
                    Node::Styled(vec![Node::text("this")], Style::Emphasis)
                );
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(&nodes[2], Node::ReferenceLink(l) if l.reference == "home"));
    }

    #[test]
    fn autolinks() {
        let nodes = inline("<me@example.com> https://example.com/a.");
        assert!(matches!(&nodes[0], Node::Link(l) if l.url == "mailto:me@example.com"));
        assert!(matches!(&nodes[2], Node::Link(l) if l.url == "https://example.com/a"));
        assert_eq!(nodes[3], Node::text("."));
    }

    #[test]
    fn nested_styles() {
        assert_eq!(
            inline("**bold *and italic***"),
            vec![Node::Styled(
                vec![
                    Node::text("bold "),
                    Node::Styled(vec![Node::text("and italic")], Style::Emphasis)
                ],
                Style::Strong
            )]
        );
    }

    #[test]
    fn link_labels_cannot_nest_links() {
        match &inline("[a [b](c)](d)")[0] {
            Node::Link(_) | Node::ReferenceLink(_) | Node::Text(_) => {}
            other => panic!("unexpected {:?}", other),
        }
    }
}
