pub mod call;
pub mod layout;
pub mod visitor;

pub use call::*;
pub use layout::*;

use serde::{Deserialize, Serialize};
use std::rc::{Rc, Weak};

/// A parsed document: its top-level nodes and the source they come from.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ast {
    pub nodes: Vec<Node>,
    pub source: String,
}

impl Ast {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    /// One or more blank lines.
    Newline,
    Paragraph(Vec<Node>),
    Heading(Heading),
    BlockQuote(BlockQuote),
    List(List),
    ListItem(ListItem),
    Code(Code),
    Math(Math),
    HorizontalRule,
    PageBreak,
    Table(Table),
    /// Raw html, passed through unchanged.
    Html(String),
    LinkDefinition(LinkDefinition),
    FootnoteDefinition(FootnoteDefinition),
    /// A call placeholder. Its children hold the call's output once it has been expanded.
    FunctionCall(FunctionCallNode),
    Aligned(Aligned),
    Stacked(Stacked),
    Boxed(BoxNode),
    TableOfContentsView(TableOfContentsView),

    Text(String),
    LineBreak,
    Styled(Vec<Node>, Style),
    CodeSpan(String),
    MathSpan(String),
    Link(Link),
    ReferenceLink(ReferenceLink),
    Image(Image),
    ReferenceImage(ReferenceImage),
    ReferenceFootnote(String),
    Comment,
    /// A character that needs escaping in most output formats.
    CriticalContent(String),
    TextSymbol(char),
    TextTransform(TextTransform),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text(value.into())
    }

    /// Child lists in traversal order. Arguments of function calls aren't children.
    pub fn child_lists(&self) -> Vec<&Vec<Node>> {
        match self {
            Node::Paragraph(children) | Node::Styled(children, _) => vec![children],
            Node::Heading(h) => vec![&h.text],
            Node::BlockQuote(q) => {
                let mut lists = vec![&q.children];
                lists.extend(q.attribution.as_ref());
                lists
            }
            Node::List(l) => vec![&l.children],
            Node::ListItem(i) => vec![&i.children],
            Node::Table(t) => t.cells().map(|c| &c.text).collect(),
            Node::LinkDefinition(d) => vec![&d.text],
            Node::FootnoteDefinition(f) => vec![&f.text],
            Node::FunctionCall(c) => vec![&c.children],
            Node::Aligned(a) => vec![&a.children],
            Node::Stacked(s) => vec![&s.children],
            Node::Boxed(b) => {
                let mut lists: Vec<&Vec<Node>> = b.title.iter().collect();
                lists.push(&b.children);
                lists
            }
            Node::TableOfContentsView(v) => v.title.iter().collect(),
            Node::Link(l) => vec![&l.label],
            Node::ReferenceLink(l) => vec![&l.label],
            Node::Image(i) => vec![&i.link.label],
            Node::ReferenceImage(i) => vec![&i.label],
            Node::TextTransform(t) => vec![&t.children],
            Node::Newline
            | Node::Code(_)
            | Node::Math(_)
            | Node::HorizontalRule
            | Node::PageBreak
            | Node::Html(_)
            | Node::Text(_)
            | Node::LineBreak
            | Node::CodeSpan(_)
            | Node::MathSpan(_)
            | Node::ReferenceFootnote(_)
            | Node::Comment
            | Node::CriticalContent(_)
            | Node::TextSymbol(_) => vec![],
        }
    }

    pub fn child_lists_mut(&mut self) -> Vec<&mut Vec<Node>> {
        match self {
            Node::Paragraph(children) | Node::Styled(children, _) => vec![children],
            Node::Heading(h) => vec![&mut h.text],
            Node::BlockQuote(q) => {
                let mut lists = vec![&mut q.children];
                lists.extend(q.attribution.as_mut());
                lists
            }
            Node::List(l) => vec![&mut l.children],
            Node::ListItem(i) => vec![&mut i.children],
            Node::Table(t) => t.cells_mut().map(|c| &mut c.text).collect(),
            Node::LinkDefinition(d) => vec![&mut d.text],
            Node::FootnoteDefinition(f) => vec![&mut f.text],
            Node::FunctionCall(c) => vec![&mut c.children],
            Node::Aligned(a) => vec![&mut a.children],
            Node::Stacked(s) => vec![&mut s.children],
            Node::Boxed(b) => {
                let mut lists: Vec<&mut Vec<Node>> = b.title.iter_mut().collect();
                lists.push(&mut b.children);
                lists
            }
            Node::TableOfContentsView(v) => v.title.iter_mut().collect(),
            Node::Link(l) => vec![&mut l.label],
            Node::ReferenceLink(l) => vec![&mut l.label],
            Node::Image(i) => vec![&mut i.link.label],
            Node::ReferenceImage(i) => vec![&mut i.label],
            Node::TextTransform(t) => vec![&mut t.children],
            Node::Newline
            | Node::Code(_)
            | Node::Math(_)
            | Node::HorizontalRule
            | Node::PageBreak
            | Node::Html(_)
            | Node::Text(_)
            | Node::LineBreak
            | Node::CodeSpan(_)
            | Node::MathSpan(_)
            | Node::ReferenceFootnote(_)
            | Node::Comment
            | Node::CriticalContent(_)
            | Node::TextSymbol(_) => vec![],
        }
    }

    /// Name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Newline => "newline",
            Node::Paragraph(_) => "paragraph",
            Node::Heading(_) => "heading",
            Node::BlockQuote(_) => "block quote",
            Node::List(_) => "list",
            Node::ListItem(_) => "list item",
            Node::Code(_) => "code",
            Node::Math(_) => "math",
            Node::HorizontalRule => "horizontal rule",
            Node::PageBreak => "page break",
            Node::Table(_) => "table",
            Node::Html(_) => "html",
            Node::LinkDefinition(_) => "link definition",
            Node::FootnoteDefinition(_) => "footnote definition",
            Node::FunctionCall(_) => "function call",
            Node::Aligned(_) => "aligned",
            Node::Stacked(_) => "stacked",
            Node::Boxed(_) => "box",
            Node::TableOfContentsView(_) => "table of contents",
            Node::Text(_) => "text",
            Node::LineBreak => "line break",
            Node::Styled(_, _) => "styled",
            Node::CodeSpan(_) => "code span",
            Node::MathSpan(_) => "math span",
            Node::Link(_) => "link",
            Node::ReferenceLink(_) => "reference link",
            Node::Image(_) => "image",
            Node::ReferenceImage(_) => "reference image",
            Node::ReferenceFootnote(_) => "footnote reference",
            Node::Comment => "comment",
            Node::CriticalContent(_) => "critical content",
            Node::TextSymbol(_) => "text symbol",
            Node::TextTransform(_) => "text transform",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub depth: u8,
    pub text: Vec<Node>,
    /// Decorative headings are excluded from the document structure and table of contents.
    pub is_decorative: bool,
    pub custom_id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockQuoteKind {
    Tip,
    Note,
    Warning,
    Important,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockQuote {
    pub kind: Option<BlockQuoteKind>,
    pub attribution: Option<Vec<Node>>,
    pub children: Vec<Node>,
}

/// Properties of a list that its items look up through their owner reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListProperties {
    pub is_loose: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// Start index of an ordered list; `None` for bullet lists.
    pub start: Option<u64>,
    pub properties: Rc<ListProperties>,
    pub children: Vec<Node>,
}

impl List {
    pub fn is_loose(&self) -> bool {
        self.properties.is_loose
    }

    pub fn is_ordered(&self) -> bool {
        self.start.is_some()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListItem {
    /// `Some(checked)` for task items.
    pub task: Option<bool>,
    /// Non-owning reference to the list this item belongs to.
    #[serde(skip)]
    pub owner: Weak<ListProperties>,
    pub children: Vec<Node>,
}

impl ListItem {
    pub fn is_loose(&self) -> bool {
        self.owner.upgrade().map(|p| p.is_loose).unwrap_or(false)
    }
}

impl PartialEq for ListItem {
    fn eq(&self, other: &Self) -> bool {
        self.task == other.task
            && self.children == other.children
            && self.owner.upgrade() == other.owner.upgrade()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Code {
    pub language: Option<String>,
    pub content: String,
    pub caption: Option<String>,
    pub custom_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Math {
    pub expression: String,
    pub custom_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableAlignment {
    Left,
    Center,
    Right,
    #[default]
    None,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub text: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub alignments: Vec<TableAlignment>,
    pub header: Vec<TableCell>,
    pub rows: Vec<Vec<TableCell>>,
    pub caption: Option<String>,
    pub custom_id: Option<String>,
}

impl Table {
    /// Header cells followed by body cells, row by row.
    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.header.iter().chain(self.rows.iter().flatten())
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut TableCell> {
        self.header.iter_mut().chain(self.rows.iter_mut().flatten())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkDefinition {
    /// Normalized label used for lookups.
    pub label: String,
    pub text: Vec<Node>,
    pub url: String,
    pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FootnoteDefinition {
    pub label: String,
    pub text: Vec<Node>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Style {
    Emphasis,
    Strong,
    StrongEmphasis,
    Strikethrough,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub label: Vec<Node>,
    pub url: String,
    pub title: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLink {
    pub label: Vec<Node>,
    /// Normalized label of the definition to look up.
    pub reference: String,
    /// Source text shown when no definition matches.
    pub fallback: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub link: Link,
    pub width: Option<String>,
    pub height: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceImage {
    pub label: Vec<Node>,
    pub reference: String,
    pub fallback: String,
}

/// Normalizes a link label for case- and whitespace-insensitive matching.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
