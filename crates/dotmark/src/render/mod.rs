//! The boundary between the compiled tree and output formats. A format implements
//! [NodeRenderer], one method per node variant, and [RepresentableVisitor] for the enums that
//! end up in its output.
mod plain;

pub use plain::{plain_text, PlainTextRenderer};

use dotmark_parser::ast::{
    Aligned, BlockQuote, BlockQuoteKind, BoxKind, BoxNode, Code, FootnoteDefinition,
    FunctionCallNode, Heading, Image, Link, LinkDefinition, List, ListItem, Math, Node,
    ReferenceImage, ReferenceLink, StackLayout, Stacked, Style, Table, TableAlignment,
    TableOfContentsView, TextCase, TextDecoration, TextSize, TextStyle, TextTransform,
    TextWeight,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("{0} nodes can't be rendered to this format")]
    Unsupported(&'static str),
    #[error("function call '{0}' was never expanded")]
    Unexpanded(String),
}

pub type RenderResult = Result<String, RenderError>;

pub trait NodeRenderer {
    fn render_newline(&mut self) -> RenderResult;
    fn render_paragraph(&mut self, children: &[Node]) -> RenderResult;
    fn render_heading(&mut self, heading: &Heading) -> RenderResult;
    fn render_block_quote(&mut self, quote: &BlockQuote) -> RenderResult;
    fn render_list(&mut self, list: &List) -> RenderResult;
    fn render_list_item(&mut self, item: &ListItem) -> RenderResult;
    fn render_code(&mut self, code: &Code) -> RenderResult;
    fn render_math(&mut self, math: &Math) -> RenderResult;
    fn render_horizontal_rule(&mut self) -> RenderResult;
    fn render_page_break(&mut self) -> RenderResult;
    fn render_table(&mut self, table: &Table) -> RenderResult;
    fn render_html(&mut self, html: &str) -> RenderResult;
    fn render_link_definition(&mut self, definition: &LinkDefinition) -> RenderResult;
    fn render_footnote_definition(&mut self, definition: &FootnoteDefinition) -> RenderResult;
    fn render_function_call(&mut self, call: &FunctionCallNode) -> RenderResult;
    fn render_aligned(&mut self, aligned: &Aligned) -> RenderResult;
    fn render_stacked(&mut self, stacked: &Stacked) -> RenderResult;
    fn render_box(&mut self, boxed: &BoxNode) -> RenderResult;
    fn render_table_of_contents(&mut self, view: &TableOfContentsView) -> RenderResult;
    fn render_text(&mut self, text: &str) -> RenderResult;
    fn render_line_break(&mut self) -> RenderResult;
    fn render_styled(&mut self, children: &[Node], style: Style) -> RenderResult;
    fn render_code_span(&mut self, code: &str) -> RenderResult;
    fn render_math_span(&mut self, math: &str) -> RenderResult;
    fn render_link(&mut self, link: &Link) -> RenderResult;
    fn render_reference_link(&mut self, link: &ReferenceLink) -> RenderResult;
    fn render_image(&mut self, image: &Image) -> RenderResult;
    fn render_reference_image(&mut self, image: &ReferenceImage) -> RenderResult;
    fn render_reference_footnote(&mut self, label: &str) -> RenderResult;
    fn render_comment(&mut self) -> RenderResult;
    fn render_critical_content(&mut self, content: &str) -> RenderResult;
    fn render_text_symbol(&mut self, symbol: char) -> RenderResult;
    fn render_text_transform(&mut self, transform: &TextTransform) -> RenderResult;

    fn render(&mut self, node: &Node) -> RenderResult {
        match node {
            Node::Newline => self.render_newline(),
            Node::Paragraph(children) => self.render_paragraph(children),
            Node::Heading(heading) => self.render_heading(heading),
            Node::BlockQuote(quote) => self.render_block_quote(quote),
            Node::List(list) => self.render_list(list),
            Node::ListItem(item) => self.render_list_item(item),
            Node::Code(code) => self.render_code(code),
            Node::Math(math) => self.render_math(math),
            Node::HorizontalRule => self.render_horizontal_rule(),
            Node::PageBreak => self.render_page_break(),
            Node::Table(table) => self.render_table(table),
            Node::Html(html) => self.render_html(html),
            Node::LinkDefinition(definition) => self.render_link_definition(definition),
            Node::FootnoteDefinition(definition) => self.render_footnote_definition(definition),
            Node::FunctionCall(call) => self.render_function_call(call),
            Node::Aligned(aligned) => self.render_aligned(aligned),
            Node::Stacked(stacked) => self.render_stacked(stacked),
            Node::Boxed(boxed) => self.render_box(boxed),
            Node::TableOfContentsView(view) => self.render_table_of_contents(view),
            Node::Text(text) => self.render_text(text),
            Node::LineBreak => self.render_line_break(),
            Node::Styled(children, style) => self.render_styled(children, *style),
            Node::CodeSpan(code) => self.render_code_span(code),
            Node::MathSpan(math) => self.render_math_span(math),
            Node::Link(link) => self.render_link(link),
            Node::ReferenceLink(link) => self.render_reference_link(link),
            Node::Image(image) => self.render_image(image),
            Node::ReferenceImage(image) => self.render_reference_image(image),
            Node::ReferenceFootnote(label) => self.render_reference_footnote(label),
            Node::Comment => self.render_comment(),
            Node::CriticalContent(content) => self.render_critical_content(content),
            Node::TextSymbol(symbol) => self.render_text_symbol(*symbol),
            Node::TextTransform(transform) => self.render_text_transform(transform),
        }
    }

    /// Renders `nodes` in order and joins the output.
    fn render_inner(&mut self, nodes: &[Node]) -> RenderResult {
        nodes.iter().map(|node| self.render(node)).collect()
    }
}

/// One method per enum a renderer has to represent in its output.
pub trait RepresentableVisitor<T> {
    fn visit_table_alignment(&self, alignment: TableAlignment) -> T;
    fn visit_stack_layout(&self, layout: StackLayout) -> T;
    fn visit_box_kind(&self, kind: BoxKind) -> T;
    fn visit_block_quote_kind(&self, kind: BlockQuoteKind) -> T;
    fn visit_text_size(&self, size: TextSize) -> T;
    fn visit_text_weight(&self, weight: TextWeight) -> T;
    fn visit_text_style(&self, style: TextStyle) -> T;
    fn visit_text_decoration(&self, decoration: TextDecoration) -> T;
    fn visit_text_case(&self, case: TextCase) -> T;
}

pub trait Representable {
    fn accept<T>(&self, visitor: &dyn RepresentableVisitor<T>) -> T;
}

macro_rules! representable {
    ($($ty:ty => $method:ident,)*) => {
        $(
            impl Representable for $ty {
                fn accept<T>(&self, visitor: &dyn RepresentableVisitor<T>) -> T {
                    visitor.$method(*self)
                }
            }
        )*
    };
}

representable! {
    TableAlignment => visit_table_alignment,
    StackLayout => visit_stack_layout,
    BoxKind => visit_box_kind,
    BlockQuoteKind => visit_block_quote_kind,
    TextSize => visit_text_size,
    TextWeight => visit_text_weight,
    TextStyle => visit_text_style,
    TextDecoration => visit_text_decoration,
    TextCase => visit_text_case,
}

/// Lower-case names, as used in configuration and arguments.
pub struct NameVisitor;

impl RepresentableVisitor<&'static str> for NameVisitor {
    fn visit_table_alignment(&self, alignment: TableAlignment) -> &'static str {
        match alignment {
            TableAlignment::Left => "left",
            TableAlignment::Center => "center",
            TableAlignment::Right => "right",
            TableAlignment::None => "none",
        }
    }

    fn visit_stack_layout(&self, layout: StackLayout) -> &'static str {
        match layout {
            StackLayout::Row => "row",
            StackLayout::Column => "column",
            StackLayout::Grid { .. } => "grid",
        }
    }

    fn visit_box_kind(&self, kind: BoxKind) -> &'static str {
        match kind {
            BoxKind::Callout => "callout",
            BoxKind::Tip => "tip",
            BoxKind::Note => "note",
            BoxKind::Warning => "warning",
            BoxKind::Error => "error",
        }
    }

    fn visit_block_quote_kind(&self, kind: BlockQuoteKind) -> &'static str {
        match kind {
            BlockQuoteKind::Tip => "tip",
            BlockQuoteKind::Note => "note",
            BlockQuoteKind::Warning => "warning",
            BlockQuoteKind::Important => "important",
        }
    }

    fn visit_text_size(&self, size: TextSize) -> &'static str {
        match size {
            TextSize::Tiny => "tiny",
            TextSize::Small => "small",
            TextSize::Normal => "normal",
            TextSize::Medium => "medium",
            TextSize::Larger => "larger",
            TextSize::Large => "large",
            TextSize::Huge => "huge",
        }
    }

    fn visit_text_weight(&self, weight: TextWeight) -> &'static str {
        match weight {
            TextWeight::Normal => "normal",
            TextWeight::Bold => "bold",
        }
    }

    fn visit_text_style(&self, style: TextStyle) -> &'static str {
        match style {
            TextStyle::Normal => "normal",
            TextStyle::Italic => "italic",
        }
    }

    fn visit_text_decoration(&self, decoration: TextDecoration) -> &'static str {
        match decoration {
            TextDecoration::None => "none",
            TextDecoration::Underline => "underline",
            TextDecoration::Overline => "overline",
            TextDecoration::Strikethrough => "strikethrough",
        }
    }

    fn visit_text_case(&self, case: TextCase) -> &'static str {
        match case {
            TextCase::None => "none",
            TextCase::Uppercase => "uppercase",
            TextCase::Lowercase => "lowercase",
            TextCase::Capitalize => "capitalize",
        }
    }
}
