use super::{NodeRenderer, RenderError, RenderResult};
use crate::context::{Attributes, DocumentInfo};
use crate::numbering::NumberingFormat;
use crate::toc::TocItem;
use dotmark_parser::ast::{
    Aligned, BlockQuote, BoxNode, CallState, Code, FootnoteDefinition, FunctionCallNode, Heading,
    Image, Link, LinkDefinition, List, ListItem, Math, Node, ReferenceImage, ReferenceLink,
    Stacked, Style, Table, TableOfContentsView, TextCase, TextTransform,
};

/// Renders a tree as unformatted text. Given the compilation state, tables of contents are
/// filled in from the collected headings and numbered with the `headings` format.
#[derive(Default)]
pub struct PlainTextRenderer<'a> {
    state: Option<(&'a Attributes, &'a DocumentInfo)>,
}

impl<'a> PlainTextRenderer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(attributes: &'a Attributes, document: &'a DocumentInfo) -> Self {
        PlainTextRenderer {
            state: Some((attributes, document)),
        }
    }

    fn render_toc_items(
        &mut self,
        items: &[TocItem],
        max_depth: u8,
        level: usize,
        out: &mut String,
    ) -> Result<(), RenderError> {
        let Some((attributes, document)) = self.state else {
            return Ok(());
        };
        let format = document
            .numbering
            .get("headings")
            .map(|f| NumberingFormat::parse(f));

        for item in items.iter().filter(|item| item.depth <= max_depth) {
            out.push_str(&"  ".repeat(level));
            let number = format.as_ref().and_then(|format| {
                attributes
                    .locations
                    .get(&item.target.index)
                    .map(|location| format.format(location, false))
            });
            if let Some(number) = number.filter(|n| !n.is_empty()) {
                out.push_str(&number);
                out.push(' ');
            }
            out.push_str(&self.render_inner(&item.text)?);
            out.push('\n');
            self.render_toc_items(&item.sub_items, max_depth, level + 1, out)?;
        }
        Ok(())
    }
}

fn indent(text: &str, prefix: &str) -> String {
    text.trim_end()
        .lines()
        .map(|line| format!("{}{}\n", prefix, line))
        .collect()
}

fn capitalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}

impl NodeRenderer for PlainTextRenderer<'_> {
    // Blocks end with their own blank line.
    fn render_newline(&mut self) -> RenderResult {
        Ok(String::new())
    }

    fn render_paragraph(&mut self, children: &[Node]) -> RenderResult {
        Ok(format!("{}\n\n", self.render_inner(children)?))
    }

    fn render_heading(&mut self, heading: &Heading) -> RenderResult {
        Ok(format!("{}\n\n", self.render_inner(&heading.text)?))
    }

    fn render_block_quote(&mut self, quote: &BlockQuote) -> RenderResult {
        let mut out = indent(&self.render_inner(&quote.children)?, "> ");
        if let Some(attribution) = &quote.attribution {
            out.push_str(&format!("> - {}\n", self.render_inner(attribution)?));
        }
        out.push('\n');
        Ok(out)
    }

    fn render_list(&mut self, list: &List) -> RenderResult {
        let mut out = String::new();
        for (i, item) in list.children.iter().enumerate() {
            let marker = match list.start {
                Some(start) => format!("{}. ", start + i as u64),
                None => "- ".to_string(),
            };
            let content = self.render(item)?;
            let mut lines = content.trim_end().lines();
            out.push_str(&marker);
            out.push_str(lines.next().unwrap_or_default());
            out.push('\n');
            for line in lines {
                out.push_str(&" ".repeat(marker.len()));
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push('\n');
        Ok(out)
    }

    fn render_list_item(&mut self, item: &ListItem) -> RenderResult {
        let task = match item.task {
            Some(true) => "[x] ",
            Some(false) => "[ ] ",
            None => "",
        };
        Ok(format!("{}{}", task, self.render_inner(&item.children)?))
    }

    fn render_code(&mut self, code: &Code) -> RenderResult {
        let mut out = format!("{}\n", code.content.trim_end_matches('\n'));
        if let Some(caption) = &code.caption {
            out.push_str(caption);
            out.push('\n');
        }
        out.push('\n');
        Ok(out)
    }

    fn render_math(&mut self, math: &Math) -> RenderResult {
        Ok(format!("{}\n\n", math.expression.trim()))
    }

    fn render_horizontal_rule(&mut self) -> RenderResult {
        Ok("---\n\n".to_string())
    }

    fn render_page_break(&mut self) -> RenderResult {
        Ok("\x0c\n".to_string())
    }

    fn render_table(&mut self, table: &Table) -> RenderResult {
        let mut out = String::new();
        for row in std::iter::once(&table.header).chain(table.rows.iter()) {
            let cells = row
                .iter()
                .map(|cell| self.render_inner(&cell.text))
                .collect::<Result<Vec<_>, _>>()?;
            out.push_str(&cells.join(" | "));
            out.push('\n');
        }
        if let Some(caption) = &table.caption {
            out.push_str(caption);
            out.push('\n');
        }
        out.push('\n');
        Ok(out)
    }

    fn render_html(&mut self, _html: &str) -> RenderResult {
        Err(RenderError::Unsupported("html"))
    }

    fn render_link_definition(&mut self, _definition: &LinkDefinition) -> RenderResult {
        Ok(String::new())
    }

    fn render_footnote_definition(&mut self, definition: &FootnoteDefinition) -> RenderResult {
        Ok(format!(
            "[^{}]: {}\n\n",
            definition.label,
            self.render_inner(&definition.text)?
        ))
    }

    fn render_function_call(&mut self, call: &FunctionCallNode) -> RenderResult {
        match call.state {
            CallState::Expanded | CallState::Failed => self.render_inner(&call.children),
            _ => Err(RenderError::Unexpanded(call.name.clone())),
        }
    }

    fn render_aligned(&mut self, aligned: &Aligned) -> RenderResult {
        self.render_inner(&aligned.children)
    }

    fn render_stacked(&mut self, stacked: &Stacked) -> RenderResult {
        self.render_inner(&stacked.children)
    }

    fn render_box(&mut self, boxed: &BoxNode) -> RenderResult {
        let mut out = String::new();
        if let Some(title) = &boxed.title {
            out.push_str(&format!("[{}]\n", self.render_inner(title)?));
        }
        out.push_str(self.render_inner(&boxed.children)?.trim_end());
        out.push_str("\n\n");
        Ok(out)
    }

    fn render_table_of_contents(&mut self, view: &TableOfContentsView) -> RenderResult {
        let mut out = String::new();
        if let Some(title) = &view.title {
            out.push_str(&self.render_inner(title)?);
            out.push('\n');
        }
        let toc = self
            .state
            .and_then(|(attributes, _)| attributes.table_of_contents.as_ref());
        if let Some(toc) = toc {
            self.render_toc_items(&toc.items, view.max_depth, 0, &mut out)?;
        }
        out.push('\n');
        Ok(out)
    }

    fn render_text(&mut self, text: &str) -> RenderResult {
        Ok(text.to_string())
    }

    fn render_line_break(&mut self) -> RenderResult {
        Ok("\n".to_string())
    }

    fn render_styled(&mut self, children: &[Node], _style: Style) -> RenderResult {
        self.render_inner(children)
    }

    fn render_code_span(&mut self, code: &str) -> RenderResult {
        Ok(code.to_string())
    }

    fn render_math_span(&mut self, math: &str) -> RenderResult {
        Ok(math.to_string())
    }

    fn render_link(&mut self, link: &Link) -> RenderResult {
        self.render_inner(&link.label)
    }

    fn render_reference_link(&mut self, link: &ReferenceLink) -> RenderResult {
        Ok(link.fallback.clone())
    }

    fn render_image(&mut self, image: &Image) -> RenderResult {
        self.render_inner(&image.link.label)
    }

    fn render_reference_image(&mut self, image: &ReferenceImage) -> RenderResult {
        Ok(image.fallback.clone())
    }

    fn render_reference_footnote(&mut self, label: &str) -> RenderResult {
        Ok(format!("[^{}]", label))
    }

    fn render_comment(&mut self) -> RenderResult {
        Ok(String::new())
    }

    fn render_critical_content(&mut self, content: &str) -> RenderResult {
        Ok(content.to_string())
    }

    fn render_text_symbol(&mut self, symbol: char) -> RenderResult {
        Ok(symbol.to_string())
    }

    fn render_text_transform(&mut self, transform: &TextTransform) -> RenderResult {
        let text = self.render_inner(&transform.children)?;
        Ok(match transform.data.case {
            Some(TextCase::Uppercase) => text.to_uppercase(),
            Some(TextCase::Lowercase) => text.to_lowercase(),
            Some(TextCase::Capitalize) => capitalize(&text),
            Some(TextCase::None) | None => text,
        })
    }
}

/// Text content of inline nodes. Nodes that can't be rendered as text are skipped.
pub fn plain_text(nodes: &[Node]) -> String {
    let mut renderer = PlainTextRenderer::new();
    nodes
        .iter()
        .filter_map(|node| renderer.render(node).ok())
        .collect()
}
