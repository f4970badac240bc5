//! The pass over the expanded tree: automatic page breaks, heading locations and identifiers,
//! the table of contents, reference resolution and media registration.
use crate::context::{Context, DocumentType};
use crate::error::Error;
use crate::render::plain_text;
use crate::toc::{TableOfContents, TocItem, TocTarget};
use dotmark_parser::ast::visitor::NodeVisitor;
use dotmark_parser::ast::{Heading, Image, Link, Node};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

lazy_static! {
    static ref SLUG_SEPARATORS: Regex =
        Regex::new(r"[^\p{L}\p{N}]+").expect("invalid regex expression");
}

/// Runs every tree pass, in order, storing what it collects in the context attributes.
pub fn visit_tree(nodes: &mut Vec<Node>, ctx: &mut Context) -> Result<(), Error> {
    let max_depth = ctx.options.auto_page_break_heading_depth;
    if max_depth > 0 && ctx.document.doc_type != DocumentType::Plain {
        insert_page_breaks(nodes, max_depth, &mut false);
    }

    ctx.attributes.identifiers.clear();
    ctx.attributes.locations.clear();
    let mut collector = Collector::new(ctx);
    collector.visit_nodes(nodes)?;
    let headings = collector.headings;
    debug!(headings = headings.len(), "collected document structure");
    ctx.attributes.table_of_contents = Some(TableOfContents::generate(headings));
    Ok(())
}

/// Inserts a page break before each heading of at most `max_depth` that follows some content.
fn insert_page_breaks(nodes: &mut Vec<Node>, max_depth: u8, seen_content: &mut bool) {
    let mut i = 0;
    while i < nodes.len() {
        let needs_break = matches!(
            &nodes[i],
            Node::Heading(h) if !h.is_decorative && h.depth <= max_depth && *seen_content
        );
        if needs_break {
            nodes.insert(i, Node::PageBreak);
            i += 1;
        }

        match &mut nodes[i] {
            Node::FunctionCall(call) => {
                insert_page_breaks(&mut call.children, max_depth, seen_content)
            }
            Node::PageBreak => *seen_content = false,
            Node::Newline | Node::LinkDefinition(_) | Node::Comment => {}
            _ => *seen_content = true,
        }
        i += 1;
    }
}

/// Turns heading text into an identifier: lower case words joined by dashes.
pub fn slugify(text: &str) -> String {
    SLUG_SEPARATORS
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

struct Collector<'a> {
    ctx: &'a mut Context,
    index: usize,
    counters: Vec<usize>,
    /// Last suffix tried for each base identifier.
    suffixes: HashMap<String, usize>,
    issued_ids: HashSet<String>,
    headings: Vec<TocItem>,
}

impl<'a> Collector<'a> {
    fn new(ctx: &'a mut Context) -> Self {
        Collector {
            ctx,
            index: 0,
            counters: vec![],
            suffixes: HashMap::new(),
            issued_ids: HashSet::new(),
            headings: vec![],
        }
    }

    /// Suffixes `id` with `-1`, `-2`... until it differs from every identifier issued so far.
    fn unique_id(&mut self, id: String) -> String {
        let mut candidate = id.clone();
        while self.issued_ids.contains(&candidate) {
            let suffix = self.suffixes.entry(id.clone()).or_insert(0);
            *suffix += 1;
            candidate = format!("{}-{}", id, suffix);
        }
        self.issued_ids.insert(candidate.clone());
        candidate
    }

    fn collect_heading(&mut self, heading: &Heading, index: usize) {
        let id = match &heading.custom_id {
            Some(id) => Some(self.unique_id(id.clone())),
            None if self.ctx.options.enable_automatic_identifiers => {
                let slug = slugify(&plain_text(&heading.text));
                (!slug.is_empty()).then(|| self.unique_id(slug))
            }
            None => None,
        };
        if let Some(id) = &id {
            self.ctx.attributes.identifiers.insert(index, id.clone());
        }
        if heading.is_decorative {
            return;
        }

        let depth = heading.depth.max(1) as usize;
        self.counters.resize(depth, 0);
        self.counters[depth - 1] += 1;
        self.ctx
            .attributes
            .locations
            .insert(index, self.counters.clone());
        self.headings.push(TocItem::new(
            heading.text.clone(),
            TocTarget { index, id },
            heading.depth,
        ));
    }

    /// The link or image a reference stands for, when its definition exists.
    fn resolve_reference(&self, node: &Node) -> Option<Node> {
        let definitions = &self.ctx.attributes.link_definitions;
        match node {
            Node::ReferenceLink(link) => definitions.get(&link.reference).map(|d| {
                Node::Link(Link {
                    label: link.label.clone(),
                    url: d.url.clone(),
                    title: d.title.clone(),
                })
            }),
            Node::ReferenceImage(image) => definitions.get(&image.reference).map(|d| {
                Node::Image(Image {
                    link: Link {
                        label: image.label.clone(),
                        url: d.url.clone(),
                        title: d.title.clone(),
                    },
                    width: None,
                    height: None,
                })
            }),
            _ => None,
        }
    }
}

impl NodeVisitor for Collector<'_> {
    type Error = Error;

    fn visit_node(&mut self, node: &mut Node) -> Result<(), Self::Error> {
        let index = self.index;
        self.index += 1;

        if let Some(resolved) = self.resolve_reference(node) {
            *node = resolved;
        }
        match node {
            Node::Heading(heading) => self.collect_heading(heading, index),
            Node::Image(image) => {
                if let Some(location) = self.ctx.register_media(&image.link.url) {
                    image.link.url = location;
                }
            }
            _ => {}
        }
        self.walk_node(node)
    }
}
