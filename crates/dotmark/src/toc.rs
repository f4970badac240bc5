use dotmark_parser::ast::Node;
use serde::Serialize;

/// Where a table of contents entry points to: the heading's preorder node index and its
/// identifier, if it has one.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TocTarget {
    pub index: usize,
    pub id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TocItem {
    pub text: Vec<Node>,
    pub target: TocTarget,
    pub depth: u8,
    pub sub_items: Vec<TocItem>,
}

impl TocItem {
    pub fn new(text: Vec<Node>, target: TocTarget, depth: u8) -> Self {
        TocItem {
            text,
            target,
            depth,
            sub_items: vec![],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TableOfContents {
    pub items: Vec<TocItem>,
}

impl TableOfContents {
    /// Nests headings, given in document order, under the closest preceding shallower one.
    /// The shallowest depth present is the top level.
    pub fn generate(headings: Vec<TocItem>) -> Self {
        let Some(min_depth) = headings.iter().map(|h| h.depth).min() else {
            return TableOfContents::default();
        };
        let mut items = Vec::new();
        for heading in headings {
            insert(&mut items, heading, min_depth);
        }
        TableOfContents { items }
    }
}

fn insert(items: &mut Vec<TocItem>, item: TocItem, depth: u8) {
    match items.last_mut() {
        Some(last) if item.depth > depth => insert(&mut last.sub_items, item, depth + 1),
        _ => items.push(item),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(text: &str, depth: u8) -> TocItem {
        TocItem::new(
            vec![Node::text(text)],
            TocTarget {
                index: 0,
                id: None,
            },
            depth,
        )
    }

    #[test]
    fn nesting() {
        let toc = TableOfContents::generate(vec![
            heading("ABC", 1),
            heading("DEF", 2),
            heading("GHI", 2),
            heading("JKL", 3),
            heading("MNO", 2),
            heading("PQR", 1),
        ]);
        assert_eq!(toc.items.len(), 2);
        assert_eq!(toc.items[0].sub_items.len(), 3);
        assert_eq!(toc.items[0].sub_items[1].sub_items.len(), 1);
        assert_eq!(toc.items[0].sub_items[1].sub_items[0].text, vec![Node::text("JKL")]);
        assert!(toc.items[1].sub_items.is_empty());
    }

    #[test]
    fn shallowest_depth_is_the_top_level() {
        let toc = TableOfContents::generate(vec![heading("A", 2), heading("B", 3), heading("C", 2)]);
        assert_eq!(toc.items.len(), 2);
        assert_eq!(toc.items[0].sub_items.len(), 1);
    }

    #[test]
    fn skipped_levels_nest_once() {
        let toc = TableOfContents::generate(vec![heading("A", 1), heading("B", 3), heading("C", 2)]);
        assert_eq!(toc.items.len(), 1);
        assert_eq!(toc.items[0].sub_items.len(), 2);
    }

    #[test]
    fn leading_deep_headings_stay_on_top() {
        let toc = TableOfContents::generate(vec![heading("A", 3), heading("B", 1)]);
        assert_eq!(toc.items.len(), 2);
    }
}
