use crate::ast::{FunctionCallNode, Heading, Image, Link, Node, ReferenceLink, Table};

/// Implements the visitor pattern over a node tree. Blanket implementations are provided so
/// implementors only have to implement the methods they need to modify.
pub trait NodeVisitor {
    type Error;

    fn walk_nodes(&mut self, nodes: &mut [Node]) -> Result<(), Self::Error> {
        nodes.iter_mut().try_for_each(|n| self.visit_node(n))
    }

    fn walk_node(&mut self, node: &mut Node) -> Result<(), Self::Error> {
        match node {
            Node::Heading(heading) => self.visit_heading(heading),
            Node::FunctionCall(call) => self.visit_function_call(call),
            Node::Table(table) => self.visit_table(table),
            Node::Link(link) => self.visit_link(link),
            Node::ReferenceLink(link) => self.visit_reference_link(link),
            Node::Image(image) => self.visit_image(image),
            _ => self.walk_children(node),
        }
    }

    fn walk_children(&mut self, node: &mut Node) -> Result<(), Self::Error> {
        node.child_lists_mut()
            .into_iter()
            .try_for_each(|children| self.visit_nodes(children))
    }

    fn visit_nodes(&mut self, nodes: &mut Vec<Node>) -> Result<(), Self::Error> {
        self.walk_nodes(nodes)
    }

    fn visit_node(&mut self, node: &mut Node) -> Result<(), Self::Error> {
        self.walk_node(node)
    }

    fn visit_heading(&mut self, heading: &mut Heading) -> Result<(), Self::Error> {
        self.visit_nodes(&mut heading.text)
    }

    fn visit_function_call(&mut self, call: &mut FunctionCallNode) -> Result<(), Self::Error> {
        self.visit_nodes(&mut call.children)
    }

    fn visit_table(&mut self, table: &mut Table) -> Result<(), Self::Error> {
        table
            .cells_mut()
            .try_for_each(|cell| self.visit_nodes(&mut cell.text))
    }

    fn visit_link(&mut self, link: &mut Link) -> Result<(), Self::Error> {
        self.visit_nodes(&mut link.label)
    }

    fn visit_reference_link(&mut self, link: &mut ReferenceLink) -> Result<(), Self::Error> {
        self.visit_nodes(&mut link.label)
    }

    fn visit_image(&mut self, image: &mut Image) -> Result<(), Self::Error> {
        self.visit_nodes(&mut image.link.label)
    }
}

/// Finds the call node with the given id, searching expanded output as well.
pub fn find_call_mut(
    nodes: &mut [Node],
    id: crate::ast::CallId,
) -> Option<&mut FunctionCallNode> {
    for node in nodes {
        if matches!(node, Node::FunctionCall(call) if call.id == id) {
            return match node {
                Node::FunctionCall(call) => Some(call),
                _ => None,
            };
        }
        for children in node.child_lists_mut() {
            if let Some(found) = find_call_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}
