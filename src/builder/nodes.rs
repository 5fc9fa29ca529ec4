use crate::render::Node;
use crate::source::{Content, Element};

/// Child element marking a templated fragment.
pub const DYNAMIC_ELEMENT: &str = "dynamic";

/// Builds a statement's render tree from its child content.
///
/// Text children become literals, verbatim. `dynamic` children become
/// templated nodes holding their raw body. Any other element (mapping
/// declarations, descriptions) is not part of the body. Bodies are not
/// validated here; a malformed template fails when rendered.
pub fn build_node_tree(statement: &Element) -> Node {
    let children = statement
        .children
        .iter()
        .filter_map(|child| match child {
            Content::Text(text) => Some(Node::Literal(text.clone())),
            Content::Element(e) if e.name == DYNAMIC_ELEMENT => Some(Node::Templated(e.body())),
            Content::Element(_) => None,
        })
        .collect();
    Node::Composite(children)
}
