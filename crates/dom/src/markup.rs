//! Markup parsing
//!
//! Uses html5ever's RcDom and converts it into the arena. The conversion is
//! iterative; user-supplied markup can nest arbitrarily deep.
//!
//! Fragments are parsed in body context: the markup is fed after a `<body>`
//! start tag and the body's children are lifted out as detached nodes.

use html5ever::parse_document as parse_html;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::arena::DomArena;
use crate::types::{DomNode, NodeId, NodeType};

/// Empty document used when a window starts without markup
pub const BLANK_DOCUMENT: &str = "<!DOCTYPE html><html><head></head><body></body></html>";

/// Parse a whole document into a fresh arena.
///
/// html5ever is error-tolerant, so this never fails: missing `html`, `head`
/// and `body` elements are synthesized.
pub fn parse_document(html: &str) -> DomArena {
    let dom = parse_html(RcDom::default(), Default::default()).one(html);

    let mut arena = DomArena::new_document();
    let Some(root) = arena.root_id() else {
        return arena;
    };

    for child in dom.document.children.borrow().iter() {
        if let Some(id) = import_subtree(&mut arena, child) {
            if let Err(e) = arena.append_child(root, id) {
                tracing::warn!("Dropped top-level node while parsing: {}", e);
            }
        }
    }

    tracing::debug!("Parsed document into {} nodes", arena.len());
    arena
}

/// Parse markup in body context. Returns the top-level nodes, detached and in
/// document order.
pub fn parse_fragment(arena: &mut DomArena, markup: &str) -> Vec<NodeId> {
    if markup.is_empty() {
        return Vec::new();
    }

    let mut source = String::with_capacity(markup.len() + 6);
    source.push_str("<body>");
    source.push_str(markup);
    let dom = parse_html(RcDom::default(), Default::default()).one(source);

    let Some(body) = find_body(&dom.document) else {
        return Vec::new();
    };

    let children = body.children.borrow();
    let nodes: Vec<NodeId> = children
        .iter()
        .filter_map(|child| import_subtree(arena, child))
        .collect();
    nodes
}

/// Locate `<body>` under the RcDom document (`#document > html > body`)
fn find_body(document: &Handle) -> Option<Handle> {
    let html = document
        .children
        .borrow()
        .iter()
        .find(|h| is_element_named(h, "html"))
        .cloned()?;
    let body = html
        .children
        .borrow()
        .iter()
        .find(|h| is_element_named(h, "body"))
        .cloned();
    body
}

fn is_element_named(handle: &Handle, tag: &str) -> bool {
    match &handle.data {
        RcNodeData::Element { name, .. } => &*name.local == tag,
        _ => false,
    }
}

/// Copy one RcDom subtree into the arena, returning the detached root id
fn import_subtree(arena: &mut DomArena, top: &Handle) -> Option<NodeId> {
    let top_id = import_node(arena, top)?;

    let mut stack = vec![(top.clone(), top_id)];
    while let Some((handle, parent_id)) = stack.pop() {
        for child in handle.children.borrow().iter() {
            let Some(child_id) = import_node(arena, child) else {
                continue;
            };
            if let Err(e) = arena.append_child(parent_id, child_id) {
                tracing::warn!("Dropped node while parsing: {}", e);
                continue;
            }
            stack.push((child.clone(), child_id));
        }
    }

    Some(top_id)
}

/// Create the arena counterpart of a single RcDom node (no children)
fn import_node(arena: &mut DomArena, handle: &Handle) -> Option<NodeId> {
    match &handle.data {
        RcNodeData::Element { name, attrs, .. } => {
            let mut node = DomNode::new(0, NodeType::Element, name.local.to_string());
            for attr in attrs.borrow().iter() {
                node.set_attr(&attr.name.local, &attr.value);
            }
            Some(arena.add_node(node))
        }
        RcNodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            Some(arena.create_text(&text))
        }
        RcNodeData::Comment { contents } => Some(arena.create_comment(&contents.to_string())),
        RcNodeData::Doctype { name, .. } => Some(arena.create_doctype(&name.to_string())),
        RcNodeData::Document | RcNodeData::ProcessingInstruction { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_structure() {
        let arena = parse_document("<p id='x'>Hello</p>");

        let body = arena.document_child("body").unwrap();
        let head = arena.document_child("head").unwrap();
        assert!(arena.get(head).unwrap().children_ids.is_empty());

        let p = arena.find_by_id("x").unwrap();
        assert_eq!(arena.get(p).unwrap().parent_id, Some(body));
        assert_eq!(arena.text_content(p).unwrap(), "Hello");
    }

    #[test]
    fn test_parse_blank_document() {
        let arena = parse_document(BLANK_DOCUMENT);
        let root = arena.root_id().unwrap();
        let first = arena.children(root).unwrap()[0].node_type;
        assert_eq!(first, NodeType::DocumentType);
        assert!(arena.document_child("body").is_some());
    }

    #[test]
    fn test_parse_fragment_detached_in_order() {
        let mut arena = parse_document(BLANK_DOCUMENT);
        let nodes = parse_fragment(&mut arena, "a<b class=\"x\">bold</b><!--c-->");

        assert_eq!(nodes.len(), 3);
        assert!(arena.get(nodes[0]).unwrap().is_text());
        let b = arena.get(nodes[1]).unwrap();
        assert_eq!(b.node_name, "b");
        assert_eq!(b.attr("class"), Some("x"));
        assert_eq!(b.parent_id, None);
        assert_eq!(arena.get(nodes[2]).unwrap().node_type, NodeType::Comment);
    }

    #[test]
    fn test_parse_fragment_keeps_script_in_place() {
        let mut arena = parse_document(BLANK_DOCUMENT);
        let nodes = parse_fragment(&mut arena, "<script src=\"a.js\"></script><span></span>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(arena.get(nodes[0]).unwrap().node_name, "script");
    }

    #[test]
    fn test_parse_fragment_empty() {
        let mut arena = DomArena::new_document();
        assert!(parse_fragment(&mut arena, "").is_empty());
    }
}
