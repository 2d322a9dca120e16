//! Markup serializer - the arena back to HTML text
//!
//! This module handles:
//! - `innerHTML` / `outerHTML` style serialization
//! - HTML escaping of text and attribute values
//! - XPath generation for element identification in logs

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::*;

/// Pending serializer work: emit a node (with its raw-text context) or the
/// end tag of an element whose children are done
enum Step {
    Open(NodeId, bool),
    Close(NodeId),
}

/// Document tree serializer
#[derive(Debug, Default, Clone, Copy)]
pub struct DomSerializer;

impl DomSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Serialize the children of a node (`innerHTML` getter)
    pub fn inner_html(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(256);
        let node = arena.get(node_id)?;
        let raw = node.tag_name().map(is_raw_text).unwrap_or(false);
        for &child_id in &node.children_ids {
            self.serialize_node(arena, child_id, raw, &mut output)?;
        }
        Ok(output)
    }

    /// Serialize a node including itself (`outerHTML` getter)
    pub fn outer_html(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut output = String::with_capacity(256);
        let raw = arena
            .parent(node_id)?
            .and_then(|p| p.tag_name())
            .map(is_raw_text)
            .unwrap_or(false);
        self.serialize_node(arena, node_id, raw, &mut output)?;
        Ok(output)
    }

    /// Serialize a whole document starting at its root
    pub fn serialize(&self, arena: &DomArena) -> Result<String> {
        match arena.root_id() {
            Some(root_id) => self.inner_html(arena, root_id),
            None => Ok(String::new()),
        }
    }

    /// Serialize one node and its subtree. `raw_parent` is set when the
    /// parent is a raw-text element. Iterative, over an explicit work stack.
    fn serialize_node(
        &self,
        arena: &DomArena,
        node_id: NodeId,
        raw_parent: bool,
        output: &mut String,
    ) -> Result<()> {
        let mut stack = vec![Step::Open(node_id, raw_parent)];

        while let Some(step) = stack.pop() {
            let (node_id, raw_parent) = match step {
                Step::Open(id, raw) => (id, raw),
                Step::Close(id) => {
                    let node = arena.get(id)?;
                    output.push_str("</");
                    output.push_str(&node.node_name);
                    output.push('>');
                    continue;
                }
            };
            let node = arena.get(node_id)?;

            match node.node_type {
                NodeType::Element => {
                    output.push('<');
                    output.push_str(&node.node_name);
                    for attr in &node.attributes {
                        output.push(' ');
                        output.push_str(&attr.name);
                        output.push_str("=\"");
                        escape_attr(&attr.value, output);
                        output.push('"');
                    }
                    output.push('>');

                    if is_void_element(&node.node_name) {
                        continue;
                    }

                    let raw = is_raw_text(&node.node_name);
                    stack.push(Step::Close(node_id));
                    stack.extend(node.children_ids.iter().rev().map(|&c| Step::Open(c, raw)));
                }
                NodeType::Text => {
                    if raw_parent {
                        output.push_str(&node.node_value);
                    } else {
                        escape_text(&node.node_value, output);
                    }
                }
                NodeType::Comment => {
                    output.push_str("<!--");
                    output.push_str(&node.node_value);
                    output.push_str("-->");
                }
                NodeType::DocumentType => {
                    output.push_str("<!DOCTYPE ");
                    output.push_str(&node.node_name);
                    output.push('>');
                }
                NodeType::Document | NodeType::DocumentFragment => {
                    stack.extend(node.children_ids.iter().rev().map(|&c| Step::Open(c, false)));
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Generate XPath for a node
    pub fn generate_xpath(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let mut path_parts = Vec::new();
        let mut current_id = Some(node_id);

        while let Some(id) = current_id {
            let node = arena.get(id)?;

            if node.node_type == NodeType::Element {
                // Get position among siblings with same tag name
                let position = if let Some(parent_id) = node.parent_id {
                    let parent = arena.get(parent_id)?;
                    parent
                        .children_ids
                        .iter()
                        .filter_map(|&child_id| arena.get(child_id).ok())
                        .filter(|child| {
                            child.node_type == NodeType::Element
                                && child.node_name == node.node_name
                        })
                        .position(|child| child.node_id == node.node_id)
                        .map(|p| p + 1) // XPath is 1-indexed
                        .unwrap_or(1)
                } else {
                    1
                };

                path_parts.push(format!("{}[{}]", node.node_name, position));
            }

            current_id = node.parent_id;
        }

        path_parts.reverse();
        Ok(format!("/{}", path_parts.join("/")))
    }
}

fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            c => output.push(c),
        }
    }
}

fn escape_attr(value: &str, output: &mut String) {
    for c in value.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '\u{a0}' => output.push_str("&nbsp;"),
            c => output.push(c),
        }
    }
}
