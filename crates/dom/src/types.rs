//! Core node types for the host document tree
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Attributes keep insertion order (serialization must be stable)
//! 3. Use SmallVec for small arrays (avoid heap allocation)

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{DomError, Result};

/// Node identifier (index into arena)
/// u32 allows 4 billion nodes, enough for any document
pub type NodeId = u32;

/// Node type, numbered as in the DOM standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CdataSection = 4,
    EntityReference = 5,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl NodeType {
    /// Name used in error messages
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Element => "element",
            NodeType::Attribute => "attribute",
            NodeType::Text => "text",
            NodeType::CdataSection => "cdata-section",
            NodeType::EntityReference => "entity-reference",
            NodeType::Entity => "entity",
            NodeType::ProcessingInstruction => "processing-instruction",
            NodeType::Comment => "comment",
            NodeType::Document => "document",
            NodeType::DocumentType => "doctype",
            NodeType::DocumentFragment => "document-fragment",
            NodeType::Notation => "notation",
        }
    }
}

/// A single `name="value"` pair on an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The main document tree node
///
/// Design philosophy:
/// - Small fixed-size fields first (better packing)
/// - Use indices instead of pointers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomNode {
    pub node_id: NodeId,
    pub node_type: NodeType,

    // Navigation indices
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>, // Most nodes have <4 children

    /// Lower-case tag name for elements, `#text`, `#comment`, `#document`,
    /// or the doctype name
    pub node_name: String,
    /// Character data for text and comment nodes
    pub node_value: String,
    pub attributes: SmallVec<[Attribute; 4]>,
}

impl DomNode {
    /// Create a new node with required fields
    pub fn new(node_id: NodeId, node_type: NodeType, node_name: String) -> Self {
        Self {
            node_id,
            node_type,
            parent_id: None,
            children_ids: SmallVec::new(),
            node_name,
            node_value: String::new(),
            attributes: SmallVec::new(),
        }
    }

    /// Get tag name for element nodes
    pub fn tag_name(&self) -> Option<&str> {
        if self.node_type == NodeType::Element {
            Some(&self.node_name)
        } else {
            None
        }
    }

    /// Check if node is an element
    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    /// Check if node is an element with the given (lower-case) tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.is_element() && self.node_name == tag
    }

    /// Check if node is text
    pub fn is_text(&self) -> bool {
        self.node_type == NodeType::Text
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Check if attribute is present (value irrelevant)
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    /// Set attribute, replacing the value in place if it exists
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value.to_string(),
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Remove attribute, returning the old value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(pos).value)
    }

    /// Class tokens, split on ASCII whitespace
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    /// Check class membership
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add class tokens. Existing tokens keep their order and duplicates
    /// collapse, as `classList.add` rewrites the attribute.
    pub fn add_classes<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        let mut tokens = self.class_tokens();
        for name in names {
            if !tokens.iter().any(|t| t == name) {
                tokens.push(name.to_string());
            }
        }
        self.set_attr("class", &tokens.join(" "));
    }

    /// Remove every occurrence of the given class tokens
    pub fn remove_classes<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        if !self.has_attr("class") {
            return;
        }
        let names: Vec<&str> = names.into_iter().collect();
        let mut tokens = self.class_tokens();
        tokens.retain(|t| !names.contains(&t.as_str()));
        self.set_attr("class", &tokens.join(" "));
    }

    /// Flip membership of one class token, returning the new state
    pub fn toggle_class(&mut self, name: &str) -> bool {
        if self.has_class(name) {
            self.remove_classes([name]);
            false
        } else {
            self.add_classes([name]);
            true
        }
    }

    fn class_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        for class in self.classes() {
            if !tokens.iter().any(|t| t == class) {
                tokens.push(class.to_string());
            }
        }
        tokens
    }
}

/// Class tokens must be non-empty and free of ASCII whitespace
pub fn validate_class_token(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(DomError::Syntax("empty class token".to_string()));
    }
    if token.contains(|c: char| c.is_ascii_whitespace()) {
        return Err(DomError::InvalidCharacter(token.to_string()));
    }
    Ok(())
}

/// Elements that never have an end tag or children
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text children are serialized without escaping
pub const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}
