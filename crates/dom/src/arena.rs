//! Arena-based document tree storage
//!
//! This arena eliminates:
//! - Rc/Arc overhead (16 bytes per pointer)
//! - Recursive function calls (stack overflow risk)
//! - Cache misses (nodes stored sequentially)
//!
//! Nodes are never freed individually. A detached node keeps its id until
//! `clear`, so a stale `NodeId` can never alias a different node.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

/// Arena allocator for document nodes
#[derive(Debug, Clone)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Root (document) node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self {
            nodes: Vec::with_capacity(1024), // Pre-allocate for typical page
            root_id: None,
        }
    }

    /// Create an arena holding a bare `#document` root
    pub fn new_document() -> Self {
        let mut arena = Self::new();
        let root = arena.add_node(DomNode::new(0, NodeType::Document, "#document".to_string()));
        arena.root_id = Some(root);
        arena
    }

    /// Add a node to the arena, returns its ID
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        self.nodes.push(node);
        node_id
    }

    /// Create a detached element. Tag names are lower-cased.
    pub fn create_element(&mut self, tag: &str) -> Result<NodeId> {
        validate_name(tag)?;
        Ok(self.add_node(DomNode::new(
            0,
            NodeType::Element,
            tag.to_ascii_lowercase(),
        )))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        let mut node = DomNode::new(0, NodeType::Text, "#text".to_string());
        node.node_value = text.to_string();
        self.add_node(node)
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        let mut node = DomNode::new(0, NodeType::Comment, "#comment".to_string());
        node.node_value = text.to_string();
        self.add_node(node)
    }

    /// Create a detached doctype node
    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.add_node(DomNode::new(0, NodeType::DocumentType, name.to_string()))
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID, failing unless it is an element
    pub fn element(&self, node_id: NodeId) -> Result<&DomNode> {
        let node = self.get(node_id)?;
        if node.is_element() {
            Ok(node)
        } else {
            Err(DomError::InvalidNodeType {
                expected: NodeType::Element.as_str().to_string(),
                actual: node.node_type.as_str().to_string(),
            })
        }
    }

    /// Mutable counterpart of [`DomArena::element`]
    pub fn element_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.element(node_id)?;
        self.get_mut(node_id)
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Total number of nodes (attached or not)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get children of a node
    pub fn children(&self, node_id: NodeId) -> Result<Vec<&DomNode>> {
        let node = self.get(node_id)?;
        node.children_ids
            .iter()
            .map(|&child_id| self.get(child_id))
            .collect()
    }

    /// Element children only
    pub fn element_children(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self
            .children(node_id)?
            .into_iter()
            .filter(|n| n.is_element())
            .map(|n| n.node_id)
            .collect())
    }

    /// Get parent of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<&DomNode>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(Some(self.get(parent_id)?)),
            None => Ok(None),
        }
    }

    /// Position of a node among its parent's children
    pub fn index_in_parent(&self, node_id: NodeId) -> Result<Option<usize>> {
        let node = self.get(node_id)?;
        match node.parent_id {
            Some(parent_id) => Ok(self
                .get(parent_id)?
                .children_ids
                .iter()
                .position(|&id| id == node_id)),
            None => Ok(None),
        }
    }

    pub fn next_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        let Some(parent) = self.parent(node_id)? else {
            return Ok(None);
        };
        let pos = self.index_in_parent(node_id)?.unwrap_or(0);
        Ok(parent.children_ids.get(pos + 1).copied())
    }

    pub fn previous_sibling(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        let Some(parent) = self.parent(node_id)? else {
            return Ok(None);
        };
        let pos = self.index_in_parent(node_id)?.unwrap_or(0);
        Ok(pos.checked_sub(1).and_then(|p| parent.children_ids.get(p).copied()))
    }

    /// True when `node_id` is reachable from the root through parent links
    pub fn is_connected(&self, node_id: NodeId) -> bool {
        match self.root_id {
            Some(root) => self.is_inclusive_ancestor(root, node_id),
            None => false,
        }
    }

    /// True when `ancestor` is `node_id` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node_id: NodeId) -> bool {
        let mut current = Some(node_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).ok().and_then(|n| n.parent_id);
        }
        false
    }

    /// Ancestor chain, nearest first
    pub fn ancestors(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut current = self.get(node_id)?.parent_id;
        while let Some(id) = current {
            out.push(id);
            current = self.get(id)?.parent_id;
        }
        Ok(out)
    }

    /// Traverse tree depth-first (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Descendants of `start_id` in tree order, excluding `start_id`
    pub fn descendants(&self, start_id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        self.traverse_df(start_id, |node| {
            if node.node_id != start_id {
                out.push(node.node_id);
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// Connected nodes matching predicate, in tree order
    pub fn find<F>(&self, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let Some(root) = self.root_id else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let _ = self.traverse_df(root, |node| {
            if predicate(node) {
                out.push(node.node_id);
            }
            Ok(())
        });
        out
    }

    /// First connected node matching predicate, in tree order
    pub fn find_one<F>(&self, predicate: F) -> Option<NodeId>
    where
        F: Fn(&DomNode) -> bool,
    {
        let root = self.root_id?;
        let mut stack = vec![root];
        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id).ok()?;
            if predicate(node) {
                return Some(node_id);
            }
            stack.extend(node.children_ids.iter().rev().copied());
        }
        None
    }

    /// Find all connected elements by tag name
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.find(|node| node.is_element() && node.node_name.eq_ignore_ascii_case(tag))
    }

    /// Find connected element by ID attribute
    pub fn find_by_id(&self, id: &str) -> Option<NodeId> {
        self.find_one(|node| node.is_element() && node.attr("id") == Some(id))
    }

    /// First `<tag>` child of the document element (`head`, `body`)
    pub fn document_child(&self, tag: &str) -> Option<NodeId> {
        let html = self.document_element()?;
        self.get(html)
            .ok()?
            .children_ids
            .iter()
            .copied()
            .find(|&id| self.get(id).map(|n| n.is_tag(tag)).unwrap_or(false))
    }

    /// The root's first element child (`<html>`)
    pub fn document_element(&self) -> Option<NodeId> {
        let root = self.get(self.root_id?).ok()?;
        root.children_ids
            .iter()
            .copied()
            .find(|&id| self.get(id).map(|n| n.is_element()).unwrap_or(false))
    }

    /// Remove a node from its parent (no-op for parentless nodes)
    pub fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let Some(parent_id) = self.get(node_id)?.parent_id else {
            return Ok(());
        };
        let parent = self.get_mut(parent_id)?;
        parent.children_ids.retain(|id| *id != node_id);
        self.get_mut(node_id)?.parent_id = None;
        Ok(())
    }

    /// Append `child` after the parent's existing children.
    /// A child that already has a parent is moved.
    pub fn append_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.insert_before(parent_id, child_id, None)
    }

    /// Insert `child` before `reference` among `parent`'s children;
    /// `None` appends.
    pub fn insert_before(
        &mut self,
        parent_id: NodeId,
        child_id: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.ensure_pre_insert_validity(parent_id, child_id, reference)?;

        // Inserting a node before itself means "before its next sibling"
        let reference = match reference {
            Some(r) if r == child_id => self.next_sibling(child_id)?,
            other => other,
        };

        self.detach(child_id)?;

        let parent = self.get_mut(parent_id)?;
        let pos = match reference {
            Some(r) => parent
                .children_ids
                .iter()
                .position(|&id| id == r)
                .ok_or(DomError::NotFound {
                    parent: parent_id,
                    reference: r,
                })?,
            None => parent.children_ids.len(),
        };
        parent.children_ids.insert(pos, child_id);
        self.get_mut(child_id)?.parent_id = Some(parent_id);

        tracing::trace!(parent = parent_id, child = child_id, pos, "inserted node");
        Ok(())
    }

    fn ensure_pre_insert_validity(
        &self,
        parent_id: NodeId,
        child_id: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let parent = self.get(parent_id)?;
        if !matches!(
            parent.node_type,
            NodeType::Element | NodeType::Document | NodeType::DocumentFragment
        ) {
            return Err(DomError::HierarchyRequest(format!(
                "a {} node cannot have children",
                parent.node_type.as_str()
            )));
        }

        let child = self.get(child_id)?;
        if child.node_type == NodeType::Document {
            return Err(DomError::HierarchyRequest(
                "a document cannot be inserted".to_string(),
            ));
        }

        if self.is_inclusive_ancestor(child_id, parent_id) {
            return Err(DomError::HierarchyRequest(format!(
                "node {} is an inclusive ancestor of {}",
                child_id, parent_id
            )));
        }

        if let Some(r) = reference {
            if self.get(r)?.parent_id != Some(parent_id) {
                return Err(DomError::NotFound {
                    parent: parent_id,
                    reference: r,
                });
            }
        }

        Ok(())
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        if self.get(child_id)?.parent_id != Some(parent_id) {
            return Err(DomError::NotFound {
                parent: parent_id,
                reference: child_id,
            });
        }
        self.detach(child_id)
    }

    /// Detach every child of `parent_id` and append `new_children` in order
    pub fn replace_children(&mut self, parent_id: NodeId, new_children: &[NodeId]) -> Result<()> {
        let old: Vec<NodeId> = self.get(parent_id)?.children_ids.to_vec();
        for child in old {
            self.remove_child(parent_id, child)?;
        }
        for &child in new_children {
            self.append_child(parent_id, child)?;
        }
        Ok(())
    }

    /// Copy a node (and with `deep`, its whole subtree) into new detached nodes
    pub fn clone_subtree(&mut self, node_id: NodeId, deep: bool) -> Result<NodeId> {
        let copy_of = |arena: &mut Self, src: NodeId| -> Result<NodeId> {
            let mut node = arena.get(src)?.clone();
            node.parent_id = None;
            node.children_ids.clear();
            Ok(arena.add_node(node))
        };

        let new_root = copy_of(self, node_id)?;
        if !deep {
            return Ok(new_root);
        }

        // (source, clone) pairs whose children still need copying
        let mut stack = vec![(node_id, new_root)];
        while let Some((src, dst)) = stack.pop() {
            let children: Vec<NodeId> = self.get(src)?.children_ids.to_vec();
            for child in children {
                let child_copy = copy_of(self, child)?;
                self.get_mut(dst)?.children_ids.push(child_copy);
                self.get_mut(child_copy)?.parent_id = Some(dst);
                stack.push((child, child_copy));
            }
        }

        Ok(new_root)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, node_id: NodeId) -> Result<String> {
        let mut text = String::new();
        self.traverse_df(node_id, |node| {
            if node.is_text() {
                text.push_str(&node.node_value);
            }
            Ok(())
        })?;
        Ok(text)
    }

    /// Rendered-text setter: line feeds become `<br>` elements
    pub fn set_inner_text(&mut self, node_id: NodeId, text: &str) -> Result<()> {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        let mut new_children = Vec::new();
        for (i, line) in normalized.split('\n').enumerate() {
            if i > 0 {
                new_children.push(self.create_element("br")?);
            }
            if !line.is_empty() {
                new_children.push(self.create_text(line));
            }
        }
        self.replace_children(node_id, &new_children)
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Reject names the host's `createElement` would refuse
pub fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = match chars.next() {
        Some(c) => c.is_ascii_alphabetic() || c == '_' || c == ':' || !c.is_ascii(),
        None => false,
    };
    let valid_rest = name
        .chars()
        .all(|c| !c.is_whitespace() && !c.is_control() && !"<>/=\"'`".contains(c));

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(DomError::InvalidCharacter(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_body() -> (DomArena, NodeId) {
        let mut arena = DomArena::new_document();
        let root = arena.root_id().unwrap();
        let html = arena.create_element("html").unwrap();
        let body = arena.create_element("body").unwrap();
        arena.append_child(root, html).unwrap();
        arena.append_child(html, body).unwrap();
        (arena, body)
    }

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();
        let id = arena.create_element("DIV").unwrap();
        assert_eq!(id, 0);

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.node_name, "div");
        assert_eq!(retrieved.node_id, id);
    }

    #[test]
    fn test_invalid_tag_name() {
        let mut arena = DomArena::new();
        assert!(matches!(
            arena.create_element("my div"),
            Err(DomError::InvalidCharacter(_))
        ));
        assert!(arena.create_element("").is_err());
        assert!(arena.create_element("1abc").is_err());
        assert!(arena.create_element("my-widget").is_ok());
    }

    #[test]
    fn test_traverse_df() {
        let (mut arena, body) = doc_with_body();
        let div = arena.create_element("div").unwrap();
        let span1 = arena.create_element("span").unwrap();
        let span2 = arena.create_element("span").unwrap();
        arena.append_child(body, div).unwrap();
        arena.append_child(div, span1).unwrap();
        arena.append_child(div, span2).unwrap();

        let mut visited = Vec::new();
        arena
            .traverse_df(div, |node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["div", "span", "span"]);
    }

    #[test]
    fn test_append_moves_node() {
        let (mut arena, body) = doc_with_body();
        let a = arena.create_element("div").unwrap();
        let b = arena.create_element("div").unwrap();
        let child = arena.create_element("p").unwrap();
        arena.append_child(body, a).unwrap();
        arena.append_child(body, b).unwrap();
        arena.append_child(a, child).unwrap();
        arena.append_child(b, child).unwrap();

        assert!(arena.get(a).unwrap().children_ids.is_empty());
        assert_eq!(arena.get(b).unwrap().children_ids.as_slice(), &[child]);
        assert_eq!(arena.get(child).unwrap().parent_id, Some(b));
    }

    #[test]
    fn test_append_ancestor_rejected() {
        let (mut arena, body) = doc_with_body();
        let outer = arena.create_element("div").unwrap();
        let inner = arena.create_element("div").unwrap();
        arena.append_child(body, outer).unwrap();
        arena.append_child(outer, inner).unwrap();

        assert!(matches!(
            arena.append_child(inner, outer),
            Err(DomError::HierarchyRequest(_))
        ));
        assert!(arena.append_child(outer, outer).is_err());
    }

    #[test]
    fn test_insert_before_and_siblings() {
        let (mut arena, body) = doc_with_body();
        let a = arena.create_element("a").unwrap();
        let c = arena.create_element("c").unwrap();
        let b = arena.create_element("b").unwrap();
        arena.append_child(body, a).unwrap();
        arena.append_child(body, c).unwrap();
        arena.insert_before(body, b, Some(c)).unwrap();

        assert_eq!(arena.get(body).unwrap().children_ids.as_slice(), &[a, b, c]);
        assert_eq!(arena.next_sibling(a).unwrap(), Some(b));
        assert_eq!(arena.previous_sibling(a).unwrap(), None);
        assert_eq!(arena.next_sibling(c).unwrap(), None);

        let stray = arena.create_element("x").unwrap();
        let other = arena.create_element("y").unwrap();
        assert!(matches!(
            arena.insert_before(body, stray, Some(other)),
            Err(DomError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove_child_requires_parent() {
        let (mut arena, body) = doc_with_body();
        let a = arena.create_element("a").unwrap();
        let b = arena.create_element("b").unwrap();
        arena.append_child(body, a).unwrap();

        assert!(matches!(
            arena.remove_child(body, b),
            Err(DomError::NotFound { .. })
        ));
        arena.remove_child(body, a).unwrap();
        assert!(arena.get(body).unwrap().children_ids.is_empty());
        assert_eq!(arena.get(a).unwrap().parent_id, None);
    }

    #[test]
    fn test_find_by_id_ignores_detached() {
        let (mut arena, body) = doc_with_body();
        let detached = arena.create_element("div").unwrap();
        arena.get_mut(detached).unwrap().set_attr("id", "x");
        assert_eq!(arena.find_by_id("x"), None);

        arena.append_child(body, detached).unwrap();
        assert_eq!(arena.find_by_id("x"), Some(detached));
        assert!(arena.is_connected(detached));
    }

    #[test]
    fn test_clone_subtree_deep() {
        let (mut arena, body) = doc_with_body();
        let div = arena.create_element("div").unwrap();
        arena.get_mut(div).unwrap().set_attr("class", "card");
        let text = arena.create_text("hi");
        arena.append_child(div, text).unwrap();
        arena.append_child(body, div).unwrap();

        let copy = arena.clone_subtree(div, true).unwrap();
        let node = arena.get(copy).unwrap();
        assert_eq!(node.parent_id, None);
        assert_eq!(node.attr("class"), Some("card"));
        assert_eq!(arena.text_content(copy).unwrap(), "hi");
        assert_ne!(node.children_ids[0], text);

        let shallow = arena.clone_subtree(div, false).unwrap();
        assert!(arena.get(shallow).unwrap().children_ids.is_empty());
    }

    #[test]
    fn test_set_inner_text_line_breaks() {
        let (mut arena, body) = doc_with_body();
        let p = arena.create_element("p").unwrap();
        arena.append_child(body, p).unwrap();
        arena.set_inner_text(p, "one\ntwo").unwrap();

        let names: Vec<_> = arena
            .children(p)
            .unwrap()
            .iter()
            .map(|n| n.node_name.clone())
            .collect();
        assert_eq!(names, vec!["#text", "br", "#text"]);
        assert_eq!(arena.text_content(p).unwrap(), "onetwo");
    }
}
