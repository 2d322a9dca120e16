//! Shared document handle
//!
//! The arena is owned by one `RwLock` and handed out by clone. Callers hold a
//! guard for one query or mutation at a time and must drop it before running
//! user code.

use std::sync::Arc;

use dom::markup::{self, BLANK_DOCUMENT};
use dom::{DomArena, DomSerializer, NodeId, Result, SelectorList, StyleResolver};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone)]
pub struct Document {
    arena: Arc<RwLock<DomArena>>,
}

impl Document {
    /// Empty `html`/`head`/`body` document
    pub fn new() -> Self {
        Self::parse(BLANK_DOCUMENT)
    }

    pub fn parse(html: &str) -> Self {
        Self::from_arena(markup::parse_document(html))
    }

    pub fn from_arena(arena: DomArena) -> Self {
        Self {
            arena: Arc::new(RwLock::new(arena)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, DomArena> {
        self.arena.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, DomArena> {
        self.arena.write()
    }

    pub fn body(&self) -> Option<NodeId> {
        self.read().document_child("body")
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.read().document_element()
    }

    /// First connected element matching `selector`, in tree order
    pub fn query(&self, selector: &str) -> Result<Option<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let arena = self.read();
        match arena.root_id() {
            Some(root) => list.query_first(&arena, root),
            None => Ok(None),
        }
    }

    /// All connected elements matching `selector`, in tree order
    pub fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        let arena = self.read();
        match arena.root_id() {
            Some(root) => list.query_all(&arena, root),
            None => Ok(Vec::new()),
        }
    }

    /// Computed value of `property`. Detached elements resolve to `""`.
    pub fn computed_style(&self, node_id: NodeId, property: &str) -> Result<String> {
        let arena = self.read();
        arena.element(node_id)?;
        // Sheets are re-read per call so edits to <style> text apply at once
        let resolver = StyleResolver::from_document(&arena);
        Ok(resolver.compute(&arena, node_id, property))
    }

    /// XPath of a node, for identifying it in logs
    pub fn xpath(&self, node_id: NodeId) -> Result<String> {
        DomSerializer::new().generate_xpath(&self.read(), node_id)
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> Result<String> {
        DomSerializer::new().serialize(&self.read())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_document() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        let html = doc.document_element().unwrap();
        assert_eq!(doc.read().get(body).unwrap().parent_id, Some(html));
        assert!(doc.to_html().unwrap().starts_with("<!DOCTYPE html><html>"));
    }

    #[test]
    fn test_clones_share_the_arena() {
        let doc = Document::new();
        let other = doc.clone();
        let body = doc.body().unwrap();
        {
            let mut arena = other.write();
            let div = arena.create_element("div").unwrap();
            arena.append_child(body, div).unwrap();
        }
        assert_eq!(doc.query_all("body > div").unwrap().len(), 1);
    }

    #[test]
    fn test_query_ignores_detached_nodes() {
        let doc = Document::parse("<p class='a'></p>");
        doc.write().create_element("p").unwrap();
        assert_eq!(doc.query_all("p").unwrap().len(), 1);
        assert!(doc.query("section").unwrap().is_none());
        assert!(doc.query("p[").is_err());
    }

    #[test]
    fn test_xpath() {
        let doc = Document::parse("<p></p><p><b></b></p>");
        let b = doc.query("b").unwrap().unwrap();
        assert_eq!(doc.xpath(b).unwrap(), "/html[1]/body[1]/p[2]/b[1]");
    }

    #[test]
    fn test_computed_style() {
        let doc = Document::parse(
            "<style>.box { color: red } #one { color: blue }</style>\
             <div class='box' id='one'><span>x</span></div>",
        );
        let span = doc.query("span").unwrap().unwrap();
        assert_eq!(doc.computed_style(span, "color").unwrap(), "blue");

        let detached = doc.write().create_element("div").unwrap();
        assert_eq!(doc.computed_style(detached, "display").unwrap(), "");
    }
}
