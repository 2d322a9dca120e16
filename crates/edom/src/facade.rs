//! The `Edom` facade
//!
//! Each method is one host call. The document lock is taken per call and
//! released before any host reaction (script loading) or user callback runs.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use tokio::task::JoinHandle;

use browser::net::{ErrorEvent, XhrResponse};
use browser::{Document, Event, EventHandler, Transport, Window, WindowConfig};
use dom::arena::validate_name;
use dom::markup;
use dom::{
    forms, validate_class_token, DomArena, DomError, DomNode, DomSerializer, InlineStyle, NodeId,
};

use crate::error::{EdomError, Result};
use crate::target::{Animation, ClassNames, ElementRef, Nodes, Target};

/// DOM helpers over one window
#[derive(Clone, Debug)]
pub struct Edom {
    window: Window,
}

impl Edom {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    /// Window over an HTTP transport, with `html` as its document
    pub fn from_html(config: WindowConfig, html: &str) -> Result<Self> {
        let window = Window::new(config)?.with_document(Document::parse(html));
        Ok(Self::new(window))
    }

    pub fn with_transport(config: WindowConfig, transport: Arc<dyn Transport>) -> Self {
        Self::new(Window::with_transport(config, transport))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn document(&self) -> &Document {
        self.window.document()
    }

    pub fn body(&self) -> Option<ElementRef> {
        self.document().body().map(ElementRef::from_node_id)
    }

    pub fn document_element(&self) -> Option<ElementRef> {
        self.document()
            .document_element()
            .map(ElementRef::from_node_id)
    }

    // ---- creation and lookup ----

    /// New unattached element
    pub fn create(&self, tag: &str) -> Result<ElementRef> {
        let id = self.document().write().create_element(tag)?;
        Ok(ElementRef::from_node_id(id))
    }

    pub fn create_many<I, S>(&self, tags: I) -> Result<Vec<ElementRef>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter().map(|tag| self.create(tag.as_ref())).collect()
    }

    /// First connected element whose `id` attribute equals `id`
    pub fn find(&self, id: &str) -> Option<ElementRef> {
        self.document()
            .read()
            .find_by_id(id)
            .map(ElementRef::from_node_id)
    }

    pub fn select(&self, selector: &str) -> Result<Option<ElementRef>> {
        Ok(self
            .document()
            .query(selector)?
            .map(ElementRef::from_node_id))
    }

    pub fn select_all(&self, selector: &str) -> Result<Vec<ElementRef>> {
        Ok(self
            .document()
            .query_all(selector)?
            .into_iter()
            .map(ElementRef::from_node_id)
            .collect())
    }

    // ---- attributes and style ----

    /// Set each attribute in iteration order; later duplicates win
    pub fn add_attr<I, K, V>(&self, el: ElementRef, attrs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut arena = self.document().write();
        let node = element_mut(&mut arena, el)?;
        for (name, value) in attrs {
            let name = name.as_ref();
            validate_name(name)?;
            node.set_attr(&name.to_ascii_lowercase(), value.as_ref());
        }
        Ok(())
    }

    pub fn attr(&self, el: ElementRef, name: &str) -> Result<Option<String>> {
        let arena = self.document().read();
        let node = element(&arena, el)?;
        Ok(node.attr(&name.to_ascii_lowercase()).map(str::to_string))
    }

    /// Set inline style properties. CSS and camelCase names are equivalent;
    /// an empty value removes the property.
    pub fn add_css<I, K, V>(&self, el: ElementRef, styles: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut arena = self.document().write();
        let node = element_mut(&mut arena, el)?;
        let mut style = InlineStyle::of(node);
        for (property, value) in styles {
            style.set(property.as_ref(), value.as_ref());
        }
        style.write_to(node);
        tracing::debug!("Inline style of {} is now {:?}", el, node.attr("style"));
        Ok(())
    }

    /// Inline style value only; `""` when unset
    pub fn get_css(&self, el: ElementRef, property: &str) -> Result<String> {
        let arena = self.document().read();
        let node = element(&arena, el)?;
        Ok(InlineStyle::of(node)
            .get(property)
            .unwrap_or_default()
            .to_string())
    }

    /// Value resolved by the host style service
    pub fn get_computed_css(&self, el: ElementRef, property: &str) -> Result<String> {
        self.ensure_element(el)?;
        Ok(self.document().computed_style(el.node_id(), property)?)
    }

    // ---- classes ----

    pub fn add_class(&self, el: ElementRef, names: impl ClassNames) -> Result<()> {
        let names = checked_class_names(names)?;
        let mut arena = self.document().write();
        element_mut(&mut arena, el)?.add_classes(names.iter().map(String::as_str));
        Ok(())
    }

    pub fn remove_class(&self, el: ElementRef, names: impl ClassNames) -> Result<()> {
        let names = checked_class_names(names)?;
        let mut arena = self.document().write();
        element_mut(&mut arena, el)?.remove_classes(names.iter().map(String::as_str));
        Ok(())
    }

    /// Flip one class, returning whether it is now present
    pub fn toggle_class(&self, el: ElementRef, name: &str) -> Result<bool> {
        validate_class_token(name)?;
        let mut arena = self.document().write();
        Ok(element_mut(&mut arena, el)?.toggle_class(name))
    }

    pub fn contains_class(&self, el: ElementRef, name: &str) -> Result<bool> {
        let arena = self.document().read();
        Ok(element(&arena, el)?.has_class(name))
    }

    // ---- content ----

    /// Replace the children of each element with `text`; line feeds become `<br>`
    pub fn write(&self, nodes: impl Nodes, text: &str) -> Result<()> {
        let mut arena = self.document().write();
        for el in nodes.into_nodes() {
            element(&arena, el)?;
            arena.set_inner_text(el.node_id(), text)?;
        }
        Ok(())
    }

    /// Replace the children with parsed markup. Scripts in the markup stay inert.
    pub fn set_html(&self, el: ElementRef, html: &str) -> Result<()> {
        let mut arena = self.document().write();
        element(&arena, el)?;
        let nodes = markup::parse_fragment(&mut arena, html);
        arena.replace_children(el.node_id(), &nodes)?;
        tracing::debug!(
            "Set markup of {} to {} top-level node(s): {}",
            el,
            nodes.len(),
            dom::utils::cap_text_length(html, 60)
        );
        Ok(())
    }

    /// Serialize, concatenate and reparse; existing child handles are detached
    pub fn add_html(&self, el: ElementRef, html: &str) -> Result<()> {
        let mut markup = self.html(el)?;
        markup.push_str(html);
        self.set_html(el, &markup)
    }

    pub fn html(&self, el: ElementRef) -> Result<String> {
        let arena = self.document().read();
        element(&arena, el)?;
        Ok(DomSerializer::new().inner_html(&arena, el.node_id())?)
    }

    pub fn outer_html(&self, el: ElementRef) -> Result<String> {
        let arena = self.document().read();
        element(&arena, el)?;
        Ok(DomSerializer::new().outer_html(&arena, el.node_id())?)
    }

    pub fn text(&self, el: ElementRef) -> Result<String> {
        let arena = self.document().read();
        element(&arena, el)?;
        Ok(arena.text_content(el.node_id())?)
    }

    // ---- tree mutation ----

    /// Append one child or a sequence of children, in order, after the
    /// parent's existing children
    pub fn append(&self, children: impl Nodes, parent: ElementRef) -> Result<()> {
        let children = children.into_nodes();
        let mut inserted = Vec::with_capacity(children.len());
        let outcome = self.append_children(&children, parent, &mut inserted);
        // Children placed before a failure stay in the tree, as in the host
        self.window.nodes_inserted(&inserted);
        outcome
    }

    fn append_children(
        &self,
        children: &[ElementRef],
        parent: ElementRef,
        inserted: &mut Vec<NodeId>,
    ) -> Result<()> {
        let mut arena = self.document().write();
        element(&arena, parent)?;
        for child in children {
            arena.append_child(parent.node_id(), child.node_id())?;
            inserted.push(child.node_id());
        }
        Ok(())
    }

    /// Insert `new` as the previous sibling of `reference`
    pub fn insert_before(&self, reference: ElementRef, new: ElementRef) -> Result<()> {
        {
            let mut arena = self.document().write();
            let parent = parent_of(&arena, reference)?;
            arena.insert_before(parent, new.node_id(), Some(reference.node_id()))?;
        }
        self.window.nodes_inserted(&[new.node_id()]);
        Ok(())
    }

    /// Insert `new` as the next sibling of `reference`
    pub fn insert_after(&self, reference: ElementRef, new: ElementRef) -> Result<()> {
        {
            let mut arena = self.document().write();
            let parent = parent_of(&arena, reference)?;
            let next = arena.next_sibling(reference.node_id())?;
            arena.insert_before(parent, new.node_id(), next)?;
        }
        self.window.nodes_inserted(&[new.node_id()]);
        Ok(())
    }

    /// Deep-clone `el` `count` times, each clone right after the previous one.
    /// Listeners are not cloned. Without a parent nothing happens.
    pub fn multiply(&self, el: ElementRef, count: usize) -> Result<Vec<ElementRef>> {
        let clones = {
            let mut arena = self.document().write();
            element(&arena, el)?;
            let Some(parent) = arena.get(el.node_id())?.parent_id else {
                return Ok(Vec::new());
            };

            let mut clones = Vec::with_capacity(count);
            let mut previous = el.node_id();
            for _ in 0..count {
                let copy = arena.clone_subtree(el.node_id(), true)?;
                let next = arena.next_sibling(previous)?;
                arena.insert_before(parent, copy, next)?;
                clones.push(copy);
                previous = copy;
            }
            clones
        };
        self.window.nodes_inserted(&clones);
        Ok(clones.into_iter().map(ElementRef::from_node_id).collect())
    }

    // ---- style helpers ----

    /// `transform: rotate(<degrees>deg)`
    pub fn rotate(&self, el: ElementRef, degrees: impl Display) -> Result<()> {
        self.add_css(el, [("transform", format!("rotate({degrees}deg)"))])
    }

    pub fn apply_animation(&self, el: ElementRef, animation: &Animation) -> Result<()> {
        self.add_css(
            el,
            [
                ("animationName", animation.name.as_str()),
                ("animationDuration", animation.duration.as_str()),
                ("animationTimingFunction", animation.timing_function.as_str()),
            ],
        )
    }

    /// Append a `<script src>` to the body; the host fetches it in the
    /// background and nothing is reported back
    pub fn load_script(&self, src: &str) -> Result<ElementRef> {
        let body = self.body().ok_or(DomError::HierarchyRequest(
            "document has no body".to_string(),
        ))?;
        let script = self.create("script")?;
        self.add_attr(script, [("src", src)])?;
        self.append(script, body)?;
        Ok(script)
    }

    // ---- events ----

    /// Register `handler`. A selector resolves to its first match; no match
    /// is a silent no-op.
    pub fn add_event(
        &self,
        target: impl Into<Target>,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<()> {
        if let Some(el) = self.resolve_target(target.into())? {
            self.window
                .registry()
                .add(el.node_id(), event_type, handler.clone());
        }
        Ok(())
    }

    /// Unregister `handler`, matched by identity
    pub fn remove_event(
        &self,
        target: impl Into<Target>,
        event_type: &str,
        handler: &EventHandler,
    ) -> Result<()> {
        if let Some(el) = self.resolve_target(target.into())? {
            self.window
                .registry()
                .remove(el.node_id(), event_type, handler);
        }
        Ok(())
    }

    /// Fire a bubbling event at `el`
    pub fn dispatch(&self, el: ElementRef, event_type: &str) -> Result<Event> {
        self.ensure_element(el)?;
        Ok(self.window.dispatch(el.node_id(), event_type)?)
    }

    fn resolve_target(&self, target: Target) -> Result<Option<ElementRef>> {
        match target {
            Target::Handle(el) => {
                self.ensure_element(el)?;
                Ok(Some(el))
            }
            Target::Selector(selector) => self.select(&selector),
        }
    }

    // ---- network ----

    /// GET `url`; `callback` runs once with the body, only for status 200
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, as `tokio::spawn` does.
    pub fn ajax_get<F>(&self, url: &str, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.window.xhr().get(url, callback)
    }

    /// POST `payload` as JSON with `authorization: bearer <token>`.
    /// Exactly one callback runs.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, as `tokio::spawn` does.
    pub fn ajax_post<P, S, E>(
        &self,
        url: &str,
        token: &str,
        payload: &P,
        on_success: S,
        on_error: E,
    ) -> JoinHandle<()>
    where
        P: Serialize + ?Sized,
        S: FnOnce(XhrResponse) + Send + 'static,
        E: FnOnce(ErrorEvent) + Send + 'static,
    {
        self.window
            .xhr()
            .post(url, token, payload, on_success, on_error)
    }

    /// Parsed JSON body, or `None` after logging the failure
    pub async fn fetch_get(&self, url: &str) -> Option<Value> {
        self.window.fetch_get(url).await
    }

    // ---- forms ----

    /// Field name to value; the last value wins for repeated names
    pub fn serialize_form(&self, form: ElementRef) -> Result<BTreeMap<String, String>> {
        let arena = self.document().read();
        element(&arena, form)?;
        let entries = forms::form_entries(&arena, form.node_id())?;
        Ok(entries.into_iter().collect())
    }

    fn ensure_element(&self, el: ElementRef) -> Result<()> {
        element(&self.document().read(), el).map(|_| ())
    }
}

fn element(arena: &DomArena, el: ElementRef) -> Result<&DomNode> {
    let node = arena.get(el.node_id())?;
    if !node.is_element() {
        return Err(EdomError::NotAnElement(el.node_id()));
    }
    Ok(node)
}

fn element_mut(arena: &mut DomArena, el: ElementRef) -> Result<&mut DomNode> {
    let node = arena.get_mut(el.node_id())?;
    if !node.is_element() {
        return Err(EdomError::NotAnElement(el.node_id()));
    }
    Ok(node)
}

fn parent_of(arena: &DomArena, el: ElementRef) -> Result<NodeId> {
    element(arena, el)?
        .parent_id
        .ok_or(EdomError::Dom(DomError::NoParent(el.node_id())))
}

fn checked_class_names(names: impl ClassNames) -> Result<Vec<String>> {
    let names = names.into_names();
    for name in &names {
        validate_class_token(name)?;
    }
    Ok(names)
}
