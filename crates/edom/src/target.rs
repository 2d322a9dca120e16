//! Argument types accepted by the facade

use serde::{Deserialize, Serialize};
use std::fmt;

use dom::NodeId;

/// Non-owning handle to an element in the window's document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementRef(NodeId);

impl ElementRef {
    /// Wrap a node id from the host runtime. Whether it names an element is
    /// checked when the handle is used.
    pub fn from_node_id(node_id: NodeId) -> Self {
        Self(node_id)
    }

    pub fn node_id(self) -> NodeId {
        self.0
    }
}

impl From<ElementRef> for NodeId {
    fn from(el: ElementRef) -> Self {
        el.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Where an event listener goes: a resolved handle, or a selector looked up
/// once when the call is made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Handle(ElementRef),
    Selector(String),
}

impl From<ElementRef> for Target {
    fn from(el: ElementRef) -> Self {
        Target::Handle(el)
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

/// One class name or a sequence of them
pub trait ClassNames {
    fn into_names(self) -> Vec<String>;
}

impl ClassNames for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl ClassNames for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl ClassNames for &String {
    fn into_names(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<S: AsRef<str>> ClassNames for &[S] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> ClassNames for [S; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> ClassNames for Vec<S> {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

/// One element or a sequence of elements
pub trait Nodes {
    fn into_nodes(self) -> Vec<ElementRef>;
}

impl Nodes for ElementRef {
    fn into_nodes(self) -> Vec<ElementRef> {
        vec![self]
    }
}

impl Nodes for &[ElementRef] {
    fn into_nodes(self) -> Vec<ElementRef> {
        self.to_vec()
    }
}

impl<const N: usize> Nodes for [ElementRef; N] {
    fn into_nodes(self) -> Vec<ElementRef> {
        self.to_vec()
    }
}

impl Nodes for Vec<ElementRef> {
    fn into_nodes(self) -> Vec<ElementRef> {
        self
    }
}

impl Nodes for &Vec<ElementRef> {
    fn into_nodes(self) -> Vec<ElementRef> {
        self.clone()
    }
}

/// CSS animation descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    pub name: String,
    pub duration: String,
    pub timing_function: String,
}

impl Animation {
    pub fn new(
        name: impl Into<String>,
        duration: impl Into<String>,
        timing_function: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            duration: duration.into(),
            timing_function: timing_function.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names_shapes() {
        assert_eq!("a".into_names(), vec!["a"]);
        assert_eq!(["a", "b"].into_names(), vec!["a", "b"]);
        assert_eq!(vec!["x".to_string()].into_names(), vec!["x"]);
        let names = ["p", "q"];
        assert_eq!(names[..].into_names(), vec!["p", "q"]);
    }

    #[test]
    fn test_target_from() {
        let el = ElementRef::from_node_id(3);
        assert_eq!(Target::from(el), Target::Handle(el));
        assert_eq!(Target::from("#id"), Target::Selector("#id".into()));
    }

    #[test]
    fn test_animation_from_json() {
        let anim: Animation = serde_json::from_str(
            r#"{ "name": "spin", "duration": "2s", "timingFunction": "linear" }"#,
        )
        .unwrap();
        assert_eq!(anim, Animation::new("spin", "2s", "linear"));
    }
}
