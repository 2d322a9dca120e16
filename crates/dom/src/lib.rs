//! Host document tree
//!
//! Arena-backed document storage plus the host services a DOM facade
//! leans on: markup parsing and serialization, selector queries, inline and
//! computed style, and form entry lists.
//!
//! ## Core Design
//!
//! ```text
//! markup → html5ever RcDom → DomArena (owned) → queries / mutations → markup
//!                                 ↓
//!                           NodeId (u32)
//! ```

pub mod arena;
pub mod error;
pub mod forms;
pub mod markup;
pub mod selector;
pub mod serializer;
pub mod style;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use error::{DomError, Result};
pub use selector::SelectorList;
pub use serializer::DomSerializer;
pub use style::{InlineStyle, StyleResolver};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_serialize() {
        let mut arena = markup::parse_document("<main><p class='x'>hi</p></main>");
        let p = selector::select(&arena, "main > p.x").unwrap().unwrap();
        arena.get_mut(p).unwrap().set_attr("id", "greeting");

        let main = arena.find_by_tag("main")[0];
        let html = DomSerializer::new().inner_html(&arena, main).unwrap();
        assert_eq!(html, "<p class=\"x\" id=\"greeting\">hi</p>");
    }
}
