//! edom - DOM utility helpers
//!
//! A flat set of helpers over a host document: create and find elements,
//! set attributes, classes and inline style, write text and markup, move
//! nodes around, bind listeners, and issue simple JSON requests.
//!
//! ```no_run
//! use edom::{Edom, WindowConfig};
//!
//! # fn main() -> edom::Result<()> {
//! let edom = Edom::from_html(WindowConfig::default(), "<ul id='list'></ul>")?;
//! let list = edom.find("list").expect("list exists");
//! let item = edom.create("li")?;
//! edom.write(item, "first")?;
//! edom.add_class(item, ["item", "new"])?;
//! edom.append(item, list)?;
//! # Ok(())
//! # }
//! ```
//!
//! The host runtime underneath is the `browser` crate (window, events,
//! network) over the `dom` crate (tree, markup, selectors, style, forms).

pub mod error;
pub mod facade;
pub mod target;

pub use browser::net::{ErrorEvent, XhrResponse};
pub use browser::{Event, EventHandler, MemoryTransport, Window, WindowConfig};
pub use error::{EdomError, Result};
pub use facade::Edom;
pub use target::{Animation, ClassNames, ElementRef, Nodes, Target};
