//! Host runtime for an owned document
//!
//! Everything a DOM facade expects from a browser, minus rendering and
//! script execution: a shared document, listener registration and bubbling
//! dispatch, a host event bus, and XHR/fetch style networking.
//!
//! # Layout
//!
//! 1. **Document**: one `DomArena` behind a `parking_lot::RwLock`, cloned by handle
//! 2. **Events**: listeners live outside the arena, keyed by node and event type
//! 3. **Net**: a `Transport` trait so requests can be served in memory
//! 4. **Window**: ties the three together under one `WindowConfig`

pub mod document;
pub mod events;
pub mod net;
pub mod window;

pub use document::Document;
pub use events::{Event, EventBus, EventHandler, EventRegistry, HostEvent};
pub use net::{MemoryTransport, NetError, ReqwestTransport, Transport};
pub use window::{Window, WindowConfig};
