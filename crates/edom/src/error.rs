//! Facade errors
//!
//! Host failures pass through untranslated; the facade adds only what it
//! checks itself.

use thiserror::Error;

use browser::NetError;
use dom::{DomError, NodeId};

pub type Result<T> = std::result::Result<T, EdomError>;

#[derive(Debug, Error)]
pub enum EdomError {
    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),
}
