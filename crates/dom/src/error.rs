//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. Names follow the host exceptions they stand in for.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Reference node {reference} is not a child of {parent}")]
    NotFound { parent: u32, reference: u32 },

    #[error("Node {0} has no parent")]
    NoParent(u32),

    #[error("Invalid character in name: {0:?}")]
    InvalidCharacter(String),

    #[error("Selector syntax error: {0}")]
    Syntax(String),
}
