use thiserror::Error;

/// Result type for document tree operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Errors raised by tree mutations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// Node id does not belong to this document
    #[error("Unknown node: {0}")]
    UnknownNode(usize),

    /// Only elements can have children or attributes
    #[error("Node {0} is not an element")]
    NotAnElement(usize),

    /// Text operation on a non-text node
    #[error("Node {0} is not a text node")]
    NotText(usize),

    /// Markup operation on a non-raw node
    #[error("Node {0} is not a raw markup node")]
    NotRaw(usize),

    /// Inserting the node would make it its own ancestor
    #[error("Hierarchy violation: node {node} cannot be placed under {parent}")]
    Hierarchy { node: usize, parent: usize },

    /// Operation needs a parent but the node is detached
    #[error("Node {0} has no parent")]
    Detached(usize),

    /// Reference node is not a child of the given parent
    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: usize, child: usize },
}
