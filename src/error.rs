use crate::dom::Node;

/// Errors raised by tree construction, manipulation and serialization.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operation only applies to a document root.
    #[error("node is not a document root: {0:?}")]
    NotRoot(Node),
    /// Operation only applies to an element.
    #[error("node is not an element: {0:?}")]
    NotElement(Node),
    /// The change would break the shape of the tree, e.g. a second
    /// document element.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("comment cannot contain '--': {0}")]
    InvalidComment(String),
    /// `&` without closing `;`.
    #[error("unclosed entity reference: &{0}")]
    UnclosedEntity(String),
    /// Entity other than the predefined ones or a character reference.
    #[error("unknown entity: &{0};")]
    InvalidEntity(String),
    #[error("unknown namespace prefix: {0}")]
    UnknownPrefix(String),
    #[error("no prefix declared for namespace: {0}")]
    NoPrefixForNamespace(String),
    /// Element in no namespace under a default namespace that isn't
    /// undeclared with `xmlns=""`.
    #[error("element '{0}' is in no namespace but the default namespace is {1}")]
    DefaultNamespaceInScope(String, String),
    #[error("duplicate attribute: {0}")]
    DuplicateAttribute(String),
    /// Close tag doesn't match the open tag.
    #[error("close tag '{1}' doesn't match open tag '{0}'")]
    InvalidCloseTag(String, String),
    #[error("unclosed tag")]
    UnclosedTag,
    /// Input has no document element, or more than one.
    #[error("document must have exactly one document element")]
    DocumentElement,
    /// Text found outside the document element.
    #[error("text is not allowed outside the document element")]
    TextOutsideDocumentElement,
    /// Low level tree operation failed, e.g. inserting a node under itself.
    #[error("tree operation failed: {0}")]
    Tree(#[from] indextree::NodeError),
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("invalid base URI: {0}")]
    InvalidUri(#[from] url::ParseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML syntax error: {0}")]
    Parser(#[from] xmlparser::Error),
}
