use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::error::Error;
use crate::xpointer::XPointerError;

/// How a failure is handled by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A malformed include. Never masked by a fallback.
    Syntax,
    /// The included resource couldn't be obtained or selected. A fallback
    /// replaces the include instead, if there is one.
    Recoverable,
    /// Splicing would break the document, e.g. leave it with two document
    /// elements. Never masked by a fallback.
    Structural,
    /// A fetched XML resource isn't well-formed. Never masked by a
    /// fallback.
    Parse,
}

/// The specific reason an include failed.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("fallback element outside of an include element")]
    MisplacedFallback,
    #[error("include element has more than one fallback child")]
    MultipleFallbacks,
    #[error("include element has an illegal child '{0}' in the XInclude namespace")]
    IllegalChild(String),
    #[error("include element has neither href nor xpointer")]
    NoIncludeLocation,
    #[error("illegal parse attribute '{0}', expected 'xml' or 'text'")]
    BadParseAttribute(String),
    #[error("href '{0}' has a fragment identifier; use xpointer instead")]
    BadHrefAttribute(String),
    #[error("{0} attribute contains characters that can't be sent in an HTTP header")]
    BadHttpHeader(&'static str),
    #[error("xpointer can't be used with parse=\"text\"")]
    XPointerWithText,
    #[error("could not fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot resolve href '{href}'")]
    InvalidHref {
        href: String,
        #[source]
        source: url::ParseError,
    },
    #[error("relative href '{0}' in a document without base URI")]
    NoBaseUri(String),
    #[error("unsupported encoding '{0}'")]
    UnsupportedEncoding(String),
    #[error(transparent)]
    XPointer(#[from] XPointerError),
    #[error("circular inclusion of {0}")]
    CircularInclude(String),
    #[error("{0}")]
    Structural(String),
    #[error("included document {url} is not well-formed")]
    Parse {
        url: String,
        #[source]
        source: Error,
    },
    #[error("tree operation failed")]
    Tree(#[source] Error),
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::MisplacedFallback
            | ErrorKind::MultipleFallbacks
            | ErrorKind::IllegalChild(_)
            | ErrorKind::NoIncludeLocation
            | ErrorKind::BadParseAttribute(_)
            | ErrorKind::BadHrefAttribute(_)
            | ErrorKind::BadHttpHeader(_)
            | ErrorKind::XPointerWithText => ErrorCategory::Syntax,
            ErrorKind::Fetch { .. }
            | ErrorKind::InvalidHref { .. }
            | ErrorKind::NoBaseUri(_)
            | ErrorKind::UnsupportedEncoding(_)
            | ErrorKind::XPointer(_)
            | ErrorKind::CircularInclude(_) => ErrorCategory::Recoverable,
            ErrorKind::Structural(_) | ErrorKind::Tree(_) => ErrorCategory::Structural,
            ErrorKind::Parse { .. } => ErrorCategory::Parse,
        }
    }
}

impl From<Error> for ErrorKind {
    fn from(error: Error) -> Self {
        ErrorKind::Tree(error)
    }
}

/// An include failure, with the URI of the document it happened in.
#[derive(Debug)]
pub struct XIncludeError {
    kind: ErrorKind,
    uri: Option<String>,
}

impl XIncludeError {
    pub(crate) fn new(kind: ErrorKind, uri: Option<String>) -> Self {
        XIncludeError { kind, uri }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// URI of the document containing the failing include, if known.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub fn is_recoverable(&self) -> bool {
        self.category() == ErrorCategory::Recoverable
    }
}

impl fmt::Display for XIncludeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.uri {
            Some(uri) => write!(f, "XInclude error in {}: {}", uri, self.kind),
            None => write!(f, "XInclude error: {}", self.kind),
        }
    }
}

impl StdError for XIncludeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_document() {
        let error = XIncludeError::new(
            ErrorKind::CircularInclude("file:///a.xml".to_string()),
            Some("file:///b.xml".to_string()),
        );
        assert_eq!(
            error.to_string(),
            "XInclude error in file:///b.xml: circular inclusion of file:///a.xml"
        );
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_source_chain() {
        let error = XIncludeError::new(
            ErrorKind::Fetch {
                url: "file:///missing.xml".to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "gone"),
            },
            None,
        );
        let kind = error.source().unwrap();
        assert_eq!(kind.to_string(), "could not fetch file:///missing.xml");
        assert_eq!(kind.source().unwrap().to_string(), "gone");
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ErrorKind::MisplacedFallback.category(),
            ErrorCategory::Syntax
        );
        assert_eq!(
            ErrorKind::Structural("two elements".into()).category(),
            ErrorCategory::Structural
        );
        assert_eq!(
            ErrorKind::XPointer(XPointerError::Resource("x".into())).category(),
            ErrorCategory::Recoverable
        );
    }
}
