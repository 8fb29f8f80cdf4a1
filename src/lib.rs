#![forbid(unsafe_code)]
//! An XML document tree with XInclude and XPointer resolution.
//!
//! All nodes live in a [`Dom`]. Documents are parsed with a [`Builder`],
//! and include directives in them are resolved by an [`XIncluder`], which
//! loads referenced resources through a [`Fetch`] implementation.

mod access;
mod config;
mod creation;
mod dom;
mod encoding;
mod entity;
mod error;
mod fetch;
mod idmap;
mod inherited;
mod iri;
mod manipulation;
mod nameaccess;
mod names;
mod parse;
mod serialize;
mod sniff;
mod value;
mod valueaccess;
mod xinclude;
mod xpointer;

pub use access::NodeEdge;
pub use config::Config;
pub use dom::{Dom, Node, XML_NAMESPACE};
pub use encoding::{decode, is_supported};
pub use error::Error;
pub use fetch::{Fetch, FileFetcher, MemoryFetcher, Request, Resource};
pub use iri::iri_to_uri;
pub use names::{ExpandedName, NameId, NamespaceId, PrefixId};
pub use parse::{Builder, XmlBuilder};
pub use sniff::sniff;
pub use value::{
    Attributes, Comment, Doctype, Document, Element, Prefixes, ProcessingInstruction, Text, Value,
    ValueType,
};
pub use xinclude::{ErrorCategory, ErrorKind, XIncludeError, XIncluder, XINCLUDE_NAMESPACE};
pub use xpointer::{resolve_pointer, XPointerError};
