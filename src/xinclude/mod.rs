//! XInclude processing.
//!
//! An [`XIncluder`] replaces every `xi:include` element in a document with
//! the content it refers to: a whole XML document, part of one selected by
//! an XPointer, or a text resource. Included XML documents are resolved
//! recursively before they're spliced in. Fetching goes through a [`Fetch`]
//! implementation and parsing through a [`Builder`], so the resolver itself
//! does no I/O of its own.
//!
//! ```rust
//! use xtree::{Dom, MemoryFetcher, XIncluder, XmlBuilder};
//!
//! let mut fetcher = MemoryFetcher::new();
//! fetcher.insert("http://example.com/greeting.xml", "<hello>world</hello>");
//! let builder = XmlBuilder::new();
//!
//! let mut dom = Dom::new();
//! let root = dom
//!     .parse_bytes(
//!         br#"<doc xmlns:xi="http://www.w3.org/2001/XInclude"><xi:include href="greeting.xml"/></doc>"#,
//!         Some("http://example.com/doc.xml"),
//!     )
//!     .unwrap();
//! let resolved = XIncluder::new(&builder, &fetcher).resolve(&mut dom, root).unwrap();
//! assert_eq!(
//!     dom.to_string(resolved).unwrap(),
//!     concat!(
//!         r#"<doc xmlns:xi="http://www.w3.org/2001/XInclude">"#,
//!         r#"<hello xml:base="http://example.com/greeting.xml">world</hello></doc>"#
//!     )
//! );
//! ```
mod directive;
mod error;

use std::io::Cursor;

use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::dom::{Dom, Node};
use crate::encoding::decode;
use crate::error::Error;
use crate::fetch::{Fetch, Request, Resource};
use crate::iri::iri_to_uri;
use crate::parse::Builder;
use crate::sniff::sniff;
use crate::value::Prefixes;
use crate::xpointer::resolve_pointer;

use directive::{is_fallback, is_include, Directive, ParseMode};

pub use directive::XINCLUDE_NAMESPACE;
pub use error::{ErrorCategory, ErrorKind, XIncludeError};

/// An entry of the inclusion stack: a document being resolved, and the
/// pointer that selects from it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    url: Option<Url>,
    xpointer: Option<String>,
}

/// Resolves include directives.
///
/// Each call to [`XIncluder::resolve`] or [`XIncluder::resolve_in_place`]
/// keeps its own inclusion stack, so an `XIncluder` can be reused.
pub struct XIncluder<'a> {
    builder: &'a dyn Builder,
    fetcher: &'a dyn Fetch,
    config: Config,
}

impl<'a> XIncluder<'a> {
    pub fn new(builder: &'a dyn Builder, fetcher: &'a dyn Fetch) -> Self {
        XIncluder {
            builder,
            fetcher,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Resolve a copy of `document`, leaving the original untouched.
    ///
    /// Returns the root of the resolved copy. On failure the copy is
    /// discarded.
    pub fn resolve(&self, dom: &mut Dom, document: Node) -> Result<Node, XIncludeError> {
        let copy = dom.clone_node(document);
        match self.resolve_in_place(dom, copy) {
            Ok(()) => Ok(copy),
            Err(err) => {
                // the copy is never attached, so this can't fail
                let _ = dom.discard(copy);
                Err(err)
            }
        }
    }

    /// Resolve `document` in place.
    ///
    /// When this fails the document may be left partially resolved: includes
    /// handled before the failing one stay replaced.
    pub fn resolve_in_place(&self, dom: &mut Dom, document: Node) -> Result<(), XIncludeError> {
        let url = self.document_url(dom, document);
        let element = dom
            .document_element(document)
            .map_err(|e| XIncludeError::new(e.into(), url.as_ref().map(Url::to_string)))?;
        let mut stack = vec![Frame {
            url,
            xpointer: None,
        }];
        self.resolve_element(dom, element, &mut stack)
    }

    fn resolve_element(
        &self,
        dom: &mut Dom,
        node: Node,
        stack: &mut Vec<Frame>,
    ) -> Result<(), XIncludeError> {
        if is_fallback(dom, node) {
            return Err(self.error(dom, node, ErrorKind::MisplacedFallback));
        }
        if is_include(dom, node) {
            return self.resolve_include(dom, node, stack);
        }
        let children = dom.element_children(node).collect::<Vec<_>>();
        for child in children {
            self.resolve_element(dom, child, stack)?;
        }
        Ok(())
    }

    fn resolve_include(
        &self,
        dom: &mut Dom,
        include: Node,
        stack: &mut Vec<Frame>,
    ) -> Result<(), XIncludeError> {
        let directive =
            Directive::read(dom, include).map_err(|kind| self.error(dom, include, kind))?;
        let err = match self.include(dom, include, &directive, stack) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        let Some(fallback) = directive.fallback.filter(|_| err.is_recoverable()) else {
            return Err(err);
        };
        debug!(error = %err, "include failed, using fallback");
        let children = dom.element_children(fallback).collect::<Vec<_>>();
        for child in children {
            self.resolve_element(dom, child, stack)?;
        }
        let replacement = dom.children(fallback).collect::<Vec<_>>();
        self.splice(dom, include, replacement)
    }

    /// Replace the include with the content it refers to.
    fn include(
        &self,
        dom: &mut Dom,
        include: Node,
        directive: &Directive,
        stack: &mut Vec<Frame>,
    ) -> Result<(), XIncludeError> {
        let Some(href) = &directive.href else {
            // a self reference; the directive guarantees an xpointer
            return self.include_self(dom, include, directive, stack);
        };
        let url = self.target_url(dom, include, href)?;
        match directive.parse {
            ParseMode::Xml => {
                let replacement = self.include_document(dom, include, directive, url, stack)?;
                self.splice(dom, include, replacement)
            }
            ParseMode::Text => {
                let replacement = self.include_text(dom, include, directive, url)?;
                self.splice(dom, include, replacement)
            }
        }
    }

    fn include_self(
        &self,
        dom: &mut Dom,
        include: Node,
        directive: &Directive,
        stack: &mut Vec<Frame>,
    ) -> Result<(), XIncludeError> {
        let xpointer = directive.xpointer.clone().unwrap_or_default();
        let document = dom.root(include);
        let frame = Frame {
            url: self.document_url(dom, document),
            xpointer: Some(xpointer.clone()),
        };
        if stack.contains(&frame) {
            return Err(self.error(dom, include, circular(&frame)));
        }
        let selected = resolve_pointer(dom, document, &xpointer)
            .map_err(|e| self.error(dom, include, e.into()))?;
        if selected
            .iter()
            .any(|node| dom.is_ancestor_or_self(*node, include))
        {
            return Err(self.error(dom, include, circular(&frame)));
        }
        // includes inside the selection are resolved where they are, so a
        // failure there still leaves this include to its fallback; a
        // selected include element can only be resolved once copied
        let in_place = selected
            .iter()
            .copied()
            .filter(|node| !is_include(dom, *node))
            .collect::<Vec<_>>();
        stack.push(frame.clone());
        let resolved = in_place
            .into_iter()
            .try_for_each(|node| self.resolve_element(dom, node, stack));
        stack.pop();
        resolved?;

        let replacement = selected
            .into_iter()
            .map(|node| self.copy_for_inclusion(dom, node, include))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|kind| self.error(dom, include, kind))?;
        let copied_includes = replacement
            .iter()
            .copied()
            .filter(|node| is_include(dom, *node))
            .collect::<Vec<_>>();
        self.splice(dom, include, replacement)?;

        stack.push(frame);
        let result = copied_includes
            .into_iter()
            .try_for_each(|node| self.resolve_element(dom, node, stack));
        stack.pop();
        result
    }

    fn include_document(
        &self,
        dom: &mut Dom,
        include: Node,
        directive: &Directive,
        url: Url,
        stack: &mut Vec<Frame>,
    ) -> Result<Vec<Node>, XIncludeError> {
        let frame = Frame {
            url: Some(url.clone()),
            xpointer: directive.xpointer.clone(),
        };
        // only the document is checked for the plain case, as including the
        // same document again with a pointer selects something smaller
        if stack.contains(&frame) {
            return Err(self.error(dom, include, circular(&frame)));
        }
        let resource = self.fetch(dom, include, directive, &url)?;
        let bytes = resource
            .into_bytes()
            .map_err(|e| self.error(dom, include, fetch_error(&url, e)))?;
        let document = self
            .builder
            .build(dom, &bytes, Some(url.as_str()))
            .map_err(|e| {
                let kind = match e {
                    Error::UnsupportedEncoding(label) => ErrorKind::UnsupportedEncoding(label),
                    e => ErrorKind::Parse {
                        url: url.to_string(),
                        source: e,
                    },
                };
                self.error(dom, include, kind)
            })?;
        debug!(url = %url, "entering included document");
        let result = self.select_from_document(dom, include, directive, document, frame, stack);
        debug!(url = %url, "leaving included document");
        // the transient document has been copied from, so drop it
        let _ = dom.discard(document);
        result
    }

    fn select_from_document(
        &self,
        dom: &mut Dom,
        include: Node,
        directive: &Directive,
        document: Node,
        frame: Frame,
        stack: &mut Vec<Frame>,
    ) -> Result<Vec<Node>, XIncludeError> {
        stack.push(frame);
        let resolved = self.resolve_in_stack(dom, document, stack);
        stack.pop();
        resolved?;

        let selected = match &directive.xpointer {
            Some(xpointer) => resolve_pointer(dom, document, xpointer)
                .map_err(|e| self.error(dom, include, e.into()))?,
            None => dom
                .children(document)
                .filter(|node| !dom.is_doctype(*node))
                .collect(),
        };
        selected
            .into_iter()
            .map(|node| self.copy_for_inclusion(dom, node, include))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|kind| self.error(dom, include, kind))
    }

    fn resolve_in_stack(
        &self,
        dom: &mut Dom,
        document: Node,
        stack: &mut Vec<Frame>,
    ) -> Result<(), XIncludeError> {
        let element = dom
            .document_element(document)
            .map_err(|e| self.error(dom, document, e.into()))?;
        self.resolve_element(dom, element, stack)
    }

    fn include_text(
        &self,
        dom: &mut Dom,
        include: Node,
        directive: &Directive,
        url: Url,
    ) -> Result<Vec<Node>, XIncludeError> {
        let resource = self.fetch(dom, include, directive, &url)?;
        let transport_encoding = resource.encoding.clone();
        let content_type = resource.content_type.clone();
        let bytes = resource
            .into_bytes()
            .map_err(|e| self.error(dom, include, fetch_error(&url, e)))?;

        let (encoding, offset) = match (transport_encoding, &directive.encoding) {
            (Some(encoding), _) => (encoding, 0),
            (None, Some(encoding)) => (encoding.clone(), 0),
            (None, None) if content_type.as_deref().map_or(false, |c| c.contains("xml")) => {
                let mut cursor = Cursor::new(&bytes[..]);
                let encoding = sniff(&mut cursor);
                (encoding, cursor.position() as usize)
            }
            (None, None) => ("UTF-8".to_string(), 0),
        };
        debug!(url = %url, encoding = %encoding, "including text");
        let text = decode(&bytes[offset..], &encoding, &self.config).map_err(|e| {
            let kind = match e {
                Error::UnsupportedEncoding(label) => ErrorKind::UnsupportedEncoding(label),
                e => ErrorKind::Tree(e),
            };
            self.error(dom, include, kind)
        })?;
        if text.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![dom.new_text(&text)])
    }

    fn fetch(
        &self,
        dom: &Dom,
        include: Node,
        directive: &Directive,
        url: &Url,
    ) -> Result<Resource, XIncludeError> {
        let request = Request {
            url: url.clone(),
            accept: directive.accept.clone(),
            accept_language: directive.accept_language.clone(),
        };
        self.fetcher
            .fetch(&request)
            .map_err(|e| self.error(dom, include, fetch_error(url, e)))
    }

    /// Copy an included node so it can live in the including document.
    ///
    /// Top-level elements get the namespace declarations in scope at their
    /// source, and `xml:base` and `xml:lang` where they'd otherwise end up
    /// with a different base URI or language.
    fn copy_for_inclusion(
        &self,
        dom: &mut Dom,
        source: Node,
        include: Node,
    ) -> Result<Node, ErrorKind> {
        let copy = dom.clone_node(source);
        if !dom.is_element(copy) {
            return Ok(copy);
        }
        let context = dom.parent(include).unwrap_or(include);
        let mut prefixes = Prefixes::new();
        for (prefix_id, namespace_id) in dom.in_scope_prefixes(source).iter() {
            // bindings the context already has would only be redeclared
            if dom.namespace_for_prefix(context, *prefix_id) != Some(*namespace_id) {
                prefixes.insert(*prefix_id, *namespace_id);
            }
        }
        // undeclare a default namespace the source doesn't have
        let empty = dom.empty_prefix();
        let no_namespace = dom.no_namespace();
        let source_default = dom.namespace_for_prefix(source, empty).unwrap_or(no_namespace);
        let context_default = dom.namespace_for_prefix(context, empty).unwrap_or(no_namespace);
        if source_default != context_default && !prefixes.contains_key(&empty) {
            prefixes.insert(empty, source_default);
        }
        dom.declare_prefixes(copy, &prefixes)?;

        if self.config.fixup_base_uris {
            let source_base = self.effective_base(dom, source)?;
            let context_base = self.effective_base(dom, context)?;
            if let Some(mut base) = source_base {
                if Some(&base) != context_base.as_ref() {
                    base.set_fragment(None);
                    let name = dom.xml_base_name();
                    dom.set_attribute(copy, name, base.as_str())?;
                }
            }
        }
        if self.config.fixup_language {
            let has_language = dom
                .element(source)
                .and_then(|element| element.get_attribute(dom.xml_lang_name()))
                .is_some();
            let source_language = dom.language(source).map(str::to_string);
            let context_language = dom.language(context).map(str::to_string);
            if !has_language && source_language != context_language {
                let name = dom.xml_lang_name();
                dom.set_attribute(copy, name, source_language.unwrap_or_default())?;
            }
        }
        Ok(copy)
    }

    /// Put `replacement` where `include` is, and throw the include away.
    fn splice(
        &self,
        dom: &mut Dom,
        include: Node,
        replacement: Vec<Node>,
    ) -> Result<(), XIncludeError> {
        debug!(nodes = replacement.len(), "splicing");
        if dom.is_under_root(include) {
            return self
                .splice_document_element(dom, include, replacement)
                .map_err(|kind| self.error(dom, include, kind));
        }
        for node in replacement {
            dom.insert_before(include, node)
                .map_err(|e| self.error(dom, include, e.into()))?;
        }
        dom.remove(include)
            .map_err(|e| self.error(dom, include, e.into()))
    }

    fn splice_document_element(
        &self,
        dom: &mut Dom,
        include: Node,
        replacement: Vec<Node>,
    ) -> Result<(), ErrorKind> {
        let mut kept = Vec::with_capacity(replacement.len());
        for node in replacement {
            match dom.text_str(node).map(|text| text.trim().is_empty()) {
                Some(true) => dom.remove(node)?,
                Some(false) => {
                    return Err(ErrorKind::Structural(
                        "text can't replace the document element".to_string(),
                    ))
                }
                None => kept.push(node),
            }
        }
        let elements = kept.iter().filter(|node| dom.is_element(**node)).count();
        if elements != 1 {
            return Err(ErrorKind::Structural(format!(
                "the document element must be replaced by exactly one element, not {}",
                elements
            )));
        }
        let position = kept
            .iter()
            .position(|node| dom.is_element(*node))
            .unwrap_or_default();
        let element = kept[position];
        dom.replace(include, element)?;
        for node in &kept[..position] {
            dom.insert_before(element, *node)?;
        }
        let mut previous = element;
        for node in &kept[position + 1..] {
            dom.insert_after(previous, *node)?;
            previous = *node;
        }
        dom.discard(include)?;
        Ok(())
    }

    fn target_url(&self, dom: &Dom, include: Node, href: &str) -> Result<Url, XIncludeError> {
        let escaped = iri_to_uri(href);
        let base = self
            .effective_base(dom, include)
            .map_err(|kind| self.error(dom, include, kind))?;
        let url = match base {
            Some(base) => base.join(&escaped),
            None => Url::parse(&escaped),
        };
        url.map_err(|e| {
            let kind = match e {
                url::ParseError::RelativeUrlWithoutBase => ErrorKind::NoBaseUri(href.to_string()),
                e => ErrorKind::InvalidHref {
                    href: href.to_string(),
                    source: e,
                },
            };
            self.error(dom, include, kind)
        })
    }

    /// The base URI of a node, falling back to the configured base URI.
    fn effective_base(&self, dom: &Dom, node: Node) -> Result<Option<Url>, ErrorKind> {
        let base = dom.base_uri(node).map_err(|e| match e {
            Error::InvalidUri(source) => ErrorKind::InvalidHref {
                href: String::new(),
                source,
            },
            e => ErrorKind::Tree(e),
        })?;
        Ok(base.or_else(|| self.config.base_uri.clone()))
    }

    fn document_url(&self, dom: &Dom, document: Node) -> Option<Url> {
        dom.document(document)
            .and_then(|document| document.base_uri())
            .and_then(|uri| Url::parse(uri).ok())
            .or_else(|| self.config.base_uri.clone())
    }

    fn error(&self, dom: &Dom, node: Node, kind: ErrorKind) -> XIncludeError {
        let document = dom.root(node);
        let uri = self.document_url(dom, document).map(String::from);
        XIncludeError::new(kind, uri)
    }
}

fn circular(frame: &Frame) -> ErrorKind {
    let url = frame
        .url
        .as_ref()
        .map(Url::to_string)
        .unwrap_or_else(|| "the current document".to_string());
    match &frame.xpointer {
        Some(xpointer) => ErrorKind::CircularInclude(format!("{} ({})", url, xpointer)),
        None => ErrorKind::CircularInclude(url),
    }
}

fn fetch_error(url: &Url, source: std::io::Error) -> ErrorKind {
    ErrorKind::Fetch {
        url: url.to_string(),
        source,
    }
}
