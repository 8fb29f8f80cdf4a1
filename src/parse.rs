use std::borrow::Cow;
use std::io::Cursor;

use ahash::AHashSet;
use xmlparser::{ElementEnd, ExternalId, StrSpan, Token, Tokenizer};

use crate::config::Config;
use crate::dom::{Dom, Node};
use crate::encoding::decode;
use crate::entity::parse_references;
use crate::error::Error;
use crate::names::NamespaceId;
use crate::sniff::sniff;
use crate::value::{Doctype, Prefixes, Value};

/// Turns bytes into a document in a [`Dom`].
///
/// The include resolver uses a builder to parse every document it fetches,
/// so it has to be callable again while an earlier document is still being
/// resolved.
pub trait Builder {
    /// Build a document from `bytes`, returning its root.
    ///
    /// `base_uri` is recorded on the document root.
    fn build(&self, dom: &mut Dom, bytes: &[u8], base_uri: Option<&str>) -> Result<Node, Error>;
}

/// The default [`Builder`], a non-validating XML parser.
///
/// The encoding is sniffed from the first bytes and the XML declaration.
/// The internal DTD subset is only used to find ID-typed attributes;
/// entities other than the predefined ones aren't supported.
#[derive(Debug, Clone, Default)]
pub struct XmlBuilder {
    config: Config,
}

impl XmlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` to decode documents.
    pub fn with_config(config: Config) -> Self {
        XmlBuilder { config }
    }
}

impl Builder for XmlBuilder {
    fn build(&self, dom: &mut Dom, bytes: &[u8], base_uri: Option<&str>) -> Result<Node, Error> {
        let mut cursor = Cursor::new(bytes);
        let encoding = sniff(&mut cursor);
        let bom_length = cursor.position() as usize;
        let xml = decode(&bytes[bom_length..], &encoding, &self.config)?;
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(&xml);
        parse(dom, xml, base_uri)
    }
}

impl Dom {
    /// Parse a string containing XML into a document.
    ///
    /// ```rust
    /// let mut dom = xtree::Dom::new();
    /// let root = dom.parse_str("<p>Example</p>").unwrap();
    /// let p = dom.document_element(root).unwrap();
    /// assert_eq!(dom.text_content(p).unwrap(), "Example");
    /// ```
    pub fn parse_str(&mut self, xml: &str) -> Result<Node, Error> {
        parse(self, xml, None)
    }

    /// Parse bytes in any supported encoding into a document, recording
    /// `base_uri` as its location.
    pub fn parse_bytes(&mut self, bytes: &[u8], base_uri: Option<&str>) -> Result<Node, Error> {
        XmlBuilder::new().build(self, bytes, base_uri)
    }
}

struct PendingElement<'a> {
    prefix: &'a str,
    local: &'a str,
    prefixes: Prefixes,
    attributes: Vec<(&'a str, &'a str, String)>,
}

struct PendingDoctype<'a> {
    name: &'a str,
    external_id: Option<ExternalId<'a>>,
    subset_start: usize,
}

struct DocumentBuilder<'a, 'd> {
    dom: &'d mut Dom,
    xml: &'a str,
    root: Node,
    current: Node,
    element: Option<PendingElement<'a>>,
    doctype: Option<PendingDoctype<'a>>,
    open_names: Vec<(&'a str, &'a str)>,
    // (element name, attribute name) pairs declared as ID in the DTD
    id_declarations: AHashSet<(String, String)>,
}

impl<'a, 'd> DocumentBuilder<'a, 'd> {
    fn new(dom: &'d mut Dom, xml: &'a str, base_uri: Option<&str>) -> Self {
        let root = dom.new_document(base_uri);
        DocumentBuilder {
            dom,
            xml,
            root,
            current: root,
            element: None,
            doctype: None,
            open_names: Vec::new(),
            id_declarations: AHashSet::new(),
        }
    }

    fn element_start(&mut self, prefix: &'a str, local: &'a str) {
        self.element = Some(PendingElement {
            prefix,
            local,
            prefixes: Prefixes::new(),
            attributes: Vec::new(),
        });
    }

    fn attribute(&mut self, prefix: &'a str, local: &'a str, value: &'a str) -> Result<(), Error> {
        let value = parse_references(normalize_attribute(value))?.into_owned();
        let element = self.element.as_mut().ok_or(Error::UnclosedTag)?;
        if prefix == "xmlns" {
            let prefix_id = self.dom.add_prefix(local);
            let namespace_id = self.dom.add_namespace(&value);
            element.prefixes.insert(prefix_id, namespace_id);
        } else if prefix.is_empty() && local == "xmlns" {
            let namespace_id = self.dom.add_namespace(&value);
            element.prefixes.insert(self.dom.empty_prefix(), namespace_id);
        } else {
            element.attributes.push((prefix, local, value));
        }
        Ok(())
    }

    fn open_element(&mut self) -> Result<Node, Error> {
        let pending = self.element.take().ok_or(Error::UnclosedTag)?;
        if self.dom.is_root(self.current) && self.dom.document_element(self.current).is_ok() {
            return Err(Error::DocumentElement);
        }
        // the element is created with a placeholder name: its own
        // declarations have to be in scope to resolve the real one
        let placeholder = self.dom.add_name(pending.local);
        let node = self.dom.new_element(placeholder);
        if let Some(element) = self.dom.element_mut(node) {
            element.prefixes = pending.prefixes;
        }
        self.dom.append(self.current, node)?;

        let namespace_id = self.resolve_prefix(node, pending.prefix)?;
        let name_id = self.dom.add_name_ns(pending.local, namespace_id);
        let qname = qualified(pending.prefix, pending.local);
        let mut attribute_ids = Vec::with_capacity(pending.attributes.len());
        for (prefix, local, value) in pending.attributes {
            let namespace_id = if prefix.is_empty() {
                self.dom.no_namespace()
            } else {
                self.resolve_prefix(node, prefix)?
            };
            let attribute_id = self.dom.add_name_ns(local, namespace_id);
            if attribute_ids.iter().any(|(id, _, _)| *id == attribute_id) {
                return Err(Error::DuplicateAttribute(qualified(prefix, local)));
            }
            let is_id = attribute_id == self.dom.xml_id_name()
                || self
                    .id_declarations
                    .contains(&(qname.clone(), qualified(prefix, local)));
            attribute_ids.push((attribute_id, value, is_id));
        }
        let element = self.dom.element_mut(node).ok_or(Error::NotElement(node))?;
        element.name_id = name_id;
        for (attribute_id, value, is_id) in attribute_ids {
            element.set_attribute(attribute_id, value);
            if is_id {
                element.set_id_attribute(attribute_id);
            }
        }
        self.open_names.push((pending.prefix, pending.local));
        self.current = node;
        Ok(node)
    }

    fn resolve_prefix(&mut self, node: Node, prefix: &str) -> Result<NamespaceId, Error> {
        let prefix_id = self.dom.add_prefix(prefix);
        match self.dom.namespace_for_prefix(node, prefix_id) {
            Some(namespace_id) => Ok(namespace_id),
            None if prefix.is_empty() => Ok(self.dom.no_namespace()),
            None => Err(Error::UnknownPrefix(prefix.to_string())),
        }
    }

    fn close_element(&mut self, close: Option<(&'a str, &'a str)>) -> Result<(), Error> {
        let open = self.open_names.pop().ok_or(Error::UnclosedTag)?;
        if let Some(close) = close {
            if close != open {
                return Err(Error::InvalidCloseTag(
                    qualified(open.0, open.1),
                    qualified(close.0, close.1),
                ));
            }
        }
        self.current = self.dom.parent(self.current).ok_or(Error::UnclosedTag)?;
        Ok(())
    }

    fn text(&mut self, text: Cow<str>) -> Result<(), Error> {
        if self.dom.is_root(self.current) {
            if text.chars().all(|c| matches!(c, ' ' | '\t' | '\r' | '\n')) {
                return Ok(());
            }
            return Err(Error::TextOutsideDocumentElement);
        }
        if !text.is_empty() {
            self.dom.append_text(self.current, &text)?;
        }
        Ok(())
    }

    fn add(&mut self, value: Value) -> Result<(), Error> {
        let node = self.dom.new_node(value);
        self.dom.append(self.current, node)
    }

    fn doctype(&mut self, internal_subset: Option<&str>) -> Result<(), Error> {
        let pending = self.doctype.take().ok_or(Error::UnclosedTag)?;
        if self.dom.document_element(self.root).is_ok() {
            return Err(Error::InvalidOperation(
                "Doctype must come before the document element".into(),
            ));
        }
        let (public_id, system_id) = match pending.external_id {
            Some(ExternalId::System(system)) => (None, Some(system.as_str().to_string())),
            Some(ExternalId::Public(public, system)) => (
                Some(public.as_str().to_string()),
                Some(system.as_str().to_string()),
            ),
            None => (None, None),
        };
        if let Some(subset) = internal_subset {
            self.id_declarations = id_attribute_declarations(subset);
        }
        self.add(Value::Doctype(Doctype {
            name: pending.name.to_string(),
            public_id,
            system_id,
            internal_subset: internal_subset.map(str::to_string),
        }))
    }

    fn finish(self) -> Result<Node, Error> {
        if !self.open_names.is_empty() || self.current != self.root {
            return Err(Error::UnclosedTag);
        }
        self.dom.document_element(self.root)?;
        Ok(self.root)
    }
}

fn parse(dom: &mut Dom, xml: &str, base_uri: Option<&str>) -> Result<Node, Error> {
    let mut builder = DocumentBuilder::new(dom, xml, base_uri);
    let result = build_tokens(&mut builder);
    match result {
        Ok(()) => builder.finish(),
        Err(err) => {
            // don't leave a half-built document behind in the arena
            let root = builder.root;
            builder.dom.discard(root)?;
            Err(err)
        }
    }
}

fn build_tokens(builder: &mut DocumentBuilder) -> Result<(), Error> {
    for token in Tokenizer::from(builder.xml) {
        match token? {
            Token::Declaration { .. } | Token::EntityDeclaration { .. } => {}
            Token::ProcessingInstruction {
                target, content, ..
            } => {
                let node = builder
                    .dom
                    .new_processing_instruction(target.as_str(), content.map(|c| c.as_str()));
                builder.dom.append(builder.current, node)?;
            }
            Token::Comment { text, .. } => {
                let node = builder.dom.new_comment(text.as_str());
                builder.dom.append(builder.current, node)?;
            }
            Token::DtdStart {
                name,
                external_id,
                span,
            } => {
                builder.doctype = Some(PendingDoctype {
                    name: name.as_str(),
                    external_id,
                    subset_start: span_end(&span),
                });
            }
            Token::EmptyDtd {
                name, external_id, ..
            } => {
                builder.doctype = Some(PendingDoctype {
                    name: name.as_str(),
                    external_id,
                    subset_start: 0,
                });
                builder.doctype(None)?;
            }
            Token::DtdEnd { span } => {
                let start = builder
                    .doctype
                    .as_ref()
                    .map(|doctype| doctype.subset_start)
                    .ok_or(Error::UnclosedTag)?;
                let subset = builder.xml[start..span.start()]
                    .trim()
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .trim();
                builder.doctype(Some(subset))?;
            }
            Token::ElementStart { prefix, local, .. } => {
                builder.element_start(prefix.as_str(), local.as_str());
            }
            Token::Attribute {
                prefix,
                local,
                value,
                ..
            } => {
                builder.attribute(prefix.as_str(), local.as_str(), value.as_str())?;
            }
            Token::ElementEnd { end, .. } => match end {
                ElementEnd::Open => {
                    builder.open_element()?;
                }
                ElementEnd::Close(prefix, local) => {
                    builder.close_element(Some((prefix.as_str(), local.as_str())))?;
                }
                ElementEnd::Empty => {
                    builder.open_element()?;
                    builder.close_element(None)?;
                }
            },
            Token::Text { text } => {
                let text = parse_references(normalize_newlines(text.as_str()))?;
                builder.text(text)?;
            }
            Token::Cdata { text, .. } => {
                builder.text(normalize_newlines(text.as_str()))?;
            }
        }
    }
    Ok(())
}

fn span_end(span: &StrSpan) -> usize {
    span.start() + span.as_str().len()
}

fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

fn normalize_newlines(text: &str) -> Cow<str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

fn normalize_attribute(value: &str) -> Cow<str> {
    if value.contains(['\t', '\n', '\r']) {
        Cow::Owned(
            value
                .replace("\r\n", " ")
                .replace(['\t', '\n', '\r'], " "),
        )
    } else {
        Cow::Borrowed(value)
    }
}

/// Find the `(element, attribute)` pairs declared with type `ID` by the
/// `<!ATTLIST` declarations in a DTD internal subset.
pub(crate) fn id_attribute_declarations(subset: &str) -> AHashSet<(String, String)> {
    let mut declarations = AHashSet::new();
    let mut rest = subset;
    while let Some(start) = rest.find("<!ATTLIST") {
        rest = &rest[start + "<!ATTLIST".len()..];
        let tokens = declaration_tokens(rest);
        rest = &rest[tokens.consumed..];
        let mut tokens = tokens.tokens.into_iter();
        let Some(element) = tokens.next() else {
            continue;
        };
        // the remaining tokens are (name, type, default) definitions, where
        // a `#FIXED` default takes an extra value
        while let (Some(attribute), Some(attribute_type)) = (tokens.next(), tokens.next()) {
            if tokens.next().as_deref() == Some("#FIXED") {
                tokens.next();
            }
            if attribute_type == "ID" {
                declarations.insert((element.clone(), attribute));
            }
        }
    }
    declarations
}

struct DeclarationTokens {
    tokens: Vec<String>,
    consumed: usize,
}

/// Split a markup declaration into whitespace separated tokens, up to the
/// closing `>`. Quoted literals and parenthesized groups are one token.
fn declaration_tokens(text: &str) -> DeclarationTokens {
    let mut tokens = Vec::new();
    let mut token = String::new();
    let mut quote = None;
    let mut depth = 0usize;
    let mut consumed = text.len();
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => {
                quote = None;
                token.push(c);
            }
            (Some(_), c) => token.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                token.push(c);
            }
            (None, '(') => {
                depth += 1;
                token.push(c);
            }
            (None, ')') => {
                depth = depth.saturating_sub(1);
                token.push(c);
            }
            (None, '>') if depth == 0 => {
                consumed = i + 1;
                break;
            }
            (None, c) if c.is_whitespace() && depth == 0 => {
                if !token.is_empty() {
                    tokens.push(std::mem::take(&mut token));
                }
            }
            (None, c) => token.push(c),
        }
    }
    if !token.is_empty() {
        tokens.push(token);
    }
    DeclarationTokens { tokens, consumed }
}
