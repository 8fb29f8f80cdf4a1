use vector_map::VecMap;

use crate::error::Error;
use crate::names::{NameId, NamespaceId, PrefixId};

/// The type of an XML node, without its data.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ValueType {
    /// Document root that holds the prolog, the document element and the
    /// epilog. Not the same as the document element.
    Root,
    /// Element.
    Element,
    /// Text.
    Text,
    /// Processing instruction.
    ProcessingInstruction,
    /// Comment.
    Comment,
    /// Document type declaration.
    Doctype,
}

/// An XML value, as stored in the arena.
#[derive(Debug, Clone)]
pub enum Value {
    /// Document root.
    Root(Document),
    /// Element; it has a name, attributes and namespace declarations.
    Element(Element),
    /// Text.
    Text(Text),
    /// Processing instruction.
    ProcessingInstruction(ProcessingInstruction),
    /// Comment.
    Comment(Comment),
    /// Document type declaration. Only ever found in the prolog.
    Doctype(Doctype),
}

impl Value {
    /// Returns the type of the XML value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Root(_) => ValueType::Root,
            Value::Element(_) => ValueType::Element,
            Value::Text(_) => ValueType::Text,
            Value::Comment(_) => ValueType::Comment,
            Value::ProcessingInstruction(_) => ValueType::ProcessingInstruction,
            Value::Doctype(_) => ValueType::Doctype,
        }
    }
}

/// Attributes of an element, in document order.
pub type Attributes = VecMap<NameId, String>;
/// Namespace declarations made on an element.
pub type Prefixes = VecMap<PrefixId, NamespaceId>;

/// Document information carried by the root node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub(crate) base_uri: Option<String>,
}

impl Document {
    /// The URI the document was loaded from, if known.
    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    pub fn set_base_uri<S: Into<String>>(&mut self, base_uri: Option<S>) {
        self.base_uri = base_uri.map(Into::into);
    }
}

/// XML element value.
///
/// Example: `<foo/>` or `<foo bar="baz"/>`.
#[derive(Debug, Clone)]
pub struct Element {
    pub(crate) name_id: NameId,
    pub(crate) prefixes: Prefixes,
    pub(crate) attributes: Attributes,
    pub(crate) id_attributes: Vec<NameId>,
}

impl Element {
    pub(crate) fn new(name_id: NameId) -> Self {
        Element {
            name_id,
            prefixes: Prefixes::new(),
            attributes: Attributes::new(),
            id_attributes: Vec::new(),
        }
    }

    /// The name of the element.
    pub fn name(&self) -> NameId {
        self.name_id
    }

    /// The attributes of the element.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Get an attribute by name.
    pub fn get_attribute(&self, name_id: NameId) -> Option<&str> {
        self.attributes.get(&name_id).map(|s| s.as_str())
    }

    /// Set an attribute value.
    pub fn set_attribute<S: Into<String>>(&mut self, name_id: NameId, value: S) {
        self.attributes.insert(name_id, value.into());
    }

    /// Remove an attribute. It also loses its ID type, if it had one.
    pub fn remove_attribute(&mut self, name_id: NameId) {
        self.attributes.remove(&name_id);
        self.id_attributes.retain(|id| *id != name_id);
    }

    /// Mark an attribute as ID-typed.
    ///
    /// The attribute doesn't need to be present yet.
    pub fn set_id_attribute(&mut self, name_id: NameId) {
        if !self.id_attributes.contains(&name_id) {
            self.id_attributes.push(name_id);
        }
    }

    /// Whether the attribute is ID-typed on this element.
    pub fn is_id_attribute(&self, name_id: NameId) -> bool {
        self.id_attributes.contains(&name_id)
    }

    /// Values of the ID-typed attributes present on this element.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.id_attributes
            .iter()
            .filter_map(|name_id| self.get_attribute(*name_id))
    }

    /// Add a prefix to namespace mapping.
    pub fn set_prefix(&mut self, prefix_id: PrefixId, namespace_id: NamespaceId) {
        self.prefixes.insert(prefix_id, namespace_id);
    }

    /// Get the namespace for a prefix, if declared on this element.
    ///
    /// This does not check ancestor declarations.
    pub fn get_namespace(&self, prefix_id: PrefixId) -> Option<NamespaceId> {
        self.prefixes.get(&prefix_id).copied()
    }

    /// Namespace declarations made on this element.
    pub fn prefixes(&self) -> &Prefixes {
        &self.prefixes
    }
}

/// XML text value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub(crate) text: String,
}

impl Text {
    pub(crate) fn new(text: String) -> Self {
        Text { text }
    }

    /// Get the text value.
    pub fn get(&self) -> &str {
        &self.text
    }

    /// Set the text value.
    pub fn set<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
    }
}

/// XML comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub(crate) text: String,
}

impl Comment {
    pub(crate) fn new(text: String) -> Self {
        Comment { text }
    }

    /// Get the comment text.
    pub fn get(&self) -> &str {
        &self.text
    }

    /// Set the comment text.
    ///
    /// Rejects comments that contain `--`.
    pub fn set<S: Into<String>>(&mut self, text: S) -> Result<(), Error> {
        let text = text.into();
        if text.contains("--") {
            return Err(Error::InvalidComment(text));
        }
        self.text = text;
        Ok(())
    }
}

/// XML processing instruction value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstruction {
    pub(crate) target: String,
    pub(crate) data: Option<String>,
}

impl ProcessingInstruction {
    pub(crate) fn new(target: String, data: Option<String>) -> Self {
        ProcessingInstruction { target, data }
    }

    /// Get processing instruction target.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Get processing instruction data.
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

/// Document type declaration.
///
/// The internal subset is kept verbatim; only `ATTLIST` ID declarations are
/// interpreted, when the document is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctype {
    pub(crate) name: String,
    pub(crate) public_id: Option<String>,
    pub(crate) system_id: Option<String>,
    pub(crate) internal_subset: Option<String>,
}

impl Doctype {
    /// Name of the document element as declared.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn public_id(&self) -> Option<&str> {
        self.public_id.as_deref()
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub fn internal_subset(&self) -> Option<&str> {
        self.internal_subset.as_deref()
    }
}
