use crate::dom::{Dom, Node};
use crate::value::{
    Comment, Doctype, Document, Element, ProcessingInstruction, Text, Value, ValueType,
};

/// Obtain XML values and their types.
///
/// These are handy if you only need a single kind of value. To handle all
/// of them, `match` on [`Value`] instead.
impl Dom {
    /// Access to the XML value for this node.
    #[inline]
    pub fn value(&self, node: Node) -> &Value {
        self.arena[node.get()].get()
    }

    /// Mutable access to the XML value for this node.
    #[inline]
    pub fn value_mut(&mut self, node: Node) -> &mut Value {
        self.arena[node.get()].get_mut()
    }

    /// Get the [`ValueType`] of a node.
    pub fn value_type(&self, node: Node) -> ValueType {
        self.value(node).value_type()
    }

    /// Return true if node is directly under a document root.
    pub fn is_under_root(&self, node: Node) -> bool {
        self.parent(node)
            .map(|parent| self.is_root(parent))
            .unwrap_or(false)
    }

    /// Return true if node is a document root.
    pub fn is_root(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Root
    }

    pub fn is_element(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Element
    }

    pub fn is_text(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Text
    }

    pub fn is_comment(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Comment
    }

    pub fn is_processing_instruction(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::ProcessingInstruction
    }

    pub fn is_doctype(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Doctype
    }

    /// Document information, if this node is a document root.
    pub fn document(&self, node: Node) -> Option<&Document> {
        match self.value(node) {
            Value::Root(document) => Some(document),
            _ => None,
        }
    }

    pub fn document_mut(&mut self, node: Node) -> Option<&mut Document> {
        match self.value_mut(node) {
            Value::Root(document) => Some(document),
            _ => None,
        }
    }

    /// If this node is an element, return a reference to it.
    pub fn element(&self, node: Node) -> Option<&Element> {
        match self.value(node) {
            Value::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, node: Node) -> Option<&mut Element> {
        match self.value_mut(node) {
            Value::Element(element) => Some(element),
            _ => None,
        }
    }

    /// If this node is text, return a reference to it.
    pub fn text(&self, node: Node) -> Option<&Text> {
        match self.value(node) {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, node: Node) -> Option<&mut Text> {
        match self.value_mut(node) {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Text value of a text node as a string slice.
    pub fn text_str(&self, node: Node) -> Option<&str> {
        self.text(node).map(|text| text.get())
    }

    /// Concatenated text of all descendant text nodes.
    ///
    /// Returns `None` for nodes that aren't elements, text or document roots.
    pub fn text_content(&self, node: Node) -> Option<String> {
        match self.value_type(node) {
            ValueType::Text => self.text_str(node).map(str::to_string),
            ValueType::Element | ValueType::Root => Some(
                self.descendants(node)
                    .filter_map(|descendant| self.text_str(descendant))
                    .collect(),
            ),
            _ => None,
        }
    }

    pub fn comment(&self, node: Node) -> Option<&Comment> {
        match self.value(node) {
            Value::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    pub fn processing_instruction(&self, node: Node) -> Option<&ProcessingInstruction> {
        match self.value(node) {
            Value::ProcessingInstruction(pi) => Some(pi),
            _ => None,
        }
    }

    pub fn doctype(&self, node: Node) -> Option<&Doctype> {
        match self.value(node) {
            Value::Doctype(doctype) => Some(doctype),
            _ => None,
        }
    }
}
