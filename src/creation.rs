use crate::dom::{Dom, Node};
use crate::names::NameId;
use crate::value::{Comment, Document, Element, ProcessingInstruction, Text, Value};

/// Creation of new, unattached nodes.
impl Dom {
    pub(crate) fn new_node(&mut self, value: Value) -> Node {
        Node::new(self.arena.new_node(value))
    }

    /// Create an empty document root.
    ///
    /// It only becomes a well-formed document once a document element is
    /// appended to it.
    pub fn new_document(&mut self, base_uri: Option<&str>) -> Node {
        self.new_node(Value::Root(Document {
            base_uri: base_uri.map(str::to_string),
        }))
    }

    /// Create a document root with the given document element.
    pub fn new_document_with_element(
        &mut self,
        element: Node,
        base_uri: Option<&str>,
    ) -> Result<Node, crate::error::Error> {
        let root = self.new_document(base_uri);
        self.append(root, element)?;
        Ok(root)
    }

    pub fn new_element(&mut self, name_id: NameId) -> Node {
        self.new_node(Value::Element(Element::new(name_id)))
    }

    pub fn new_text(&mut self, text: &str) -> Node {
        self.new_node(Value::Text(Text::new(text.to_string())))
    }

    pub fn new_comment(&mut self, comment: &str) -> Node {
        self.new_node(Value::Comment(Comment::new(comment.to_string())))
    }

    pub fn new_processing_instruction(&mut self, target: &str, data: Option<&str>) -> Node {
        self.new_node(Value::ProcessingInstruction(ProcessingInstruction::new(
            target.to_string(),
            data.map(str::to_string),
        )))
    }
}
