use std::io::Write;

use crate::access::NodeEdge;
use crate::dom::{Dom, Node};
use crate::entity::{serialize_attribute, serialize_text};
use crate::error::Error;
use crate::names::{NameId, NamespaceId};
use crate::value::Value;

/// Serialization of a node and its descendants to XML.
///
/// The output is compact: no XML declaration is written and nothing is
/// indented. Prefixes come from the namespace declarations in scope.
impl Dom {
    /// Write XML for `node` to `w`.
    pub fn serialize(&self, node: Node, w: &mut impl Write) -> Result<(), Error> {
        for edge in self.traverse(node) {
            match edge {
                NodeEdge::Start(node) => self.serialize_start(node, w)?,
                NodeEdge::End(node) => self.serialize_end(node, w)?,
            }
        }
        Ok(())
    }

    /// Serialize `node` to a string.
    ///
    /// ```rust
    /// let mut dom = xtree::Dom::new();
    /// let root = dom.parse_str("<a x='1'><b>&amp;</b><c></c></a>").unwrap();
    /// assert_eq!(dom.to_string(root).unwrap(), r#"<a x="1"><b>&amp;</b><c/></a>"#);
    /// ```
    pub fn to_string(&self, node: Node) -> Result<String, Error> {
        let mut buf = Vec::new();
        self.serialize(node, &mut buf)?;
        // we only ever write str data
        String::from_utf8(buf).map_err(|e| Error::InvalidOperation(e.to_string()))
    }

    fn serialize_start(&self, node: Node, w: &mut impl Write) -> Result<(), Error> {
        match self.value(node) {
            Value::Root(_) => {}
            Value::Element(element) => {
                write!(w, "<{}", self.element_qname(node, element.name())?)?;
                for (prefix_id, namespace_id) in element.prefixes().iter() {
                    let namespace = serialize_attribute(self.namespace_str(*namespace_id));
                    if *prefix_id == self.empty_prefix() {
                        write!(w, " xmlns=\"{}\"", namespace)?;
                    } else {
                        write!(w, " xmlns:{}=\"{}\"", self.prefix_str(*prefix_id), namespace)?;
                    }
                }
                for (name_id, value) in element.attributes().iter() {
                    write!(
                        w,
                        " {}=\"{}\"",
                        self.attribute_qname(node, *name_id)?,
                        serialize_attribute(value)
                    )?;
                }
                if self.is_empty(node) {
                    write!(w, "/>")?;
                } else {
                    write!(w, ">")?;
                }
            }
            Value::Text(text) => {
                write!(w, "{}", serialize_text(text.get()))?;
            }
            Value::Comment(comment) => {
                write!(w, "<!--{}-->", comment.get())?;
            }
            Value::ProcessingInstruction(pi) => match pi.data() {
                Some(data) => write!(w, "<?{} {}?>", pi.target(), data)?,
                None => write!(w, "<?{}?>", pi.target())?,
            },
            Value::Doctype(doctype) => {
                write!(w, "<!DOCTYPE {}", doctype.name())?;
                match (doctype.public_id(), doctype.system_id()) {
                    (Some(public_id), Some(system_id)) => {
                        write!(w, " PUBLIC \"{}\" \"{}\"", public_id, system_id)?
                    }
                    (None, Some(system_id)) => write!(w, " SYSTEM \"{}\"", system_id)?,
                    _ => {}
                }
                if let Some(subset) = doctype.internal_subset() {
                    write!(w, " [{}]", subset)?;
                }
                write!(w, ">")?;
            }
        }
        Ok(())
    }

    fn serialize_end(&self, node: Node, w: &mut impl Write) -> Result<(), Error> {
        if let Value::Element(element) = self.value(node) {
            if !self.is_empty(node) {
                write!(w, "</{}>", self.element_qname(node, element.name())?)?;
            }
        }
        Ok(())
    }

    fn element_qname(&self, node: Node, name_id: NameId) -> Result<String, Error> {
        let namespace_id = self.name_namespace(name_id);
        let local = self.local_name_str(name_id);
        if namespace_id == self.no_namespace() {
            // an unprefixed name would pick up the default namespace
            if let Some(default) = self.namespace_for_prefix(node, self.empty_prefix()) {
                if default != namespace_id {
                    return Err(Error::DefaultNamespaceInScope(
                        local.to_string(),
                        self.namespace_str(default).to_string(),
                    ));
                }
            }
            return Ok(local.to_string());
        }
        let prefix_id = self
            .prefix_for_namespace(node, namespace_id)
            .ok_or_else(|| self.no_prefix(namespace_id))?;
        Ok(self.qname(self.prefix_str(prefix_id), local))
    }

    fn attribute_qname(&self, node: Node, name_id: NameId) -> Result<String, Error> {
        let namespace_id = self.name_namespace(name_id);
        let local = self.local_name_str(name_id);
        if namespace_id == self.no_namespace() {
            return Ok(local.to_string());
        }
        // attributes can't use the default namespace
        let prefix_id = self
            .ancestors(node)
            .filter_map(|ancestor| self.element(ancestor))
            .flat_map(|element| element.prefixes().iter())
            .map(|(prefix_id, _)| *prefix_id)
            .chain(std::iter::once(self.xml_prefix()))
            .find(|prefix_id| {
                *prefix_id != self.empty_prefix()
                    && self.namespace_for_prefix(node, *prefix_id) == Some(namespace_id)
            })
            .ok_or_else(|| self.no_prefix(namespace_id))?;
        Ok(self.qname(self.prefix_str(prefix_id), local))
    }

    fn qname(&self, prefix: &str, local: &str) -> String {
        if prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", prefix, local)
        }
    }

    fn no_prefix(&self, namespace_id: NamespaceId) -> Error {
        Error::NoPrefixForNamespace(self.namespace_str(namespace_id).to_string())
    }
}
