use url::Url;

use crate::dom::{Dom, Node};
use crate::error::Error;
use crate::iri::iri_to_uri;

/// Values that elements inherit from their ancestors: the base URI and the
/// language.
impl Dom {
    /// The base URI of a node.
    ///
    /// This is the URI of the document the node is in, adjusted by every
    /// `xml:base` attribute on the node and its ancestors. Returns `None`
    /// when no absolute URI can be established, for instance for a
    /// fragment without `xml:base`.
    ///
    /// ```rust
    /// let mut dom = xtree::Dom::new();
    /// let root = dom
    ///     .parse_bytes(br#"<a xml:base="sub/"><b/></a>"#, Some("http://example.com/doc.xml"))
    ///     .unwrap();
    /// let a = dom.document_element(root).unwrap();
    /// let b = dom.first_child(a).unwrap();
    /// assert_eq!(dom.base_uri(b).unwrap().unwrap().as_str(), "http://example.com/sub/");
    /// ```
    pub fn base_uri(&self, node: Node) -> Result<Option<Url>, Error> {
        let mut bases = Vec::new();
        let mut base = None;
        for ancestor in self.ancestors(node) {
            if let Some(document) = self.document(ancestor) {
                base = document.base_uri().map(Url::parse).transpose()?;
                break;
            }
            if let Some(value) = self
                .element(ancestor)
                .and_then(|element| element.get_attribute(self.xml_base_name()))
            {
                bases.push(value);
            }
        }
        for value in bases.into_iter().rev() {
            let value = iri_to_uri(value);
            base = match &base {
                Some(base) => Some(base.join(&value)?),
                None => Url::parse(&value).ok(),
            };
        }
        Ok(base)
    }

    /// The language of a node: the nearest `xml:lang` in scope.
    ///
    /// An empty string means the language was explicitly undeclared.
    pub fn language(&self, node: Node) -> Option<&str> {
        self.ancestors(node)
            .filter_map(|ancestor| self.element(ancestor))
            .find_map(|element| element.get_attribute(self.xml_lang_name()))
    }
}
