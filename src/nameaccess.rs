use crate::dom::{Dom, Node};
use crate::error::Error;
use crate::names::{ExpandedName, Name, NameId, NamespaceId, PrefixId};
use crate::value::Prefixes;

/// Creation and lookup of names, namespaces and prefixes.
impl Dom {
    /// Look up name without a namespace.
    pub fn name(&self, local: &str) -> Option<NameId> {
        self.name_ns(local, self.no_namespace_id)
    }

    /// Add name without a namespace.
    /// If the name already exists, return its id.
    pub fn add_name(&mut self, local: &str) -> NameId {
        self.add_name_ns(local, self.no_namespace_id)
    }

    /// Look up name in a namespace.
    pub fn name_ns(&self, local: &str, namespace_id: NamespaceId) -> Option<NameId> {
        self.name_lookup.get_id(&Name::new(local, namespace_id))
    }

    /// Add name in a namespace.
    /// If the name already exists, return its id.
    pub fn add_name_ns(&mut self, local: &str, namespace_id: NamespaceId) -> NameId {
        self.name_lookup.get_id_mut(Name::new(local, namespace_id))
    }

    /// Look up namespace.
    pub fn namespace(&self, uri: &str) -> Option<NamespaceId> {
        self.namespace_lookup.get_id(&uri.to_string())
    }

    /// Add namespace.
    /// If the namespace already exists, return its id.
    pub fn add_namespace(&mut self, uri: &str) -> NamespaceId {
        self.namespace_lookup.get_id_mut(uri.to_string())
    }

    /// Look up prefix.
    pub fn prefix(&self, prefix: &str) -> Option<PrefixId> {
        self.prefix_lookup.get_id(&prefix.to_string())
    }

    /// Add prefix.
    /// If the prefix already exists, return its id.
    pub fn add_prefix(&mut self, prefix: &str) -> PrefixId {
        self.prefix_lookup.get_id_mut(prefix.to_string())
    }

    /// The id of "no namespace".
    pub fn no_namespace(&self) -> NamespaceId {
        self.no_namespace_id
    }

    /// The id of the empty (default namespace) prefix.
    pub fn empty_prefix(&self) -> PrefixId {
        self.empty_prefix_id
    }

    /// The XML namespace, `http://www.w3.org/XML/1998/namespace`.
    pub fn xml_namespace(&self) -> NamespaceId {
        self.xml_namespace_id
    }

    /// The `xml` prefix.
    pub fn xml_prefix(&self) -> PrefixId {
        self.xml_prefix_id
    }

    /// The `xml:base` attribute name.
    pub fn xml_base_name(&self) -> NameId {
        self.xml_base_id
    }

    /// The `xml:lang` attribute name.
    pub fn xml_lang_name(&self) -> NameId {
        self.xml_lang_id
    }

    /// The `xml:id` attribute name.
    pub fn xml_id_name(&self) -> NameId {
        self.xml_id_id
    }

    /// Local name for a name id.
    pub fn local_name_str(&self, name_id: NameId) -> &str {
        &self.name_lookup.get_value(name_id).local
    }

    /// Namespace for a name id.
    pub fn name_namespace(&self, name_id: NameId) -> NamespaceId {
        self.name_lookup.get_value(name_id).namespace_id
    }

    /// Namespace URI string for a namespace id.
    pub fn namespace_str(&self, namespace_id: NamespaceId) -> &str {
        self.namespace_lookup.get_value(namespace_id)
    }

    /// Prefix string for a prefix id.
    pub fn prefix_str(&self, prefix_id: PrefixId) -> &str {
        self.prefix_lookup.get_value(prefix_id)
    }

    /// Namespace URI and local name of a name id.
    pub fn expanded_name(&self, name_id: NameId) -> ExpandedName<'_> {
        let name = self.name_lookup.get_value(name_id);
        ExpandedName {
            namespace: self.namespace_str(name.namespace_id),
            local: &name.local,
        }
    }

    /// Local name of an element node.
    pub fn local_name(&self, node: Node) -> Option<&str> {
        self.element(node)
            .map(|element| self.local_name_str(element.name()))
    }

    /// Namespace URI of an element node; the empty string for no namespace.
    pub fn namespace_uri(&self, node: Node) -> Option<&str> {
        self.element(node)
            .map(|element| self.namespace_str(self.name_namespace(element.name())))
    }

    /// Whether the node is an element with this namespace URI and local name.
    pub fn has_name(&self, node: Node, namespace: &str, local: &str) -> bool {
        self.element(node)
            .map(|element| {
                let name = self.expanded_name(element.name());
                name.namespace == namespace && name.local == local
            })
            .unwrap_or(false)
    }

    /// Value of an attribute without a namespace, looked up by local name.
    pub fn get_attribute(&self, node: Node, local: &str) -> Option<&str> {
        let name_id = self.name(local)?;
        self.element(node)?.get_attribute(name_id)
    }

    /// Set an attribute on an element.
    pub fn set_attribute<S: Into<String>>(
        &mut self,
        node: Node,
        name_id: NameId,
        value: S,
    ) -> Result<(), Error> {
        let element = self.element_mut(node).ok_or(Error::NotElement(node))?;
        element.set_attribute(name_id, value);
        Ok(())
    }

    /// Find the namespace bound to a prefix at this node.
    ///
    /// The `xml` prefix is always bound to the XML namespace.
    pub fn namespace_for_prefix(&self, node: Node, prefix_id: PrefixId) -> Option<NamespaceId> {
        if prefix_id == self.xml_prefix_id {
            return Some(self.xml_namespace_id);
        }
        self.ancestors(node)
            .filter_map(|ancestor| self.element(ancestor))
            .find_map(|element| element.get_namespace(prefix_id))
    }

    /// Find a prefix bound to a namespace at this node, respecting
    /// redeclarations of that prefix closer to the node.
    pub fn prefix_for_namespace(&self, node: Node, namespace_id: NamespaceId) -> Option<PrefixId> {
        if namespace_id == self.xml_namespace_id {
            return Some(self.xml_prefix_id);
        }
        for ancestor in self.ancestors(node) {
            let Some(element) = self.element(ancestor) else {
                continue;
            };
            for (prefix_id, declared) in element.prefixes().iter() {
                if *declared == namespace_id
                    && self.namespace_for_prefix(node, *prefix_id) == Some(namespace_id)
                {
                    return Some(*prefix_id);
                }
            }
        }
        None
    }

    /// All namespace declarations in scope at this node, innermost winning.
    ///
    /// The implicit `xml` binding isn't included.
    pub fn in_scope_prefixes(&self, node: Node) -> Prefixes {
        let mut prefixes = Prefixes::new();
        for ancestor in self.ancestors(node) {
            let Some(element) = self.element(ancestor) else {
                continue;
            };
            for (prefix_id, namespace_id) in element.prefixes().iter() {
                if !prefixes.contains_key(prefix_id) {
                    prefixes.insert(*prefix_id, *namespace_id);
                }
            }
        }
        prefixes
    }

    /// Declare on an element every binding from `prefixes` that the element
    /// doesn't declare itself.
    ///
    /// Used to keep a subtree self-contained before moving it away from the
    /// ancestors that declared its namespaces.
    pub fn declare_prefixes(&mut self, node: Node, prefixes: &Prefixes) -> Result<(), Error> {
        let element = self.element_mut(node).ok_or(Error::NotElement(node))?;
        for (prefix_id, namespace_id) in prefixes.iter() {
            if element.get_namespace(*prefix_id).is_none() {
                element.set_prefix(*prefix_id, *namespace_id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_interned() {
        let mut dom = Dom::new();
        let a = dom.add_name("a");
        assert_eq!(dom.name("a"), Some(a));
        assert_eq!(dom.name("b"), None);
        let ns = dom.add_namespace("http://example.com");
        let a_ns = dom.add_name_ns("a", ns);
        assert_ne!(a, a_ns);
        assert_eq!(dom.expanded_name(a_ns).to_string(), "{http://example.com}a");
    }

    #[test]
    fn test_prefix_lookup_respects_redeclaration() {
        let mut dom = Dom::new();
        let root = dom
            .parse_str(r#"<a xmlns:x="urn:one"><b xmlns:x="urn:two"><c/></b></a>"#)
            .unwrap();
        let a = dom.document_element(root).unwrap();
        let b = dom.first_child(a).unwrap();
        let c = dom.first_child(b).unwrap();
        let x = dom.prefix("x").unwrap();
        let one = dom.namespace("urn:one").unwrap();
        let two = dom.namespace("urn:two").unwrap();
        assert_eq!(dom.namespace_for_prefix(c, x), Some(two));
        assert_eq!(dom.prefix_for_namespace(c, one), None);
        assert_eq!(dom.prefix_for_namespace(c, two), Some(x));
        assert_eq!(dom.in_scope_prefixes(c).get(&x), Some(&two));
    }

    #[test]
    fn test_xml_prefix_is_implicit() {
        let dom = Dom::new();
        let ns = dom.xml_namespace();
        assert_eq!(dom.namespace_str(ns), crate::XML_NAMESPACE);
        assert_eq!(dom.prefix_str(dom.xml_prefix()), "xml");
    }
}
