use indextree::{Arena, NodeId};

use crate::names::{
    Name, NameId, NameLookup, NamespaceId, NamespaceLookup, PrefixId, PrefixLookup,
};
use crate::value::Value;

pub(crate) type XmlArena = Arena<Value>;

/// The XML namespace, bound to the `xml` prefix in every document.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A node in an XML tree owned by a [`Dom`].
/// This is a lightweight handle and can be copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node(NodeId);

impl Node {
    #[inline]
    pub(crate) fn new(node_id: NodeId) -> Self {
        Node(node_id)
    }

    #[inline]
    pub(crate) fn get(&self) -> NodeId {
        self.0
    }
}

/// `Dom` owns all the XML trees in your program: documents you parsed or
/// built, and fragments that are currently detached from any document.
///
/// Every node has exactly one owner in the arena; moving a node from one
/// place to another is a detach followed by an insert, and copying between
/// documents is an explicit [`Dom::clone_node`].
pub struct Dom {
    pub(crate) arena: XmlArena,
    pub(crate) namespace_lookup: NamespaceLookup,
    pub(crate) prefix_lookup: PrefixLookup,
    pub(crate) name_lookup: NameLookup,
    pub(crate) no_namespace_id: NamespaceId,
    pub(crate) empty_prefix_id: PrefixId,
    pub(crate) xml_namespace_id: NamespaceId,
    pub(crate) xml_prefix_id: PrefixId,
    pub(crate) xml_base_id: NameId,
    pub(crate) xml_lang_id: NameId,
    pub(crate) xml_id_id: NameId,
}

impl Dom {
    /// Create a new, empty `Dom`.
    pub fn new() -> Self {
        let mut namespace_lookup = NamespaceLookup::new();
        let no_namespace_id = namespace_lookup.get_id_mut(String::new());
        let xml_namespace_id = namespace_lookup.get_id_mut(XML_NAMESPACE.to_string());
        let mut prefix_lookup = PrefixLookup::new();
        let empty_prefix_id = prefix_lookup.get_id_mut(String::new());
        let xml_prefix_id = prefix_lookup.get_id_mut("xml".to_string());
        let mut name_lookup = NameLookup::new();
        let xml_base_id = name_lookup.get_id_mut(Name::new("base", xml_namespace_id));
        let xml_lang_id = name_lookup.get_id_mut(Name::new("lang", xml_namespace_id));
        let xml_id_id = name_lookup.get_id_mut(Name::new("id", xml_namespace_id));
        Dom {
            arena: XmlArena::new(),
            namespace_lookup,
            prefix_lookup,
            name_lookup,
            no_namespace_id,
            empty_prefix_id,
            xml_namespace_id,
            xml_prefix_id,
            xml_base_id,
            xml_lang_id,
            xml_id_id,
        }
    }

    #[inline]
    pub(crate) fn arena(&self) -> &XmlArena {
        &self.arena
    }

    #[inline]
    pub(crate) fn arena_mut(&mut self) -> &mut XmlArena {
        &mut self.arena
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
