use std::fmt::{Display, Formatter};

use crate::idmap::{IdIndex, IdMap};

/// Id of an interned (local name, namespace) pair.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub struct NameId(u32);

/// Id of an interned namespace URI. The empty URI means "no namespace".
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub struct NamespaceId(u16);

/// Id of an interned prefix. The empty prefix is the default namespace.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub struct PrefixId(u16);

impl IdIndex<NameId> for NameId {
    fn to_id(index: usize) -> NameId {
        NameId(index as u32)
    }

    fn from_id(id: NameId) -> usize {
        id.0 as usize
    }
}

impl IdIndex<NamespaceId> for NamespaceId {
    fn to_id(index: usize) -> NamespaceId {
        NamespaceId(index as u16)
    }

    fn from_id(id: NamespaceId) -> usize {
        id.0 as usize
    }
}

impl IdIndex<PrefixId> for PrefixId {
    fn to_id(index: usize) -> PrefixId {
        PrefixId(index as u16)
    }

    fn from_id(id: PrefixId) -> usize {
        id.0 as usize
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct Name {
    pub(crate) local: String,
    pub(crate) namespace_id: NamespaceId,
}

impl Name {
    pub(crate) fn new(local: impl Into<String>, namespace_id: NamespaceId) -> Self {
        Name {
            local: local.into(),
            namespace_id,
        }
    }
}

pub(crate) type NameLookup = IdMap<NameId, Name>;
pub(crate) type NamespaceLookup = IdMap<NamespaceId, String>;
pub(crate) type PrefixLookup = IdMap<PrefixId, String>;

/// A name with its namespace spelled out, for error messages and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedName<'a> {
    pub namespace: &'a str,
    pub local: &'a str,
}

impl Display for ExpandedName<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}
