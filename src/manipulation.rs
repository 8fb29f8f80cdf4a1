use crate::dom::{Dom, Node};
use crate::error::Error;
use crate::value::{Value, ValueType};

/// Manipulation of the tree structure.
///
/// This maintains the shape of an XML document:
/// - There is at most one element directly under a document root, and once
///   it's there it can only be replaced, not removed.
/// - Text cannot be placed directly under a document root.
/// - A doctype can only live directly under a document root, and there is
///   at most one of them, before the document element.
/// - You cannot add children to a node that is not an element or a root,
///   and a node cannot become its own ancestor.
///
/// It also keeps text nodes consolidated: two text nodes never appear
/// consecutively. Adding a text node next to another text node appends the
/// text to the existing node and removes the added one; removing a node that
/// separated two text nodes merges them.
impl Dom {
    /// Append a child to the end of the children of the given parent.
    pub fn append(&mut self, parent: Node, child: Node) -> Result<(), Error> {
        self.add_structure_check(Some(parent), child, None)?;
        self.remove_structure_check(child)?;
        self.unlink(child);
        if self.add_consolidate_text_nodes(child, self.last_child(parent), None) {
            return Ok(());
        }
        parent.get().checked_append(child.get(), self.arena_mut())?;
        Ok(())
    }

    /// Append a text node to a parent node given text.
    pub fn append_text(&mut self, parent: Node, text: &str) -> Result<(), Error> {
        let text_node = self.new_text(text);
        self.append(parent, text_node)
    }

    /// Prepend a child to the beginning of the children of the given parent.
    pub fn prepend(&mut self, parent: Node, child: Node) -> Result<(), Error> {
        self.add_structure_check(Some(parent), child, None)?;
        self.remove_structure_check(child)?;
        self.unlink(child);
        if self.add_consolidate_text_nodes(child, None, self.first_child(parent)) {
            return Ok(());
        }
        parent.get().checked_prepend(child.get(), self.arena_mut())?;
        Ok(())
    }

    /// Insert a new sibling after a reference node.
    pub fn insert_after(&mut self, reference: Node, new_sibling: Node) -> Result<(), Error> {
        self.add_structure_check(self.parent(reference), new_sibling, None)?;
        self.remove_structure_check(new_sibling)?;
        self.unlink(new_sibling);
        if self.add_consolidate_text_nodes(
            new_sibling,
            Some(reference),
            self.next_sibling(reference),
        ) {
            return Ok(());
        }
        reference
            .get()
            .checked_insert_after(new_sibling.get(), self.arena_mut())?;
        Ok(())
    }

    /// Insert a new sibling before a reference node.
    pub fn insert_before(&mut self, reference: Node, new_sibling: Node) -> Result<(), Error> {
        self.add_structure_check(self.parent(reference), new_sibling, None)?;
        self.remove_structure_check(new_sibling)?;
        self.unlink(new_sibling);
        if self.add_consolidate_text_nodes(
            new_sibling,
            self.previous_sibling(reference),
            Some(reference),
        ) {
            return Ok(());
        }
        reference
            .get()
            .checked_insert_before(new_sibling.get(), self.arena_mut())?;
        Ok(())
    }

    /// Replace a node with another one.
    ///
    /// This is the only way to change the document element of a document:
    /// an element directly under a root may be replaced by another element.
    /// The replaced node is detached, not removed.
    pub fn replace(&mut self, old: Node, new: Node) -> Result<(), Error> {
        let parent = self
            .parent(old)
            .ok_or_else(|| Error::InvalidOperation("Cannot replace unattached node".into()))?;
        self.add_structure_check(Some(parent), new, Some(old))?;
        self.remove_structure_check(new)?;
        if self.is_root(old) {
            return Err(Error::InvalidOperation(
                "Cannot replace document root".into(),
            ));
        }
        if self.is_under_root(old) && self.is_element(old) && !self.is_element(new) {
            return Err(Error::InvalidOperation(
                "Document element can only be replaced by an element".into(),
            ));
        }
        self.unlink(new);
        let prev_node = self.previous_sibling(old);
        let next_node = self.next_sibling(old);
        old.get().checked_insert_before(new.get(), self.arena_mut())?;
        old.get().detach(self.arena_mut());
        if self.is_text(new) {
            let merged_into_prev = self.add_consolidate_text_nodes(new, prev_node, None);
            if merged_into_prev {
                if let Some(prev_node) = prev_node {
                    self.remove_consolidate_text_nodes(Some(prev_node), next_node);
                }
            } else {
                self.add_consolidate_text_nodes(new, None, next_node);
            }
        }
        Ok(())
    }

    /// Detach a node (and its descendants) from the tree.
    ///
    /// It now becomes a fragment of its own.
    pub fn detach(&mut self, node: Node) -> Result<(), Error> {
        self.remove_structure_check(node)?;
        self.unlink(node);
        Ok(())
    }

    /// Remove a node (and its descendants) from the arena.
    pub fn remove(&mut self, node: Node) -> Result<(), Error> {
        self.remove_structure_check(node)?;
        self.unlink(node);
        node.get().remove_subtree(self.arena_mut());
        Ok(())
    }

    /// Drop a whole document, or a fragment that isn't attached anywhere.
    pub fn discard(&mut self, node: Node) -> Result<(), Error> {
        if self.parent(node).is_some() {
            return Err(Error::InvalidOperation(
                "Can only discard a document or an unattached fragment".into(),
            ));
        }
        node.get().remove_subtree(self.arena_mut());
        Ok(())
    }

    /// Deep copy a node and its descendants.
    ///
    /// The copy is unattached. Copying a document root gives a new document.
    pub fn clone_node(&mut self, node: Node) -> Node {
        let copy = self.new_node(self.value(node).clone());
        let children = self.children(node).collect::<Vec<_>>();
        for child in children {
            let child_copy = self.clone_node(child);
            // the source is already consolidated, so the copy is too
            copy.get().append(child_copy.get(), self.arena_mut());
        }
        copy
    }

    /// Detach a node, merging the text nodes around it if they become
    /// adjacent.
    fn unlink(&mut self, node: Node) {
        if self.parent(node).is_none() {
            return;
        }
        let prev_node = self.previous_sibling(node);
        let next_node = self.next_sibling(node);
        node.get().detach(self.arena_mut());
        self.remove_consolidate_text_nodes(prev_node, next_node);
    }

    fn add_structure_check(
        &self,
        parent: Option<Node>,
        child: Node,
        replacing: Option<Node>,
    ) -> Result<(), Error> {
        let parent = parent.ok_or_else(|| {
            Error::InvalidOperation("Cannot create siblings for document root".into())
        })?;
        if !matches!(
            self.value_type(parent),
            ValueType::Element | ValueType::Root
        ) {
            return Err(Error::InvalidOperation(
                "Cannot add children to non-element and non-root node".into(),
            ));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(Error::InvalidOperation(
                "Cannot make a node its own ancestor".into(),
            ));
        }
        match self.value_type(child) {
            ValueType::Root => {
                return Err(Error::InvalidOperation("Cannot move document root".into()));
            }
            ValueType::Element => {
                if self.is_root(parent) {
                    let has_element = self
                        .element_children(parent)
                        .any(|existing| Some(existing) != replacing);
                    if has_element {
                        return Err(Error::InvalidOperation(
                            "Cannot add a second document element".into(),
                        ));
                    }
                }
            }
            ValueType::Text => {
                if self.is_root(parent) {
                    return Err(Error::InvalidOperation(
                        "Cannot add text under document root".into(),
                    ));
                }
            }
            ValueType::Doctype => {
                if !self.is_root(parent) {
                    return Err(Error::InvalidOperation(
                        "Doctype can only be added under document root".into(),
                    ));
                }
                if self
                    .children(parent)
                    .any(|existing| self.is_doctype(existing) && Some(existing) != replacing)
                {
                    return Err(Error::InvalidOperation(
                        "Cannot add a second doctype".into(),
                    ));
                }
            }
            ValueType::ProcessingInstruction | ValueType::Comment => {
                // these can exist everywhere
            }
        }
        Ok(())
    }

    fn remove_structure_check(&self, node: Node) -> Result<(), Error> {
        match self.value_type(node) {
            ValueType::Root => {
                return Err(Error::InvalidOperation(
                    "Cannot remove document root".into(),
                ));
            }
            ValueType::Element => {
                if self.is_under_root(node) {
                    return Err(Error::InvalidOperation(
                        "Cannot remove document element".into(),
                    ));
                }
            }
            ValueType::Text
            | ValueType::ProcessingInstruction
            | ValueType::Comment
            | ValueType::Doctype => {
                // these have no removal constraints
            }
        }
        Ok(())
    }

    fn add_consolidate_text_nodes(
        &mut self,
        node: Node,
        prev_node: Option<Node>,
        next_node: Option<Node>,
    ) -> bool {
        let Some(added_text) = self.text_str(node).map(str::to_string) else {
            return false;
        };

        // two text nodes can never be adjacent, so merging with either
        // neighbour is enough
        if let Some(prev_node) = prev_node {
            if let Value::Text(prev) = self.value_mut(prev_node) {
                prev.text.push_str(&added_text);
                node.get().remove(self.arena_mut());
                return true;
            }
        }
        if let Some(next_node) = next_node {
            if let Value::Text(next) = self.value_mut(next_node) {
                next.text.insert_str(0, &added_text);
                node.get().remove(self.arena_mut());
                return true;
            }
        }
        false
    }

    fn remove_consolidate_text_nodes(&mut self, prev_node: Option<Node>, next_node: Option<Node>) {
        let (Some(prev_node), Some(next_node)) = (prev_node, next_node) else {
            return;
        };
        let Some(to_add) = self.text_str(next_node).map(str::to_string) else {
            return;
        };
        if let Some(prev) = self.text_mut(prev_node) {
            prev.text.push_str(&to_add);
            next_node.get().remove(self.arena_mut());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_text_consolidates() {
        let mut dom = Dom::new();
        let root = dom.parse_str("<doc>a<b/>c</doc>").unwrap();
        let doc = dom.document_element(root).unwrap();
        let b = dom.children(doc).nth(1).unwrap();
        dom.remove(b).unwrap();
        assert_eq!(dom.children(doc).count(), 1);
        assert_eq!(dom.to_string(root).unwrap(), "<doc>ac</doc>");
    }

    #[test]
    fn test_replace_document_element() {
        let mut dom = Dom::new();
        let root = dom.parse_str("<old/>").unwrap();
        let old = dom.document_element(root).unwrap();
        let name = dom.add_name("new");
        let new = dom.new_element(name);
        dom.replace(old, new).unwrap();
        assert_eq!(dom.document_element(root).unwrap(), new);
        assert_eq!(dom.parent(old), None);
        assert_eq!(dom.to_string(root).unwrap(), "<new/>");
    }

    #[test]
    fn test_replace_document_element_with_text_rejected() {
        let mut dom = Dom::new();
        let root = dom.parse_str("<old/>").unwrap();
        let old = dom.document_element(root).unwrap();
        let text = dom.new_text("x");
        assert!(dom.replace(old, text).is_err());
    }

    #[test]
    fn test_second_document_element_rejected() {
        let mut dom = Dom::new();
        let root = dom.parse_str("<doc/>").unwrap();
        let name = dom.add_name("extra");
        let extra = dom.new_element(name);
        assert!(matches!(
            dom.append(root, extra),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_cannot_become_own_ancestor() {
        let mut dom = Dom::new();
        let root = dom.parse_str("<doc><a><b/></a></doc>").unwrap();
        let doc = dom.document_element(root).unwrap();
        let a = dom.first_child(doc).unwrap();
        let b = dom.first_child(a).unwrap();
        assert!(dom.append(b, a).is_err());
    }

    #[test]
    fn test_clone_is_unattached_and_deep() {
        let mut dom = Dom::new();
        let root = dom.parse_str(r#"<doc><a x="1">text</a></doc>"#).unwrap();
        let doc = dom.document_element(root).unwrap();
        let a = dom.first_child(doc).unwrap();
        let copy = dom.clone_node(a);
        assert_eq!(dom.parent(copy), None);
        dom.append(doc, copy).unwrap();
        assert_eq!(
            dom.to_string(root).unwrap(),
            r#"<doc><a x="1">text</a><a x="1">text</a></doc>"#
        );
    }

    #[test]
    fn test_discard_attached_rejected() {
        let mut dom = Dom::new();
        let root = dom.parse_str("<doc><a/></doc>").unwrap();
        let doc = dom.document_element(root).unwrap();
        let a = dom.first_child(doc).unwrap();
        assert!(dom.discard(a).is_err());
        dom.discard(root).unwrap();
        assert!(dom.is_removed(a));
    }
}
