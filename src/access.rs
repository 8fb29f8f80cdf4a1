use indextree::NodeEdge as IndexTreeNodeEdge;

use crate::dom::{Dom, Node};
use crate::error::Error;

/// Node edges, as produced by [`Dom::traverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEdge {
    /// The start edge of a node. For an element this is the start tag.
    Start(Node),
    /// The end edge of a node. For an element this is the end tag. For
    /// values without children it immediately follows the start edge.
    End(Node),
}

/// ## Read-only access
impl Dom {
    /// Obtain the document element from the document root.
    ///
    /// ```rust
    /// let mut dom = xtree::Dom::new();
    /// let root = dom.parse_str("<!--c--><p>Example</p>").unwrap();
    /// let p = dom.document_element(root).unwrap();
    /// assert_eq!(dom.local_name(p), Some("p"));
    /// ```
    pub fn document_element(&self, node: Node) -> Result<Node, Error> {
        if !self.is_root(node) {
            return Err(Error::NotRoot(node));
        }
        self.children(node)
            .find(|child| self.is_element(*child))
            .ok_or(Error::DocumentElement)
    }

    /// The topmost ancestor of a node.
    ///
    /// This is the document root for nodes attached to a document, and the
    /// top of the fragment otherwise.
    pub fn root(&self, node: Node) -> Node {
        self.ancestors(node).last().unwrap_or(node)
    }

    /// The document root that contains this node, if it's in a document.
    pub fn owner_document(&self, node: Node) -> Option<Node> {
        let top = self.root(node);
        self.is_root(top).then_some(top)
    }

    /// Check whether a node has been removed from the arena.
    pub fn is_removed(&self, node: Node) -> bool {
        self.arena()[node.get()].is_removed()
    }

    /// Get parent node.
    ///
    /// Returns [`None`] for a document root or a detached node.
    pub fn parent(&self, node: Node) -> Option<Node> {
        self.arena()[node.get()].parent().map(Node::new)
    }

    /// Iterator over the child nodes of this node.
    ///
    /// ```rust
    /// let mut dom = xtree::Dom::new();
    /// let root = dom.parse_str("<p><a/>text<b/></p>").unwrap();
    /// let p = dom.document_element(root).unwrap();
    /// assert_eq!(dom.children(p).count(), 3);
    /// ```
    pub fn children(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().children(self.arena()).map(Node::new)
    }

    /// Iterator over the element children of this node.
    pub fn element_children(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        self.children(node).filter(|child| self.is_element(*child))
    }

    pub fn first_child(&self, node: Node) -> Option<Node> {
        self.arena()[node.get()].first_child().map(Node::new)
    }

    pub fn last_child(&self, node: Node) -> Option<Node> {
        self.arena()[node.get()].last_child().map(Node::new)
    }

    pub fn next_sibling(&self, node: Node) -> Option<Node> {
        self.arena()[node.get()].next_sibling().map(Node::new)
    }

    pub fn previous_sibling(&self, node: Node) -> Option<Node> {
        self.arena()[node.get()].previous_sibling().map(Node::new)
    }

    /// Index of a child among the children of its parent.
    ///
    /// Returns [`None`] if `child` isn't a child of `parent`.
    pub fn child_index(&self, parent: Node, child: Node) -> Option<usize> {
        if self.parent(child) != Some(parent) {
            return None;
        }
        self.children(parent).position(|n| n == child)
    }

    /// Iterator over ancestor nodes, including this one.
    ///
    /// ```rust
    /// let mut dom = xtree::Dom::new();
    /// let root = dom.parse_str("<a><b><c/></b></a>").unwrap();
    /// let a = dom.document_element(root).unwrap();
    /// let b = dom.first_child(a).unwrap();
    /// let c = dom.first_child(b).unwrap();
    /// assert_eq!(dom.ancestors(c).collect::<Vec<_>>(), vec![c, b, a, root]);
    /// ```
    pub fn ancestors(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().ancestors(self.arena()).map(Node::new)
    }

    /// Iterator over the descendants of this node, including this one, in
    /// document order (pre-order depth-first).
    pub fn descendants(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().descendants(self.arena()).map(Node::new)
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: Node, node: Node) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    /// Whether a node has no children at all.
    pub fn is_empty(&self, node: Node) -> bool {
        self.first_child(node).is_none()
    }

    /// Traverse over node edges, in document order.
    ///
    /// For the tree `<a><b/></a>` this generates a start edge for `<a>`, a
    /// start edge for `<b>` immediately followed by its end edge, and finally
    /// the end edge for `<a>`.
    pub fn traverse(&self, node: Node) -> impl Iterator<Item = NodeEdge> + '_ {
        node.get().traverse(self.arena()).map(|edge| match edge {
            IndexTreeNodeEdge::Start(node_id) => NodeEdge::Start(Node::new(node_id)),
            IndexTreeNodeEdge::End(node_id) => NodeEdge::End(Node::new(node_id)),
        })
    }
}
