//! Fragment tree primitives
//!
//!     A fragment is a small markup tree: a synthetic root holding element and text nodes.
//!     Storage is an `ego_tree` arena, so every node has a stable, copyable [`NodeId`] that
//!     stays valid for the lifetime of the fragment, even after the node is detached.
//!     That stability is what lets the symbol index keep pointing at text nodes while the
//!     highlight view splits and rewraps them.
//!
//!     All lookups go through ids. An id that does not belong to the fragment, or that
//!     refers to the wrong kind of node, is reported as a [`DomError`] instead of a panic.

use ego_tree::{NodeMut, NodeRef, Tree};
use std::collections::BTreeMap;
use std::fmt;

pub use ego_tree::NodeId;

/// A node in a fragment tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// The fragment container. Never emitted as content.
    Root,
    Element(Element),
    Text(String),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

/// An element: a tag name and its attributes.
///
/// Marker attributes (`ignore`, `no-color`, ...) are plain keys with an empty value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Adds a presence-only attribute.
    pub fn with_marker(self, name: impl Into<String>) -> Self {
        self.with_attribute(name, "")
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

/// Error type for fragment tree operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// The id does not belong to this fragment
    UnknownNode(NodeId),
    /// A text node was expected
    NotText(NodeId),
    /// An element (or the root) was expected
    NotElement(NodeId),
    /// The node has no parent, so it has no siblings to insert next to
    Detached(NodeId),
    /// A character offset past the end of a text node
    OffsetOutOfBounds {
        node: NodeId,
        offset: usize,
        len: usize,
    },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::UnknownNode(id) => write!(f, "Unknown node {:?}", id),
            DomError::NotText(id) => write!(f, "Node {:?} is not a text node", id),
            DomError::NotElement(id) => write!(f, "Node {:?} is not an element", id),
            DomError::Detached(id) => write!(f, "Node {:?} has no parent", id),
            DomError::OffsetOutOfBounds { node, offset, len } => write!(
                f,
                "Offset {} is out of bounds for text node {:?} of length {}",
                offset, node, len
            ),
        }
    }
}

impl std::error::Error for DomError {}

/// A markup fragment.
#[derive(Debug, Clone)]
pub struct Fragment {
    tree: Tree<Node>,
}

impl Fragment {
    /// Create an empty fragment (just the root).
    pub fn new() -> Self {
        Fragment {
            tree: Tree::new(Node::Root),
        }
    }

    pub fn root(&self) -> NodeId {
        self.tree.root().id()
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> Result<NodeRef<'_, Node>, DomError> {
        self.tree.get(id).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<NodeMut<'_, Node>, DomError> {
        self.tree.get_mut(id).ok_or(DomError::UnknownNode(id))
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        Ok(self.node_ref(id)?.value())
    }

    /// The content of a text node.
    pub fn text(&self, id: NodeId) -> Result<&str, DomError> {
        match self.node(id)? {
            Node::Text(text) => Ok(text),
            _ => Err(DomError::NotText(id)),
        }
    }

    pub fn element(&self, id: NodeId) -> Result<&Element, DomError> {
        match self.node(id)? {
            Node::Element(element) => Ok(element),
            _ => Err(DomError::NotElement(id)),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.parent().map(|parent| parent.id())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.first_child().map(|child| child.id())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.next_sibling().map(|sibling| sibling.id())
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.tree
            .get(id)
            .map(|node| node.has_children())
            .unwrap_or(false)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.children().map(|child| child.id()).collect())
            .unwrap_or_default()
    }

    /// Create a detached node. Attach it with [`Fragment::append_id`] or
    /// [`Fragment::insert_id_after`].
    pub fn create(&mut self, node: impl Into<Node>) -> NodeId {
        self.tree.orphan(node.into()).id()
    }

    pub fn append(&mut self, parent: NodeId, node: impl Into<Node>) -> Result<NodeId, DomError> {
        self.ensure_container(parent)?;
        Ok(self.node_mut(parent)?.append(node.into()).id())
    }

    pub fn append_id(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.ensure_container(parent)?;
        self.node_ref(child)?;
        self.node_mut(parent)?.append_id(child);
        Ok(())
    }

    /// Insert a new node right after `sibling`.
    pub fn insert_after(
        &mut self,
        sibling: NodeId,
        node: impl Into<Node>,
    ) -> Result<NodeId, DomError> {
        self.ensure_attached(sibling)?;
        Ok(self.node_mut(sibling)?.insert_after(node.into()).id())
    }

    /// Move an existing (usually detached) node right after `sibling`.
    pub fn insert_id_after(&mut self, sibling: NodeId, id: NodeId) -> Result<(), DomError> {
        self.ensure_attached(sibling)?;
        self.node_ref(id)?;
        self.node_mut(sibling)?.insert_id_after(id);
        Ok(())
    }

    /// Detach a node (and its subtree) from its parent. The id stays valid.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        self.node_mut(id)?.detach();
        Ok(())
    }

    /// Put `replacement` where `old` is and detach `old`. No other sibling moves.
    pub fn replace(&mut self, old: NodeId, replacement: NodeId) -> Result<(), DomError> {
        self.insert_id_after(old, replacement)?;
        self.detach(old)
    }

    /// Create a detached copy of a node without its children.
    pub fn shallow_clone(&mut self, id: NodeId) -> Result<NodeId, DomError> {
        let value = self.node(id)?.clone();
        Ok(self.create(value))
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        let mut node = self.node_mut(id)?;
        match node.value() {
            Node::Text(content) => {
                *content = text.into();
                Ok(())
            }
            _ => Err(DomError::NotText(id)),
        }
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let mut node = self.node_mut(id)?;
        match node.value() {
            Node::Element(element) => {
                element.attributes.insert(name.into(), value.into());
                Ok(())
            }
            _ => Err(DomError::NotElement(id)),
        }
    }

    /// Move every child of `parent` into a new `element`, which becomes `parent`'s only child.
    pub fn wrap_children(&mut self, parent: NodeId, element: Element) -> Result<NodeId, DomError> {
        self.ensure_container(parent)?;
        let wrapper = self.create(element);
        self.node_mut(wrapper)?.reparent_from_id_append(parent);
        self.node_mut(parent)?.append_id(wrapper);
        Ok(wrapper)
    }

    /// Concatenated text of every text node below `id`, in document order.
    pub fn text_content(&self, id: NodeId) -> Result<String, DomError> {
        let mut content = String::new();
        for node in self.node_ref(id)?.descendants() {
            if let Node::Text(text) = node.value() {
                content.push_str(text);
            }
        }
        Ok(content)
    }

    /// Every attached element with the given tag name, in document order.
    pub fn elements_named(&self, name: &str) -> Vec<NodeId> {
        self.tree
            .root()
            .descendants()
            .filter(|node| matches!(node.value(), Node::Element(element) if element.name == name))
            .map(|node| node.id())
            .collect()
    }

    fn ensure_container(&self, id: NodeId) -> Result<(), DomError> {
        match self.node(id)? {
            Node::Text(_) => Err(DomError::NotElement(id)),
            _ => Ok(()),
        }
    }

    fn ensure_attached(&self, id: NodeId) -> Result<(), DomError> {
        match self.node_ref(id)?.parent() {
            Some(_) => Ok(()),
            None => Err(DomError::Detached(id)),
        }
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset of the `offset`-th character of `text`.
pub(crate) fn char_to_byte(text: &str, offset: usize) -> Option<usize> {
    if offset == text.chars().count() {
        return Some(text.len());
    }
    text.char_indices().nth(offset).map(|(byte, _)| byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_navigate() {
        let mut fragment = Fragment::new();
        let root = fragment.root();
        let code = fragment.append(root, Element::new("code")).unwrap();
        let a = fragment.append(code, Node::text("a")).unwrap();
        let b = fragment.append(code, Node::text("b")).unwrap();

        assert_eq!(fragment.first_child(code), Some(a));
        assert_eq!(fragment.next_sibling(a), Some(b));
        assert_eq!(fragment.next_sibling(b), None);
        assert_eq!(fragment.parent(b), Some(code));
        assert_eq!(fragment.children(code), vec![a, b]);
        assert_eq!(fragment.text_content(code).unwrap(), "ab");
    }

    #[test]
    fn test_text_nodes_cannot_have_children() {
        let mut fragment = Fragment::new();
        let root = fragment.root();
        let text = fragment.append(root, Node::text("x")).unwrap();
        assert_eq!(
            fragment.append(text, Node::text("y")),
            Err(DomError::NotElement(text))
        );
    }

    #[test]
    fn test_replace_keeps_sibling_order() {
        let mut fragment = Fragment::new();
        let root = fragment.root();
        let first = fragment.append(root, Node::text("1")).unwrap();
        let middle = fragment.append(root, Element::new("b")).unwrap();
        let last = fragment.append(root, Node::text("3")).unwrap();

        let clone = fragment.shallow_clone(middle).unwrap();
        fragment.replace(middle, clone).unwrap();

        assert_eq!(fragment.children(root), vec![first, clone, last]);
        assert_eq!(fragment.parent(middle), None);
        assert_eq!(fragment.element(clone).unwrap().name, "b");
    }

    #[test]
    fn test_insert_next_to_detached_node_fails() {
        let mut fragment = Fragment::new();
        let orphan = fragment.create(Node::text("x"));
        assert_eq!(
            fragment.insert_after(orphan, Node::text("y")),
            Err(DomError::Detached(orphan))
        );
    }

    #[test]
    fn test_wrap_children() {
        let mut fragment = Fragment::new();
        let root = fragment.root();
        fragment.append(root, Node::text("a")).unwrap();
        fragment.append(root, Element::new("em")).unwrap();

        let code = fragment.wrap_children(root, Element::new("code")).unwrap();

        assert_eq!(fragment.children(root), vec![code]);
        assert_eq!(fragment.children(code).len(), 2);
    }

    #[test]
    fn test_set_text_and_attribute_check_kinds() {
        let mut fragment = Fragment::new();
        let root = fragment.root();
        let text = fragment.append(root, Node::text("x")).unwrap();
        let element = fragment.append(root, Element::new("b")).unwrap();

        fragment.set_text(text, "y").unwrap();
        fragment.set_attribute(element, "class", "kw").unwrap();

        assert_eq!(fragment.text(text).unwrap(), "y");
        assert_eq!(fragment.element(element).unwrap().attribute("class"), Some("kw"));
        assert_eq!(fragment.set_text(element, "z"), Err(DomError::NotText(element)));
        assert_eq!(
            fragment.set_attribute(text, "a", "b"),
            Err(DomError::NotElement(text))
        );
    }

    #[test]
    fn test_marker_elements() {
        let mut fragment = Fragment::new();
        let root = fragment.root();
        let i = fragment
            .append(root, Element::new("i").with_marker("ignore"))
            .unwrap();
        let text = fragment.append(i, Node::text("x")).unwrap();

        assert!(fragment.node(i).unwrap().is_element());
        assert!(!fragment.node(text).unwrap().is_element());
        assert_eq!(fragment.element(i).unwrap().attribute("ignore"), Some(""));
        assert_eq!(fragment.to_string(), "<i ignore>x</i>");
    }

    #[test]
    fn test_char_to_byte() {
        assert_eq!(char_to_byte("aé b", 0), Some(0));
        assert_eq!(char_to_byte("aé b", 2), Some(3));
        assert_eq!(char_to_byte("aé b", 4), Some(5));
        assert_eq!(char_to_byte("aé b", 5), None);
    }
}
