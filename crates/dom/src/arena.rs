//! Arena-based DOM tree storage
//!
//! "Bad programmers worry about the code. Good programmers worry about
//! data structures and their relationships."
//!
//! The arena avoids Rc/RefCell trees entirely: every node lives in one
//! `Vec<DomNode>` and links are `u32` indices. Mutations (insert, detach)
//! only rewrite index lists, so moving a subtree is O(siblings).
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```
//!
//! Nodes are never freed. A node removed from the tree stays in the arena
//! as a detached node (no parent, not the root).

use crate::error::{DomError, Result};
use crate::types::{Attribute, DomNode, NodeId, NodeType};

/// Arena allocator for DOM nodes
#[derive(Debug, Clone)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Root node ID (the `#document` node for parsed documents)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Create an arena holding an empty `#document` root
    pub fn new_document() -> Self {
        let mut arena = Self::new();
        let root = arena.add_node(DomNode::new(0, NodeType::Document, "#document"));
        arena.root_id = Some(root);
        arena
    }

    /// Add a node to the arena, returns its ID
    ///
    /// The node's `node_id` is overwritten with its arena index.
    pub fn add_node(&mut self, mut node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        node.node_id = node_id;
        self.nodes.push(node);
        node_id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.add_node(DomNode::new(
            0,
            NodeType::Element,
            tag.to_ascii_lowercase(),
        ))
    }

    /// Create a detached element with attributes
    pub fn create_element_with_attrs(
        &mut self,
        tag: &str,
        attrs: impl IntoIterator<Item = Attribute>,
    ) -> NodeId {
        let id = self.create_element(tag);
        self.nodes[id as usize].attributes.extend(attrs);
        id
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        let mut node = DomNode::new(0, NodeType::Text, "#text");
        node.node_value = text.into();
        self.add_node(node)
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        let mut node = DomNode::new(0, NodeType::Comment, "#comment");
        node.node_value = text.into();
        self.add_node(node)
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Total number of nodes (attached and detached)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First child of a node, if any
    pub fn first_child(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.children_ids.first().copied())
    }

    /// Element children only (skips text and comments)
    pub fn element_children(&self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let node = self.get(node_id)?;
        Ok(node
            .children_ids
            .iter()
            .copied()
            .filter(|&id| self.nodes[id as usize].is_element())
            .collect())
    }

    /// True if `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> Result<bool> {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.get(id)?.parent_id;
        }
        Ok(false)
    }

    /// True if the node is reachable from the arena root
    pub fn is_connected(&self, node_id: NodeId) -> Result<bool> {
        match self.root_id {
            Some(root) => self.is_inclusive_ancestor(root, node_id),
            None => Ok(false),
        }
    }

    /// Remove a node from its parent. No-op for detached nodes.
    pub fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let parent_id = match self.get(node_id)?.parent_id {
            Some(p) => p,
            None => return Ok(()),
        };
        let parent = self.get_mut(parent_id)?;
        parent.children_ids.retain(|id| *id != node_id);
        self.get_mut(node_id)?.parent_id = None;
        Ok(())
    }

    /// Insert `child` into `parent` before `reference` (append when `None`)
    ///
    /// The child is detached from its current parent first. Inserting a
    /// node into itself or its own subtree is rejected.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        let parent_node = self.get(parent)?;
        if !matches!(parent_node.node_type, NodeType::Element | NodeType::Document) {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "parent cannot have children",
            });
        }
        if self.get(child)?.node_type == NodeType::Document {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "a document cannot be inserted",
            });
        }
        if self.is_inclusive_ancestor(child, parent)? {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "node would become its own ancestor",
            });
        }
        if let Some(reference) = reference {
            if self.get(reference)?.parent_id != Some(parent) {
                return Err(DomError::HierarchyRequest {
                    parent,
                    child,
                    reason: "reference node is not a child of parent",
                });
            }
        }

        self.detach(child)?;

        let parent_node = self.get_mut(parent)?;
        let position = reference
            .and_then(|r| parent_node.children_ids.iter().position(|id| *id == r))
            .unwrap_or(parent_node.children_ids.len());
        parent_node.children_ids.insert(position, child);
        self.get_mut(child)?.parent_id = Some(parent);
        Ok(())
    }

    /// Append `child` as last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` as first child of `parent`, shifting existing children
    pub fn prepend(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let first = self.first_child(parent)?;
        self.insert_before(parent, child, first)
    }

    /// Detach every child of a node
    pub fn remove_children(&mut self, node_id: NodeId) -> Result<()> {
        let children = std::mem::take(&mut self.get_mut(node_id)?.children_ids);
        for child in children {
            self.get_mut(child)?.parent_id = None;
        }
        Ok(())
    }

    /// Traverse tree depth-first (iterative, no recursion)
    ///
    /// This is the "good taste" version - no special cases for leaf nodes
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Descendants of `start_id` in tree order, excluding `start_id` itself
    pub fn descendants(&self, start_id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        self.traverse_df(start_id, |node| {
            if node.node_id != start_id {
                out.push(node.node_id);
            }
            Ok(())
        })?;
        Ok(out)
    }

    /// All descendant elements of `start_id` with the given tag, in tree order
    ///
    /// Equivalent to `element.getElementsByTagName(tag)`.
    pub fn elements_by_tag(&self, start_id: NodeId, tag: &str) -> Result<Vec<NodeId>> {
        Ok(self
            .descendants(start_id)?
            .into_iter()
            .filter(|&id| self.nodes[id as usize].is_tag(tag))
            .collect())
    }

    /// All connected elements with the given tag, in tree order
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        match self.root_id {
            Some(root) => self.elements_by_tag(root, tag).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Unchecked node access for ids this crate allocated itself
    pub(crate) fn node(&self, node_id: NodeId) -> &DomNode {
        &self.nodes[node_id as usize]
    }

    pub(crate) fn node_mut(&mut self, node_id: NodeId) -> &mut DomNode {
        &mut self.nodes[node_id as usize]
    }

    /// Append a freshly created, detached node without hierarchy checks
    pub(crate) fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent as usize].children_ids.push(child);
        self.nodes[child as usize].parent_id = Some(parent);
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (DomArena, NodeId, NodeId, NodeId) {
        // document -> div -> [span, span]
        let mut arena = DomArena::new_document();
        let root = arena.root_id().unwrap();
        let div = arena.create_element("DIV");
        let a = arena.create_element("span");
        let b = arena.create_element("span");
        arena.append_child(root, div).unwrap();
        arena.append_child(div, a).unwrap();
        arena.append_child(div, b).unwrap();
        (arena, div, a, b)
    }

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();
        let id = arena.create_element("div");
        assert_eq!(id, 0);

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.node_name, "div");
        assert!(retrieved.parent_id.is_none());
        assert!(arena.get(42).is_err());
    }

    #[test]
    fn test_traverse_df() {
        let (arena, div, _, _) = tree();

        let mut visited = Vec::new();
        arena
            .traverse_df(div, |node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(visited, vec!["div", "span", "span"]);
    }

    #[test]
    fn test_prepend_shifts_existing_children() {
        let (mut arena, div, a, b) = tree();
        let nav = arena.create_element("nav");

        arena.prepend(div, nav).unwrap();

        let children: Vec<_> = arena.get(div).unwrap().children_ids.to_vec();
        assert_eq!(children, vec![nav, a, b]);
        assert_eq!(arena.get(nav).unwrap().parent_id, Some(div));
    }

    #[test]
    fn test_prepend_into_empty_parent() {
        let mut arena = DomArena::new_document();
        let header = arena.create_element("header");
        let nav = arena.create_element("nav");

        arena.prepend(header, nav).unwrap();

        assert_eq!(arena.first_child(header).unwrap(), Some(nav));
    }

    #[test]
    fn test_insert_moves_node() {
        let (mut arena, div, a, b) = tree();
        let other = arena.create_element("p");

        arena.append_child(other, a).unwrap();

        assert_eq!(arena.get(div).unwrap().children_ids.to_vec(), vec![b]);
        assert_eq!(arena.get(a).unwrap().parent_id, Some(other));
    }

    #[test]
    fn test_insert_into_own_subtree_rejected() {
        let (mut arena, div, a, _) = tree();

        let err = arena.append_child(a, div).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest { .. }));
        // Tree untouched
        assert_eq!(arena.get(a).unwrap().parent_id, Some(div));
    }

    #[test]
    fn test_text_cannot_have_children() {
        let mut arena = DomArena::new();
        let text = arena.create_text("hi");
        let span = arena.create_element("span");

        assert!(arena.append_child(text, span).is_err());
    }

    #[test]
    fn test_connected_and_find_by_tag() {
        let (mut arena, _, a, _) = tree();
        let loose = arena.create_element("span");

        assert!(arena.is_connected(a).unwrap());
        assert!(!arena.is_connected(loose).unwrap());
        // Detached nodes are not found by document lookups
        assert_eq!(arena.find_by_tag("span").len(), 2);
    }
}
