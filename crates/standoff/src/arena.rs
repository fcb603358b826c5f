//! Arena-based element storage
//!
//! Every element of a document lives in one `Vec<Element>` and is addressed
//! by a `u32` [`NodeId`]. Children lists and parent back-references are ids,
//! so re-parenting is a couple of index writes and the same-range override
//! set can hold plain ids.
//!
//! ```text
//! Arena: Vec<Element>
//!        [El0][El1][El2]...
//!         ↑ 4-byte index, not a pointer
//! ```
//!
//! Detached elements are never freed; they stay in the arena unreachable
//! from the root.

use std::ops::{Index, IndexMut, Range};

use crate::element::Element;
use crate::error::{Result, StandoffError};
use crate::types::{ns, NamespaceMapping, NodeId};

#[derive(Debug, Clone, Default)]
pub struct ElementArena {
    nodes: Vec<Element>,
}

impl ElementArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Add a detached element, returns its ID
    ///
    /// Any parent or children the element carries are dropped; attach it with
    /// [`append_child`](Self::append_child) or [`insert_child`](Self::insert_child).
    pub fn add(&mut self, mut element: Element) -> NodeId {
        element.parent = None;
        element.children.clear();
        let node_id = self.nodes.len() as NodeId;
        self.nodes.push(element);
        node_id
    }

    pub fn get(&self, node_id: NodeId) -> Result<&Element> {
        self.nodes
            .get(node_id as usize)
            .ok_or(StandoffError::NodeNotFound(node_id))
    }

    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut Element> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(StandoffError::NodeNotFound(node_id))
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        (node_id as usize) < self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All elements, attached or not, in allocation order
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.nodes.iter()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| i as NodeId)
    }

    pub fn children(&self, node_id: NodeId) -> Result<&[NodeId]> {
        Ok(self.get(node_id)?.children())
    }

    pub fn parent(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.parent())
    }

    /// Position of a node in its parent's children list
    pub fn index_in_parent(&self, node_id: NodeId) -> Result<Option<usize>> {
        match self.get(node_id)?.parent() {
            Some(parent) => Ok(self
                .get(parent)?
                .children()
                .iter()
                .position(|&c| c == node_id)),
            None => Ok(None),
        }
    }

    /// Whether `ancestor` is `node` or reachable from it through parent links
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id as usize).and_then(|el| el.parent);
        }
        false
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.get(parent)?;
        if self.get(child)?.parent.is_some() {
            return Err(StandoffError::AlreadyAttached(child));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(StandoffError::WouldCreateCycle { parent, child });
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_attachable(parent, child)?;
        self.nodes[child as usize].parent = Some(parent);
        self.nodes[parent as usize].children.push(child);
        Ok(())
    }

    /// Insert `child` at `index`; `index == len` appends
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        self.check_attachable(parent, child)?;
        let len = self.nodes[parent as usize].children.len();
        if index > len {
            return Err(StandoffError::InvalidChildIndex { parent, index, len });
        }
        self.nodes[child as usize].parent = Some(parent);
        self.nodes[parent as usize].children.insert(index, child);
        Ok(())
    }

    /// Detach the children in `range`, returning them in order with parents cleared
    pub fn remove_children(&mut self, parent: NodeId, range: Range<usize>) -> Result<Vec<NodeId>> {
        let len = self.get(parent)?.children.len();
        if range.start > range.end || range.end > len {
            return Err(StandoffError::InvalidChildIndex {
                parent,
                index: range.end.max(range.start),
                len,
            });
        }
        let removed: Vec<NodeId> = self.nodes[parent as usize].children.drain(range).collect();
        for &child in &removed {
            self.nodes[child as usize].parent = None;
        }
        Ok(removed)
    }

    /// Replace the whole children list of `parent`
    ///
    /// Previous children are detached. The new children must be detached
    /// already (or be current children of `parent`).
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) -> Result<()> {
        self.get(parent)?;
        for &child in &children {
            let el = self.get(child)?;
            if el.parent.is_some() && el.parent != Some(parent) {
                return Err(StandoffError::AlreadyAttached(child));
            }
            if self.is_ancestor_or_self(child, parent) {
                return Err(StandoffError::WouldCreateCycle { parent, child });
            }
        }

        let previous = std::mem::take(&mut self.nodes[parent as usize].children);
        for child in previous {
            self.nodes[child as usize].parent = None;
        }
        for &child in &children {
            self.nodes[child as usize].parent = Some(parent);
        }
        self.nodes[parent as usize].children = children.into_iter().collect();
        Ok(())
    }

    /// Prefix bound to `uri` at `node`, nearest declaration first
    ///
    /// A default-namespace declaration (empty prefix) is not a usable prefix,
    /// so when it is the nearest binding of `uri` the lookup yields `None`.
    pub fn lookup_prefix(&self, node_id: NodeId, uri: &str) -> Option<&str> {
        if uri == ns::XML {
            return Some(ns::XML_PREFIX);
        }
        let mut current = Some(node_id);
        while let Some(id) = current {
            let el = self.nodes.get(id as usize)?;
            if let Some(mapping) = el.namespace_mappings().iter().find(|m| m.uri == uri) {
                if mapping.prefix.is_empty() {
                    return None;
                }
                return Some(mapping.prefix.as_str());
            }
            current = el.parent;
        }
        None
    }

    /// URI bound to `prefix` at `node`; the empty prefix looks up the default namespace
    pub fn lookup_namespace_uri(&self, node_id: NodeId, prefix: &str) -> Option<&str> {
        if prefix == ns::XML_PREFIX {
            return Some(ns::XML);
        }
        let mut current = Some(node_id);
        while let Some(id) = current {
            let el = self.nodes.get(id as usize)?;
            if let Some(mapping) = el.namespace_mappings().iter().find(|m| m.prefix == prefix) {
                return Some(mapping.uri.as_str());
            }
            current = el.parent;
        }
        None
    }

    /// Every mapping visible at `node`, one per prefix, nearest declaration first
    pub fn in_scope_namespaces(&self, node_id: NodeId) -> Result<Vec<NamespaceMapping>> {
        let mut scope: Vec<NamespaceMapping> = Vec::new();
        let mut current = Some(node_id);
        while let Some(id) = current {
            let el = self.get(id)?;
            for mapping in el.namespace_mappings() {
                if !scope.iter().any(|m| m.prefix == mapping.prefix) {
                    scope.push(mapping.clone());
                }
            }
            current = el.parent;
        }
        Ok(scope)
    }

    /// Traverse a subtree depth-first in document order (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(NodeId, &Element) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node_id, node)?;

            // Reverse so children come off the stack left to right
            for &child_id in node.children.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Deep-copy a subtree of `source` into this arena, spans included
    ///
    /// Returns the id of the detached copy of `source_root`.
    pub fn copy_subtree(&mut self, source: &ElementArena, source_root: NodeId) -> Result<NodeId> {
        let root_el = source.get(source_root)?;
        let new_root = self.add(root_el.shallow_copy().with_span(root_el.span()));

        let mut stack: Vec<(NodeId, NodeId)> = root_el
            .children
            .iter()
            .rev()
            .map(|&c| (c, new_root))
            .collect();

        while let Some((source_id, new_parent)) = stack.pop() {
            let el = source.get(source_id)?;
            let copy = self.add(el.shallow_copy().with_span(el.span()));
            self.append_child(new_parent, copy)?;
            for &child in el.children.iter().rev() {
                stack.push((child, copy));
            }
        }

        Ok(new_root)
    }
}

impl Index<NodeId> for ElementArena {
    type Output = Element;

    fn index(&self, node_id: NodeId) -> &Element {
        &self.nodes[node_id as usize]
    }
}

impl IndexMut<NodeId> for ElementArena {
    fn index_mut(&mut self, node_id: NodeId) -> &mut Element {
        &mut self.nodes[node_id as usize]
    }
}
