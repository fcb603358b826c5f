//! Documents and traversal
//!
//! A document is a root element in an [`ElementArena`] plus the shared content
//! buffer. The root's span is the document's window; public positions are
//! relative to the window start, stored spans are absolute buffer offsets.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::arena::ElementArena;
use crate::content::{ContentBuffer, ContentView};
use crate::element::Element;
use crate::error::{Result, StandoffError};
use crate::types::{NodeId, Span};

#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) arena: ElementArena,
    pub(crate) root: NodeId,
    pub(crate) content: Arc<ContentBuffer>,
}

impl Document {
    /// Wrap an arena whose `root` subtree satisfies the tree invariants
    pub fn new(arena: ElementArena, root: NodeId, content: Arc<ContentBuffer>) -> Result<Self> {
        let doc = Self {
            arena,
            root,
            content,
        };
        doc.validate()?;
        Ok(doc)
    }

    /// Document with a single root element spanning all of `text`
    pub fn from_text(root: &Element, text: impl Into<String>) -> Self {
        Self::from_content(root, Arc::new(ContentBuffer::from(text.into())))
    }

    /// Bare document over an existing buffer, root spanning all of it
    ///
    /// Used to start a new markup layer that can later be merged into
    /// another document over the same buffer.
    pub fn from_content(root: &Element, content: Arc<ContentBuffer>) -> Self {
        let mut arena = ElementArena::new();
        let root = arena.add(root.shallow_copy().with_span(Span::new(0, content.len())));
        Self {
            arena,
            root,
            content,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_element(&self) -> &Element {
        &self.arena[self.root]
    }

    pub fn element(&self, id: NodeId) -> Result<&Element> {
        self.arena.get(id)
    }

    pub fn arena(&self) -> &ElementArena {
        &self.arena
    }

    /// Direct arena access; callers editing spans or links must keep the tree valid
    pub fn arena_mut(&mut self) -> &mut ElementArena {
        &mut self.arena
    }

    /// Absolute span of the root
    pub fn window(&self) -> Span {
        self.root_element().span()
    }

    pub fn content(&self) -> ContentView<'_> {
        ContentView::new(&self.content, self.window())
    }

    pub fn content_buffer(&self) -> &Arc<ContentBuffer> {
        &self.content
    }

    /// Whether both documents sit on the very same buffer
    pub fn shares_content_with(&self, other: &Document) -> bool {
        Arc::ptr_eq(&self.content, &other.content)
    }

    /// Text covered by an element
    pub fn text_of(&self, id: NodeId) -> Result<&str> {
        Ok(self.content.slice_span(self.element(id)?.span()))
    }

    /// Elements whose span contains `position`, root first
    ///
    /// `position` is relative to the window. Containment is half-open, so
    /// zero-width elements never contain anything.
    pub fn ancestor_nodes(&self, position: usize) -> Vec<NodeId> {
        let Some(absolute) = self.window().start.checked_add(position) else {
            return Vec::new();
        };
        let mut path = Vec::new();
        let mut current = Some(self.root);

        while let Some(id) = current {
            let el = &self.arena[id];
            if !el.span().contains(absolute) {
                break;
            }
            path.push(id);
            current = el
                .children()
                .iter()
                .copied()
                .find(|&c| self.arena[c].span().contains(absolute));
        }

        path
    }

    /// Ancestors of `node`, root first, located by span containment alone
    ///
    /// Parent links are not consulted. At each level the children whose span
    /// covers the node's span are tried left to right.
    pub fn ancestor_nodes_of(&self, node: NodeId) -> Result<Vec<NodeId>> {
        let target = self
            .arena
            .get(node)
            .map_err(|_| StandoffError::StructuralLookupFailure(node))?
            .span();
        if node == self.root {
            return Ok(Vec::new());
        }
        if !self.window().contains_span(&target) {
            return Err(StandoffError::StructuralLookupFailure(node));
        }

        // (element, next child index to try)
        let mut stack: Vec<(NodeId, usize)> = vec![(self.root, 0)];
        while let Some(top) = stack.last_mut() {
            let (id, next) = *top;
            let children = self.arena[id].children();

            let found = children
                .iter()
                .enumerate()
                .skip(next)
                .take_while(|(_, &c)| self.arena[c].start() <= target.start)
                .find(|(_, &c)| self.arena[c].span().contains_span(&target));

            match found {
                Some((_, &child)) if child == node => {
                    return Ok(stack.iter().map(|&(id, _)| id).collect());
                }
                Some((idx, &child)) => {
                    top.1 = idx + 1;
                    stack.push((child, 0));
                }
                None => {
                    stack.pop();
                }
            }
        }

        Err(StandoffError::StructuralLookupFailure(node))
    }

    /// Topmost elements matching `pattern`; descendants of a match are not visited
    pub fn matching_nodes<'a>(&'a self, pattern: &'a Element) -> MatchingNodes<'a> {
        let mut frontier = VecDeque::new();
        frontier.push_back(self.root);
        MatchingNodes {
            arena: &self.arena,
            pattern,
            frontier,
        }
    }

    /// Deep copy of the subtree at `id` as a document over the same buffer
    ///
    /// Namespace declarations in scope at `id` are declared on the new root.
    pub fn sub_document(&self, id: NodeId) -> Result<Document> {
        let scope = self.arena.in_scope_namespaces(id)?;

        let mut arena = ElementArena::new();
        let root = arena.copy_subtree(&self.arena, id)?;
        for mapping in &scope {
            arena[root].declare_namespace(&mapping.prefix, &mapping.uri)?;
        }

        Ok(Document {
            arena,
            root,
            content: Arc::clone(&self.content),
        })
    }

    /// Check parent links and span nesting of the whole tree
    pub fn validate(&self) -> Result<()> {
        let root = self.arena.get(self.root)?;
        if root.parent().is_some() {
            return Err(StandoffError::InvariantViolation(format!(
                "root {} has a parent",
                root
            )));
        }
        let window = root.span();
        if window.end < window.start || window.end > self.content.len() {
            return Err(StandoffError::InvariantViolation(format!(
                "root span {} does not fit content of length {}",
                window,
                self.content.len()
            )));
        }

        let mut seen = vec![false; self.arena.len()];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let slot = seen
                .get_mut(id as usize)
                .ok_or(StandoffError::NodeNotFound(id))?;
            if *slot {
                return Err(StandoffError::InvariantViolation(format!(
                    "node {} is reachable twice",
                    id
                )));
            }
            *slot = true;

            let parent = &self.arena[id];
            let mut pos = parent.start();
            for &child_id in parent.children() {
                let child = self.arena.get(child_id)?;
                if child.parent() != Some(id) {
                    return Err(StandoffError::InvariantViolation(format!(
                        "{} does not point back to its parent {}",
                        child, parent
                    )));
                }
                let span = child.span();
                if span.end < span.start || span.start < pos || span.end > parent.end() {
                    return Err(StandoffError::InvariantViolation(format!(
                        "{} overlaps a sibling or leaves its parent {}",
                        child, parent
                    )));
                }
                pos = span.end;
                stack.push(child_id);
            }
        }

        Ok(())
    }
}

/// Lazy search for the topmost matches of a pattern
pub struct MatchingNodes<'a> {
    arena: &'a ElementArena,
    pattern: &'a Element,
    frontier: VecDeque<NodeId>,
}

impl Iterator for MatchingNodes<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.frontier.pop_front() {
            let el = &self.arena[id];
            if el.matches(self.pattern) {
                return Some(id);
            }
            self.frontier.extend(el.children().iter().copied());
        }
        None
    }
}
