//! Streaming document construction
//!
//! Readers feed the builder in document order: start element, text, end
//! element. Text is appended to the content buffer and element spans are
//! closed at the current buffer length.

use std::sync::Arc;

use crate::arena::ElementArena;
use crate::content::ContentBuffer;
use crate::document::Document;
use crate::element::Element;
use crate::error::{Result, StandoffError};
use crate::types::{NodeId, Span};

#[derive(Debug, Default)]
pub struct DocumentBuilder {
    arena: ElementArena,
    content: ContentBuffer,
    stack: Vec<NodeId>,
    root: Option<NodeId>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue appending to an existing buffer; offsets start at its end
    pub fn with_content(content: ContentBuffer) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }

    /// Open an element at the current position
    pub fn start_element(&mut self, element: Element) -> Result<NodeId> {
        if self.stack.is_empty() && self.root.is_some() {
            return Err(StandoffError::MalformedTree(format!(
                "second root element <{}>",
                element.qualified_name()
            )));
        }

        let pos = self.content.len();
        let id = self.arena.add(element.with_span(Span::point(pos)));
        match self.stack.last() {
            Some(&parent) => self.arena.append_child(parent, id)?,
            None => self.root = Some(id),
        }
        self.stack.push(id);
        Ok(id)
    }

    /// Append text to the innermost open element
    pub fn text(&mut self, text: &str) -> Result<Span> {
        if self.stack.is_empty() {
            return Err(StandoffError::MalformedTree(
                "text outside of the root element".to_string(),
            ));
        }
        Ok(self.content.push_str(text))
    }

    /// Close the innermost open element
    pub fn end_element(&mut self) -> Result<NodeId> {
        let id = self.stack.pop().ok_or_else(|| {
            StandoffError::MalformedTree("end element without open element".to_string())
        })?;
        let el = &mut self.arena[id];
        let span = Span::new(el.start(), self.content.len());
        el.set_span(span);
        Ok(id)
    }

    /// Innermost open element
    pub fn current(&self) -> Option<NodeId> {
        self.stack.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn element(&self, id: NodeId) -> Result<&Element> {
        self.arena.get(id)
    }

    /// Resolve `prefix` against the declarations of the open elements
    pub fn lookup_namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.current()
            .and_then(|id| self.arena.lookup_namespace_uri(id, prefix))
    }

    pub fn finish(self) -> Result<Document> {
        if let Some(&open) = self.stack.last() {
            return Err(StandoffError::MalformedTree(format!(
                "element <{}> is not closed",
                self.arena[open].qualified_name()
            )));
        }
        let root = self
            .root
            .ok_or_else(|| StandoffError::MalformedTree("no root element".to_string()))?;
        Document::new(self.arena, root, Arc::new(self.content))
    }
}
