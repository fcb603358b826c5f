//! Markup event stream
//!
//! [`emit`] walks a document in order and reports it as a stream of
//! SAX-style events, interleaving the text between elements. Handlers decide
//! what to do with them: [`XmlWriter`](crate::writer::XmlWriter) serializes,
//! [`EventCollector`] keeps owned copies.

use standoff::{Document, Element, NodeId};

use crate::error::Result;

/// Receiver of the event stream
///
/// Prefix mappings of an element are reported right before its start event
/// and ended right after its end event.
pub trait MarkupHandler {
    fn start_document(&mut self) -> Result<()> {
        Ok(())
    }

    fn start_prefix_mapping(&mut self, _prefix: &str, _uri: &str) -> Result<()> {
        Ok(())
    }

    fn start_element(&mut self, element: &Element) -> Result<()>;

    fn characters(&mut self, text: &str) -> Result<()>;

    fn end_element(&mut self, element: &Element) -> Result<()>;

    fn end_prefix_mapping(&mut self, _prefix: &str) -> Result<()> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        Ok(())
    }
}

enum Step {
    Open(NodeId),
    Text(usize, usize),
    Close(NodeId),
}

/// Report `doc` to `handler` in document order
pub fn emit<H: MarkupHandler + ?Sized>(doc: &Document, handler: &mut H) -> Result<()> {
    let arena = doc.arena();
    let buffer = doc.content_buffer();

    handler.start_document()?;

    let mut stack = vec![Step::Open(doc.root())];
    while let Some(step) = stack.pop() {
        match step {
            Step::Open(id) => {
                let el = arena.get(id)?;
                for mapping in el.namespace_mappings() {
                    handler.start_prefix_mapping(&mapping.prefix, &mapping.uri)?;
                }
                handler.start_element(el)?;

                // Pushed in reverse so they pop in document order
                let mut steps = Vec::with_capacity(el.children().len() * 2 + 2);
                let mut pos = el.start();
                for &child in el.children() {
                    let span = arena.get(child)?.span();
                    steps.push(Step::Text(pos, span.start));
                    steps.push(Step::Open(child));
                    pos = span.end;
                }
                steps.push(Step::Text(pos, el.end()));
                steps.push(Step::Close(id));
                stack.extend(steps.into_iter().rev());
            }
            Step::Text(start, end) => {
                if start < end {
                    handler.characters(buffer.slice(start, end))?;
                }
            }
            Step::Close(id) => {
                let el = arena.get(id)?;
                handler.end_element(el)?;
                for mapping in el.namespace_mappings().iter().rev() {
                    handler.end_prefix_mapping(&mapping.prefix)?;
                }
            }
        }
    }

    handler.end_document()
}

/// Owned copy of one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent {
    StartDocument,
    StartPrefixMapping {
        prefix: String,
        uri: String,
    },
    StartElement {
        namespace_uri: Option<String>,
        qualified_name: String,
        /// (qualified name, value) pairs in order
        attributes: Vec<(String, String)>,
    },
    Characters(String),
    EndElement {
        qualified_name: String,
    },
    EndPrefixMapping {
        prefix: String,
    },
    EndDocument,
}

/// Handler that records every event
#[derive(Debug, Default)]
pub struct EventCollector {
    events: Vec<MarkupEvent>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[MarkupEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<MarkupEvent> {
        self.events
    }
}

impl MarkupHandler for EventCollector {
    fn start_document(&mut self) -> Result<()> {
        self.events.push(MarkupEvent::StartDocument);
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.events.push(MarkupEvent::StartPrefixMapping {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        });
        Ok(())
    }

    fn start_element(&mut self, element: &Element) -> Result<()> {
        self.events.push(MarkupEvent::StartElement {
            namespace_uri: element.namespace_uri().map(str::to_string),
            qualified_name: element.qualified_name().to_string(),
            attributes: element
                .attributes()
                .iter()
                .map(|a| (a.qualified_name.clone(), a.value.clone()))
                .collect(),
        });
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.events.push(MarkupEvent::Characters(text.to_string()));
        Ok(())
    }

    fn end_element(&mut self, element: &Element) -> Result<()> {
        self.events.push(MarkupEvent::EndElement {
            qualified_name: element.qualified_name().to_string(),
        });
        Ok(())
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<()> {
        self.events.push(MarkupEvent::EndPrefixMapping {
            prefix: prefix.to_string(),
        });
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.events.push(MarkupEvent::EndDocument);
        Ok(())
    }
}
