//! XML text to stand-off document
//!
//! Text and CDATA inside the root element go into the content buffer, tags
//! become elements spanning the text between them. Comments, processing
//! instructions, DOCTYPE and anything outside the root element are dropped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use standoff::types::{ns, NamespaceMapping};
use standoff::utils::split_qualified_name;
use standoff::{ContentBuffer, Document, DocumentBuilder, Element};

use crate::error::{Result, XmlError};

/// Reader configuration
#[derive(Debug, Clone, Default)]
pub struct ReaderConfig {
    /// Trim whitespace around text and drop whitespace-only text
    pub trim_text: bool,
}

pub struct XmlReader {
    config: ReaderConfig,
}

impl XmlReader {
    pub fn new() -> Self {
        Self::with_config(ReaderConfig::default())
    }

    pub fn with_config(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Parse `xml` into a document over a fresh buffer
    pub fn read(&self, xml: &str) -> Result<Document> {
        self.read_into(xml, DocumentBuilder::new())
    }

    /// Parse `xml`, appending its text to an existing buffer
    pub fn read_with_content(&self, xml: &str, content: ContentBuffer) -> Result<Document> {
        self.read_into(xml, DocumentBuilder::with_content(content))
    }

    fn read_into(&self, xml: &str, mut builder: DocumentBuilder) -> Result<Document> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(self.config.trim_text);

        let mut seen_root = false;
        let mut elements = 0usize;

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    builder.start_element(element_from_tag(e, &builder)?)?;
                    seen_root = true;
                    elements += 1;
                }
                Event::Empty(ref e) => {
                    builder.start_element(element_from_tag(e, &builder)?)?;
                    builder.end_element()?;
                    seen_root = true;
                    elements += 1;
                }
                Event::End(_) => {
                    builder.end_element()?;
                }
                Event::Text(ref e) => {
                    if builder.depth() > 0 {
                        builder.text(&e.unescape()?)?;
                    }
                }
                Event::CData(ref e) => {
                    if builder.depth() > 0 {
                        builder.text(std::str::from_utf8(e)?)?;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err(XmlError::NoRootElement);
        }

        let doc = builder.finish()?;
        tracing::debug!(
            "[XmlReader] Parsed {} elements over {} bytes of text",
            elements,
            doc.content().len()
        );
        Ok(doc)
    }
}

impl Default for XmlReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse with the default configuration
pub fn parse_document(xml: &str) -> Result<Document> {
    XmlReader::new().read(xml)
}

/// Build an element from a start tag, resolving prefixes against its own
/// declarations first and then the open elements
fn element_from_tag(tag: &BytesStart<'_>, builder: &DocumentBuilder) -> Result<Element> {
    let mut mappings: Vec<NamespaceMapping> = Vec::new();
    let mut attributes: Vec<(String, String)> = Vec::new();

    for attr in tag.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = attr.unescape_value()?.into_owned();

        if key == ns::XMLNS_PREFIX {
            mappings.push(NamespaceMapping::new("", value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            mappings.push(NamespaceMapping::new(prefix, value));
        } else {
            attributes.push((key.to_string(), value));
        }
    }

    let resolve = |prefix: &str| -> Option<String> {
        if prefix == ns::XML_PREFIX {
            return Some(ns::XML.to_string());
        }
        mappings
            .iter()
            .find(|m| m.prefix == prefix)
            .map(|m| m.uri.clone())
            .or_else(|| builder.lookup_namespace_uri(prefix).map(str::to_string))
    };

    let resolve_bound = |prefix: &str| -> Result<String> {
        resolve(prefix).ok_or_else(|| XmlError::UnboundPrefix(prefix.to_string()))
    };

    let qualified_name = std::str::from_utf8(tag.name().as_ref())?.to_string();
    let (prefix, local_name) = split_qualified_name(&qualified_name);
    let namespace_uri = match prefix {
        Some(prefix) => Some(resolve_bound(prefix)?),
        // xmlns="" undeclares the default namespace
        None => resolve("").filter(|uri| !uri.is_empty()),
    };

    let mut element = Element::with_name(namespace_uri.as_deref(), local_name, &qualified_name);
    for mapping in &mappings {
        element.declare_namespace(&mapping.prefix, &mapping.uri)?;
    }
    for (key, value) in &attributes {
        let (prefix, local) = split_qualified_name(key);
        let uri = match prefix {
            Some(prefix) => resolve_bound(prefix)?,
            None => String::new(),
        };
        element.set_attribute(&uri, local, key, "", value)?;
    }

    Ok(element)
}
