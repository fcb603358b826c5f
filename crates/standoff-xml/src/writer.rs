//! Stand-off document to XML text

use quick_xml::escape::{escape, partial_escape};
use standoff::{Document, Element};

use crate::error::Result;
use crate::events::{emit, MarkupHandler};

/// Writer configuration
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Start with `<?xml version="1.0" encoding="UTF-8"?>`
    pub xml_declaration: bool,
    /// Write namespace mappings as `xmlns` attributes
    pub namespace_declarations: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            xml_declaration: false,
            namespace_declarations: true,
        }
    }
}

/// Serializing [`MarkupHandler`]
///
/// A start tag stays open until the next event shows whether the element
/// has content, so zero-width childless elements come out as `<x/>`.
#[derive(Debug, Default)]
pub struct XmlWriter {
    config: WriterConfig,
    out: String,
    pending_namespaces: Vec<(String, String)>,
    tag_open: bool,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::with_config(WriterConfig::default())
    }

    pub fn with_config(config: WriterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn close_start_tag(&mut self) {
        if self.tag_open {
            self.out.push('>');
            self.tag_open = false;
        }
    }

    fn write_attribute(&mut self, name: &str, value: &str) {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out.push_str(&escape(value));
        self.out.push('"');
    }
}

impl MarkupHandler for XmlWriter {
    fn start_document(&mut self) -> Result<()> {
        if self.config.xml_declaration {
            self.out
                .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
        }
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) -> Result<()> {
        if self.config.namespace_declarations {
            self.pending_namespaces
                .push((prefix.to_string(), uri.to_string()));
        }
        Ok(())
    }

    fn start_element(&mut self, element: &Element) -> Result<()> {
        self.close_start_tag();
        self.out.push('<');
        self.out.push_str(element.qualified_name());

        for (prefix, uri) in std::mem::take(&mut self.pending_namespaces) {
            if prefix.is_empty() {
                self.write_attribute("xmlns", &uri);
            } else {
                self.write_attribute(&format!("xmlns:{}", prefix), &uri);
            }
        }
        for attr in element.attributes() {
            self.write_attribute(&attr.qualified_name, &attr.value);
        }

        self.tag_open = true;
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.close_start_tag();
        self.out.push_str(&partial_escape(text));
        Ok(())
    }

    fn end_element(&mut self, element: &Element) -> Result<()> {
        if self.tag_open {
            self.out.push_str("/>");
            self.tag_open = false;
        } else {
            self.out.push_str("</");
            self.out.push_str(element.qualified_name());
            self.out.push('>');
        }
        Ok(())
    }
}

/// Serialize with the default configuration
pub fn to_xml_string(doc: &Document) -> Result<String> {
    to_xml_string_with_config(doc, WriterConfig::default())
}

pub fn to_xml_string_with_config(doc: &Document, config: WriterConfig) -> Result<String> {
    let mut writer = XmlWriter::with_config(config);
    emit(doc, &mut writer)?;
    Ok(writer.into_string())
}
