//! XML conversion for stand-off documents
//!
//! ```text
//! XML text → XmlReader → Document → emit → MarkupHandler (XmlWriter, EventCollector, ...)
//! ```
//!
//! The core crate never parses or prints XML; this crate is the bridge.

pub mod error;
pub mod events;
pub mod reader;
pub mod writer;

pub use error::{Result, XmlError};
pub use events::{emit, EventCollector, MarkupEvent, MarkupHandler};
pub use reader::{parse_document, ReaderConfig, XmlReader};
pub use writer::{to_xml_string, to_xml_string_with_config, WriterConfig, XmlWriter};
