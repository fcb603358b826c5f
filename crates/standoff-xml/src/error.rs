//! Error types for XML conversion

use quick_xml::events::attributes::AttrError;
use standoff::StandoffError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, XmlError>;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    #[error("Attribute error: {0}")]
    Attribute(#[from] AttrError),

    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error(transparent)]
    Standoff(#[from] StandoffError),

    #[error("Prefix '{0}' is not bound to a namespace")]
    UnboundPrefix(String),

    #[error("Document has no root element")]
    NoRootElement,
}
