//! Elements of the markup tree and their attributes
//!
//! An element does not contain its text. It covers a [`Span`] of the shared
//! content buffer, and its children cover disjoint sub-spans in order.
//! Parent and children are [`NodeId`]s into the owning arena.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::error::{Result, StandoffError};
use crate::types::{NamespaceMapping, NodeId, Span};
use crate::utils::{local_part, prefix_part};

/// Default attribute type
pub const CDATA: &str = "CDATA";

/// A single attribute
///
/// An absent namespace is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub namespace_uri: String,
    pub local_name: String,
    pub qualified_name: String,
    pub attr_type: String,
    pub value: String,
}

impl Attribute {
    /// Build an attribute, filling in whichever name is missing
    ///
    /// The local name defaults to the part of the qualified name after the colon,
    /// the qualified name defaults to the local name and the type to CDATA.
    pub fn new(
        namespace_uri: &str,
        local_name: &str,
        qualified_name: &str,
        attr_type: &str,
        value: &str,
    ) -> Result<Self> {
        if local_name.is_empty() && qualified_name.is_empty() {
            return Err(StandoffError::InvalidAttributeName);
        }
        let local_name = if local_name.is_empty() {
            local_part(qualified_name)
        } else {
            local_name
        };
        let qualified_name = if qualified_name.is_empty() {
            local_name
        } else {
            qualified_name
        };
        let attr_type = if attr_type.is_empty() { CDATA } else { attr_type };

        Ok(Self {
            namespace_uri: namespace_uri.to_string(),
            local_name: local_name.to_string(),
            qualified_name: qualified_name.to_string(),
            attr_type: attr_type.to_string(),
            value: value.to_string(),
        })
    }

    /// CDATA attribute without namespace
    pub fn simple(local_name: &str, value: &str) -> Result<Self> {
        Self::new("", local_name, local_name, CDATA, value)
    }

    pub fn prefix(&self) -> Option<&str> {
        prefix_part(&self.qualified_name)
    }
}

/// Ordered attribute set, unique by (namespace URI, local name)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    items: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.items.iter()
    }

    pub fn index_of(&self, namespace_uri: &str, local_name: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|a| a.namespace_uri == namespace_uri && a.local_name == local_name)
    }

    pub fn get(&self, namespace_uri: &str, local_name: &str) -> Option<&Attribute> {
        self.index_of(namespace_uri, local_name)
            .map(|idx| &self.items[idx])
    }

    pub fn value(&self, namespace_uri: &str, local_name: &str) -> Option<&str> {
        self.get(namespace_uri, local_name).map(|a| a.value.as_str())
    }

    /// Look up by qualified name, the way it appears in markup
    pub fn value_by_qname(&self, qualified_name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|a| a.qualified_name == qualified_name)
            .map(|a| a.value.as_str())
    }

    /// Add an attribute, replacing one with the same namespace and local name in place
    pub fn set(&mut self, attribute: Attribute) {
        match self.index_of(&attribute.namespace_uri, &attribute.local_name) {
            Some(idx) => self.items[idx] = attribute,
            None => self.items.push(attribute),
        }
    }

    pub fn remove(&mut self, namespace_uri: &str, local_name: &str) -> Option<Attribute> {
        self.index_of(namespace_uri, local_name)
            .map(|idx| self.items.remove(idx))
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An element of the markup tree
///
/// Fresh elements have a zero-width span at 0, no parent and no children.
/// Span, parent and children are only changed by the arena and the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    namespace_uri: Option<String>,
    local_name: String,
    qualified_name: String,
    attributes: Attributes,
    namespaces: SmallVec<[NamespaceMapping; 2]>,

    span: Span,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
}

impl Element {
    /// Element without namespace
    pub fn new(local_name: &str) -> Self {
        Self::with_name(None, local_name, local_name)
    }

    /// Element whose local name is derived from `qualified_name`
    pub fn with_namespace(namespace_uri: Option<&str>, qualified_name: &str) -> Self {
        Self::with_name(namespace_uri, local_part(qualified_name), qualified_name)
    }

    pub fn with_name(namespace_uri: Option<&str>, local_name: &str, qualified_name: &str) -> Self {
        Self {
            namespace_uri: namespace_uri.map(str::to_string),
            local_name: local_name.to_string(),
            qualified_name: qualified_name.to_string(),
            attributes: Attributes::new(),
            namespaces: SmallVec::new(),
            span: Span::default(),
            parent: None,
            children: SmallVec::new(),
        }
    }

    /// Builder: add a CDATA attribute without namespace
    pub fn with_attribute(mut self, local_name: &str, value: &str) -> Result<Self> {
        self.set_simple_attribute(local_name, value)?;
        Ok(self)
    }

    /// Builder: give a detached element its span
    ///
    /// Used for insertion templates, whose span is read relative to the
    /// document window.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Copy name, attributes and namespace declarations; no span, parent or children
    pub fn shallow_copy(&self) -> Self {
        Self {
            namespace_uri: self.namespace_uri.clone(),
            local_name: self.local_name.clone(),
            qualified_name: self.qualified_name.clone(),
            attributes: self.attributes.clone(),
            namespaces: self.namespaces.clone(),
            span: Span::default(),
            parent: None,
            children: SmallVec::new(),
        }
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.namespace_uri.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Prefix of the qualified name, or "" when there is none
    pub fn namespace_prefix(&self) -> &str {
        prefix_part(&self.qualified_name).unwrap_or("")
    }

    pub fn has_namespace_prefix(&self) -> bool {
        !self.namespace_prefix().is_empty()
    }

    pub fn set_name(&mut self, namespace_uri: Option<&str>, local_name: &str, qualified_name: &str) {
        self.namespace_uri = namespace_uri.map(str::to_string);
        self.local_name = local_name.to_string();
        self.qualified_name = qualified_name.to_string();
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn set_attribute(
        &mut self,
        namespace_uri: &str,
        local_name: &str,
        qualified_name: &str,
        attr_type: &str,
        value: &str,
    ) -> Result<&mut Self> {
        let attribute = Attribute::new(namespace_uri, local_name, qualified_name, attr_type, value)?;
        self.attributes.set(attribute);
        Ok(self)
    }

    pub fn set_simple_attribute(&mut self, local_name: &str, value: &str) -> Result<&mut Self> {
        self.attributes.set(Attribute::simple(local_name, value)?);
        Ok(self)
    }

    /// Get attribute value without namespace
    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attributes.value("", local_name)
    }

    pub fn namespace_mappings(&self) -> &[NamespaceMapping] {
        &self.namespaces
    }

    /// Declare `prefix` for `uri` on this element
    ///
    /// Declaring the same binding twice is a no-op, rebinding a prefix fails.
    pub fn declare_namespace(&mut self, prefix: &str, uri: &str) -> Result<&mut Self> {
        if let Some(existing) = self.namespaces.iter().find(|m| m.prefix == prefix) {
            if existing.uri != uri {
                return Err(StandoffError::NamespaceConflict {
                    prefix: prefix.to_string(),
                    existing: existing.uri.clone(),
                    uri: uri.to_string(),
                });
            }
            return Ok(self);
        }
        self.namespaces.push(NamespaceMapping::new(prefix, uri));
        Ok(self)
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub(crate) fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether name and attributes conform to `pattern`
    ///
    /// Namespace and local name must be equal, and every attribute of the
    /// pattern must be present with the same value. Extra attributes on this
    /// element and the pattern's children are ignored.
    pub fn matches(&self, pattern: &Element) -> bool {
        self.namespace_uri().unwrap_or("") == pattern.namespace_uri().unwrap_or("")
            && self.local_name == pattern.local_name
            && pattern.attributes.iter().all(|pa| {
                self.attributes.value(&pa.namespace_uri, &pa.local_name) == Some(pa.value.as_str())
            })
    }
}

/// Debugging form, not a serialization
impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} @{}>", self.qualified_name, self.span)
    }
}
