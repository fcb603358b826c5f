//! Stand-off markup trees
//!
//! Text and markup are kept apart: the text lives in one append-only
//! [`ContentBuffer`], and markup is a tree of [`Element`]s that point into it
//! with spans instead of embedding tags.
//!
//! ## Core Design
//!
//! ```text
//! ContentBuffer (Arc, read-only) ← Document → ElementArena → Element { span, children: [NodeId] }
//!                                     ↓
//!                      insert / merge / ancestor_nodes / matching_nodes
//! ```
//!
//! New markup is added with [`Document::insert`]: the engine finds the one
//! place in the tree where the new element nests cleanly, adopting contained
//! elements and resolving partial overlaps with a [`Balancing`] policy.
//! [`Document::merge_markup`] applies the same engine to every element of
//! another document over the same buffer.

pub mod arena;
pub mod builder;
pub mod content;
pub mod document;
pub mod element;
pub mod error;
pub mod insert;
pub mod merge;
pub mod types;
pub mod utils;

pub use arena::ElementArena;
pub use builder::DocumentBuilder;
pub use content::{ContentBuffer, ContentView};
pub use document::{Document, MatchingNodes};
pub use element::{Attribute, Attributes, Element};
pub use error::{Result, StandoffError};
pub use insert::Insertion;
pub use types::*;
