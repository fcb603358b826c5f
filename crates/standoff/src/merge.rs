//! Merging markup layers
//!
//! Two documents over the same content buffer can carry independent markup.
//! Merging walks the donor tree in pre-order and inserts a childless copy of
//! every donor element into the receiver, one at a time. Where a donor element
//! and its donor descendant share a range, the descendant would land outside
//! under the OUTER family; the already inserted copies of its donor ancestors
//! are passed as same-range overrides so the donor's nesting survives.

use ahash::AHashSet;

use crate::document::Document;
use crate::error::{Result, StandoffError};
use crate::types::{Balancing, NodeId};

impl Document {
    /// Merge the donor's whole tree, root included
    pub fn merge_markup(&mut self, donor: &Document, balancing: Balancing) -> Result<()> {
        self.merge_element(donor, donor.root(), balancing)
    }

    /// Merge the donor subtree rooted at `node`
    ///
    /// Donor spans are absolute offsets into the shared buffer and are used
    /// as they are. The donor is not modified.
    pub fn merge_element(
        &mut self,
        donor: &Document,
        node: NodeId,
        balancing: Balancing,
    ) -> Result<()> {
        if !self.shares_content_with(donor) {
            return Err(StandoffError::ContentMismatch);
        }
        let span = donor.element(node)?.span();
        let bounds = self.window();
        if !bounds.contains_span(&span) {
            return Err(StandoffError::SpanOutOfBounds { span, bounds });
        }
        donor
            .arena()
            .traverse_df(node, |_, el| self.check_char_boundaries(el.span()))?;

        tracing::debug!(
            "[Merge] {} into {} with {}",
            donor.element(node)?,
            self.root_element(),
            balancing
        );

        let no_overrides = AHashSet::new();
        // Copies of the donor ancestors of the current node, outermost first
        let mut path: Vec<NodeId> = Vec::new();
        let mut ancestors: AHashSet<NodeId> = AHashSet::new();
        let mut stack: Vec<(NodeId, usize)> = vec![(node, 0)];
        let mut merged = 0usize;

        while let Some((donor_id, depth)) = stack.pop() {
            while path.len() > depth {
                if let Some(left) = path.pop() {
                    ancestors.remove(&left);
                }
            }

            let el = donor.element(donor_id)?;
            let span = el.span();
            let empty = balancing.collapse(span).is_empty();
            let overrides = if balancing.nests_inside_same_range(empty) {
                &no_overrides
            } else {
                &ancestors
            };

            let copy =
                self.insert_absolute(&el.shallow_copy(), span, self.root, balancing, overrides)?;
            merged += 1;

            path.push(copy);
            ancestors.insert(copy);
            for &child in el.children().iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        tracing::debug!("[Merge] Inserted {} elements", merged);
        Ok(())
    }
}
