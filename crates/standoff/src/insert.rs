//! Insertion engine
//!
//! Places a new, childless element into the tree so that its span nests
//! cleanly with the existing elements:
//!
//! ```text
//! for each level, starting at the subtree root:
//!   scan children left to right until one lies entirely after the candidate
//!     containing child       → descend into it
//!     contained / same range → part of the range the candidate will adopt
//!     partial overlap        → left or right neighbor, reconciled by the policy
//!   no containing child      → adopt the contiguous range, take its place
//! ```
//!
//! Same-range children are nested according to the policy, unless the caller
//! lists them in the override set, which flips the decision for them.

use ahash::AHashSet;

use crate::document::Document;
use crate::element::Element;
use crate::error::{Result, StandoffError};
use crate::types::{Balancing, NodeId, Span};
use crate::utils::make_qualified_name;

/// Parameters of a single insertion
#[derive(Debug, Clone)]
pub struct Insertion {
    balancing: Balancing,
    range: Option<Span>,
    within: Option<NodeId>,
    reverse_same_range: AHashSet<NodeId>,
}

impl Insertion {
    pub fn new(balancing: Balancing) -> Self {
        Self {
            balancing,
            range: None,
            within: None,
            reverse_same_range: AHashSet::new(),
        }
    }

    /// Target range relative to the document window; defaults to the candidate's span
    pub fn range(mut self, start: usize, end: usize) -> Self {
        self.range = Some(Span::new(start, end));
        self
    }

    /// Restrict the insertion to the subtree rooted at `node`
    pub fn within(mut self, node: NodeId) -> Self {
        self.within = Some(node);
        self
    }

    /// Flip the default same-range nesting for `node`
    pub fn reverse_same_range(mut self, node: NodeId) -> Self {
        self.reverse_same_range.insert(node);
        self
    }

    pub fn reverse_same_range_all(mut self, nodes: impl IntoIterator<Item = NodeId>) -> Self {
        self.reverse_same_range.extend(nodes);
        self
    }

    pub fn balancing(&self) -> Balancing {
        self.balancing
    }
}

/// How an existing child relates to the candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Before,
    After,
    Containing,
    Contained,
    SameRange,
    LeftOverlap,
    RightOverlap,
}

/// Classify `child` against the candidate span
///
/// `outer` selects the OUTER family's treatment of boundaries shared with
/// zero-width elements.
fn classify(cand: Span, child: Span, outer: bool) -> Relation {
    use Relation::*;

    if cand.is_empty() {
        let p = cand.start;
        if child.is_empty() {
            return match child.start.cmp(&p) {
                std::cmp::Ordering::Less => Before,
                std::cmp::Ordering::Greater => After,
                std::cmp::Ordering::Equal => SameRange,
            };
        }
        return if child.end < p {
            Before
        } else if child.start > p {
            After
        } else if child.start < p && p < child.end {
            Containing
        } else if p == child.start {
            if outer {
                After
            } else {
                Containing
            }
        } else if outer {
            Before
        } else {
            Containing
        };
    }

    if child.is_empty() {
        let q = child.start;
        return if q < cand.start {
            Before
        } else if q > cand.end {
            After
        } else if q > cand.start && q < cand.end {
            Contained
        } else if outer {
            Contained
        } else if q == cand.start {
            Before
        } else {
            After
        };
    }

    if child.end <= cand.start {
        Before
    } else if child.start >= cand.end {
        After
    } else if child == cand {
        SameRange
    } else if child.start <= cand.start && child.end >= cand.end {
        Containing
    } else if child.start >= cand.start && child.end <= cand.end {
        Contained
    } else if child.start < cand.start {
        LeftOverlap
    } else {
        RightOverlap
    }
}

/// Outcome of scanning one level
#[derive(Debug, Default)]
struct Level {
    first: Option<usize>,
    end: usize,
    left: Option<(usize, NodeId)>,
    right: Option<(usize, NodeId)>,
    containing: Option<NodeId>,
}

impl Document {
    /// Insert a copy of `candidate` and return the copy's id
    ///
    /// The candidate must not have children. Without an explicit range its
    /// own span is used, relative to the document window.
    pub fn insert(&mut self, candidate: &Element, insertion: &Insertion) -> Result<NodeId> {
        let relative = insertion.range.unwrap_or_else(|| candidate.span());
        let bounds = self.window();
        let span = relative
            .checked_offset(bounds.start)
            .ok_or(StandoffError::SpanOutOfBounds {
                span: relative,
                bounds,
            })?;
        let within = insertion.within.unwrap_or(self.root);
        self.insert_absolute(
            candidate,
            span,
            within,
            insertion.balancing,
            &insertion.reverse_same_range,
        )
    }

    /// Insert a copy of `candidate` at its own span
    pub fn insert_markup(&mut self, candidate: &Element, balancing: Balancing) -> Result<NodeId> {
        self.insert(candidate, &Insertion::new(balancing))
    }

    /// Insert a copy of `candidate` at `start..end`, relative to the window
    pub fn insert_markup_at(
        &mut self,
        candidate: &Element,
        balancing: Balancing,
        start: usize,
        end: usize,
    ) -> Result<NodeId> {
        self.insert(candidate, &Insertion::new(balancing).range(start, end))
    }

    /// Check preconditions, then place a copy at an absolute span
    pub(crate) fn insert_absolute(
        &mut self,
        candidate: &Element,
        span: Span,
        within: NodeId,
        balancing: Balancing,
        overrides: &AHashSet<NodeId>,
    ) -> Result<NodeId> {
        if candidate.has_children() {
            return Err(StandoffError::CandidateHasChildren(candidate.children().len()));
        }

        if within != self.root {
            self.ancestor_nodes_of(within)?;
        }
        let bounds = self.element(within)?.span();

        if span.end < span.start {
            return Err(StandoffError::InvalidSpan {
                start: span.start,
                end: span.end,
            });
        }
        let span = balancing.collapse(span);
        if !bounds.contains_span(&span) {
            return Err(StandoffError::SpanOutOfBounds { span, bounds });
        }
        self.check_char_boundaries(span)?;

        tracing::debug!(
            "[Insert] <{}> at {} with {}",
            candidate.qualified_name(),
            span,
            balancing
        );

        let node = self.arena.add(candidate.shallow_copy());
        self.place(node, span, within, balancing, overrides)?;
        Ok(node)
    }

    /// Reject a span whose ends would split a character of the buffer
    pub(crate) fn check_char_boundaries(&self, span: Span) -> Result<()> {
        for pos in [span.start, span.end] {
            if !self.content.is_char_boundary(pos) {
                return Err(StandoffError::NotCharBoundary(pos));
            }
        }
        Ok(())
    }

    /// Scan the children of `parent` for a candidate at `span`
    fn scan_level(
        &self,
        parent: NodeId,
        span: Span,
        balancing: Balancing,
        overrides: &AHashSet<NodeId>,
    ) -> Level {
        let outer = balancing.is_outer_family();
        let mut level = Level::default();

        for (i, &child) in self.arena[parent].children().iter().enumerate() {
            match classify(span, self.arena[child].span(), outer) {
                Relation::Before => {
                    if level.first.is_none() {
                        level.end = i + 1;
                    }
                }
                Relation::After => break,
                Relation::Containing => {
                    level.containing = Some(child);
                    let c = self.arena[child].span();
                    // a later sibling may still claim an empty candidate on a shared boundary
                    if !(span.is_empty() && (c.start == span.start || c.end == span.start)) {
                        break;
                    }
                }
                Relation::SameRange => {
                    let inside = balancing.nests_inside_same_range(span.is_empty())
                        != overrides.contains(&child);
                    if inside {
                        level.containing = Some(child);
                        if !span.is_empty() {
                            break;
                        }
                        continue;
                    }
                    if span.is_empty() {
                        // sibling after the existing zero-width element
                        if level.first.is_none() {
                            level.end = i + 1;
                        }
                    } else {
                        level.first.get_or_insert(i);
                        level.end = i + 1;
                    }
                }
                Relation::Contained => {
                    level.first.get_or_insert(i);
                    level.end = i + 1;
                }
                Relation::LeftOverlap => {
                    level.first.get_or_insert(i);
                    level.end = i + 1;
                    level.left = Some((i, child));
                }
                Relation::RightOverlap => {
                    level.first.get_or_insert(i);
                    level.end = i + 1;
                    level.right = Some((i, child));
                }
            }
        }

        level
    }

    /// Reconcile partial overlaps according to the policy
    fn balance(&self, level: &mut Level, span: &mut Span, balancing: Balancing) {
        match balancing {
            Balancing::Outer => {
                if let Some((_, left)) = level.left {
                    span.start = self.arena[left].start();
                }
                if let Some((_, right)) = level.right {
                    span.end = self.arena[right].end();
                }
            }
            Balancing::Inner => {
                if let Some((idx, left)) = level.left {
                    span.start = self.arena[left].end();
                    level.first = Some(idx + 1);
                }
                if let Some((idx, right)) = level.right {
                    span.end = self.arena[right].start();
                    level.end = idx;
                }
            }
            Balancing::Start | Balancing::End => {}
            Balancing::BalanceToStart => {
                if let Some((_, left)) = level.left {
                    *span = Span::point(span.start);
                    level.containing = Some(left);
                } else if level.right.is_some() {
                    *span = Span::point(span.start);
                    level.end = level.first.unwrap_or(level.end);
                }
            }
            Balancing::BalanceToEnd => {
                if let Some((_, right)) = level.right {
                    *span = Span::point(span.end);
                    level.containing = Some(right);
                } else if level.left.is_some() {
                    *span = Span::point(span.end);
                    level.first = Some(level.end);
                }
            }
        }
    }

    /// Descend from `sub_root` until the candidate has a definite slot, then attach it
    fn place(
        &mut self,
        node: NodeId,
        mut span: Span,
        mut sub_root: NodeId,
        balancing: Balancing,
        overrides: &AHashSet<NodeId>,
    ) -> Result<()> {
        loop {
            let mut level = self.scan_level(sub_root, span, balancing, overrides);
            if level.containing.is_none() {
                self.balance(&mut level, &mut span, balancing);
            }

            if let Some(child) = level.containing {
                tracing::trace!("[Insert] descending into {}", self.arena[child]);
                sub_root = child;
                continue;
            }

            let start = level.first.unwrap_or(level.end).min(level.end);
            tracing::trace!(
                "[Insert] adopting children {}..{} of {}",
                start,
                level.end,
                self.arena[sub_root]
            );

            let adopted = self.arena.remove_children(sub_root, start..level.end)?;
            self.arena.set_children(node, adopted)?;
            self.arena.insert_child(sub_root, start, node)?;
            self.arena[node].set_span(span);
            break;
        }

        self.resolve_prefix(node);
        Ok(())
    }

    /// Give a namespaced element without prefix the prefix in scope for its URI
    fn resolve_prefix(&mut self, node: NodeId) {
        let el = &self.arena[node];
        let uri = match el.namespace_uri() {
            Some(uri) if !uri.is_empty() && !el.has_namespace_prefix() => uri,
            _ => return,
        };
        let prefix = match self.arena.lookup_prefix(node, uri) {
            Some(prefix) => prefix.to_string(),
            None => return,
        };

        let uri = uri.to_string();
        let local = el.local_name().to_string();
        let qualified = make_qualified_name(&prefix, &local);
        self.arena[node].set_name(Some(&uri), &local, &qualified);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DocumentBuilder;
    use crate::utils::render;

    /// Tiny tree description: `(name, children)` nodes interleaved with text
    enum Part {
        Text(&'static str),
        El(&'static str, Vec<Part>),
    }

    fn t(text: &'static str) -> Part {
        Part::Text(text)
    }

    fn el(name: &'static str, children: Vec<Part>) -> Part {
        Part::El(name, children)
    }

    fn build(root: Part) -> Document {
        fn feed(b: &mut DocumentBuilder, part: &Part) {
            match part {
                Part::Text(text) => {
                    b.text(text).unwrap();
                }
                Part::El(name, children) => {
                    b.start_element(Element::new(name)).unwrap();
                    for child in children {
                        feed(b, child);
                    }
                    b.end_element().unwrap();
                }
            }
        }

        let mut b = DocumentBuilder::new();
        feed(&mut b, &root);
        b.finish().unwrap()
    }

    fn find(doc: &Document, name: &str) -> NodeId {
        doc.matching_nodes(&Element::new(name)).next().unwrap()
    }

    /// `0<p>1</p><r/><q>2</q>3`
    fn around() -> Document {
        build(el(
            "doc",
            vec![
                t("0"),
                el("p", vec![t("1")]),
                el("r", vec![]),
                el("q", vec![t("2")]),
                t("3"),
            ],
        ))
    }

    /// `0<p>12</p><r>3</r><q>45</q>6`
    fn overlap() -> Document {
        build(el(
            "doc",
            vec![
                t("0"),
                el("p", vec![t("12")]),
                el("r", vec![t("3")]),
                el("q", vec![t("45")]),
                t("6"),
            ],
        ))
    }

    fn insert_x(doc: &mut Document, balancing: Balancing, start: usize, end: usize) -> NodeId {
        let id = doc
            .insert_markup_at(&Element::new("x"), balancing, start, end)
            .unwrap();
        doc.validate().unwrap();
        id
    }

    #[test]
    fn test_classify_touching_spans() {
        let cand = Span::new(2, 4);
        assert_eq!(classify(cand, Span::new(0, 2), true), Relation::Before);
        assert_eq!(classify(cand, Span::new(4, 6), false), Relation::After);
        assert_eq!(classify(cand, Span::new(1, 5), true), Relation::Containing);
        assert_eq!(classify(cand, Span::new(2, 3), true), Relation::Contained);
        assert_eq!(classify(cand, Span::new(1, 3), true), Relation::LeftOverlap);
        assert_eq!(classify(cand, Span::new(3, 5), true), Relation::RightOverlap);
        assert_eq!(classify(cand, cand, false), Relation::SameRange);
    }

    #[test]
    fn test_classify_empty_boundaries() {
        let point = Span::point(2);
        assert_eq!(classify(point, Span::new(2, 4), true), Relation::After);
        assert_eq!(classify(point, Span::new(2, 4), false), Relation::Containing);
        assert_eq!(classify(point, Span::new(0, 2), true), Relation::Before);
        assert_eq!(classify(point, Span::new(0, 2), false), Relation::Containing);

        let cand = Span::new(2, 4);
        assert_eq!(classify(cand, Span::point(2), true), Relation::Contained);
        assert_eq!(classify(cand, Span::point(2), false), Relation::Before);
        assert_eq!(classify(cand, Span::point(4), false), Relation::After);
        assert_eq!(classify(cand, Span::point(3), false), Relation::Contained);
    }

    #[test]
    fn test_outer_around() {
        let mut doc = around();
        insert_x(&mut doc, Balancing::Outer, 1, 3);
        assert_eq!(render(&doc), "<doc>0<x><p>1</p><r/><q>2</q></x>3</doc>");
    }

    #[test]
    fn test_all_policies_around_exact_children() {
        for balancing in [Balancing::Outer, Balancing::Inner] {
            let mut doc = around();
            insert_x(&mut doc, balancing, 1, 3);
            assert_eq!(
                render(&doc),
                "<doc>0<x><p>1</p><r/><q>2</q></x>3</doc>",
                "{}",
                balancing
            );
        }
    }

    #[test]
    fn test_inner_excludes_overlapping_neighbors() {
        let mut doc = overlap();
        let x = insert_x(&mut doc, Balancing::Inner, 2, 5);
        assert_eq!(render(&doc), "<doc>0<p>12</p><x><r>3</r></x><q>45</q>6</doc>");
        assert_eq!(doc.element(x).unwrap().span(), Span::new(3, 4));
    }

    #[test]
    fn test_outer_swallows_overlapping_neighbors() {
        let mut doc = overlap();
        let x = insert_x(&mut doc, Balancing::Outer, 2, 5);
        assert_eq!(render(&doc), "<doc>0<x><p>12</p><r>3</r><q>45</q></x>6</doc>");
        assert_eq!(doc.element(x).unwrap().span(), Span::new(1, 6));
    }

    #[test]
    fn test_balance_to_start() {
        let mut doc = overlap();
        insert_x(&mut doc, Balancing::BalanceToStart, 2, 5);
        assert_eq!(render(&doc), "<doc>0<p>1<x/>2</p><r>3</r><q>45</q>6</doc>");
    }

    #[test]
    fn test_balance_to_end() {
        let mut doc = overlap();
        insert_x(&mut doc, Balancing::BalanceToEnd, 2, 5);
        assert_eq!(render(&doc), "<doc>0<p>12</p><r>3</r><q>4<x/>5</q>6</doc>");
    }

    #[test]
    fn test_balance_to_start_with_right_overlap_only() {
        let mut doc = overlap();
        insert_x(&mut doc, Balancing::BalanceToStart, 3, 5);
        assert_eq!(render(&doc), "<doc>0<p>12</p><x/><r>3</r><q>45</q>6</doc>");
    }

    #[test]
    fn test_balance_to_end_with_left_overlap_only() {
        let mut doc = overlap();
        insert_x(&mut doc, Balancing::BalanceToEnd, 2, 4);
        assert_eq!(render(&doc), "<doc>0<p>12</p><r>3</r><x/><q>45</q>6</doc>");
    }

    #[test]
    fn test_balance_without_overlap_keeps_range() {
        let mut doc = overlap();
        insert_x(&mut doc, Balancing::BalanceToStart, 3, 4);
        assert_eq!(render(&doc), "<doc>0<p>12</p><x><r>3</r></x><q>45</q>6</doc>");
    }

    #[test]
    fn test_start_and_end_collapse() {
        let mut doc = overlap();
        insert_x(&mut doc, Balancing::Start, 2, 5);
        assert_eq!(render(&doc), "<doc>0<p>1<x/>2</p><r>3</r><q>45</q>6</doc>");

        let mut doc = overlap();
        insert_x(&mut doc, Balancing::End, 2, 5);
        assert_eq!(render(&doc), "<doc>0<p>12</p><r>3</r><q>4<x/>5</q>6</doc>");
    }

    #[test]
    fn test_start_at_child_boundary_stays_outside() {
        let mut doc = overlap();
        insert_x(&mut doc, Balancing::Start, 3, 5);
        assert_eq!(render(&doc), "<doc>0<p>12</p><x/><r>3</r><q>45</q>6</doc>");

        let mut doc = overlap();
        insert_x(&mut doc, Balancing::End, 2, 4);
        assert_eq!(render(&doc), "<doc>0<p>12</p><r>3</r><x/><q>45</q>6</doc>");
    }

    #[test]
    fn test_empty_at_element_start() {
        let source = || build(el("r", vec![el("a", vec![t(".")])]));

        let mut doc = source();
        insert_x(&mut doc, Balancing::Outer, 0, 0);
        assert_eq!(render(&doc), "<r><x/><a>.</a></r>");

        let mut doc = source();
        insert_x(&mut doc, Balancing::Inner, 0, 0);
        assert_eq!(render(&doc), "<r><a><x/>.</a></r>");
    }

    #[test]
    fn test_empty_at_element_end() {
        let source = || build(el("r", vec![el("a", vec![t(".")])]));

        let mut doc = source();
        insert_x(&mut doc, Balancing::Outer, 1, 1);
        assert_eq!(render(&doc), "<r><a>.</a><x/></r>");

        let mut doc = source();
        insert_x(&mut doc, Balancing::Inner, 1, 1);
        assert_eq!(render(&doc), "<r><a>.<x/></a></r>");
    }

    #[test]
    fn test_empty_between_adjacent_children() {
        let source = || build(el("r", vec![el("a", vec![t("1")]), el("b", vec![t("2")])]));

        let mut doc = source();
        insert_x(&mut doc, Balancing::Outer, 1, 1);
        assert_eq!(render(&doc), "<r><a>1</a><x/><b>2</b></r>");

        let mut doc = source();
        insert_x(&mut doc, Balancing::Inner, 1, 1);
        assert_eq!(render(&doc), "<r><a>1</a><b><x/>2</b></r>");
    }

    #[test]
    fn test_empty_after_zero_width_child_goes_into_next() {
        let source = || build(el("r", vec![t("a"), el("e", vec![]), el("b", vec![t("2")])]));

        let mut doc = source();
        insert_x(&mut doc, Balancing::Inner, 1, 1);
        assert_eq!(render(&doc), "<r>a<e/><b><x/>2</b></r>");

        let mut doc = source();
        insert_x(&mut doc, Balancing::BalanceToEnd, 1, 1);
        assert_eq!(render(&doc), "<r>a<e/><b><x/>2</b></r>");
    }

    #[test]
    fn test_empty_elements_in_call_order() {
        let mut doc = build(el("r", vec![t("ab")]));
        insert_x(&mut doc, Balancing::Outer, 1, 1);
        doc.insert_markup_at(&Element::new("y"), Balancing::Outer, 1, 1)
            .unwrap();
        assert_eq!(render(&doc), "<r>a<x/><y/>b</r>");
    }

    #[test]
    fn test_empty_elements_nest_under_inner_family() {
        let mut doc = build(el("r", vec![t("ab")]));
        insert_x(&mut doc, Balancing::Inner, 1, 1);
        doc.insert_markup_at(&Element::new("y"), Balancing::Inner, 1, 1)
            .unwrap();
        assert_eq!(render(&doc), "<r>a<x><y/></x>b</r>");
    }

    #[test]
    fn test_non_empty_wraps_empty_children_at_edges() {
        let source = || build(el("r", vec![t("a"), el("e", vec![]), t("b"), el("f", vec![]), t("c")]));

        let mut doc = source();
        insert_x(&mut doc, Balancing::Outer, 1, 2);
        assert_eq!(render(&doc), "<r>a<x><e/>b<f/></x>c</r>");

        let mut doc = source();
        insert_x(&mut doc, Balancing::Inner, 1, 2);
        assert_eq!(render(&doc), "<r>a<e/><x>b</x><f/>c</r>");
    }

    #[test]
    fn test_same_range_default_nesting() {
        let source = || build(el("r", vec![el("a", vec![t("xy")])]));

        let mut doc = source();
        insert_x(&mut doc, Balancing::Outer, 0, 2);
        assert_eq!(render(&doc), "<r><x><a>xy</a></x></r>");

        let mut doc = source();
        insert_x(&mut doc, Balancing::Inner, 0, 2);
        assert_eq!(render(&doc), "<r><a><x>xy</x></a></r>");
    }

    #[test]
    fn test_same_range_override() {
        let source = || build(el("r", vec![el("a", vec![el("b", vec![t("...")])])]));

        let mut doc = source();
        insert_x(&mut doc, Balancing::Outer, 0, 3);
        assert_eq!(render(&doc), "<r><x><a><b>...</b></a></x></r>");

        let mut doc = source();
        let a = find(&doc, "a");
        let insertion = Insertion::new(Balancing::Outer)
            .range(0, 3)
            .reverse_same_range(a);
        doc.insert(&Element::new("x"), &insertion).unwrap();
        doc.validate().unwrap();
        assert_eq!(render(&doc), "<r><a><x><b>...</b></x></a></r>");

        let mut doc = source();
        let (a, b) = (find(&doc, "a"), find(&doc, "b"));
        let insertion = Insertion::new(Balancing::Outer)
            .range(0, 3)
            .reverse_same_range_all([a, b]);
        doc.insert(&Element::new("x"), &insertion).unwrap();
        assert_eq!(render(&doc), "<r><a><b><x>...</x></b></a></r>");
    }

    #[test]
    fn test_same_range_override_under_inner() {
        let mut doc = build(el("r", vec![el("a", vec![t("xy")])]));
        let a = find(&doc, "a");
        let insertion = Insertion::new(Balancing::Inner)
            .range(0, 2)
            .reverse_same_range(a);
        doc.insert(&Element::new("x"), &insertion).unwrap();
        assert_eq!(render(&doc), "<r><x><a>xy</a></x></r>");
    }

    #[test]
    fn test_within_subtree() {
        let mut doc = build(el(
            "r",
            vec![el("a", vec![t("12")]), el("b", vec![t("34")])],
        ));
        let b = find(&doc, "b");
        let insertion = Insertion::new(Balancing::Outer).range(2, 3).within(b);
        doc.insert(&Element::new("x"), &insertion).unwrap();
        assert_eq!(render(&doc), "<r><a>12</a><b><x>3</x>4</b></r>");

        let insertion = Insertion::new(Balancing::Outer).range(0, 1).within(b);
        assert!(matches!(
            doc.insert(&Element::new("x"), &insertion),
            Err(StandoffError::SpanOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_within_detached_node_fails() {
        let mut doc = around();
        let stray = doc.arena_mut().add(Element::new("stray"));
        let insertion = Insertion::new(Balancing::Outer).range(0, 0).within(stray);
        assert!(matches!(
            doc.insert(&Element::new("x"), &insertion),
            Err(StandoffError::StructuralLookupFailure(_))
        ));
    }

    #[test]
    fn test_within_unknown_node_fails() {
        let mut doc = around();
        let insertion = Insertion::new(Balancing::Outer).range(0, 0).within(999);
        assert!(matches!(
            doc.insert(&Element::new("x"), &insertion),
            Err(StandoffError::StructuralLookupFailure(999))
        ));
    }

    #[test]
    fn test_preconditions_leave_tree_unchanged() {
        let mut doc = around();
        let before = render(&doc);
        let nodes = doc.arena().len();

        let mut parent = doc.clone();
        let child = parent.arena_mut().add(Element::new("c"));
        let with_child = {
            let p = parent.arena_mut().add(Element::new("p"));
            parent.arena_mut().append_child(p, child).unwrap();
            parent.element(p).unwrap().clone()
        };
        assert!(matches!(
            doc.insert_markup(&with_child, Balancing::Outer),
            Err(StandoffError::CandidateHasChildren(1))
        ));
        assert!(matches!(
            doc.insert_markup_at(&Element::new("x"), Balancing::Outer, 3, 1),
            Err(StandoffError::InvalidSpan { start: 3, end: 1 })
        ));
        assert!(matches!(
            doc.insert_markup_at(&Element::new("x"), Balancing::Outer, 2, 9),
            Err(StandoffError::SpanOutOfBounds { .. })
        ));

        assert_eq!(render(&doc), before);
        assert_eq!(doc.arena().len(), nodes);
    }

    #[test]
    fn test_position_inside_character_rejected() {
        let mut doc = build(el("r", vec![t("é!")]));
        let nodes = doc.arena().len();
        for (start, end) in [(1, 1), (0, 1), (1, 3)] {
            assert!(matches!(
                doc.insert_markup_at(&Element::new("x"), Balancing::Outer, start, end),
                Err(StandoffError::NotCharBoundary(1))
            ));
        }
        assert_eq!(doc.arena().len(), nodes);
        assert_eq!(render(&doc), "<r>é!</r>");

        insert_x(&mut doc, Balancing::Outer, 2, 2);
        assert_eq!(render(&doc), "<r>é<x/>!</r>");
    }

    #[test]
    fn test_overflowing_position_in_window() {
        let base = build(el("r", vec![t("ab"), el("s", vec![t("cd")]), t("e")]));
        let s = find(&base, "s");
        let mut sub = base.sub_document(s).unwrap();
        let nodes = sub.arena().len();
        assert!(matches!(
            sub.insert_markup_at(&Element::new("x"), Balancing::Outer, usize::MAX, usize::MAX),
            Err(StandoffError::SpanOutOfBounds { .. })
        ));
        assert_eq!(sub.arena().len(), nodes);
        assert_eq!(render(&sub), "<s>cd</s>");
    }

    #[test]
    fn test_insert_markup_uses_candidate_span() {
        let mut doc = around();
        let candidate = Element::new("x").with_span(Span::new(1, 2));
        doc.insert_markup(&candidate, Balancing::Outer).unwrap();
        assert_eq!(render(&doc), "<doc>0<x><p>1</p><r/></x><q>2</q>3</doc>");
        assert_eq!(candidate.span(), Span::new(1, 2));
        assert!(!candidate.has_children());
    }

    #[test]
    fn test_positions_are_relative_to_window() {
        let base = build(el("r", vec![t("ab"), el("s", vec![t("cd")]), t("e")]));
        let s = find(&base, "s");
        let mut sub = base.sub_document(s).unwrap();
        sub.insert_markup_at(&Element::new("x"), Balancing::Outer, 1, 2)
            .unwrap();
        assert_eq!(render(&sub), "<s>c<x>d</x></s>");
        let x = find(&sub, "x");
        assert_eq!(sub.element(x).unwrap().span(), Span::new(3, 4));
    }

    #[test]
    fn test_idempotent_outer_wrap() {
        let mut doc = build(el("r", vec![t("0"), el("a", vec![t("12")]), t("3")]));
        insert_x(&mut doc, Balancing::Outer, 1, 3);
        assert_eq!(render(&doc), "<r>0<x><a>12</a></x>3</r>");

        let mut again = build(el("r", vec![t("0"), el("x", vec![el("a", vec![t("12")])]), t("3")]));
        insert_x(&mut again, Balancing::Outer, 1, 3);
        let inner = render(&again);
        assert_eq!(inner, "<r>0<x><x><a>12</a></x></x>3</r>");
    }

    #[test]
    fn test_namespace_prefix_resolved() {
        let mut b = DocumentBuilder::new();
        let mut root = Element::new("r");
        root.declare_namespace("t", "urn:t").unwrap();
        b.start_element(root).unwrap();
        b.text("abc").unwrap();
        b.end_element().unwrap();
        let mut doc = b.finish().unwrap();

        let id = doc
            .insert_markup_at(
                &Element::with_namespace(Some("urn:t"), "seg"),
                Balancing::Outer,
                0,
                1,
            )
            .unwrap();
        let el = doc.element(id).unwrap();
        assert_eq!(el.qualified_name(), "t:seg");
        assert_eq!(el.local_name(), "seg");

        let id = doc
            .insert_markup_at(
                &Element::with_namespace(Some("urn:unbound"), "seg"),
                Balancing::Outer,
                1,
                2,
            )
            .unwrap();
        assert_eq!(doc.element(id).unwrap().qualified_name(), "seg");
    }

    #[test]
    fn test_default_namespace_keeps_unprefixed_name() {
        let mut b = DocumentBuilder::new();
        let mut root = Element::new("r");
        root.declare_namespace("", "urn:d").unwrap();
        b.start_element(root).unwrap();
        b.text("abc").unwrap();
        b.end_element().unwrap();
        let mut doc = b.finish().unwrap();

        let id = doc
            .insert_markup_at(
                &Element::with_namespace(Some("urn:d"), "seg"),
                Balancing::Inner,
                0,
                3,
            )
            .unwrap();
        assert_eq!(doc.element(id).unwrap().qualified_name(), "seg");
    }

    #[test]
    fn test_attributes_are_copied() {
        let mut doc = around();
        let candidate = Element::new("x").with_attribute("n", "1").unwrap();
        let id = doc
            .insert_markup_at(&candidate, Balancing::Outer, 0, 1)
            .unwrap();
        assert_eq!(doc.element(id).unwrap().attr("n"), Some("1"));
    }

    #[test]
    fn test_every_policy_keeps_tree_valid() {
        for balancing in Balancing::ALL {
            for start in 0..=7 {
                for end in start..=7 {
                    let mut doc = overlap();
                    doc.insert_markup_at(&Element::new("x"), balancing, start, end)
                        .unwrap();
                    doc.validate().unwrap();
                    assert_eq!(doc.content().as_str(), "0123456");
                }
            }
        }
    }
}
