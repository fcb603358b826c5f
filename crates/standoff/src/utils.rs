//! Utility functions for names and debugging output

/// Split `prefix:local` into its parts; the prefix is `None` without a colon
pub fn split_qualified_name(qualified_name: &str) -> (Option<&str>, &str) {
    match qualified_name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qualified_name),
    }
}

/// Part of a qualified name after the colon
pub fn local_part(qualified_name: &str) -> &str {
    split_qualified_name(qualified_name).1
}

/// Part of a qualified name before the colon
pub fn prefix_part(qualified_name: &str) -> Option<&str> {
    split_qualified_name(qualified_name).0
}

/// Join prefix and local name; an empty prefix yields the bare local name
pub fn make_qualified_name(prefix: &str, local_name: &str) -> String {
    if prefix.is_empty() {
        local_name.to_string()
    } else {
        format!("{}:{}", prefix, local_name)
    }
}

/// Compact XML-like rendering of a document for assertions
///
/// Elements print as tags, zero-width childless elements as `<x/>`.
/// Attributes and namespace declarations are left out.
#[cfg(test)]
pub(crate) fn render(doc: &crate::document::Document) -> String {
    use crate::types::NodeId;

    fn walk(doc: &crate::document::Document, id: NodeId, out: &mut String) {
        let arena = doc.arena();
        let el = &arena[id];
        let buffer = doc.content_buffer();

        if el.span().is_empty() && !el.has_children() {
            out.push('<');
            out.push_str(el.qualified_name());
            out.push_str("/>");
            return;
        }

        out.push('<');
        out.push_str(el.qualified_name());
        out.push('>');

        let mut pos = el.start();
        for &child in el.children() {
            let child_span = arena[child].span();
            out.push_str(buffer.slice(pos, child_span.start));
            walk(doc, child, out);
            pos = child_span.end;
        }
        out.push_str(buffer.slice(pos, el.end()));

        out.push_str("</");
        out.push_str(el.qualified_name());
        out.push('>');
    }

    let mut out = String::new();
    walk(doc, doc.root(), &mut out);
    out
}
