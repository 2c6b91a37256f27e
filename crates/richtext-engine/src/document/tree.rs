//! Structural primitives over [`Element`] subtrees: splitting at a point,
//! isolating a range as whole children, and normalization.

use super::node::{Element, ElementKind, Node};
use std::ops::Range;

/// Byte index of the `chars`-th character of `value`.
pub(crate) fn byte_index(value: &str, chars: usize) -> usize {
    value
        .char_indices()
        .nth(chars)
        .map_or(value.len(), |(index, _)| index)
}

/// Make the point `(rel, offset)` a boundary between children of `element`.
///
/// `rel` is relative to `element`. Text and inline elements on the way are
/// split in two, never leaving an empty half. Returns the child index the
/// boundary now sits before.
pub(crate) fn split_at(element: &mut Element, rel: &[usize], offset: usize) -> usize {
    let Some((&index, rest)) = rel.split_first() else {
        return offset.min(element.children.len());
    };
    if index >= element.children.len() {
        return element.children.len();
    }

    let right = match &mut element.children[index] {
        Node::Text { value } => {
            if offset == 0 {
                return index;
            }
            if offset >= value.chars().count() {
                return index + 1;
            }
            let at = byte_index(value, offset);
            Node::text(value.split_off(at))
        }
        Node::Element(child) => {
            let boundary = split_at(child, rest, offset);
            if boundary == 0 {
                return index;
            }
            if boundary >= child.children.len() {
                return index + 1;
            }
            let tail = child.children.split_off(boundary);
            Node::Element(Element {
                kind: child.kind,
                attributes: child.attributes.clone(),
                children: tail,
            })
        }
    };
    element.children.insert(index + 1, right);
    index + 1
}

/// Split `element` at both ends of a range so that the range is exactly
/// the returned run of children.
pub(crate) fn isolate(
    element: &mut Element,
    start: (&[usize], usize),
    end: (&[usize], usize),
) -> Range<usize> {
    let end_index = split_at(element, end.0, end.1);
    let before = element.children.len();
    let start_index = split_at(element, start.0, start.1);
    // a split at the start shifts the end boundary right
    let end_index = end_index + (element.children.len() - before);
    start_index..end_index.max(start_index)
}

/// Replace every element matching `remove` with its children, recursively.
pub(crate) fn strip(nodes: Vec<Node>, remove: &impl Fn(&Element) -> bool) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(element) if remove(&element) => {
                out.extend(strip(element.children, remove));
            }
            Node::Element(mut element) => {
                element.children = strip(element.children, remove);
                out.push(Node::Element(element));
            }
            text => out.push(text),
        }
    }
    out
}

fn is_mergeable_inline(element: &Element) -> bool {
    element.kind.is_inline() && !element.kind.is_void()
}

/// Bring a subtree into canonical form: no empty or adjacent text nodes,
/// no empty inline elements, equal adjacent inline elements merged, and no
/// whitespace-only runs between blocks. The root also gets its loose inline
/// content wrapped in paragraphs and never ends up empty.
pub(crate) fn normalize(element: &mut Element) {
    for child in element.children.iter_mut() {
        if let Node::Element(child) = child {
            normalize(child);
        }
    }

    let children = std::mem::take(&mut element.children);
    let mut out: Vec<Node> = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Node::Text { value } if value.is_empty() => {}
            Node::Element(inline)
                if is_mergeable_inline(&inline) && inline.children.is_empty() => {}
            Node::Text { value } => {
                if let Some(Node::Text { value: previous }) = out.last_mut() {
                    previous.push_str(&value);
                } else {
                    out.push(Node::Text { value });
                }
            }
            Node::Element(next) => {
                if is_mergeable_inline(&next)
                    && let Some(Node::Element(previous)) = out.last_mut()
                    && previous.kind == next.kind
                    && previous.attributes == next.attributes
                {
                    previous.children.extend(next.children);
                    normalize(previous);
                } else {
                    out.push(Node::Element(next));
                }
            }
        }
    }

    if out.iter().any(Node::is_block) {
        out = drop_blank_runs(out);
    }
    element.children = out;

    if element.kind == ElementKind::Root {
        wrap_loose_inline(element);
        if element.children.is_empty() {
            element
                .children
                .push(Node::Element(Element::new(ElementKind::Paragraph)));
        }
    }
}

fn is_blank(node: &Node) -> bool {
    matches!(node, Node::Text { value } if value.trim().is_empty())
}

/// Drop inline runs made only of whitespace text that sit between blocks.
fn drop_blank_runs(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut run: Vec<Node> = Vec::new();
    for node in nodes {
        if node.is_inline() {
            run.push(node);
            continue;
        }
        if !run.iter().all(is_blank) {
            out.append(&mut run);
        }
        run.clear();
        out.push(node);
    }
    if !run.iter().all(is_blank) {
        out.append(&mut run);
    }
    out
}

fn wrap_loose_inline(root: &mut Element) {
    if root.children.iter().all(Node::is_block) {
        return;
    }
    let children = std::mem::take(&mut root.children);
    let mut run: Vec<Node> = Vec::new();
    for node in children {
        if node.is_inline() {
            run.push(node);
            continue;
        }
        if !run.is_empty() {
            root.children.push(Node::element(
                ElementKind::Paragraph,
                std::mem::take(&mut run),
            ));
        }
        root.children.push(node);
    }
    if !run.is_empty() {
        root.children
            .push(Node::element(ElementKind::Paragraph, run));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraph(children: Vec<Node>) -> Element {
        Element::new(ElementKind::Paragraph).with_children(children)
    }

    fn bold(text: &str) -> Node {
        Node::element(ElementKind::Bold, vec![Node::text(text)])
    }

    #[test]
    fn test_byte_index_multibyte() {
        assert_eq!(byte_index("héllo", 2), 3);
        assert_eq!(byte_index("abc", 10), 3);
    }

    #[test]
    fn test_split_text_in_middle() {
        let mut p = paragraph(vec![Node::text("hello")]);

        let boundary = split_at(&mut p, &[0], 2);

        assert_eq!(boundary, 1);
        assert_eq!(p.children, vec![Node::text("he"), Node::text("llo")]);
    }

    #[test]
    fn test_split_at_edges_does_not_split() {
        let mut p = paragraph(vec![Node::text("hello")]);

        assert_eq!(split_at(&mut p, &[0], 0), 0);
        assert_eq!(split_at(&mut p, &[0], 5), 1);
        assert_eq!(p.children.len(), 1);
    }

    #[test]
    fn test_split_through_inline_element() {
        let mut p = paragraph(vec![Node::text("a"), bold("bcd")]);

        let boundary = split_at(&mut p, &[1, 0], 1);

        assert_eq!(boundary, 2);
        assert_eq!(p.children, vec![Node::text("a"), bold("b"), bold("cd")]);
    }

    #[test]
    fn test_isolate_inside_one_text() {
        let mut p = paragraph(vec![Node::text("hello")]);

        let range = isolate(&mut p, (&[0], 1), (&[0], 3));

        assert_eq!(range, 1..2);
        assert_eq!(
            p.children,
            vec![Node::text("h"), Node::text("el"), Node::text("lo")]
        );
    }

    #[test]
    fn test_normalize_merges_and_prunes() {
        let mut root = Element::new(ElementKind::Root).with_children(vec![Node::Element(
            paragraph(vec![
                Node::text("a"),
                Node::text(""),
                Node::text("b"),
                bold("c"),
                bold("d"),
                Node::element(ElementKind::Italic, vec![]),
            ]),
        )]);

        normalize(&mut root);

        assert_eq!(
            root.children,
            vec![Node::Element(paragraph(vec![Node::text("ab"), bold("cd")]))]
        );
    }

    #[test]
    fn test_normalize_wraps_loose_inline_and_drops_blank_runs() {
        let mut root = Element::new(ElementKind::Root).with_children(vec![
            Node::text("loose"),
            Node::Element(paragraph(vec![Node::text("x")])),
            Node::text("\n  "),
            Node::Element(paragraph(vec![])),
        ]);

        normalize(&mut root);

        assert_eq!(
            root.children,
            vec![
                Node::Element(paragraph(vec![Node::text("loose")])),
                Node::Element(paragraph(vec![Node::text("x")])),
                Node::Element(paragraph(vec![])),
            ]
        );
    }

    #[test]
    fn test_normalize_never_leaves_root_empty() {
        let mut root = Element::new(ElementKind::Root);

        normalize(&mut root);

        assert_eq!(root.children, vec![Node::Element(paragraph(vec![]))]);
    }

    #[test]
    fn test_strip_promotes_children() {
        let nodes = vec![Node::text("a"), bold("b"), Node::element(ElementKind::Italic, vec![bold("c")])];

        let stripped = strip(nodes, &|e: &Element| e.kind == ElementKind::Bold);

        assert_eq!(
            stripped,
            vec![
                Node::text("a"),
                Node::text("b"),
                Node::element(ElementKind::Italic, vec![Node::text("c")]),
            ]
        );
    }
}
