use crate::document::{Element, Node};

/// Write the children of `root` as markup. The root itself has no tag.
pub(crate) fn serialize(root: &Element) -> String {
    let mut out = String::new();
    for child in &root.children {
        write_node(child, &mut out);
    }
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text { value } => out.push_str(&html_escape::encode_text(value)),
        Node::Element(element) => write_element(element, out),
    }
}

fn write_element(element: &Element, out: &mut String) {
    let Some(tag) = element.kind.tag() else {
        for child in &element.children {
            write_node(child, out);
        }
        return;
    };

    out.push('<');
    out.push_str(tag);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push('>');

    if element.kind.is_void() {
        return;
    }
    for child in &element.children {
        write_node(child, out);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ElementKind;
    use insta::assert_snapshot;

    fn root(children: Vec<Node>) -> Element {
        Element::new(ElementKind::Root).with_children(children)
    }

    #[test]
    fn test_write_escapes_text_and_attributes() {
        let link = Element::new(ElementKind::Link)
            .with_attribute("href", "a?x=1&y=\"2\"")
            .with_children(vec![Node::text("1 < 2 & 3")]);
        let doc = root(vec![Node::element(
            ElementKind::Paragraph,
            vec![Node::Element(link)],
        )]);

        assert_snapshot!(serialize(&doc), @r#"<p><a href="a?x=1&amp;y=&quot;2&quot;">1 &lt; 2 &amp; 3</a></p>"#);
    }

    #[test]
    fn test_write_sorted_attributes_and_void() {
        let span = Element::new(ElementKind::Span)
            .with_attribute("style", "color: red")
            .with_attribute("class", "note")
            .with_children(vec![Node::text("a")]);
        let doc = root(vec![Node::element(
            ElementKind::Paragraph,
            vec![
                Node::Element(span),
                Node::element(ElementKind::LineBreak, vec![]),
                Node::text("b"),
            ],
        )]);

        assert_snapshot!(serialize(&doc), @r#"<p><span class="note" style="color: red">a</span><br>b</p>"#);
    }

    #[test]
    fn test_write_callout() {
        let doc = root(vec![Node::Element(
            Element::callout("info").with_children(vec![Node::text("Heads up")]),
        )]);

        assert_snapshot!(serialize(&doc), @r#"<div class="callout callout-info">Heads up</div>"#);
    }
}
