//! Builds an element tree from markup tokens.
//!
//! The parser keeps a stack of open elements and requires every closing
//! tag to match the innermost open one. Void elements (`br`) never go on
//! the stack. Entities in text and attribute values are decoded here.

use regex::Regex;
use std::sync::LazyLock;

use super::lexer::{Token, TokenKind, lex};
use crate::document::{Attributes, Element, ElementKind, Node};
use crate::error::EditorError;

static TAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^</?([a-zA-Z][a-zA-Z0-9]*)").expect("Invalid tag name regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'<>=]+)))?"#)
        .expect("Invalid attribute regex")
});

struct Open {
    element: Element,
    tag: String,
    offset: usize,
}

pub(crate) fn parse(input: &str) -> Result<Element, EditorError> {
    let tokens = lex(input)?;
    let mut stack = vec![Open {
        element: Element::new(ElementKind::Root),
        tag: String::new(),
        offset: 0,
    }];

    for token in tokens {
        match token.kind {
            TokenKind::Text => {
                let value = html_escape::decode_html_entities(token.text).into_owned();
                push_child(&mut stack, Node::Text { value });
            }
            TokenKind::OpenTag => {
                let tag = tag_name(&token)?;
                let attributes = parse_attributes(&token.text[tag.len() + 1..]);
                let kind = ElementKind::from_tag(&tag, &attributes).ok_or_else(|| {
                    EditorError::malformed(format!("unknown tag <{tag}>"), token.span.start)
                })?;
                let element = Element {
                    kind,
                    attributes,
                    children: Vec::new(),
                };
                if kind.is_void() || token.text.ends_with("/>") {
                    push_child(&mut stack, Node::Element(element));
                } else {
                    stack.push(Open {
                        element,
                        tag,
                        offset: token.span.start,
                    });
                }
            }
            TokenKind::CloseTag => {
                let tag = tag_name(&token)?;
                if ElementKind::from_tag(&tag, &Attributes::new()).is_some_and(ElementKind::is_void)
                {
                    // `</br>` carries nothing to close
                    continue;
                }
                if stack.len() < 2 {
                    return Err(EditorError::malformed(
                        format!("closing tag </{tag}> has no matching opening tag"),
                        token.span.start,
                    ));
                }
                let Some(open) = stack.pop() else { continue };
                if open.tag != tag {
                    return Err(EditorError::malformed(
                        format!("expected </{}> but found </{tag}>", open.tag),
                        token.span.start,
                    ));
                }
                push_child(&mut stack, Node::Element(open.element));
            }
        }
    }

    if stack.len() > 1 {
        let open = &stack[stack.len() - 1];
        return Err(EditorError::malformed(
            format!("<{}> is never closed", open.tag),
            open.offset,
        ));
    }
    Ok(stack.pop().map(|open| open.element).unwrap_or_else(|| Element::new(ElementKind::Root)))
}

fn push_child(stack: &mut [Open], node: Node) {
    if let Some(top) = stack.last_mut() {
        top.element.children.push(node);
    }
}

fn tag_name(token: &Token<'_>) -> Result<String, EditorError> {
    TAG_NAME
        .captures(token.text)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str().to_ascii_lowercase())
        .ok_or_else(|| EditorError::malformed("tag without a name", token.span.start))
}

/// Attributes from the part of an opening tag after its name.
fn parse_attributes(rest: &str) -> Attributes {
    let mut attributes = Attributes::new();
    for caps in ATTRIBUTE.captures_iter(rest) {
        let Some(name) = caps.get(1) else { continue };
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        attributes.insert(
            name.as_str().to_ascii_lowercase(),
            html_escape::decode_html_entities(value).into_owned(),
        );
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_parse_nested_inline() {
        let root = parse("<p>a <b>bold</b></p>").unwrap();

        assert_eq!(
            root.children,
            vec![Node::element(
                ElementKind::Paragraph,
                vec![
                    Node::text("a "),
                    Node::element(ElementKind::Bold, vec![Node::text("bold")]),
                ]
            )]
        );
    }

    #[test]
    fn test_parse_attributes_and_entities() {
        let root = parse(r#"<p><a href="a?x=1&amp;y=2" title='it&#39;s'>x &lt; y</a></p>"#).unwrap();
        let Node::Element(paragraph) = &root.children[0] else {
            panic!("expected paragraph");
        };
        let Node::Element(link) = &paragraph.children[0] else {
            panic!("expected link");
        };

        assert_eq!(link.attributes["href"], "a?x=1&y=2");
        assert_eq!(link.attributes["title"], "it's");
        assert_eq!(link.children, vec![Node::text("x < y")]);
    }

    #[test]
    fn test_parse_void_and_self_closing() {
        let root = parse("<p>a<br>b<br/>c</br></p>").unwrap();
        let Node::Element(paragraph) = &root.children[0] else {
            panic!("expected paragraph");
        };

        assert_eq!(paragraph.children.len(), 5);
    }

    #[test]
    fn test_tag_names_are_case_insensitive() {
        let root = parse("<P>x</p>").unwrap();

        assert_eq!(
            root.children[0].as_element().map(|e| e.kind),
            Some(ElementKind::Paragraph)
        );
    }

    #[rstest]
    #[case::unknown_tag("<p><blink>x</blink></p>", 3)]
    #[case::mismatched("<p><em>x</strong></p>", 8)]
    #[case::stray_close("<p>x</p></em>", 8)]
    #[case::unclosed("<p>x<em>y</p>", 9)]
    #[case::never_closed("<p>x", 0)]
    #[case::stray_angle("<p>a <b</p>", 5)]
    fn test_malformed(#[case] input: &str, #[case] offset: usize) {
        let err = parse(input).unwrap_err();

        match err {
            EditorError::MalformedDocument { offset: found, .. } => assert_eq!(found, offset),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
