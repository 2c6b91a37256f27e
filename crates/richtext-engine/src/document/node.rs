use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Element attributes, kept sorted so serialization is deterministic.
pub type Attributes = BTreeMap<String, String>;

/// Class prefix that marks a `div` as a callout box.
pub const CALLOUT_CLASS: &str = "callout";

/// The closed set of element kinds the editor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    Root,
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    Blockquote,
    Preformatted,
    UnorderedList,
    OrderedList,
    ListItem,
    Callout,
    Division,
    Bold,
    Italic,
    Underline,
    Span,
    Link,
    Code,
    LineBreak,
}

impl ElementKind {
    /// Markup tag written for this kind. Root has none.
    pub fn tag(self) -> Option<&'static str> {
        let tag = match self {
            ElementKind::Root => return None,
            ElementKind::Paragraph => "p",
            ElementKind::Heading1 => "h1",
            ElementKind::Heading2 => "h2",
            ElementKind::Heading3 => "h3",
            ElementKind::Blockquote => "blockquote",
            ElementKind::Preformatted => "pre",
            ElementKind::UnorderedList => "ul",
            ElementKind::OrderedList => "ol",
            ElementKind::ListItem => "li",
            ElementKind::Callout | ElementKind::Division => "div",
            ElementKind::Bold => "strong",
            ElementKind::Italic => "em",
            ElementKind::Underline => "u",
            ElementKind::Span => "span",
            ElementKind::Link => "a",
            ElementKind::Code => "code",
            ElementKind::LineBreak => "br",
        };
        Some(tag)
    }

    /// Map a (lowercase) tag name to a kind. A `div` is a callout when its
    /// class list carries the callout marker.
    pub fn from_tag(tag: &str, attributes: &Attributes) -> Option<Self> {
        let kind = match tag {
            "p" => ElementKind::Paragraph,
            "h1" => ElementKind::Heading1,
            "h2" => ElementKind::Heading2,
            "h3" => ElementKind::Heading3,
            "blockquote" => ElementKind::Blockquote,
            "pre" => ElementKind::Preformatted,
            "ul" => ElementKind::UnorderedList,
            "ol" => ElementKind::OrderedList,
            "li" => ElementKind::ListItem,
            "div" => {
                let is_callout = attributes
                    .get("class")
                    .is_some_and(|class| class.split_whitespace().any(|c| c == CALLOUT_CLASS));
                if is_callout {
                    ElementKind::Callout
                } else {
                    ElementKind::Division
                }
            }
            "strong" | "b" => ElementKind::Bold,
            "em" | "i" => ElementKind::Italic,
            "u" => ElementKind::Underline,
            "span" => ElementKind::Span,
            "a" => ElementKind::Link,
            "code" => ElementKind::Code,
            "br" => ElementKind::LineBreak,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_inline(self) -> bool {
        matches!(
            self,
            ElementKind::Bold
                | ElementKind::Italic
                | ElementKind::Underline
                | ElementKind::Span
                | ElementKind::Link
                | ElementKind::Code
                | ElementKind::LineBreak
        )
    }

    pub fn is_block(self) -> bool {
        !self.is_inline()
    }

    pub fn is_list(self) -> bool {
        matches!(self, ElementKind::UnorderedList | ElementKind::OrderedList)
    }

    /// Elements written without a closing tag.
    pub fn is_void(self) -> bool {
        self == ElementKind::LineBreak
    }

    /// Presentational inline kinds removed by clear-formatting. Links survive.
    pub fn is_formatting(self) -> bool {
        matches!(
            self,
            ElementKind::Bold
                | ElementKind::Italic
                | ElementKind::Underline
                | ElementKind::Span
                | ElementKind::Code
        )
    }

    /// Block kinds whose tag can be swapped in place by a block command.
    pub(crate) fn is_text_block(self) -> bool {
        matches!(
            self,
            ElementKind::Paragraph
                | ElementKind::Heading1
                | ElementKind::Heading2
                | ElementKind::Heading3
                | ElementKind::Blockquote
                | ElementKind::Preformatted
                | ElementKind::Callout
                | ElementKind::Division
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// A callout box of the given type, e.g. `info` or `warning`.
    pub fn callout(callout_type: &str) -> Self {
        Self::new(ElementKind::Callout).with_attribute(
            "class",
            format!("{CALLOUT_CLASS} {CALLOUT_CLASS}-{callout_type}"),
        )
    }

    /// Number of characters in all descendant text.
    pub fn text_len(&self) -> usize {
        self.children.iter().map(Node::text_len).sum()
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.collect_text(&mut out);
        }
        out
    }

    /// A block whose children are all inline, so it holds a single line.
    pub fn is_line_host(&self) -> bool {
        self.kind != ElementKind::Root
            && !self.kind.is_list()
            && self.children.iter().all(Node::is_inline)
    }

    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        let mut element = self;
        for &index in path {
            match element.children.get(index)? {
                Node::Element(child) => element = child,
                Node::Text { .. } => return None,
            }
        }
        Some(element)
    }

    pub(crate) fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut element = self;
        for &index in path {
            match element.children.get_mut(index)? {
                Node::Element(child) => element = child,
                Node::Text { .. } => return None,
            }
        }
        Some(element)
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        let (last, parent) = path.split_last()?;
        self.element_at(parent)?.children.get(*last)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Text { value: String },
    Element(Element),
}

impl Node {
    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    pub fn element(kind: ElementKind, children: Vec<Node>) -> Self {
        Node::Element(Element::new(kind).with_children(children))
    }

    pub fn is_inline(&self) -> bool {
        match self {
            Node::Text { .. } => true,
            Node::Element(element) => element.kind.is_inline(),
        }
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text { .. } => None,
        }
    }

    pub fn text_len(&self) -> usize {
        match self {
            Node::Text { value } => value.chars().count(),
            Node::Element(element) => element.text_len(),
        }
    }

    pub(crate) fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { value } => out.push_str(value),
            Node::Element(element) => {
                for child in &element.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("p", ElementKind::Paragraph)]
    #[case("h2", ElementKind::Heading2)]
    #[case("b", ElementKind::Bold)]
    #[case("strong", ElementKind::Bold)]
    #[case("i", ElementKind::Italic)]
    #[case("br", ElementKind::LineBreak)]
    #[case("div", ElementKind::Division)]
    fn test_from_tag(#[case] tag: &str, #[case] expected: ElementKind) {
        assert_eq!(ElementKind::from_tag(tag, &Attributes::new()), Some(expected));
    }

    #[test]
    fn test_div_with_callout_class_is_callout() {
        let attributes = Element::callout("warning").attributes;

        assert_eq!(attributes["class"], "callout callout-warning");
        assert_eq!(
            ElementKind::from_tag("div", &attributes),
            Some(ElementKind::Callout)
        );
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(ElementKind::from_tag("marquee", &Attributes::new()), None);
    }

    #[test]
    fn test_text_len_counts_chars_not_bytes() {
        let node = Node::element(
            ElementKind::Paragraph,
            vec![
                Node::text("héllo "),
                Node::element(ElementKind::Bold, vec![Node::text("wörld")]),
            ],
        );

        assert_eq!(node.text_len(), 11);
    }

    #[test]
    fn test_element_at_stops_at_text() {
        let root = Element::new(ElementKind::Root).with_children(vec![Node::element(
            ElementKind::Paragraph,
            vec![Node::text("a")],
        )]);

        assert_eq!(
            root.element_at(&[0]).map(|e| e.kind),
            Some(ElementKind::Paragraph)
        );
        assert!(root.element_at(&[0, 0]).is_none());
        assert_eq!(root.node_at(&[0, 0]), Some(&Node::text("a")));
    }

    #[test]
    fn test_line_host() {
        let paragraph = Element::new(ElementKind::Paragraph).with_children(vec![Node::text("a")]);
        let item = Element::new(ElementKind::ListItem).with_children(vec![
            Node::text("a"),
            Node::element(ElementKind::UnorderedList, vec![]),
        ]);

        assert!(paragraph.is_line_host());
        assert!(!item.is_line_host());
        assert!(!Element::new(ElementKind::UnorderedList).is_line_host());
    }
}
