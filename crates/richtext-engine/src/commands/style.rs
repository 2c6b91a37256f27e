//! Inline style spans and formatting removal.

use regex::Regex;
use std::sync::LazyLock;

use crate::document::{Attributes, DocumentModel, Element, ElementKind, Node, Selection, strip};

static DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\w-]+)\s*:\s*([^;]+)").expect("Invalid style declaration regex"));

/// A CSS property the style commands can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    FontFamily,
    FontSize,
    TextColor,
}

impl StyleProperty {
    pub fn css_name(self) -> &'static str {
        match self {
            StyleProperty::FontFamily => "font-family",
            StyleProperty::FontSize => "font-size",
            StyleProperty::TextColor => "color",
        }
    }

    pub(crate) fn command_name(self) -> &'static str {
        match self {
            StyleProperty::FontFamily => "set-font-family",
            StyleProperty::FontSize => "set-font-size",
            StyleProperty::TextColor => "set-text-color",
        }
    }
}

/// Split a `style` attribute into `(property, value)` pairs.
pub(crate) fn parse_declarations(style: &str) -> Vec<(String, String)> {
    DECLARATION
        .captures_iter(style)
        .map(|caps| {
            (
                caps[1].trim().to_ascii_lowercase(),
                caps[2].trim().to_string(),
            )
        })
        .collect()
}

fn format_declarations(declarations: &[(String, String)]) -> String {
    declarations
        .iter()
        .map(|(property, value)| format!("{property}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Set `property` on the range. A range that is exactly one styled span
/// gets the declaration rewritten in place; anything else is wrapped in a
/// new span, replacing any earlier value of that property inside it.
pub(crate) fn apply(
    document: &mut DocumentModel,
    selection: &Selection,
    property: StyleProperty,
    value: &str,
) -> Selection {
    let css = property.css_name();
    let value = value.trim();
    let (start, end) = document.ordered_offsets(selection);
    document.map_range(start, end, |mut nodes| {
        if let [Node::Element(span)] = nodes.as_mut_slice()
            && span.kind == ElementKind::Span
            && let Some(style) = span.attributes.get("style")
        {
            let style = set_declaration(style, css, value);
            span.attributes.insert("style".to_string(), style);
            span.children = strip_property(std::mem::take(&mut span.children), css);
            return nodes;
        }

        let mut attributes = Attributes::new();
        attributes.insert("style".to_string(), set_declaration("", css, value));
        vec![Node::Element(Element {
            kind: ElementKind::Span,
            attributes,
            children: strip_property(nodes, css),
        })]
    });
    document.range_selection(start, end)
}

/// Replace the value of `css` in `style`, keeping declaration order. A
/// missing property is appended.
fn set_declaration(style: &str, css: &str, value: &str) -> String {
    let mut declarations = parse_declarations(style);
    match declarations.iter_mut().find(|(property, _)| property == css) {
        Some(declaration) => declaration.1 = value.to_string(),
        None => declarations.push((css.to_string(), value.to_string())),
    }
    format_declarations(&declarations)
}

/// Drop `css` from every span in `nodes`. Spans left with no style and no
/// other attributes are replaced by their children.
fn strip_property(nodes: Vec<Node>, css: &str) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        let Node::Element(mut element) = node else {
            out.push(node);
            continue;
        };
        element.children = strip_property(element.children, css);
        if element.kind != ElementKind::Span {
            out.push(Node::Element(element));
            continue;
        }

        let remaining: Vec<_> = element
            .attributes
            .get("style")
            .map(String::as_str)
            .map(parse_declarations)
            .unwrap_or_default()
            .into_iter()
            .filter(|(property, _)| property != css)
            .collect();
        if remaining.is_empty() {
            element.attributes.remove("style");
        } else {
            element
                .attributes
                .insert("style".to_string(), format_declarations(&remaining));
        }

        if element.attributes.is_empty() {
            out.extend(element.children);
        } else {
            out.push(Node::Element(element));
        }
    }
    out
}

/// Whether every character in the selection already has `property` set to
/// `value` by an enclosing span.
pub(crate) fn is_applied(
    document: &DocumentModel,
    selection: &Selection,
    property: StyleProperty,
    value: &str,
) -> bool {
    let css = property.css_name();
    document.is_covered(selection, |element| {
        element.kind == ElementKind::Span
            && element.attributes.get("style").is_some_and(|style| {
                parse_declarations(style)
                    .iter()
                    .any(|(p, v)| p == css && v.eq_ignore_ascii_case(value.trim()))
            })
    })
}

/// Remove presentational inline elements from the range, keeping links and
/// block structure.
pub(crate) fn clear_formatting(document: &mut DocumentModel, selection: &Selection) -> Selection {
    let (start, end) = document.ordered_offsets(selection);
    document.map_range(start, end, |nodes| {
        strip(nodes, &|element: &Element| element.kind.is_formatting())
    });
    document.range_selection(start, end)
}
