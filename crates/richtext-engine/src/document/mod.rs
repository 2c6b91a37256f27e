//! The canonical document tree and its mutation primitives.
//!
//! Every mutation normalizes the tree before returning, and every
//! mutation returns the selection the caller should show next.

mod edit;
mod lines;
mod lists;
mod node;
mod position;
mod tree;

pub use node::{Attributes, CALLOUT_CLASS, Element, ElementKind, Node};
pub use position::{Bias, Position, Selection};
pub(crate) use tree::strip;

use crate::error::EditorError;
use crate::markup;
use lines::Line;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentModel {
    root: Element,
}

impl Default for DocumentModel {
    fn default() -> Self {
        let mut root = Element::new(ElementKind::Root);
        tree::normalize(&mut root);
        Self { root }
    }
}

impl DocumentModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from an already assembled root, normalizing it.
    pub fn from_root(mut root: Element) -> Self {
        root.kind = ElementKind::Root;
        tree::normalize(&mut root);
        Self { root }
    }

    pub fn parse(text: &str) -> Result<Self, EditorError> {
        markup::parse(text).map(Self::from_root)
    }

    /// Parse `text`, falling back to the empty document when it is malformed.
    pub fn parse_or_default(text: &str) -> Self {
        match Self::parse(text) {
            Ok(document) => document,
            Err(err) => {
                log::warn!("Falling back to an empty document: {err}");
                Self::default()
            }
        }
    }

    pub fn serialize(&self) -> String {
        markup::serialize(&self.root)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&Node> {
        self.root.node_at(path)
    }

    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        self.root.element_at(path)
    }

    pub fn text_content(&self) -> String {
        self.root.text_content()
    }

    pub fn char_count(&self) -> usize {
        self.root.text_len()
    }

    /// Flat text between two offsets, lines joined by `\n`.
    pub fn text_between(&self, start: usize, end: usize) -> String {
        let mut flat = String::new();
        for (index, line) in self.lines().iter().enumerate() {
            if index > 0 {
                flat.push('\n');
            }
            if let Some(container) = self.root.element_at(&line.container) {
                for child in &container.children[line.start..line.end] {
                    child.collect_text(&mut flat);
                }
            }
        }
        flat.chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }

    pub(crate) fn lines(&self) -> Vec<Line> {
        lines::collect_lines(&self.root)
    }

    /// Lines that touch the closed offset range `[start, end]`.
    pub(crate) fn lines_in(&self, start: usize, end: usize) -> Vec<Line> {
        self.lines()
            .into_iter()
            .filter(|line| line.offset <= end && line.end_offset() >= start)
            .collect()
    }

    /// The line holding flat `offset`, or the last line past the end.
    pub(crate) fn line_at(&self, offset: usize) -> Option<Line> {
        let lines = self.lines();
        let index = lines
            .iter()
            .position(|line| offset <= line.end_offset())
            .unwrap_or(lines.len().saturating_sub(1));
        lines.into_iter().nth(index)
    }

    /// Re-walk the tree along `position`, clamping every index and the offset
    /// to what exists now.
    pub fn clamp_position(&self, position: &Position) -> Position {
        let mut path = Vec::new();
        let mut element = &self.root;
        let mut clamped = false;
        for (depth, &index) in position.path.iter().enumerate() {
            let count = element.children.len();
            if count == 0 {
                return Position::new(path, 0);
            }
            clamped |= index >= count;
            let index = index.min(count - 1);
            path.push(index);
            match &element.children[index] {
                Node::Element(child) => element = child,
                Node::Text { value } => {
                    let len = value.chars().count();
                    let last = depth + 1 == position.path.len();
                    let offset = if clamped || !last {
                        len
                    } else {
                        position.offset.min(len)
                    };
                    return Position::new(path, offset);
                }
            }
        }
        let offset = if clamped {
            element.children.len()
        } else {
            position.offset.min(element.children.len())
        };
        Position::new(path, offset)
    }

    /// Flat offset of a position. Points between lines map to the start of
    /// the following line, points past the last line to the document end.
    pub fn offset_of(&self, position: &Position) -> usize {
        let position = self.clamp_position(position);
        let key = position.key();
        let lines = self.lines();
        for line in &lines {
            let mut start_key = line.container.clone();
            start_key.push(line.start);
            if key < start_key {
                return line.offset;
            }
            let mut end_key = line.container.clone();
            end_key.push(line.end);
            if key <= end_key {
                return line.offset + lines::local_offset(&self.root, line, &position);
            }
        }
        lines.last().map_or(0, Line::end_offset)
    }

    pub fn position_at(&self, offset: usize, bias: Bias) -> Position {
        match self.line_at(offset) {
            Some(line) => lines::position_in_line(
                &self.root,
                &line,
                offset.saturating_sub(line.offset),
                bias,
            ),
            None => Position::new(Vec::new(), 0),
        }
    }

    /// Endpoints of a selection as ordered flat offsets.
    pub fn ordered_offsets(&self, selection: &Selection) -> (usize, usize) {
        let anchor = self.offset_of(&selection.anchor);
        let focus = self.offset_of(&selection.focus);
        (anchor.min(focus), anchor.max(focus))
    }

    /// Selection covering flat `[start, end]`, or a caret when they meet.
    pub(crate) fn range_selection(&self, start: usize, end: usize) -> Selection {
        if start == end {
            return Selection::collapsed(self.position_at(start, Bias::Backward));
        }
        Selection::new(
            self.position_at(start, Bias::Forward),
            self.position_at(end, Bias::Backward),
        )
    }

    /// Move a selection taken in `previous` onto this document by flat
    /// offset, clamped to this document's end. Direction is kept.
    pub fn carry_selection(&self, previous: &DocumentModel, selection: &Selection) -> Selection {
        let end = self.lines().last().map_or(0, Line::end_offset);
        let anchor = previous.offset_of(&selection.anchor).min(end);
        let focus = previous.offset_of(&selection.focus).min(end);
        if anchor <= focus {
            return self.range_selection(anchor, focus);
        }
        let forward = self.range_selection(focus, anchor);
        Selection::new(forward.focus, forward.anchor)
    }

    /// Whether every character in the selection sits under an element
    /// accepted by `matches`. A caret checks its own ancestors.
    pub fn is_covered(&self, selection: &Selection, matches: impl Fn(&Element) -> bool) -> bool {
        let (start, end) = self.ordered_offsets(selection);
        if start == end {
            let caret = self.position_at(start, Bias::Backward);
            return self.has_ancestor(&caret.path, &matches);
        }
        let texts = self.texts_between(start, end);
        !texts.is_empty() && texts.iter().all(|path| self.has_ancestor(path, &matches))
    }

    fn has_ancestor(&self, path: &[usize], matches: &impl Fn(&Element) -> bool) -> bool {
        (0..=path.len()).any(|depth| {
            self.root
                .element_at(&path[..depth])
                .is_some_and(|element| matches(element))
        })
    }

    /// Paths of the text nodes sharing at least one character with
    /// `[start, end)`.
    fn texts_between(&self, start: usize, end: usize) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        for line in self.lines_in(start, end) {
            let mut from = line.offset;
            for (path, len) in lines::line_texts(&self.root, &line) {
                if from < end && from + len > start {
                    out.push(path);
                }
                from += len;
            }
        }
        out
    }

    pub(crate) fn normalize(&mut self) {
        tree::normalize(&mut self.root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(markup: &str) -> DocumentModel {
        DocumentModel::parse(markup).unwrap()
    }

    #[test]
    fn test_default_document() {
        assert_eq!(DocumentModel::default().serialize(), "<p></p>");
        assert_eq!(DocumentModel::parse("").unwrap(), DocumentModel::default());
    }

    #[test]
    fn test_parse_or_default_falls_back() {
        let document = DocumentModel::parse_or_default("<p>unclosed");

        assert_eq!(document, DocumentModel::default());
    }

    #[test]
    fn test_text_content_and_count() {
        let document = doc("<h1>Tïtle</h1><p>a <strong>b</strong></p>");

        assert_eq!(document.text_content(), "Tïtlea b");
        assert_eq!(document.char_count(), 8);
    }

    #[test]
    fn test_offsets_cross_lines() {
        let document = doc("<p>ab</p><p>cd</p>");

        assert_eq!(document.offset_of(&Position::new(vec![1, 0], 1)), 4);
        assert_eq!(document.offset_of(&Position::new(vec![1], 0)), 3);
        assert_eq!(document.offset_of(&Position::new(vec![], 1)), 3);
        assert_eq!(document.offset_of(&Position::new(vec![], 2)), 5);
        assert_eq!(
            document.position_at(4, Bias::Backward),
            Position::new(vec![1, 0], 1)
        );
    }

    #[test]
    fn test_empty_line_resolves_to_element_position() {
        let document = doc("<p>ab</p><p></p>");

        assert_eq!(document.position_at(3, Bias::Forward), Position::new(vec![1], 0));
        assert_eq!(document.offset_of(&Position::new(vec![1], 0)), 3);
    }

    #[test]
    fn test_clamp_position() {
        let document = doc("<p>abc</p>");

        assert_eq!(
            document.clamp_position(&Position::new(vec![0, 0], 99)),
            Position::new(vec![0, 0], 3)
        );
        assert_eq!(
            document.clamp_position(&Position::new(vec![5, 2], 1)),
            Position::new(vec![0, 0], 3)
        );
        assert_eq!(
            document.clamp_position(&Position::new(vec![0], 9)),
            Position::new(vec![0], 1)
        );
    }

    #[test]
    fn test_text_between_joins_lines() {
        let document = doc("<p>hello</p><p>world</p>");

        assert_eq!(document.text_between(3, 8), "lo\nwo");
    }

    #[test]
    fn test_ordered_offsets_ignore_direction() {
        let document = doc("<p>hello</p>");
        let backwards = Selection::new(Position::new(vec![0, 0], 4), Position::new(vec![0, 0], 1));

        assert_eq!(document.ordered_offsets(&backwards), (1, 4));
    }

    #[test]
    fn test_carry_selection_by_offset() {
        let before = doc("<p><strong>ab</strong>c</p>");
        let after = doc("<p>abc</p>");
        let selection = Selection::new(Position::new(vec![0, 0, 0], 0), Position::new(vec![0, 0, 0], 2));

        assert_eq!(
            after.carry_selection(&before, &selection),
            Selection::new(Position::new(vec![0, 0], 0), Position::new(vec![0, 0], 2))
        );

        let backwards = Selection::new(Position::new(vec![0, 1], 1), Position::new(vec![0, 0, 0], 1));
        let shorter = doc("<p>a</p>");
        assert_eq!(
            shorter.carry_selection(&before, &backwards),
            Selection::new(Position::new(vec![0, 0], 1), Position::new(vec![0, 0], 1))
        );
    }

    #[test]
    fn test_is_covered() {
        let document = doc("<p><strong>ab</strong>c</p>");
        let bold = |e: &Element| e.kind == ElementKind::Bold;

        let inside = Selection::new(Position::new(vec![0, 0, 0], 0), Position::new(vec![0, 0, 0], 2));
        let across = Selection::new(Position::new(vec![0, 0, 0], 0), Position::new(vec![0, 1], 1));

        assert!(document.is_covered(&inside, bold));
        assert!(!document.is_covered(&across, bold));
    }
}
