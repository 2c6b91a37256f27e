//! Lines and flat offsets.
//!
//! A line is a maximal run of inline children inside a block. Walking the
//! lines in document order gives every character a flat offset, with one
//! extra unit between consecutive lines. Edits that only regroup blocks or
//! inline wrappers leave flat offsets untouched, which is what lets a
//! selection survive them.

use super::node::{Element, Node};
use super::position::{Bias, Position};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    /// Path of the block holding the run
    pub container: Vec<usize>,
    /// Child range of the run inside the container
    pub start: usize,
    pub end: usize,
    /// Flat offset of the first character
    pub offset: usize,
    /// Characters in the run
    pub len: usize,
}

impl Line {
    pub fn end_offset(&self) -> usize {
        self.offset + self.len
    }

    /// Whether the run is everything the container holds.
    pub fn spans(&self, container: &Element) -> bool {
        self.start == 0 && self.end == container.children.len()
    }
}

pub(crate) fn collect_lines(root: &Element) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut path = Vec::new();
    collect(root, &mut path, &mut lines);
    lines
}

fn collect(element: &Element, path: &mut Vec<usize>, lines: &mut Vec<Line>) {
    if element.children.is_empty() {
        if !path.is_empty() {
            push_line(lines, path.clone(), 0, 0, 0);
        }
        return;
    }

    let children = &element.children;
    let mut index = 0;
    while index < children.len() {
        match &children[index] {
            Node::Element(block) if block.kind.is_block() => {
                path.push(index);
                collect(block, path, lines);
                path.pop();
                index += 1;
            }
            _ => {
                let start = index;
                let mut len = 0;
                while index < children.len() && children[index].is_inline() {
                    len += children[index].text_len();
                    index += 1;
                }
                push_line(lines, path.clone(), start, index, len);
            }
        }
    }
}

fn push_line(lines: &mut Vec<Line>, container: Vec<usize>, start: usize, end: usize, len: usize) {
    let offset = lines.last().map_or(0, |line| line.end_offset() + 1);
    lines.push(Line {
        container,
        start,
        end,
        offset,
        len,
    });
}

/// Text nodes of a line in order, as `(path, char length)`.
pub(crate) fn line_texts(root: &Element, line: &Line) -> Vec<(Vec<usize>, usize)> {
    let mut texts = Vec::new();
    let Some(container) = root.element_at(&line.container) else {
        return texts;
    };
    let mut path = line.container.clone();
    for index in line.start..line.end.min(container.children.len()) {
        path.push(index);
        collect_texts(&container.children[index], &mut path, &mut texts);
        path.pop();
    }
    texts
}

fn collect_texts(node: &Node, path: &mut Vec<usize>, texts: &mut Vec<(Vec<usize>, usize)>) {
    match node {
        Node::Text { value } => texts.push((path.clone(), value.chars().count())),
        Node::Element(element) => {
            for (index, child) in element.children.iter().enumerate() {
                path.push(index);
                collect_texts(child, path, texts);
                path.pop();
            }
        }
    }
}

/// Offset of `position` from the start of `line`. The position must lie
/// within the line's run.
pub(crate) fn local_offset(root: &Element, line: &Line, position: &Position) -> usize {
    let key = position.key();
    let mut acc = 0;
    for (path, len) in line_texts(root, line) {
        if path == position.path {
            return acc + position.offset.min(len);
        }
        if path < key {
            acc += len;
        } else {
            break;
        }
    }
    acc
}

/// Position `local` characters into `line`.
///
/// At a boundary between two text nodes, `Forward` picks the start of the
/// later one and `Backward` the end of the earlier one. A line without text
/// resolves to the element position of its run.
pub(crate) fn position_in_line(root: &Element, line: &Line, local: usize, bias: Bias) -> Position {
    let local = local.min(line.len);
    let texts = line_texts(root, line);
    let mut acc = 0;
    for (index, (path, len)) in texts.iter().enumerate() {
        let hit = match bias {
            Bias::Forward => local < acc + len,
            Bias::Backward => local <= acc + len,
        };
        if hit || index + 1 == texts.len() {
            return Position::new(path.clone(), local.saturating_sub(acc).min(*len));
        }
        acc += len;
    }
    Position::new(line.container.clone(), line.start)
}
