//! Range mutations: wrap, unwrap, block retagging, deletion and insertion.
//!
//! Ranges are handled as flat offsets. Multi-line work visits lines from
//! last to first so the paths of lines not yet visited stay valid.

use std::ops::Range;

use super::lines::{self, Line};
use super::node::{Attributes, Element, ElementKind, Node};
use super::position::{Bias, Position, Selection};
use super::tree::{self, isolate, split_at};
use super::DocumentModel;

impl DocumentModel {
    /// Wrap the range in a new element of `kind`.
    pub fn wrap(&mut self, selection: &Selection, kind: ElementKind, attributes: Attributes) -> Selection {
        let (start, end) = self.ordered_offsets(selection);
        if kind.is_block() {
            if let Some((parent, range)) = self.sibling_blocks(start, end)
                && let Some(parent) = self.root.element_at_mut(&parent)
            {
                wrap_children(parent, range, kind, attributes);
                self.normalize();
            }
            return self.range_selection(start, end);
        }

        // same-kind elements inside the range are absorbed, not nested
        self.map_range(start, end, |nodes| {
            vec![Node::Element(Element {
                kind,
                attributes: attributes.clone(),
                children: tree::strip(nodes, &|element: &Element| {
                    element.kind == kind && element.attributes == attributes
                }),
            })]
        });
        self.range_selection(start, end)
    }

    /// Remove elements of `kind` over the range, promoting their children.
    ///
    /// Inline kinds are split at the range edges first, so text outside the
    /// range keeps its element. A block kind removes the nearest enclosing
    /// element of that kind around the start of the range.
    pub fn unwrap(&mut self, selection: &Selection, kind: ElementKind) -> Selection {
        let (start, end) = self.ordered_offsets(selection);
        if kind.is_block() {
            self.unwrap_block(start, kind);
        } else {
            self.map_range(start, end, |nodes| {
                tree::strip(nodes, &|element: &Element| element.kind == kind)
            });
        }
        self.range_selection(start, end)
    }

    fn unwrap_block(&mut self, offset: usize, kind: ElementKind) {
        let Some(line) = self.line_at(offset) else {
            return;
        };
        let Some(depth) = (1..=line.container.len())
            .rev()
            .find(|&depth| self.root.element_at(&line.container[..depth]).is_some_and(|e| e.kind == kind))
        else {
            return;
        };
        let path = line.container[..depth].to_vec();
        self.unwrap_at(&path);
        self.normalize();
    }

    /// Replace the element at `path` with its children.
    fn unwrap_at(&mut self, path: &[usize]) {
        let Some((&index, parent_path)) = path.split_last() else {
            return;
        };
        let Some(parent) = self.root.element_at_mut(parent_path) else {
            return;
        };
        if index < parent.children.len()
            && let Node::Element(wrapper) = parent.children.remove(index)
        {
            parent.children.splice(index..index, wrapper.children);
        }
    }

    /// Change the block kind of every line in the range.
    ///
    /// A block already holding exactly the line is retagged. Runs inside a
    /// list item or next to other blocks get a fresh block around them.
    /// When every affected line already has `kind`, either as its own block
    /// or from an enclosing wrapper such as a blockquote, the kind is taken
    /// off: own blocks become paragraphs and wrappers are removed.
    pub fn replace_block(&mut self, selection: &Selection, kind: ElementKind) -> Selection {
        let (start, end) = self.ordered_offsets(selection);
        let lines = self.lines_in(start, end);
        let holders: Vec<Option<Vec<usize>>> =
            lines.iter().map(|line| self.holder_of(line, kind)).collect();

        if lines.is_empty() || holders.iter().any(Option::is_none) {
            for line in lines.iter().rev() {
                self.retag_line(line, kind);
            }
        } else {
            let mut wrappers = Vec::new();
            for (line, holder) in lines.iter().zip(holders.into_iter().flatten().collect::<Vec<_>>()).rev() {
                if holder == line.container {
                    self.retag_line(line, ElementKind::Paragraph);
                } else {
                    wrappers.push(holder);
                }
            }
            // later and deeper wrappers first, so the remaining paths hold
            wrappers.sort();
            wrappers.dedup();
            for path in wrappers.iter().rev() {
                self.unwrap_at(path);
            }
        }
        self.normalize();
        self.range_selection(start, end)
    }

    /// Path of the nearest element of `kind` holding `line`, its own
    /// container included.
    fn holder_of(&self, line: &Line, kind: ElementKind) -> Option<Vec<usize>> {
        (1..=line.container.len())
            .rev()
            .map(|depth| &line.container[..depth])
            .find(|path| self.root.element_at(path).is_some_and(|element| element.kind == kind))
            .map(<[usize]>::to_vec)
    }

    fn retag_line(&mut self, line: &Line, target: ElementKind) {
        let Some(container) = self.root.element_at_mut(&line.container) else {
            return;
        };
        if !(line.spans(container) && container.kind.is_text_block()) {
            wrap_children(container, line.start..line.end, target, Attributes::new());
            return;
        }
        if container.kind == ElementKind::Callout {
            container.attributes.clear();
        }
        container.kind = target;

        // a paragraph alone in a list item goes back to plain item content
        if target == ElementKind::Paragraph
            && let Some((&index, item_path)) = line.container.split_last()
            && let Some(item) = self.root.element_at_mut(item_path)
            && item.kind == ElementKind::ListItem
            && item.children.len() == 1
            && let Some(Node::Element(paragraph)) = item.children.get_mut(index)
        {
            let children = std::mem::take(&mut paragraph.children);
            item.children = children;
        }
    }

    /// Delete everything between the selection's endpoints. The tail of the
    /// last line joins the first line; emptied containers are pruned.
    pub fn delete_range(&mut self, selection: &Selection) -> Selection {
        let (start, end) = self.ordered_offsets(selection);
        if start < end {
            self.delete_span(start, end);
            self.normalize();
        }
        Selection::collapsed(self.position_at(start, Bias::Backward))
    }

    fn delete_span(&mut self, start: usize, end: usize) {
        let lines = self.lines_in(start, end);
        let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
            return;
        };
        if lines.len() == 1 {
            if let Some(range) = self.isolate_in_line(first, start, end)
                && let Some(container) = self.root.element_at_mut(&first.container)
            {
                container.children.drain(range);
            }
            return;
        }

        let tail = self.take_line_tail(last, end);
        for line in lines[1..lines.len() - 1].iter().rev() {
            let Some(container) = self.root.element_at_mut(&line.container) else {
                continue;
            };
            if line.spans(container) && !line.container.is_empty() {
                self.remove_and_prune(&line.container);
            } else {
                container.children.drain(line.start..line.end);
            }
        }

        let from = lines::position_in_line(&self.root, first, start - first.offset, Bias::Backward);
        let depth = first.container.len();
        let Some(container) = self.root.element_at_mut(&first.container) else {
            return;
        };
        let before = container.children.len();
        let cut = split_at(container, &from.path[depth..], from.offset);
        let run_end = first.end + (container.children.len() - before);
        container.children.drain(cut..run_end);
        container.children.splice(cut..cut, tail);
    }

    /// Detach the part of `line` from `offset` to its end and remove the rest
    /// of the run. The container is pruned if nothing is left in it.
    fn take_line_tail(&mut self, line: &Line, offset: usize) -> Vec<Node> {
        let from = lines::position_in_line(&self.root, line, offset - line.offset, Bias::Forward);
        let depth = line.container.len();
        let Some(container) = self.root.element_at_mut(&line.container) else {
            return Vec::new();
        };
        let before = container.children.len();
        let cut = split_at(container, &from.path[depth..], from.offset);
        let run_end = line.end + (container.children.len() - before);
        let tail: Vec<Node> = container.children.drain(cut..run_end).collect();
        container.children.drain(line.start..cut);
        if container.children.is_empty() && !line.container.is_empty() {
            self.remove_and_prune(&line.container);
        }
        tail
    }

    /// Remove the node at `path`, then every ancestor left empty by it.
    fn remove_and_prune(&mut self, path: &[usize]) {
        let mut path = path.to_vec();
        while let Some(index) = path.pop() {
            let Some(parent) = self.root.element_at_mut(&path) else {
                return;
            };
            if index < parent.children.len() {
                parent.children.remove(index);
            }
            if !parent.children.is_empty() || path.is_empty() {
                return;
            }
        }
    }

    /// Insert `node` at `position` and return a caret just after it.
    pub fn insert_at(&mut self, position: &Position, node: Node) -> Selection {
        if node.is_block() {
            return self.insert_block(position, node);
        }

        let position = self.inline_host(position);
        let offset = self.offset_of(&position);
        let inserted = node.text_len();
        let (parent_path, index) = match self.root.node_at(&position.path) {
            Some(Node::Text { .. }) => {
                let Some((&last, parent_path)) = position.path.split_last() else {
                    return self.range_selection(offset, offset);
                };
                let parent_path = parent_path.to_vec();
                let Some(parent) = self.root.element_at_mut(&parent_path) else {
                    return self.range_selection(offset, offset);
                };
                let index = split_at(parent, &[last], position.offset);
                (parent_path, index)
            }
            _ => (position.path.clone(), position.offset),
        };
        if let Some(parent) = self.root.element_at_mut(&parent_path) {
            let index = index.min(parent.children.len());
            parent.children.insert(index, node);
        }
        self.normalize();
        Selection::collapsed(self.position_at(offset + inserted, Bias::Backward))
    }

    /// A position where inline content may go: inside text or inside an
    /// element holding only inline children.
    fn inline_host(&self, position: &Position) -> Position {
        let position = self.clamp_position(position);
        let hosts_inline = match self.root.node_at(&position.path) {
            Some(Node::Text { .. }) => true,
            Some(Node::Element(element)) => element.is_line_host(),
            None => false,
        };
        if hosts_inline {
            position
        } else {
            self.position_at(self.offset_of(&position), Bias::Forward)
        }
    }

    fn insert_block(&mut self, position: &Position, node: Node) -> Selection {
        let position = self.clamp_position(position);
        let offset = self.offset_of(&position);
        let (parent_path, index) = self.block_slot(offset);

        let Some(parent) = self.root.element_at_mut(&parent_path) else {
            return self.range_selection(offset, offset);
        };
        let index = index.min(parent.children.len());
        parent.children.insert(index, node);
        if parent_path.is_empty() && index + 1 == parent.children.len() {
            parent
                .children
                .push(Node::Element(Element::new(ElementKind::Paragraph)));
        }
        self.normalize();
        Selection::collapsed(Position::new(parent_path, index + 1))
    }

    /// Where a block inserted at flat `offset` goes: the enclosing block is
    /// split there (list items keep the block inside them), and an empty
    /// paragraph is given up to make room.
    fn block_slot(&mut self, offset: usize) -> (Vec<usize>, usize) {
        let Some(line) = self.line_at(offset) else {
            return (Vec::new(), self.root.children.len());
        };
        let Some((&container_index, parent_path)) = line.container.split_last() else {
            return (Vec::new(), self.root.children.len());
        };
        let Some(container) = self.root.element_at(&line.container) else {
            return (Vec::new(), self.root.children.len());
        };

        if container.kind == ElementKind::Paragraph && container.children.is_empty() {
            let parent_path = parent_path.to_vec();
            if let Some(parent) = self.root.element_at_mut(&parent_path) {
                parent.children.remove(container_index);
            }
            return (parent_path, container_index);
        }

        let at = lines::position_in_line(&self.root, &line, offset - line.offset, Bias::Backward);
        let split_inside = container.kind == ElementKind::ListItem || !container.is_line_host();
        let host_path = if split_inside {
            line.container.clone()
        } else {
            parent_path.to_vec()
        };
        let Some(host) = self.root.element_at_mut(&host_path) else {
            return (Vec::new(), self.root.children.len());
        };
        let index = split_at(host, &at.path[host_path.len()..], at.offset);
        (host_path, index)
    }

    /// Apply `transform` to the isolated children covering `[start, end)` on
    /// every line, then normalize.
    pub(crate) fn map_range(&mut self, start: usize, end: usize, transform: impl Fn(Vec<Node>) -> Vec<Node>) {
        for line in self.lines_in(start, end).iter().rev() {
            let Some(range) = self.isolate_in_line(line, start, end) else {
                continue;
            };
            let Some(container) = self.root.element_at_mut(&line.container) else {
                continue;
            };
            let taken: Vec<Node> = container.children.drain(range.clone()).collect();
            let replacement = transform(taken);
            container.children.splice(range.start..range.start, replacement);
        }
        self.normalize();
    }

    /// Split the run of `line` so that `[start, end)` (clipped to the line)
    /// is a whole range of the container's children. `None` when the clip is
    /// empty.
    fn isolate_in_line(&mut self, line: &Line, start: usize, end: usize) -> Option<Range<usize>> {
        let from = start.max(line.offset);
        let to = end.min(line.end_offset());
        if from >= to {
            return None;
        }
        let first = lines::position_in_line(&self.root, line, from - line.offset, Bias::Forward);
        let last = lines::position_in_line(&self.root, line, to - line.offset, Bias::Backward);
        let depth = line.container.len();
        let container = self.root.element_at_mut(&line.container)?;
        Some(isolate(
            container,
            (&first.path[depth..], first.offset),
            (&last.path[depth..], last.offset),
        ))
    }

    /// Common parent and child range of the sibling blocks that hold every
    /// line touching `[start, end]`.
    pub(crate) fn sibling_blocks(&self, start: usize, end: usize) -> Option<(Vec<usize>, Range<usize>)> {
        let lines = self.lines_in(start, end);
        sibling_blocks_of(&lines)
    }
}

pub(crate) fn sibling_blocks_of(lines: &[Line]) -> Option<(Vec<usize>, Range<usize>)> {
    let (first, last) = (lines.first()?, lines.last()?);
    let mut common = first.container.clone();
    let mut shallowest = usize::MAX;
    for line in lines {
        let shared = common
            .iter()
            .zip(&line.container)
            .take_while(|(a, b)| a == b)
            .count();
        common.truncate(shared);
        shallowest = shallowest.min(line.container.len());
    }
    if shallowest == 0 {
        return None;
    }
    common.truncate(shallowest - 1);
    let depth = common.len();
    Some((common, first.container[depth]..last.container[depth] + 1))
}

fn wrap_children(element: &mut Element, range: Range<usize>, kind: ElementKind, attributes: Attributes) {
    let start = range.start;
    let children: Vec<Node> = element.children.drain(range).collect();
    element.children.insert(
        start,
        Node::Element(Element {
            kind,
            attributes,
            children,
        }),
    );
}
