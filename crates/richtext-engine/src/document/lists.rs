//! List toggling and item nesting.

use super::edit::sibling_blocks_of;
use super::node::{Element, ElementKind, Node};
use super::position::Selection;
use super::DocumentModel;

impl DocumentModel {
    /// Toggle a list of `kind` over the range.
    ///
    /// Inside a list of the same kind the selected items become plain
    /// blocks; inside a list of another kind the list switches kind;
    /// anywhere else the covering sibling blocks become one new list.
    pub fn toggle_list(&mut self, selection: &Selection, kind: ElementKind) -> Selection {
        let (start, end) = self.ordered_offsets(selection);
        let lines = self.lines_in(start, end);
        let Some((parent_path, range)) = sibling_blocks_of(&lines) else {
            return self.range_selection(start, end);
        };

        match self.nearest_list(&parent_path) {
            Some(list_path) => {
                let depth = list_path.len();
                let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
                    return self.range_selection(start, end);
                };
                let items = first.container[depth]..last.container[depth] + 1;
                let Some(list) = self.root.element_at_mut(&list_path) else {
                    return self.range_selection(start, end);
                };
                if list.kind == kind {
                    self.unlist_items(&list_path, items);
                } else {
                    list.kind = kind;
                }
            }
            None => {
                if let Some(parent) = self.root.element_at_mut(&parent_path) {
                    wrap_in_list(parent, range, kind);
                }
            }
        }
        self.normalize();
        self.range_selection(start, end)
    }

    fn nearest_list(&self, path: &[usize]) -> Option<Vec<usize>> {
        (0..=path.len())
            .rev()
            .find(|&depth| {
                self.root
                    .element_at(&path[..depth])
                    .is_some_and(|element| element.kind.is_list())
            })
            .map(|depth| path[..depth].to_vec())
    }

    /// Replace `items` of the list at `list_path` with their content as
    /// blocks, splitting the list around them.
    fn unlist_items(&mut self, list_path: &[usize], items: std::ops::Range<usize>) {
        let Some((&list_index, outer_path)) = list_path.split_last() else {
            return;
        };
        let Some(outer) = self.root.element_at_mut(outer_path) else {
            return;
        };
        let Node::Element(list) = outer.children.remove(list_index) else {
            return;
        };

        let Element {
            kind,
            attributes,
            mut children,
        } = list;
        let after = children.split_off(items.end.min(children.len()));
        let selected = children.split_off(items.start.min(children.len()));
        let before = children;

        let mut replacement = Vec::new();
        if !before.is_empty() {
            replacement.push(Node::Element(Element {
                kind,
                attributes: attributes.clone(),
                children: before,
            }));
        }
        for item in selected {
            replacement.extend(item_into_blocks(item));
        }
        if !after.is_empty() {
            replacement.push(Node::Element(Element {
                kind,
                attributes,
                children: after,
            }));
        }
        outer.children.splice(list_index..list_index, replacement);
    }

    /// Path of the list item holding flat `offset`, if any.
    pub fn list_item_at(&self, offset: usize) -> Option<Vec<usize>> {
        let line = self.line_at(offset)?;
        (1..=line.container.len())
            .rev()
            .find(|&depth| {
                self.root
                    .element_at(&line.container[..depth])
                    .is_some_and(|element| element.kind == ElementKind::ListItem)
            })
            .map(|depth| line.container[..depth].to_vec())
    }

    /// Nest the list item at the range start under its previous sibling.
    pub fn indent_item(&mut self, selection: &Selection) -> Selection {
        let (start, end) = self.ordered_offsets(selection);
        if let Some(item_path) = self.list_item_at(start) {
            self.indent_at(&item_path);
            self.normalize();
        }
        self.range_selection(start, end)
    }

    fn indent_at(&mut self, item_path: &[usize]) {
        let Some((&index, list_path)) = item_path.split_last() else {
            return;
        };
        let Some(list) = self.root.element_at_mut(list_path) else {
            return;
        };
        if index == 0 || !matches!(list.children.get(index - 1), Some(Node::Element(_))) {
            return;
        }
        let list_kind = list.kind;
        let item = list.children.remove(index);
        let Some(Node::Element(previous)) = list.children.get_mut(index - 1) else {
            return;
        };
        match previous.children.last_mut() {
            Some(Node::Element(nested)) if nested.kind == list_kind => nested.children.push(item),
            _ => previous
                .children
                .push(Node::element(list_kind, vec![item])),
        }
    }

    /// Move the list item at the range start out to its parent list,
    /// carrying its later siblings along as a nested list.
    pub fn outdent_item(&mut self, selection: &Selection) -> Selection {
        let (start, end) = self.ordered_offsets(selection);
        if let Some(item_path) = self.list_item_at(start) {
            self.outdent_at(&item_path);
            self.normalize();
        }
        self.range_selection(start, end)
    }

    fn outdent_at(&mut self, item_path: &[usize]) {
        let Some((&index, list_path)) = item_path.split_last() else {
            return;
        };
        let Some((&list_index, parent_item_path)) = list_path.split_last() else {
            return;
        };
        let Some((&parent_index, outer_list_path)) = parent_item_path.split_last() else {
            return;
        };
        let parent_is_item = self
            .root
            .element_at(parent_item_path)
            .is_some_and(|element| element.kind == ElementKind::ListItem);
        if !parent_is_item {
            return;
        }

        let Some(list) = self.root.element_at_mut(list_path) else {
            return;
        };
        if !matches!(list.children.get(index), Some(Node::Element(_))) {
            return;
        }
        let list_kind = list.kind;
        let list_attributes = list.attributes.clone();
        let followers = list.children.split_off(index + 1);
        let Node::Element(mut item) = list.children.remove(index) else {
            return;
        };
        let list_emptied = list.children.is_empty();

        if !followers.is_empty() {
            match item.children.last_mut() {
                Some(Node::Element(nested)) if nested.kind == list_kind => {
                    nested.children.extend(followers)
                }
                _ => item.children.push(Node::Element(Element {
                    kind: list_kind,
                    attributes: list_attributes,
                    children: followers,
                })),
            }
        }
        if list_emptied && let Some(parent_item) = self.root.element_at_mut(parent_item_path) {
            parent_item.children.remove(list_index);
        }
        if let Some(outer_list) = self.root.element_at_mut(outer_list_path) {
            let at = (parent_index + 1).min(outer_list.children.len());
            outer_list.children.insert(at, Node::Element(item));
        }
    }
}

/// Wrap the `range` of `parent`'s children in a new list. Existing lists
/// contribute their items, text blocks become items, other blocks are
/// nested inside a fresh item.
fn wrap_in_list(parent: &mut Element, range: std::ops::Range<usize>, kind: ElementKind) {
    let start = range.start;
    let taken: Vec<Node> = parent.children.drain(range).collect();
    let mut items = Vec::with_capacity(taken.len());
    for node in taken {
        match node {
            Node::Element(list) if list.kind.is_list() => items.extend(list.children),
            Node::Element(item) if item.kind == ElementKind::ListItem => {
                items.push(Node::Element(item))
            }
            Node::Element(block) if converts_to_item(&block) => {
                items.push(Node::element(ElementKind::ListItem, block.children))
            }
            other => items.push(Node::element(ElementKind::ListItem, vec![other])),
        }
    }
    parent.children.insert(start, Node::element(kind, items));
}

fn converts_to_item(block: &Element) -> bool {
    matches!(
        block.kind,
        ElementKind::Paragraph
            | ElementKind::Heading1
            | ElementKind::Heading2
            | ElementKind::Heading3
            | ElementKind::Division
    ) && block.is_line_host()
}

/// The blocks an unlisted item turns into: inline runs become paragraphs,
/// nested blocks stay as they are.
fn item_into_blocks(node: Node) -> Vec<Node> {
    let Node::Element(item) = node else {
        return vec![Node::element(ElementKind::Paragraph, vec![node])];
    };
    if item.kind != ElementKind::ListItem {
        return vec![Node::Element(item)];
    }
    if item.children.is_empty() {
        return vec![Node::element(ElementKind::Paragraph, Vec::new())];
    }

    let mut blocks = Vec::new();
    let mut run = Vec::new();
    for child in item.children {
        if child.is_inline() {
            run.push(child);
            continue;
        }
        if !run.is_empty() {
            blocks.push(Node::element(ElementKind::Paragraph, std::mem::take(&mut run)));
        }
        blocks.push(child);
    }
    if !run.is_empty() {
        blocks.push(Node::element(ElementKind::Paragraph, run));
    }
    blocks
}
