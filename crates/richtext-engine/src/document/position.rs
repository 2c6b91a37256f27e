use serde::{Deserialize, Serialize};

/// A point in the document tree.
///
/// When `path` names a text node, `offset` counts characters inside it.
/// When it names an element, `offset` is a child index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub path: Vec<usize>,
    pub offset: usize,
}

impl Position {
    pub fn new(path: Vec<usize>, offset: usize) -> Self {
        Self { path, offset }
    }

    /// Path extended with the offset; comparing keys orders points in
    /// document order.
    pub(crate) fn key(&self) -> Vec<usize> {
        let mut key = self.path.clone();
        key.push(self.offset);
        key
    }
}

/// An anchor/focus pair. Direction is preserved as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn new(anchor: Position, focus: Position) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(position: Position) -> Self {
        Self {
            anchor: position.clone(),
            focus: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Which side of a boundary between two text nodes a flat offset lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Prefer the start of the following text
    Forward,
    /// Prefer the end of the preceding text
    Backward,
}
