//! Mapping between the rendering layer's live selection and model
//! positions.
//!
//! The renderer is reached through [`RenderSurface`]. Live nodes are opaque
//! handles; the tracker only ever walks them by parent and child index, so
//! a model [`Position`] is the list of child indices from the root.

use crate::document::{DocumentModel, Node, Position, Selection};
use crate::error::EditorError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivePoint<H> {
    pub node: H,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRange<H> {
    pub anchor: LivePoint<H>,
    pub focus: LivePoint<H>,
}

/// Rejection reported by a rendering surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SurfaceError(pub String);

/// The rendering layer as the selection tracker sees it.
pub trait RenderSurface {
    type Handle: Clone + PartialEq + std::fmt::Debug;

    fn root(&self) -> Self::Handle;

    /// Parent of `node` and the index of `node` among its children. `None`
    /// for the root and for detached nodes.
    fn parent_of(&self, node: &Self::Handle) -> Option<(Self::Handle, usize)>;

    fn child_at(&self, node: &Self::Handle, index: usize) -> Option<Self::Handle>;

    fn child_count(&self, node: &Self::Handle) -> usize;

    /// Character length of a text node, `None` for elements.
    fn text_len(&self, node: &Self::Handle) -> Option<usize>;

    fn live_selection(&self) -> Option<LiveRange<Self::Handle>>;

    fn apply_selection(&mut self, range: LiveRange<Self::Handle>) -> Result<(), SurfaceError>;

    /// Re-render from the model after it changed.
    fn sync(&mut self, document: &DocumentModel);
}

#[derive(Debug, Clone)]
pub struct SelectionTracker<S: RenderSurface> {
    surface: S,
}

impl<S: RenderSurface> SelectionTracker<S> {
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn sync(&mut self, document: &DocumentModel) {
        self.surface.sync(document);
    }

    /// The live selection as model positions, if there is one.
    pub fn capture(&self) -> Option<Selection> {
        let Some(live) = self.surface.live_selection() else {
            log::debug!("No live selection to capture");
            return None;
        };
        let anchor = self.position_of(&live.anchor)?;
        let focus = self.position_of(&live.focus)?;
        Some(Selection::new(anchor, focus))
    }

    fn position_of(&self, point: &LivePoint<S::Handle>) -> Option<Position> {
        let root = self.surface.root();
        let mut path = Vec::new();
        let mut node = point.node.clone();
        while node != root {
            let Some((parent, index)) = self.surface.parent_of(&node) else {
                log::debug!("Live selection is outside the editor: {:?}", point.node);
                return None;
            };
            path.push(index);
            node = parent;
        }
        path.reverse();
        Some(Position::new(path, point.offset))
    }

    /// Resolve a model position to a live point, clamping indices and the
    /// offset to what the live tree holds.
    pub fn resolve(&self, position: &Position) -> Result<LivePoint<S::Handle>, EditorError> {
        let mut node = self.surface.root();
        for (depth, &index) in position.path.iter().enumerate() {
            if self.surface.text_len(&node).is_some() {
                return Err(EditorError::unresolved(format!(
                    "path {:?} descends through a text node at depth {depth}",
                    position.path
                )));
            }
            let count = self.surface.child_count(&node);
            if count == 0 {
                return Ok(LivePoint { node, offset: 0 });
            }
            let clamped = index.min(count - 1);
            node = self.surface.child_at(&node, clamped).ok_or_else(|| {
                EditorError::unresolved(format!("no child {clamped} at depth {depth}"))
            })?;
            if clamped != index {
                let offset = self.limit(&node);
                return Ok(LivePoint { node, offset });
            }
        }
        let offset = position.offset.min(self.limit(&node));
        Ok(LivePoint { node, offset })
    }

    fn limit(&self, node: &S::Handle) -> usize {
        self.surface
            .text_len(node)
            .unwrap_or_else(|| self.surface.child_count(node))
    }

    /// Put `selection` back on the live tree. Failures are logged and leave
    /// the live selection as it was.
    pub fn restore(&mut self, selection: Option<&Selection>) -> bool {
        let Some(selection) = selection else {
            return false;
        };
        match self.try_restore(selection) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to restore selection: {err}");
                false
            }
        }
    }

    fn try_restore(&mut self, selection: &Selection) -> Result<(), EditorError> {
        let anchor = self.resolve(&selection.anchor)?;
        let focus = self.resolve(&selection.focus)?;
        self.surface
            .apply_selection(LiveRange { anchor, focus })
            .map_err(|err| EditorError::unresolved(err.to_string()))
    }
}

/// A surface with no real renderer behind it. It mirrors the last synced
/// document and uses tree paths as node handles.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    mirror: DocumentModel,
    selection: Option<LiveRange<Vec<usize>>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the live selection the way a user click would.
    pub fn place(&mut self, selection: Option<LiveRange<Vec<usize>>>) {
        self.selection = selection;
    }

    fn exists(&self, node: &[usize]) -> bool {
        node.is_empty() || self.mirror.node_at(node).is_some()
    }
}

impl RenderSurface for HeadlessSurface {
    type Handle = Vec<usize>;

    fn root(&self) -> Vec<usize> {
        Vec::new()
    }

    fn parent_of(&self, node: &Vec<usize>) -> Option<(Vec<usize>, usize)> {
        if !self.exists(node) {
            return None;
        }
        let (&index, parent) = node.split_last()?;
        Some((parent.to_vec(), index))
    }

    fn child_at(&self, node: &Vec<usize>, index: usize) -> Option<Vec<usize>> {
        let mut child = node.clone();
        child.push(index);
        self.exists(&child).then_some(child)
    }

    fn child_count(&self, node: &Vec<usize>) -> usize {
        self.mirror
            .element_at(node)
            .map_or(0, |element| element.children.len())
    }

    fn text_len(&self, node: &Vec<usize>) -> Option<usize> {
        match self.mirror.node_at(node) {
            Some(Node::Text { value }) => Some(value.chars().count()),
            _ => None,
        }
    }

    fn live_selection(&self) -> Option<LiveRange<Vec<usize>>> {
        self.selection.clone()
    }

    fn apply_selection(&mut self, range: LiveRange<Vec<usize>>) -> Result<(), SurfaceError> {
        for point in [&range.anchor, &range.focus] {
            if !self.exists(&point.node) {
                return Err(SurfaceError(format!("node {:?} is not rendered", point.node)));
            }
        }
        self.selection = Some(range);
        Ok(())
    }

    fn sync(&mut self, document: &DocumentModel) {
        self.mirror = document.clone();
    }
}
