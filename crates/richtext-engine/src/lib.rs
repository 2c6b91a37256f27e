pub mod commands;
pub mod document;
pub mod error;
pub mod history;
mod markup;
pub mod selection;
pub mod session;
pub mod shortcuts;

// Re-export key types for easier usage
pub use commands::{Command, CommandExecutor, StyleProperty};
pub use document::{Attributes, Bias, DocumentModel, Element, ElementKind, Node, Position, Selection};
pub use error::EditorError;
pub use history::{HistoryEntry, HistoryStore, InputDebouncer};
pub use selection::{HeadlessSurface, LivePoint, LiveRange, RenderSurface, SelectionTracker, SurfaceError};
pub use session::{EditResult, Editor};
pub use shortcuts::{Key, KeyChord, Modifiers, ShortcutAction};
