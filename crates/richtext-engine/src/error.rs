/// Every failure the engine reports.
///
/// Command-level variants are returned as values: the document and history
/// are untouched when one of them comes back from [`crate::Editor::run`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("no active selection to apply the command to")]
    NoActiveSelection,
    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),
    #[error("command `{command}` requires a value")]
    MissingValue { command: String },
    #[error("malformed document at byte {offset}: {reason}")]
    MalformedDocument { reason: String, offset: usize },
    #[error("selection could not be resolved: {reason}")]
    SelectionResolutionFailure { reason: String },
}

impl EditorError {
    pub(crate) fn malformed(reason: impl Into<String>, offset: usize) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
            offset,
        }
    }

    pub(crate) fn unresolved(reason: impl Into<String>) -> Self {
        Self::SelectionResolutionFailure {
            reason: reason.into(),
        }
    }
}
