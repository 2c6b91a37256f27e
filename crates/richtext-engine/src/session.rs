//! The editing session: one document, its selection, its history.

use serde::Serialize;
use std::time::Instant;

use richtext_config::Config;

use crate::commands::{Command, CommandExecutor};
use crate::document::{DocumentModel, Selection};
use crate::error::EditorError;
use crate::history::{HistoryEntry, HistoryStore, InputDebouncer, StructuralEdit};
use crate::selection::{HeadlessSurface, RenderSurface, SelectionTracker};
use crate::shortcuts::{self, KeyChord, ShortcutAction};

/// What the host needs after an edit: the serialized document and the
/// selection to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditResult {
    pub content: String,
    pub selection: Option<Selection>,
}

pub struct Editor<S: RenderSurface = HeadlessSurface> {
    document: DocumentModel,
    tracker: SelectionTracker<S>,
    executor: CommandExecutor,
    history: HistoryStore,
    debouncer: InputDebouncer,
}

impl Editor<HeadlessSurface> {
    pub fn new(config: &Config) -> Self {
        Self::with_surface(config, HeadlessSurface::new())
    }

    pub fn with_content(config: &Config, initial: &str) -> Self {
        let config = Config {
            initial_content: initial.to_string(),
            ..config.clone()
        };
        Self::new(&config)
    }
}

impl<S: RenderSurface> Editor<S> {
    pub fn with_surface(config: &Config, surface: S) -> Self {
        let document = DocumentModel::parse_or_default(&config.initial_content);
        let mut tracker = SelectionTracker::new(surface);
        tracker.sync(&document);
        let history = HistoryStore::new(HistoryEntry::new(document.serialize(), None))
            .with_limit(config.history_limit);

        Self {
            document,
            tracker,
            executor: CommandExecutor::new(config),
            history,
            debouncer: InputDebouncer::new(config.debounce_interval()),
        }
    }

    /// Run a named command against the current selection.
    pub fn run(&mut self, command: &str, value: Option<&str>) -> Result<EditResult, EditorError> {
        let command = Command::from_name(command, value)?;
        self.execute(&command)
    }

    pub fn execute(&mut self, command: &Command) -> Result<EditResult, EditorError> {
        let selection = self.tracker.capture();
        self.executor
            .check(&self.document, selection.as_ref(), command)?;

        let pending = self.debouncer.is_pending();
        let next = {
            // suspending drops the typing deadline, so the burst is
            // written here as its own entry
            let _edit = StructuralEdit::begin(&mut self.debouncer);
            if pending {
                self.history.commit_if_changed(HistoryEntry::new(
                    self.document.serialize(),
                    selection.clone(),
                ));
            }
            self.executor
                .execute(&mut self.document, selection.as_ref(), command)?
        };
        log::debug!("Ran {}", command.name());
        Ok(self.settle(Some(next)))
    }

    /// Insert pasted text. Markup in the clipboard is never interpreted.
    pub fn on_paste(&mut self, plain_text: &str) -> Result<EditResult, EditorError> {
        self.execute(&Command::InsertText {
            text: plain_text.to_string(),
        })
    }

    /// Take over the renderer's content after the user typed into it. The
    /// history entry for the burst is written once typing pauses, see
    /// [`Editor::tick`].
    pub fn on_input(&mut self, live_content: &str, now: Instant) -> Result<EditResult, EditorError> {
        self.document = DocumentModel::parse(live_content)?;
        self.tracker.sync(&self.document);
        self.debouncer.schedule(now);
        Ok(EditResult {
            content: self.document.serialize(),
            selection: self.tracker.capture(),
        })
    }

    /// Commit pending typing once its quiet period is over. Returns whether
    /// a history entry was written.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.debouncer.fire_if_due(now) {
            return false;
        }
        self.commit_current()
    }

    pub fn undo(&mut self) -> Option<EditResult> {
        self.flush_pending_input();
        let entry = self.history.undo()?;
        Some(self.apply_entry(entry))
    }

    pub fn redo(&mut self) -> Option<EditResult> {
        self.flush_pending_input();
        let entry = self.history.redo()?;
        Some(self.apply_entry(entry))
    }

    /// Handle a key chord. `None` when nothing is bound to it or the bound
    /// action had nothing to do.
    pub fn handle_shortcut(&mut self, chord: KeyChord) -> Option<Result<EditResult, EditorError>> {
        match shortcuts::resolve(chord, self.caret_in_list_item())? {
            ShortcutAction::Run(command) => Some(self.execute(&command)),
            ShortcutAction::Undo => self.undo().map(Ok),
            ShortcutAction::Redo => self.redo().map(Ok),
        }
    }

    /// Move the live selection, as a click or arrow key would.
    pub fn select(&mut self, selection: &Selection) -> bool {
        self.tracker.restore(Some(selection))
    }

    pub fn selection(&self) -> Option<Selection> {
        self.tracker.capture()
    }

    pub fn is_active(&self, command: &Command) -> bool {
        self.executor
            .is_active(&self.document, self.selection().as_ref(), command)
    }

    pub fn content(&self) -> String {
        self.document.serialize()
    }

    pub fn text_content(&self) -> String {
        self.document.text_content()
    }

    pub fn char_count(&self) -> usize {
        self.document.char_count()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn document(&self) -> &DocumentModel {
        &self.document
    }

    pub fn tracker(&self) -> &SelectionTracker<S> {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut SelectionTracker<S> {
        &mut self.tracker
    }

    fn caret_in_list_item(&self) -> bool {
        self.selection().is_some_and(|selection| {
            let (start, _) = self.document.ordered_offsets(&selection);
            self.document.list_item_at(start).is_some()
        })
    }

    /// Write a pending typing burst as its own entry before a structural
    /// edit.
    fn flush_pending_input(&mut self) {
        if self.debouncer.is_pending() {
            self.debouncer.cancel();
            self.commit_current();
        }
    }

    fn commit_current(&mut self) -> bool {
        let entry = HistoryEntry::new(self.document.serialize(), self.tracker.capture());
        self.history.commit_if_changed(entry)
    }

    /// Render the edited document, put the selection back and record it.
    fn settle(&mut self, selection: Option<Selection>) -> EditResult {
        let content = self.document.serialize();
        self.tracker.sync(&self.document);
        self.tracker.restore(selection.as_ref());
        self.history
            .commit_if_changed(HistoryEntry::new(content.clone(), selection.clone()));
        EditResult { content, selection }
    }

    /// Swap in a history snapshot. An entry recorded without a selection
    /// (the initial document, typing with no caret) keeps the live
    /// selection, carried across by flat offset so it never points into
    /// the replaced tree.
    fn apply_entry(&mut self, entry: HistoryEntry) -> EditResult {
        let live = self.tracker.capture();
        let document = DocumentModel::parse_or_default(&entry.content);
        let selection = entry.selection.or_else(|| {
            live.map(|selection| document.carry_selection(&self.document, &selection))
        });

        self.document = document;
        self.tracker.sync(&self.document);
        self.tracker.restore(selection.as_ref());
        EditResult {
            content: self.document.serialize(),
            selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Position;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn editor(markup: &str) -> Editor {
        Editor::with_content(&Config::default(), markup)
    }

    fn caret(path: Vec<usize>, offset: usize) -> Selection {
        Selection::collapsed(Position::new(path, offset))
    }

    #[test]
    fn test_new_editor_uses_config_content() {
        let editor = editor("<h1>Hi</h1>");

        assert_eq!(editor.content(), "<h1>Hi</h1>");
        assert!(!editor.can_undo());
        assert_eq!(editor.selection(), None);
    }

    #[test]
    fn test_malformed_initial_content_falls_back() {
        let editor = editor("<p>broken");

        assert_eq!(editor.content(), "<p></p>");
    }

    #[test]
    fn test_run_commits_and_restores_selection() {
        let mut editor = editor("<p>hello</p>");
        editor.select(&Selection::new(
            Position::new(vec![0, 0], 0),
            Position::new(vec![0, 0], 5),
        ));

        let result = editor.run("bold", None).unwrap();

        assert_eq!(result.content, "<p><strong>hello</strong></p>");
        assert_eq!(editor.selection(), result.selection);
        assert!(editor.can_undo());
    }

    #[test]
    fn test_failed_command_changes_nothing() {
        let mut editor = editor("<p>hello</p>");
        editor.select(&caret(vec![0, 0], 1));

        let err = editor.run("bold", None).unwrap_err();

        assert_eq!(err, EditorError::NoActiveSelection);
        assert_eq!(editor.content(), "<p>hello</p>");
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_unknown_command() {
        let mut editor = editor("<p>hello</p>");

        assert_eq!(
            editor.run("explode", None),
            Err(EditorError::UnsupportedCommand("explode".into()))
        );
    }

    #[test]
    fn test_typing_is_debounced_into_one_entry() {
        let mut editor = editor("<p></p>");
        let start = Instant::now();

        editor.on_input("<p>a</p>", start).unwrap();
        editor.on_input("<p>ab</p>", start + Duration::from_millis(200)).unwrap();
        assert!(!editor.tick(start + Duration::from_millis(600)));
        assert!(editor.tick(start + Duration::from_millis(700)));

        assert_eq!(editor.undo().map(|r| r.content), Some("<p></p>".into()));
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_malformed_input_keeps_model() {
        let mut editor = editor("<p>safe</p>");

        let err = editor.on_input("<p>oops", Instant::now()).unwrap_err();

        assert!(matches!(err, EditorError::MalformedDocument { .. }));
        assert_eq!(editor.content(), "<p>safe</p>");
    }

    #[test]
    fn test_structural_command_flushes_typing_first() {
        let mut editor = editor("<p></p>");
        let start = Instant::now();
        editor.on_input("<p>typed</p>", start).unwrap();
        editor.select(&Selection::new(
            Position::new(vec![0, 0], 0),
            Position::new(vec![0, 0], 5),
        ));

        editor.run("italic", None).unwrap();

        assert_eq!(editor.undo().map(|r| r.content), Some("<p>typed</p>".into()));
        assert_eq!(editor.undo().map(|r| r.content), Some("<p></p>".into()));
        // the timer was cancelled by the flush
        assert!(!editor.tick(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_structural_command_keeps_debouncer_quiet() {
        let mut editor = editor("<p></p>");
        let start = Instant::now();
        editor.on_input("<p>ab</p>", start).unwrap();
        editor.select(&caret(vec![0, 0], 2));

        editor.on_paste("c").unwrap();

        assert!(!editor.debouncer.is_pending());
        assert!(!editor.debouncer.is_suspended());
        assert_eq!(editor.undo().map(|r| r.content), Some("<p>ab</p>".into()));
    }

    #[test]
    fn test_undo_to_initial_document_keeps_selection_live() {
        let mut editor = editor("<p>x</p>");
        editor.select(&Selection::new(
            Position::new(vec![0, 0], 0),
            Position::new(vec![0, 0], 1),
        ));
        editor.run("bold", None).unwrap();

        let undone = editor.undo().unwrap();

        let expected = Selection::new(Position::new(vec![0, 0], 0), Position::new(vec![0, 0], 1));
        assert_eq!(undone.selection, Some(expected.clone()));
        assert_eq!(editor.selection(), Some(expected));
        let italic = editor.run("italic", None).unwrap();
        assert_eq!(italic.content, "<p><em>x</em></p>");
    }

    #[test]
    fn test_paste_inserts_plain_text() {
        let mut editor = editor("<p>ab</p>");
        editor.select(&caret(vec![0, 0], 1));

        let result = editor.on_paste("<b>x</b>").unwrap();

        assert_eq!(result.content, "<p>a&lt;b&gt;x&lt;/b&gt;b</p>");
    }

    #[test]
    fn test_shortcuts() {
        let mut editor = editor("<ul><li>a</li><li>b</li></ul>");
        editor.select(&caret(vec![0, 1, 0], 1));

        let indented = editor.handle_shortcut(KeyChord::tab()).unwrap().unwrap();
        assert_eq!(indented.content, "<ul><li>a<ul><li>b</li></ul></li></ul>");

        let undone = editor.handle_shortcut(KeyChord::ctrl('z')).unwrap().unwrap();
        assert_eq!(undone.content, "<ul><li>a</li><li>b</li></ul>");

        assert!(editor.handle_shortcut(KeyChord::ctrl('z')).is_none());
        assert!(editor.handle_shortcut(KeyChord::ctrl('y')).is_some());
    }

    #[test]
    fn test_tab_outside_list_is_unbound() {
        let mut editor = editor("<p>a</p>");
        editor.select(&caret(vec![0, 0], 1));

        assert!(editor.handle_shortcut(KeyChord::tab()).is_none());
    }

    #[test]
    fn test_status_queries() {
        let mut editor = editor("<p>héllo <em>wörld</em></p>");
        editor.select(&caret(vec![0, 1, 0], 2));

        assert_eq!(editor.text_content(), "héllo wörld");
        assert_eq!(editor.char_count(), 11);
        assert!(editor.is_active(&Command::Italic));
        assert!(!editor.is_active(&Command::Bold));
    }
}
