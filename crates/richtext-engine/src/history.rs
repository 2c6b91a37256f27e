//! Undo/redo snapshots and the typing debounce.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::document::Selection;

/// A serialized document together with the selection that went with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub content: String,
    pub selection: Option<Selection>,
}

impl HistoryEntry {
    pub fn new(content: impl Into<String>, selection: Option<Selection>) -> Self {
        Self {
            content: content.into(),
            selection,
        }
    }
}

/// Linear undo/redo stacks. The bottom of `undo` is the initial document
/// and is never popped.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    undo: Vec<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    limit: Option<usize>,
}

impl HistoryStore {
    pub fn new(initial: HistoryEntry) -> Self {
        Self {
            undo: vec![initial],
            redo: Vec::new(),
            limit: None,
        }
    }

    /// Keep at most `limit` undo entries (never fewer than one).
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self.enforce_limit();
        self
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.undo.last()
    }

    /// Push `entry` unless its content matches the current entry. A push
    /// discards the redo stack.
    pub fn commit_if_changed(&mut self, entry: HistoryEntry) -> bool {
        if self.current().is_some_and(|current| current.content == entry.content) {
            return false;
        }
        self.undo.push(entry);
        self.redo.clear();
        self.enforce_limit();
        log::debug!("Committed history entry (undo depth {})", self.undo.len());
        true
    }

    /// Step back, returning the entry that is now current.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        if self.undo.len() <= 1 {
            return None;
        }
        let top = self.undo.pop()?;
        self.redo.push(top);
        log::debug!("Undo (undo depth {}, redo depth {})", self.undo.len(), self.redo.len());
        self.undo.last().cloned()
    }

    /// Step forward again, returning the re-applied entry.
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        let entry = self.redo.pop()?;
        self.undo.push(entry.clone());
        self.enforce_limit();
        log::debug!("Redo (undo depth {}, redo depth {})", self.undo.len(), self.redo.len());
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    fn enforce_limit(&mut self) {
        if let Some(limit) = self.limit {
            let excess = self.undo.len().saturating_sub(limit.max(1));
            self.undo.drain(..excess);
        }
    }
}

/// Deadline tracker that batches bursts of typing into one history entry.
///
/// Time is passed in by the caller, so the debouncer never sleeps or
/// spawns anything.
#[derive(Debug, Clone)]
pub struct InputDebouncer {
    interval: Duration,
    deadline: Option<Instant>,
    suspended: bool,
}

impl InputDebouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
            suspended: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Restart the quiet period from `now`. Ignored while suspended.
    pub fn schedule(&mut self, now: Instant) {
        if self.suspended {
            log::trace!("Debounce suspended, ignoring input");
            return;
        }
        self.deadline = Some(now + self.interval);
        log::trace!("Debounced commit scheduled in {:?}", self.interval);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True once per scheduled deadline, when `now` has reached it.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn suspend(&mut self) {
        self.suspended = true;
        self.deadline = None;
    }

    pub fn resume(&mut self) {
        self.suspended = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

/// Scope of one structural edit. The debouncer stays suspended for as long
/// as the guard lives, and resumes when it drops.
pub(crate) struct StructuralEdit<'a> {
    debouncer: &'a mut InputDebouncer,
}

impl<'a> StructuralEdit<'a> {
    pub(crate) fn begin(debouncer: &'a mut InputDebouncer) -> Self {
        debouncer.suspend();
        Self { debouncer }
    }
}

impl Drop for StructuralEdit<'_> {
    fn drop(&mut self) {
        self.debouncer.resume();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(content: &str) -> HistoryEntry {
        HistoryEntry::new(content, None)
    }

    fn contents(entry: Option<HistoryEntry>) -> Option<String> {
        entry.map(|e| e.content)
    }

    // ============ HistoryStore tests ============

    #[test]
    fn test_commit_skips_unchanged_content() {
        let mut history = HistoryStore::new(entry("<p></p>"));

        assert!(!history.commit_if_changed(entry("<p></p>")));
        assert!(history.commit_if_changed(entry("<p>a</p>")));
        assert_eq!(history.undo_depth(), 2);
    }

    #[test]
    fn test_undo_floor() {
        let mut history = HistoryStore::new(entry("<p></p>"));

        assert_eq!(history.undo(), None);
        assert!(!history.can_undo());
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = HistoryStore::new(entry("a"));
        history.commit_if_changed(entry("b"));
        history.commit_if_changed(entry("c"));

        assert_eq!(contents(history.undo()), Some("b".into()));
        assert_eq!(contents(history.undo()), Some("a".into()));
        assert_eq!(contents(history.undo()), None);
        assert_eq!(contents(history.redo()), Some("b".into()));
        assert_eq!(contents(history.redo()), Some("c".into()));
        assert_eq!(contents(history.redo()), None);
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut history = HistoryStore::new(entry("a"));
        history.commit_if_changed(entry("b"));
        history.undo();
        assert!(history.can_redo());

        history.commit_if_changed(entry("c"));

        assert!(!history.can_redo());
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = HistoryStore::new(entry("a")).with_limit(Some(2));
        history.commit_if_changed(entry("b"));
        history.commit_if_changed(entry("c"));

        assert_eq!(history.undo_depth(), 2);
        assert_eq!(contents(history.undo()), Some("b".into()));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn test_zero_limit_keeps_one_entry() {
        let mut history = HistoryStore::new(entry("a")).with_limit(Some(0));
        history.commit_if_changed(entry("b"));

        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.current().map(|e| e.content.as_str()), Some("b"));
    }

    // ============ InputDebouncer tests ============

    #[test]
    fn test_debounce_fires_after_interval() {
        let mut debouncer = InputDebouncer::new(Duration::from_millis(500));
        let start = Instant::now();

        debouncer.schedule(start);

        assert!(!debouncer.fire_if_due(start + Duration::from_millis(499)));
        assert!(debouncer.fire_if_due(start + Duration::from_millis(500)));
        assert!(!debouncer.fire_if_due(start + Duration::from_millis(900)));
    }

    #[test]
    fn test_schedule_restarts_deadline() {
        let mut debouncer = InputDebouncer::new(Duration::from_millis(500));
        let start = Instant::now();

        debouncer.schedule(start);
        debouncer.schedule(start + Duration::from_millis(300));

        assert!(!debouncer.fire_if_due(start + Duration::from_millis(600)));
        assert!(debouncer.fire_if_due(start + Duration::from_millis(800)));
    }

    #[test]
    fn test_structural_edit_suspends_until_dropped() {
        let mut debouncer = InputDebouncer::new(Duration::from_millis(500));
        let start = Instant::now();
        debouncer.schedule(start);

        {
            let edit = StructuralEdit::begin(&mut debouncer);
            assert!(edit.debouncer.is_suspended());
            edit.debouncer.schedule(start);
            assert!(!edit.debouncer.is_pending());
        }

        assert!(!debouncer.is_suspended());
        assert!(!debouncer.is_pending());
        debouncer.schedule(start);
        assert!(debouncer.is_pending());
    }
}
