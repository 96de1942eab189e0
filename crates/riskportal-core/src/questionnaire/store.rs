//! Form value store.
//!
//! Holds the value of every question in the questionnaire at once, not just
//! the section on screen. Navigating between sections never touches values
//! stored for other sections.

use std::collections::HashMap;

use super::answer::Answer;
use super::question::QuestionId;

/// All current answers plus a dirty flag gating Save.
#[derive(Debug, Clone, Default)]
pub struct FormValueStore {
    values: HashMap<QuestionId, Answer>,
    dirty: bool,
    /// Bumped on every user mutation; lets a finished save tell whether
    /// edits arrived while it was in flight.
    revision: u64,
}

impl FormValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a prior save/submit response. Does not mark dirty.
    pub fn load_initial(&mut self, existing: impl IntoIterator<Item = (QuestionId, Answer)>) {
        self.values.extend(existing);
    }

    pub fn get(&self, id: impl Into<QuestionId>) -> Option<&Answer> {
        self.values.get(&id.into())
    }

    /// Overwrite the value for `id` (last write wins) and mark the store dirty.
    pub fn set(&mut self, id: impl Into<QuestionId>, value: Answer) {
        self.values.insert(id.into(), value);
        self.touch();
    }

    /// Remove the value for `id`, returning it. Marks dirty when something was removed.
    pub fn clear(&mut self, id: impl Into<QuestionId>) -> Option<Answer> {
        let removed = self.values.remove(&id.into());
        if removed.is_some() {
            self.touch();
        }
        removed
    }

    /// Snapshot of every stored answer, visible section or not.
    pub fn get_all(&self) -> HashMap<QuestionId, Answer> {
        self.values.clone()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Clear the dirty flag if nothing changed since `revision` was read.
    ///
    /// Returns whether the flag was cleared.
    pub fn mark_clean_at(&mut self, revision: u64) -> bool {
        if self.revision == revision {
            self.dirty = false;
            true
        } else {
            false
        }
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_initial_does_not_mark_dirty() {
        let mut store = FormValueStore::new();
        store.load_initial([
            (QuestionId::from(1), Answer::Text("Acme".into())),
            (QuestionId::from(2), Answer::YesNo(true)),
        ]);
        assert_eq!(store.len(), 2);
        assert!(!store.is_dirty());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn set_overwrites_and_marks_dirty() {
        let mut store = FormValueStore::new();
        store.set(1, Answer::Text("first".into()));
        store.set(1, Answer::Text("second".into()));
        assert_eq!(store.get(1), Some(&Answer::Text("second".into())));
        assert!(store.is_dirty());
        assert_eq!(store.revision(), 2);
    }

    #[test]
    fn clear_of_missing_value_is_not_a_change() {
        let mut store = FormValueStore::new();
        assert!(store.clear(5).is_none());
        assert!(!store.is_dirty());
    }

    #[test]
    fn mark_clean_ignores_stale_revision() {
        let mut store = FormValueStore::new();
        store.set(1, Answer::Choice(4));
        let snapshot = store.revision();
        store.set(2, Answer::Choice(5));
        assert!(!store.mark_clean_at(snapshot));
        assert!(store.is_dirty());
        assert!(store.mark_clean_at(store.revision()));
        assert!(!store.is_dirty());
    }

    #[test]
    fn get_all_includes_every_value() {
        let mut store = FormValueStore::new();
        store.set(1, Answer::YesNo(false));
        store.set("q-40", Answer::Text("hidden".into()));
        let all = store.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all.get(&QuestionId::from("q-40")), Some(&Answer::Text("hidden".into())));
    }
}
