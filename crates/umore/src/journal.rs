//! The year grid and its mutation rules
//!
//! A [`Journal`] owns the 365 day moods, the selected-day cursor and the
//! dark mode flag. Days after today are read-only. Every mutation is written
//! through to the [`Persistence`] it was opened with.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

use crate::store::{KeyValueStore, Persistence};
use crate::types::{Mood, DAYS_IN_GRID};

pub const CLEAR_ALL_PROMPT: &str = "Are you sure you want to clear all emotions?";

/// Zero-based day-of-year index for a date.
///
/// The grid has 365 squares, so the last day of a leap year shares the
/// final square with December 30th.
pub fn today_index(date: NaiveDate) -> usize {
    (date.ordinal0() as usize).min(DAYS_IN_GRID - 1)
}

/// Yes/no question asked before destructive operations
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Mood count for one palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoodCount {
    pub mood: Mood,
    pub count: usize,
}

/// Read-only copy of the journal state, as consumed by renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalView {
    pub moods: Vec<Mood>,
    pub selected: Option<usize>,
    pub today_index: usize,
    pub dark_mode: bool,
}

impl JournalView {
    pub fn is_disabled(&self, index: usize) -> bool {
        index > self.today_index
    }

    pub fn tally(&self) -> Vec<MoodCount> {
        tally(&self.moods)
    }
}

/// A year of moods plus the UI cursor, backed by a key-value store
#[derive(Debug)]
pub struct Journal<S> {
    moods: Vec<Mood>,
    selected: Option<usize>,
    dark_mode: bool,
    today_index: usize,
    persistence: Persistence<S>,
}

impl<S: KeyValueStore> Journal<S> {
    /// Load the journal from `store`, falling back to defaults for anything missing.
    ///
    /// `today` decides which square is editable up to and which one shows the
    /// "today" placeholder.
    pub fn open(store: S, today: NaiveDate) -> Self {
        let persistence = Persistence::new(store);
        let snapshot = persistence.load();
        let today_index = today_index(today);

        let moods = match snapshot.moods {
            Some(mut moods) => {
                normalize_today(&mut moods, today_index);
                moods
            }
            None => default_grid(today_index),
        };

        let journal = Self {
            moods,
            selected: None,
            dark_mode: snapshot.dark_mode.unwrap_or(false),
            today_index,
            persistence,
        };

        info!(
            today = %today,
            today_index = journal.today_index,
            recorded = journal.recorded_days(),
            dark_mode = journal.dark_mode,
            "Journal opened"
        );
        journal
    }

    pub fn moods(&self) -> &[Mood] {
        &self.moods
    }

    pub fn mood(&self, index: usize) -> Option<Mood> {
        self.moods.get(index).copied()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn today_index(&self) -> usize {
        self.today_index
    }

    #[cfg(test)]
    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Days after today cannot be edited
    pub fn is_disabled(&self, index: usize) -> bool {
        index > self.today_index
    }

    /// Number of days with a palette mood
    pub fn recorded_days(&self) -> usize {
        self.moods.iter().filter(|m| !m.is_sentinel()).count()
    }

    pub fn tally(&self) -> Vec<MoodCount> {
        tally(&self.moods)
    }

    pub fn view(&self) -> JournalView {
        JournalView {
            moods: self.moods().to_vec(),
            selected: self.selected,
            today_index: self.today_index,
            dark_mode: self.dark_mode,
        }
    }

    /// Toggle the cursor on `index`. Out-of-grid indices are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= DAYS_IN_GRID {
            debug!(index, "Ignoring selection outside the grid");
            return false;
        }

        self.selected = if self.selected == Some(index) {
            None
        } else {
            Some(index)
        };
        true
    }

    pub fn deselect(&mut self) -> bool {
        self.selected.take().is_some()
    }

    /// Record `mood` on the selected day, if that day is editable
    pub fn set_mood(&mut self, mood: Mood) -> bool {
        if mood.is_sentinel() {
            debug!(mood = %mood, "Ignoring placeholder mood");
            return false;
        }
        let Some(index) = self.editable_selection() else {
            return false;
        };

        self.moods[index] = mood;
        self.persistence.save_moods(&self.moods);
        debug!(index, mood = %mood, "Mood recorded");
        true
    }

    /// Reset the selected day to its placeholder, if that day is editable
    pub fn remove_mood(&mut self) -> bool {
        let Some(index) = self.editable_selection() else {
            return false;
        };

        self.moods[index] = Mood::default_for(index, self.today_index);
        self.persistence.save_moods(&self.moods);
        debug!(index, "Mood removed");
        true
    }

    /// Reset every day and drop the stored grid. Callers confirm first.
    pub fn clear_all(&mut self) {
        self.moods = default_grid(self.today_index);
        self.persistence.clear_moods();
        info!("All moods cleared");
    }

    /// Ask `confirm` and clear only on a yes; returns whether the grid was cleared
    pub fn clear_all_confirmed(&mut self, confirm: &mut impl Confirm) -> bool {
        if !confirm.confirm(CLEAR_ALL_PROMPT) {
            debug!("Clear all declined");
            return false;
        }
        self.clear_all();
        true
    }

    /// Flip dark mode and persist it; returns the new value
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.persistence.save_dark_mode(self.dark_mode);
        debug!(dark_mode = self.dark_mode, "Dark mode toggled");
        self.dark_mode
    }

    /// Move "today" for sessions that outlive a day
    pub fn set_today(&mut self, today: NaiveDate) {
        let index = today_index(today);
        if index == self.today_index {
            return;
        }

        info!(from = self.today_index, to = index, "Day changed");
        self.today_index = index;
        if normalize_today(&mut self.moods, index) {
            self.persistence.save_moods(&self.moods);
        }
    }

    fn editable_selection(&self) -> Option<usize> {
        match self.selected {
            Some(index) if !self.is_disabled(index) => Some(index),
            Some(index) => {
                debug!(index, today_index = self.today_index, "Ignoring edit of a future day");
                None
            }
            None => None,
        }
    }
}

/// A fresh grid: all unset, with today's placeholder
pub fn default_grid(today_index: usize) -> Vec<Mood> {
    (0..DAYS_IN_GRID)
        .map(|i| Mood::default_for(i, today_index))
        .collect()
}

/// Move the "today" placeholder to `today_index`, leaving recorded moods alone.
/// Returns whether anything changed.
fn normalize_today(moods: &mut [Mood], today_index: usize) -> bool {
    let mut changed = false;
    for (i, mood) in moods.iter_mut().enumerate() {
        if mood.is_sentinel() {
            let expected = Mood::default_for(i, today_index);
            if *mood != expected {
                *mood = expected;
                changed = true;
            }
        }
    }
    changed
}

fn tally(moods: &[Mood]) -> Vec<MoodCount> {
    Mood::PALETTE
        .iter()
        .map(|&mood| MoodCount {
            mood,
            count: moods.iter().filter(|&&m| m == mood).count(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, DARK_MODE_KEY, GRID_KEY};

    /// 2025-02-12 is day-of-year 43, index 42
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 12).unwrap()
    }

    const TODAY: usize = 42;

    fn fresh_journal() -> Journal<MemoryStore> {
        Journal::open(MemoryStore::new(), today())
    }

    fn stored_grid(journal: &Journal<MemoryStore>) -> Option<String> {
        journal.persistence().store().get(GRID_KEY).unwrap()
    }

    // ========== today_index tests ==========

    #[test]
    fn test_today_index_first_and_last_day() {
        assert_eq!(today_index(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()), 0);
        assert_eq!(today_index(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()), 364);
        assert_eq!(today_index(today()), TODAY);
    }

    #[test]
    fn test_today_index_leap_year_clamps() {
        assert_eq!(today_index(NaiveDate::from_ymd_opt(2024, 12, 30).unwrap()), 364);
        assert_eq!(today_index(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()), 364);
        assert_eq!(today_index(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()), 60);
    }

    // ========== defaults ==========

    #[test]
    fn test_defaults_only_today_is_placeholder() {
        let journal = fresh_journal();

        assert_eq!(journal.moods().len(), DAYS_IN_GRID);
        for (i, mood) in journal.moods().iter().enumerate() {
            if i == TODAY {
                assert_eq!(*mood, Mood::TodayUnset);
            } else {
                assert_eq!(*mood, Mood::Unset);
            }
        }
        assert_eq!(journal.selected(), None);
        assert!(!journal.dark_mode());
        assert_eq!(journal.recorded_days(), 0);
    }

    #[test]
    fn test_open_does_not_write() {
        let journal = fresh_journal();
        assert!(journal.persistence().store().is_empty());
    }

    // ========== select ==========

    #[test]
    fn test_select_twice_clears_selection() {
        let mut journal = fresh_journal();

        assert!(journal.select(10));
        assert_eq!(journal.selected(), Some(10));
        assert!(journal.select(10));
        assert_eq!(journal.selected(), None);
    }

    #[test]
    fn test_select_other_index_moves_cursor() {
        let mut journal = fresh_journal();
        journal.select(3);
        journal.select(7);
        assert_eq!(journal.selected(), Some(7));
    }

    #[test]
    fn test_select_future_day_is_allowed() {
        let mut journal = fresh_journal();
        assert!(journal.select(300));
        assert_eq!(journal.selected(), Some(300));
    }

    #[test]
    fn test_select_out_of_range_ignored() {
        let mut journal = fresh_journal();
        journal.select(5);
        assert!(!journal.select(DAYS_IN_GRID));
        assert_eq!(journal.selected(), Some(5));
    }

    #[test]
    fn test_deselect() {
        let mut journal = fresh_journal();
        assert!(!journal.deselect());
        journal.select(1);
        assert!(journal.deselect());
        assert_eq!(journal.selected(), None);
    }

    // ========== is_disabled ==========

    #[test]
    fn test_is_disabled_only_after_today() {
        let journal = fresh_journal();
        for i in 0..DAYS_IN_GRID {
            assert_eq!(journal.is_disabled(i), i > TODAY, "index {}", i);
        }
    }

    // ========== set_mood ==========

    #[test]
    fn test_set_mood_on_past_and_today() {
        let mut journal = fresh_journal();

        for index in [0, 20, TODAY] {
            journal.select(index);
            assert!(journal.set_mood(Mood::Relaxed));
            assert_eq!(journal.mood(index), Some(Mood::Relaxed));
            journal.deselect();
        }
        assert_eq!(journal.recorded_days(), 3);
    }

    #[test]
    fn test_set_mood_future_day_is_noop() {
        let mut journal = fresh_journal();
        let before = journal.moods().to_vec();

        for index in [TODAY + 1, 200, DAYS_IN_GRID - 1] {
            journal.select(index);
            assert!(!journal.set_mood(Mood::Happy));
            journal.deselect();
        }

        assert_eq!(journal.moods(), before.as_slice());
        assert!(stored_grid(&journal).is_none());
    }

    #[test]
    fn test_set_mood_without_selection_is_noop() {
        let mut journal = fresh_journal();
        assert!(!journal.set_mood(Mood::Happy));
        assert_eq!(journal.recorded_days(), 0);
    }

    #[test]
    fn test_set_mood_rejects_placeholders() {
        let mut journal = fresh_journal();
        journal.select(5);
        journal.set_mood(Mood::Sad);

        assert!(!journal.set_mood(Mood::TodayUnset));
        assert!(!journal.set_mood(Mood::Unset));
        assert_eq!(journal.mood(5), Some(Mood::Sad));
    }

    #[test]
    fn test_set_mood_persists() {
        let mut journal = fresh_journal();
        journal.select(7);
        journal.set_mood(Mood::Anxious);

        let raw = stored_grid(&journal).unwrap();
        let stored: Vec<Mood> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored[7], Mood::Anxious);
        assert_eq!(stored[TODAY], Mood::TodayUnset);
    }

    // ========== remove_mood ==========

    #[test]
    fn test_remove_mood_past_day_resets_to_unset() {
        let mut journal = fresh_journal();
        journal.select(3);
        journal.set_mood(Mood::Sick);

        assert!(journal.remove_mood());
        assert_eq!(journal.mood(3), Some(Mood::Unset));
    }

    #[test]
    fn test_remove_mood_today_resets_to_placeholder() {
        let mut journal = fresh_journal();
        journal.select(TODAY);
        journal.set_mood(Mood::Amazing);

        assert!(journal.remove_mood());
        assert_eq!(journal.mood(TODAY), Some(Mood::TodayUnset));
    }

    #[test]
    fn test_remove_mood_future_day_is_noop() {
        let mut journal = fresh_journal();
        journal.select(TODAY + 1);

        assert!(!journal.remove_mood());
        assert_eq!(journal.mood(TODAY + 1), Some(Mood::Unset));
        assert!(stored_grid(&journal).is_none());
    }

    #[test]
    fn test_remove_mood_without_selection_is_noop() {
        let mut journal = fresh_journal();
        assert!(!journal.remove_mood());
    }

    // ========== clear_all ==========

    #[test]
    fn test_clear_all_resets_grid_and_removes_key() {
        let mut journal = fresh_journal();
        for index in [0, 10, TODAY] {
            journal.select(index);
            journal.set_mood(Mood::Happy);
            journal.deselect();
        }
        journal.toggle_dark_mode();
        assert!(stored_grid(&journal).is_some());

        journal.clear_all();

        assert_eq!(journal.moods(), default_grid(TODAY).as_slice());
        assert!(stored_grid(&journal).is_none());
        assert!(journal.dark_mode());
        assert_eq!(
            journal.persistence().store().get(DARK_MODE_KEY).unwrap().as_deref(),
            Some("true")
        );
    }

    #[test]
    fn test_clear_all_confirmed_yes() {
        let mut journal = fresh_journal();
        journal.select(1);
        journal.set_mood(Mood::Sad);

        let mut asked = Vec::new();
        let mut confirm = |prompt: &str| {
            asked.push(prompt.to_string());
            true
        };
        assert!(journal.clear_all_confirmed(&mut confirm));

        assert_eq!(asked, vec![CLEAR_ALL_PROMPT.to_string()]);
        assert_eq!(journal.mood(1), Some(Mood::Unset));
    }

    #[test]
    fn test_clear_all_confirmed_no_keeps_state() {
        let mut journal = fresh_journal();
        journal.select(1);
        journal.set_mood(Mood::Sad);

        assert!(!journal.clear_all_confirmed(&mut |_: &str| false));
        assert_eq!(journal.mood(1), Some(Mood::Sad));
        assert!(stored_grid(&journal).is_some());
    }

    // ========== dark mode ==========

    #[test]
    fn test_toggle_dark_mode_twice_restores() {
        let mut journal = fresh_journal();
        let original = journal.dark_mode();

        assert_eq!(journal.toggle_dark_mode(), !original);
        assert_eq!(journal.toggle_dark_mode(), original);
        assert_eq!(
            journal.persistence().store().get(DARK_MODE_KEY).unwrap().as_deref(),
            Some("false")
        );
    }

    // ========== reload ==========

    #[test]
    fn test_reopen_restores_state() {
        let mut journal = fresh_journal();
        journal.select(15);
        journal.set_mood(Mood::Energetic);
        journal.toggle_dark_mode();

        let store = journal.persistence.into_store();
        let reopened = Journal::open(store, today());

        assert_eq!(reopened.mood(15), Some(Mood::Energetic));
        assert!(reopened.dark_mode());
        assert_eq!(reopened.selected(), None);
    }

    #[test]
    fn test_reopen_next_day_moves_placeholder() {
        let mut journal = fresh_journal();
        journal.select(5);
        journal.set_mood(Mood::Happy);

        let store = journal.persistence.into_store();
        let tomorrow = today().succ_opt().unwrap();
        let reopened = Journal::open(store, tomorrow);

        assert_eq!(reopened.mood(TODAY), Some(Mood::Unset));
        assert_eq!(reopened.mood(TODAY + 1), Some(Mood::TodayUnset));
        assert_eq!(reopened.mood(5), Some(Mood::Happy));
    }

    #[test]
    fn test_open_with_malformed_grid_uses_defaults() {
        let mut store = MemoryStore::new();
        store.set(GRID_KEY, r#"["yellow"]"#).unwrap();
        store.set(DARK_MODE_KEY, "true").unwrap();

        let journal = Journal::open(store, today());
        assert_eq!(journal.moods(), default_grid(TODAY).as_slice());
        assert!(journal.dark_mode());
    }

    // ========== set_today ==========

    #[test]
    fn test_set_today_unlocks_next_day() {
        let mut journal = fresh_journal();
        journal.select(TODAY + 1);
        assert!(!journal.set_mood(Mood::Happy));

        journal.set_today(today().succ_opt().unwrap());

        assert_eq!(journal.today_index(), TODAY + 1);
        assert_eq!(journal.mood(TODAY), Some(Mood::Unset));
        assert!(journal.set_mood(Mood::Happy));
        assert_eq!(journal.mood(TODAY + 1), Some(Mood::Happy));
    }

    #[test]
    fn test_set_today_same_day_no_write() {
        let mut journal = fresh_journal();
        journal.set_today(today());
        assert!(stored_grid(&journal).is_none());
    }

    #[test]
    fn test_set_today_keeps_recorded_today() {
        let mut journal = fresh_journal();
        journal.select(TODAY);
        journal.set_mood(Mood::Sick);

        journal.set_today(today().succ_opt().unwrap());
        assert_eq!(journal.mood(TODAY), Some(Mood::Sick));
    }

    // ========== tally / view ==========

    #[test]
    fn test_tally_counts_palette_moods() {
        let mut journal = fresh_journal();
        for (index, mood) in [(0, Mood::Happy), (1, Mood::Happy), (2, Mood::Sad)] {
            journal.select(index);
            journal.set_mood(mood);
        }

        let tally = journal.tally();
        assert_eq!(tally.len(), Mood::PALETTE.len());
        assert_eq!(tally[0], MoodCount { mood: Mood::Happy, count: 2 });
        assert_eq!(tally[1], MoodCount { mood: Mood::Sad, count: 1 });
        assert!(tally[2..].iter().all(|c| c.count == 0));
    }

    #[test]
    fn test_view_mirrors_journal() {
        let mut journal = fresh_journal();
        journal.select(9);
        let view = journal.view();

        assert_eq!(view.selected, Some(9));
        assert_eq!(view.today_index, TODAY);
        assert!(view.is_disabled(TODAY + 1));
        assert!(!view.is_disabled(TODAY));
        assert_eq!(view.moods, journal.moods());
    }

    // ========== scenario ==========

    #[test]
    fn test_record_today_scenario() {
        let mut journal = fresh_journal();
        let original_dark_mode = journal.dark_mode();

        journal.select(TODAY);
        journal.set_mood("yellow".parse().unwrap());

        let mut expected = vec![Mood::Unset; DAYS_IN_GRID];
        expected[TODAY] = Mood::Happy;
        assert_eq!(journal.moods(), expected.as_slice());

        journal.toggle_dark_mode();
        journal.toggle_dark_mode();
        assert_eq!(journal.dark_mode(), original_dark_mode);
    }
}
