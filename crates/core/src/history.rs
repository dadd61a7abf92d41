//! Bounded in-memory window of recent submissions for paging through a session

use crate::types::Submission;
use std::collections::VecDeque;

/// Number of submissions kept when no size is configured
pub const DEFAULT_WINDOW_SIZE: usize = 4;

/// Sliding window over the most recent submissions of one session.
///
/// Holds at most `capacity` entries, oldest evicted first. Indices are
/// positions inside the window, `0` being the oldest entry still held.
#[derive(Debug, Clone)]
pub struct SubmissionWindow {
    capacity: usize,
    entries: VecDeque<Submission>,
    selected: Option<usize>,
    next_sequence: u64,
}

impl Default for SubmissionWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl SubmissionWindow {
    /// Create a window; a zero capacity is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            selected: None,
            next_sequence: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &Submission> {
        self.entries.iter()
    }

    /// Record a new exchange under the next sequence number and select it
    pub fn push(&mut self, action: impl Into<String>, narrative: impl Into<String>) -> &Submission {
        let submission = Submission {
            sequence: self.next_sequence,
            action: action.into(),
            narrative: narrative.into(),
            created_at: None,
        };
        self.record(submission)
    }

    /// Record a submission that already carries a sequence number and select it
    pub fn record(&mut self, submission: Submission) -> &Submission {
        self.next_sequence = self.next_sequence.max(submission.sequence.saturating_add(1));
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(submission);
        let latest = self.entries.len() - 1;
        self.selected = Some(latest);
        &self.entries[latest]
    }

    /// Replace the contents with the newest entries of a fetched history
    pub fn load(&mut self, mut submissions: Vec<Submission>) {
        submissions.sort_by_key(|s| s.sequence);
        self.entries.clear();
        self.selected = None;
        let skip = submissions.len().saturating_sub(self.capacity);
        for submission in submissions.into_iter().skip(skip) {
            self.record(submission);
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected(&self) -> Option<&Submission> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    pub fn latest(&self) -> Option<&Submission> {
        self.entries.back()
    }

    /// Select the highest index currently held
    pub fn go_to_latest(&mut self) -> Option<usize> {
        self.selected = self.entries.len().checked_sub(1);
        self.selected
    }

    /// Select an index; out-of-range indices leave the selection unchanged
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    /// Move one entry toward the oldest
    pub fn previous(&mut self) -> bool {
        match self.selected {
            Some(i) if i > 0 => self.select(i - 1),
            _ => false,
        }
    }

    /// Move one entry toward the newest
    pub fn next(&mut self) -> bool {
        match self.selected {
            Some(i) => self.select(i + 1),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(capacity: usize, count: usize) -> SubmissionWindow {
        let mut window = SubmissionWindow::new(capacity);
        for i in 1..=count {
            window.push(format!("action {i}"), format!("narrative {i}"));
        }
        window
    }

    #[test]
    fn test_window_never_exceeds_capacity() {
        let window = filled(4, 9);
        assert_eq!(window.len(), 4);
        let sequences: Vec<u64> = window.entries().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![6, 7, 8, 9]);
    }

    #[test]
    fn test_go_to_latest_selects_highest_index() {
        let mut window = filled(4, 6);
        assert!(window.select(0));
        assert_eq!(window.selected().unwrap().sequence, 3);

        assert_eq!(window.go_to_latest(), Some(3));
        assert_eq!(window.selected().unwrap().sequence, 6);

        let mut partial = filled(4, 2);
        partial.select(0);
        assert_eq!(partial.go_to_latest(), Some(1));
    }

    #[test]
    fn test_navigation_stops_at_bounds() {
        let mut window = filled(3, 3);
        assert!(!window.next());
        assert!(window.previous());
        assert!(window.previous());
        assert!(!window.previous());
        assert_eq!(window.selected_index(), Some(0));
        assert!(!window.select(3));
        assert_eq!(window.selected_index(), Some(0));
    }

    #[test]
    fn test_empty_window() {
        let mut window = SubmissionWindow::default();
        assert_eq!(window.capacity(), DEFAULT_WINDOW_SIZE);
        assert_eq!(window.go_to_latest(), None);
        assert!(window.selected().is_none());
        assert!(!window.next());
    }

    #[test]
    fn test_load_keeps_newest_sorted() {
        let mut window = SubmissionWindow::new(2);
        let history = [5u64, 2, 9, 7]
            .into_iter()
            .map(|sequence| Submission {
                sequence,
                action: format!("a{sequence}"),
                narrative: format!("n{sequence}"),
                created_at: None,
            })
            .collect();

        window.load(history);

        let sequences: Vec<u64> = window.entries().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![7, 9]);
        assert_eq!(window.selected().unwrap().sequence, 9);
        assert_eq!(window.push("next", "more").sequence, 10);
    }

    #[test]
    fn test_load_at_max_sequence_does_not_overflow() {
        let mut window = SubmissionWindow::new(2);
        window.load(vec![Submission {
            sequence: u64::MAX,
            action: "last".to_string(),
            narrative: "end".to_string(),
            created_at: None,
        }]);
        assert_eq!(window.latest().unwrap().sequence, u64::MAX);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let window = filled(0, 3);
        assert_eq!(window.capacity(), 1);
        assert_eq!(window.latest().unwrap().sequence, 3);
    }
}
