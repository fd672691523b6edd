//! Keyed debouncer
//!
//! Each key holds at most one pending deadline. Scheduling a key again replaces
//! its deadline, so a burst of edits fires once after the quiet period.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer<K> {
    delay: Duration,
    pending: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> Debouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
        }
    }

    /// (Re)start the quiet period for `key`
    pub fn schedule(&mut self, key: K, now: Instant) {
        self.pending.insert(key, now + self.delay);
    }

    pub fn cancel(&mut self, key: &K) {
        self.pending.remove(key);
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Remove and return every key whose quiet period has elapsed
    pub fn due(&mut self, now: Instant) -> Vec<K> {
        let due: Vec<K> = self
            .pending
            .iter()
            .filter(|&(_, deadline)| *deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &due {
            self.pending.remove(key);
        }
        due
    }

    /// Remove and return every pending key regardless of deadline
    pub fn flush(&mut self) -> Vec<K> {
        self.pending.drain().map(|(key, _)| key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn test_nothing_due_before_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule("notes", start);

        assert!(debouncer.due(start + Duration::from_millis(299)).is_empty());
        assert!(debouncer.is_pending(&"notes"));
    }

    #[test]
    fn test_fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule("notes", start);

        assert_eq!(debouncer.due(start + DELAY), vec!["notes"]);
        assert!(debouncer.due(start + DELAY * 2).is_empty());
        assert!(!debouncer.has_pending());
    }

    #[test]
    fn test_burst_coalesces_and_resets_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        for ms in [0, 100, 200, 250] {
            debouncer.schedule("notes", start + Duration::from_millis(ms));
        }

        // first deadline would have been 300ms, last keystroke pushed it to 550ms
        assert!(debouncer.due(start + Duration::from_millis(400)).is_empty());
        assert_eq!(
            debouncer.due(start + Duration::from_millis(550)),
            vec!["notes"]
        );
    }

    #[test]
    fn test_keys_are_independent() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule("a", start);
        debouncer.schedule("b", start + Duration::from_millis(200));

        assert_eq!(debouncer.due(start + DELAY), vec!["a"]);
        assert!(debouncer.is_pending(&"b"));
    }

    #[test]
    fn test_cancel_and_flush() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.schedule("a", start);
        debouncer.schedule("b", start);
        debouncer.cancel(&"a");

        assert_eq!(debouncer.flush(), vec!["b"]);
        assert!(!debouncer.has_pending());
    }
}
