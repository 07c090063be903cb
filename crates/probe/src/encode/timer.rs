//! TimerTable — label-keyed wall-clock timers for `time`/`timeEnd`.

use std::collections::HashMap;
use std::time::Instant;

pub const DEFAULT_LABEL: &str = "default";

/// Running timers keyed by label. Unknown labels produce no reading,
/// which means no event is emitted downstream.
#[derive(Default)]
pub struct TimerTable {
    running: HashMap<String, Instant>,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the timer for a label, returning the resolved label.
    pub fn start(&mut self, label: Option<&str>) -> String {
        let label = label.unwrap_or(DEFAULT_LABEL).to_string();
        self.running.insert(label.clone(), Instant::now());
        label
    }

    /// Elapsed milliseconds for a running timer, without stopping it.
    pub fn elapsed(&self, label: Option<&str>) -> Option<(String, f64)> {
        let label = label.unwrap_or(DEFAULT_LABEL);
        self.running
            .get(label)
            .map(|started| (label.to_string(), millis_since(*started)))
    }

    /// Stop a running timer and return its final reading.
    pub fn finish(&mut self, label: Option<&str>) -> Option<(String, f64)> {
        let label = label.unwrap_or(DEFAULT_LABEL);
        self.running
            .remove(label)
            .map(|started| (label.to_string(), millis_since(started)))
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}

fn millis_since(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_label_defaults() {
        let mut timers = TimerTable::new();
        timers.start(None);
        let (label, _) = timers.elapsed(None).unwrap();
        assert_eq!(label, DEFAULT_LABEL);
    }

    #[test]
    fn unknown_label_yields_no_reading() {
        let mut timers = TimerTable::new();
        assert!(timers.elapsed(Some("missing")).is_none());
        assert!(timers.finish(Some("missing")).is_none());
    }

    #[test]
    fn finish_removes_the_timer() {
        let mut timers = TimerTable::new();
        timers.start(Some("query"));
        assert!(timers.finish(Some("query")).is_some());
        assert!(timers.finish(Some("query")).is_none());
        assert!(timers.is_empty());
    }

    #[test]
    fn elapsed_keeps_the_timer_running() {
        let mut timers = TimerTable::new();
        timers.start(Some("batch"));
        assert!(timers.elapsed(Some("batch")).is_some());
        assert!(timers.elapsed(Some("batch")).is_some());
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn labels_are_independent() {
        let mut timers = TimerTable::new();
        timers.start(Some("a"));
        timers.start(Some("b"));
        timers.finish(Some("a"));
        assert!(timers.elapsed(Some("b")).is_some());
        assert!(timers.elapsed(Some("a")).is_none());
    }
}
