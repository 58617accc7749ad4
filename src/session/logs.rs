//! Operator log feed

use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Warning,
    Danger,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub id: u64,
    pub time: DateTime<Utc>,
    pub message: String,
    pub kind: LogKind,
}

/// Bounded feed, newest entry first.
#[derive(Debug, Clone)]
pub struct LogFeed {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    next_id: u64,
}

impl LogFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            next_id: 1,
        }
    }

    pub fn push(&mut self, kind: LogKind, message: impl Into<String>) {
        self.push_at(kind, message.into(), Utc::now());
    }

    /// Push unless the newest entry carries the same message and is younger
    /// than `window`. Returns whether an entry was added.
    pub fn push_deduped(&mut self, kind: LogKind, message: impl Into<String>, window: Duration) -> bool {
        let message = message.into();
        let now = Utc::now();
        if let Some(newest) = self.entries.front() {
            if newest.message == message && now - newest.time < window {
                return false;
            }
        }
        self.push_at(kind, message, now);
        true
    }

    /// Drop everything and start over with one entry.
    pub fn replace(&mut self, kind: LogKind, message: impl Into<String>) {
        self.entries.clear();
        self.push(kind, message);
    }

    fn push_at(&mut self, kind: LogKind, message: String, time: DateTime<Utc>) {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push_front(LogEntry {
            id,
            time,
            message,
            kind,
        });
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn newest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

impl Serialize for LogFeed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_first_and_bounded() {
        let mut feed = LogFeed::new(3);
        for i in 0..5 {
            feed.push(LogKind::Info, format!("entry {i}"));
        }
        let messages: Vec<_> = feed.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["entry 4", "entry 3", "entry 2"]);
        assert_eq!(feed.newest().map(|e| e.id), Some(5));
    }

    #[test]
    fn repeated_message_is_collapsed_inside_window() {
        let mut feed = LogFeed::new(10);
        assert!(feed.push_deduped(LogKind::Warning, "High Risk Warning", Duration::seconds(5)));
        assert!(!feed.push_deduped(LogKind::Warning, "High Risk Warning", Duration::seconds(5)));
        assert!(feed.push_deduped(LogKind::Danger, "Failure predicted", Duration::seconds(5)));
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn zero_window_never_collapses() {
        let mut feed = LogFeed::new(10);
        feed.push_deduped(LogKind::Info, "same", Duration::zero());
        feed.push_deduped(LogKind::Info, "same", Duration::zero());
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn replace_keeps_a_single_entry() {
        let mut feed = LogFeed::new(10);
        feed.push(LogKind::Critical, "Turbine_1: Critical failure risk detected");
        feed.replace(LogKind::Info, "Simulation reset");
        assert_eq!(feed.len(), 1);
        let json = serde_json::to_value(&feed).unwrap();
        assert_eq!(json[0]["kind"], "info");
        assert_eq!(json[0]["message"], "Simulation reset");
    }
}
