//! Bounded trend buffers feeding the risk charts

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, VecDeque};

/// Fixed-capacity FIFO of chart points. Pushing onto a full buffer evicts
/// the oldest point.
#[derive(Debug, Clone)]
pub struct DisplayHistoryBuffer<T> {
    points: VecDeque<T>,
    capacity: usize,
}

impl<T> DisplayHistoryBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, point: T) {
        while self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&T> {
        self.points.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.points.iter()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

impl<T: Serialize> Serialize for DisplayHistoryBuffer<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.points.iter())
    }
}

/// One single-entity chart point: displayed risk plus the record's measurements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SinglePoint {
    pub time: DateTime<Utc>,
    pub risk: f64,
    pub values: BTreeMap<String, f64>,
}

/// One multi-entity chart point: displayed risk per entity label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiPoint {
    pub time: DateTime<Utc>,
    pub risks: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let mut buf = DisplayHistoryBuffer::new(50);
        for i in 1..=51 {
            buf.push(i);
        }
        assert_eq!(buf.len(), 50);
        assert_eq!(buf.iter().next(), Some(&2));
        assert_eq!(buf.latest(), Some(&51));
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut buf = DisplayHistoryBuffer::new(3);
        for i in 0..100 {
            buf.push(i);
            assert!(buf.len() <= 3);
        }
        assert_eq!(buf.iter().copied().collect::<Vec<_>>(), vec![97, 98, 99]);
    }

    #[test]
    fn serializes_as_plain_array() {
        let mut buf = DisplayHistoryBuffer::new(4);
        buf.push(1.5);
        buf.push(2.5);
        assert_eq!(serde_json::to_value(&buf).unwrap(), serde_json::json!([1.5, 2.5]));
        buf.clear();
        assert!(buf.is_empty());
    }
}
