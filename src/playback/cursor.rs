//! Per-entity playback position

use std::collections::HashMap;

use crate::types::EntityId;

/// Index of the record currently shown for each entity.
///
/// An absent entry reads as position 0. Positions only move through
/// [`PlaybackCursor::advance`], which wraps modulo the sequence length, so a
/// stored index is always inside `[0, len)` for the length it was advanced with.
#[derive(Debug, Clone, Default)]
pub struct PlaybackCursor {
    positions: HashMap<EntityId, usize>,
}

impl PlaybackCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, id: &EntityId) -> usize {
        self.positions.get(id).copied().unwrap_or(0)
    }

    /// Move `step` records forward and return the new index.
    ///
    /// `None` for an empty sequence; the cursor is left untouched.
    pub fn advance(&mut self, id: &EntityId, step: usize, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let next = (self.position(id) + step) % len;
        self.positions.insert(id.clone(), next);
        Some(next)
    }

    /// Put an entity back at the first record.
    pub fn rewind(&mut self, id: &EntityId) {
        self.positions.insert(id.clone(), 0);
    }

    pub fn reset(&mut self) {
        self.positions.clear();
    }
}
