//! Per-entity history cache with single-flight loading
//!
//! A slot is either `Loading` (one fetch in flight, identified by a token) or
//! `Ready` (records, never mutated afterwards). Concurrent requests for a
//! loading entity wait on the in-flight fetch instead of issuing another one.
//! A completion whose token no longer matches the slot (cache cleared
//! meanwhile) is discarded.

use std::collections::HashMap;
use tokio::sync::watch;

use crate::types::{EntityId, SensorRecord};

enum Slot {
    Loading {
        token: u64,
        done: watch::Receiver<bool>,
    },
    Ready(Vec<SensorRecord>),
}

/// What a caller of [`HistoryCache::begin_fetch`] must do next.
pub enum FetchAction {
    /// Records are already cached.
    Cached,
    /// Another caller is fetching; wait for the receiver to flip to `true`.
    Wait(watch::Receiver<bool>),
    /// Caller owns the fetch and must hand the ticket back on completion.
    Fetch(FetchTicket),
}

/// Proof of ownership of one in-flight fetch.
///
/// Dropping it without completing releases waiters and lets the next caller retry.
pub struct FetchTicket {
    id: EntityId,
    token: u64,
    done: watch::Sender<bool>,
}

/// Result of handing a ticket back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Records stored (count).
    Stored(usize),
    /// The slot was reset while the fetch was in flight; result dropped.
    Stale,
    /// The fetch failed; the entity stays absent.
    Failed,
}

#[derive(Default)]
pub struct HistoryCache {
    slots: HashMap<EntityId, Slot>,
    next_token: u64,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the fetch for `id`, or learn that it is cached / already loading.
    pub fn begin_fetch(&mut self, id: &EntityId) -> FetchAction {
        match self.slots.get(id) {
            Some(Slot::Ready(_)) => return FetchAction::Cached,
            // A closed channel means the owner went away without completing
            Some(Slot::Loading { done, .. }) if done.has_changed().is_ok() => {
                return FetchAction::Wait(done.clone());
            }
            _ => {}
        }

        self.next_token += 1;
        let token = self.next_token;
        let (tx, rx) = watch::channel(false);
        self.slots
            .insert(id.clone(), Slot::Loading { token, done: rx });

        FetchAction::Fetch(FetchTicket {
            id: id.clone(),
            token,
            done: tx,
        })
    }

    /// Hand back a ticket with the fetch result.
    pub fn complete_fetch<E>(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<SensorRecord>, E>,
    ) -> FetchOutcome {
        let current = matches!(
            self.slots.get(&ticket.id),
            Some(Slot::Loading { token, .. }) if *token == ticket.token
        );

        let outcome = if !current {
            FetchOutcome::Stale
        } else {
            match result {
                Ok(records) => {
                    let n = records.len();
                    self.slots.insert(ticket.id.clone(), Slot::Ready(records));
                    FetchOutcome::Stored(n)
                }
                Err(_) => {
                    self.slots.remove(&ticket.id);
                    FetchOutcome::Failed
                }
            }
        };

        // Waiters re-check the slot after this
        let _ = ticket.done.send(true);
        outcome
    }

    /// Cached records of an entity.
    pub fn get(&self, id: &EntityId) -> Option<&[SensorRecord]> {
        match self.slots.get(id) {
            Some(Slot::Ready(records)) => Some(records),
            _ => None,
        }
    }

    pub fn is_cached(&self, id: &EntityId) -> bool {
        matches!(self.slots.get(id), Some(Slot::Ready(_)))
    }

    pub fn is_loading(&self, id: &EntityId) -> bool {
        matches!(self.slots.get(id), Some(Slot::Loading { .. }))
    }

    /// Number of entities with cached records.
    pub fn cached_count(&self) -> usize {
        self.slots
            .values()
            .filter(|s| matches!(s, Slot::Ready(_)))
            .count()
    }

    /// Drop everything; every in-flight fetch becomes stale.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(risks: &[f64]) -> Vec<SensorRecord> {
        risks.iter().map(|r| SensorRecord::new(*r)).collect()
    }

    fn take_ticket(cache: &mut HistoryCache, id: &EntityId) -> FetchTicket {
        match cache.begin_fetch(id) {
            FetchAction::Fetch(t) => t,
            _ => panic!("expected to own the fetch"),
        }
    }

    #[test]
    fn first_caller_fetches_second_waits() {
        let mut cache = HistoryCache::new();
        let id = EntityId::from(1);
        let ticket = take_ticket(&mut cache, &id);
        assert!(matches!(cache.begin_fetch(&id), FetchAction::Wait(_)));
        assert!(cache.is_loading(&id));

        let out = cache.complete_fetch::<()>(ticket, Ok(records(&[1.0, 2.0])));
        assert_eq!(out, FetchOutcome::Stored(2));
        assert!(matches!(cache.begin_fetch(&id), FetchAction::Cached));
        assert_eq!(cache.get(&id).map(<[SensorRecord]>::len), Some(2));
    }

    #[test]
    fn waiter_is_released_on_completion() {
        let mut cache = HistoryCache::new();
        let id = EntityId::from(1);
        let ticket = take_ticket(&mut cache, &id);
        let rx = match cache.begin_fetch(&id) {
            FetchAction::Wait(rx) => rx,
            _ => panic!("expected wait"),
        };
        cache.complete_fetch::<()>(ticket, Ok(records(&[5.0])));
        assert!(*rx.borrow());
    }

    #[test]
    fn failure_leaves_entity_absent_and_retryable() {
        let mut cache = HistoryCache::new();
        let id = EntityId::from(2);
        let ticket = take_ticket(&mut cache, &id);
        assert_eq!(cache.complete_fetch(ticket, Err("boom")), FetchOutcome::Failed);
        assert!(cache.get(&id).is_none());
        assert!(matches!(cache.begin_fetch(&id), FetchAction::Fetch(_)));
    }

    #[test]
    fn late_result_after_clear_is_stale() {
        let mut cache = HistoryCache::new();
        let id = EntityId::from(3);
        let old = take_ticket(&mut cache, &id);
        cache.clear();
        assert_eq!(
            cache.complete_fetch::<()>(old, Ok(records(&[9.0]))),
            FetchOutcome::Stale
        );
        assert!(!cache.is_cached(&id));
    }

    #[test]
    fn late_result_does_not_clobber_newer_fetch() {
        let mut cache = HistoryCache::new();
        let id = EntityId::from(3);
        let old = take_ticket(&mut cache, &id);
        cache.clear();
        let new = take_ticket(&mut cache, &id);

        assert_eq!(
            cache.complete_fetch::<()>(old, Ok(records(&[1.0]))),
            FetchOutcome::Stale
        );
        assert!(cache.is_loading(&id));
        assert_eq!(
            cache.complete_fetch::<()>(new, Ok(records(&[7.0, 8.0]))),
            FetchOutcome::Stored(2)
        );
    }

    #[test]
    fn abandoned_ticket_lets_next_caller_refetch() {
        let mut cache = HistoryCache::new();
        let id = EntityId::from(4);
        drop(take_ticket(&mut cache, &id));
        assert!(matches!(cache.begin_fetch(&id), FetchAction::Fetch(_)));
    }

    #[test]
    fn empty_history_is_cached() {
        let mut cache = HistoryCache::new();
        let id = EntityId::from(5);
        let ticket = take_ticket(&mut cache, &id);
        assert_eq!(
            cache.complete_fetch::<()>(ticket, Ok(Vec::new())),
            FetchOutcome::Stored(0)
        );
        assert_eq!(cache.get(&id).map(<[SensorRecord]>::len), Some(0));
        assert_eq!(cache.cached_count(), 1);
    }
}
