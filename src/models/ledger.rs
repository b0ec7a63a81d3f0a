//! Append-only event ledger for a single match.

use crate::models::clock::Clock;
use crate::models::error::MatchError;
use crate::models::event::{EventId, MatchEvent, Period, ValidEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered log of events. Insertion order is the authoritative order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    events: Vec<MatchEvent>,
    /// Next id to hand out; only ever grows, so retracted ids are not reused.
    next_id: EventId,
    frozen: bool,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create an empty ledger (when a match is scheduled).
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
            frozen: false,
        }
    }

    pub fn events(&self) -> &[MatchEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn last(&self) -> Option<&MatchEvent> {
        self.events.last()
    }

    /// Store `event` at the end of the log and return it with its assigned id.
    pub fn append(
        &mut self,
        event: ValidEvent,
        recorded_at: DateTime<Utc>,
    ) -> Result<&MatchEvent, MatchError> {
        if self.frozen {
            return Err(MatchError::LedgerFrozen);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.events.push(MatchEvent::from_valid(id, event, recorded_at));
        Ok(&self.events[self.events.len() - 1])
    }

    /// Remove the most recent event matching `predicate` (any event when None).
    ///
    /// This is the only way to correct the log; events are never edited in place.
    pub fn retract_last(
        &mut self,
        predicate: Option<&dyn Fn(&MatchEvent) -> bool>,
    ) -> Result<MatchEvent, MatchError> {
        if self.frozen {
            return Err(MatchError::LedgerFrozen);
        }
        let idx = self
            .events
            .iter()
            .rposition(|e| predicate.map_or(true, |p| p(e)))
            .ok_or(MatchError::NothingToRetract)?;
        Ok(self.events.remove(idx))
    }

    /// Events recorded in `period`, in ledger order. The iterator can be cloned to restart it.
    pub fn events_for(
        &self,
        period: Period,
    ) -> impl Iterator<Item = &MatchEvent> + Clone + '_ {
        self.events.iter().filter(move |e| e.period == period)
    }

    /// Freeze the ledger. Irreversible.
    pub fn finalize(&mut self) {
        self.frozen = true;
    }

    /// Check a ledger loaded from storage against the clock it was persisted with.
    pub(crate) fn validate(&self, clock: &Clock) -> Result<(), MatchError> {
        let mut previous: Option<EventId> = None;
        for e in &self.events {
            if previous.is_some_and(|p| e.id <= p) || e.id >= self.next_id {
                return Err(MatchError::CorruptState(format!(
                    "event id {} is out of sequence",
                    e.id
                )));
            }
            previous = Some(e.id);
            let limit = clock.duration_so_far(e.period).ok_or_else(|| {
                MatchError::CorruptState(format!("event {} is in unplayed {}", e.id, e.period))
            })?;
            if e.timestamp_in_period > limit {
                return Err(MatchError::CorruptState(format!(
                    "event {} at {}s is beyond {}s of {}",
                    e.id, e.timestamp_in_period, limit, e.period
                )));
            }
        }
        if self.frozen != clock.is_finalized() {
            return Err(MatchError::CorruptState(
                "ledger and clock disagree on finalization".to_string(),
            ));
        }
        Ok(())
    }
}
