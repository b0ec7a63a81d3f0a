//! Errors raised by the match ledger, clock, aggregator and controller.

use crate::models::clock::ClockState;
use crate::models::event::{EventKind, Period};
use crate::models::player::{PlayerId, TeamSide};
use thiserror::Error;

/// Why an event could not be constructed.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum InvalidEventReason {
    #[error("period {0} has not been opened")]
    PeriodNotOpened(Period),
    #[error("timestamp {0}s is negative")]
    NegativeTimestamp(i64),
    #[error("timestamp {at}s is beyond the {limit}s recorded for {period}")]
    TimestampBeyondPeriod { period: Period, at: i64, limit: u32 },
    #[error("{0} requires a subject player")]
    MissingSubject(EventKind),
    #[error("{0} requires a team side")]
    MissingSide(EventKind),
    #[error("substitution requires the incoming player")]
    MissingIncomingPlayer,
    #[error("the same player cannot be both subject and related player")]
    SamePlayer,
    #[error("{0} does not take a related player")]
    UnexpectedRelatedPlayer(EventKind),
    #[error("player {0} is not in the roster")]
    UnknownPlayer(PlayerId),
    #[error("player {player} plays for the {actual} side, not {expected}")]
    SideMismatch {
        player: PlayerId,
        expected: TeamSide,
        actual: TeamSide,
    },
    #[error("{0} is recorded by the clock, not by hand")]
    ClockMarker(EventKind),
}

/// Errors that can occur while running a match.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum MatchError {
    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] InvalidEventReason),
    #[error("Cannot {operation} while the clock is {state}")]
    ClockState {
        operation: &'static str,
        state: ClockState,
    },
    #[error("The match is finalized; its ledger is read-only")]
    LedgerFrozen,
    #[error("There is no event to undo")]
    NothingToRetract,
    #[error("Inconsistent substitutions for player {player} in {period} at {at}s")]
    InconsistentSubstitution {
        player: PlayerId,
        period: Period,
        at: u32,
    },
    #[error("Stale revision: expected {expected}, match is at {actual}")]
    StaleRevision { expected: u64, actual: u64 },
    #[error("Imported {seconds}s for player {player} exceeds the {match_seconds}s played so far")]
    ImportedMinutesExceedMatch {
        player: PlayerId,
        seconds: u32,
        match_seconds: u32,
    },
    #[error("Role {role} may not {action}")]
    Forbidden { role: String, action: &'static str },
    #[error("Persisted match state is corrupt: {0}")]
    CorruptState(String),
}

impl MatchError {
    /// True when another writer moved the match on since the caller last read it.
    pub fn is_conflict(&self) -> bool {
        matches!(self, MatchError::StaleRevision { .. })
    }
}
