//! Data structures for a futsal match: events, clock, ledger, roster, derived statistics.

mod clock;
mod error;
mod event;
mod ledger;
mod player;
mod snapshot;

pub use clock::{Clock, ClockState};
pub use error::{InvalidEventReason, MatchError};
pub use event::{EventId, EventInput, EventKind, MatchEvent, Period, ValidEvent};
pub use ledger::Ledger;
pub use player::{PlayerId, Roster, RosterEntry, TeamSide};
pub use snapshot::{CardTally, ClockView, StatisticsSnapshot};
