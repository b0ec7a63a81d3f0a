//! Futsal match tracker: library with the match ledger, clock, statistics and controller.

pub mod logic;
pub mod models;

pub use logic::{
    authorize, compute_snapshot, import_player_times, parse_player_times, permits,
    resolve_player_times, CardKind, Command, ImportError, ImportFormat, KnownMinutes,
    MatchController, MatchId, PersistedMatch, PlayerTime, Role,
};
pub use models::{
    CardTally, Clock, ClockState, ClockView, EventId, EventInput, EventKind, InvalidEventReason,
    Ledger, MatchError, MatchEvent, Period, PlayerId, Roster, RosterEntry, StatisticsSnapshot,
    TeamSide, ValidEvent,
};
