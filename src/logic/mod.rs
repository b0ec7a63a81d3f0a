//! Match logic: aggregation, the match controller, bulk import and access checks.

mod access;
mod aggregate;
mod bulk_import;
mod controller;

pub use access::{authorize, permits, Role};
pub use aggregate::compute_snapshot;
pub use bulk_import::{
    import_player_times, parse_player_times, resolve_player_times, ImportError, ImportFormat,
    PlayerTime,
};
pub use controller::{CardKind, Command, KnownMinutes, MatchController, MatchId, PersistedMatch};
