//! Match controller: the single entry point that mutates a match.
//!
//! Each command is applied to a copy of the ledger and clock; the copy only replaces the
//! live state once the new snapshot has been computed, so a failed command leaves the
//! match exactly as it was.

use crate::logic::aggregate::compute_snapshot;
use crate::models::{
    Clock, ClockState, EventInput, EventKind, InvalidEventReason, Ledger, MatchError, MatchEvent,
    Period, PlayerId, Roster, StatisticsSnapshot, TeamSide, ValidEvent,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Yellow,
    Red,
}

/// Playing time for one player, as resolved by the bulk importer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct KnownMinutes {
    pub player: PlayerId,
    pub seconds: u32,
}

/// Everything a caller can ask a match to do.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    RecordGoal {
        side: TeamSide,
        scorer: PlayerId,
        #[serde(default)]
        assist: Option<PlayerId>,
    },
    /// `player` put the ball in their own net; the other side is credited.
    RecordOwnGoal { player: PlayerId },
    RecordCard { card: CardKind, player: PlayerId },
    RecordSubstitution { off: PlayerId, on: PlayerId },
    RecordTimeout { side: TeamSide },
    /// Back-date an event into the open period or a closed one.
    RecordCorrection { event: EventInput },
    /// Resume a paused period, or kick off the next one.
    StartClock,
    PauseClock,
    AdvanceClock { seconds: u32 },
    CloseCurrentPeriod,
    FinalizeMatch,
    UndoLastEvent,
    /// Bulk import: overwrite total playing time for the given players.
    SetKnownMinutes { minutes: Vec<KnownMinutes> },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::RecordGoal { .. } => "record_goal",
            Command::RecordOwnGoal { .. } => "record_own_goal",
            Command::RecordCard { .. } => "record_card",
            Command::RecordSubstitution { .. } => "record_substitution",
            Command::RecordTimeout { .. } => "record_timeout",
            Command::RecordCorrection { .. } => "record_correction",
            Command::StartClock => "start_clock",
            Command::PauseClock => "pause_clock",
            Command::AdvanceClock { .. } => "advance_clock",
            Command::CloseCurrentPeriod => "close_current_period",
            Command::FinalizeMatch => "finalize_match",
            Command::UndoLastEvent => "undo_last_event",
            Command::SetKnownMinutes { .. } => "set_known_minutes",
        }
    }
}

/// Durable form of a match, as handed to and loaded from the persistence layer.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PersistedMatch {
    pub match_id: MatchId,
    pub revision: u64,
    pub ledger: Ledger,
    pub clock: Clock,
    /// Totals set by bulk import, keyed by player.
    #[serde(default)]
    pub imported_minutes: BTreeMap<PlayerId, u32>,
}

impl PersistedMatch {
    /// A freshly scheduled match: empty ledger, idle clock.
    pub fn scheduled(match_id: MatchId) -> Self {
        Self {
            match_id,
            revision: 0,
            ledger: Ledger::new(),
            clock: Clock::new(),
            imported_minutes: BTreeMap::new(),
        }
    }
}

/// The mutable part of a match, copied while a command is applied.
#[derive(Clone, Debug)]
struct MatchState {
    ledger: Ledger,
    clock: Clock,
    imported_minutes: BTreeMap<PlayerId, u32>,
}

/// Owns the ledger and clock of one match and the snapshot derived from them.
#[derive(Clone, Debug)]
pub struct MatchController {
    match_id: MatchId,
    roster: Roster,
    state: MatchState,
    revision: u64,
    snapshot: StatisticsSnapshot,
}

impl MatchController {
    /// Schedule a new match for `roster`.
    pub fn new(roster: Roster) -> Result<Self, MatchError> {
        Self::hydrate(PersistedMatch::scheduled(Uuid::new_v4()), roster)
    }

    /// Rebuild a controller from persisted state, re-checking its invariants.
    pub fn hydrate(persisted: PersistedMatch, roster: Roster) -> Result<Self, MatchError> {
        persisted.clock.validate()?;
        persisted.ledger.validate(&persisted.clock)?;
        if let Some(player) = persisted
            .imported_minutes
            .keys()
            .find(|p| !roster.contains(**p))
        {
            return Err(MatchError::CorruptState(format!(
                "imported minutes for player {player} who is not in the roster"
            )));
        }
        let state = MatchState {
            ledger: persisted.ledger,
            clock: persisted.clock,
            imported_minutes: persisted.imported_minutes,
        };
        let snapshot = recompute(&state, &roster, persisted.revision)?;
        log::debug!(
            "Hydrated match {} at revision {} ({} events)",
            persisted.match_id,
            persisted.revision,
            state.ledger.len()
        );
        Ok(Self {
            match_id: persisted.match_id,
            roster,
            state,
            revision: persisted.revision,
            snapshot,
        })
    }

    /// Export the state the persistence layer should store.
    pub fn persisted(&self) -> PersistedMatch {
        PersistedMatch {
            match_id: self.match_id,
            revision: self.revision,
            ledger: self.state.ledger.clone(),
            clock: self.state.clock.clone(),
            imported_minutes: self.state.imported_minutes.clone(),
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Incremented on every successful mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn clock(&self) -> &Clock {
        &self.state.clock
    }

    /// Statistics as of the last successful mutation.
    pub fn snapshot(&self) -> &StatisticsSnapshot {
        &self.snapshot
    }

    /// Reject a writer that last saw a different revision.
    pub fn check_revision(&self, expected: u64) -> Result<(), MatchError> {
        if expected != self.revision {
            return Err(MatchError::StaleRevision {
                expected,
                actual: self.revision,
            });
        }
        Ok(())
    }

    /// Apply one command and return the recomputed snapshot.
    ///
    /// A command that changes nothing (advancing a paused clock) returns the current
    /// snapshot without bumping the revision.
    pub fn apply(&mut self, command: Command) -> Result<StatisticsSnapshot, MatchError> {
        let name = command.name();
        let outcome = self.execute(command).and_then(|next| {
            next.map(|next| {
                recompute(&next, &self.roster, self.revision + 1).map(|s| (next, s))
            })
            .transpose()
        });
        match outcome {
            Ok(Some((next, snapshot))) => {
                self.state = next;
                self.revision += 1;
                self.snapshot = snapshot;
                log::debug!(
                    "Match {}: {} applied (revision {})",
                    self.match_id,
                    name,
                    self.revision
                );
                Ok(self.snapshot.clone())
            }
            Ok(None) => Ok(self.snapshot.clone()),
            Err(e) => {
                log::warn!("Match {}: {} rejected: {}", self.match_id, name, e);
                Err(e)
            }
        }
    }

    pub fn record_goal(
        &mut self,
        side: TeamSide,
        scorer: PlayerId,
        assist: Option<PlayerId>,
    ) -> Result<StatisticsSnapshot, MatchError> {
        self.apply(Command::RecordGoal {
            side,
            scorer,
            assist,
        })
    }

    pub fn record_card(
        &mut self,
        card: CardKind,
        player: PlayerId,
    ) -> Result<StatisticsSnapshot, MatchError> {
        self.apply(Command::RecordCard { card, player })
    }

    pub fn record_substitution(
        &mut self,
        off: PlayerId,
        on: PlayerId,
    ) -> Result<StatisticsSnapshot, MatchError> {
        self.apply(Command::RecordSubstitution { off, on })
    }

    pub fn start_clock(&mut self) -> Result<StatisticsSnapshot, MatchError> {
        self.apply(Command::StartClock)
    }

    pub fn pause_clock(&mut self) -> Result<StatisticsSnapshot, MatchError> {
        self.apply(Command::PauseClock)
    }

    pub fn advance_clock(&mut self, seconds: u32) -> Result<StatisticsSnapshot, MatchError> {
        self.apply(Command::AdvanceClock { seconds })
    }

    pub fn close_current_period(&mut self) -> Result<StatisticsSnapshot, MatchError> {
        self.apply(Command::CloseCurrentPeriod)
    }

    pub fn finalize_match(&mut self) -> Result<StatisticsSnapshot, MatchError> {
        self.apply(Command::FinalizeMatch)
    }

    pub fn undo_last_event(&mut self) -> Result<StatisticsSnapshot, MatchError> {
        self.apply(Command::UndoLastEvent)
    }

    /// Compute the next state for `command`, or None if it is a no-op.
    fn execute(&self, command: Command) -> Result<Option<MatchState>, MatchError> {
        self.ensure_open()?;
        let mut next = self.state.clone();
        match command {
            Command::RecordGoal {
                side,
                scorer,
                assist,
            } => {
                self.expect_side(scorer, side)?;
                if let Some(assist) = assist {
                    self.expect_side(assist, side)?;
                }
                let event = self.live_event(EventKind::Goal, Some(scorer), assist, Some(side))?;
                self.append(&mut next, event)?;
            }
            Command::RecordOwnGoal { player } => {
                let side = self.side_of(player)?;
                let event = self.live_event(EventKind::OwnGoal, Some(player), None, Some(side))?;
                self.append(&mut next, event)?;
            }
            Command::RecordCard { card, player } => {
                let side = self.side_of(player)?;
                let kind = match card {
                    CardKind::Yellow => EventKind::YellowCard,
                    CardKind::Red => EventKind::RedCard,
                };
                let event = self.live_event(kind, Some(player), None, Some(side))?;
                self.append(&mut next, event)?;
            }
            Command::RecordSubstitution { off, on } => {
                let side = self.side_of(off)?;
                self.expect_side(on, side)?;
                let event =
                    self.live_event(EventKind::Substitution, Some(off), Some(on), Some(side))?;
                self.append(&mut next, event)?;
            }
            Command::RecordTimeout { side } => {
                let event = self.live_event(EventKind::TimeoutCalled, None, None, Some(side))?;
                self.append(&mut next, event)?;
            }
            Command::RecordCorrection { event } => {
                if event.kind.is_period_marker() {
                    return Err(InvalidEventReason::ClockMarker(event.kind).into());
                }
                for player in [event.subject_player_id, event.related_player_id]
                    .into_iter()
                    .flatten()
                {
                    match event.team_side {
                        Some(side) => self.expect_side(player, side)?,
                        None => {
                            self.side_of(player)?;
                        }
                    }
                }
                let event = event.validate(&self.state.clock)?.as_correction();
                self.append(&mut next, event)?;
            }
            Command::StartClock => match next.clock.state() {
                ClockState::Paused(_) => next.clock.resume()?,
                ClockState::Idle => {
                    let period = next.clock.next_period().ok_or(MatchError::ClockState {
                        operation: "start another period",
                        state: ClockState::Idle,
                    })?;
                    next.clock.start_period(period)?;
                    let marker = ValidEvent::marker(EventKind::PeriodStart, period, 0);
                    self.append(&mut next, marker)?;
                }
                state => {
                    return Err(MatchError::ClockState {
                        operation: "start the clock",
                        state,
                    })
                }
            },
            Command::PauseClock => next.clock.pause()?,
            Command::AdvanceClock { seconds } => {
                if !next.clock.tick(seconds) {
                    return Ok(None);
                }
            }
            Command::CloseCurrentPeriod => {
                let (period, duration) = next.clock.close_period()?;
                let marker = ValidEvent::marker(EventKind::PeriodEnd, period, duration);
                self.append(&mut next, marker)?;
            }
            Command::FinalizeMatch => {
                next.clock.finalize()?;
                next.ledger.finalize();
            }
            Command::UndoLastEvent => {
                let not_marker = |e: &MatchEvent| !e.kind.is_period_marker();
                let retracted = next.ledger.retract_last(Some(&not_marker))?;
                log::info!(
                    "Match {}: retracted {} #{} ({} at {}s)",
                    self.match_id,
                    retracted.kind,
                    retracted.id,
                    retracted.period,
                    retracted.timestamp_in_period
                );
            }
            Command::SetKnownMinutes { minutes } => {
                let played = next.clock.total_elapsed();
                for KnownMinutes { player, seconds } in minutes {
                    self.side_of(player)?;
                    if played > 0 && seconds > played {
                        return Err(MatchError::ImportedMinutesExceedMatch {
                            player,
                            seconds,
                            match_seconds: played,
                        });
                    }
                    next.imported_minutes.insert(player, seconds);
                }
            }
        }
        Ok(Some(next))
    }

    fn ensure_open(&self) -> Result<(), MatchError> {
        if self.state.ledger.is_frozen() {
            return Err(MatchError::LedgerFrozen);
        }
        Ok(())
    }

    fn side_of(&self, player: PlayerId) -> Result<TeamSide, MatchError> {
        self.roster
            .side_of(player)
            .ok_or_else(|| InvalidEventReason::UnknownPlayer(player).into())
    }

    fn expect_side(&self, player: PlayerId, expected: TeamSide) -> Result<(), MatchError> {
        let actual = self.side_of(player)?;
        if actual != expected {
            return Err(InvalidEventReason::SideMismatch {
                player,
                expected,
                actual,
            }
            .into());
        }
        Ok(())
    }

    /// Build an event stamped at the open period's current elapsed time.
    fn live_event(
        &self,
        kind: EventKind,
        subject_player_id: Option<PlayerId>,
        related_player_id: Option<PlayerId>,
        team_side: Option<TeamSide>,
    ) -> Result<ValidEvent, MatchError> {
        let clock = &self.state.clock;
        let period: Period = clock.current_period().ok_or(MatchError::ClockState {
            operation: "record an event",
            state: clock.state(),
        })?;
        let input = EventInput {
            kind,
            period,
            timestamp_in_period: i64::from(clock.period_elapsed_seconds()),
            subject_player_id,
            related_player_id,
            team_side,
        };
        Ok(input.validate(clock)?)
    }

    fn append(&self, next: &mut MatchState, event: ValidEvent) -> Result<(), MatchError> {
        let stored = next.ledger.append(event, Utc::now())?;
        log::info!(
            "Match {}: {} #{} in {} at {}s",
            self.match_id,
            stored.kind,
            stored.id,
            stored.period,
            stored.timestamp_in_period
        );
        Ok(())
    }
}

fn recompute(
    state: &MatchState,
    roster: &Roster,
    revision: u64,
) -> Result<StatisticsSnapshot, MatchError> {
    let mut snapshot = compute_snapshot(&state.ledger, &state.clock, roster)?;
    snapshot.apply_imported_minutes(&state.imported_minutes);
    snapshot.revision = revision;
    Ok(snapshot)
}
