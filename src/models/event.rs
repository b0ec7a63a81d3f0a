//! Match events: immutable facts appended to a match ledger.

use crate::models::clock::Clock;
use crate::models::error::InvalidEventReason;
use crate::models::player::{PlayerId, TeamSide};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the ledger. Never reused within a match.
pub type EventId = u64;

/// A timed segment of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    FirstHalf,
    SecondHalf,
    ExtraTime,
}

impl Period {
    /// All periods in playing order.
    pub const ALL: [Period; 3] = [Period::FirstHalf, Period::SecondHalf, Period::ExtraTime];

    pub fn next(self) -> Option<Period> {
        match self {
            Period::FirstHalf => Some(Period::SecondHalf),
            Period::SecondHalf => Some(Period::ExtraTime),
            Period::ExtraTime => None,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::FirstHalf => write!(f, "first half"),
            Period::SecondHalf => write!(f, "second half"),
            Period::ExtraTime => write!(f, "extra time"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Goal,
    OwnGoal,
    YellowCard,
    RedCard,
    Substitution,
    TimeoutCalled,
    PeriodStart,
    PeriodEnd,
}

impl EventKind {
    pub fn requires_subject(self) -> bool {
        !matches!(
            self,
            EventKind::TimeoutCalled | EventKind::PeriodStart | EventKind::PeriodEnd
        )
    }

    pub fn is_period_marker(self) -> bool {
        matches!(self, EventKind::PeriodStart | EventKind::PeriodEnd)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::Goal => "goal",
            EventKind::OwnGoal => "own goal",
            EventKind::YellowCard => "yellow card",
            EventKind::RedCard => "red card",
            EventKind::Substitution => "substitution",
            EventKind::TimeoutCalled => "timeout",
            EventKind::PeriodStart => "period start",
            EventKind::PeriodEnd => "period end",
        };
        f.write_str(name)
    }
}

/// Raw event fields as supplied by a caller, before validation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EventInput {
    pub kind: EventKind,
    pub period: Period,
    /// Seconds into `period`. Signed so that bad input can be reported rather than wrapped.
    pub timestamp_in_period: i64,
    #[serde(default)]
    pub subject_player_id: Option<PlayerId>,
    #[serde(default)]
    pub related_player_id: Option<PlayerId>,
    #[serde(default)]
    pub team_side: Option<TeamSide>,
}

impl EventInput {
    /// Check the input against the clock and the per-kind field rules.
    pub fn validate(self, clock: &Clock) -> Result<ValidEvent, InvalidEventReason> {
        let limit = clock
            .duration_so_far(self.period)
            .ok_or(InvalidEventReason::PeriodNotOpened(self.period))?;
        if self.timestamp_in_period < 0 {
            return Err(InvalidEventReason::NegativeTimestamp(self.timestamp_in_period));
        }
        if self.timestamp_in_period > i64::from(limit) {
            return Err(InvalidEventReason::TimestampBeyondPeriod {
                period: self.period,
                at: self.timestamp_in_period,
                limit,
            });
        }
        if self.kind.requires_subject() {
            if self.subject_player_id.is_none() {
                return Err(InvalidEventReason::MissingSubject(self.kind));
            }
            if self.team_side.is_none() {
                return Err(InvalidEventReason::MissingSide(self.kind));
            }
        } else if self.kind == EventKind::TimeoutCalled && self.team_side.is_none() {
            return Err(InvalidEventReason::MissingSide(self.kind));
        }
        match self.kind {
            EventKind::Substitution => match self.related_player_id {
                None => return Err(InvalidEventReason::MissingIncomingPlayer),
                Some(on) if Some(on) == self.subject_player_id => {
                    return Err(InvalidEventReason::SamePlayer)
                }
                Some(_) => {}
            },
            EventKind::Goal => {
                if self.related_player_id.is_some()
                    && self.related_player_id == self.subject_player_id
                {
                    return Err(InvalidEventReason::SamePlayer);
                }
            }
            kind => {
                if self.related_player_id.is_some() {
                    return Err(InvalidEventReason::UnexpectedRelatedPlayer(kind));
                }
            }
        }
        let timestamp_in_period = u32::try_from(self.timestamp_in_period).map_err(|_| {
            InvalidEventReason::TimestampBeyondPeriod {
                period: self.period,
                at: self.timestamp_in_period,
                limit,
            }
        })?;
        let provisional = clock.current_period() == Some(self.period);
        Ok(ValidEvent {
            kind: self.kind,
            period: self.period,
            timestamp_in_period,
            subject_player_id: self.subject_player_id,
            related_player_id: self.related_player_id,
            team_side: self.team_side,
            correction: !provisional,
        })
    }
}

/// An event that passed validation and is ready to be appended.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidEvent {
    pub(crate) kind: EventKind,
    pub(crate) period: Period,
    pub(crate) timestamp_in_period: u32,
    pub(crate) subject_player_id: Option<PlayerId>,
    pub(crate) related_player_id: Option<PlayerId>,
    pub(crate) team_side: Option<TeamSide>,
    pub(crate) correction: bool,
}

impl ValidEvent {
    /// Period start/end marker written by the controller as the clock moves.
    pub(crate) fn marker(kind: EventKind, period: Period, at: u32) -> Self {
        Self {
            kind,
            period,
            timestamp_in_period: at,
            subject_player_id: None,
            related_player_id: None,
            team_side: None,
            correction: false,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Mark the event as a manual correction even if it lands in the open period.
    pub fn as_correction(mut self) -> Self {
        self.correction = true;
        self
    }
}

/// One immutable fact in the ledger.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub id: EventId,
    pub kind: EventKind,
    pub period: Period,
    pub timestamp_in_period: u32,
    pub subject_player_id: Option<PlayerId>,
    /// Incoming player for a substitution, assisting player for a goal.
    pub related_player_id: Option<PlayerId>,
    pub team_side: Option<TeamSide>,
    /// Back-dated or hand-corrected rather than recorded live.
    #[serde(default)]
    pub correction: bool,
    pub recorded_at: DateTime<Utc>,
}

impl MatchEvent {
    pub(crate) fn from_valid(id: EventId, event: ValidEvent, recorded_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: event.kind,
            period: event.period,
            timestamp_in_period: event.timestamp_in_period,
            subject_player_id: event.subject_player_id,
            related_player_id: event.related_player_id,
            team_side: event.team_side,
            correction: event.correction,
            recorded_at,
        }
    }

    /// Side whose score this event raises, if it is a goal of either kind.
    pub fn credited_side(&self) -> Option<TeamSide> {
        match self.kind {
            EventKind::Goal => self.team_side,
            EventKind::OwnGoal => self.team_side.map(TeamSide::opposite),
            _ => None,
        }
    }
}
