//! Derived statistics for one match. Never stored apart from the ledger and clock it came from.

use crate::models::clock::ClockState;
use crate::models::event::Period;
use crate::models::player::{PlayerId, TeamSide};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CardTally {
    pub yellow: u32,
    pub red: u32,
}

/// Clock summary carried with the snapshot for display.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ClockView {
    pub state: ClockState,
    pub period_elapsed_seconds: u32,
    pub total_elapsed_seconds: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub score_own: u32,
    pub score_opponent: u32,
    /// Seconds on court per player, all periods.
    pub per_player_minutes: BTreeMap<PlayerId, u32>,
    /// Seconds on court per player, split by period.
    pub per_period_minutes: BTreeMap<Period, BTreeMap<PlayerId, u32>>,
    pub per_player_cards: BTreeMap<PlayerId, CardTally>,
    pub per_player_goals: BTreeMap<PlayerId, u32>,
    pub per_player_assists: BTreeMap<PlayerId, u32>,
    pub timeouts_own: u32,
    pub timeouts_opponent: u32,
    /// Players whose total was set by a bulk import rather than derived from events.
    pub imported_minutes: BTreeSet<PlayerId>,
    pub clock: ClockView,
    /// Revision of the controller that produced this snapshot.
    pub revision: u64,
}

impl StatisticsSnapshot {
    pub fn score(&self, side: TeamSide) -> u32 {
        match side {
            TeamSide::Own => self.score_own,
            TeamSide::Opponent => self.score_opponent,
        }
    }

    pub fn minutes(&self, player: PlayerId) -> u32 {
        self.per_player_minutes.get(&player).copied().unwrap_or(0)
    }

    pub fn minutes_in(&self, period: Period, player: PlayerId) -> u32 {
        self.per_period_minutes
            .get(&period)
            .and_then(|m| m.get(&player))
            .copied()
            .unwrap_or(0)
    }

    pub fn minutes_first_half(&self, player: PlayerId) -> u32 {
        self.minutes_in(Period::FirstHalf, player)
    }

    pub fn minutes_second_half(&self, player: PlayerId) -> u32 {
        self.minutes_in(Period::SecondHalf, player)
    }

    pub fn cards(&self, player: PlayerId) -> CardTally {
        self.per_player_cards.get(&player).copied().unwrap_or_default()
    }

    pub fn goals(&self, player: PlayerId) -> u32 {
        self.per_player_goals.get(&player).copied().unwrap_or(0)
    }

    pub fn assists(&self, player: PlayerId) -> u32 {
        self.per_player_assists.get(&player).copied().unwrap_or(0)
    }

    /// Overwrite totals with imported values. Per-period fields stay event-derived.
    pub(crate) fn apply_imported_minutes(&mut self, imported: &BTreeMap<PlayerId, u32>) {
        for (&player, &seconds) in imported {
            self.per_player_minutes.insert(player, seconds);
            self.imported_minutes.insert(player);
        }
    }
}
