//! Match clock: a pure accumulator of playing time per period.
//!
//! The caller owns the real-time source and feeds elapsed seconds in with `tick`.

use crate::models::error::MatchError;
use crate::models::event::Period;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Observable state of the clock.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "period", rename_all = "snake_case")]
pub enum ClockState {
    /// No period open. Either before kickoff or between periods.
    Idle,
    Running(Period),
    Paused(Period),
    /// Terminal: the match has been finalized.
    MatchFinalized,
}

impl std::fmt::Display for ClockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockState::Idle => write!(f, "idle"),
            ClockState::Running(p) => write!(f, "running ({p})"),
            ClockState::Paused(p) => write!(f, "paused ({p})"),
            ClockState::MatchFinalized => write!(f, "finalized"),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    /// None before kickoff, between periods and after full-time.
    pub(crate) current_period: Option<Period>,
    pub(crate) period_elapsed_seconds: u32,
    pub(crate) running: bool,
    /// Sealed durations. Entries are never changed once written.
    pub(crate) closed_periods: BTreeMap<Period, u32>,
    #[serde(default)]
    pub(crate) finalized: bool,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ClockState {
        if self.finalized {
            return ClockState::MatchFinalized;
        }
        match (self.current_period, self.running) {
            (None, _) => ClockState::Idle,
            (Some(p), true) => ClockState::Running(p),
            (Some(p), false) => ClockState::Paused(p),
        }
    }

    pub fn current_period(&self) -> Option<Period> {
        self.current_period
    }

    pub fn period_elapsed_seconds(&self) -> u32 {
        self.period_elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn closed_periods(&self) -> &BTreeMap<Period, u32> {
        &self.closed_periods
    }

    /// Final duration of `period`; None while it is open or never played.
    pub fn closed_duration(&self, period: Period) -> Option<u32> {
        self.closed_periods.get(&period).copied()
    }

    /// Closed duration, or elapsed time so far if `period` is the open one.
    pub fn duration_so_far(&self, period: Period) -> Option<u32> {
        if self.current_period == Some(period) {
            Some(self.period_elapsed_seconds)
        } else {
            self.closed_duration(period)
        }
    }

    /// True if `period` is open now or has been closed.
    pub fn has_opened(&self, period: Period) -> bool {
        self.current_period == Some(period) || self.closed_periods.contains_key(&period)
    }

    /// Periods opened so far, in playing order.
    pub fn opened_periods(&self) -> impl Iterator<Item = Period> + '_ {
        Period::ALL.into_iter().filter(|p| self.has_opened(*p))
    }

    /// Total playing time across closed periods and the open one, capped at `u32::MAX`.
    pub fn total_elapsed(&self) -> u32 {
        let open = self.current_period.map_or(0, |_| self.period_elapsed_seconds);
        self.closed_periods
            .values()
            .fold(open, |total, seconds| total.saturating_add(*seconds))
    }

    /// The period `start_period` would accept next, if any remain.
    pub fn next_period(&self) -> Option<Period> {
        match self.closed_periods.keys().next_back() {
            None => Some(Period::FirstHalf),
            Some(last) => last.next(),
        }
    }

    fn error(&self, operation: &'static str) -> MatchError {
        MatchError::ClockState {
            operation,
            state: self.state(),
        }
    }

    pub fn start_period(&mut self, period: Period) -> Result<(), MatchError> {
        if self.finalized || self.current_period.is_some() {
            return Err(self.error("start a period"));
        }
        if self.next_period() != Some(period) {
            return Err(self.error("start a period out of order"));
        }
        self.current_period = Some(period);
        self.period_elapsed_seconds = 0;
        self.running = true;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), MatchError> {
        if self.finalized || self.current_period.is_none() || !self.running {
            return Err(self.error("pause"));
        }
        self.running = false;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), MatchError> {
        if self.finalized || self.current_period.is_none() || self.running {
            return Err(self.error("resume"));
        }
        self.running = true;
        Ok(())
    }

    /// Advance elapsed time. Returns false (and changes nothing) while not running.
    pub fn tick(&mut self, delta_seconds: u32) -> bool {
        if !self.running || delta_seconds == 0 {
            return false;
        }
        self.period_elapsed_seconds = self.period_elapsed_seconds.saturating_add(delta_seconds);
        true
    }

    /// Seal the open period. The clock must be paused first.
    pub fn close_period(&mut self) -> Result<(Period, u32), MatchError> {
        let period = match self.current_period {
            Some(p) if !self.running && !self.finalized => p,
            _ => return Err(self.error("close the period")),
        };
        let duration = self.period_elapsed_seconds;
        self.closed_periods.insert(period, duration);
        self.current_period = None;
        self.period_elapsed_seconds = 0;
        Ok((period, duration))
    }

    /// Enter the terminal state. Only allowed between periods.
    pub fn finalize(&mut self) -> Result<(), MatchError> {
        if self.finalized || self.current_period.is_some() {
            return Err(self.error("finalize the match"));
        }
        self.finalized = true;
        Ok(())
    }

    /// Check invariants of a clock loaded from storage.
    pub(crate) fn validate(&self) -> Result<(), MatchError> {
        if self.current_period.is_none() && (self.running || self.period_elapsed_seconds != 0) {
            return Err(MatchError::CorruptState(
                "clock has time on it but no open period".to_string(),
            ));
        }
        if self.finalized && self.current_period.is_some() {
            return Err(MatchError::CorruptState(
                "finalized clock has an open period".to_string(),
            ));
        }
        let played: Vec<Period> = self.opened_periods().collect();
        if played.iter().zip(Period::ALL).any(|(a, b)| *a != b) {
            return Err(MatchError::CorruptState(
                "clock periods are not contiguous".to_string(),
            ));
        }
        if let Some(open) = self.current_period {
            if self.closed_periods.keys().any(|p| *p >= open) {
                return Err(MatchError::CorruptState(format!(
                    "open period {open} precedes a closed one"
                )));
            }
        }
        Ok(())
    }
}
