//! Aggregator: derive a statistics snapshot from the ledger, clock and roster.

use crate::models::{
    CardTally, Clock, ClockView, EventKind, Ledger, MatchError, MatchEvent, Period, PlayerId,
    Roster, StatisticsSnapshot, TeamSide,
};
use std::collections::{BTreeMap, BTreeSet};

/// Recompute every derived statistic from scratch.
///
/// Pure and deterministic: the same ledger, clock and roster always give the same snapshot.
/// Fails with `InconsistentSubstitution` when the substitutions cannot be paired into
/// on/off intervals (a player coming on twice, or going off while not on court).
pub fn compute_snapshot(
    ledger: &Ledger,
    clock: &Clock,
    roster: &Roster,
) -> Result<StatisticsSnapshot, MatchError> {
    let mut score_own = 0;
    let mut score_opponent = 0;
    let mut timeouts_own = 0;
    let mut timeouts_opponent = 0;
    let mut per_player_cards: BTreeMap<PlayerId, CardTally> = BTreeMap::new();
    let mut per_player_goals: BTreeMap<PlayerId, u32> = BTreeMap::new();
    let mut per_player_assists: BTreeMap<PlayerId, u32> = BTreeMap::new();

    for e in ledger.events() {
        match e.credited_side() {
            Some(TeamSide::Own) => score_own += 1,
            Some(TeamSide::Opponent) => score_opponent += 1,
            None => {}
        }
        match (e.kind, e.subject_player_id) {
            (EventKind::Goal, Some(scorer)) => {
                *per_player_goals.entry(scorer).or_insert(0) += 1;
                if let Some(assist) = e.related_player_id {
                    *per_player_assists.entry(assist).or_insert(0) += 1;
                }
            }
            (EventKind::YellowCard, Some(p)) => per_player_cards.entry(p).or_default().yellow += 1,
            (EventKind::RedCard, Some(p)) => per_player_cards.entry(p).or_default().red += 1,
            (EventKind::TimeoutCalled, _) => match e.team_side {
                Some(TeamSide::Own) => timeouts_own += 1,
                Some(TeamSide::Opponent) => timeouts_opponent += 1,
                None => {}
            },
            _ => {}
        }
    }

    let per_period_minutes = minutes_by_period(ledger, clock, roster)?;
    let mut per_player_minutes: BTreeMap<PlayerId, u32> =
        roster.iter().map(|(id, _)| (id, 0)).collect();
    for minutes in per_period_minutes.values() {
        for (&player, &seconds) in minutes {
            let total = per_player_minutes.entry(player).or_insert(0);
            *total = total.saturating_add(seconds);
        }
    }

    Ok(StatisticsSnapshot {
        score_own,
        score_opponent,
        per_player_minutes,
        per_period_minutes,
        per_player_cards,
        per_player_goals,
        per_player_assists,
        timeouts_own,
        timeouts_opponent,
        imported_minutes: BTreeSet::new(),
        clock: ClockView {
            state: clock.state(),
            period_elapsed_seconds: clock.period_elapsed_seconds(),
            total_elapsed_seconds: clock.total_elapsed(),
        },
        revision: 0,
    })
}

/// Seconds on court per player for every period the clock has opened.
///
/// The first period starts with the roster's starters; each later period starts with
/// whoever was on court when the previous one closed.
fn minutes_by_period(
    ledger: &Ledger,
    clock: &Clock,
    roster: &Roster,
) -> Result<BTreeMap<Period, BTreeMap<PlayerId, u32>>, MatchError> {
    let mut on_court: BTreeSet<PlayerId> = roster.starters().collect();
    let mut by_period = BTreeMap::new();

    for period in clock.opened_periods() {
        let bound = clock.duration_so_far(period).unwrap_or(0);
        let substitutions = ledger
            .events_for(period)
            .filter(|e| e.kind == EventKind::Substitution);
        let (minutes, still_on) = play_period(period, bound, &on_court, substitutions)?;
        by_period.insert(period, minutes);
        on_court = still_on;
    }
    Ok(by_period)
}

/// Walk one period's substitutions and credit each on-court interval, clipped to `bound`.
fn play_period<'a>(
    period: Period,
    bound: u32,
    starting: &BTreeSet<PlayerId>,
    substitutions: impl Iterator<Item = &'a MatchEvent>,
) -> Result<(BTreeMap<PlayerId, u32>, BTreeSet<PlayerId>), MatchError> {
    // player -> second they came on
    let mut on: BTreeMap<PlayerId, u32> = starting.iter().map(|p| (*p, 0)).collect();
    let mut minutes: BTreeMap<PlayerId, u32> = BTreeMap::new();

    for e in substitutions {
        let (Some(off), Some(coming_on)) = (e.subject_player_id, e.related_player_id) else {
            continue;
        };
        let at = e.timestamp_in_period.min(bound);
        let inconsistent = |player| MatchError::InconsistentSubstitution { player, period, at };

        let since = on.remove(&off).ok_or_else(|| inconsistent(off))?;
        if at < since {
            return Err(inconsistent(off));
        }
        *minutes.entry(off).or_insert(0) += at - since;

        if on.contains_key(&coming_on) {
            return Err(inconsistent(coming_on));
        }
        on.insert(coming_on, at);
    }

    for (&player, &since) in &on {
        *minutes.entry(player).or_insert(0) += bound.saturating_sub(since);
    }
    Ok((minutes, on.into_keys().collect()))
}
