//! Integration tests for the aggregator: score, cards, goals/assists and playing time.

use chrono::Utc;
use futsal_match_web::{
    compute_snapshot, Clock, EventInput, EventKind, Ledger, MatchError, Period, PlayerId, Roster,
    RosterEntry, TeamSide,
};

/// Roster with `starters` own players on court and `bench` own players off it.
fn squad(starters: usize, bench: usize) -> (Roster, Vec<PlayerId>) {
    let mut roster = Roster::new();
    let mut ids = Vec::new();
    for i in 0..starters + bench {
        let mut entry = RosterEntry::new(format!("P{i}"), TeamSide::Own).with_shirt_number(i as u8 + 1);
        if i < starters {
            entry = entry.starting();
        }
        ids.push(roster.add(entry));
    }
    (roster, ids)
}

fn event(kind: EventKind, period: Period, at: i64, subject: Option<PlayerId>, side: TeamSide) -> EventInput {
    EventInput {
        kind,
        period,
        timestamp_in_period: at,
        subject_player_id: subject,
        related_player_id: None,
        team_side: Some(side),
    }
}

fn substitution(period: Period, at: i64, off: PlayerId, on: PlayerId) -> EventInput {
    EventInput {
        related_player_id: Some(on),
        ..event(EventKind::Substitution, period, at, Some(off), TeamSide::Own)
    }
}

fn push(ledger: &mut Ledger, clock: &Clock, input: EventInput) {
    ledger.append(input.validate(clock).unwrap(), Utc::now()).unwrap();
}

fn close(clock: &mut Clock) {
    clock.pause().unwrap();
    clock.close_period().unwrap();
}

#[test]
fn own_goal_credits_the_other_side() {
    let (roster, ids) = squad(1, 0);
    let opponent = Roster::new().add(RosterEntry::new("Opp", TeamSide::Opponent));
    let mut clock = Clock::new();
    clock.start_period(Period::FirstHalf).unwrap();
    clock.tick(100);
    let mut ledger = Ledger::new();
    let fh = Period::FirstHalf;
    push(&mut ledger, &clock, event(EventKind::Goal, fh, 10, Some(ids[0]), TeamSide::Own));
    push(&mut ledger, &clock, event(EventKind::OwnGoal, fh, 20, Some(opponent), TeamSide::Opponent));
    push(&mut ledger, &clock, event(EventKind::OwnGoal, fh, 30, Some(ids[0]), TeamSide::Own));
    push(&mut ledger, &clock, event(EventKind::Goal, fh, 40, Some(opponent), TeamSide::Opponent));

    let s = compute_snapshot(&ledger, &clock, &roster).unwrap();
    assert_eq!(s.score_own, 2);
    assert_eq!(s.score_opponent, 2);
    let goal_events = ledger
        .events()
        .iter()
        .filter(|e| matches!(e.kind, EventKind::Goal | EventKind::OwnGoal))
        .count() as u32;
    assert_eq!(s.score_own + s.score_opponent, goal_events);
    // own goals are not credited to the player
    assert_eq!(s.goals(ids[0]), 1);
}

#[test]
fn cards_goals_assists_and_timeouts_are_tallied() {
    let (roster, ids) = squad(2, 0);
    let mut clock = Clock::new();
    clock.start_period(Period::FirstHalf).unwrap();
    clock.tick(100);
    let fh = Period::FirstHalf;
    let mut ledger = Ledger::new();
    push(&mut ledger, &clock, event(EventKind::YellowCard, fh, 5, Some(ids[0]), TeamSide::Own));
    push(&mut ledger, &clock, event(EventKind::YellowCard, fh, 6, Some(ids[0]), TeamSide::Own));
    push(&mut ledger, &clock, event(EventKind::RedCard, fh, 7, Some(ids[1]), TeamSide::Own));
    let mut assisted = event(EventKind::Goal, fh, 8, Some(ids[0]), TeamSide::Own);
    assisted.related_player_id = Some(ids[1]);
    push(&mut ledger, &clock, assisted);
    let timeout = EventInput {
        subject_player_id: None,
        ..event(EventKind::TimeoutCalled, fh, 9, None, TeamSide::Opponent)
    };
    push(&mut ledger, &clock, timeout);

    let s = compute_snapshot(&ledger, &clock, &roster).unwrap();
    assert_eq!(s.cards(ids[0]).yellow, 2);
    assert_eq!(s.cards(ids[1]).red, 1);
    assert_eq!(s.goals(ids[0]), 1);
    assert_eq!(s.assists(ids[1]), 1);
    assert_eq!(s.timeouts_opponent, 1);
    assert_eq!(s.timeouts_own, 0);
}

#[test]
fn substitution_splits_period_between_players() {
    let (roster, ids) = squad(1, 1);
    let (p1, p2) = (ids[0], ids[1]);
    let mut clock = Clock::new();
    clock.start_period(Period::FirstHalf).unwrap();
    clock.tick(300);
    let mut ledger = Ledger::new();
    push(&mut ledger, &clock, substitution(Period::FirstHalf, 300, p1, p2));
    clock.tick(900);
    close(&mut clock);

    let s = compute_snapshot(&ledger, &clock, &roster).unwrap();
    assert_eq!(s.minutes(p1), 300);
    assert_eq!(s.minutes(p2), 900);
    assert_eq!(s.minutes_first_half(p1), 300);
    assert_eq!(s.minutes_second_half(p1), 0);
}

#[test]
fn minutes_partition_the_period() {
    let (roster, ids) = squad(5, 3);
    let fh = Period::FirstHalf;
    let mut clock = Clock::new();
    clock.start_period(fh).unwrap();
    clock.tick(1200);
    let mut ledger = Ledger::new();
    push(&mut ledger, &clock, substitution(fh, 200, ids[0], ids[5]));
    push(&mut ledger, &clock, substitution(fh, 400, ids[1], ids[6]));
    push(&mut ledger, &clock, substitution(fh, 500, ids[5], ids[0]));
    push(&mut ledger, &clock, substitution(fh, 900, ids[2], ids[7]));
    push(&mut ledger, &clock, substitution(fh, 1000, ids[6], ids[1]));
    close(&mut clock);

    let s = compute_snapshot(&ledger, &clock, &roster).unwrap();
    let duration = 1200;
    for id in &ids {
        assert!(s.minutes_first_half(*id) <= duration);
    }
    let total: u32 = ids.iter().map(|id| s.minutes_first_half(*id)).sum();
    assert_eq!(total, 5 * duration);
    assert_eq!(s.minutes(ids[0]), 200 + 700);
    assert_eq!(s.minutes(ids[5]), 300);
}

#[test]
fn lineup_carries_over_into_next_period() {
    let (roster, ids) = squad(1, 1);
    let (p1, p2) = (ids[0], ids[1]);
    let mut clock = Clock::new();
    clock.start_period(Period::FirstHalf).unwrap();
    clock.tick(600);
    let mut ledger = Ledger::new();
    push(&mut ledger, &clock, substitution(Period::FirstHalf, 400, p1, p2));
    close(&mut clock);
    clock.start_period(Period::SecondHalf).unwrap();
    clock.tick(250);

    let s = compute_snapshot(&ledger, &clock, &roster).unwrap();
    assert_eq!(s.minutes_first_half(p2), 200);
    // open period counts up to the elapsed time so far
    assert_eq!(s.minutes_second_half(p2), 250);
    assert_eq!(s.minutes_second_half(p1), 0);
    assert_eq!(s.minutes(p2), 450);
}

#[test]
fn bringing_on_a_player_already_on_court_is_inconsistent() {
    let (roster, ids) = squad(2, 1);
    let mut clock = Clock::new();
    clock.start_period(Period::FirstHalf).unwrap();
    clock.tick(600);
    let mut ledger = Ledger::new();
    push(&mut ledger, &clock, substitution(Period::FirstHalf, 100, ids[0], ids[1]));

    let err = compute_snapshot(&ledger, &clock, &roster).unwrap_err();
    assert_eq!(
        err,
        MatchError::InconsistentSubstitution {
            player: ids[1],
            period: Period::FirstHalf,
            at: 100
        }
    );
}

#[test]
fn taking_off_a_player_not_on_court_is_inconsistent() {
    let (roster, ids) = squad(1, 2);
    let mut clock = Clock::new();
    clock.start_period(Period::FirstHalf).unwrap();
    clock.tick(600);
    let mut ledger = Ledger::new();
    push(&mut ledger, &clock, substitution(Period::FirstHalf, 100, ids[1], ids[2]));

    assert!(matches!(
        compute_snapshot(&ledger, &clock, &roster),
        Err(MatchError::InconsistentSubstitution { .. })
    ));
}

#[test]
fn snapshot_is_deterministic() {
    let (roster, ids) = squad(3, 2);
    let mut clock = Clock::new();
    clock.start_period(Period::FirstHalf).unwrap();
    clock.tick(700);
    let mut ledger = Ledger::new();
    push(&mut ledger, &clock, substitution(Period::FirstHalf, 100, ids[0], ids[3]));
    push(&mut ledger, &clock, event(EventKind::Goal, Period::FirstHalf, 300, Some(ids[3]), TeamSide::Own));

    let a = compute_snapshot(&ledger, &clock, &roster).unwrap();
    let b = compute_snapshot(&ledger, &clock, &roster).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn bench_players_show_zero_minutes() {
    let (roster, ids) = squad(1, 1);
    let mut clock = Clock::new();
    clock.start_period(Period::FirstHalf).unwrap();
    clock.tick(60);
    let s = compute_snapshot(&Ledger::new(), &clock, &roster).unwrap();
    assert_eq!(s.per_player_minutes.get(&ids[1]), Some(&0));
    assert_eq!(s.minutes(ids[0]), 60);
}
