//! Integration tests for the match clock: period lifecycle, pausing and sealing durations.

use futsal_match_web::{Clock, ClockState, MatchError, Period};

fn paused_after(seconds: u32) -> Clock {
    let mut c = Clock::new();
    c.start_period(Period::FirstHalf).unwrap();
    c.tick(seconds);
    c.pause().unwrap();
    c
}

#[test]
fn start_opens_first_half_running_from_zero() {
    let mut c = Clock::new();
    assert_eq!(c.state(), ClockState::Idle);
    c.start_period(Period::FirstHalf).unwrap();
    assert_eq!(c.state(), ClockState::Running(Period::FirstHalf));
    assert_eq!(c.period_elapsed_seconds(), 0);
    assert!(c.is_running());
}

#[test]
fn start_fails_while_a_period_is_open() {
    let mut c = Clock::new();
    c.start_period(Period::FirstHalf).unwrap();
    assert!(matches!(
        c.start_period(Period::SecondHalf),
        Err(MatchError::ClockState { .. })
    ));
}

#[test]
fn start_fails_for_closed_or_out_of_order_period() {
    let mut c = Clock::new();
    assert!(matches!(
        c.start_period(Period::SecondHalf),
        Err(MatchError::ClockState { .. })
    ));

    let mut c = paused_after(60);
    c.close_period().unwrap();
    assert!(matches!(
        c.start_period(Period::FirstHalf),
        Err(MatchError::ClockState { .. })
    ));
    c.start_period(Period::SecondHalf).unwrap();
}

#[test]
fn tick_is_ignored_while_paused() {
    let mut c = Clock::new();
    c.start_period(Period::FirstHalf).unwrap();
    assert!(c.tick(90));
    c.pause().unwrap();
    assert!(!c.tick(30));
    assert_eq!(c.period_elapsed_seconds(), 90);
    c.resume().unwrap();
    assert!(c.tick(10));
    assert_eq!(c.period_elapsed_seconds(), 100);
}

#[test]
fn pause_and_resume_reject_wrong_state() {
    let mut c = Clock::new();
    assert!(c.pause().is_err());
    assert!(c.resume().is_err());
    c.start_period(Period::FirstHalf).unwrap();
    assert!(c.resume().is_err());
    c.pause().unwrap();
    assert!(c.pause().is_err());
}

#[test]
fn close_requires_pause_and_seals_duration() {
    let mut c = Clock::new();
    c.start_period(Period::FirstHalf).unwrap();
    c.tick(1200);
    assert!(matches!(c.close_period(), Err(MatchError::ClockState { .. })));
    assert_eq!(c.closed_duration(Period::FirstHalf), None);
    assert_eq!(c.duration_so_far(Period::FirstHalf), Some(1200));

    c.pause().unwrap();
    assert_eq!(c.close_period().unwrap(), (Period::FirstHalf, 1200));
    assert_eq!(c.closed_duration(Period::FirstHalf), Some(1200));
    assert_eq!(c.state(), ClockState::Idle);
    assert_eq!(c.next_period(), Some(Period::SecondHalf));
}

#[test]
fn close_without_open_period_fails() {
    let mut c = Clock::new();
    assert!(c.close_period().is_err());
}

#[test]
fn total_elapsed_counts_closed_and_open_periods() {
    let mut c = paused_after(1200);
    c.close_period().unwrap();
    c.start_period(Period::SecondHalf).unwrap();
    c.tick(300);
    assert_eq!(c.total_elapsed(), 1500);
    assert_eq!(c.opened_periods().collect::<Vec<_>>(), vec![Period::FirstHalf, Period::SecondHalf]);
}

#[test]
fn finalize_only_between_periods_and_is_terminal() {
    let mut c = Clock::new();
    c.start_period(Period::FirstHalf).unwrap();
    assert!(c.finalize().is_err());
    c.pause().unwrap();
    c.close_period().unwrap();
    c.finalize().unwrap();
    assert_eq!(c.state(), ClockState::MatchFinalized);
    assert!(c.start_period(Period::SecondHalf).is_err());
    assert!(c.finalize().is_err());
}

#[test]
fn no_period_after_extra_time() {
    let mut c = Clock::new();
    for p in Period::ALL {
        c.start_period(p).unwrap();
        c.pause().unwrap();
        c.close_period().unwrap();
    }
    assert_eq!(c.next_period(), None);
}

#[test]
fn total_elapsed_caps_at_u32_max() {
    let mut c = paused_after(u32::MAX);
    c.close_period().unwrap();
    c.start_period(Period::SecondHalf).unwrap();
    assert!(c.tick(10));
    assert!(c.tick(u32::MAX));
    assert_eq!(c.period_elapsed_seconds(), u32::MAX);
    assert_eq!(c.total_elapsed(), u32::MAX);
}
