//! Tests for parsing pasted player times and for the role checks guarding commands.

use futsal_match_web::{
    authorize, import_player_times, parse_player_times, permits, resolve_player_times, Command,
    ImportError, ImportFormat, KnownMinutes, MatchError, PlayerTime, Role, Roster, RosterEntry,
    TeamSide,
};

fn pt(name: &str, seconds: u32) -> PlayerTime {
    PlayerTime {
        name: name.to_string(),
        seconds,
    }
}

#[test]
fn strict_format_reads_one_entry_per_line() {
    let text = "Ana:12:30\n\n  Bruno : 5:00  \nDe:Jong:0:45\n";
    let entries = parse_player_times(text, ImportFormat::Strict).unwrap();
    assert_eq!(
        entries,
        vec![pt("Ana", 750), pt("Bruno", 300), pt("De:Jong", 45)]
    );
}

#[test]
fn permissive_format_accepts_commas_and_separators() {
    let text = "Ana Maria 12:30, Bruno: 05:00\nCarla - 7:05,,\nDiego:1:00";
    let entries = parse_player_times(text, ImportFormat::Permissive).unwrap();
    assert_eq!(
        entries,
        vec![
            pt("Ana Maria", 750),
            pt("Bruno", 300),
            pt("Carla", 425),
            pt("Diego", 60),
        ]
    );
}

#[test]
fn bad_times_are_rejected_with_line_number() {
    assert!(matches!(
        parse_player_times("Ana:1:00\nBruno:12:75", ImportFormat::Strict),
        Err(ImportError::BadTime { line: 2, .. })
    ));
    assert!(matches!(
        parse_player_times("Ana:12:5", ImportFormat::Strict),
        Err(ImportError::BadTime { line: 1, .. })
    ));
    assert!(matches!(
        parse_player_times("Ana:ten:00", ImportFormat::Strict),
        Err(ImportError::BadTime { .. })
    ));
}

#[test]
fn signed_times_are_rejected() {
    for text in ["Ana:+1:05", "Ana:1:+5", "Ana:-1:05"] {
        assert!(
            matches!(
                parse_player_times(text, ImportFormat::Strict),
                Err(ImportError::BadTime { line: 1, .. })
            ),
            "{text} should not parse"
        );
    }
    assert!(matches!(
        parse_player_times("Ana 1:+5", ImportFormat::Permissive),
        Err(ImportError::BadTime { .. })
    ));
}

#[test]
fn entries_without_a_time_are_malformed() {
    assert!(matches!(
        parse_player_times("Ana:1:00\nBruno 12", ImportFormat::Strict),
        Err(ImportError::Malformed { line: 2, .. })
    ));
    assert!(matches!(
        parse_player_times(":10:00", ImportFormat::Strict),
        Err(ImportError::Malformed { .. })
    ));
    assert!(matches!(
        parse_player_times("Ana", ImportFormat::Permissive),
        Err(ImportError::Malformed { .. })
    ));
}

#[test]
fn blank_input_is_empty() {
    assert!(matches!(
        parse_player_times("  \n\n", ImportFormat::Strict),
        Err(ImportError::Empty)
    ));
    assert!(matches!(
        parse_player_times(" , ,", ImportFormat::Permissive),
        Err(ImportError::Empty)
    ));
}

#[test]
fn names_resolve_case_insensitively() {
    let mut roster = Roster::new();
    let ana = roster.add(RosterEntry::new("Ana", TeamSide::Own));
    let bruno = roster.add(RosterEntry::new("Bruno", TeamSide::Own));

    let resolved = resolve_player_times(&[pt(" ana ", 600), pt("BRUNO", 30)], &roster).unwrap();
    assert_eq!(
        resolved,
        vec![
            KnownMinutes {
                player: ana,
                seconds: 600
            },
            KnownMinutes {
                player: bruno,
                seconds: 30
            },
        ]
    );
}

#[test]
fn unknown_or_ambiguous_names_fail_the_whole_import() {
    let mut roster = Roster::new();
    roster.add(RosterEntry::new("Ana", TeamSide::Own));
    roster.add(RosterEntry::new("ANA", TeamSide::Opponent));
    roster.add(RosterEntry::new("Bruno", TeamSide::Own));

    assert!(matches!(
        resolve_player_times(&[pt("Bruno", 10), pt("Zoe", 10)], &roster),
        Err(ImportError::UnknownPlayer(name)) if name == "Zoe"
    ));
    assert!(matches!(
        resolve_player_times(&[pt("ana", 10)], &roster),
        Err(ImportError::AmbiguousPlayer(_))
    ));
}

#[test]
fn import_builds_set_known_minutes_command() {
    let mut roster = Roster::new();
    let diego = roster.add(RosterEntry::new("Diego", TeamSide::Own));
    let command = import_player_times("Diego:25:00", ImportFormat::Strict, &roster).unwrap();
    assert_eq!(
        command,
        Command::SetKnownMinutes {
            minutes: vec![KnownMinutes {
                player: diego,
                seconds: 1500
            }]
        }
    );
}

#[test]
fn roles_gate_commands() {
    let import = Command::SetKnownMinutes { minutes: vec![] };
    assert!(!permits(Role::Viewer, &Command::StartClock));
    assert!(permits(Role::Coach, &Command::StartClock));
    assert!(permits(Role::Coach, &Command::UndoLastEvent));
    assert!(!permits(Role::Coach, &import));
    assert!(permits(Role::Admin, &import));

    assert_eq!(
        authorize(Role::Coach, &import),
        Err(MatchError::Forbidden {
            role: "coach".to_string(),
            action: "set_known_minutes"
        })
    );
    assert!(authorize(Role::Admin, &Command::FinalizeMatch).is_ok());
}

#[test]
fn roles_parse_from_header_values() {
    assert_eq!(" Coach ".parse::<Role>(), Ok(Role::Coach));
    assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
    assert!("referee".parse::<Role>().is_err());
    assert_eq!(Role::default(), Role::Viewer);
}
