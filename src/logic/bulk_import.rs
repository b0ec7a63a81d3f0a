//! Bulk import of pasted player times (`Name:mm:ss`) into resolved `(player, seconds)` pairs.
//!
//! Runs at the edge of the core: nothing here touches a match. The result is a
//! `SetKnownMinutes` command the caller applies like any other.

use crate::logic::controller::{Command, KnownMinutes};
use crate::models::Roster;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted layouts for pasted text.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportFormat {
    /// One `Name:mm:ss` per line.
    #[default]
    Strict,
    /// Entries separated by commas or newlines; `Name mm:ss`, `Name: mm:ss`, `Name - mm:ss`.
    Permissive,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Line {line}: cannot read {entry:?} as name and mm:ss")]
    Malformed { line: usize, entry: String },
    #[error("Line {line}: {time:?} is not a valid mm:ss time")]
    BadTime { line: usize, time: String },
    #[error("No player named {0:?} in the roster")]
    UnknownPlayer(String),
    #[error("More than one player is named {0:?}")]
    AmbiguousPlayer(String),
    #[error("Nothing to import")]
    Empty,
    #[error("Could not read input: {0}")]
    Csv(#[from] csv::Error),
}

/// A parsed entry before name resolution.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerTime {
    pub name: String,
    pub seconds: u32,
}

/// Split pasted text into name/time pairs.
pub fn parse_player_times(text: &str, format: ImportFormat) -> Result<Vec<PlayerTime>, ImportError> {
    let entries = match format {
        ImportFormat::Strict => parse_strict(text)?,
        ImportFormat::Permissive => parse_permissive(text)?,
    };
    if entries.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(entries)
}

fn parse_strict(text: &str) -> Result<Vec<PlayerTime>, ImportError> {
    text.lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| parse_colon_entry(i + 1, l.trim()))
        .collect()
}

fn parse_permissive(text: &str) -> Result<Vec<PlayerTime>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let mut out = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map_or(i + 1, |p| p.line() as usize);
        for field in record.iter().filter(|f| !f.is_empty()) {
            out.push(parse_loose_entry(line, field)?);
        }
    }
    Ok(out)
}

/// `Name:mm:ss`; the name itself may contain colons.
fn parse_colon_entry(line: usize, entry: &str) -> Result<PlayerTime, ImportError> {
    let mut parts = entry.rsplitn(3, ':');
    let (Some(ss), Some(mm), Some(name)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(ImportError::Malformed {
            line,
            entry: entry.to_string(),
        });
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(ImportError::Malformed {
            line,
            entry: entry.to_string(),
        });
    }
    Ok(PlayerTime {
        name: name.to_string(),
        seconds: parse_time(line, mm.trim(), ss.trim())?,
    })
}

/// `Name mm:ss` with an optional `:` or `-` after the name, or the strict form.
fn parse_loose_entry(line: usize, entry: &str) -> Result<PlayerTime, ImportError> {
    if let Some((name, time)) = entry.rsplit_once(char::is_whitespace) {
        let name = name.trim().trim_end_matches([':', '-']).trim_end();
        let split = time
            .split_once(':')
            .filter(|(mm, _)| !mm.is_empty() && mm.bytes().all(|b| b.is_ascii_digit()));
        if let (false, Some((mm, ss))) = (name.is_empty(), split) {
            return Ok(PlayerTime {
                name: name.to_string(),
                seconds: parse_time(line, mm, ss)?,
            });
        }
    }
    parse_colon_entry(line, entry)
}

fn parse_time(line: usize, mm: &str, ss: &str) -> Result<u32, ImportError> {
    let bad = || ImportError::BadTime {
        line,
        time: format!("{mm}:{ss}"),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(mm) || !digits(ss) {
        return Err(bad());
    }
    let minutes: u32 = mm.parse().map_err(|_| bad())?;
    let seconds: u32 = ss.parse().map_err(|_| bad())?;
    if ss.len() != 2 || seconds >= 60 {
        return Err(bad());
    }
    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(bad)
}

/// Resolve names against the roster (trimmed, ASCII case-insensitive).
///
/// Fails on the first unknown or ambiguous name so nothing is half-applied.
pub fn resolve_player_times(
    entries: &[PlayerTime],
    roster: &Roster,
) -> Result<Vec<KnownMinutes>, ImportError> {
    entries
        .iter()
        .map(|entry| match roster.find_by_name(&entry.name).as_slice() {
            [player] => Ok(KnownMinutes {
                player: *player,
                seconds: entry.seconds,
            }),
            [] => Err(ImportError::UnknownPlayer(entry.name.clone())),
            _ => Err(ImportError::AmbiguousPlayer(entry.name.clone())),
        })
        .collect()
}

/// Parse and resolve pasted text into the command that sets those players' minutes.
pub fn import_player_times(
    text: &str,
    format: ImportFormat,
    roster: &Roster,
) -> Result<Command, ImportError> {
    let entries = parse_player_times(text, format)?;
    let minutes = resolve_player_times(&entries, roster)?;
    log::info!("Resolved {} imported player time(s)", minutes.len());
    Ok(Command::SetKnownMinutes { minutes })
}
