//! Roster: players known to a match and which side they play for.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Unique identifier for a player (used in events and lookups).
pub type PlayerId = Uuid;

/// Which side of the match an event concerns or credits.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    /// The coach's own team.
    #[default]
    Own,
    Opponent,
}

impl TeamSide {
    pub fn opposite(self) -> Self {
        match self {
            TeamSide::Own => TeamSide::Opponent,
            TeamSide::Opponent => TeamSide::Own,
        }
    }
}

impl std::fmt::Display for TeamSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamSide::Own => write!(f, "own"),
            TeamSide::Opponent => write!(f, "opponent"),
        }
    }
}

/// One player as supplied by the roster provider.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    #[serde(default)]
    pub shirt_number: Option<u8>,
    #[serde(default)]
    pub side: TeamSide,
    /// On court when the first period starts.
    #[serde(default)]
    pub starter: bool,
}

impl RosterEntry {
    pub fn new(name: impl Into<String>, side: TeamSide) -> Self {
        Self {
            name: name.into().trim().to_string(),
            shirt_number: None,
            side,
            starter: false,
        }
    }

    pub fn with_shirt_number(mut self, number: u8) -> Self {
        self.shirt_number = Some(number);
        self
    }

    pub fn starting(mut self) -> Self {
        self.starter = true;
        self
    }
}

/// Read-only roster snapshot for one match. The core never mutates it after hydration.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    players: BTreeMap<PlayerId, RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a player under a fresh id and return the id.
    pub fn add(&mut self, entry: RosterEntry) -> PlayerId {
        let id = Uuid::new_v4();
        self.players.insert(id, entry);
        id
    }

    /// Insert a player under a known id (e.g. from the roster provider).
    pub fn insert(&mut self, id: PlayerId, entry: RosterEntry) {
        self.players.insert(id, entry);
    }

    pub fn get(&self, id: PlayerId) -> Option<&RosterEntry> {
        self.players.get(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    pub fn side_of(&self, id: PlayerId) -> Option<TeamSide> {
        self.players.get(&id).map(|p| p.side)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Players on court at the first kickoff, in id order.
    pub fn starters(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players
            .iter()
            .filter(|(_, p)| p.starter)
            .map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &RosterEntry)> {
        self.players.iter().map(|(id, p)| (*id, p))
    }

    /// Ids whose name matches `name` (trimmed, ASCII case-insensitive).
    pub fn find_by_name(&self, name: &str) -> Vec<PlayerId> {
        let name = name.trim();
        self.players
            .iter()
            .filter(|(_, p)| p.name.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id)
            .collect()
    }
}

impl FromIterator<(PlayerId, RosterEntry)> for Roster {
    fn from_iter<I: IntoIterator<Item = (PlayerId, RosterEntry)>>(iter: I) -> Self {
        Self {
            players: iter.into_iter().collect(),
        }
    }
}
