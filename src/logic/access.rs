//! Role checks consulted before a command reaches a match controller.

use crate::logic::controller::Command;
use crate::models::MatchError;
use serde::{Deserialize, Serialize};

/// Capability level of the caller, supplied by whoever authenticated them.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access to matches.
    #[default]
    Viewer,
    /// Runs live matches.
    Coach,
    /// Coach rights plus bulk corrections.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Viewer => write!(f, "viewer"),
            Role::Coach => write!(f, "coach"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "coach" => Ok(Role::Coach),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

/// Whether `role` may issue `command`.
pub fn permits(role: Role, command: &Command) -> bool {
    match (role, command) {
        (Role::Viewer, _) => false,
        (Role::Coach, Command::SetKnownMinutes { .. }) => false,
        (Role::Coach | Role::Admin, _) => true,
    }
}

pub fn authorize(role: Role, command: &Command) -> Result<(), MatchError> {
    if permits(role, command) {
        Ok(())
    } else {
        Err(MatchError::Forbidden {
            role: role.to_string(),
            action: command.name(),
        })
    }
}
