//! Access levels for repository operations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level granted to a client for a repository.
///
/// Levels are ordered: NoAccess < ReadOnly < ReadWrite < Admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessLevel {
    /// No access at all.
    NoAccess,
    /// Can read repository contents (clone, fetch, archive).
    ReadOnly,
    /// Can read and write (push).
    ReadWrite,
    /// Full control including settings and deletion.
    Admin,
}

impl AccessLevel {
    /// Check if this level grants at least the required level.
    pub fn has(&self, required: AccessLevel) -> bool {
        *self >= required
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "no-access" | "none" => Ok(AccessLevel::NoAccess),
            "read-only" | "read" => Ok(AccessLevel::ReadOnly),
            "read-write" | "write" => Ok(AccessLevel::ReadWrite),
            "admin" => Ok(AccessLevel::Admin),
            other => Err(format!("unknown access level: {other}")),
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::NoAccess => write!(f, "no-access"),
            AccessLevel::ReadOnly => write!(f, "read-only"),
            AccessLevel::ReadWrite => write!(f, "read-write"),
            AccessLevel::Admin => write!(f, "admin"),
        }
    }
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::ReadOnly
    }
}
