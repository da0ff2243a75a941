//! Access levels and the per-request session context used to gate writes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ordered permission tiers; a higher level implies every lower one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Viewer = 1,
    Operator = 2,
    Admin = 3,
    Owner = 4,
}

impl AccessLevel {
    pub const ALL: [AccessLevel; 4] = [Self::Viewer, Self::Operator, Self::Admin, Self::Owner];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Viewer => "Viewer",
            Self::Operator => "Operator",
            Self::Admin => "Admin",
            Self::Owner => "Owner",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Viewer => "閲覧者",
            Self::Operator => "運用者",
            Self::Admin => "管理者",
            Self::Owner => "統制管理者／所有者",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown access level '{0}'; expected one of viewer, operator, admin, owner")]
pub struct ParseAccessLevelError(pub String);

impl FromStr for AccessLevel {
    type Err = ParseAccessLevelError;

    /// Accepts the level name in any case, or its numeric rank.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|level| {
                level.name().eq_ignore_ascii_case(needle) || level.level().to_string() == needle
            })
            .ok_or_else(|| ParseAccessLevelError(s.to_string()))
    }
}

/// Who is performing an operation. `None` means nobody is logged in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionContext {
    level: Option<AccessLevel>,
}

impl SessionContext {
    pub fn new(level: AccessLevel) -> Self {
        Self { level: Some(level) }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn level(&self) -> Option<AccessLevel> {
        self.level
    }

    pub fn has_permission(
        &self,
        required: AccessLevel,
    ) -> bool {
        self.level.is_some_and(|level| level >= required)
    }
}

impl From<Option<AccessLevel>> for SessionContext {
    fn from(level: Option<AccessLevel>) -> Self {
        Self { level }
    }
}
