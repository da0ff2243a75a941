use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when an operator slot number falls outside `1..=5`.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("operator id must be between 1 and {max}, got {0}", max = OperatorId::MAX)]
pub struct InvalidOperatorId(pub i64);

/// One of the fixed calculator slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct OperatorId(u8);

impl OperatorId {
    /// Number of concurrent calculator slots.
    pub const MAX: u8 = 5;

    pub fn new(id: u8) -> Option<Self> {
        (1..=Self::MAX).contains(&id).then_some(Self(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Every slot in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=Self::MAX).map(Self)
    }

    pub(crate) fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl TryFrom<i64> for OperatorId {
    type Error = InvalidOperatorId;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(InvalidOperatorId(value))
    }
}

impl From<OperatorId> for i64 {
    fn from(id: OperatorId) -> Self {
        i64::from(id.0)
    }
}

impl fmt::Display for OperatorId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-operator rates, in currency per combined unit.
///
/// A missing record behaves exactly like the default (both rates 0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSettings {
    pub commission_rate: i64,
    pub ap_rate: i64,
}

impl OperatorSettings {
    pub fn new(
        commission_rate: i64,
        ap_rate: i64,
    ) -> Self {
        Self {
            commission_rate,
            ap_rate,
        }
    }

    /// Negative rates are never meaningful; they collapse to 0.
    pub fn clamped(self) -> Self {
        Self {
            commission_rate: self.commission_rate.max(0),
            ap_rate: self.ap_rate.max(0),
        }
    }
}

/// A persisted settings row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSettingsRecord {
    pub operator_id: OperatorId,
    pub settings: OperatorSettings,
    pub updated_at: DateTime<Utc>,
}
