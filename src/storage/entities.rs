use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A completed tracking session. Once appended to a daily log it is never modified.
#[derive(PartialEq, Debug, Serialize, Deserialize, Clone)]
pub struct SessionLogEntry {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Hours classified as active.
    pub active: f64,
    /// Hours classified as AFK.
    pub afk: f64,
}

/// Committed active and AFK hours for a set of log entries.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct LogTotals {
    pub active: f64,
    pub afk: f64,
}

impl LogTotals {
    pub fn of<'a>(entries: impl IntoIterator<Item = &'a SessionLogEntry>) -> Self {
        entries.into_iter().fold(Self::default(), |acc, entry| Self {
            active: acc.active + entry.active,
            afk: acc.afk + entry.afk,
        })
    }

    pub fn total(&self) -> f64 {
        self.active + self.afk
    }
}

impl std::ops::Add for LogTotals {
    type Output = LogTotals;

    fn add(self, rhs: Self) -> Self::Output {
        LogTotals {
            active: self.active + rhs.active,
            afk: self.afk + rhs.afk,
        }
    }
}
