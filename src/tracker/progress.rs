use crate::{
    storage::entities::{LogTotals, SessionLogEntry},
    utils::{percentage::Percentage, time::format_hours},
};

/// Progress of committed active time towards the daily goal.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyProgress {
    pub percent: Percentage,
    pub summary: String,
}

impl DailyProgress {
    /// Only committed sessions count. The session that is currently running is left out until
    /// it's stopped.
    pub fn compute(log: &[SessionLogEntry], goal_hours: f64) -> Self {
        let active = LogTotals::of(log).active;
        Self {
            percent: Percentage::of_clamped(active, goal_hours),
            summary: format!(
                "{} / {} hours active today",
                format_hours(active),
                goal_hours
            ),
        }
    }
}

/// Committed active and AFK time of a day, formatted as `<h>h <m>m`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotals {
    pub active: String,
    pub afk: String,
}

impl DailyTotals {
    pub fn compute(log: &[SessionLogEntry]) -> Self {
        let totals = LogTotals::of(log);
        Self {
            active: format_hours(totals.active),
            afk: format_hours(totals.afk),
        }
    }
}
