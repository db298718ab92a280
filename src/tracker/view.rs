use super::progress::{DailyProgress, DailyTotals};

/// Semantic color of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTag {
    Active,
    AfkDetected,
    Inactive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Status {
    pub text: &'static str,
    pub tag: StatusTag,
}

impl Status {
    pub const STARTED: Status = Status {
        text: "Session started!",
        tag: StatusTag::Active,
    };
    pub const ACTIVE: Status = Status {
        text: "Active - Keep going!",
        tag: StatusTag::Active,
    };
    pub const AFK: Status = Status {
        text: "AFK Detected!",
        tag: StatusTag::AfkDetected,
    };
    pub const ENDED: Status = Status {
        text: "Session ended",
        tag: StatusTag::Inactive,
    };
    pub const INACTIVE: Status = Status {
        text: "Session inactive",
        tag: StatusTag::Inactive,
    };
}

/// Everything a display surface needs to draw the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub running: bool,
    /// Active time of the current (or last) session, `HH:MM:SS`.
    pub active: String,
    /// AFK time of the current (or last) session, `HH:MM:SS`.
    pub afk: String,
    pub status: Status,
    pub threshold_minutes: u64,
    pub progress: DailyProgress,
    pub totals: DailyTotals,
}

/// Display surface driven by [SessionService](super::service::SessionService).
#[cfg_attr(test, mockall::automock)]
pub trait SessionView {
    /// Redraws the tracker.
    fn render(&mut self, snapshot: &SessionSnapshot);

    /// Shows a one-off message that the user should notice, like an AFK alert.
    fn notice(&mut self, message: &str);
}
