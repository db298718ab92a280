use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{storage::entities::SessionLogEntry, utils::time::format_clock};

use super::threshold::IdleThreshold;

/// Period of the tracker tick in milliseconds. Every tick accounts for exactly this much time.
pub const TICK_MS: u64 = 1000;

const TICK_HOURS: f64 = TICK_MS as f64 / 3_600_000.;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunningSession {
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

/// Classification of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Active,
    Afk {
        /// Set when idle time reached a whole multiple of the threshold. Holds whole idle minutes.
        alert_minutes: Option<u64>,
    },
}

/// Active/idle state machine of a single display surface.
///
/// The tracker is either idle or running. While running every tick is classified as active or
/// AFK depending on how long ago the last activity was seen. Time is always passed in explicitly,
/// scheduling the ticks is the job of [Ticker](super::ticker::Ticker).
#[derive(Debug, Clone)]
pub struct SessionTracker {
    running: Option<RunningSession>,
    idle_ms: u64,
    active_hours: f64,
    afk_hours: f64,
    threshold: IdleThreshold,
}

impl SessionTracker {
    pub fn new(threshold: IdleThreshold) -> Self {
        Self {
            running: None,
            idle_ms: 0,
            active_hours: 0.,
            afk_hours: 0.,
            threshold,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn active_hours(&self) -> f64 {
        self.active_hours
    }

    pub fn afk_hours(&self) -> f64 {
        self.afk_hours
    }

    pub fn idle_ms(&self) -> u64 {
        self.idle_ms
    }

    pub fn threshold(&self) -> IdleThreshold {
        self.threshold
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.running.map(|v| v.started_at)
    }

    /// Starts a new session. A session that is already running is stopped first, its entry is
    /// returned so it can still be saved.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<SessionLogEntry> {
        let previous = self.stop(now);
        self.clear_counters();
        self.running = Some(RunningSession {
            started_at: now,
            last_activity_at: now,
        });
        info!("Session started at {now}");
        previous
    }

    /// Stops the running session. Returns an entry only if the session accumulated any time.
    /// Stopping an idle tracker does nothing.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<SessionLogEntry> {
        let running = self.running.take()?;
        info!(
            "Session stopped at {now}, active {:.4}h, afk {:.4}h",
            self.active_hours, self.afk_hours
        );

        if self.active_hours + self.afk_hours > 0. {
            Some(SessionLogEntry {
                start: running.started_at,
                end: now,
                active: self.active_hours,
                afk: self.afk_hours,
            })
        } else {
            debug!("Session had no ticks, nothing to log");
            None
        }
    }

    /// Stops the running session (if any) and clears the counters. Does not start a new session.
    pub fn reset(&mut self, now: DateTime<Utc>) -> Option<SessionLogEntry> {
        let entry = self.stop(now);
        self.clear_counters();
        entry
    }

    /// Registers user activity. Ignored while idle.
    pub fn record_activity(&mut self, now: DateTime<Utc>) {
        if let Some(running) = self.running.as_mut() {
            running.last_activity_at = now;
            self.idle_ms = 0;
        }
    }

    /// Takes effect from the next tick, already accumulated time stays as is.
    pub fn set_idle_threshold(&mut self, threshold: IdleThreshold) {
        info!("Idle threshold changed to {threshold}");
        self.threshold = threshold;
    }

    /// Accounts for one tick. Returns [None] while idle.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<TickOutcome> {
        let running = self.running?;
        let delta = (now - running.last_activity_at).num_milliseconds();

        if delta > self.threshold.as_millis() as i64 {
            self.idle_ms += TICK_MS;
            self.afk_hours += TICK_HOURS;
            let alert_minutes = (self.idle_ms % self.threshold.as_millis() == 0)
                .then_some(self.idle_ms / 60_000);
            Some(TickOutcome::Afk { alert_minutes })
        } else {
            self.active_hours += TICK_HOURS;
            self.idle_ms = 0;
            Some(TickOutcome::Active)
        }
    }

    /// Active time formatted as `HH:MM:SS`.
    pub fn active_clock(&self) -> String {
        format_clock(self.active_hours)
    }

    /// AFK time formatted as `HH:MM:SS`.
    pub fn afk_clock(&self) -> String {
        format_clock(self.afk_hours)
    }

    fn clear_counters(&mut self) {
        self.idle_ms = 0;
        self.active_hours = 0.;
        self.afk_hours = 0.;
    }
}
