use std::fmt::Display;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

const MS_IN_MINUTE: u64 = 60 * 1000;

/// Largest threshold accepted when clamping. A day of silence is AFK no matter what.
pub const MAX_THRESHOLD_MINUTES: u32 = 24 * 60;

/// Duration of inactivity after which elapsed time stops counting as active.
/// Always a positive whole number of minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleThreshold {
    threshold_ms: u64,
}

impl IdleThreshold {
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        if minutes == 0 {
            None
        } else {
            Some(Self {
                threshold_ms: minutes as u64 * MS_IN_MINUTE,
            })
        }
    }

    pub fn as_millis(&self) -> u64 {
        self.threshold_ms
    }

    pub fn minutes(&self) -> u64 {
        self.threshold_ms / MS_IN_MINUTE
    }

    /// Parses user input (minutes) according to `policy`.
    pub fn parse_with(input: &str, policy: ThresholdPolicy) -> Result<Self> {
        let input = input.trim();
        let minutes: i64 = input
            .parse()
            .map_err(|_| anyhow!("Idle threshold must be a whole number of minutes, got {input:?}"))?;
        let minutes = match policy {
            ThresholdPolicy::Reject => {
                if minutes < 1 || minutes > MAX_THRESHOLD_MINUTES as i64 {
                    bail!("Idle threshold must be between 1 and {MAX_THRESHOLD_MINUTES} minutes");
                }
                minutes as u32
            }
            ThresholdPolicy::Clamp => minutes.clamp(1, MAX_THRESHOLD_MINUTES as i64) as u32,
        };
        Self::from_minutes(minutes).ok_or_else(|| anyhow!("Idle threshold must be positive"))
    }
}

impl Default for IdleThreshold {
    fn default() -> Self {
        Self {
            threshold_ms: 5 * MS_IN_MINUTE,
        }
    }
}

impl Display for IdleThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} min", self.minutes())
    }
}

/// What happens to out of range threshold input. Input that isn't a number is always rejected
/// and the previous threshold stays in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdPolicy {
    #[default]
    Reject,
    Clamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minutes() {
        assert_eq!(IdleThreshold::from_minutes(5).unwrap().as_millis(), 300_000);
        assert!(IdleThreshold::from_minutes(0).is_none());
        assert_eq!(IdleThreshold::default().minutes(), 5);
    }

    #[test]
    fn test_parse_reject() {
        let policy = ThresholdPolicy::Reject;
        assert_eq!(IdleThreshold::parse_with(" 2 ", policy).unwrap().minutes(), 2);
        assert!(IdleThreshold::parse_with("0", policy).is_err());
        assert!(IdleThreshold::parse_with("-3", policy).is_err());
        assert!(IdleThreshold::parse_with("5000", policy).is_err());
        assert!(IdleThreshold::parse_with("abc", policy).is_err());
    }

    #[test]
    fn test_parse_clamp() {
        let policy = ThresholdPolicy::Clamp;
        assert_eq!(IdleThreshold::parse_with("0", policy).unwrap().minutes(), 1);
        assert_eq!(
            IdleThreshold::parse_with("5000", policy).unwrap().minutes(),
            MAX_THRESHOLD_MINUTES as u64
        );
        assert!(IdleThreshold::parse_with("five", policy).is_err());
    }
}
