use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{storage::document::JsonDocument, tracker::threshold::ThresholdPolicy};

pub const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_SECTION_LABELS: [&str; 6] = [
    "Study GS",
    "CSAT Practice",
    "Revision",
    "Mock Test",
    "Breaks",
    "Notes",
];

/// User configuration stored in `config.json` inside the application directory. Every field is
/// optional in the file, command line flags take precedence over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub daily_goal_hours: f64,
    pub idle_threshold_minutes: u32,
    pub threshold_policy: ThresholdPolicy,
    /// Date the countdown counts towards.
    pub target_date: Option<NaiveDate>,
    /// Rows of the todo grid.
    pub section_labels: Vec<String>,
    /// Where exports are written. Current directory when empty.
    pub export_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_goal_hours: 8.,
            idle_threshold_minutes: 5,
            threshold_policy: ThresholdPolicy::Reject,
            target_date: NaiveDate::from_ymd_opt(2026, 5, 24),
            section_labels: DEFAULT_SECTION_LABELS.map(String::from).to_vec(),
            export_dir: None,
        }
    }
}

pub fn settings_document(app_dir: &Path) -> JsonDocument<Settings> {
    JsonDocument::new(app_dir.join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    use super::{settings_document, Settings};
    use crate::tracker::threshold::ThresholdPolicy;

    #[tokio::test]
    async fn test_partial_config_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            dir.path().join("config.json"),
            r#"{ "daily_goal_hours": 6.5, "threshold_policy": "clamp" }"#,
        )?;

        let settings = settings_document(dir.path()).load().await;
        assert_eq!(settings.daily_goal_hours, 6.5);
        assert_eq!(settings.threshold_policy, ThresholdPolicy::Clamp);
        assert_eq!(settings.idle_threshold_minutes, 5);
        assert_eq!(settings.section_labels.len(), 6);
        Ok(())
    }

    #[tokio::test]
    async fn test_countdown_target_has_default() -> Result<()> {
        let dir = tempdir()?;
        let settings = settings_document(dir.path()).load().await;
        assert_eq!(settings.target_date, NaiveDate::from_ymd_opt(2026, 5, 24));

        std::fs::write(dir.path().join("config.json"), r#"{ "target_date": null }"#)?;
        assert_eq!(settings_document(dir.path()).load().await.target_date, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_config_is_default() {
        let dir = tempdir().unwrap();
        assert_eq!(settings_document(dir.path()).load().await, Settings::default());
    }
}
