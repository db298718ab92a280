use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime};

pub const TARGET_REACHED: &str = "Target day!";

/// The countdown runs until local midnight at the start of the target date.
pub fn target_moment(date: NaiveDate) -> Result<DateTime<Local>> {
    date.and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| anyhow!("Midnight of {date} doesn't exist in the local timezone"))
}

/// Formats time left as `<d>d <h>h <m>m <s>s`, or as whole hours when `total_hours` is set.
pub fn format_remaining(remaining: Duration, total_hours: bool) -> String {
    if remaining <= Duration::zero() {
        return TARGET_REACHED.to_string();
    }

    if total_hours {
        return format!("{} total hours left", remaining.num_hours());
    }

    format!(
        "{}d {}h {}m {}s",
        remaining.num_days(),
        remaining.num_hours() % 24,
        remaining.num_minutes() % 60,
        remaining.num_seconds() % 60
    )
}
