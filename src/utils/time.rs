use chrono::{NaiveDate, ParseResult};

/// This is the standard way of converting a date to a string in focuslog. Daily logs, calendar
/// marks and todo entries are all keyed by it.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn record_name_to_date(name: &str) -> ParseResult<NaiveDate> {
    NaiveDate::parse_from_str(name, "%Y-%m-%d")
}

/// Hours are accumulated as floats, so they are snapped to whole seconds before display.
fn hours_to_seconds(hours: f64) -> u64 {
    if hours.is_finite() && hours > 0. {
        (hours * 3600.).round() as u64
    } else {
        0
    }
}

/// Formats hours as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_clock(hours: f64) -> String {
    let seconds = hours_to_seconds(hours);
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Formats hours as `<h>h <m>m`, dropping seconds.
pub fn format_hours(hours: f64) -> String {
    let seconds = hours_to_seconds(hours);
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

/// Returns dates between start (inclusive) and end (inclusive).
pub fn date_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}
