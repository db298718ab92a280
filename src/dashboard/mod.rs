//! Views of the dashboard that live next to the tracker: a countdown to a target date, a calendar
//! of productive and wasted days, a per-day todo grid, and activity reports built from the daily
//! session logs.

pub mod calendar;
pub mod countdown;
pub mod report;
pub mod todo;
