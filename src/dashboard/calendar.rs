use std::{collections::BTreeMap, fmt::Write, str::FromStr};

use anyhow::{anyhow, Context};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::utils::{percentage::Percentage, time::date_range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayMark {
    #[serde(rename = "p")]
    Productive,
    #[serde(rename = "w")]
    Wasted,
}

impl DayMark {
    pub fn label(&self) -> &'static str {
        match self {
            DayMark::Productive => "Productive",
            DayMark::Wasted => "Wasted",
        }
    }

    fn symbol(&self) -> char {
        match self {
            DayMark::Productive => 'P',
            DayMark::Wasted => 'W',
        }
    }
}

/// Days the user marked by hand, stored as `{"YYYY-MM-DD": "p" | "w"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarMarks(BTreeMap<NaiveDate, DayMark>);

impl CalendarMarks {
    pub fn get(&self, date: NaiveDate) -> Option<DayMark> {
        self.0.get(&date).copied()
    }

    /// Cycles a day through unmarked, productive and wasted. Returns the new mark.
    pub fn toggle(&mut self, date: NaiveDate) -> Option<DayMark> {
        let next = match self.get(date) {
            None => Some(DayMark::Productive),
            Some(DayMark::Productive) => Some(DayMark::Wasted),
            Some(DayMark::Wasted) => None,
        };
        match next {
            Some(mark) => self.0.insert(date, mark),
            None => self.0.remove(&date),
        };
        next
    }

    /// Share of productive days among the `days` days that end with `end`.
    pub fn productive_share(&self, end: NaiveDate, days: u32) -> Percentage {
        if days == 0 {
            return Percentage::of_clamped(0., 0.);
        }
        let start = end - Duration::days(days as i64 - 1);
        let productive = date_range(start, end)
            .filter(|day| self.get(*day) == Some(DayMark::Productive))
            .count();
        Percentage::of_clamped(productive as f64, days as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Moves by a number of months, crossing year boundaries as needed. Fails when the result
    /// falls outside of the supported calendar.
    pub fn shift(self, months: i32) -> anyhow::Result<Self> {
        let index = (self.year as i64 * 12 + self.month as i64 - 1) + months as i64;
        let year = i32::try_from(index.div_euclid(12))
            .map_err(|_| anyhow!("Can't shift {self:?} by {months} months"))?;
        let value = Self {
            year,
            month: index.rem_euclid(12) as u32 + 1,
        };
        value
            .first_day()
            .map(|_| value)
            .ok_or_else(|| anyhow!("Can't shift {self:?} by {months} months"))
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days_in_month(&self) -> u32 {
        let next = self.shift(1).ok().and_then(|v| v.first_day());
        match (self.first_day(), next) {
            (Some(first), Some(next)) => (next - first).num_days() as u32,
            _ => 0,
        }
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| anyhow!("Expected a month as YYYY-MM, got {s:?}"))?;
        let value = Self {
            year: year.parse().with_context(|| format!("Invalid year in {s:?}"))?,
            month: month.parse().with_context(|| format!("Invalid month in {s:?}"))?,
        };
        value
            .first_day()
            .map(|_| value)
            .ok_or_else(|| anyhow!("{s:?} is not a valid month"))
    }
}

/// Renders a Sunday-first month grid. Marked days carry `P` or `W` next to the day number.
pub fn render_month(month: YearMonth, marks: &CalendarMarks) -> String {
    let mut out = String::new();
    let Some(first) = month.first_day() else {
        return out;
    };

    let _ = writeln!(out, "{:^27}", first.format("%B %Y").to_string());
    out.push_str("Su  Mo  Tu  We  Th  Fr  Sa\n");

    let offset = first.weekday().num_days_from_sunday() as usize;
    let mut cells = vec!["   ".to_string(); offset];
    for day in 1..=month.days_in_month() {
        let date = first + Duration::days(day as i64 - 1);
        let mark = marks.get(date).map_or(' ', |m| m.symbol());
        cells.push(format!("{day:>2}{mark}"));
    }

    for week in cells.chunks(7) {
        out.push_str(week.join(" ").trim_end());
        out.push('\n');
    }
    out
}
