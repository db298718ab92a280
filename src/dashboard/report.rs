use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use futures::{stream, Stream, StreamExt, TryStreamExt};
use tracing::error;

use crate::{
    storage::{entities::LogTotals, log_storage::LogStorage},
    utils::{percentage::Percentage, time::date_range},
};

/// Committed activity of a single day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayActivity {
    pub date: NaiveDate,
    pub totals: LogTotals,
}

/// Activity over a range of days. Feeds both the split chart (totals) and the per-day series.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityReport {
    pub days: Vec<DayActivity>,
    pub totals: LogTotals,
}

impl ActivityReport {
    pub async fn collect(days: impl Stream<Item = Result<DayActivity>>) -> Result<Self> {
        let days = days.try_collect::<Vec<_>>().await?;
        let totals = days
            .iter()
            .fold(LogTotals::default(), |acc, day| acc + day.totals);
        Ok(Self { days, totals })
    }

    pub fn active_share(&self) -> Percentage {
        Percentage::of_clamped(self.totals.active, self.totals.total())
    }

    pub fn afk_share(&self) -> Percentage {
        Percentage::of_clamped(self.totals.afk, self.totals.total())
    }
}

/// Extracts per-day totals between 2 dates (both inclusive), in date order. Days are read a few
/// at a time.
pub fn extract_days(
    storage: impl LogStorage,
    start: NaiveDate,
    end: NaiveDate,
) -> impl Stream<Item = Result<DayActivity>> {
    let storage = Arc::new(storage);

    stream::iter(date_range(start, end))
        .map(move |date| {
            let storage = storage.clone();
            async move {
                let data = storage.get_data_for(date).await.inspect_err(|e| {
                    error!("Failed to process log of {date} {e}");
                })?;
                Ok(DayActivity {
                    date,
                    totals: LogTotals::of(&data),
                })
            }
        })
        .buffered(4)
}
