use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, warn};

use crate::utils::time::date_to_record_name;

use super::entities::SessionLogEntry;

/// Interface for abstracting storage of daily session logs. Logs are append-only: nothing in the
/// application rewrites or deletes an entry.
pub trait LogStorage {
    /// Appends a completed session to the log of `date`.
    fn append(
        &self,
        date: NaiveDate,
        entry: SessionLogEntry,
    ) -> impl Future<Output = Result<()>>;

    /// Retrieves the log for a certain day. Missing logs are empty.
    fn get_data_for(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<SessionLogEntry>>> + Send;
}

impl<T: Deref> LogStorage for T
where
    T::Target: LogStorage,
{
    fn append(
        &self,
        date: NaiveDate,
        entry: SessionLogEntry,
    ) -> impl Future<Output = Result<()>> {
        self.deref().append(date, entry)
    }

    fn get_data_for(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<SessionLogEntry>>> + Send {
        self.deref().get_data_for(date)
    }
}

/// The main realization of [LogStorage]. One file per day, one JSON entry per line.
pub struct LogStorageImpl {
    record_dir: PathBuf,
}

impl LogStorageImpl {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.record_dir.join(date_to_record_name(date))
    }

    async fn get_all_inner(&self, path: &Path) -> Result<Vec<SessionLogEntry>> {
        async fn extract(path: &Path) -> std::result::Result<Vec<SessionLogEntry>, std::io::Error> {
            debug!("Extracting {path:?}");
            let file = File::open(path).await?;
            file.lock_shared()?;
            let mut buffer = BufReader::new(file);
            let mut lines = (&mut buffer).split(b'\n');
            let mut entries = vec![];
            // Lines are decoded one by one, so a line that isn't UTF-8 only loses itself.
            while let Some(v) = lines.next_segment().await? {
                if v.trim_ascii().is_empty() {
                    continue;
                }
                match serde_json::from_slice::<SessionLogEntry>(&v) {
                    Ok(v) => entries.push(v),
                    Err(e) => {
                        // Corrupt lines are dropped, the rest of the day is still usable.
                        warn!(
                            "During parsing in path {:?} found illegal json string {}:  {e}",
                            path,
                            String::from_utf8_lossy(&v)
                        )
                    }
                }
            }

            drop(lines);
            buffer.into_inner().unlock_async().await?;

            Ok(entries)
        }

        match extract(path).await {
            Ok(s) => Ok(s),
            Err(e) => {
                if e.kind() == ErrorKind::NotFound {
                    Ok(vec![])
                } else {
                    Err(e)?
                }
            }
        }
    }

    async fn append_with_file(file: &mut File, entry: &SessionLogEntry) -> Result<()> {
        let mut buffer = Vec::<u8>::new();

        // A previous write might have been cut off by a shutdown. Start on a fresh line so only
        // the broken entry is lost.
        let len = file.seek(std::io::SeekFrom::End(0)).await?;
        if len > 0 {
            file.seek(std::io::SeekFrom::End(-1)).await?;
            if file.read_u8().await? != b'\n' {
                buffer.push(b'\n');
            }
        }

        serde_json::to_writer(&mut buffer, entry)?;
        buffer.push(b'\n');

        file.write_all(&buffer).await?;
        file.flush().await?;
        Ok(())
    }
}

impl LogStorage for LogStorageImpl {
    async fn append(&self, date: NaiveDate, entry: SessionLogEntry) -> Result<()> {
        let path = self.path_for(date);

        let mut file = File::options()
            .append(true)
            .create(true)
            .read(true)
            .open(&path)
            .await
            .with_context(|| format!("Failed to open session log {path:?}"))?;

        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::append_with_file(&mut file, &entry).await;
        file.unlock_async().await?;
        result
    }

    async fn get_data_for(&self, date: NaiveDate) -> Result<Vec<SessionLogEntry>> {
        let path = self.path_for(date);
        let data = self.get_all_inner(&path).await?;
        Ok(data)
    }
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        storage::{
            entities::SessionLogEntry,
            log_storage::{LogStorage, LogStorageImpl},
        },
        utils::time::date_to_record_name,
    };

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(), NaiveTime::MIN);

    fn entry(offset_hours: i64, active: f64, afk: f64) -> SessionLogEntry {
        let start = Utc.from_utc_datetime(&TEST_START_DATE) + Duration::hours(offset_hours);
        SessionLogEntry {
            start,
            end: start + Duration::hours(1),
            active,
            afk,
        }
    }

    #[tokio::test]
    async fn test_log_storage_appending() -> Result<()> {
        let dir = tempdir()?;
        let storage = LogStorageImpl::new(dir.path().to_owned())?;
        let entries = [entry(0, 1.5, 0.25), entry(2, 2.0, 0.), entry(4, 0.5, 0.5)];

        for e in entries.iter() {
            storage.append(TEST_START_DATE.date(), e.clone()).await?;
        }

        let stored = storage.get_data_for(TEST_START_DATE.date()).await?;
        assert_eq!(stored, entries.to_vec());

        let other_day = storage
            .get_data_for(TEST_START_DATE.date().succ_opt().unwrap())
            .await?;
        assert!(other_day.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_log_storage_missing_dir_entry() -> Result<()> {
        let dir = tempdir()?;
        let storage = LogStorageImpl::new(dir.path().join("nested"))?;
        assert!(storage.get_data_for(TEST_START_DATE.date()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_log_storage_skips_non_utf8_lines() -> Result<()> {
        let dir = tempdir()?;
        let storage = LogStorageImpl::new(dir.path().to_owned())?;
        let first = entry(0, 1., 0.);

        let mut file =
            std::fs::File::create(dir.path().join(date_to_record_name(TEST_START_DATE.date())))?;
        writeln!(file, "{}", serde_json::to_string(&first)?)?;
        file.write_all(b"\xff\xfe garbage\n")?;
        drop(file);

        let later = [entry(2, 0.5, 0.), entry(4, 0.25, 0.25)];
        for e in later.iter() {
            storage.append(TEST_START_DATE.date(), e.clone()).await?;
        }

        let stored = storage.get_data_for(TEST_START_DATE.date()).await?;
        assert_eq!(stored, vec![first, later[0].clone(), later[1].clone()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_log_storage_skips_corrupt_lines() -> Result<()> {
        let dir = tempdir()?;
        let storage = LogStorageImpl::new(dir.path().to_owned())?;
        let valid = entry(0, 1., 0.);

        let mut file =
            std::fs::File::create(dir.path().join(date_to_record_name(TEST_START_DATE.date())))?;
        writeln!(file, "{}", serde_json::to_string(&valid)?)?;
        writeln!(file, "not json at all")?;
        write!(file, "{{\"start\":")?;
        drop(file);

        let second = entry(3, 0.5, 0.1);
        storage.append(TEST_START_DATE.date(), second.clone()).await?;

        let stored = storage.get_data_for(TEST_START_DATE.date()).await?;
        assert_eq!(stored, vec![valid, second]);
        Ok(())
    }
}
