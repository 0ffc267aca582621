//! Daily rotation naming: `<dir>/<prefix>-<YYYY-MM-DD>.log`.
//!
//! The writer starts a new file per calendar day. `resolve_active` picks the
//! file that should be tailed right now: today's file when it exists,
//! otherwise the most recently modified file of the series.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDate;

use crate::error::{LogError, LogResult};

const DATE_FORMAT: &str = "%Y-%m-%d";
const EXTENSION: &str = ".log";

/// Naming convention of one rotating log series in a single directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyLogNaming {
    dir: PathBuf,
    prefix: String,
}

impl DailyLogNaming {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path of the file written on `date`.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!(
            "{}-{}{EXTENSION}",
            self.prefix,
            date.format(DATE_FORMAT)
        ))
    }

    /// Date encoded in `file_name`, if it belongs to this series.
    pub fn date_of(&self, file_name: &str) -> Option<NaiveDate> {
        let date = file_name
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('-')?
            .strip_suffix(EXTENSION)?;
        // Exactly YYYY-MM-DD; chrono alone would also accept "2025-1-9".
        if date.len() != 10 {
            return None;
        }
        NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
    }

    /// All files of this series currently in the directory.
    ///
    /// A missing directory is treated as "no files yet".
    pub async fn candidates(&self) -> LogResult<Vec<PathBuf>> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(LogError::from_io(&self.dir, e)),
        };

        let mut found = Vec::new();
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| LogError::from_io(&self.dir, e))?
        {
            let name = item.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if self.date_of(name).is_some() {
                found.push(item.path());
            }
        }
        found.sort();
        Ok(found)
    }

    /// Pick the file to tail on `today`.
    ///
    /// Today's file wins if it exists; otherwise the candidate with the
    /// newest modification time (later name on ties). With no candidates at
    /// all, today's path is returned even though it does not exist yet.
    pub async fn resolve_active(&self, today: NaiveDate) -> LogResult<PathBuf> {
        let todays = self.path_for(today);
        if tokio::fs::metadata(&todays).await.is_ok() {
            return Ok(todays);
        }

        let mut newest: Option<(SystemTime, PathBuf)> = None;
        for path in self.candidates().await? {
            // Files can vanish between listing and stat; skip those.
            let Ok(meta) = tokio::fs::metadata(&path).await else {
                continue;
            };
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let is_newer = match &newest {
                Some((best, best_path)) => (modified, &path) > (*best, best_path),
                None => true,
            };
            if is_newer {
                newest = Some((modified, path));
            }
        }

        match newest {
            Some((_, path)) => {
                tracing::debug!(
                    today = %todays.display(),
                    fallback = %path.display(),
                    "today's log file missing; using most recently modified"
                );
                Ok(path)
            }
            None => Ok(todays),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn touch(path: &Path, age_secs: u64) {
        fs::write(path, b"").unwrap();
        let mtime = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(mtime)
            .unwrap();
    }

    #[test]
    fn path_for_formats_date() {
        let naming = DailyLogNaming::new("/var/www/storage/logs", "laravel");
        assert_eq!(
            naming.path_for(date(2025, 12, 9)),
            PathBuf::from("/var/www/storage/logs/laravel-2025-12-09.log")
        );
    }

    #[test]
    fn date_of_accepts_only_series_names() {
        let naming = DailyLogNaming::new("/logs", "laravel");
        assert_eq!(naming.date_of("laravel-2025-12-09.log"), Some(date(2025, 12, 9)));
        assert_eq!(naming.date_of("laravel.log"), None);
        assert_eq!(naming.date_of("laravel-2025-12-09.log.gz"), None);
        assert_eq!(naming.date_of("worker-2025-12-09.log"), None);
        assert_eq!(naming.date_of("laravel-2025-13-09.log"), None);
        assert_eq!(naming.date_of("laravel-2025-1-9.log"), None);
    }

    #[tokio::test]
    async fn resolve_prefers_todays_file() {
        let dir = tempfile::tempdir().unwrap();
        let naming = DailyLogNaming::new(dir.path(), "laravel");
        touch(&naming.path_for(date(2025, 12, 9)), 3600);
        touch(&naming.path_for(date(2025, 12, 8)), 0);

        let active = naming.resolve_active(date(2025, 12, 9)).await.unwrap();
        assert_eq!(active, naming.path_for(date(2025, 12, 9)));
    }

    #[tokio::test]
    async fn resolve_falls_back_to_most_recently_modified() {
        let dir = tempfile::tempdir().unwrap();
        let naming = DailyLogNaming::new(dir.path(), "laravel");
        touch(&naming.path_for(date(2025, 12, 7)), 10);
        touch(&naming.path_for(date(2025, 12, 8)), 500);
        touch(&dir.path().join("other-2025-12-09.log"), 0);

        let active = naming.resolve_active(date(2025, 12, 9)).await.unwrap();
        assert_eq!(active, naming.path_for(date(2025, 12, 7)));
    }

    #[tokio::test]
    async fn resolve_without_candidates_returns_todays_path() {
        let dir = tempfile::tempdir().unwrap();
        let naming = DailyLogNaming::new(dir.path(), "laravel");
        let active = naming.resolve_active(date(2025, 12, 9)).await.unwrap();
        assert_eq!(active, naming.path_for(date(2025, 12, 9)));
        assert!(!active.exists());
    }

    #[tokio::test]
    async fn missing_directory_has_no_candidates() {
        let naming = DailyLogNaming::new("/nonexistent/tailwatch/logs", "laravel");
        assert!(naming.candidates().await.unwrap().is_empty());
        let active = naming.resolve_active(date(2025, 12, 9)).await.unwrap();
        assert_eq!(active, naming.path_for(date(2025, 12, 9)));
    }
}
