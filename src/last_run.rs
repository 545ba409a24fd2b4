//! 前回実行日時の保存と実行間隔の制御

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::config::DEFAULT_EXPORT_DAYS;
use crate::error::ScraperError;

pub const LAST_RUN_FILE: &str = "last_run.txt";
/// 前回実行からこの日数が経つまでは再実行しない
pub const MIN_DAYS_BETWEEN_RUNS: i64 = 30;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// 実行可否の判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunDecision {
    /// 実行する（`from` からエクスポート）
    Proceed { from: NaiveDate },
    /// 前回実行から日が浅いので見送る
    Skip {
        last_run: NaiveDateTime,
        elapsed_days: i64,
    },
}

#[derive(Debug, Clone)]
pub struct LastRunStore {
    path: PathBuf,
}

impl LastRunStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 出力ディレクトリ内の `last_run.txt`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(LAST_RUN_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 前回実行日時を読む（ファイルなし・形式不正は None）
    pub fn read(&self) -> Result<Option<NaiveDateTime>, ScraperError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let parsed = parse_timestamp(raw.trim());
        if parsed.is_none() {
            warn!("Invalid date format in {}", self.path.display());
        }
        Ok(parsed)
    }

    pub fn record(&self, at: NaiveDateTime) -> Result<(), ScraperError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, at.format(TIMESTAMP_FORMAT).to_string())?;
        Ok(())
    }

    /// 前回実行から30日以上経っていれば実行、開始日は前回実行日
    pub fn throttle(&self, now: NaiveDateTime) -> Result<RunDecision, ScraperError> {
        match self.read()? {
            Some(last_run) => {
                let elapsed_days = (now - last_run).num_days();
                info!("Last run was on {} ({} days ago)", last_run, elapsed_days);
                if elapsed_days < MIN_DAYS_BETWEEN_RUNS {
                    Ok(RunDecision::Skip {
                        last_run,
                        elapsed_days,
                    })
                } else {
                    Ok(RunDecision::Proceed {
                        from: last_run.date(),
                    })
                }
            }
            None => Ok(RunDecision::Proceed {
                from: now.date() - Duration::days(DEFAULT_EXPORT_DAYS),
            }),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_missing_file_proceeds_with_default_range() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastRunStore::in_dir(dir.path());

        assert_eq!(store.read().unwrap(), None);
        assert_eq!(
            store.throttle(at(2024, 11, 30)).unwrap(),
            RunDecision::Proceed {
                from: NaiveDate::from_ymd_opt(2024, 10, 31).unwrap()
            }
        );
    }

    #[test]
    fn test_record_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastRunStore::in_dir(dir.path().join("nested"));

        store.record(at(2024, 11, 16)).unwrap();
        assert_eq!(store.read().unwrap(), Some(at(2024, 11, 16)));
    }

    #[test]
    fn test_recent_run_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastRunStore::in_dir(dir.path());
        store.record(at(2024, 11, 1)).unwrap();

        match store.throttle(at(2024, 11, 20)).unwrap() {
            RunDecision::Skip { elapsed_days, .. } => assert_eq!(elapsed_days, 19),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_old_run_proceeds_from_last_run_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastRunStore::in_dir(dir.path());
        store.record(at(2024, 10, 1)).unwrap();

        assert_eq!(
            store.throttle(at(2024, 11, 20)).unwrap(),
            RunDecision::Proceed {
                from: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()
            }
        );
    }

    #[test]
    fn test_invalid_content_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = LastRunStore::in_dir(dir.path());
        std::fs::write(store.path(), "not a date").unwrap();

        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_parse_python_isoformat() {
        assert_eq!(
            parse_timestamp("2024-11-16T09:30:00.123456").map(|t| t.date()),
            NaiveDate::from_ymd_opt(2024, 11, 16)
        );
        assert!(parse_timestamp("2024-11-16").is_some());
    }
}
