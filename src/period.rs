use crate::error::AppError;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use std::path::{Path, PathBuf};

/// A snapshot file located inside a report period, named by its capture hour.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    pub timestamp: DateTime<Utc>,
    pub path: PathBuf,
}

pub fn parse_week(week: &str) -> Result<(i32, u32), AppError> {
    let invalid = || AppError::InvalidWeek(week.to_string());

    let (year_part, number_part) = week.split_once("-W").ok_or_else(invalid)?;
    if year_part.len() != 4
        || number_part.len() != 2
        || !year_part.bytes().all(|b| b.is_ascii_digit())
        || !number_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    let year = year_part.parse().map_err(|_| invalid())?;
    let number = number_part.parse().map_err(|_| invalid())?;
    Ok((year, number))
}

/// Monday 00:00:00 through Sunday 23:59:59 UTC of the given ISO week.
/// Week 1 is the week containing January 4th.
pub fn week_boundaries(year: i32, week: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .ok_or_else(|| AppError::InvalidWeek(format!("{year}-W{week:02}")))?;
    let start = Utc.from_utc_datetime(&monday.and_time(NaiveTime::MIN));
    let end = start + Duration::days(7) - Duration::seconds(1);
    Ok((start, end))
}

/// The most recent fully elapsed ISO week relative to `now`.
pub fn previous_complete_week(now: DateTime<Utc>) -> (i32, u32) {
    let iso = (now - Duration::weeks(1)).iso_week();
    (iso.year(), iso.week())
}

/// Snapshot files in `dir` whose filename timestamp falls within
/// `[start, end]`, ascending. Names that do not parse as
/// `YYYY-MM-DDTHH-MM.json` are skipped.
pub fn find_snapshot_files(
    dir: &Path,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<SnapshotFile>, AppError> {
    let mut files = Vec::new();
    if !dir.is_dir() {
        return Ok(files);
    }

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(stem) = name.strip_suffix(".json") else {
            continue;
        };
        let Ok(naive) = NaiveDateTime::parse_from_str(stem, "%Y-%m-%dT%H-%M") else {
            continue;
        };
        let timestamp = Utc.from_utc_datetime(&naive);
        if timestamp >= start && timestamp <= end {
            files.push(SnapshotFile { timestamp, path });
        }
    }

    files.sort_by_key(|f| f.timestamp);
    Ok(files)
}
