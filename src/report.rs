//! Daily per-task photo counts.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use crate::db::{PhotoRecord, PhotoStore, StoreResult};
use crate::day::ReportZone;

/// Number of photos logged for one task code on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub task_code: String,
    pub photo_count: u64,
}

/// Build the report for `date` (`YYYY-MM-DD` in `zone`).
///
/// A day without photos, or a date that does not parse, gives an empty report.
pub fn build_report(store: &dyn PhotoStore, date: &str, zone: ReportZone) -> StoreResult<Vec<TaskReport>> {
    let photos = store.photos_for_date(date, zone)?;
    let report = summarize(&photos);
    debug!(date, photos = photos.len(), tasks = report.len(), "Report built");
    Ok(report)
}

/// Count photos per task code, ordered by [`compare_task_codes`].
pub fn summarize(photos: &[PhotoRecord]) -> Vec<TaskReport> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for photo in photos {
        *counts.entry(photo.task_code.as_str()).or_default() += 1;
    }

    let mut report: Vec<TaskReport> = counts
        .into_iter()
        .map(|(task_code, photo_count)| TaskReport {
            task_code: task_code.to_string(),
            photo_count,
        })
        .collect();
    report.sort_by(|a, b| compare_task_codes(&a.task_code, &b.task_code));
    report
}

/// Collation-style ordering for task codes.
///
/// Case-insensitive first, then lowercase before uppercase, so `abc`, `ABC`
/// and `Abd` sort as `abc`, `ABC`, `Abd`. Remaining ties fall back to byte
/// order, which keeps the ordering total.
pub fn compare_task_codes(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded
        .then_with(|| case_rank(a).cmp(&case_rank(b)))
        .then_with(|| a.cmp(b))
}

fn case_rank(s: &str) -> Vec<bool> {
    s.chars().map(char::is_uppercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewPhoto, PhotoData};
    use chrono::{DateTime, Utc};

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn add(db: &Database, task_code: &str, at: &str) {
        db.add_photo(&NewPhoto {
            task_code: task_code.to_string(),
            filename: format!("{}_(1).jpg", task_code),
            timestamp: DateTime::parse_from_rfc3339(at).unwrap().with_timezone(&Utc),
            data: PhotoData::Inline(vec![0xFF, 0xD8]),
            device_id: None,
            location: None,
        })
        .unwrap();
    }

    fn entry(task_code: &str, photo_count: u64) -> TaskReport {
        TaskReport {
            task_code: task_code.to_string(),
            photo_count,
        }
    }

    #[test]
    fn test_daily_report_counts_per_task() {
        let db = test_db();
        add(&db, "A", "2024-01-01T08:00:00Z");
        add(&db, "A", "2024-01-01T09:00:00Z");
        add(&db, "B", "2024-01-01T10:00:00Z");
        add(&db, "B", "2024-01-02T00:00:01Z");

        let report = build_report(&db, "2024-01-01", ReportZone::utc()).unwrap();
        assert_eq!(report, vec![entry("A", 2), entry("B", 1)]);
    }

    #[test]
    fn test_empty_day_gives_empty_report() {
        let db = test_db();
        assert!(build_report(&db, "2024-01-01", ReportZone::utc()).unwrap().is_empty());

        add(&db, "A", "2024-01-02T08:00:00Z");
        assert!(build_report(&db, "2024-01-01", ReportZone::utc()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_date_gives_empty_report() {
        let db = test_db();
        add(&db, "A", "2024-01-01T08:00:00Z");
        assert!(build_report(&db, "not-a-date", ReportZone::utc()).unwrap().is_empty());
    }

    #[test]
    fn test_report_is_idempotent() {
        let db = test_db();
        add(&db, "Z-9", "2024-01-01T08:00:00Z");
        add(&db, "A-1", "2024-01-01T09:00:00Z");

        let first = build_report(&db, "2024-01-01", ReportZone::utc()).unwrap();
        let second = build_report(&db, "2024-01-01", ReportZone::utc()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_uses_zone_for_day_membership() {
        let db = test_db();
        // 23:30 UTC on Jan 1 is already Jan 2 at +01:00
        add(&db, "A", "2024-01-01T23:30:00Z");
        let east: ReportZone = "+01:00".parse().unwrap();

        assert!(build_report(&db, "2024-01-01", east).unwrap().is_empty());
        assert_eq!(build_report(&db, "2024-01-02", east).unwrap(), vec![entry("A", 1)]);
    }

    #[test]
    fn test_task_code_ordering() {
        let mut codes = vec!["b", "Abd", "ABC", "abc", "a10", "a2"];
        codes.sort_by(|a, b| compare_task_codes(a, b));
        assert_eq!(codes, vec!["a10", "a2", "abc", "ABC", "Abd", "b"]);
    }
}
