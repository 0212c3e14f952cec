//! Storage abstraction consumed by the report and export logic.

use chrono::{DateTime, Utc};
use tracing::warn;

use super::error::StoreResult;
use super::records::{NewPhoto, PhotoRecord};
use crate::day::{self, ReportZone};

/// Append-only photo store queried by capture time.
pub trait PhotoStore {
    /// Insert a photo and return its assigned id.
    fn add_photo(&self, photo: &NewPhoto) -> StoreResult<i64>;

    /// Photos with `start <= timestamp <= end`, oldest first.
    fn photos_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StoreResult<Vec<PhotoRecord>>;

    /// Number of photos for one task code with `start <= timestamp <= end`.
    fn count_task_photos_between(
        &self,
        task_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<u64>;

    /// All photos taken on `date` (`YYYY-MM-DD`) in `zone`, oldest first.
    ///
    /// A date that does not parse yields no photos rather than an error.
    fn photos_for_date(&self, date: &str, zone: ReportZone) -> StoreResult<Vec<PhotoRecord>> {
        match day::parse_day(date).and_then(|d| day::day_bounds(d, zone)) {
            Some((start, end)) => self.photos_between(start, end),
            None => {
                warn!(date, "Ignoring malformed report date");
                Ok(Vec::new())
            }
        }
    }
}
