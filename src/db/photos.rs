//! Photo persistence on SQLite.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use std::path::PathBuf;
use tracing::debug;

use super::backend::PhotoStore;
use super::error::{StoreError, StoreResult};
use super::records::{GeoPoint, NewPhoto, PhotoData, PhotoRecord};
use super::Database;

/// Raw column values, converted into a `PhotoRecord` after the row is read
/// so that malformed rows surface as `StoreError::Corrupt`.
struct PhotoRow {
    id: i64,
    task_code: String,
    filename: String,
    taken_at: String,
    data_blob: Option<Vec<u8>>,
    data_path: Option<String>,
    device_id: Option<String>,
    gps_latitude: Option<f64>,
    gps_longitude: Option<f64>,
}

impl PhotoRow {
    const COLUMNS: &'static str = "id, task_code, filename, taken_at, data_blob, data_path, \
                                   device_id, gps_latitude, gps_longitude";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            task_code: row.get(1)?,
            filename: row.get(2)?,
            taken_at: row.get(3)?,
            data_blob: row.get(4)?,
            data_path: row.get(5)?,
            device_id: row.get(6)?,
            gps_latitude: row.get(7)?,
            gps_longitude: row.get(8)?,
        })
    }

    fn into_record(self) -> StoreResult<PhotoRecord> {
        let timestamp = DateTime::parse_from_rfc3339(&self.taken_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::Corrupt {
                id: self.id,
                reason: format!("bad timestamp '{}': {}", self.taken_at, e),
            })?;

        let data = match (self.data_blob, self.data_path) {
            (Some(bytes), None) => PhotoData::Inline(bytes),
            (None, Some(path)) => PhotoData::File(PathBuf::from(path)),
            _ => {
                return Err(StoreError::Corrupt {
                    id: self.id,
                    reason: "expected exactly one of data_blob and data_path".to_string(),
                })
            }
        };

        let location = match (self.gps_latitude, self.gps_longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        };

        Ok(PhotoRecord {
            id: self.id,
            task_code: self.task_code,
            filename: self.filename,
            timestamp,
            data,
            device_id: self.device_id,
            location,
        })
    }
}

fn timestamp_text(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Database {
    pub fn photo_count(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl PhotoStore for Database {
    fn add_photo(&self, photo: &NewPhoto) -> StoreResult<i64> {
        let (data_blob, data_path): (Option<&[u8]>, Option<String>) = match &photo.data {
            PhotoData::Inline(bytes) => (Some(bytes.as_slice()), None),
            PhotoData::File(path) => (None, Some(path.to_string_lossy().into_owned())),
        };

        self.conn.execute(
            r#"
            INSERT INTO photos (
                task_code, filename, taken_at, taken_at_ms,
                data_blob, data_path,
                device_id, gps_latitude, gps_longitude
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            rusqlite::params![
                photo.task_code,
                photo.filename,
                timestamp_text(photo.timestamp),
                photo.timestamp.timestamp_millis(),
                data_blob,
                data_path,
                photo.device_id,
                photo.location.map(|p| p.latitude),
                photo.location.map(|p| p.longitude),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(id, task_code = %photo.task_code, filename = %photo.filename, "Photo stored");
        Ok(id)
    }

    fn photos_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StoreResult<Vec<PhotoRecord>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM photos
            WHERE taken_at_ms BETWEEN ?1 AND ?2
            ORDER BY taken_at_ms ASC, id ASC
            "#,
            PhotoRow::COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                [start.timestamp_millis(), end.timestamp_millis()],
                PhotoRow::from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter().map(PhotoRow::into_record).collect()
    }

    fn count_task_photos_between(
        &self,
        task_code: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM photos
            WHERE task_code = ?1 AND taken_at_ms BETWEEN ?2 AND ?3
            "#,
            rusqlite::params![task_code, start.timestamp_millis(), end.timestamp_millis()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::day::ReportZone;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn photo(task_code: &str, at: &str) -> NewPhoto {
        NewPhoto {
            task_code: task_code.to_string(),
            filename: format!("{}_(1).jpg", task_code),
            timestamp: ts(at),
            data: PhotoData::Inline(at.as_bytes().to_vec()),
            device_id: None,
            location: None,
        }
    }

    #[test]
    fn test_add_photo_assigns_increasing_ids() {
        let db = test_db();
        let first = db.add_photo(&photo("A", "2024-01-01T08:00:00Z")).unwrap();
        let second = db.add_photo(&photo("A", "2024-01-01T08:00:00Z")).unwrap();
        assert!(second > first);
        assert_eq!(db.photo_count().unwrap(), 2);
    }

    #[test]
    fn test_roundtrip_preserves_optional_fields() {
        let db = test_db();
        let new = NewPhoto {
            task_code: "TSK-1".to_string(),
            filename: "TSK-1_(1).jpg".to_string(),
            timestamp: ts("2024-03-05T10:15:30.250Z"),
            data: PhotoData::File(PathBuf::from("/photos/TSK-1_(1).jpg")),
            device_id: Some("device-1".to_string()),
            location: Some(GeoPoint {
                latitude: 52.52,
                longitude: 13.405,
            }),
        };
        let id = db.add_photo(&new).unwrap();

        let found = db
            .photos_between(ts("2024-03-05T00:00:00Z"), ts("2024-03-05T23:59:59.999Z"))
            .unwrap();
        assert_eq!(found.len(), 1);
        let record = &found[0];
        assert_eq!(record.id, id);
        assert_eq!(record.task_code, new.task_code);
        assert_eq!(record.filename, new.filename);
        assert_eq!(record.timestamp, new.timestamp);
        assert_eq!(record.data, new.data);
        assert_eq!(record.device_id, new.device_id);
        assert_eq!(record.location, new.location);
    }

    #[test]
    fn test_range_is_inclusive_and_ordered() {
        let db = test_db();
        db.add_photo(&photo("late", "2024-01-01T23:59:59.999Z")).unwrap();
        db.add_photo(&photo("early", "2024-01-01T00:00:00.000Z")).unwrap();
        db.add_photo(&photo("mid", "2024-01-01T12:00:00Z")).unwrap();
        db.add_photo(&photo("before", "2023-12-31T23:59:59.999Z")).unwrap();
        db.add_photo(&photo("after", "2024-01-02T00:00:00.000Z")).unwrap();

        let found = db.photos_for_date("2024-01-01", ReportZone::utc()).unwrap();
        let codes: Vec<&str> = found.iter().map(|p| p.task_code.as_str()).collect();
        assert_eq!(codes, vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let db = test_db();
        db.add_photo(&photo("B", "2024-01-01T08:00:00Z")).unwrap();
        db.add_photo(&photo("A", "2024-01-01T08:00:00Z")).unwrap();

        let found = db.photos_for_date("2024-01-01", ReportZone::utc()).unwrap();
        let codes: Vec<&str> = found.iter().map(|p| p.task_code.as_str()).collect();
        assert_eq!(codes, vec!["B", "A"]);
    }

    #[test]
    fn test_malformed_date_yields_no_photos() {
        let db = test_db();
        db.add_photo(&photo("A", "2024-01-01T08:00:00Z")).unwrap();

        assert!(db.photos_for_date("", ReportZone::utc()).unwrap().is_empty());
        assert!(db.photos_for_date("01/01/2024", ReportZone::utc()).unwrap().is_empty());
    }

    #[test]
    fn test_count_task_photos_between() {
        let db = test_db();
        db.add_photo(&photo("A", "2024-01-01T08:00:00Z")).unwrap();
        db.add_photo(&photo("A", "2024-01-01T09:00:00Z")).unwrap();
        db.add_photo(&photo("B", "2024-01-01T09:00:00Z")).unwrap();
        db.add_photo(&photo("A", "2024-01-02T09:00:00Z")).unwrap();

        let start = ts("2024-01-01T00:00:00Z");
        let end = ts("2024-01-01T23:59:59.999Z");
        assert_eq!(db.count_task_photos_between("A", start, end).unwrap(), 2);
        assert_eq!(db.count_task_photos_between("B", start, end).unwrap(), 1);
        assert_eq!(db.count_task_photos_between("C", start, end).unwrap(), 0);
    }

    #[test]
    fn test_corrupt_row_is_reported() {
        let db = test_db();
        db.conn
            .execute(
                "INSERT INTO photos (task_code, filename, taken_at, taken_at_ms, data_path)
                 VALUES ('A', 'A_(1).jpg', 'not a date', 1704096000000, '/tmp/a.jpg')",
                [],
            )
            .unwrap();

        let result = db.photos_for_date("2024-01-01", ReportZone::utc());
        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }
}
