//! Placement of captured image bytes.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

use crate::config::{StorageConfig, StorageMode};
use crate::db::PhotoData;
use crate::day::ReportZone;
use crate::paths::safe_component;

/// Turns captured bytes into a [`PhotoData`] according to the configured mode.
pub struct PhotoStorage {
    mode: StorageMode,
    photos_dir: PathBuf,
    zone: ReportZone,
}

impl PhotoStorage {
    pub fn new(config: &StorageConfig, zone: ReportZone) -> Self {
        Self {
            mode: config.mode,
            photos_dir: config.photos_dir.clone(),
            zone,
        }
    }

    /// Keep `bytes` inline, or write them to
    /// `photos_dir/<YYYY-MM-DD>/<millis>_<filename>` and reference the file.
    /// Separators in `filename` (from the task code) are replaced, so the
    /// file always lands directly in the day directory.
    pub fn place(&self, bytes: Vec<u8>, filename: &str, taken_at: DateTime<Utc>) -> Result<PhotoData> {
        match self.mode {
            StorageMode::Inline => Ok(PhotoData::Inline(bytes)),
            StorageMode::Files => {
                let day_dir = self
                    .photos_dir
                    .join(self.zone.date_of(taken_at).format("%Y-%m-%d").to_string());
                fs::create_dir_all(&day_dir)
                    .with_context(|| format!("Failed to create photo directory {}", day_dir.display()))?;

                let name = safe_component(&format!("{}_{}", taken_at.timestamp_millis(), filename));
                let path = day_dir.join(name);
                fs::write(&path, &bytes)
                    .with_context(|| format!("Failed to write photo {}", path.display()))?;
                Ok(PhotoData::File(path))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(mode: StorageMode, dir: &TempDir) -> PhotoStorage {
        let config = StorageConfig {
            mode,
            photos_dir: dir.path().join("photos"),
        };
        PhotoStorage::new(&config, ReportZone::utc())
    }

    #[test]
    fn test_inline_mode_keeps_bytes() {
        let dir = TempDir::new().unwrap();
        let placed = storage(StorageMode::Inline, &dir)
            .place(vec![1, 2, 3], "A_(1).jpg", Utc::now())
            .unwrap();
        assert_eq!(placed, PhotoData::Inline(vec![1, 2, 3]));
        assert!(!dir.path().join("photos").exists());
    }

    #[test]
    fn test_files_mode_writes_under_day_directory() {
        let dir = TempDir::new().unwrap();
        let at = DateTime::parse_from_rfc3339("2024-01-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let placed = storage(StorageMode::Files, &dir)
            .place(b"jpeg".to_vec(), "A_(1).jpg", at)
            .unwrap();

        let expected = dir
            .path()
            .join("photos")
            .join("2024-01-01")
            .join("1704096000000_A_(1).jpg");
        assert_eq!(placed, PhotoData::File(expected.clone()));
        assert_eq!(fs::read(expected).unwrap(), b"jpeg");
    }

    #[test]
    fn test_files_mode_flattens_task_code_separators() {
        let dir = TempDir::new().unwrap();
        let at = DateTime::parse_from_rfc3339("2024-01-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let storage = storage(StorageMode::Files, &dir);
        let day_dir = dir.path().join("photos").join("2024-01-01");

        let placed = storage.place(b"wo".to_vec(), "WO/123_(1).jpg", at).unwrap();
        let expected = day_dir.join("1704096000000_WO_123_(1).jpg");
        assert_eq!(placed, PhotoData::File(expected.clone()));
        assert_eq!(fs::read(expected).unwrap(), b"wo");

        let placed = storage.place(b"up".to_vec(), "../../up_(1).jpg", at).unwrap();
        let PhotoData::File(path) = placed else {
            panic!("expected a file-backed photo");
        };
        assert_eq!(path.parent(), Some(day_dir.as_path()));
    }
}
