//! Types for captured photos.

use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::io;
use std::path::PathBuf;

/// Where a photo's image bytes live.
///
/// Which variant is used is a storage decision (see `config::StorageMode`);
/// both go through the same record schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoData {
    /// Bytes kept in the database row.
    Inline(Vec<u8>),
    /// Path to a file owned by this record.
    File(PathBuf),
}

impl PhotoData {
    /// Load the image bytes, reading from disk for file-backed photos.
    pub fn bytes(&self) -> io::Result<Cow<'_, [u8]>> {
        match self {
            PhotoData::Inline(bytes) => Ok(Cow::Borrowed(bytes)),
            PhotoData::File(path) => std::fs::read(path).map(Cow::Owned),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A photo ready to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhoto {
    pub task_code: String,
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub data: PhotoData,
    pub device_id: Option<String>,
    pub location: Option<GeoPoint>,
}

/// A stored photo. Immutable once written.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub id: i64,
    pub task_code: String,
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    pub data: PhotoData,
    pub device_id: Option<String>,
    pub location: Option<GeoPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_inline_bytes_are_borrowed() {
        let data = PhotoData::Inline(vec![1, 2, 3]);
        let bytes = data.bytes().unwrap();
        assert!(matches!(bytes, Cow::Borrowed(_)));
        assert_eq!(&*bytes, &[1, 2, 3]);
    }

    #[test]
    fn test_file_bytes_are_read_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        assert_eq!(&*PhotoData::File(path.clone()).bytes().unwrap(), b"jpeg");

        std::fs::remove_file(&path).unwrap();
        assert!(PhotoData::File(path).bytes().is_err());
    }
}
