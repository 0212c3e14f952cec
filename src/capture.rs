//! Capture sessions: one task code, a run of numbered photos.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use tracing::warn;

use crate::db::{GeoPoint, NewPhoto, PhotoData, PhotoStore};
use crate::day::{day_bounds, ReportZone};

/// Accumulates photos for one task code and assigns their filenames.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    task_code: String,
    taken: u32,
}

impl CaptureSession {
    /// Start a session numbering photos from 1.
    pub fn start(task_code: &str) -> Result<Self> {
        let task_code = task_code.trim();
        if task_code.is_empty() {
            bail!("Task code must not be empty");
        }
        Ok(Self {
            task_code: task_code.to_string(),
            taken: 0,
        })
    }

    /// Start a session that continues the numbering of photos already logged
    /// for this task on the day of `now`, so filenames stay unique per task
    /// and day.
    pub fn resume(store: &dyn PhotoStore, task_code: &str, now: DateTime<Utc>, zone: ReportZone) -> Result<Self> {
        let mut session = Self::start(task_code)?;
        if let Some((start, end)) = day_bounds(zone.date_of(now), zone) {
            let existing = store.count_task_photos_between(&session.task_code, start, end)?;
            session.taken = u32::try_from(existing)?;
        }
        Ok(session)
    }

    pub fn task_code(&self) -> &str {
        &self.task_code
    }

    /// Photos numbered so far, including any continued from earlier sessions.
    pub fn count(&self) -> u32 {
        self.taken
    }

    /// Filename the next photo will get.
    pub fn next_filename(&self) -> String {
        format!("{}_({}).jpg", self.task_code, self.taken + 1)
    }

    /// Build the record for the next photo and advance the sequence.
    pub fn next_photo(
        &mut self,
        data: PhotoData,
        now: DateTime<Utc>,
        device_id: Option<String>,
        location: Option<GeoPoint>,
    ) -> NewPhoto {
        let filename = self.next_filename();
        self.taken += 1;
        NewPhoto {
            task_code: self.task_code.clone(),
            filename,
            timestamp: now,
            data,
            device_id,
            location,
        }
    }
}

/// Insert `photo` into `store`.
///
/// If the insert fails, a file-backed photo's file is removed again so no
/// unreferenced image is left in the photo directory.
pub fn save_photo(store: &dyn PhotoStore, photo: &NewPhoto) -> Result<i64> {
    match store.add_photo(photo) {
        Ok(id) => Ok(id),
        Err(e) => {
            if let PhotoData::File(path) = &photo.data {
                if let Err(remove_err) = std::fs::remove_file(path) {
                    warn!(path = %path.display(), error = %remove_err, "Failed to remove unsaved photo");
                }
            }
            Err(e).context("Failed to save photo")
        }
    }
}

/// Text stamped onto a captured photo.
///
/// `TASK | 2024-01-01 08:00:00`, followed by `| device` and `| lat, lon`
/// when known. The time is shown in the host's local time.
pub fn stamp_text(
    task_code: &str,
    timestamp: DateTime<Utc>,
    device_id: Option<&str>,
    location: Option<GeoPoint>,
) -> String {
    let local = timestamp.with_timezone(&Local);
    let mut parts = vec![task_code.to_string(), local.format("%Y-%m-%d %H:%M:%S").to_string()];
    if let Some(device) = device_id {
        parts.push(device.to_string());
    }
    if let Some(point) = location {
        parts.push(format!("{:.5}, {:.5}", point.latitude, point.longitude));
    }
    parts.join(" | ")
}
