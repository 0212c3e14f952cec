use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::db::{PhotoRecord, PhotoStore};
use crate::day::{parse_day, ReportZone};
use crate::paths::{safe_component, unique_suffixed};
use crate::report::TaskReport;

/// Report summary export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportFormat::Json => "JSON",
            ReportFormat::Csv => "CSV",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            _ => None,
        }
    }
}

/// One photo as it will appear inside the archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry<'a> {
    /// File name inside the task folder, unique within that folder.
    pub name: String,
    pub record: &'a PhotoRecord,
}

/// Result of writing a day's archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub tasks: usize,
    pub photos: usize,
}

/// Partition records into one group per task code.
///
/// Entries are named by the record's filename made safe as a path component.
/// When two records in the same group end up with the same name, the later
/// one is renamed to `<stem>-<id>.<ext>`.
pub fn group_by_task(records: &[PhotoRecord]) -> BTreeMap<String, Vec<ArchiveEntry<'_>>> {
    let mut groups: BTreeMap<String, Vec<ArchiveEntry<'_>>> = BTreeMap::new();
    let mut used: BTreeMap<String, HashSet<String>> = BTreeMap::new();

    for record in records {
        let names = used.entry(record.task_code.clone()).or_default();
        let name = unique_name(&safe_component(&record.filename), record.id, names);
        names.insert(name.clone());
        groups
            .entry(record.task_code.clone())
            .or_default()
            .push(ArchiveEntry { name, record });
    }

    groups
}

fn unique_name(filename: &str, id: i64, used: &HashSet<String>) -> String {
    if !used.contains(filename) {
        return filename.to_string();
    }

    let (stem, ext) = match filename.rfind('.') {
        Some(dot) if dot > 0 => (&filename[..dot], &filename[dot..]),
        _ => (filename, ""),
    };
    let mut candidate = format!("{}-{}{}", stem, id, ext);
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{}-{}-{}{}", stem, id, n, ext);
        n += 1;
    }
    candidate
}

/// Folder name for each task code, in `groups` order.
///
/// Task codes that only differ in characters replaced by [`safe_component`]
/// would share a folder; later ones get a `-2`, `-3`, ... suffix.
fn task_folders<T>(groups: &BTreeMap<String, T>) -> Vec<String> {
    let mut used = HashSet::new();
    groups
        .keys()
        .map(|task_code| {
            let folder = unique_suffixed(&safe_component(task_code), &used);
            used.insert(folder.clone());
            folder
        })
        .collect()
}

/// Write `records` as a zip archive with one folder per task code.
///
/// Returns the number of task folders written.
pub fn write_archive<W: Write + Seek>(records: &[PhotoRecord], writer: W) -> Result<usize> {
    let groups = group_by_task(records);
    let folders = task_folders(&groups);
    // JPEG payloads are already compressed
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut zip = ZipWriter::new(writer);

    for ((task_code, entries), folder) in groups.iter().zip(&folders) {
        zip.add_directory(format!("{}/", folder), options)?;

        for entry in entries {
            let bytes = entry.record.data.bytes().with_context(|| {
                format!(
                    "Failed to read photo {} ({}) for task {}",
                    entry.record.id, entry.record.filename, task_code
                )
            })?;
            zip.start_file(format!("{}/{}", folder, entry.name), options)?;
            zip.write_all(&bytes)?;
        }
    }

    zip.finish()?;
    Ok(groups.len())
}

/// Export all photos of `date` into `out_dir/report_<date>.zip`.
///
/// The archive is written to a temporary file first and renamed into place,
/// so a failed export leaves nothing behind.
pub fn export_day(store: &dyn PhotoStore, date: &str, zone: ReportZone, out_dir: &Path) -> Result<ExportSummary> {
    let records = store.photos_for_date(date, zone)?;
    let day = match parse_day(date) {
        Some(day) if !records.is_empty() => day,
        _ => bail!("No photos recorded for {}", date.trim()),
    };

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create export directory {}", out_dir.display()))?;

    let path = out_dir.join(format!("report_{}.zip", day.format("%Y-%m-%d")));
    let partial = path.with_extension("zip.part");

    let result = File::create(&partial)
        .with_context(|| format!("Failed to create {}", partial.display()))
        .and_then(|file| write_archive(&records, file));
    let tasks = match result {
        Ok(tasks) => tasks,
        Err(e) => {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
    };
    fs::rename(&partial, &path)
        .with_context(|| format!("Failed to move archive into place at {}", path.display()))?;

    info!(path = %path.display(), tasks, photos = records.len(), "Exported daily archive");
    Ok(ExportSummary {
        path,
        tasks,
        photos: records.len(),
    })
}

/// Write a report summary to a file
pub fn write_report(report: &[TaskReport], output_path: &Path, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report)?;
            let mut file = File::create(output_path)?;
            file.write_all(json.as_bytes())?;
        }
        ReportFormat::Csv => {
            let mut wtr = csv::Writer::from_path(output_path)?;
            for row in report {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}
