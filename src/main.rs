use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use tasklog::capture::{save_photo, stamp_text, CaptureSession};
use tasklog::config::Config;
use tasklog::day::ReportZone;
use tasklog::db::{Database, GeoPoint, PhotoData, PhotoRecord, PhotoStore};
use tasklog::export::{self, ReportFormat};
use tasklog::report::{self, TaskReport};
use tasklog::storage::PhotoStorage;
use tasklog::{device, logging};

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Capture {
        task_code: String,
        images: Vec<PathBuf>,
        location: Option<GeoPoint>,
    },
    Report {
        date: Option<String>,
    },
    Photos {
        date: Option<String>,
    },
    Export {
        date: Option<String>,
        out_dir: Option<PathBuf>,
        summary: Option<ReportFormat>,
    },
    Help,
    Version,
}

#[derive(Debug)]
struct Cli {
    config_path: Option<PathBuf>,
    command: Command,
}

fn flag_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .ok_or_else(|| format!("{} requires a value", flag))
}

fn parse_coordinate(value: &str, flag: &str, limit: f64) -> Result<f64, String> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v.abs() <= limit => Ok(v),
        _ => Err(format!("{} must be a number between -{} and {}", flag, limit, limit)),
    }
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut config_path = None;
    let mut positional: Vec<String> = Vec::new();
    let mut lat = None;
    let mut lon = None;
    let mut out_dir = None;
    let mut summary = None;

    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "--help" | "-h" => {
                return Ok(Cli { config_path, command: Command::Help });
            }
            "--version" | "-V" => {
                return Ok(Cli { config_path, command: Command::Version });
            }
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(flag_value(args, &mut i, arg)?));
            }
            "--lat" => lat = Some(parse_coordinate(flag_value(args, &mut i, arg)?, arg, 90.0)?),
            "--lon" => lon = Some(parse_coordinate(flag_value(args, &mut i, arg)?, arg, 180.0)?),
            "--out" | "-o" => out_dir = Some(PathBuf::from(flag_value(args, &mut i, arg)?)),
            "--summary" => {
                let value = flag_value(args, &mut i, arg)?;
                summary = Some(
                    ReportFormat::from_str(value)
                        .ok_or_else(|| format!("Unknown summary format: {}", value))?,
                );
            }
            s if s.starts_with('-') && s.len() > 1 => {
                return Err(format!("Unknown argument: {}", s));
            }
            _ => positional.push(args[i].clone()),
        }
        i += 1;
    }

    let Some((name, rest)) = positional.split_first() else {
        return Ok(Cli { config_path, command: Command::Help });
    };

    if name != "capture" && (lat.is_some() || lon.is_some()) {
        return Err("--lat/--lon only apply to capture".to_string());
    }
    if name != "export" && (out_dir.is_some() || summary.is_some()) {
        return Err("--out/--summary only apply to export".to_string());
    }

    let optional_date = |rest: &[String]| -> Result<Option<String>, String> {
        match rest {
            [] => Ok(None),
            [date] => Ok(Some(date.clone())),
            _ => Err(format!("{} takes at most one date", name)),
        }
    };

    let command = match name.as_str() {
        "capture" => {
            let Some((task_code, images)) = rest.split_first() else {
                return Err("capture requires a task code".to_string());
            };
            if images.is_empty() {
                return Err("capture requires at least one image".to_string());
            }
            let location = match (lat, lon) {
                (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
                (None, None) => None,
                _ => return Err("--lat and --lon must be given together".to_string()),
            };
            Command::Capture {
                task_code: task_code.clone(),
                images: images.iter().map(PathBuf::from).collect(),
                location,
            }
        }
        "report" => Command::Report { date: optional_date(rest)? },
        "photos" => Command::Photos { date: optional_date(rest)? },
        "export" => Command::Export {
            date: optional_date(rest)?,
            out_dir,
            summary,
        },
        other => return Err(format!("Unknown command: {}", other)),
    };

    Ok(Cli { config_path, command })
}

fn print_help() {
    println!(
        r#"tasklog - field-task photo log

USAGE:
    tasklog [OPTIONS] <COMMAND>

COMMANDS:
    capture <TASK_CODE> <IMAGE>...   Log images for a task code
        --lat X --lon Y              Location the photos were taken at
    report [DATE]                    Photo counts per task for a day (default: today)
    photos [DATE]                    List every photo logged on a day
    export [DATE]                    Write report_<DATE>.zip, one folder per task
        --out, -o DIR                Output directory (default: from config)
        --summary json|csv           Also write the report summary

OPTIONS:
    --config, -c PATH   Path to config file
    --version, -V       Show version
    --help, -h          Show this help message

DATE is YYYY-MM-DD in the configured report zone.

ENVIRONMENT:
    TASKLOG_CONFIG      Path to config file (overrides default location)
    TASKLOG_LOG         Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/tasklog/config.toml"#
    );
}

fn resolve_date(date: Option<String>, zone: ReportZone) -> String {
    date.unwrap_or_else(|| zone.today().format("%Y-%m-%d").to_string())
}

fn present_report_row(row: &TaskReport) -> String {
    format!("{}\t{} photo(s)", row.task_code, row.photo_count)
}

fn present_photo_row(photo: &PhotoRecord, zone: ReportZone) -> String {
    let time = match zone {
        ReportZone::Local => photo.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S").to_string(),
        ReportZone::Fixed(offset) => photo.timestamp.with_timezone(&offset).format("%H:%M:%S").to_string(),
    };
    let data = match &photo.data {
        PhotoData::Inline(bytes) => format!("inline:{}B", bytes.len()),
        PhotoData::File(path) => path.display().to_string(),
    };
    let location = photo
        .location
        .map(|p| format!("{:.5},{:.5}", p.latitude, p.longitude))
        .unwrap_or_default();
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
        photo.id,
        time,
        photo.task_code,
        photo.filename,
        photo.device_id.as_deref().unwrap_or(""),
        location,
        data
    )
}

fn run_capture(
    db: &Database,
    config: &Config,
    task_code: &str,
    images: &[PathBuf],
    location: Option<GeoPoint>,
) -> Result<()> {
    let zone = config.report.zone;
    let storage = PhotoStorage::new(&config.storage, zone);
    let device_id = if config.capture.record_device_id {
        Some(device::device_id(db).context("Failed to load device id")?)
    } else {
        None
    };

    let mut session = CaptureSession::resume(db, task_code, Utc::now(), zone)?;
    for image in images {
        let bytes = fs::read(image).with_context(|| format!("Failed to read image {}", image.display()))?;
        let now: DateTime<Utc> = Utc::now();
        let data = storage.place(bytes, &session.next_filename(), now)?;
        let photo = session.next_photo(data, now, device_id.clone(), location);
        let id = save_photo(db, &photo)?;

        info!(id, task_code = %photo.task_code, source = %image.display(), "Photo captured");
        println!(
            "{}\t{}\t{}",
            id,
            photo.filename,
            stamp_text(&photo.task_code, now, photo.device_id.as_deref(), photo.location)
        );
    }
    println!("{} photo(s) logged today for task {}", session.count(), session.task_code());
    Ok(())
}

fn run(command: Command, db: &Database, config: &Config) -> Result<()> {
    let zone = config.report.zone;
    match command {
        Command::Capture {
            task_code,
            images,
            location,
        } => run_capture(db, config, &task_code, &images, location),
        Command::Report { date } => {
            let date = resolve_date(date, zone);
            let rows = report::build_report(db, &date, zone).context("Failed to build report")?;
            if rows.is_empty() {
                println!("No tasks recorded for {}", date);
            }
            for row in &rows {
                println!("{}", present_report_row(row));
            }
            Ok(())
        }
        Command::Photos { date } => {
            let date = resolve_date(date, zone);
            let photos = db.photos_for_date(&date, zone).context("Failed to load photos")?;
            if photos.is_empty() {
                println!("No photos recorded for {}", date);
            }
            for photo in &photos {
                println!("{}", present_photo_row(photo, zone));
            }
            Ok(())
        }
        Command::Export {
            date,
            out_dir,
            summary,
        } => {
            let date = resolve_date(date, zone);
            let out_dir = out_dir.unwrap_or_else(|| config.export.output_dir.clone());
            let exported = export::export_day(db, &date, zone, &out_dir)?;
            println!(
                "Exported {} photo(s) in {} task folder(s) to {}",
                exported.photos,
                exported.tasks,
                exported.path.display()
            );

            if let Some(format) = summary {
                let rows = report::build_report(db, &date, zone).context("Failed to build report")?;
                let path = exported.path.with_extension(format.extension());
                export::write_report(&rows, &path, format)
                    .with_context(|| format!("Failed to write {} summary", format.name()))?;
                println!("Wrote {} summary to {}", format.name(), path.display());
            }
            Ok(())
        }
        Command::Help => {
            print_help();
            Ok(())
        }
        Command::Version => {
            println!("tasklog {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_database(config: &Config) -> Result<Database> {
    let db = Database::open(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;
    db.initialize().context("Failed to initialize database")?;
    Ok(db)
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            print_help();
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Command::Help => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Command::Version => {
            println!("tasklog {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        _ => {}
    }

    let _log_guard = logging::init(None).ok().flatten();

    let result = cli
        .config_path
        .as_deref()
        .map_or_else(Config::load, Config::load_from)
        .and_then(|config| {
            let db = open_database(&config)?;
            run(cli.command, &db, &config)
        });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
