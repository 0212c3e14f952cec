pub const SCHEMA: &str = r#"
-- Photos table: one row per captured photo, never updated or deleted
CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_code TEXT NOT NULL,
    filename TEXT NOT NULL,

    -- Capture instant, RFC 3339 text plus epoch millis for range queries
    taken_at TEXT NOT NULL,
    taken_at_ms INTEGER NOT NULL,

    -- Exactly one of these holds the image
    data_blob BLOB,
    data_path TEXT,

    device_id TEXT,
    gps_latitude REAL,
    gps_longitude REAL,

    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,

    CHECK ((data_blob IS NULL) != (data_path IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_photos_taken_at_ms ON photos(taken_at_ms);

-- Local key-value settings (device id and similar per-install values)
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Migrations applied after `SCHEMA`. Each statement must be safe to re-run
/// against a database that already has it; failures are logged and skipped.
pub const MIGRATIONS: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_photos_task_taken_at ON photos(task_code, taken_at_ms)",
];
